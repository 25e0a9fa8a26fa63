//! Host wrapper-runtime specifics.
//!
//! Names and lists the generated code has to agree on with the v8toolkit
//! runtime: the marker base, base types that never become wrapping edges,
//! the per-file preamble, and JavaScript's reserved names.

/// Canonical name of the marker base; inheriting from it (publicly) opts a
/// class into wrapping.
pub const MARKER_BASE: &str = "class v8toolkit::WrappedClassBase";

/// Base types that never become `base_types` edges.
pub static BASE_TYPES_TO_IGNORE: &[&str] = &["class v8toolkit::WrappedClassBase", "class Subscriber"];

/// Classes that are never wrapped, no matter how they are found.
pub static NEVER_WRAP_CLASS_NAMES: &[&str] =
    &["v8toolkit::WrappedClassBase", "v8toolkit::EmptyFactoryBase"];

/// Top-level types discarded on sight.
pub static TYPES_TO_IGNORE_REGEX: &[&str] = &["^struct has_custom_process[<].*[>]::mixin$"];

/// Includes emitted at the top of every binding file.
pub static INCLUDES_FOR_EVERY_CLASS_WRAPPER_FILE: &[&str] =
    &["\"js_casts.h\"", "<v8toolkit/v8_class_wrapper_impl.h>"];

/// Includes that must never be emitted even when computed.
pub static NEVER_INCLUDE_FOR_ANY_FILE: &[&str] = &["\"v8helpers.h\""];

/// Fixed preamble of every binding file; bidirectional types must be
/// visible and fast-compile mode disabled so the wrapper code can be
/// instantiated.
pub const HEADER_FOR_EVERY_CLASS_WRAPPER_FILE: &str =
    "#define NEED_BIDIRECTIONAL_TYPES\n#undef V8TOOLKIT_WRAPPER_FAST_COMPILE\n";

/// Built-in static-method renames applied when no config/bulk/annotation
/// rename matched.
pub static STATIC_METHOD_RENAMES: &[(&str, &str)] = &[("name", "get_name")];

/// JavaScript global names a class may not take.
pub static RESERVED_GLOBAL_NAMES: &[&str] = &[
    "Boolean", "Null", "Undefined", "Number", "String", "Object", "Symbol", "Array", "Map", "Set",
    "WeakMap", "WeakSet", "Date", "JSON",
];

/// Properties already present on JavaScript `Function` objects; static
/// methods may not shadow them.
pub static RESERVED_STATIC_NAMES: &[&str] = &[
    "name",
    "arguments",
    "caller",
    "length",
    "displayName",
    "constructor",
    "arity",
];
