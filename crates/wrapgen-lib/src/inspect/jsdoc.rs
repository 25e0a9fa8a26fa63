//! C++ type name to JSDoc type name conversion.
//!
//! A configured list of (regex, replacement) pairs applied in order; the
//! first full match wins. Replacements may carry `$1`, `$2`, ...
//! placeholders which the caller fills with already-converted template
//! arguments (see `TypeInfo::jsdoc_type_name`).

use std::sync::LazyLock;

use regex::Regex;

static INLINE_NAMESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"std::__(?:cxx\d\d|\d)::").expect("static regex"));

static TAG_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:class|struct)?\s*").expect("static regex"));

static QUALIFIERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:const\s*|volatile\s*)*\s*(.*?)\s*&?&?$").expect("static regex")
});

/// The canonical default conversion table.
///
/// See <http://usejsdoc.org/tags-type.html> for the target vocabulary.
const DEFAULT_RULES: &[(&str, &str)] = &[
    (r"^(?:std::|eastl)?vector", "Array.{$1}"),
    (r"^(?:std::|eastl::)?(?:vector_)?(?:multi)?map", "Object.{$1, $2}"),
    (
        r"^(?:const)?\s*(?:unsigned)?\s*(?:char|short|int|long|long long|float|double|long double)\s*(?:const)?\s*[*]?\s*[&]?$",
        "Number",
    ),
    (r"^(?:const)?\s*_?[Bb]ool\s*(?:const)?\s*[*]?\s*[&]?$", "Boolean"),
    (
        r"^(?:const)?\s*(?:char\s*[*]|(?:std::)?string)\s*(?:const)?\s*\s*[&]?$",
        "String",
    ),
    (r"^void$", "Undefined"),
    (r"^(?:std::)?unique_ptr", "$1"),
    (r"^(?:std::)?basic_string", "String"),
    (r"^\s*nullptr\s*$", "null"),
];

/// Ordered conversion rules from C++ type names to JSDoc type names.
#[derive(Debug)]
pub struct JsdocRules {
    rules: Vec<(Regex, String)>,
}

impl Default for JsdocRules {
    fn default() -> Self {
        Self::new(DEFAULT_RULES).expect("default jsdoc rules compile")
    }
}

fn full_match(regex: &Regex, name: &str) -> bool {
    regex
        .find(name)
        .is_some_and(|m| m.start() == 0 && m.end() == name.len())
}

impl JsdocRules {
    pub fn new(pairs: &[(&str, &str)]) -> Result<Self, regex::Error> {
        let mut rules = Vec::with_capacity(pairs.len());
        for (pattern, replacement) in pairs {
            rules.push((Regex::new(pattern)?, (*replacement).to_string()));
        }
        Ok(Self { rules })
    }

    /// Convert a simple (non-templated, or outer-template) type name.
    ///
    /// The name is first simplified: inline namespace prefixes normalized,
    /// tag keywords removed, leading const/volatile and trailing references
    /// stripped. An unmatched name comes back simplified but otherwise
    /// unchanged.
    pub fn convert_simple(&self, name: &str) -> String {
        let simplified = INLINE_NAMESPACE.replace_all(name, "std::");
        let simplified = TAG_KEYWORD.replace(&simplified, "");
        let simplified = QUALIFIERS.replace(&simplified, "$1").into_owned();

        for (regex, replacement) in &self.rules {
            if full_match(regex, &simplified) {
                return replacement.clone();
            }
        }
        simplified
    }
}
