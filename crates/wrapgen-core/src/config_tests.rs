use indoc::indoc;

use crate::config::{Config, ConfigError};

#[test]
fn missing_paths_are_none() {
    let config = Config::empty();

    assert_eq!(config.class_name_override("Foo"), None);
    assert_eq!(config.member_skip("Foo", "int Foo::bar()"), None);
    assert_eq!(config.max_declarations_per_file(), None);
    assert_eq!(config.js_stub_header(), None);
}

#[test]
fn class_and_member_overrides() {
    let config = Config::from_str(indoc! {r#"
        {
            "classes": {
                "Foo": {
                    "name": "Bar",
                    "members": {
                        "int Foo::bar(char)": { "skip": true },
                        "Foo::field": { "skip": false, "name": "renamed" }
                    }
                }
            }
        }
    "#})
    .unwrap();

    assert_eq!(config.class_name_override("Foo"), Some("Bar"));
    assert_eq!(config.member_skip("Foo", "int Foo::bar(char)"), Some(true));
    assert_eq!(config.member_skip("Foo", "Foo::field"), Some(false));
    assert_eq!(config.member_name("Foo", "Foo::field"), Some("renamed"));
    assert_eq!(config.member_name("Foo", "int Foo::bar(char)"), None);
}

#[test]
fn output_module_settings() {
    let config = Config::from_str(indoc! {r#"
        {
            "output_modules": {
                "BindingsOutputModule": { "max_declarations_per_file": 40 },
                "JavaScriptStubOutputModule": { "header": "// header\n" }
            }
        }
    "#})
    .unwrap();

    assert_eq!(config.max_declarations_per_file(), Some(40));
    assert_eq!(config.js_stub_header(), Some("// header\n"));
}

#[test]
fn negative_max_declarations_is_rejected() {
    let result = Config::from_str(r#"{"output_modules": {"BindingsOutputModule": {"max_declarations_per_file": -1}}}"#);
    assert!(matches!(
        result,
        Err(ConfigError::NegativeMaxDeclarations(-1))
    ));
}

#[test]
fn invalid_json_is_rejected() {
    assert!(matches!(
        Config::from_str("{not json"),
        Err(ConfigError::InvalidJson(_))
    ));
}

#[test]
fn first_matching_bulk_rename_wins() {
    let config = Config::from_str(indoc! {r#"
        {
            "bulk_renames": {
                "static_functions": [
                    { "regex": "^get_(.*)$", "replace": "$1" },
                    { "regex": "^get_id$", "replace": "never_reached" }
                ]
            }
        }
    "#})
    .unwrap();

    assert_eq!(
        config.bulk_rename("static_functions", "get_id"),
        Some("id".to_string())
    );
    assert_eq!(config.bulk_rename("static_functions", "other"), None);
    assert_eq!(config.bulk_rename("member_functions", "get_id"), None);
}

#[test]
fn invalid_bulk_rename_regex_is_structural_error() {
    let result = Config::from_str(
        r#"{"bulk_renames": {"static_functions": [{"regex": "(", "replace": "x"}]}}"#,
    );
    assert!(matches!(result, Err(ConfigError::InvalidRegex { .. })));
}
