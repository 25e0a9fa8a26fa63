//! The JSON configuration document.
//!
//! Queried for per-class and per-member overrides; a missing path is `None`
//! and the caller treats it as "no override". Recognized shapes:
//!
//! ```json
//! {
//!   "output_modules": {
//!     "BindingsOutputModule": { "max_declarations_per_file": 100 },
//!     "JavaScriptStubOutputModule": { "header": "..." }
//!   },
//!   "classes": {
//!     "Foo": {
//!       "name": "RenamedFoo",
//!       "members": { "int Foo::bar(char)": { "skip": true, "name": "baz" } }
//!     }
//!   },
//!   "bulk_renames": {
//!     "static_functions": [ { "regex": "...", "replace": "..." } ]
//!   }
//! }
//! ```

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("couldn't open config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON in config file: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid bulk_renames regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },

    #[error("config file BindingsOutputModule max_declarations_per_file ({0}) must be non-negative")]
    NegativeMaxDeclarations(i64),
}

/// One compiled rename rule; the first matching rule wins.
#[derive(Debug, Clone)]
pub struct RenameRule {
    pub regex: Regex,
    pub replace: String,
}

/// Parsed configuration document.
#[derive(Debug, Default)]
pub struct Config {
    root: Value,
    bulk_renames: IndexMap<String, Vec<RenameRule>>,
}

impl Config {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_str(source: &str) -> Result<Self, ConfigError> {
        let root: Value = serde_json::from_str(source)?;
        Self::from_value(root)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_str(&source)
    }

    fn from_value(root: Value) -> Result<Self, ConfigError> {
        // Structural problems in the document fail the run up front.
        let mut bulk_renames = IndexMap::new();
        if let Some(categories) = root.get("bulk_renames").and_then(Value::as_object) {
            for (category, rules) in categories {
                let mut compiled = Vec::new();
                for rule in rules.as_array().into_iter().flatten() {
                    let Some(pattern) = rule.get("regex").and_then(Value::as_str) else {
                        continue;
                    };
                    let Some(replace) = rule.get("replace").and_then(Value::as_str) else {
                        continue;
                    };
                    let regex =
                        Regex::new(pattern).map_err(|source| ConfigError::InvalidRegex {
                            pattern: pattern.to_string(),
                            source,
                        })?;
                    compiled.push(RenameRule {
                        regex,
                        replace: replace.to_string(),
                    });
                }
                bulk_renames.insert(category.clone(), compiled);
            }
        }

        if let Some(max) = root
            .pointer("/output_modules/BindingsOutputModule/max_declarations_per_file")
            .and_then(Value::as_i64)
            && max < 0
        {
            return Err(ConfigError::NegativeMaxDeclarations(max));
        }

        Ok(Self { root, bulk_renames })
    }

    fn class(&self, class_name: &str) -> Option<&Value> {
        self.root.get("classes")?.get(class_name)
    }

    fn member(&self, class_name: &str, member_key: &str) -> Option<&Value> {
        self.class(class_name)?.get("members")?.get(member_key)
    }

    /// JavaScript name override for a class.
    pub fn class_name_override(&self, class_name: &str) -> Option<&str> {
        self.class(class_name)?.get("name")?.as_str()
    }

    /// Per-member `skip` override, keyed by signature string (methods) or
    /// fully-qualified name (data members).
    pub fn member_skip(&self, class_name: &str, member_key: &str) -> Option<bool> {
        self.member(class_name, member_key)?.get("skip")?.as_bool()
    }

    /// Per-member JavaScript name override.
    pub fn member_name(&self, class_name: &str, member_key: &str) -> Option<&str> {
        self.member(class_name, member_key)?.get("name")?.as_str()
    }

    pub fn max_declarations_per_file(&self) -> Option<u32> {
        self.root
            .pointer("/output_modules/BindingsOutputModule/max_declarations_per_file")
            .and_then(Value::as_u64)
            .map(|v| v as u32)
    }

    pub fn declaration_base_cost(&self) -> Option<u32> {
        self.root
            .pointer("/output_modules/BindingsOutputModule/declaration_base_cost")
            .and_then(Value::as_u64)
            .map(|v| v as u32)
    }

    pub fn js_stub_header(&self) -> Option<&str> {
        self.root
            .pointer("/output_modules/JavaScriptStubOutputModule/header")
            .and_then(Value::as_str)
    }

    /// Apply the first matching bulk-rename rule of a category.
    pub fn bulk_rename(&self, category: &str, name: &str) -> Option<String> {
        let rules = self.bulk_renames.get(category)?;
        for rule in rules {
            if rule.regex.is_match(name) {
                return Some(rule.regex.replace(name, rule.replace.as_str()).into_owned());
            }
        }
        None
    }
}
