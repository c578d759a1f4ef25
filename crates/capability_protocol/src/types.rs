//! Core types for the Baton capability protocol.
//!
//! - [`StepOptions`] - The option record attached to a step
//! - [`StepContext`] - Everything a capability receives when a step runs
//! - [`CapabilityKey`] - Validated capability identifier
//! - [`merge_options`] - Layered option merging (later layers win)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::error::CapabilityError;

/// Mapping of option name to value describing how a step should run.
pub type StepOptions = serde_json::Map<String, Value>;

/// Merge option layers into a single record.
///
/// The merge is shallow: for every option name present in more than one
/// layer, the value from the right-most layer wins as a whole. Nested objects
/// are replaced, not combined.
///
/// ```rust
/// use baton_capability_protocol::{merge_options, StepOptions};
/// use serde_json::json;
///
/// let mut config = StepOptions::new();
/// config.insert("port".into(), json!(8081));
/// config.insert("base".into(), json!("dist"));
///
/// let mut overrides = StepOptions::new();
/// overrides.insert("port".into(), json!(9000));
///
/// let merged = merge_options([&config, &overrides]);
/// assert_eq!(merged["port"], json!(9000));
/// assert_eq!(merged["base"], json!("dist"));
/// ```
pub fn merge_options<'a>(layers: impl IntoIterator<Item = &'a StepOptions>) -> StepOptions {
    let mut merged = StepOptions::new();
    for layer in layers {
        for (key, value) in layer {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Everything a capability needs to execute one step.
#[derive(Debug, Clone)]
pub struct StepContext {
    /// Id of the step being executed, e.g. `clean:dist`.
    pub step_id: String,

    /// Absolute path of the pipeline root. Relative paths in options are
    /// resolved against it.
    pub root: PathBuf,

    /// Merged options: capability defaults, step config, then overrides.
    pub options: StepOptions,
}

impl StepContext {
    pub fn new(step_id: impl Into<String>, root: impl Into<PathBuf>, options: StepOptions) -> Self {
        Self {
            step_id: step_id.into(),
            root: root.into(),
            options,
        }
    }

    /// Raw option value, if present.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// String option. Present but non-string values are an error.
    pub fn str_option(&self, key: &str) -> Result<Option<&str>, CapabilityError> {
        match self.options.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(CapabilityError::invalid(
                key,
                format!("expected a string, found {}", other),
            )),
        }
    }

    /// String option that must be present.
    pub fn require_str(&self, key: &str) -> Result<&str, CapabilityError> {
        self.str_option(key)?
            .ok_or_else(|| CapabilityError::MissingOption(key.to_string()))
    }

    /// Boolean option with a default.
    ///
    /// The strings `"true"` and `"false"` are accepted as well, since values
    /// passed on the command line may not have been parsed.
    pub fn bool_option(&self, key: &str, default: bool) -> Result<bool, CapabilityError> {
        match self.options.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) if s == "true" => Ok(true),
            Some(Value::String(s)) if s == "false" => Ok(false),
            Some(other) => Err(CapabilityError::invalid(
                key,
                format!("expected a boolean, found {}", other),
            )),
        }
    }

    /// List of strings. A single string is treated as a one-element list and
    /// an absent option as an empty one.
    pub fn string_list(&self, key: &str) -> Result<Vec<String>, CapabilityError> {
        value_as_string_list(key, self.options.get(key))
    }

    /// Resolve a path from an option against the pipeline root.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_relative() {
            self.root.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

/// Interpret an option value as a list of strings.
///
/// Shared with capabilities that read nested records (such as file mappings)
/// rather than top-level options.
pub fn value_as_string_list(key: &str, value: Option<&Value>) -> Result<Vec<String>, CapabilityError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(CapabilityError::invalid(
                    key,
                    format!("expected a list of strings, found element {}", other),
                )),
            })
            .collect(),
        Some(other) => Err(CapabilityError::invalid(
            key,
            format!("expected a string or a list of strings, found {}", other),
        )),
    }
}

/// Type-safe identifier for capabilities.
///
/// **Requirements**:
/// - Not empty
/// - No whitespace characters
/// - No `:` (reserved for `capability:target` step ids)
///
/// ```rust
/// # use baton_capability_protocol::CapabilityKey;
/// assert!(CapabilityKey::new("exec").is_ok());
/// assert!(CapabilityKey::new("inline-css").is_ok());
/// assert!(CapabilityKey::new("my capability").is_err());
/// assert!(CapabilityKey::new("clean:dist").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CapabilityKey(String);

impl CapabilityKey {
    /// Create a new `CapabilityKey`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty, contains whitespace or contains `:`.
    pub fn new(key: impl Into<String>) -> Result<Self, String> {
        let key = key.into();
        if key.is_empty() {
            return Err("Capability key must not be empty".to_string());
        }
        if key.chars().any(char::is_whitespace) {
            return Err(format!(
                "Capability key '{}' contains whitespace characters",
                key
            ));
        }
        if key.contains(':') {
            return Err(format!("Capability key '{}' must not contain ':'", key));
        }
        Ok(Self(key))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CapabilityKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CapabilityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(options: Value) -> StepContext {
        let options = match options {
            Value::Object(map) => map,
            _ => StepOptions::new(),
        };
        StepContext::new("test:step", "/work", options)
    }

    #[test]
    fn later_layers_win() {
        let defaults = context(json!({ "a": 1, "b": 1, "c": 1 })).options;
        let config = context(json!({ "b": 2, "c": 2 })).options;
        let overrides = context(json!({ "c": 3 })).options;

        let merged = merge_options([&defaults, &config, &overrides]);

        assert_eq!(merged["a"], json!(1));
        assert_eq!(merged["b"], json!(2));
        assert_eq!(merged["c"], json!(3));
    }

    #[test]
    fn merge_replaces_nested_objects_whole() {
        let config = context(json!({ "env": { "A": "1", "B": "2" } })).options;
        let overrides = context(json!({ "env": { "A": "9" } })).options;

        let merged = merge_options([&config, &overrides]);

        assert_eq!(merged["env"], json!({ "A": "9" }));
    }

    #[test]
    fn string_list_accepts_single_string_and_arrays() {
        let ctx = context(json!({ "one": "dist", "many": ["a", "b"], "bad": [1] }));

        assert_eq!(ctx.string_list("one").unwrap(), vec!["dist"]);
        assert_eq!(ctx.string_list("many").unwrap(), vec!["a", "b"]);
        assert!(ctx.string_list("missing").unwrap().is_empty());
        assert!(matches!(
            ctx.string_list("bad"),
            Err(CapabilityError::InvalidOption { .. })
        ));
    }

    #[test]
    fn require_str_reports_missing_option() {
        let ctx = context(json!({}));
        let err = ctx.require_str("command").unwrap_err();
        assert_eq!(err.to_string(), "missing required option 'command'");
    }

    #[test]
    fn bool_option_accepts_strings_from_command_line() {
        let ctx = context(json!({ "force": "true", "flat": false, "bad": 3 }));

        assert!(ctx.bool_option("force", false).unwrap());
        assert!(!ctx.bool_option("flat", true).unwrap());
        assert!(ctx.bool_option("missing", true).unwrap());
        assert!(ctx.bool_option("bad", false).is_err());
    }

    #[test]
    fn resolve_path_joins_relative_paths_to_root() {
        let ctx = context(json!({}));
        assert_eq!(ctx.resolve_path("dist"), PathBuf::from("/work/dist"));
        assert_eq!(ctx.resolve_path("/tmp/out"), PathBuf::from("/tmp/out"));
    }
}
