//! Command-line style task invocations
//!
//! `baton run dist --port=9000 --no-minify` becomes task `dist` with the
//! overrides `{"port": 9000, "minify": false}`.

use baton_capability_protocol::StepOptions;
use serde_json::Value;

use crate::types::{BatonError, BatonResult};

/// Task run when none is named
pub const DEFAULT_TASK: &str = "default";

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub task: String,
    pub overrides: StepOptions,
}

impl Invocation {
    /// Parse `[TASK] [--option=value]...` in any order.
    pub fn parse<I, S>(args: I) -> BatonResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut task = None;
        let mut overrides = StepOptions::new();

        for arg in args {
            let arg = arg.as_ref();
            if arg.starts_with("--") {
                let (key, value) = parse_override(arg)?;
                overrides.insert(key, value);
            } else if task.is_none() {
                task = Some(arg.to_string());
            } else {
                return Err(BatonError::InvalidOverride(arg.to_string()));
            }
        }

        Ok(Self {
            task: task.unwrap_or_else(|| DEFAULT_TASK.to_string()),
            overrides,
        })
    }
}

/// Parse overrides only, for callers that take the task name separately.
pub fn parse_overrides<I, S>(args: I) -> BatonResult<StepOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut overrides = StepOptions::new();
    for arg in args {
        let (key, value) = parse_override(arg.as_ref())?;
        overrides.insert(key, value);
    }
    Ok(overrides)
}

fn parse_override(arg: &str) -> BatonResult<(String, Value)> {
    let invalid = || BatonError::InvalidOverride(arg.to_string());
    let body = arg.strip_prefix("--").ok_or_else(invalid)?;

    let (key, value) = match body.split_once('=') {
        Some((key, raw)) => (key, parse_value(raw)),
        None => match body.strip_prefix("no-") {
            Some(key) => (key, Value::Bool(false)),
            None => (body, Value::Bool(true)),
        },
    };

    if key.is_empty() || key.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    Ok((key.to_string(), value))
}

/// JSON scalars keep their type; anything else is taken as a string.
fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Bool(_) | Value::Number(_) | Value::Null)) => value,
        Ok(Value::String(s)) => Value::String(s),
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_to_default_task() {
        let invocation = Invocation::parse(Vec::<String>::new()).unwrap();
        assert_eq!(invocation.task, "default");
        assert!(invocation.overrides.is_empty());
    }

    #[test]
    fn parses_task_and_typed_overrides() {
        let invocation = Invocation::parse([
            "--port=9000",
            "dist",
            "--host=localhost",
            "--verbose",
            "--no-minify",
            "--ratio=0.5",
            "--label=\"quoted\"",
        ])
        .unwrap();

        assert_eq!(invocation.task, "dist");
        assert_eq!(
            Value::Object(invocation.overrides),
            json!({
                "port": 9000,
                "host": "localhost",
                "verbose": true,
                "minify": false,
                "ratio": 0.5,
                "label": "quoted"
            })
        );
    }

    #[test]
    fn later_overrides_win() {
        let overrides = parse_overrides(["--port=1", "--port=2"]).unwrap();
        assert_eq!(overrides["port"], json!(2));
    }

    #[test]
    fn structured_values_stay_strings() {
        let overrides = parse_overrides(["--files=[1,2]", "--empty="]).unwrap();
        assert_eq!(overrides["files"], json!("[1,2]"));
        assert_eq!(overrides["empty"], json!(""));
    }

    #[test]
    fn rejects_malformed_arguments() {
        assert!(matches!(parse_overrides(["--"]), Err(BatonError::InvalidOverride(_))));
        assert!(matches!(parse_overrides(["--=1"]), Err(BatonError::InvalidOverride(_))));
        assert!(matches!(parse_overrides(["port=1"]), Err(BatonError::InvalidOverride(_))));
        assert!(matches!(
            Invocation::parse(["dist", "serve"]),
            Err(BatonError::InvalidOverride(ref arg)) if arg == "serve"
        ));
    }
}
