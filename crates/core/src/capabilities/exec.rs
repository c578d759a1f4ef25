use std::path::Path;

use baton_capability_protocol::{Capability, CapabilityError, StepContext};
use serde_json::{json, Value};

use crate::execution::command::CommandExecutor;

/// Runs an external command, shell snippet or script
pub struct ExecCapability;

impl Capability for ExecCapability {
    fn key(&self) -> &str {
        "exec"
    }

    fn name(&self) -> &str {
        "Execute Command"
    }

    fn description(&self) -> &str {
        "Run a shell command, a program with arguments, or a script file"
    }

    fn configuration_options(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "command": {
                    "description": "Shell command (string) or program followed by its arguments (array)",
                    "oneOf": [
                        { "type": "string" },
                        { "type": "array", "items": { "type": "string" }, "minItems": 1 }
                    ]
                },
                "script": {
                    "type": "string",
                    "description": "Script path relative to the pipeline root"
                },
                "cwd": {
                    "type": "string",
                    "description": "Working directory relative to the pipeline root"
                },
                "env": {
                    "type": "object",
                    "description": "Extra environment variables",
                    "additionalProperties": { "type": ["string", "number", "boolean"] }
                }
            }
        }))
    }

    fn execute(&self, context: &StepContext) -> Result<(), CapabilityError> {
        let mut executor = CommandExecutor::new(context);
        if let Some(cwd) = context.str_option("cwd")? {
            executor = executor.with_cwd(Path::new(cwd));
        }
        for (key, value) in env_option(context)? {
            executor = executor.with_env(key, value);
        }

        if let Some(script) = context.str_option("script")? {
            return executor.execute_script(script);
        }

        match context.option("command") {
            Some(Value::String(cmd)) => executor.execute_shell_command(cmd),
            Some(Value::Array(_)) => {
                let parts = context.string_list("command")?;
                match parts.split_first() {
                    Some((program, args)) => executor.execute_command_with_args(program, args),
                    None => Err(CapabilityError::invalid("command", "command list is empty")),
                }
            }
            None | Some(Value::Null) => Err(CapabilityError::MissingOption("command".to_string())),
            Some(other) => Err(CapabilityError::invalid(
                "command",
                format!("expected a string or a list of strings, found {}", other),
            )),
        }
    }
}

fn env_option(context: &StepContext) -> Result<Vec<(String, String)>, CapabilityError> {
    match context.option("env") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => Ok((key.clone(), s.clone())),
                Value::Number(n) => Ok((key.clone(), n.to_string())),
                Value::Bool(b) => Ok((key.clone(), b.to_string())),
                other => Err(CapabilityError::invalid(
                    "env",
                    format!("value for '{}' must be a scalar, found {}", key, other),
                )),
            })
            .collect(),
        Some(other) => Err(CapabilityError::invalid(
            "env",
            format!("expected a map, found {}", other),
        )),
    }
}
