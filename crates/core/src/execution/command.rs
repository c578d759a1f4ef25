//! Command execution utilities
//!
//! This module provides a unified interface for executing different types of commands
//! (shell commands, scripts, executable with args) with consistent error handling and logging.

use std::path::{Path, PathBuf};
use std::process::Command;

use baton_capability_protocol::{CapabilityError, StepContext};
use serde_json::Value;
use tracing::debug;

/// Unified command executor that handles common setup and execution patterns
pub struct CommandExecutor<'a> {
    context: &'a StepContext,
    cwd: PathBuf,
    env: Vec<(String, String)>,
}

impl<'a> CommandExecutor<'a> {
    pub fn new(context: &'a StepContext) -> Self {
        Self {
            context,
            cwd: context.root.clone(),
            env: Vec::new(),
        }
    }

    /// Run commands from `dir` (resolved against the pipeline root) instead of the root
    pub fn with_cwd(mut self, dir: &Path) -> Self {
        self.cwd = self.context.resolve_path(dir);
        self
    }

    /// Add an extra environment variable for the child process
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Execute a command with common setup and error handling
    pub fn execute_command(&self, command: &mut Command, command_line: &str) -> Result<(), CapabilityError> {
        // Common setup
        command.current_dir(&self.cwd);
        command.env("BATON_STEP", &self.context.step_id);
        command.env("BATON_ROOT", &self.context.root);

        // Expose scalar options so overrides reach external tools
        for (key, value) in &self.context.options {
            if let Some(text) = scalar_to_env(value) {
                command.env(option_env_name(key), text);
            }
        }
        for (key, value) in &self.env {
            command.env(key, value);
        }

        debug!(step = %self.context.step_id, command = command_line, cwd = %self.cwd.display(), "spawning command");

        let status = command.status().map_err(|e| {
            CapabilityError::Other(anyhow::anyhow!("Failed to execute '{}': {}", command_line, e))
        })?;

        if !status.success() {
            return Err(CapabilityError::CommandFailed {
                command: command_line.to_string(),
                code: status.code().unwrap_or(-1),
            });
        }

        Ok(())
    }

    /// Execute a script file
    pub fn execute_script(&self, script_path: &str) -> Result<(), CapabilityError> {
        let full_script_path = self.context.resolve_path(script_path);

        if !full_script_path.exists() {
            return Err(CapabilityError::invalid(
                "script",
                format!("script file '{}' not found", full_script_path.display()),
            ));
        }

        let mut command = Command::new(&full_script_path);
        self.execute_command(&mut command, &full_script_path.display().to_string())
    }

    /// Execute a command with arguments
    pub fn execute_command_with_args(&self, program: &str, args: &[String]) -> Result<(), CapabilityError> {
        let mut command = Command::new(program);
        command.args(args);
        let command_line = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        self.execute_command(&mut command, &command_line)
    }

    /// Execute a single shell command
    pub fn execute_shell_command(&self, cmd: &str) -> Result<(), CapabilityError> {
        let mut command = Command::new("sh");
        command.arg("-c").arg(cmd);
        self.execute_command(&mut command, cmd)
    }
}

/// `output-dir` becomes `BATON_OPT_OUTPUT_DIR`
pub fn option_env_name(key: &str) -> String {
    let normalized: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("BATON_OPT_{}", normalized)
}

fn scalar_to_env(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baton_capability_protocol::StepOptions;
    use serde_json::json;

    fn context(root: &Path, options: Value) -> StepContext {
        let options = match options {
            Value::Object(map) => map,
            _ => StepOptions::new(),
        };
        StepContext::new("exec:test", root, options)
    }

    #[test]
    fn option_names_are_normalized() {
        assert_eq!(option_env_name("port"), "BATON_OPT_PORT");
        assert_eq!(option_env_name("output-dir"), "BATON_OPT_OUTPUT_DIR");
        assert_eq!(option_env_name("cssMin"), "BATON_OPT_CSSMIN");
    }

    #[test]
    fn non_zero_exit_is_reported_with_code() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ctx = context(temp_dir.path(), json!({}));

        let err = CommandExecutor::new(&ctx)
            .execute_shell_command("exit 3")
            .unwrap_err();

        assert!(matches!(err, CapabilityError::CommandFailed { code: 3, .. }));
    }

    #[test]
    fn failed_program_is_reported_by_its_command_line() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ctx = context(temp_dir.path(), json!({}));

        let err = CommandExecutor::new(&ctx)
            .execute_command_with_args("sh", &["-c".to_string(), "exit 4".to_string()])
            .unwrap_err();

        match err {
            CapabilityError::CommandFailed { command, code } => {
                assert_eq!(command, "sh -c exit 4");
                assert_eq!(code, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn scalar_options_are_exported() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ctx = context(temp_dir.path(), json!({ "port": 9000, "keepalive": false }));

        CommandExecutor::new(&ctx)
            .execute_shell_command(r#"test "$BATON_OPT_PORT" = 9000 && test "$BATON_OPT_KEEPALIVE" = false"#)
            .unwrap();
    }

    #[test]
    fn commands_run_in_requested_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("dist")).unwrap();
        let ctx = context(temp_dir.path(), json!({}));

        CommandExecutor::new(&ctx)
            .with_cwd(Path::new("dist"))
            .execute_command_with_args("sh", &["-c".to_string(), "echo ok > marker".to_string()])
            .unwrap();

        assert!(temp_dir.path().join("dist/marker").exists());
    }

    #[test]
    fn missing_script_is_an_invalid_option() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ctx = context(temp_dir.path(), json!({}));

        let err = CommandExecutor::new(&ctx)
            .execute_script("scripts/missing.sh")
            .unwrap_err();

        assert!(matches!(err, CapabilityError::InvalidOption { ref key, .. } if key == "script"));
    }
}
