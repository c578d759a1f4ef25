use std::fs;

use baton_capability_protocol::{Capability, CapabilityError, StepContext};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Removes files and directories
pub struct CleanCapability;

impl Capability for CleanCapability {
    fn key(&self) -> &str {
        "clean"
    }

    fn name(&self) -> &str {
        "Clean Paths"
    }

    fn description(&self) -> &str {
        "Remove files and directories inside the pipeline root"
    }

    fn configuration_options(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "paths": {
                    "description": "Paths to remove, relative to the pipeline root (alias: src)",
                    "oneOf": [
                        { "type": "string" },
                        { "type": "array", "items": { "type": "string" } }
                    ]
                },
                "force": {
                    "type": "boolean",
                    "description": "Allow removing the root itself or paths outside it",
                    "default": false
                }
            }
        }))
    }

    fn execute(&self, context: &StepContext) -> Result<(), CapabilityError> {
        let mut paths = context.string_list("paths")?;
        if paths.is_empty() {
            paths = context.string_list("src")?;
        }
        if paths.is_empty() {
            return Err(CapabilityError::MissingOption("paths".to_string()));
        }

        let force = context.bool_option("force", false)?;
        let root = context.root.canonicalize()?;

        for path in &paths {
            let target = context.resolve_path(path);
            if fs::symlink_metadata(&target).is_err() {
                debug!(step = %context.step_id, path = %target.display(), "nothing to clean");
                continue;
            }

            let resolved = target.canonicalize()?;
            if !force && (resolved == root || !resolved.starts_with(&root)) {
                warn!(step = %context.step_id, path = %resolved.display(), "refusing to clean path outside the root");
                return Err(CapabilityError::invalid(
                    "paths",
                    format!(
                        "refusing to remove '{}' (the root itself or outside it); set force: true to allow",
                        resolved.display()
                    ),
                ));
            }

            if fs::symlink_metadata(&target)?.is_dir() {
                fs::remove_dir_all(&target)?;
            } else {
                fs::remove_file(&target)?;
            }
            debug!(step = %context.step_id, path = %target.display(), "removed");
        }

        Ok(())
    }
}
