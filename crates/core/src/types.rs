use baton_capability_protocol::CapabilityError;
use thiserror::Error;

/// The main error type for Baton operations
#[derive(Debug, Error)]
pub enum BatonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A step id or task name is already registered.
    #[error("'{id}' is already registered")]
    DuplicateId { id: String },

    /// A task entry (or a requested name) resolves to no step, task or target group.
    #[error("{}", describe_unknown_reference(.reference, .referenced_by.as_deref()))]
    UnknownReference {
        reference: String,
        referenced_by: Option<String>,
    },

    /// Expanding a task would recurse into itself.
    #[error("Circular task reference detected: {}", format_cycle(.cycle))]
    CycleDetected { cycle: Vec<String> },

    /// A step names a capability that is not in the registry.
    #[error("Step '{step}' uses unknown capability '{capability}'")]
    UnknownCapability { step: String, capability: String },

    #[error("Capability '{0}' is already registered")]
    DuplicateCapability(String),

    #[error("Invalid capability key: {0}")]
    InvalidCapabilityKey(String),

    /// A step's capability failed during `run`.
    #[error("Step '{step_id}' ({position}/{total}) failed: {source}")]
    StepExecution {
        step_id: String,
        position: usize,
        total: usize,
        #[source]
        source: CapabilityError,
    },

    #[error("Invalid override '{0}': expected --option=value")]
    InvalidOverride(String),
}

impl BatonError {
    /// Id of the step that failed, for execution errors.
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            Self::StepExecution { step_id, .. } => Some(step_id),
            _ => None,
        }
    }
}

fn describe_unknown_reference(reference: &str, referenced_by: Option<&str>) -> String {
    match referenced_by {
        Some(task) => format!("Task '{}' references unknown step or task '{}'", task, reference),
        None => format!("Unknown step or task '{}'", reference),
    }
}

/// Render a cycle as `a -> b -> a`.
pub fn format_cycle(cycle: &[String]) -> String {
    let mut path = cycle.to_vec();
    if let Some(first) = path.first().cloned() {
        path.push(first);
    }
    path.join(" -> ")
}

/// Result type alias for Baton operations
pub type BatonResult<T> = Result<T, BatonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_is_rendered_as_closed_path() {
        let err = BatonError::CycleDetected {
            cycle: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "Circular task reference detected: a -> b -> a");
    }

    #[test]
    fn step_execution_error_names_step_and_position() {
        let err = BatonError::StepExecution {
            step_id: "uglify:dist".to_string(),
            position: 4,
            total: 7,
            source: CapabilityError::MissingOption("command".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Step 'uglify:dist' (4/7) failed: missing required option 'command'"
        );
        assert_eq!(err.failed_step(), Some("uglify:dist"));
    }

    #[test]
    fn unknown_reference_mentions_referencing_task() {
        let err = BatonError::UnknownReference {
            reference: "missing".to_string(),
            referenced_by: Some("dist".to_string()),
        };
        assert!(err.to_string().contains("Task 'dist'"));
        assert!(err.to_string().contains("'missing'"));
    }
}
