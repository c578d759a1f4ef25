//! Result types for pipeline operations
//!
//! This module contains the result types returned by pipeline manager
//! operations, providing a centralized location for output structures.

use std::path::PathBuf;

use baton_capability_protocol::Capability;

use crate::orchestrator::{Step, Task, TaskEntry};

/// A registered task and the references it runs, in order
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: String,
    pub description: Option<String>,
    pub entries: Vec<String>,
    /// Entries with target groups expanded to their steps
    pub resolved: Vec<String>,
}

/// A registered step
#[derive(Debug, Clone)]
pub struct StepInfo {
    pub id: String,
    pub capability: String,
    pub description: Option<String>,
}

/// Result of listing the pipeline
#[derive(Debug)]
pub struct PipelineListResult {
    pub name: Option<String>,
    pub description: Option<String>,
    pub root: PathBuf,
    pub tasks: Vec<TaskInfo>,
    pub steps: Vec<StepInfo>,
}

/// Result of getting the task graph
#[derive(Debug)]
pub struct TaskGraphResult {
    pub graph: petgraph::Graph<String, ()>,
    /// Each task with the references it runs
    pub tasks: Vec<TaskInfo>,
}

/// A capability available to steps
#[derive(Debug, Clone)]
pub struct CapabilityInfo {
    pub key: String,
    pub name: String,
    pub description: String,
    pub configuration_options: Option<serde_json::Value>,
}

impl CapabilityInfo {
    pub fn from_capability(capability: &dyn Capability) -> Self {
        Self {
            key: capability.key().to_string(),
            name: capability.name().to_string(),
            description: capability.description().to_string(),
            configuration_options: capability.configuration_options(),
        }
    }
}

impl From<&Task> for TaskInfo {
    fn from(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            description: task.description.clone(),
            entries: task.entries.iter().map(|e| e.reference().to_string()).collect(),
            resolved: task
                .entries
                .iter()
                .flat_map(|entry| match entry {
                    TaskEntry::Group { steps, .. } => steps.clone(),
                    other => vec![other.reference().to_string()],
                })
                .collect(),
        }
    }
}

impl From<&Step> for StepInfo {
    fn from(step: &Step) -> Self {
        Self {
            id: step.id.clone(),
            capability: step.capability_key.clone(),
            description: step.description.clone(),
        }
    }
}
