//! Flattened execution plans

/// One step occurrence in a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    /// 1-based position in the plan.
    pub position: usize,
    pub id: String,
    pub capability: String,
}

/// The ordered list of steps a single `run` will execute.
///
/// Produced by expanding a task depth-first, left to right. A step reachable
/// through several paths appears once per occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// Name the plan was resolved from (task, step id or target group).
    pub target: String,
    pub steps: Vec<PlannedStep>,
}

impl ExecutionPlan {
    pub(crate) fn from_steps(target: &str, steps: Vec<(String, String)>) -> Self {
        let steps = steps
            .into_iter()
            .enumerate()
            .map(|(i, (id, capability))| PlannedStep {
                position: i + 1,
                id,
                capability,
            })
            .collect();
        Self {
            target: target.to_string(),
            steps,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step ids in execution order
    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id.as_str()).collect()
    }
}
