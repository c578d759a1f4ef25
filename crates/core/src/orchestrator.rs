//! Task orchestrator
//!
//! The [`Orchestrator`] owns the step and task tables. Both are filled during
//! configuration and only read afterwards: `run` and `plan` take `&self`.
//!
//! Task entries are resolved when the task is registered, in this order:
//! an exact step id, a task name, then a target group (every step whose id is
//! `<entry>:<target>`, in registration order). Anything else is an
//! [`BatonError::UnknownReference`], and reference cycles are rejected with
//! [`BatonError::CycleDetected`] before they can ever be expanded.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use baton_capability_protocol::{Capability, StepOptions};
use petgraph::algo::kosaraju_scc;
use petgraph::prelude::*;
use tracing::debug;

use crate::execution::plan::ExecutionPlan;
use crate::execution::report::Reporter;
use crate::execution::runner::{RunReport, TaskRunner};
use crate::registry::CapabilityRegistry;
use crate::types::{BatonError, BatonResult};

/// Immutable build configuration, constructed once at startup
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    /// Directory relative step paths are resolved against.
    pub root: PathBuf,
    /// Per-capability options applied below each step's own config.
    pub capability_defaults: BTreeMap<String, StepOptions>,
}

/// A registered step
#[derive(Clone)]
pub struct Step {
    pub id: String,
    pub capability_key: String,
    pub capability: Arc<dyn Capability>,
    pub config: StepOptions,
    pub description: Option<String>,
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("id", &self.id)
            .field("capability", &self.capability_key)
            .field("config", &self.config)
            .finish()
    }
}

/// A resolved task entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEntry {
    Step(String),
    Task(String),
    /// Every `name:*` step, frozen at registration.
    Group { name: String, steps: Vec<String> },
}

impl TaskEntry {
    /// The name as written in the task definition
    pub fn reference(&self) -> &str {
        match self {
            Self::Step(id) => id,
            Self::Task(name) => name,
            Self::Group { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Task {
    pub name: String,
    pub description: Option<String>,
    pub entries: Vec<TaskEntry>,
}

/// Input for [`Orchestrator::register_step_definition`]
#[derive(Debug, Clone)]
pub struct StepDefinition {
    pub id: String,
    pub capability: String,
    pub config: StepOptions,
    pub description: Option<String>,
}

/// Input for [`Orchestrator::register_tasks`]
#[derive(Debug, Clone)]
pub struct TaskDefinition {
    pub name: String,
    pub sequence: Vec<String>,
    pub description: Option<String>,
}

impl TaskDefinition {
    pub fn new<S: Into<String>>(name: impl Into<String>, sequence: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            sequence: sequence.into_iter().map(Into::into).collect(),
            description: None,
        }
    }
}

pub struct Orchestrator {
    config: OrchestratorConfig,
    registry: CapabilityRegistry,
    steps: Vec<Step>,
    step_index: HashMap<String, usize>,
    tasks: Vec<Task>,
    task_index: HashMap<String, usize>,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig, registry: CapabilityRegistry) -> Self {
        Self {
            config,
            registry,
            steps: Vec::new(),
            step_index: HashMap::new(),
            tasks: Vec::new(),
            task_index: HashMap::new(),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Register a step bound to a capability from the registry
    pub fn register_step(
        &mut self,
        id: impl Into<String>,
        capability: &str,
        config: StepOptions,
    ) -> BatonResult<()> {
        self.register_step_definition(StepDefinition {
            id: id.into(),
            capability: capability.to_string(),
            config,
            description: None,
        })
    }

    pub fn register_step_definition(&mut self, definition: StepDefinition) -> BatonResult<()> {
        validate_name(&definition.id)?;
        if self.is_registered(&definition.id) {
            return Err(BatonError::DuplicateId { id: definition.id });
        }

        let capability = self.registry.get(&definition.capability).ok_or_else(|| {
            BatonError::UnknownCapability {
                step: definition.id.clone(),
                capability: definition.capability.clone(),
            }
        })?;

        debug!(step = %definition.id, capability = %definition.capability, "registered step");
        self.step_index.insert(definition.id.clone(), self.steps.len());
        self.steps.push(Step {
            id: definition.id,
            capability_key: definition.capability,
            capability,
            config: definition.config,
            description: definition.description,
        });
        Ok(())
    }

    /// Register a task whose entries must already be registered
    pub fn register_task<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        sequence: impl IntoIterator<Item = S>,
    ) -> BatonResult<()> {
        self.register_tasks(vec![TaskDefinition::new(name, sequence)])
    }

    /// Register several tasks at once.
    ///
    /// Entries may reference any task of the same batch. The batch is
    /// validated as a whole and registered atomically.
    pub fn register_tasks(&mut self, batch: Vec<TaskDefinition>) -> BatonResult<()> {
        let mut batch_names = HashSet::new();
        for definition in &batch {
            validate_name(&definition.name)?;
            if self.is_registered(&definition.name) || !batch_names.insert(definition.name.as_str()) {
                return Err(BatonError::DuplicateId {
                    id: definition.name.clone(),
                });
            }
        }

        let mut resolved = Vec::with_capacity(batch.len());
        for definition in &batch {
            let mut entries = Vec::with_capacity(definition.sequence.len());
            for reference in &definition.sequence {
                if *reference == definition.name {
                    return Err(BatonError::CycleDetected {
                        cycle: vec![definition.name.clone()],
                    });
                }
                let entry = self
                    .resolve_reference(reference, &batch_names)
                    .ok_or_else(|| BatonError::UnknownReference {
                        reference: reference.clone(),
                        referenced_by: Some(definition.name.clone()),
                    })?;
                entries.push(entry);
            }
            resolved.push(entries);
        }

        detect_cycles(&batch, &resolved)?;

        for (definition, entries) in batch.into_iter().zip(resolved) {
            debug!(task = %definition.name, entries = entries.len(), "registered task");
            self.task_index.insert(definition.name.clone(), self.tasks.len());
            self.tasks.push(Task {
                name: definition.name,
                description: definition.description,
                entries,
            });
        }
        Ok(())
    }

    /// Resolve `name` into an execution plan without running it
    pub fn plan(&self, name: &str) -> BatonResult<ExecutionPlan> {
        let root = self
            .resolve_reference(name, &HashSet::new())
            .ok_or_else(|| BatonError::UnknownReference {
                reference: name.to_string(),
                referenced_by: None,
            })?;

        let mut ids = Vec::new();
        self.expand_entry(&root, &mut ids);

        let steps = ids
            .into_iter()
            .filter_map(|id| {
                self.step(id)
                    .map(|step| (step.id.clone(), step.capability_key.clone()))
            })
            .collect();
        Ok(ExecutionPlan::from_steps(name, steps))
    }

    /// Expand `name` and run every step in order, stopping at the first failure
    pub fn run(
        &self,
        name: &str,
        overrides: &StepOptions,
        reporter: &mut dyn Reporter,
    ) -> BatonResult<RunReport> {
        TaskRunner::new(self).run(name, overrides, reporter)
    }

    pub fn step(&self, id: &str) -> Option<&Step> {
        self.step_index.get(id).map(|&i| &self.steps[i])
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.task_index.get(name).map(|&i| &self.tasks[i])
    }

    /// Steps in registration order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Tasks in registration order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Graph of tasks and steps, with an edge from each task to every entry it runs
    pub fn task_graph(&self) -> DiGraph<String, ()> {
        let mut graph = DiGraph::<String, ()>::new();
        let mut nodes = HashMap::new();

        for task in &self.tasks {
            nodes.insert(task.name.clone(), graph.add_node(task.name.clone()));
        }
        for step in &self.steps {
            nodes.insert(step.id.clone(), graph.add_node(step.id.clone()));
        }

        for task in &self.tasks {
            let from = nodes[&task.name];
            for entry in &task.entries {
                let targets: Vec<&String> = match entry {
                    TaskEntry::Step(id) | TaskEntry::Task(id) => vec![id],
                    TaskEntry::Group { steps, .. } => steps.iter().collect(),
                };
                for target in targets {
                    if let Some(&to) = nodes.get(target) {
                        graph.update_edge(from, to, ());
                    }
                }
            }
        }

        graph
    }

    fn is_registered(&self, name: &str) -> bool {
        self.step_index.contains_key(name) || self.task_index.contains_key(name)
    }

    fn resolve_reference(&self, reference: &str, batch_names: &HashSet<&str>) -> Option<TaskEntry> {
        if self.step_index.contains_key(reference) {
            return Some(TaskEntry::Step(reference.to_string()));
        }
        if self.task_index.contains_key(reference) || batch_names.contains(reference) {
            return Some(TaskEntry::Task(reference.to_string()));
        }

        let prefix = format!("{}:", reference);
        let group: Vec<String> = self
            .steps
            .iter()
            .filter(|step| step.id.starts_with(&prefix))
            .map(|step| step.id.clone())
            .collect();
        if group.is_empty() {
            None
        } else {
            Some(TaskEntry::Group {
                name: reference.to_string(),
                steps: group,
            })
        }
    }

    fn expand_entry<'a>(&'a self, entry: &'a TaskEntry, out: &mut Vec<&'a str>) {
        match entry {
            TaskEntry::Step(id) => out.push(id),
            TaskEntry::Group { steps, .. } => out.extend(steps.iter().map(String::as_str)),
            TaskEntry::Task(name) => {
                // Registration guarantees the task graph is acyclic.
                if let Some(task) = self.task(name) {
                    for child in &task.entries {
                        self.expand_entry(child, out);
                    }
                }
            }
        }
    }
}

fn validate_name(name: &str) -> BatonResult<()> {
    if name.trim().is_empty() {
        return Err(BatonError::Config("Step ids and task names must not be empty".to_string()));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(BatonError::Config(format!(
            "'{}' contains whitespace; step ids and task names must not",
            name
        )));
    }
    Ok(())
}

/// Reject reference cycles among the tasks of one batch.
///
/// Tasks registered earlier can never point into the batch, so only edges
/// between batch members can close a cycle.
fn detect_cycles(batch: &[TaskDefinition], resolved: &[Vec<TaskEntry>]) -> BatonResult<()> {
    let mut graph = DiGraph::<String, ()>::new();
    let mut node_indices = HashMap::new();

    for definition in batch {
        let node_index = graph.add_node(definition.name.clone());
        node_indices.insert(definition.name.as_str(), node_index);
    }

    for (definition, entries) in batch.iter().zip(resolved) {
        let from_node = node_indices[definition.name.as_str()];
        for entry in entries {
            if let TaskEntry::Task(name) = entry {
                if let Some(&to_node) = node_indices.get(name.as_str()) {
                    graph.update_edge(from_node, to_node, ());
                }
            }
        }
    }

    // Detect cycles using strongly connected components
    let mut cycles: Vec<Vec<String>> = kosaraju_scc(&graph)
        .into_iter()
        .filter(|component| component.len() > 1)
        .map(|component| cycle_path(&graph, &component))
        .collect();

    cycles.sort();
    match cycles.into_iter().next() {
        Some(cycle) => Err(BatonError::CycleDetected { cycle }),
        None => Ok(()),
    }
}

/// Walk one concrete cycle through a strongly connected component, starting
/// from its alphabetically first task.
fn cycle_path(graph: &DiGraph<String, ()>, component: &[NodeIndex]) -> Vec<String> {
    let members: HashSet<NodeIndex> = component.iter().copied().collect();
    let Some(&start) = component.iter().min_by_key(|node| &graph[**node]) else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut visited = HashSet::from([start]);
    if !extend_to_start(graph, &members, start, &mut path, &mut visited) {
        // Every node of a non-trivial SCC lies on a cycle through the start.
        let mut names: Vec<String> = component.iter().map(|node| graph[*node].clone()).collect();
        names.sort();
        return names;
    }
    path.into_iter().map(|node| graph[node].clone()).collect()
}

fn extend_to_start(
    graph: &DiGraph<String, ()>,
    members: &HashSet<NodeIndex>,
    start: NodeIndex,
    path: &mut Vec<NodeIndex>,
    visited: &mut HashSet<NodeIndex>,
) -> bool {
    let Some(&current) = path.last() else {
        return false;
    };

    let mut neighbors: Vec<NodeIndex> = graph
        .neighbors(current)
        .filter(|node| members.contains(node))
        .collect();
    neighbors.sort_by(|a, b| graph[*a].cmp(&graph[*b]));

    for next in neighbors {
        if next == start {
            return true;
        }
        if visited.insert(next) {
            path.push(next);
            if extend_to_start(graph, members, start, path, visited) {
                return true;
            }
            path.pop();
        }
    }
    false
}
