//! High-level pipeline management interface
//!
//! This module provides the [`PipelineManager`] which serves as the primary
//! interface for the CLI. It loads the pipeline files under `<root>/.baton/`,
//! registers their steps and tasks with an [`Orchestrator`] and exposes
//! listing, planning, graphing and running.
//!
//! ## Example
//!
//! ```rust,no_run
//! use baton_core::execution::ConsoleReporter;
//! use baton_core::pipeline_manager::{PipelineManager, PipelineManagerConfig};
//! use std::path::PathBuf;
//!
//! # fn example() -> baton_core::types::BatonResult<()> {
//! let manager = PipelineManager::new(PipelineManagerConfig::new(PathBuf::from(".")))?;
//!
//! // Inspect the execution order of a task
//! let plan = manager.get_execution_plan("dist")?;
//!
//! // Run it
//! manager.run_task("dist", &Default::default(), &mut ConsoleReporter::new())?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use baton_capability_protocol::StepOptions;
use tracing::{debug, warn};

use crate::configs::pipeline::{parse_pipeline_config, parse_pipeline_config_toml, PipelineConfig};
use crate::execution::plan::ExecutionPlan;
use crate::execution::report::Reporter;
use crate::execution::runner::RunReport;
use crate::orchestrator::{Orchestrator, OrchestratorConfig, StepDefinition, TaskDefinition};
use crate::registry::CapabilityRegistry;
use crate::results::{CapabilityInfo, PipelineListResult, StepInfo, TaskGraphResult, TaskInfo};
use crate::types::{BatonError, BatonResult};

/// Directory holding pipeline files, relative to the root
pub const CONFIG_DIR: &str = ".baton";

/// Main pipeline file names, tried in order
const PIPELINE_FILES: [&str; 3] = ["pipeline.yml", "pipeline.yaml", "pipeline.toml"];

/// High-level pipeline manager that owns the configured orchestrator
pub struct PipelineManager {
    pub pipeline_config: PipelineConfig,
    orchestrator: Orchestrator,
}

/// Configuration for initializing a pipeline manager
pub struct PipelineManagerConfig {
    pub root: PathBuf,
    /// Main pipeline file; defaults to `<root>/.baton/pipeline.{yml,yaml,toml}`.
    pub config_file: Option<PathBuf>,
    pub registry: CapabilityRegistry,
}

impl PipelineManagerConfig {
    /// Load from `root` with the built-in capabilities
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config_file: None,
            registry: CapabilityRegistry::with_builtins(),
        }
    }
}

impl PipelineManager {
    /// Load the pipeline files of `config.root` and register everything they declare
    pub fn new(config: PipelineManagerConfig) -> BatonResult<Self> {
        let root = config.root.canonicalize().map_err(|e| {
            BatonError::Config(format!("Failed to open pipeline root {}: {}", config.root.display(), e))
        })?;

        let pipeline_config = Self::load_pipeline_config(&root, config.config_file.as_deref())?;
        Self::from_config(root, pipeline_config, config.registry)
    }

    /// Build a manager from an already parsed pipeline
    pub fn from_config(
        root: PathBuf,
        pipeline_config: PipelineConfig,
        registry: CapabilityRegistry,
    ) -> BatonResult<Self> {
        for capability in pipeline_config.capability_defaults.keys() {
            if !registry.contains(capability) {
                warn!(capability = %capability, "defaults given for unknown capability");
            }
        }

        let mut orchestrator = Orchestrator::new(
            OrchestratorConfig {
                root,
                capability_defaults: pipeline_config.capability_defaults.clone(),
            },
            registry,
        );

        for step in &pipeline_config.steps {
            orchestrator.register_step_definition(StepDefinition {
                id: step.id.clone(),
                capability: step.capability.clone(),
                config: step.config.clone(),
                description: step.description.clone(),
            })?;
        }

        let batch = pipeline_config
            .tasks
            .iter()
            .map(|task| TaskDefinition {
                description: task.description.clone(),
                ..TaskDefinition::new(task.name.clone(), task.steps.iter().cloned())
            })
            .collect();
        orchestrator.register_tasks(batch)?;

        debug!(
            steps = orchestrator.steps().len(),
            tasks = orchestrator.tasks().len(),
            "pipeline loaded"
        );

        Ok(Self {
            pipeline_config,
            orchestrator,
        })
    }

    pub fn root(&self) -> &Path {
        &self.orchestrator.config().root
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// List all tasks and steps in registration order
    pub fn list(&self) -> PipelineListResult {
        PipelineListResult {
            name: self.pipeline_config.name.clone(),
            description: self.pipeline_config.description.clone(),
            root: self.root().to_path_buf(),
            tasks: self.orchestrator.tasks().iter().map(TaskInfo::from).collect(),
            steps: self.orchestrator.steps().iter().map(StepInfo::from).collect(),
        }
    }

    /// Get execution plan for a task, step or target group
    pub fn get_execution_plan(&self, target: &str) -> BatonResult<ExecutionPlan> {
        self.orchestrator.plan(target)
    }

    /// Run a task, stopping at the first failing step
    pub fn run_task(
        &self,
        target: &str,
        overrides: &StepOptions,
        reporter: &mut dyn Reporter,
    ) -> BatonResult<RunReport> {
        self.orchestrator.run(target, overrides, reporter)
    }

    /// Get task graph information
    pub fn get_task_graph(&self) -> TaskGraphResult {
        TaskGraphResult {
            graph: self.orchestrator.task_graph(),
            tasks: self.orchestrator.tasks().iter().map(TaskInfo::from).collect(),
        }
    }

    /// Capabilities steps may use, sorted by key
    pub fn capabilities(&self) -> Vec<CapabilityInfo> {
        self.orchestrator
            .registry()
            .iter()
            .map(|capability| CapabilityInfo::from_capability(capability.as_ref()))
            .collect()
    }

    // Private helper methods

    fn load_pipeline_config(root: &Path, config_file: Option<&Path>) -> BatonResult<PipelineConfig> {
        let config_dir = root.join(CONFIG_DIR);

        let main_path = match config_file {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => root.join(path),
            None => PIPELINE_FILES
                .iter()
                .map(|name| config_dir.join(name))
                .find(|path| path.is_file())
                .ok_or_else(|| {
                    BatonError::Config(format!(
                        "No pipeline file found; expected {}/pipeline.yml",
                        config_dir.display()
                    ))
                })?,
        };

        let mut pipeline_config = Self::load_file(&main_path)?;

        let tasks_dir = config_dir.join("tasks");
        if tasks_dir.is_dir() {
            let mut extra_files = Vec::new();
            for entry in std::fs::read_dir(&tasks_dir).map_err(|e| {
                BatonError::Config(format!("Failed to read tasks directory {}: {}", tasks_dir.display(), e))
            })? {
                let entry = entry.map_err(|e| BatonError::Config(format!("Failed to read directory entry: {}", e)))?;
                let path = entry.path();
                if matches!(path.extension().and_then(|s| s.to_str()), Some("yml" | "yaml" | "toml")) {
                    extra_files.push(path);
                }
            }

            extra_files.sort();
            for path in extra_files {
                pipeline_config.merge(Self::load_file(&path)?);
            }
        }

        Ok(pipeline_config)
    }

    fn load_file(path: &Path) -> BatonResult<PipelineConfig> {
        debug!(path = %path.display(), "loading pipeline file");
        let content = std::fs::read_to_string(path).map_err(|e| {
            BatonError::Config(format!("Failed to read pipeline file {}: {}", path.display(), e))
        })?;

        let parsed = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            parse_pipeline_config_toml(&content)
        } else {
            parse_pipeline_config(&content)
        };
        parsed.map_err(|e| BatonError::Config(format!("Failed to parse pipeline file {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::report::SilentReporter;
    use std::fs;

    const PIPELINE: &str = r#"
name: site
steps:
  - id: clean:dist
    capability: clean
    config: { paths: dist }
  - id: build:html
    capability: exec
    config: { command: "mkdir -p dist && echo html > dist/index.html" }
  - id: build:css
    capability: exec
    config: { command: "mkdir -p dist && echo \"$BATON_OPT_COLOR\" > dist/site.css" }
tasks:
  - name: default
  - name: dist
    description: Build the site
    steps: [clean:dist, build]
"#;

    fn pipeline_root(pipeline: &str) -> tempfile::TempDir {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_dir = temp_dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("pipeline.yml"), pipeline).unwrap();
        temp_dir
    }

    fn manager(root: &Path) -> PipelineManager {
        PipelineManager::new(PipelineManagerConfig::new(root.to_path_buf())).unwrap()
    }

    #[test]
    fn loads_and_lists_pipeline() {
        let temp_dir = pipeline_root(PIPELINE);
        let manager = manager(temp_dir.path());

        let list = manager.list();
        assert_eq!(list.name.as_deref(), Some("site"));
        let tasks: Vec<_> = list.tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tasks, vec!["default", "dist"]);
        assert_eq!(list.tasks[1].entries, vec!["clean:dist", "build"]);
        assert_eq!(list.tasks[1].resolved, vec!["clean:dist", "build:html", "build:css"]);
        assert_eq!(list.tasks[1].description.as_deref(), Some("Build the site"));
        assert_eq!(list.steps.len(), 3);
    }

    #[test]
    fn plans_groups_and_runs_with_overrides() {
        let temp_dir = pipeline_root(PIPELINE);
        let manager = manager(temp_dir.path());

        let plan = manager.get_execution_plan("dist").unwrap();
        assert_eq!(plan.step_ids(), vec!["clean:dist", "build:html", "build:css"]);

        let mut overrides = StepOptions::new();
        overrides.insert("color".to_string(), serde_json::json!("teal"));
        let report = manager.run_task("dist", &overrides, &mut SilentReporter).unwrap();

        assert!(report.succeeded());
        let css = fs::read_to_string(temp_dir.path().join("dist/site.css")).unwrap();
        assert_eq!(css.trim(), "teal");
    }

    #[test]
    fn merges_task_files_in_name_order() {
        let temp_dir = pipeline_root(PIPELINE);
        let tasks_dir = temp_dir.path().join(CONFIG_DIR).join("tasks");
        fs::create_dir_all(&tasks_dir).unwrap();
        fs::write(tasks_dir.join("b.yml"), "tasks:\n  - name: release\n    steps: [ci]\n").unwrap();
        fs::write(tasks_dir.join("a.yml"), "tasks:\n  - name: ci\n    steps: [dist]\n").unwrap();
        fs::write(tasks_dir.join("notes.txt"), "ignored").unwrap();

        let manager = manager(temp_dir.path());

        let names: Vec<_> = manager.list().tasks.into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["default", "dist", "ci", "release"]);
        assert_eq!(manager.get_execution_plan("release").unwrap().len(), 3);
    }

    #[test]
    fn loads_toml_pipeline() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_dir = temp_dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join("pipeline.toml"),
            "[[steps]]\nid = \"hello\"\ncapability = \"exec\"\nconfig = { command = \"true\" }\n\n[[tasks]]\nname = \"default\"\nsteps = [\"hello\"]\n",
        )
        .unwrap();

        let manager = manager(temp_dir.path());
        assert_eq!(manager.get_execution_plan("default").unwrap().step_ids(), vec!["hello"]);
    }

    #[test]
    fn explicit_config_file_is_relative_to_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("ci.yml"), "tasks:\n  - name: default\n").unwrap();

        let manager = PipelineManager::new(PipelineManagerConfig {
            config_file: Some(PathBuf::from("ci.yml")),
            ..PipelineManagerConfig::new(temp_dir.path().to_path_buf())
        })
        .unwrap();

        assert!(manager.get_execution_plan("default").unwrap().is_empty());
    }

    #[test]
    fn missing_pipeline_file_is_a_config_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = PipelineManager::new(PipelineManagerConfig::new(temp_dir.path().to_path_buf()))
            .err()
            .unwrap();
        assert!(matches!(err, BatonError::Config(_)));
    }

    #[test]
    fn registration_errors_surface_at_load() {
        let temp_dir = pipeline_root("steps:\n  - id: minify\n    capability: uglify\n");
        let err = PipelineManager::new(PipelineManagerConfig::new(temp_dir.path().to_path_buf()))
            .err()
            .unwrap();
        assert!(matches!(err, BatonError::UnknownCapability { .. }));

        let temp_dir = pipeline_root("tasks:\n  - name: a\n    steps: [b]\n  - name: b\n    steps: [a]\n");
        let err = PipelineManager::new(PipelineManagerConfig::new(temp_dir.path().to_path_buf()))
            .err()
            .unwrap();
        assert!(matches!(err, BatonError::CycleDetected { .. }));
    }

    #[test]
    fn lists_builtin_capabilities() {
        let temp_dir = pipeline_root(PIPELINE);
        let keys: Vec<_> = manager(temp_dir.path())
            .capabilities()
            .into_iter()
            .map(|c| c.key)
            .collect();
        assert_eq!(keys, vec!["clean", "copy", "exec"]);
    }
}
