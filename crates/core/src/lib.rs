//! Baton Core Library
//!
//! This is the core library for the Baton build runner. It provides step and
//! task registration, execution planning, sequential execution and the
//! built-in capabilities.
//!
//! ## Architecture
//!
//! The core library is organized into several modules:
//!
//! - [`pipeline_manager`] - High-level interface that loads `.baton/` configuration
//! - [`orchestrator`] - Step/task registration and plan expansion
//! - [`execution`] - Plans, the sequential runner and progress reporting
//! - [`registry`] - Capability lookup by key
//! - [`capabilities`] - Built-in `exec`, `clean` and `copy` capabilities
//! - [`configs`] - Pipeline file parsing
//! - [`invocation`] - Command-line style task invocations and overrides
//! - [`results`] - Result types for pipeline manager operations
//! - [`types`] - Common error types and type aliases
//!
//! ## Usage
//!
//! Embedders can drive the [`Orchestrator`] directly:
//!
//! ```rust,no_run
//! use baton_core::execution::SilentReporter;
//! use baton_core::{CapabilityRegistry, Orchestrator, OrchestratorConfig};
//!
//! # fn example() -> baton_core::BatonResult<()> {
//! let mut orchestrator = Orchestrator::new(OrchestratorConfig::default(), CapabilityRegistry::with_builtins());
//! orchestrator.register_step("clean:dist", "clean", Default::default())?;
//! orchestrator.register_task("dist", ["clean:dist"])?;
//!
//! let report = orchestrator.run("dist", &Default::default(), &mut SilentReporter)?;
//! assert!(report.succeeded());
//! # Ok(())
//! # }
//! ```
//!
//! The CLI goes through [`PipelineManager`] instead, which reads the pipeline
//! files under `<root>/.baton/`.

pub mod capabilities;
pub mod configs;
pub mod execution;
pub mod invocation;
pub mod orchestrator;
pub mod pipeline_manager;
pub mod registry;
pub mod results;
pub mod types;

// Re-export the main types for easier usage
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use pipeline_manager::{PipelineManager, PipelineManagerConfig};
pub use registry::CapabilityRegistry;
pub use types::{BatonError, BatonResult};
