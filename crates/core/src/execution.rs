//! Task execution module
//!
//! This module handles plan representation, step execution and progress
//! reporting. Steps always run one after another.

pub mod command;
pub mod plan;
pub mod report;
pub mod runner;

pub use command::CommandExecutor;
pub use plan::{ExecutionPlan, PlannedStep};
pub use report::{ConsoleReporter, Reporter, SilentReporter};
pub use runner::{RunReport, RunState, StepOutcome, TaskRunner};
