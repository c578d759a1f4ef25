//! High-level task runner
//!
//! This module drives a single `run` invocation through its states:
//! `Pending → Expanding → Executing(i) → Succeeded | Failed(i)`.

use std::time::{Duration, Instant};

use baton_capability_protocol::{merge_options, StepContext, StepOptions};
use tracing::{debug, info};

use crate::execution::plan::{ExecutionPlan, PlannedStep};
use crate::execution::report::Reporter;
use crate::orchestrator::{Orchestrator, Step};
use crate::types::{BatonError, BatonResult};

/// Lifecycle of one `run` invocation. Positions are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Expanding,
    Executing(usize),
    Succeeded,
    Failed(usize),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }
}

/// A step that completed successfully
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub id: String,
    pub position: usize,
    pub duration: Duration,
}

/// What happened during a run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub plan: ExecutionPlan,
    pub state: RunState,
    pub completed: Vec<StepOutcome>,
    pub duration: Duration,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.state == RunState::Succeeded
    }

    /// The step the run stopped at, if it failed
    pub fn failed_step(&self) -> Option<&PlannedStep> {
        match self.state {
            RunState::Failed(position) => self.plan.steps.get(position - 1),
            _ => None,
        }
    }
}

/// Executes plans produced by an [`Orchestrator`]
pub struct TaskRunner<'a> {
    orchestrator: &'a Orchestrator,
    state: RunState,
}

impl<'a> TaskRunner<'a> {
    pub fn new(orchestrator: &'a Orchestrator) -> Self {
        Self {
            orchestrator,
            state: RunState::Pending,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Expand `target` and run its steps in order.
    ///
    /// Returns the report on success. On the first failing step the remaining
    /// steps are skipped, the reporter receives the failed report, and the
    /// capability error is returned wrapped in [`BatonError::StepExecution`].
    pub fn run(
        &mut self,
        target: &str,
        overrides: &StepOptions,
        reporter: &mut dyn Reporter,
    ) -> BatonResult<RunReport> {
        let started = Instant::now();
        let orchestrator = self.orchestrator;

        self.transition(RunState::Expanding);
        let plan = orchestrator.plan(target)?;
        debug!(task = target, steps = plan.len(), "execution plan ready");
        reporter.plan_ready(&plan);

        let total = plan.len();
        let mut completed = Vec::with_capacity(total);

        for planned in &plan.steps {
            self.transition(RunState::Executing(planned.position));
            reporter.step_started(planned, total);

            let step = orchestrator.step(&planned.id).ok_or_else(|| {
                BatonError::Config(format!("Step '{}' is not registered", planned.id))
            })?;
            let context = self.step_context(step, overrides);
            let step_started = Instant::now();
            let result = step.capability.execute(&context);
            let duration = step_started.elapsed();

            match result {
                Ok(()) => {
                    info!(step = %planned.id, position = planned.position, total, ?duration, "step succeeded");
                    reporter.step_succeeded(planned, duration);
                    completed.push(StepOutcome {
                        id: planned.id.clone(),
                        position: planned.position,
                        duration,
                    });
                }
                Err(source) => {
                    self.transition(RunState::Failed(planned.position));
                    info!(step = %planned.id, position = planned.position, total, error = %source, "step failed");
                    reporter.step_failed(planned, &source);
                    reporter.run_finished(&RunReport {
                        plan: plan.clone(),
                        state: self.state,
                        completed,
                        duration: started.elapsed(),
                    });
                    return Err(BatonError::StepExecution {
                        step_id: planned.id.clone(),
                        position: planned.position,
                        total,
                        source,
                    });
                }
            }
        }

        self.transition(RunState::Succeeded);
        let report = RunReport {
            plan,
            state: self.state,
            completed,
            duration: started.elapsed(),
        };
        reporter.run_finished(&report);
        Ok(report)
    }

    /// Options are layered as capability defaults, step config, then overrides.
    fn step_context(&self, step: &Step, overrides: &StepOptions) -> StepContext {
        let config = self.orchestrator.config();
        let empty = StepOptions::new();
        let defaults = config
            .capability_defaults
            .get(&step.capability_key)
            .unwrap_or(&empty);

        StepContext::new(
            step.id.clone(),
            config.root.clone(),
            merge_options([defaults, &step.config, overrides]),
        )
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = ?self.state, to = ?next, "run state");
        self.state = next;
    }
}
