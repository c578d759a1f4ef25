//! Progress reporting for task runs

use std::time::Duration;

use baton_capability_protocol::CapabilityError;
use colored::*;

use crate::execution::plan::{ExecutionPlan, PlannedStep};
use crate::execution::runner::RunReport;

/// Receives progress events while a run executes.
///
/// Every method has an empty default so implementors only pick what they need.
pub trait Reporter {
    fn plan_ready(&mut self, _plan: &ExecutionPlan) {}

    fn step_started(&mut self, _step: &PlannedStep, _total: usize) {}

    fn step_succeeded(&mut self, _step: &PlannedStep, _duration: Duration) {}

    fn step_failed(&mut self, _step: &PlannedStep, _error: &CapabilityError) {}

    fn run_finished(&mut self, _report: &RunReport) {}
}

/// Reports nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl Reporter for SilentReporter {}

/// Prints progress to the terminal
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    total: usize,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for ConsoleReporter {
    fn plan_ready(&mut self, plan: &ExecutionPlan) {
        self.total = plan.len();
        if plan.is_empty() {
            println!("{} {}", "Nothing to run for".dimmed(), plan.target.cyan());
        }
    }

    fn step_started(&mut self, step: &PlannedStep, total: usize) {
        let branch = if step.position == 1 { "┌─" } else { "├─" };
        println!(
            "{} {} {} {}",
            branch.dimmed(),
            format!("[{}/{}]", step.position, total).dimmed(),
            step.id.color(get_step_color(&step.id)).bold(),
            format!("({})", step.capability).dimmed()
        );
    }

    fn step_succeeded(&mut self, step: &PlannedStep, duration: Duration) {
        let branch = if step.position == self.total { "└─" } else { "│ " };
        println!(
            "{} {} {}",
            branch.dimmed(),
            "✓".green(),
            format_duration(duration).dimmed()
        );
    }

    fn step_failed(&mut self, step: &PlannedStep, error: &CapabilityError) {
        eprintln!(
            "{} {} {} {}",
            "└─".dimmed(),
            "✗".red().bold(),
            step.id.red().bold(),
            error
        );
    }

    fn run_finished(&mut self, report: &RunReport) {
        if let Some(step) = report.failed_step() {
            eprintln!(
                "{} after {} of {} step(s), stopped at '{}'",
                "Aborted".red().bold(),
                report.completed.len(),
                report.plan.len(),
                step.id
            );
        }
    }
}

/// Stable label color for a step id
pub fn get_step_color(step_id: &str) -> Color {
    let hash = step_id
        .bytes()
        .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));

    // Label colors that stay clear of the red/green used for outcomes
    let colors = [
        Color::TrueColor { r: 147, g: 112, b: 219 },
        Color::TrueColor { r: 64, g: 224, b: 208 },
        Color::TrueColor { r: 255, g: 140, b: 0 },
        Color::TrueColor { r: 199, g: 21, b: 133 },
        Color::TrueColor { r: 72, g: 209, b: 204 },
        Color::TrueColor { r: 138, g: 43, b: 226 },
    ];

    colors[(hash % colors.len() as u64) as usize]
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
