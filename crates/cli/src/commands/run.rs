use anyhow::Result;
use baton_core::execution::ConsoleReporter;
use baton_core::invocation::Invocation;
use baton_core::pipeline_manager::PipelineManager;
use colored::*;

pub fn execute(manager: &PipelineManager, args: &[String]) -> Result<()> {
    let invocation = Invocation::parse(args)?;
    println!("{} {}", "Running task".bold(), invocation.task.cyan());
    println!();

    let report = manager
        .run_task(&invocation.task, &invocation.overrides, &mut ConsoleReporter::new())
        .map_err(|e| anyhow::anyhow!("Failed to run task: {}", e))?;

    println!();
    println!(
        "{} {}",
        "✓".green().bold(),
        format!(
            "{} step(s) completed in {:.2}s",
            report.completed.len(),
            report.duration.as_secs_f64()
        )
        .green()
        .bold()
    );

    Ok(())
}
