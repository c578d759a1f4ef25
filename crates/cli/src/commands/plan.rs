use anyhow::Result;
use baton_core::execution::report::get_step_color;
use baton_core::pipeline_manager::PipelineManager;
use colored::*;

pub fn execute(manager: &PipelineManager, task: &str) -> Result<()> {
    println!("{} {}", "Execution plan for".bold(), task.cyan());

    let plan = manager
        .get_execution_plan(task)
        .map_err(|e| anyhow::anyhow!("Failed to get execution plan: {}", e))?;

    if plan.is_empty() {
        println!("  {}", "No steps to run".dimmed());
        return Ok(());
    }

    println!("\n{}:", "Execution order".bold());
    for step in &plan.steps {
        println!(
            "  {}. {} {}",
            step.position,
            step.id.color(get_step_color(&step.id)),
            format!("({})", step.capability).dimmed()
        );
    }

    Ok(())
}
