use anyhow::Result;
use baton_core::pipeline_manager::PipelineManager;
use colored::*;

pub fn execute(manager: &PipelineManager) -> Result<()> {
    println!("{}", "Task Graph:".bold().underline());

    let result = manager.get_task_graph();

    if result.tasks.is_empty() {
        println!("No tasks defined");
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "{} node(s), {} edge(s)",
            result.graph.node_count(),
            result.graph.edge_count()
        )
        .dimmed()
    );
    println!();

    for task in &result.tasks {
        println!("{}", task.name.blue().bold());

        if task.entries.is_empty() {
            println!("  {}", "runs nothing".dimmed());
        } else {
            println!("  {} {}", "runs:".dimmed(), task.entries.join(", "));
            // Target groups are listed with their steps
            if task.resolved != task.entries {
                println!("  {} {}", "resolves to:".dimmed(), task.resolved.join(", "));
            }
        }
        println!();
    }

    Ok(())
}
