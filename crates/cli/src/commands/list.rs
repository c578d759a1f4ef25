use anyhow::Result;
use baton_core::pipeline_manager::PipelineManager;
use colored::*;

pub fn execute(manager: &PipelineManager) -> Result<()> {
    let result = manager.list();

    if let Some(name) = &result.name {
        println!("{} {}", name.bold(), result.root.display().to_string().dimmed());
        if let Some(description) = &result.description {
            println!("{}", description.dimmed());
        }
        println!();
    }

    println!("{}", "Tasks".bold().underline());
    if result.tasks.is_empty() {
        println!("  {}", "No tasks found".dimmed());
    }
    for task in &result.tasks {
        match &task.description {
            Some(description) => println!("{} {}", task.name.blue().bold(), description.dimmed()),
            None => println!("{}", task.name.blue().bold()),
        }
    }

    println!();
    println!("{}", "Steps".bold().underline());
    if result.steps.is_empty() {
        println!("  {}", "No steps found".dimmed());
    }
    for step in &result.steps {
        let capability = format!("[{}]", step.capability);
        match &step.description {
            Some(description) => println!(
                "{} {} {}",
                step.id.cyan(),
                capability.green(),
                description.dimmed()
            ),
            None => println!("{} {}", step.id.cyan(), capability.green()),
        }
    }

    Ok(())
}
