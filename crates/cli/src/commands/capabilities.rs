use anyhow::Result;
use baton_core::registry::CapabilityRegistry;
use baton_core::results::CapabilityInfo;
use colored::*;

pub fn execute(registry: &CapabilityRegistry, show_options: bool) -> Result<()> {
    println!("{}", "Capabilities".bold().underline());

    for capability in registry.iter() {
        let info = CapabilityInfo::from_capability(capability.as_ref());
        println!("{} {}", info.key.blue().bold(), info.name.dimmed());
        if !info.description.is_empty() {
            println!("  {}", info.description);
        }

        if show_options {
            if let Some(options) = &info.configuration_options {
                for line in serde_json::to_string_pretty(options)?.lines() {
                    println!("  {}", line);
                }
            }
        }
    }

    Ok(())
}
