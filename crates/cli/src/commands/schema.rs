use anyhow::Result;
use baton_core::configs::pipeline::pipeline_schema;

pub fn execute() -> Result<()> {
    let schema = pipeline_schema()?;
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
