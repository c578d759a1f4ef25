use std::collections::BTreeMap;

use baton_capability_protocol::StepOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::{BatonError, BatonResult};

/// A single build step: a capability plus the options it runs with
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StepConfig {
    /// Unique step id, conventionally `capability:target` (e.g. `clean:dist`).
    pub id: String,
    /// Key of the capability that performs this step.
    pub capability: String,
    pub description: Option<String>,
    /// Options passed to the capability.
    #[serde(default)]
    pub config: StepOptions,
}

/// A named, ordered composition of steps and other tasks
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskConfig {
    pub name: String,
    pub description: Option<String>,
    /// Step ids, task names or target groups, run in this order.
    #[serde(default)]
    pub steps: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PipelineConfig {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Options applied to every step of a capability, below the step's own config.
    #[serde(default)]
    pub capability_defaults: BTreeMap<String, StepOptions>,
    #[serde(default)]
    pub steps: Vec<StepConfig>,
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
}

impl PipelineConfig {
    /// Append another file's steps and tasks to this one.
    ///
    /// Scalar fields are replaced when `other` sets them; capability defaults
    /// are merged per option with `other` winning.
    pub fn merge(&mut self, other: PipelineConfig) {
        if other.name.is_some() {
            self.name = other.name;
        }
        if other.description.is_some() {
            self.description = other.description;
        }
        for (capability, options) in other.capability_defaults {
            self.capability_defaults
                .entry(capability)
                .or_default()
                .extend(options);
        }
        self.steps.extend(other.steps);
        self.tasks.extend(other.tasks);
    }
}

pub fn parse_pipeline_config(yaml_str: &str) -> BatonResult<PipelineConfig> {
    let config: PipelineConfig = serde_yaml::from_str(yaml_str)?;
    Ok(config)
}

pub fn parse_pipeline_config_toml(toml_str: &str) -> BatonResult<PipelineConfig> {
    let config: PipelineConfig = toml::from_str(toml_str)?;
    Ok(config)
}

/// JSON schema of the pipeline file format
pub fn pipeline_schema() -> BatonResult<serde_json::Value> {
    let schema = schemars::schema_for!(PipelineConfig);
    serde_json::to_value(&schema).map_err(|e| BatonError::Config(format!("Failed to render schema: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PIPELINE: &str = r#"
name: static-site
capabilityDefaults:
  exec:
    cwd: .
steps:
  - id: clean:dist
    capability: clean
    config:
      paths: [dist]
  - id: connect:server
    capability: exec
    description: Serve dist over HTTP
    config:
      command: python3 -m http.server 8081
      port: 8081
tasks:
  - name: default
  - name: dist
    steps: [clean:dist, connect]
"#;

    #[test]
    fn parses_yaml_pipeline() {
        let config = parse_pipeline_config(PIPELINE).unwrap();

        assert_eq!(config.name.as_deref(), Some("static-site"));
        assert_eq!(config.steps.len(), 2);
        assert_eq!(config.steps[1].config["port"], json!(8081));
        assert_eq!(config.capability_defaults["exec"]["cwd"], json!("."));
        assert!(config.tasks[0].steps.is_empty());
        assert_eq!(config.tasks[1].steps, vec!["clean:dist", "connect"]);
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = parse_pipeline_config("tasks:\n  - name: dist\n    dependencies: [a]\n").unwrap_err();
        assert!(matches!(err, BatonError::Yaml(_)));
    }

    #[test]
    fn parses_toml_pipeline() {
        let config = parse_pipeline_config_toml(
            r#"
name = "site"

[[steps]]
id = "clean:dist"
capability = "clean"
config = { paths = ["dist"] }

[[tasks]]
name = "dist"
steps = ["clean:dist"]
"#,
        )
        .unwrap();

        assert_eq!(config.steps[0].config["paths"], json!(["dist"]));
        assert_eq!(config.tasks[0].steps, vec!["clean:dist"]);
    }

    #[test]
    fn merge_appends_and_overrides() {
        let mut base = parse_pipeline_config(PIPELINE).unwrap();
        let extra = parse_pipeline_config(
            r#"
description: extra tasks
capabilityDefaults:
  exec:
    env: { NODE_ENV: production }
steps:
  - id: lint
    capability: exec
    config: { command: "true" }
tasks:
  - name: check
    steps: [lint]
"#,
        )
        .unwrap();

        base.merge(extra);

        assert_eq!(base.name.as_deref(), Some("static-site"));
        assert_eq!(base.description.as_deref(), Some("extra tasks"));
        assert_eq!(base.steps.len(), 3);
        assert_eq!(base.tasks.len(), 3);
        assert_eq!(base.capability_defaults["exec"]["cwd"], json!("."));
        assert_eq!(base.capability_defaults["exec"]["env"], json!({ "NODE_ENV": "production" }));
    }

    #[test]
    fn schema_describes_steps_and_tasks() {
        let schema = pipeline_schema().unwrap();
        let text = schema.to_string();
        assert!(text.contains("capabilityDefaults"));
        assert!(text.contains("steps"));
        assert!(text.contains("tasks"));
    }
}
