use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use baton_capability_protocol::{value_as_string_list, Capability, CapabilityError, StepContext};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Copies files matched by glob patterns into a destination
pub struct CopyCapability;

/// One `src` to `dest` mapping
#[derive(Debug, Clone, PartialEq)]
struct FileMapping {
    src: Vec<String>,
    dest: String,
    cwd: Option<String>,
    flatten: bool,
}

impl Capability for CopyCapability {
    fn key(&self) -> &str {
        "copy"
    }

    fn name(&self) -> &str {
        "Copy Files"
    }

    fn description(&self) -> &str {
        "Copy files matched by glob patterns into a destination directory"
    }

    fn configuration_options(&self) -> Option<Value> {
        let mapping = json!({
            "type": "object",
            "properties": {
                "src": {
                    "description": "File paths or glob patterns, relative to cwd",
                    "oneOf": [
                        { "type": "string" },
                        { "type": "array", "items": { "type": "string" } }
                    ]
                },
                "dest": {
                    "type": "string",
                    "description": "Destination file, or directory when it ends with '/'"
                },
                "cwd": {
                    "type": "string",
                    "description": "Directory patterns are matched from (default: pipeline root)"
                },
                "flatten": {
                    "type": "boolean",
                    "description": "Drop directory structure and copy by file name",
                    "default": false
                }
            },
            "required": ["src", "dest"]
        });
        Some(json!({
            "type": "object",
            "properties": {
                "files": { "type": "array", "items": mapping.clone() },
                "src": mapping["properties"]["src"].clone(),
                "dest": mapping["properties"]["dest"].clone(),
                "cwd": mapping["properties"]["cwd"].clone(),
                "flatten": mapping["properties"]["flatten"].clone()
            }
        }))
    }

    fn execute(&self, context: &StepContext) -> Result<(), CapabilityError> {
        let mappings = parse_mappings(context)?;
        let mut copied = 0usize;

        for mapping in &mappings {
            let base = context.resolve_path(mapping.cwd.as_deref().unwrap_or("."));
            let dest = context.resolve_path(&mapping.dest);
            let into_dir = mapping.dest.ends_with('/') || dest.is_dir();

            let matches = collect_matches(&base, &mapping.src)?;
            if matches.is_empty() {
                warn!(step = %context.step_id, src = ?mapping.src, "no files matched");
                continue;
            }

            if !into_dir && matches.len() > 1 {
                return Err(CapabilityError::invalid(
                    "dest",
                    format!(
                        "{} files matched but '{}' is a single file; end dest with '/' to copy into a directory",
                        matches.len(),
                        mapping.dest
                    ),
                ));
            }

            for relative in matches {
                let target = if into_dir {
                    if mapping.flatten {
                        match relative.file_name() {
                            Some(name) => dest.join(name),
                            None => continue,
                        }
                    } else {
                        dest.join(&relative)
                    }
                } else {
                    dest.clone()
                };

                let source = base.join(&relative);
                if is_same_file(&source, &target) {
                    debug!(step = %context.step_id, path = %target.display(), "source and destination are the same file");
                    continue;
                }

                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(&source, &target)?;
                debug!(step = %context.step_id, from = %relative.display(), to = %target.display(), "copied");
                copied += 1;
            }
        }

        debug!(step = %context.step_id, copied, "copy finished");
        Ok(())
    }
}

/// `fs::copy` truncates the destination before reading the source.
fn is_same_file(source: &Path, target: &Path) -> bool {
    match (source.canonicalize(), target.canonicalize()) {
        (Ok(source), Ok(target)) => source == target,
        _ => false,
    }
}

fn parse_mappings(context: &StepContext) -> Result<Vec<FileMapping>, CapabilityError> {
    match context.option("files") {
        Some(Value::Array(entries)) => entries.iter().map(parse_mapping).collect(),
        Some(Value::Null) | None => {
            let src = context.string_list("src")?;
            if src.is_empty() {
                return Err(CapabilityError::MissingOption("src".to_string()));
            }
            Ok(vec![FileMapping {
                src,
                dest: context.require_str("dest")?.to_string(),
                cwd: context.str_option("cwd")?.map(str::to_string),
                flatten: context.bool_option("flatten", false)?,
            }])
        }
        Some(other) => Err(CapabilityError::invalid(
            "files",
            format!("expected a list of mappings, found {}", other),
        )),
    }
}

fn parse_mapping(entry: &Value) -> Result<FileMapping, CapabilityError> {
    let Value::Object(map) = entry else {
        return Err(CapabilityError::invalid(
            "files",
            format!("expected a mapping with src and dest, found {}", entry),
        ));
    };

    let src = value_as_string_list("files.src", map.get("src"))?;
    if src.is_empty() {
        return Err(CapabilityError::MissingOption("files.src".to_string()));
    }
    let dest = match map.get("dest") {
        Some(Value::String(dest)) => dest.clone(),
        Some(other) => return Err(CapabilityError::invalid("files.dest", format!("expected a string, found {}", other))),
        None => return Err(CapabilityError::MissingOption("files.dest".to_string())),
    };
    let cwd = match map.get("cwd") {
        Some(Value::String(cwd)) => Some(cwd.clone()),
        None | Some(Value::Null) => None,
        Some(other) => return Err(CapabilityError::invalid("files.cwd", format!("expected a string, found {}", other))),
    };
    let flatten = match map.get("flatten") {
        Some(Value::Bool(flatten)) => *flatten,
        None | Some(Value::Null) => false,
        Some(other) => return Err(CapabilityError::invalid("files.flatten", format!("expected a boolean, found {}", other))),
    };

    Ok(FileMapping { src, dest, cwd, flatten })
}

/// Files under `base` matching any pattern, relative to `base`, sorted.
///
/// A pattern naming an existing file matches it directly; one naming an
/// existing directory matches everything below it.
fn collect_matches(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, CapabilityError> {
    let mut literal = Vec::new();
    let mut builder = GlobSetBuilder::new();
    let mut has_globs = false;

    for pattern in patterns {
        let candidate = base.join(pattern);
        let pattern = if candidate.is_file() {
            literal.push(PathBuf::from(pattern));
            continue;
        } else if candidate.is_dir() {
            format!("{}/**", pattern.trim_end_matches('/'))
        } else {
            pattern.clone()
        };

        let glob = GlobBuilder::new(&pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| CapabilityError::invalid("src", format!("bad pattern '{}': {}", pattern, e)))?;
        builder.add(glob);
        has_globs = true;
    }

    let mut matches = literal;
    if has_globs {
        let set = builder
            .build()
            .map_err(|e| CapabilityError::invalid("src", e.to_string()))?;
        matches.extend(walk_matching(base, &set)?);
    }

    matches.sort();
    matches.dedup();
    Ok(matches)
}

fn walk_matching(base: &Path, set: &GlobSet) -> Result<Vec<PathBuf>, CapabilityError> {
    let mut found = Vec::new();
    if !base.is_dir() {
        return Ok(found);
    }

    let mut queue = VecDeque::new();
    queue.push_back(base.to_path_buf());

    while let Some(current_dir) = queue.pop_front() {
        for entry in fs::read_dir(&current_dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let path = entry.path();
            if file_type.is_dir() {
                queue.push_back(path);
                continue;
            }
            // Linked directories are neither walked nor copied
            if file_type.is_symlink() && path.is_dir() {
                continue;
            }
            let relative = path.strip_prefix(base).unwrap_or(&path);
            if set.is_match(relative) {
                found.push(relative.to_path_buf());
            }
        }
    }

    Ok(found)
}
