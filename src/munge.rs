//! JSON tree patcher for per-platform plugin-edit records.
//!
//! The build tool tracks plugin-applied native edits in
//! `plugins/<platform>.json` and replays them while preparing. Registering an
//! edit here makes the build tool apply it to the generated project.
use crate::artifact;
use crate::context::{BuildContext, Platform};
use anyhow::{anyhow, Result};
use serde_json::{Map, Value};

/// How the value is added to the terminal list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MungeMode {
    /// Keep existing entries and push the value after them.
    Append,
    /// Empty the list first so the value supersedes prior registrations.
    Replace,
}

/// Patch the plugin-edit record of `platform`.
///
/// Returns `Ok(false)` without touching the filesystem when `platform` is not
/// part of the current invocation.
pub fn munge(
    ctx: &BuildContext,
    platform: &Platform,
    key_path: &[&str],
    value: Value,
    mode: MungeMode,
) -> Result<bool> {
    if !ctx.targets(platform) {
        tracing::debug!(%platform, "platform not targeted; skipping munge");
        return Ok(false);
    }
    let record_path = ctx.paths().platform_record_path(platform.as_str());
    let mut document = if record_path.is_file() {
        artifact::read_json(&record_path)?
    } else {
        Value::Object(Map::new())
    };
    patch_document(&mut document, key_path, value, mode)?;
    artifact::write_json(&record_path, &document)?;
    tracing::info!(
        path = %record_path.display(),
        keys = %key_path.join("."),
        "registered plugin edit"
    );
    Ok(true)
}

/// Ensure `key_path` exists in `document` and add `value` to the list it ends in.
///
/// Missing intermediate keys become objects and a missing terminal key becomes
/// a list. An existing node of the wrong kind is reported instead of replaced.
pub fn patch_document(
    document: &mut Value,
    key_path: &[&str],
    value: Value,
    mode: MungeMode,
) -> Result<()> {
    let Some((terminal, parents)) = key_path.split_last() else {
        return Err(anyhow!("munge key path must not be empty"));
    };

    let mut current = document;
    for (depth, key) in parents.iter().enumerate() {
        let object = as_object(current, &key_path[..depth])?;
        let child = object
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if child.is_null() {
            *child = Value::Object(Map::new());
        }
        current = child;
    }

    let object = as_object(current, parents)?;
    let node = object
        .entry(terminal.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if node.is_null() {
        *node = Value::Array(Vec::new());
    }
    let Value::Array(list) = node else {
        return Err(anyhow!(
            "inconsistent plugin record: {} is {} but must be a list",
            key_path.join("."),
            kind_name(node)
        ));
    };
    if mode == MungeMode::Replace {
        list.clear();
    }
    list.push(value);
    Ok(())
}

fn as_object<'a>(value: &'a mut Value, at: &[&str]) -> Result<&'a mut Map<String, Value>> {
    let kind = kind_name(value);
    value.as_object_mut().ok_or_else(|| {
        let location = if at.is_empty() {
            "record root".to_string()
        } else {
            at.join(".")
        };
        anyhow!("inconsistent plugin record: {location} is {kind} but must be an object")
    })
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "munge_tests.rs"]
mod tests;
