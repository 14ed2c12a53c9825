//! Associated-domains entitlements generator.
use crate::artifact;
use crate::context::BuildContext;
use crate::preferences::Preferences;
use anyhow::{anyhow, Context, Result};
use plist::{Dictionary, Value};
use std::path::Path;

pub const ASSOCIATED_DOMAINS_KEY: &str = "com.apple.developer.associated-domains";

/// Write the `applinks:` entries for `preferences` into the project's
/// entitlements file, keeping any unrelated entitlements already present.
///
/// Must run after a pending project rename so the current file name is used.
pub fn generate_associated_domains_entitlements(
    ctx: &BuildContext,
    project_name: &str,
    preferences: &Preferences,
) -> Result<()> {
    let path = ctx.paths().entitlements_path(project_name);
    let existing = load_entitlements(&path)?;
    let entitlements = with_associated_domains(existing, preferences);

    let mut bytes = Vec::new();
    plist::to_writer_xml(&mut bytes, &Value::Dictionary(entitlements))
        .with_context(|| format!("serialize {}", path.display()))?;
    artifact::write_bytes(&path, &bytes)?;
    tracing::info!(
        path = %path.display(),
        domains = preferences.distinct_host_names().len(),
        "wrote associated domains entitlements"
    );
    Ok(())
}

/// Return one `applinks:<host>` entry per distinct host, in first-occurrence order.
pub fn applinks(preferences: &Preferences) -> Vec<String> {
    preferences
        .distinct_host_names()
        .into_iter()
        .map(|host| format!("applinks:{host}"))
        .collect()
}

fn with_associated_domains(mut entitlements: Dictionary, preferences: &Preferences) -> Dictionary {
    let domains = applinks(preferences).into_iter().map(Value::String).collect();
    entitlements.insert(ASSOCIATED_DOMAINS_KEY.to_string(), Value::Array(domains));
    entitlements
}

fn load_entitlements(path: &Path) -> Result<Dictionary> {
    if !path.is_file() {
        return Ok(Dictionary::new());
    }
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Dictionary::new());
    }
    match plist::from_bytes::<Value>(&bytes)
        .with_context(|| format!("parse plist {}", path.display()))?
    {
        Value::Dictionary(dict) => Ok(dict),
        _ => Err(anyhow!(
            "{} does not contain a property list dictionary",
            path.display()
        )),
    }
}
