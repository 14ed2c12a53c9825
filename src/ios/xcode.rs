//! Associated-domains capability in the Xcode project file.
//!
//! `project.pbxproj` is an old-style ASCII property list that Xcode rewrites
//! freely, so edits are applied in place on the text and every other byte is
//! kept as written.
use crate::artifact;
use crate::context::BuildContext;
use crate::paths::{entitlements_file_name, entitlements_rel_path};
use crate::util::sha256_hex;
use anyhow::{anyhow, Context, Result};
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Capability key Xcode records for Associated Domains.
pub const ASSOCIATED_DOMAINS_CAPABILITY: &str = "com.apple.SafariKeychain";
/// Lowest deployment target that supports universal links entitlements.
pub const MIN_DEPLOYMENT_TARGET: &str = "8.0";

const DEFAULT_SETTING_INDENT: &str = "\t\t\t\t";
const DEFAULT_ATTRIBUTE_INDENT: &str = "\t\t\t\t\t\t";
const FILE_REFERENCE_SECTION: &str = "/* Begin PBXFileReference section */\n";

/// Enable the associated-domains capability for the current project.
///
/// Editing an already enabled project leaves the file untouched.
pub fn enable_associated_domains_capability(ctx: &BuildContext, project_name: &str) -> Result<()> {
    let path = ctx.paths().xcode_project_path(project_name);
    if !path.is_file() {
        return Err(anyhow!(
            "Xcode project not found at {} (was the iOS platform added?)",
            path.display()
        ));
    }
    let original = artifact::read_text(&path)?;
    let updated = enable_in_project(&original, project_name)
        .with_context(|| format!("update {}", path.display()))?;
    if updated == original {
        tracing::debug!(path = %path.display(), "associated domains already enabled");
        return Ok(());
    }
    artifact::write_text(&path, &updated)?;
    tracing::info!(path = %path.display(), "enabled associated domains capability");
    Ok(())
}

/// Return `pbxproj` with entitlements wired into every build configuration.
pub fn enable_in_project(pbxproj: &str, project_name: &str) -> Result<String> {
    let rel = entitlements_rel_path(project_name);
    let text = apply_build_settings(pbxproj, &rel)?;
    let text = ensure_file_reference(&text, project_name)?;
    ensure_system_capability(&text)
}

fn apply_build_settings(text: &str, entitlements: &str) -> Result<String> {
    static BUILD_SETTINGS: OnceLock<Regex> = OnceLock::new();
    let pattern = BUILD_SETTINGS
        .get_or_init(|| Regex::new(r"buildSettings = \{").expect("valid buildSettings pattern"));

    let mut out = String::with_capacity(text.len() + 512);
    let mut cursor = 0;
    let mut blocks = 0;
    for found in pattern.find_iter(text) {
        if found.start() < cursor {
            continue;
        }
        let open = found.end() - 1;
        let close = block_end(text, open)?;
        out.push_str(&text[cursor..=open]);
        out.push_str(&edit_settings(&text[open + 1..close], entitlements));
        cursor = close;
        blocks += 1;
    }
    if blocks == 0 {
        return Err(anyhow!("project file has no buildSettings blocks"));
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

fn edit_settings(body: &str, entitlements: &str) -> String {
    static ENTITLEMENTS: OnceLock<Regex> = OnceLock::new();
    static DEPLOYMENT: OnceLock<Regex> = OnceLock::new();
    let entitlements_pattern = ENTITLEMENTS.get_or_init(|| {
        Regex::new(r"(?m)^([ \t]*)CODE_SIGN_ENTITLEMENTS = [^;\n]*;")
            .expect("valid entitlements pattern")
    });
    let deployment_pattern = DEPLOYMENT.get_or_init(|| {
        Regex::new(r#"(?m)^([ \t]*)IPHONEOS_DEPLOYMENT_TARGET = "?([0-9][0-9.]*)"?;"#)
            .expect("valid deployment target pattern")
    });

    let setting = format!("CODE_SIGN_ENTITLEMENTS = {};", pbx_quote_always(entitlements));
    let body = if entitlements_pattern.is_match(body) {
        entitlements_pattern
            .replace_all(body, |caps: &Captures<'_>| format!("{}{setting}", &caps[1]))
            .into_owned()
    } else {
        let indent = first_indent(body).unwrap_or(DEFAULT_SETTING_INDENT);
        match body.find('\n') {
            Some(idx) => format!("{}{indent}{setting}\n{}", &body[..=idx], &body[idx + 1..]),
            None => format!("\n{indent}{setting}\n{body}"),
        }
    };

    deployment_pattern
        .replace_all(&body, |caps: &Captures<'_>| {
            if version_lt(&caps[2], MIN_DEPLOYMENT_TARGET) {
                format!("{}IPHONEOS_DEPLOYMENT_TARGET = {MIN_DEPLOYMENT_TARGET};", &caps[1])
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

fn ensure_file_reference(text: &str, project_name: &str) -> Result<String> {
    static RESOURCES_GROUP: OnceLock<Regex> = OnceLock::new();
    let group_pattern = RESOURCES_GROUP.get_or_init(|| {
        Regex::new(r"/\* Resources \*/ = \{\s*isa = PBXGroup;\s*children = \(\n")
            .expect("valid resources group pattern")
    });

    let file = entitlements_file_name(project_name);
    let rel = entitlements_rel_path(project_name);
    let id = object_id(&rel);
    if text.contains(&format!("{id} /* ")) {
        return Ok(text.to_string());
    }

    let section_at = text
        .find(FILE_REFERENCE_SECTION)
        .map(|idx| idx + FILE_REFERENCE_SECTION.len())
        .ok_or_else(|| anyhow!("project file has no PBXFileReference section"))?;
    let has_group = group_pattern.is_match(text);
    let (path_value, source_tree) = if has_group {
        (pbx_quote(&file), "\"<group>\"")
    } else {
        (pbx_quote(&rel), "SOURCE_ROOT")
    };
    let reference = format!(
        "\t\t{id} /* {file} */ = {{isa = PBXFileReference; lastKnownFileType = text.plist.entitlements; path = {path_value}; sourceTree = {source_tree}; }};\n"
    );
    let mut out = String::with_capacity(text.len() + reference.len() + 64);
    out.push_str(&text[..section_at]);
    out.push_str(&reference);
    out.push_str(&text[section_at..]);

    if let Some(children) = group_pattern.find(&out).map(|found| found.end()) {
        out.insert_str(children, &format!("\t\t\t\t{id} /* {file} */,\n"));
    }
    Ok(out)
}

fn ensure_system_capability(text: &str) -> Result<String> {
    static TARGET_ATTRIBUTES: OnceLock<Regex> = OnceLock::new();
    static TARGET_ENTRY: OnceLock<Regex> = OnceLock::new();
    let attributes_pattern = TARGET_ATTRIBUTES.get_or_init(|| {
        Regex::new(r"TargetAttributes = \{").expect("valid target attributes pattern")
    });
    let entry_pattern = TARGET_ENTRY.get_or_init(|| {
        Regex::new(r"[0-9A-Fa-f]{24}(?: /\*[^*]*\*/)? = \{").expect("valid target entry pattern")
    });

    let Some(found) = attributes_pattern.find(text) else {
        tracing::debug!("project file has no TargetAttributes; skipping system capability");
        return Ok(text.to_string());
    };
    let open = found.end() - 1;
    let close = block_end(text, open)?;
    let body = &text[open + 1..close];

    let mut edited = String::with_capacity(body.len() + 256);
    let mut cursor = 0;
    while let Some(entry) = entry_pattern.find_at(body, cursor) {
        let entry_open = entry.end() - 1;
        let entry_close = block_end(body, entry_open)?;
        edited.push_str(&body[cursor..=entry_open]);
        edited.push_str(&with_capability(&body[entry_open + 1..entry_close]));
        cursor = entry_close;
    }
    edited.push_str(&body[cursor..]);

    Ok(format!("{}{}{}", &text[..=open], edited, &text[close..]))
}

fn with_capability(entry: &str) -> String {
    static CAPABILITY: OnceLock<Regex> = OnceLock::new();
    static SYSTEM_CAPABILITIES: OnceLock<Regex> = OnceLock::new();
    let capability_pattern = CAPABILITY.get_or_init(|| {
        Regex::new(&format!(
            r"({} = \{{\s*enabled = )(\d+);",
            regex::escape(ASSOCIATED_DOMAINS_CAPABILITY)
        ))
        .expect("valid capability pattern")
    });
    let system_pattern = SYSTEM_CAPABILITIES.get_or_init(|| {
        Regex::new(r"SystemCapabilities = \{").expect("valid system capabilities pattern")
    });

    if capability_pattern.is_match(entry) {
        return capability_pattern
            .replace(entry, |caps: &Captures<'_>| format!("{}1;", &caps[1]))
            .into_owned();
    }

    let indent = first_indent(entry).unwrap_or(DEFAULT_ATTRIBUTE_INDENT);
    let capability = format!(
        "{indent}\t{ASSOCIATED_DOMAINS_CAPABILITY} = {{\n{indent}\t\tenabled = 1;\n{indent}\t}};"
    );
    if let Some(found) = system_pattern.find(entry) {
        let mut out = entry.to_string();
        out.insert_str(found.end(), &format!("\n{capability}"));
        return out;
    }
    let block = format!("{indent}SystemCapabilities = {{\n{capability}\n{indent}}};\n");
    match entry.rfind('\n') {
        Some(idx) => format!("{}{block}{}", &entry[..=idx], &entry[idx + 1..]),
        None => format!("{entry}\n{block}"),
    }
}

/// Return the index of the bracket closing the one at `open`.
///
/// Quoted strings and comments are skipped.
pub(crate) fn block_end(text: &str, open: usize) -> Result<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut idx = open;
    while idx < bytes.len() {
        match bytes[idx] {
            b'"' => {
                idx += 1;
                while idx < bytes.len() && bytes[idx] != b'"' {
                    if bytes[idx] == b'\\' {
                        idx += 1;
                    }
                    idx += 1;
                }
            }
            b'/' if bytes.get(idx + 1) == Some(&b'*') => {
                let close = text[idx + 2..]
                    .find("*/")
                    .ok_or_else(|| anyhow!("unterminated comment in project file"))?;
                idx += close + 3;
            }
            b'{' | b'(' => depth += 1,
            b'}' | b')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| anyhow!("unbalanced brackets in project file"))?;
                if depth == 0 {
                    return Ok(idx);
                }
            }
            _ => {}
        }
        idx += 1;
    }
    Err(anyhow!("unterminated block at byte {open} in project file"))
}

fn first_indent(body: &str) -> Option<&str> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| &line[..line.len() - line.trim_start().len()])
        .find(|indent| !indent.is_empty())
}

/// Deterministic 24-digit object id so reruns find their own entries.
fn object_id(seed: &str) -> String {
    sha256_hex(format!("universal-links:{seed}").as_bytes())[..24].to_ascii_uppercase()
}

fn pbx_quote(value: &str) -> String {
    let bare = !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '/' | '-'));
    if bare {
        value.to_string()
    } else {
        pbx_quote_always(value)
    }
}

fn pbx_quote_always(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn version_lt(current: &str, minimum: &str) -> bool {
    fn parts(version: &str) -> Vec<u32> {
        version
            .split('.')
            .map(|part| part.parse().unwrap_or(0))
            .collect()
    }
    let (current, minimum) = (parts(current), parts(minimum));
    let len = current.len().max(minimum.len());
    for idx in 0..len {
        let a = current.get(idx).copied().unwrap_or(0);
        let b = minimum.get(idx).copied().unwrap_or(0);
        if a != b {
            return a < b;
        }
    }
    false
}

#[cfg(test)]
#[path = "xcode_tests.rs"]
mod tests;
