//! Android manifest writer.
//!
//! App-link intent filters are injected into the launcher activity between two
//! marker comments. Each run strips the marked region and writes a fresh one,
//! so the manifest always reflects the current preferences and every byte
//! outside the region is left as it was.
use crate::artifact;
use crate::context::BuildContext;
use crate::preferences::{Host, PathRule, Preferences};
use anyhow::{anyhow, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

pub const BEGIN_MARKER: &str = "<!-- universal-links:begin -->";
pub const END_MARKER: &str = "<!-- universal-links:end -->";

const INDENT: &str = "    ";
const ACTION_MAIN: &str = "android.intent.action.MAIN";
const CATEGORY_LAUNCHER: &str = "android.intent.category.LAUNCHER";
const LAUNCH_MODE: &str = "singleTask";
/// Schemes registered for hosts that accept any scheme.
const ANY_SCHEME_EXPANSION: [&str; 2] = ["http", "https"];

/// Inject intent filters for `preferences` into the project's Android manifest.
pub fn write_preferences(ctx: &BuildContext, preferences: &Preferences) -> Result<()> {
    let path = ctx.paths().android_manifest_path();
    if !path.is_file() {
        return Err(anyhow!("Android manifest not found at {}", path.display()));
    }
    let original = artifact::read_text(&path)?;
    let updated = inject_preferences(&original, preferences)
        .with_context(|| format!("update {}", path.display()))?;
    if updated == original {
        tracing::debug!(path = %path.display(), "manifest already up to date");
        return Ok(());
    }
    artifact::write_text(&path, &updated)?;
    tracing::info!(
        path = %path.display(),
        hosts = preferences.hosts.len(),
        "wrote universal link intent filters"
    );
    Ok(())
}

/// Return `manifest` with the injected region rebuilt from `preferences`.
pub fn inject_preferences(manifest: &str, preferences: &Preferences) -> Result<String> {
    let cleaned = strip_injected(manifest)?;
    let activity = locate_launcher_activity(&cleaned)?;

    let mut out = String::with_capacity(cleaned.len() + 1024);
    out.push_str(&cleaned[..activity.start_tag.start]);
    out.push_str(&with_launch_mode(&cleaned[activity.start_tag.clone()]));

    let close = activity.close_tag_start;
    let line_start = cleaned[..close].rfind('\n').map_or(0, |idx| idx + 1);
    let lead = &cleaned[line_start..close];
    // A closing tag sharing its line gets an inline region so stripping it
    // restores the line exactly.
    let own_line = lead.chars().all(|ch| ch == ' ' || ch == '\t');
    let (insert_at, child_indent) = if own_line {
        (line_start, format!("{lead}{INDENT}"))
    } else {
        (close, INDENT.to_string())
    };

    out.push_str(&cleaned[activity.start_tag.end..insert_at]);
    out.push_str(&render_block(preferences, &child_indent, own_line));
    out.push_str(&cleaned[insert_at..]);
    Ok(out)
}

/// Remove every marked region, including the lines the markers sit on.
pub fn strip_injected(manifest: &str) -> Result<String> {
    let mut text = manifest.to_string();
    while let Some(begin) = text.find(BEGIN_MARKER) {
        let end = text[begin..]
            .find(END_MARKER)
            .map(|offset| begin + offset + END_MARKER.len())
            .ok_or_else(|| anyhow!("unterminated {BEGIN_MARKER} region in manifest"))?;

        let line_start = text[..begin].rfind('\n').map_or(0, |idx| idx + 1);
        let from = if text[line_start..begin].trim().is_empty() {
            line_start
        } else {
            begin
        };
        let rest = &text[end..];
        let line_end = rest.find('\n').map(|idx| end + idx + 1);
        let to = match line_end {
            Some(line_end) if text[end..line_end].trim().is_empty() => line_end,
            _ => end,
        };
        text.replace_range(from..to, "");
    }
    Ok(text)
}

#[derive(Debug, Clone)]
struct ActivitySpan {
    start_tag: Range<usize>,
    close_tag_start: usize,
}

fn locate_launcher_activity(manifest: &str) -> Result<ActivitySpan> {
    let mut reader = Reader::from_str(manifest);
    let mut open: Option<Range<usize>> = None;
    let mut in_filter = false;
    let mut filter_main = false;
    let mut filter_launcher = false;
    let mut is_launcher = false;
    let mut fallback: Option<ActivitySpan> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|err| anyhow!("malformed manifest near byte {}: {err}", position(&reader)))?;
        let pos = position(&reader);
        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"activity" => {
                    let start = manifest[..pos]
                        .rfind("<activity")
                        .ok_or_else(|| anyhow!("cannot locate <activity> start tag"))?;
                    open = Some(start..pos);
                    is_launcher = false;
                }
                b"intent-filter" if open.is_some() => {
                    in_filter = true;
                    filter_main = false;
                    filter_launcher = false;
                }
                _ if in_filter => {
                    note_filter_entry(&e, &mut filter_main, &mut filter_launcher)?;
                }
                _ => {}
            },
            Event::Empty(e) if in_filter => {
                note_filter_entry(&e, &mut filter_main, &mut filter_launcher)?;
            }
            Event::End(e) => match e.name().as_ref() {
                b"intent-filter" if in_filter => {
                    in_filter = false;
                    is_launcher |= filter_main && filter_launcher;
                }
                b"activity" => {
                    let Some(start_tag) = open.take() else {
                        continue;
                    };
                    let close_tag_start = manifest[..pos]
                        .rfind("</")
                        .ok_or_else(|| anyhow!("cannot locate </activity> tag"))?;
                    let span = ActivitySpan {
                        start_tag,
                        close_tag_start,
                    };
                    if is_launcher {
                        return Ok(span);
                    }
                    fallback.get_or_insert(span);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    fallback.ok_or_else(|| anyhow!("manifest declares no <activity> to receive intent filters"))
}

fn position(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

fn note_filter_entry(e: &BytesStart<'_>, main: &mut bool, launcher: &mut bool) -> Result<()> {
    match e.name().as_ref() {
        b"action" => *main |= android_name(e)?.as_deref() == Some(ACTION_MAIN),
        b"category" => *launcher |= android_name(e)?.as_deref() == Some(CATEGORY_LAUNCHER),
        _ => {}
    }
    Ok(())
}

fn android_name(e: &BytesStart<'_>) -> Result<Option<String>> {
    match e.try_get_attribute("android:name")? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

/// Force `android:launchMode="singleTask"` on an activity start tag.
fn with_launch_mode(start_tag: &str) -> String {
    static LAUNCH_MODE_ATTR: OnceLock<Regex> = OnceLock::new();
    let pattern = LAUNCH_MODE_ATTR.get_or_init(|| {
        Regex::new(r#"android:launchMode\s*=\s*("[^"]*"|'[^']*')"#).expect("valid launchMode pattern")
    });
    let attr = format!("android:launchMode=\"{LAUNCH_MODE}\"");
    if let Some(found) = pattern.find(start_tag) {
        let mut tag = start_tag.to_string();
        tag.replace_range(found.range(), &attr);
        return tag;
    }
    let body = start_tag.trim_end_matches('>').trim_end();
    let tail = &start_tag[body.len()..];
    format!("{body} {attr}{tail}")
}

fn render_block(preferences: &Preferences, indent: &str, own_line: bool) -> String {
    if preferences.hosts.is_empty() {
        return String::new();
    }
    let mut block = if own_line {
        format!("{indent}{BEGIN_MARKER}\n")
    } else {
        format!("{BEGIN_MARKER}\n")
    };
    for host in &preferences.hosts {
        render_filter(&mut block, host, indent);
    }
    if own_line {
        block.push_str(&format!("{indent}{END_MARKER}\n"));
    } else {
        block.push_str(END_MARKER);
    }
    block
}

fn render_filter(out: &mut String, host: &Host, indent: &str) {
    let inner = format!("{indent}{INDENT}");
    if host.custom_scheme().is_none() {
        out.push_str(&format!(
            "{indent}<intent-filter android:autoVerify=\"true\">\n"
        ));
    } else {
        out.push_str(&format!("{indent}<intent-filter>\n"));
    }
    out.push_str(&format!(
        "{inner}<action android:name=\"android.intent.action.VIEW\" />\n"
    ));
    out.push_str(&format!(
        "{inner}<category android:name=\"android.intent.category.DEFAULT\" />\n"
    ));
    out.push_str(&format!(
        "{inner}<category android:name=\"android.intent.category.BROWSABLE\" />\n"
    ));
    let mut seen: Vec<String> = Vec::new();
    for line in data_elements(host) {
        if !seen.contains(&line) {
            out.push_str(&format!("{inner}{line}\n"));
            seen.push(line);
        }
    }
    out.push_str(&format!("{indent}</intent-filter>\n"));
}

fn data_elements(host: &Host) -> Vec<String> {
    let schemes: Vec<&str> = match host.scheme.as_deref() {
        Some(scheme) => vec![scheme],
        None => ANY_SCHEME_EXPANSION.to_vec(),
    };
    let host_attr = quick_xml::escape::escape(host.name.as_str());
    let mut lines = Vec::new();
    for scheme in schemes {
        let scheme_attr = quick_xml::escape::escape(scheme);
        for path in &host.paths {
            let path_attr = match &path.rule {
                PathRule::Any => String::new(),
                PathRule::Exact(url) => {
                    format!(" android:path=\"{}\"", quick_xml::escape::escape(url.as_str()))
                }
                PathRule::Pattern(url) => format!(
                    " android:pathPattern=\"{}\"",
                    quick_xml::escape::escape(url.replace('*', ".*").as_str())
                ),
            };
            lines.push(format!(
                "<data android:scheme=\"{scheme_attr}\" android:host=\"{host_attr}\"{path_attr} />"
            ));
        }
    }
    lines
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
