//! Custom URL scheme registration through the iOS plugin-edit record.
use crate::context::{BuildContext, Platform};
use crate::munge::{munge, MungeMode};
use crate::preferences::Preferences;
use anyhow::Result;
use quick_xml::escape::escape;
use serde_json::{json, Value};

/// Where the build tool looks for `Info.plist` additions.
pub const URL_TYPES_KEY_PATH: [&str; 5] = [
    "config_munge",
    "files",
    "*-Info.plist",
    "parents",
    "CFBundleURLTypes",
];

/// Register the custom (non-HTTP) URL schemes of `preferences`.
///
/// The registration replaces any earlier one; with no custom schemes an empty
/// entry is registered so stale schemes are cleared. Skipped while the build
/// tool adds or removes a platform. Returns whether the record was written.
pub fn register_url_schemes(
    ctx: &BuildContext,
    package_name: Option<&str>,
    preferences: &Preferences,
) -> Result<bool> {
    let operation = ctx.operation();
    if operation.is_platform_change() {
        tracing::debug!(?operation, "platform add/remove in progress; skipping URL schemes");
        return Ok(false);
    }
    let schemes = preferences.custom_schemes();
    let value = url_types_value(package_name.unwrap_or_default(), &schemes);
    munge(
        ctx,
        &Platform::Ios,
        &URL_TYPES_KEY_PATH,
        value,
        MungeMode::Replace,
    )
}

fn url_types_value(package_name: &str, schemes: &[&str]) -> Value {
    if schemes.is_empty() {
        return json!({});
    }
    json!({
        "xml": url_types_fragment(package_name, schemes),
        "count": 1,
    })
}

/// Render the `CFBundleURLTypes` plist fragment.
pub fn url_types_fragment(package_name: &str, schemes: &[&str]) -> String {
    let mut xml = String::from("<array><dict>");
    xml.push_str("<key>CFBundleTypeRole</key><string>Editor</string>");
    xml.push_str("<key>CFBundleURLIconFile</key><string>icon</string>");
    xml.push_str(&format!(
        "<key>CFBundleURLName</key><string>{}</string>",
        escape(package_name)
    ));
    xml.push_str("<key>CFBundleURLSchemes</key><array>");
    for scheme in schemes {
        xml.push_str(&format!("<string>{}</string>", escape(*scheme)));
    }
    xml.push_str("</array></dict></array>");
    xml
}
