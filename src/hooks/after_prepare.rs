//! After-prepare hook.
//!
//! Runs once the build tool has regenerated the native projects and injects
//! universal link settings into each targeted platform.
use crate::android;
use crate::config_xml::ConfigXml;
use crate::context::{BuildContext, Platform};
use crate::ios;
use crate::preferences::{preferences_from_config, Preferences};
use anyhow::{anyhow, Result};

/// Run the after-prepare hook.
///
/// A failing platform does not stop the others; the hook reports every failed
/// platform once all of them ran.
pub fn run_after_prepare(ctx: &BuildContext) -> Result<()> {
    let config = ConfigXml::load(&ctx.paths().config_xml_path())?;
    let Some(preferences) = preferences_from_config(&config)? else {
        tracing::debug!("no <universal-links> preferences; nothing to do");
        return Ok(());
    };

    let mut failed = Vec::new();
    for platform in ctx.platforms() {
        let result = match platform {
            Platform::Android => android::write_preferences(ctx, &preferences),
            Platform::Ios => activate_ios(ctx, &config, &preferences),
            Platform::Other(_) => {
                tracing::debug!(%platform, "platform has no universal links support");
                continue;
            }
        };
        if let Err(err) = result {
            tracing::error!(%platform, "universal links setup failed: {err:#}");
            failed.push(platform.as_str());
        }
    }

    if !failed.is_empty() {
        return Err(anyhow!(
            "universal links setup failed for: {}",
            failed.join(", ")
        ));
    }
    Ok(())
}

fn activate_ios(ctx: &BuildContext, config: &ConfigXml, preferences: &Preferences) -> Result<()> {
    let project_name = config.project_name()?;
    ios::enable_associated_domains_capability(ctx, project_name)?;
    ios::generate_associated_domains_entitlements(ctx, project_name, preferences)
}
