//! Before-prepare hook (iOS).
//!
//! Runs ahead of project regeneration: fixes up the entitlements file name
//! after a project rename and registers custom URL schemes so the build tool
//! writes them into `Info.plist` during prepare.
use crate::config_xml::ConfigXml;
use crate::context::{BuildContext, Platform};
use crate::env_patch;
use crate::ios;
use crate::preferences::preferences_from_config;
use anyhow::Result;

/// Run the before-prepare hook.
pub fn run_before_prepare(ctx: &BuildContext) -> Result<()> {
    let paths = ctx.paths();
    let ios_targeted = ctx.targets(&Platform::Ios);
    if ios_targeted {
        env_patch::patch_plist_helpers_best_effort(ctx);
    }

    let config = ConfigXml::load(&paths.config_xml_path())?;
    match config.project_name() {
        Ok(new_name) => {
            let old_name = ios::find_project_name(&paths.ios_dir());
            if let Some(rename) = ios::plan_rename(&paths, old_name.as_deref(), new_name) {
                tracing::info!(
                    from = %rename.from.display(),
                    to = %rename.to.display(),
                    "project name changed; renaming entitlements"
                );
                // The after-prepare hook rewrites the entitlements file anyway.
                if let Err(err) = rename.apply() {
                    tracing::warn!("failed to rename entitlements file: {err:#}");
                }
            }
        }
        Err(err) => tracing::warn!("skipping entitlements rename: {err:#}"),
    }

    if !ios_targeted {
        tracing::debug!("iOS not targeted; skipping URL scheme registration");
        return Ok(());
    }
    let Some(preferences) = preferences_from_config(&config)? else {
        tracing::debug!("no <universal-links> preferences; skipping URL schemes");
        return Ok(());
    };
    ios::register_url_schemes(ctx, config.package_name(&Platform::Ios), &preferences)?;
    Ok(())
}
