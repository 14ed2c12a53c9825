//! Best-effort patch of the build tool's own plist helper.
//!
//! The helper compares plist array entries by identity, so re-registered URL
//! type dictionaries are never recognized as duplicates and pile up in
//! `Info.plist`. Comparing serialized values fixes that. The patch lives
//! outside this project's artifacts and a failure here never fails a hook.
use crate::artifact;
use crate::context::BuildContext;
use anyhow::Result;

/// Helper file, relative to the build tool's dependency tree.
pub const PLIST_HELPERS_REL: &str = "cordova-lib/src/plugman/util/plist-helpers.js";

const IDENTITY_CHECK: &str = "if (node[i] === node[j])";
const DEEP_CHECK: &str = "if (JSON.stringify(node[i]) === JSON.stringify(node[j]))";

/// What happened to the helper file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Applied,
    AlreadyPatched,
    PatternNotFound,
    Missing,
}

/// Rewrite the identity comparison in the plist helper, if it is still there.
pub fn patch_plist_helpers(ctx: &BuildContext) -> Result<PatchOutcome> {
    let path = ctx.resolve_tool_module(PLIST_HELPERS_REL);
    let Some(source) = artifact::read_text_optional(&path)? else {
        return Ok(PatchOutcome::Missing);
    };
    if !source.contains(IDENTITY_CHECK) {
        if source.contains(DEEP_CHECK) {
            return Ok(PatchOutcome::AlreadyPatched);
        }
        return Ok(PatchOutcome::PatternNotFound);
    }
    let patched = source.replacen(IDENTITY_CHECK, DEEP_CHECK, 1);
    artifact::write_text(&path, &patched)?;
    tracing::info!(path = %path.display(), "patched plist helper equality check");
    Ok(PatchOutcome::Applied)
}

/// Run [`patch_plist_helpers`], logging instead of failing.
pub fn patch_plist_helpers_best_effort(ctx: &BuildContext) {
    match patch_plist_helpers(ctx) {
        Ok(PatchOutcome::Applied) => {}
        Ok(outcome) => tracing::debug!(?outcome, "plist helper left unchanged"),
        Err(err) => tracing::warn!("failed to patch plist helper: {err:#}"),
    }
}
