//! Entitlements rename when the project display name changes.
//!
//! The build tool renames the whole iOS project after a name change but leaves
//! the entitlements file under its old name. Renaming it before the prepare
//! stage keeps a single entitlements file around.
use crate::paths::{entitlements_file_name, ProjectPaths, XCODE_PROJECT_EXT};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A pending move of the entitlements file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementsRename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Recover the previous project name from the `.xcodeproj` in `ios_dir`.
///
/// Returns `None` when the directory is missing or holds no project.
pub fn find_project_name(ios_dir: &Path) -> Option<String> {
    let entries = fs::read_dir(ios_dir).ok()?;
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some(XCODE_PROJECT_EXT))
        .filter_map(|path| {
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
        })
        .collect();
    names.sort();
    if names.len() > 1 {
        tracing::warn!(
            dir = %ios_dir.display(),
            candidates = ?names,
            "several Xcode projects found; using the first"
        );
    }
    names.into_iter().next()
}

/// Work out which entitlements move a name change requires, if any.
pub fn plan_rename(
    paths: &ProjectPaths,
    old_name: Option<&str>,
    new_name: &str,
) -> Option<EntitlementsRename> {
    let old_name = old_name.filter(|name| !name.is_empty())?;
    if old_name == new_name {
        return None;
    }
    let resources = paths.ios_resources_dir(old_name);
    Some(EntitlementsRename {
        from: resources.join(entitlements_file_name(old_name)),
        to: resources.join(entitlements_file_name(new_name)),
    })
}

impl EntitlementsRename {
    pub fn apply(&self) -> Result<()> {
        fs::rename(&self.from, &self.to).with_context(|| {
            format!(
                "rename {} to {}",
                self.from.display(),
                self.to.display()
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_with_descriptor(name: &str) -> (tempfile::TempDir, ProjectPaths) {
        let temp = tempfile::tempdir().expect("create temp dir");
        let paths = ProjectPaths::new(temp.path().to_path_buf());
        fs::create_dir_all(paths.ios_dir().join(format!("{name}.xcodeproj")))
            .expect("create xcodeproj");
        fs::write(paths.ios_dir().join("cordova.js"), "").expect("write unrelated file");
        (temp, paths)
    }

    #[test]
    fn finds_single_descriptor_name() {
        let (_temp, paths) = project_with_descriptor("OldName");
        assert_eq!(find_project_name(&paths.ios_dir()).as_deref(), Some("OldName"));
    }

    #[test]
    fn missing_platform_dir_has_no_name() {
        let temp = tempfile::tempdir().expect("create temp dir");
        assert_eq!(find_project_name(&temp.path().join("platforms/ios")), None);
    }

    #[test]
    fn name_change_plans_move_within_old_resources() {
        let (_temp, paths) = project_with_descriptor("OldName");
        let old = find_project_name(&paths.ios_dir());

        let rename = plan_rename(&paths, old.as_deref(), "NewName").expect("rename planned");
        let resources = paths.ios_dir().join("OldName").join("Resources");
        assert_eq!(rename.from, resources.join("OldName.entitlements"));
        assert_eq!(rename.to, resources.join("NewName.entitlements"));
    }

    #[test]
    fn unchanged_or_unknown_name_plans_nothing() {
        let (_temp, paths) = project_with_descriptor("OldName");
        assert_eq!(plan_rename(&paths, Some("OldName"), "OldName"), None);
        assert_eq!(plan_rename(&paths, None, "OldName"), None);
    }

    #[test]
    fn apply_moves_the_file_and_reports_failures() {
        let (_temp, paths) = project_with_descriptor("OldName");
        let rename = plan_rename(&paths, Some("OldName"), "NewName").expect("rename planned");

        assert!(rename.apply().is_err(), "source does not exist yet");

        fs::create_dir_all(rename.from.parent().expect("parent")).expect("create resources");
        fs::write(&rename.from, "<plist/>").expect("write entitlements");
        rename.apply().expect("rename");
        assert!(!rename.from.exists());
        assert!(rename.to.is_file());
    }
}
