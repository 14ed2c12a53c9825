//! Typed paths into a build-tool project layout.
//!
//! Centralizing path construction keeps every hook agreeing on where the
//! generated native artifacts live.
use std::path::PathBuf;

/// Extension of the iOS project descriptor directory.
pub const XCODE_PROJECT_EXT: &str = "xcodeproj";
/// Extension of the iOS entitlements property list.
pub const ENTITLEMENTS_EXT: &str = "entitlements";

/// Convenience wrapper for locating project artifacts.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    root: PathBuf,
}

impl ProjectPaths {
    /// Create a new path helper rooted at the project root.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Return the `config.xml` path.
    pub fn config_xml_path(&self) -> PathBuf {
        self.root.join("config.xml")
    }

    /// Return the `plugins/` directory path.
    pub fn plugins_dir(&self) -> PathBuf {
        self.root.join("plugins")
    }

    /// Return the `plugins/<platform>.json` plugin-edit record path.
    pub fn platform_record_path(&self, platform: &str) -> PathBuf {
        self.plugins_dir().join(format!("{platform}.json"))
    }

    /// Return the `platforms/` directory path.
    pub fn platforms_dir(&self) -> PathBuf {
        self.root.join("platforms")
    }

    /// Return the `platforms/android` directory path.
    pub fn android_dir(&self) -> PathBuf {
        self.platforms_dir().join("android")
    }

    /// Return the Android manifest path.
    ///
    /// Newer Android platform templates nest the manifest under `app/src/main`;
    /// that layout wins when present.
    pub fn android_manifest_path(&self) -> PathBuf {
        let nested = self
            .android_dir()
            .join("app")
            .join("src")
            .join("main")
            .join("AndroidManifest.xml");
        if nested.is_file() {
            return nested;
        }
        self.android_dir().join("AndroidManifest.xml")
    }

    /// Return the `platforms/ios` directory path.
    pub fn ios_dir(&self) -> PathBuf {
        self.platforms_dir().join("ios")
    }

    /// Return the `platforms/ios/<name>.xcodeproj/project.pbxproj` path.
    pub fn xcode_project_path(&self, project_name: &str) -> PathBuf {
        self.ios_dir()
            .join(format!("{project_name}.{XCODE_PROJECT_EXT}"))
            .join("project.pbxproj")
    }

    /// Return the `platforms/ios/<dir_name>/Resources` directory path.
    pub fn ios_resources_dir(&self, dir_name: &str) -> PathBuf {
        self.ios_dir().join(dir_name).join("Resources")
    }

    /// Return the entitlements path for `project_name`.
    pub fn entitlements_path(&self, project_name: &str) -> PathBuf {
        self.ios_resources_dir(project_name)
            .join(entitlements_file_name(project_name))
    }
}

/// Return the entitlements path relative to `platforms/ios`, as Xcode build
/// settings reference it.
pub fn entitlements_rel_path(project_name: &str) -> String {
    format!(
        "{project_name}/Resources/{}",
        entitlements_file_name(project_name)
    )
}

pub fn entitlements_file_name(project_name: &str) -> String {
    format!("{project_name}.{ENTITLEMENTS_EXT}")
}
