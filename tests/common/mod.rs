//! Shared fixture project for integration tests.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const MANIFEST: &str = r#"<?xml version='1.0' encoding='utf-8'?>
<manifest package="com.example.app" xmlns:android="http://schemas.android.com/apk/res/android">
    <application android:icon="@mipmap/icon">
        <activity android:name="MainActivity">
            <intent-filter>
                <action android:name="android.intent.action.MAIN" />
                <category android:name="android.intent.category.LAUNCHER" />
            </intent-filter>
        </activity>
    </application>
</manifest>
"#;

pub const PBXPROJ: &str = r#"// !$*UTF8*$!
{
	objects = {

/* Begin PBXFileReference section */
/* End PBXFileReference section */

/* Begin XCBuildConfiguration section */
		1D6058940D05DD3E006BFB54 /* Debug */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
				IPHONEOS_DEPLOYMENT_TARGET = 11.0;
			};
			name = Debug;
		};
/* End XCBuildConfiguration section */
	};
}
"#;

/// A throwaway project tree with `config.xml` and generated platforms.
pub struct FixtureProject {
    dir: TempDir,
}

impl FixtureProject {
    pub fn new(name: &str, universal_links: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp project");
        let project = Self { dir };
        project.write_config(name, universal_links);
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent directory");
        }
        std::fs::write(&path, contents).expect("write fixture file");
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel)).expect("read fixture file")
    }

    pub fn write_config(&self, name: &str, universal_links: &str) {
        self.write(
            "config.xml",
            &format!(
                "<?xml version='1.0' encoding='utf-8'?>\n<widget id=\"com.example.app\" version=\"1.0.0\" xmlns=\"http://www.w3.org/ns/widgets\">\n    <name>{name}</name>\n{universal_links}\n</widget>\n"
            ),
        );
    }

    pub fn add_android(&self) {
        self.write("platforms/android/AndroidManifest.xml", MANIFEST);
    }

    pub fn add_ios(&self, name: &str) {
        self.write(&format!("platforms/ios/{name}.xcodeproj/project.pbxproj"), PBXPROJ);
        self.write("plugins/ios.json", "{\n  \"prepare_queue\": {}\n}\n");
    }

    /// Run `ulhooks <hook> --project-root <root> --platforms <platforms>`.
    pub fn run_hook(&self, hook: &str, platforms: &str, extra: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_ulhooks"))
            .arg(hook)
            .arg("--project-root")
            .arg(self.root())
            .arg("--platforms")
            .arg(platforms)
            .args(extra)
            .env_remove("CORDOVA_CMDLINE")
            .env_remove("ULHOOKS_OPERATION")
            .env_remove("ULHOOKS_TOOL_MODULES")
            .env("RUST_LOG", "warn")
            .output()
            .expect("run ulhooks")
    }
}

pub fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "ulhooks failed: {}\nstderr:\n{}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
}
