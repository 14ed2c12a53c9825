//! Explicit build context handed to every hook component.
//!
//! The build tool describes an invocation once; components receive this
//! context instead of reading process state themselves.
use crate::cli::HookArgs;
use crate::paths::ProjectPaths;
use anyhow::{Context, Result};
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Dependency tree of the build tool, relative to the project root.
pub const DEFAULT_TOOL_MODULES_REL: &str = "node_modules/cordova/node_modules";

/// Native platform targeted by a build invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Platform {
    Android,
    Ios,
    Other(String),
}

impl Platform {
    pub fn as_str(&self) -> &str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
            Platform::Other(name) => name.as_str(),
        }
    }
}

impl From<&str> for Platform {
    fn from(raw: &str) -> Self {
        let name = raw.trim().to_ascii_lowercase();
        match name.as_str() {
            "android" => Platform::Android,
            "ios" => Platform::Ios,
            _ => Platform::Other(name),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the build tool is doing while it runs the hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OperationKind {
    Prepare,
    PlatformAdd,
    PlatformRemove,
}

impl OperationKind {
    /// Infer the operation from a raw build tool command line.
    ///
    /// This is a text match and can misfire on unusual invocations; callers
    /// prefer an explicit kind when the build tool supplies one.
    pub fn from_command_line(command_line: &str) -> Self {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            Regex::new(r"\bplatforms? (add|rm|remove)\b").expect("valid operation pattern")
        });
        match pattern
            .captures(command_line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
        {
            Some("add") => OperationKind::PlatformAdd,
            Some(_) => OperationKind::PlatformRemove,
            None => OperationKind::Prepare,
        }
    }

    pub fn is_platform_change(self) -> bool {
        matches!(
            self,
            OperationKind::PlatformAdd | OperationKind::PlatformRemove
        )
    }
}

/// Everything a hook may learn about the current build invocation.
#[derive(Debug, Clone)]
pub struct BuildContext {
    project_root: PathBuf,
    platforms: Vec<Platform>,
    command_line: Option<String>,
    operation: Option<OperationKind>,
    tool_modules: PathBuf,
}

impl BuildContext {
    /// Create a context for a plain prepare over `platforms`.
    pub fn new(project_root: PathBuf, platforms: Vec<Platform>) -> Self {
        let tool_modules = project_root.join(DEFAULT_TOOL_MODULES_REL);
        Self {
            project_root,
            platforms,
            command_line: None,
            operation: None,
            tool_modules,
        }
    }

    /// Build the context from hook CLI arguments.
    pub fn from_args(args: &HookArgs) -> Result<Self> {
        let project_root = args
            .project_root
            .canonicalize()
            .with_context(|| format!("resolve project root {}", args.project_root.display()))?;
        let platforms = parse_platforms(&args.platforms);
        let mut ctx = Self::new(project_root, platforms);
        if let Some(line) = args
            .cmd_line
            .as_deref()
            .map(str::trim)
            .filter(|line| !line.is_empty())
        {
            ctx = ctx.with_command_line(line);
        }
        if let Some(operation) = args.operation {
            ctx = ctx.with_operation(operation);
        }
        if let Some(tool_modules) = &args.tool_modules {
            ctx = ctx.with_tool_modules(tool_modules.clone());
        }
        Ok(ctx)
    }

    pub fn with_command_line(mut self, command_line: impl Into<String>) -> Self {
        self.command_line = Some(command_line.into());
        self
    }

    pub fn with_operation(mut self, operation: OperationKind) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn with_tool_modules(mut self, tool_modules: PathBuf) -> Self {
        self.tool_modules = tool_modules;
        self
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    /// Return whether `platform` is part of this invocation.
    pub fn targets(&self, platform: &Platform) -> bool {
        self.platforms.contains(platform)
    }

    /// Return the explicit operation kind, falling back to the command line.
    pub fn operation(&self) -> OperationKind {
        if let Some(operation) = self.operation {
            return operation;
        }
        self.command_line
            .as_deref()
            .map(OperationKind::from_command_line)
            .unwrap_or(OperationKind::Prepare)
    }

    /// Resolve a file inside the build tool's own dependency tree.
    pub fn resolve_tool_module(&self, rel: &str) -> PathBuf {
        self.tool_modules.join(rel)
    }

    pub fn paths(&self) -> ProjectPaths {
        ProjectPaths::new(self.project_root.clone())
    }
}

fn parse_platforms(raw: &[String]) -> Vec<Platform> {
    let mut platforms = Vec::new();
    for name in raw.iter().map(|name| name.trim()).filter(|name| !name.is_empty()) {
        let platform = Platform::from(name);
        if !platforms.contains(&platform) {
            platforms.push(platform);
        }
    }
    platforms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_heuristic_detects_platform_changes() {
        assert_eq!(
            OperationKind::from_command_line("cordova platform add ios"),
            OperationKind::PlatformAdd
        );
        assert_eq!(
            OperationKind::from_command_line("cordova platform rm android"),
            OperationKind::PlatformRemove
        );
        assert_eq!(
            OperationKind::from_command_line("cordova build ios --release"),
            OperationKind::Prepare
        );
    }

    #[test]
    fn explicit_operation_wins_over_command_line() {
        let ctx = BuildContext::new(PathBuf::from("/tmp/app"), vec![Platform::Ios])
            .with_command_line("cordova platform add ios")
            .with_operation(OperationKind::Prepare);
        assert_eq!(ctx.operation(), OperationKind::Prepare);
    }

    #[test]
    fn platforms_are_normalized_and_deduplicated() {
        let raw = vec![
            "iOS".to_string(),
            " android".to_string(),
            String::new(),
            "ios".to_string(),
            "browser".to_string(),
        ];
        assert_eq!(
            parse_platforms(&raw),
            vec![
                Platform::Ios,
                Platform::Android,
                Platform::Other("browser".to_string())
            ]
        );
    }
}
