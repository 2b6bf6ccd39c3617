//! Toolchain detection
//!
//! This module detects the external build tools native projects need
//! (MSBuild from Visual Studio, make) and turns their absence into a
//! `MissingTool` error before any build is attempted.

pub mod make;
pub mod msvc;

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::compiler::ProjectKind;
use crate::error::NativeBuildError;

/// Generic toolchain trait
pub trait Toolchain {
    /// Get the toolchain name
    fn name(&self) -> &str;

    /// Check if the toolchain is available
    fn is_available(&self) -> bool;

    /// Get the path to the main executable
    fn path(&self) -> Option<PathBuf>;

    /// Version string reported by the tool
    fn version(&self) -> &str;

    /// Validate the toolchain is properly configured
    fn validate(&self) -> Result<()>;
}

/// A discovered tool
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInfo {
    /// Tool name
    pub name: String,
    /// Path to the tool executable
    pub path: PathBuf,
    /// Tool version string
    pub version: String,
}

impl ToolInfo {
    fn from_toolchain(toolchain: &dyn Toolchain) -> Option<Self> {
        Some(Self {
            name: toolchain.name().to_string(),
            path: toolchain.path()?,
            version: toolchain.version().to_string(),
        })
    }
}

/// Environment discovery run before native projects are built
pub trait ToolDiscovery {
    /// Locate the tools needed for `kinds`, failing on the first one missing
    fn discover(&self, kinds: &[ProjectKind]) -> Result<Vec<ToolInfo>, NativeBuildError>;
}

/// Discovery against the real host (PATH, Visual Studio installations)
#[derive(Debug, Default)]
pub struct SystemToolDiscovery;

impl SystemToolDiscovery {
    /// Detect the toolchain that builds `kind`
    pub fn detect(kind: ProjectKind) -> Result<Box<dyn Toolchain>> {
        match kind {
            ProjectKind::Solution => Ok(Box::new(msvc::MsbuildToolchain::detect()?)),
            ProjectKind::Makefile => Ok(Box::new(make::MakeToolchain::detect()?)),
        }
    }
}

impl ToolDiscovery for SystemToolDiscovery {
    fn discover(&self, kinds: &[ProjectKind]) -> Result<Vec<ToolInfo>, NativeBuildError> {
        let mut tools = Vec::new();

        for kind in kinds {
            let toolchain = Self::detect(*kind).map_err(|e| {
                NativeBuildError::missing_tool(
                    kind.tool(),
                    format!("{} projects ({:#})", kind.tool(), e),
                    kind.hint(),
                )
            })?;

            toolchain.validate().map_err(|e| {
                NativeBuildError::missing_tool(toolchain.name(), format!("{:#}", e), kind.hint())
            })?;

            if let Some(info) = ToolInfo::from_toolchain(toolchain.as_ref()) {
                tools.push(info);
            }
        }

        Ok(tools)
    }
}

/// Find an executable in PATH
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find an executable, checking multiple possible names
pub fn find_executable_any(names: &[&str]) -> Option<PathBuf> {
    names.iter().find_map(|name| find_executable(name))
}

/// Get an environment variable as PathBuf
pub fn get_env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Check if a path exists and is a file
pub fn is_valid_file(path: &Path) -> bool {
    path.is_file()
}

/// First line of `<tool> <arg>` output, if the tool runs
pub fn tool_version(tool: &Path, arg: &str) -> Option<String> {
    let output = std::process::Command::new(tool).arg(arg).output().ok()?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_executable_any_skips_missing() {
        assert!(find_executable_any(&["definitely-not-a-real-tool-4711"]).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_find_executable_any_finds_sh() {
        let found = find_executable_any(&["definitely-not-a-real-tool-4711", "sh"]).unwrap();
        assert!(found.ends_with("sh"));
    }

    #[test]
    fn test_discovery_with_no_kinds_finds_nothing() {
        let tools = SystemToolDiscovery.discover(&[]).unwrap();
        assert!(tools.is_empty());
    }
}
