//! NativeBuild.toml configuration parsing
//!
//! The config file describes, per target platform, which native project files
//! must be compiled and which binaries each one is expected to produce.
//!
//! ```toml
//! [native]
//! code_dir = "lib/NativeCode"
//!
//! [[platform]]
//! name = "windows"
//! output_dir = "Assets/Plugins/Windows"
//! msbuild_platform = "x64"
//!
//! [[platform.project]]
//! file = "Win64/Plugin.sln"
//! outputs = ["x64/plugin-native.dll"]
//!
//! [[platform.post_build]]
//! program = "eac-config"
//! args = ["--target", "{output_dir}"]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use super::validation::validate_config;
use crate::error::{hints, NativeBuildError};
use crate::utils::paths::find_config_file;

/// Root configuration from NativeBuild.toml
#[derive(Debug, Clone, Deserialize)]
pub struct NativeConfig {
    /// Native code location
    #[serde(default)]
    pub native: NativeSection,

    /// Per-platform configuration
    #[serde(default, rename = "platform")]
    pub platforms: Vec<PlatformConfig>,
}

/// [native] section
#[derive(Debug, Clone, Deserialize)]
pub struct NativeSection {
    /// Directory containing all native solution/makefile directories,
    /// relative to the project root
    #[serde(default = "default_code_dir")]
    pub code_dir: String,
}

impl Default for NativeSection {
    fn default() -> Self {
        Self {
            code_dir: default_code_dir(),
        }
    }
}

fn default_code_dir() -> String {
    "lib/NativeCode".to_string()
}

fn default_configuration() -> String {
    "Release".to_string()
}

/// [[platform]] entry
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    /// Platform name (windows, macos, linux, android, ios, or a console name)
    pub name: String,

    /// Directory that receives native outputs, relative to the project root
    pub output_dir: String,

    /// Value passed to msbuild as /p:Platform
    pub msbuild_platform: Option<String>,

    /// Build configuration passed to msbuild
    #[serde(default = "default_configuration")]
    pub configuration: String,

    /// Override for the standalone (desktop) capability of this platform
    pub standalone: Option<bool>,

    /// Native projects and their expected outputs
    #[serde(default, rename = "project")]
    pub projects: Vec<ProjectConfig>,

    /// Commands to run after a successful host build
    #[serde(default)]
    pub post_build: Vec<PostBuildConfig>,
}

/// [[platform.project]] entry
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Project file relative to the native code directory
    pub file: String,

    /// Output files relative to the platform output directory
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// [[platform.post_build]] entry
#[derive(Debug, Clone, Deserialize)]
pub struct PostBuildConfig {
    /// Executable to run
    pub program: String,

    /// Arguments; `{output_dir}` and `{platform}` are substituted
    #[serde(default)]
    pub args: Vec<String>,
}

impl NativeConfig {
    /// Load configuration by searching upward from the current directory
    pub fn load() -> Result<(PathBuf, Self)> {
        let path = find_config_file()?;
        let config = Self::load_from(&path)?;
        Ok((path, config))
    }

    /// Load configuration from a specific file
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse and validate configuration from a string
    pub fn parse(content: &str) -> Result<Self> {
        let config: NativeConfig = toml::from_str(content).map_err(|e| {
            NativeBuildError::config_error_with_hint(
                format!("Failed to parse NativeBuild.toml: {}", e),
                hints::invalid_native_build_toml(),
            )
        })?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Find a platform entry by name (case-insensitive)
    pub fn platform(&self, name: &str) -> Result<&PlatformConfig> {
        self.platforms
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                let available: Vec<&str> = self.platforms.iter().map(|p| p.name.as_str()).collect();
                NativeBuildError::config_error_with_hint(
                    format!("Platform '{}' is not configured", name),
                    if available.is_empty() {
                        "No [[platform]] entries are defined in NativeBuild.toml".to_string()
                    } else {
                        format!("Configured platforms: {}", available.join(", "))
                    },
                )
                .into()
            })
    }

    /// Names of all configured platforms
    pub fn platform_names(&self) -> Vec<&str> {
        self.platforms.iter().map(|p| p.name.as_str()).collect()
    }
}
