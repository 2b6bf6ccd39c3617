//! Native binary build orchestration
//!
//! This module guarantees that the native binaries a platform ships exist on
//! disk before the host build proceeds.
//!
//! ## Architecture
//!
//! ```text
//! lifecycle.rs → orchestrator.rs → compiler.rs (msbuild / make)
//!      ↓                ↑
//! toolchains/      OutputMapping
//! ```
//!
//! ## Modules
//!
//! - `orchestrator` - Builds projects whose outputs are missing, then validates all outputs
//! - `compiler` - External compiler boundary and the msbuild/make implementation
//! - `lifecycle` - Per-platform pre-build / post-build state machine
//! - `platforms` - Platform identities and descriptor construction
//! - `toolchains` - Toolchain discovery (Visual Studio / MSBuild, make)
//! - `copy_manifest` - Source/destination copy lists with digest checks

pub mod compiler;
pub mod copy_manifest;
pub mod lifecycle;
pub mod orchestrator;
pub mod platforms;
pub mod toolchains;

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::{NativeConfig, PlatformConfig};
use crate::error::NativeBuildError;
use crate::utils::paths::{absolutize, resolve_under};
use platforms::Platform;

/// Association of a native project file to the outputs it must produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputMapping {
    project: PathBuf,
    outputs: Vec<PathBuf>,
}

impl OutputMapping {
    /// Create a mapping; `outputs` must be non-empty
    pub fn new(project: PathBuf, outputs: Vec<PathBuf>) -> Result<Self, NativeBuildError> {
        if outputs.is_empty() {
            return Err(NativeBuildError::config_error(format!(
                "Project '{}' must declare at least one expected output",
                project.display()
            )));
        }
        Ok(Self { project, outputs })
    }

    /// Project file that produces the outputs
    pub fn project(&self) -> &Path {
        &self.project
    }

    /// Expected output files, in declaration order
    pub fn outputs(&self) -> &[PathBuf] {
        &self.outputs
    }

    /// Outputs that are not regular files on disk
    ///
    /// A directory sitting at an output path counts as missing.
    pub fn missing_outputs(&self) -> Vec<MissingOutput> {
        self.outputs
            .iter()
            .filter(|output| !output.is_file())
            .map(|output| MissingOutput::new(self.project.clone(), output.clone()))
            .collect()
    }

    /// Whether every expected output exists as a file
    pub fn is_complete(&self) -> bool {
        self.outputs.iter().all(|output| output.is_file())
    }
}

/// An expected output that is absent, paired with the project that should produce it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MissingOutput {
    pub project: PathBuf,
    pub output: PathBuf,
}

impl MissingOutput {
    pub fn new(project: PathBuf, output: PathBuf) -> Self {
        Self { project, output }
    }
}

impl fmt::Display for MissingOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Required file \"{}\" which is output from project file \"{}\" is missing.",
            self.output.display(),
            self.project.display()
        )
    }
}

/// A compiler invocation that did not report success
#[derive(Debug, Clone)]
pub struct FailedBuild {
    pub project: PathBuf,
    pub exit_code: Option<i32>,
    pub output: String,
}

/// Outcome of one `ensure_outputs` pass
#[derive(Debug, Default)]
pub struct OrchestrationResult {
    /// Missing pairs observed before any compiler ran
    pub missing_before_build: Vec<MissingOutput>,
    /// Projects the compiler was invoked for, in invocation order
    pub built_projects: Vec<PathBuf>,
    /// Invocations that failed (logged, never fatal on their own)
    pub failed_builds: Vec<FailedBuild>,
    /// Pairs still missing after the build pass; empty on success
    pub missing_after_build: Vec<MissingOutput>,
}

impl OrchestrationResult {
    /// Whether every expected output exists after the pass
    pub fn is_success(&self) -> bool {
        self.missing_after_build.is_empty()
    }
}

/// Resolved settings for one platform, derived from NativeBuild.toml
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Project root (directory holding NativeBuild.toml)
    pub project_root: PathBuf,
    /// Absolute native code directory
    pub native_code_dir: PathBuf,
    /// Absolute platform output directory
    pub output_dir: PathBuf,
    /// Target platform
    pub platform: Platform,
    /// Platform section of the config
    pub config: PlatformConfig,
    /// Verbose output
    pub verbose: bool,
}

impl BuildContext {
    /// Resolve a platform from the config file at `config_path`
    pub fn new(
        config_path: &Path,
        config: &NativeConfig,
        platform_name: &str,
        verbose: bool,
    ) -> Result<Self> {
        let config_path = absolutize(config_path)?;
        let project_root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));

        let platform_config = config.platform(platform_name)?.clone();
        let platform: Platform = platform_config.name.parse()?;

        let native_code_dir = resolve_under(&project_root, &config.native.code_dir);
        let output_dir = resolve_under(&project_root, &platform_config.output_dir);

        Ok(Self {
            project_root,
            native_code_dir,
            output_dir,
            platform,
            config: platform_config,
            verbose,
        })
    }
}
