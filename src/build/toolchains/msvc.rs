//! MSBuild / Visual Studio detection for solution-based native projects
//!
//! On Windows the Visual Studio installer's vswhere is used to locate
//! MSBuild.exe. Elsewhere msbuild (or mono's xbuild) must be on PATH.
//! The MSBUILD environment variable overrides detection on every host.

use std::path::PathBuf;
#[cfg(target_os = "windows")]
use std::process::Command;

use anyhow::{bail, Result};

use super::{get_env_path, is_valid_file, tool_version, Toolchain};
#[cfg(not(target_os = "windows"))]
use super::find_executable_any;

/// MSBuild toolchain
pub struct MsbuildToolchain {
    /// Path to the msbuild executable
    msbuild_path: PathBuf,
    /// Visual Studio installation path (Windows only)
    vs_path: Option<PathBuf>,
    /// MSBuild version
    version: String,
}

impl MsbuildToolchain {
    /// Detect MSBuild
    pub fn detect() -> Result<Self> {
        if let Some(path) = get_env_path("MSBUILD") {
            let version = tool_version(&path, "-version").unwrap_or_else(|| "unknown".to_string());
            return Ok(Self {
                msbuild_path: path,
                vs_path: None,
                version,
            });
        }

        #[cfg(target_os = "windows")]
        {
            Self::detect_windows()
        }

        #[cfg(not(target_os = "windows"))]
        {
            Self::detect_path()
        }
    }

    /// Detect msbuild/xbuild from PATH (mono or dotnet SDK installs)
    #[cfg(not(target_os = "windows"))]
    fn detect_path() -> Result<Self> {
        let Some(msbuild_path) = find_executable_any(&["msbuild", "xbuild"]) else {
            bail!(
                "msbuild not found in PATH.\n\
                 Solution files can only be built where MSBuild is installed;\n\
                 set MSBUILD to its full path if it is installed elsewhere."
            );
        };

        let version =
            tool_version(&msbuild_path, "-version").unwrap_or_else(|| "unknown".to_string());

        Ok(Self {
            msbuild_path,
            vs_path: None,
            version,
        })
    }

    #[cfg(target_os = "windows")]
    fn detect_windows() -> Result<Self> {
        let vswhere_path = find_vswhere().ok_or_else(|| {
            anyhow::anyhow!("Visual Studio not found. Please install Visual Studio 2019 or later.")
        })?;

        let output = Command::new(&vswhere_path)
            .args([
                "-latest",
                "-requires",
                "Microsoft.Component.MSBuild",
                "-find",
                r"MSBuild\**\Bin\MSBuild.exe",
            ])
            .output()
            .map_err(|e| anyhow::anyhow!("Failed to run vswhere: {}", e))?;

        let msbuild = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .to_string();

        if msbuild.is_empty() {
            bail!("No Visual Studio installation with MSBuild found");
        }

        let vs_path = find_vs_installations().into_iter().next();
        let msbuild_path = PathBuf::from(msbuild);
        let version =
            tool_version(&msbuild_path, "-version").unwrap_or_else(|| "unknown".to_string());

        Ok(Self {
            msbuild_path,
            vs_path,
            version,
        })
    }
}

impl Toolchain for MsbuildToolchain {
    fn name(&self) -> &str {
        "msbuild"
    }

    fn is_available(&self) -> bool {
        is_valid_file(&self.msbuild_path) || which::which(&self.msbuild_path).is_ok()
    }

    fn path(&self) -> Option<PathBuf> {
        Some(self.msbuild_path.clone())
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn validate(&self) -> Result<()> {
        if let Some(vs_path) = &self.vs_path {
            if !vs_path.exists() {
                bail!(
                    "Visual Studio installation not found at: {}",
                    vs_path.display()
                );
            }
        }

        if !self.is_available() {
            bail!("MSBuild not found at: {}", self.msbuild_path.display());
        }

        Ok(())
    }
}

/// Locate vswhere.exe from the Visual Studio installer
#[cfg(target_os = "windows")]
fn find_vswhere() -> Option<PathBuf> {
    [
        r"C:\Program Files (x86)\Microsoft Visual Studio\Installer\vswhere.exe",
        r"C:\Program Files\Microsoft Visual Studio\Installer\vswhere.exe",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|p| p.exists())
}

/// All Visual Studio installations with C++ tools, newest first
#[cfg(target_os = "windows")]
pub fn find_vs_installations() -> Vec<PathBuf> {
    let Some(vswhere) = find_vswhere() else {
        return Vec::new();
    };

    let output = Command::new(vswhere)
        .args([
            "-all",
            "-sort",
            "-requires",
            "Microsoft.VisualStudio.Component.VC.Tools.x86.x64",
            "-property",
            "installationPath",
        ])
        .output();

    match output {
        Ok(output) => String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Visual Studio is only installed on Windows hosts
#[cfg(not(target_os = "windows"))]
pub fn find_vs_installations() -> Vec<PathBuf> {
    Vec::new()
}
