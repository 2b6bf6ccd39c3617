//! make detection for makefile-based native projects

use std::path::PathBuf;

use anyhow::{bail, Result};

use super::{find_executable_any, get_env_path, is_valid_file, tool_version, Toolchain};

/// Executable names tried in order
const MAKE_NAMES: &[&str] = &["make", "gmake", "mingw32-make"];

/// GNU make (or compatible)
pub struct MakeToolchain {
    path: PathBuf,
    version: String,
}

impl MakeToolchain {
    /// Detect make, honouring the MAKE environment variable first
    pub fn detect() -> Result<Self> {
        let path = match get_env_path("MAKE") {
            Some(path) => path,
            None => match find_executable_any(MAKE_NAMES) {
                Some(path) => path,
                None => bail!("make not found in PATH (tried {})", MAKE_NAMES.join(", ")),
            },
        };

        let version = tool_version(&path, "--version").unwrap_or_else(|| "unknown".to_string());

        Ok(Self { path, version })
    }
}

impl Toolchain for MakeToolchain {
    fn name(&self) -> &str {
        "make"
    }

    fn is_available(&self) -> bool {
        is_valid_file(&self.path) || which::which(&self.path).is_ok()
    }

    fn path(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn validate(&self) -> Result<()> {
        if !self.is_available() {
            bail!("make executable not found at: {}", self.path.display());
        }
        Ok(())
    }
}
