//! Command implementations
//!
//! Each command module provides a clap-derived struct and execute method.

pub mod build;
pub mod check;
pub mod copy;
pub mod ensure;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::build::BuildContext;
use crate::config::NativeConfig;

/// Load NativeBuild.toml (explicit path or upward search) and resolve `platform`
pub(crate) fn load_context(
    config: Option<&Path>,
    platform: &str,
    verbose: bool,
) -> Result<BuildContext> {
    let (path, native_config) = load_config(config)?;
    BuildContext::new(&path, &native_config, platform, verbose)
}

/// Load NativeBuild.toml from `config` or by searching upward
pub(crate) fn load_config(config: Option<&Path>) -> Result<(PathBuf, NativeConfig)> {
    match config {
        Some(path) => Ok((path.to_path_buf(), NativeConfig::load_from(path)?)),
        None => NativeConfig::load(),
    }
}
