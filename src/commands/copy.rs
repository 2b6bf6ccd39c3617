//! Copy command implementation

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::build::copy_manifest::CopyManifest;
use crate::utils::paths::absolutize;
use crate::utils::terminal::print_success;

/// Apply a copy manifest of source/destination pairs
#[derive(Args, Debug)]
pub struct CopyCommand {
    /// Path to the JSON copy manifest
    pub manifest: PathBuf,

    /// Root that `src` entries are resolved against (default: the manifest's directory)
    #[arg(long)]
    pub src_root: Option<PathBuf>,

    /// Root that `dest` entries are resolved against (default: current directory)
    #[arg(long)]
    pub dest_root: Option<PathBuf>,
}

impl CopyCommand {
    /// Execute the copy command
    pub fn execute(self, verbose: bool) -> Result<()> {
        let manifest_path = absolutize(&self.manifest)?;
        let manifest = CopyManifest::load(&manifest_path)?.verbose(verbose);

        let src_root = match self.src_root {
            Some(root) => absolutize(&root)?,
            None => manifest_path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        let dest_root = match self.dest_root {
            Some(root) => absolutize(&root)?,
            None => env::current_dir().context("Failed to get current directory")?,
        };

        let report = manifest.apply(&src_root, &dest_root)?;
        print_success(&format!(
            "Copied {} file(s), skipped {}",
            report.copied.len(),
            report.skipped.len()
        ));
        Ok(())
    }
}
