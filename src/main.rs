//! nativegate - native plugin binary gate for game engine builds
//!
//! Before the host engine builds the managed layer, every platform-specific
//! native binary the plugin ships must be present. nativegate builds only the
//! native projects whose outputs are missing and then fails the build with a
//! complete list of anything still absent.
//!
//! ## Architecture
//!
//! ```text
//! Rust CLI → commands/ → build/lifecycle.rs → build/orchestrator.rs → msbuild/make
//! ```

mod build;
mod cli;
mod commands;
mod config;
mod error;
mod exec;
mod utils;

use clap::Parser;

use cli::Cli;
use error::NativeBuildError;

fn main() {
    let cli = Cli::parse();

    if let Err(err) = cli.execute() {
        match err.downcast_ref::<NativeBuildError>() {
            Some(native_err) => native_err.display_with_hints(),
            None => utils::terminal::print_error(&format!("{:#}", err)),
        }
        std::process::exit(1);
    }
}
