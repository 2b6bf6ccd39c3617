//! Error types and helpers for user-friendly error messages
//!
//! Every failure surfaced to the host build carries enough context for a
//! single corrective action: which tool to install, which config entry to fix,
//! or the full list of native outputs that are still missing.

use thiserror::Error;

use crate::build::MissingOutput;

/// Errors raised while preparing native binaries for a platform
#[derive(Error, Debug)]
pub enum NativeBuildError {
    /// Invalid mapping registration or configuration file
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        hint: Option<String>,
    },

    /// Required toolchain executable not found
    #[error("Missing tool: {tool} (required for {required_for})")]
    MissingTool {
        tool: String,
        required_for: String,
        hint: String,
    },

    /// A single external build or post-build step failed
    #[error("Build step failed for {project}: {message}")]
    BuildStep {
        project: String,
        message: String,
        output: String,
    },

    /// Expected outputs are still absent after all build attempts
    #[error(
        "Prerequisites for platform {platform} were not met: {} required file(s) missing",
        missing.len()
    )]
    Validation {
        platform: String,
        missing: Vec<MissingOutput>,
    },

    /// Lifecycle operation invoked from the wrong state
    #[error("Lifecycle error: {message}")]
    Lifecycle { message: String },
}

impl NativeBuildError {
    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            hint: None,
        }
    }

    /// Create a configuration error with a hint
    pub fn config_error_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create a missing tool error
    pub fn missing_tool(
        tool: impl Into<String>,
        required_for: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::MissingTool {
            tool: tool.into(),
            required_for: required_for.into(),
            hint: hint.into(),
        }
    }

    /// Create a build step failure
    pub fn build_step(
        project: impl Into<String>,
        message: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self::BuildStep {
            project: project.into(),
            message: message.into(),
            output: output.into(),
        }
    }

    /// Create a lifecycle error
    pub fn lifecycle(message: impl Into<String>) -> Self {
        Self::Lifecycle {
            message: message.into(),
        }
    }

    /// Display error with formatting and hints
    pub fn display_with_hints(&self) {
        use console::style;

        eprintln!("\n{} {}", style("ERROR:").red().bold(), self);

        match self {
            NativeBuildError::Config { hint: Some(h), .. } => {
                eprintln!("\n{} {}", style("HINT:").yellow().bold(), h);
            }
            NativeBuildError::MissingTool { hint, .. } => {
                eprintln!("\n{} {}", style("HINT:").yellow().bold(), hint);
            }
            NativeBuildError::BuildStep { output, .. } if !output.trim().is_empty() => {
                eprintln!("\n{}", style("OUTPUT:").cyan().bold());
                for line in output_tail(output, OUTPUT_TAIL_LINES) {
                    eprintln!("  | {}", line);
                }
            }
            NativeBuildError::Validation { missing, .. } => {
                eprintln!("\n{}", style("MISSING:").cyan().bold());
                for entry in missing {
                    eprintln!("  • {}", entry);
                }
                eprintln!("\n{} {}", style("HINT:").yellow().bold(), hints::validation_failure());
            }
            _ => {}
        }

        eprintln!();
    }
}

/// Lines of tool output shown with a failure
pub const OUTPUT_TAIL_LINES: usize = 10;

/// Last `count` non-empty lines of captured tool output
pub fn output_tail(output: &str, count: usize) -> Vec<&str> {
    let lines: Vec<&str> = output
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].to_vec()
}

/// Common error hints
pub mod hints {
    /// Get hint for missing Visual Studio / MSBuild
    pub fn visual_studio() -> &'static str {
        "Install Visual Studio with C++ support:\n\
         1. Download from https://visualstudio.microsoft.com/\n\
         2. Select 'Desktop development with C++' workload\n\
         3. Install\n\
         \n\
         Or use Visual Studio Build Tools for CI/headless environments.\n\
         Set MSBUILD to the full path of MSBuild.exe to override detection."
    }

    /// Get hint for missing make
    pub fn make() -> &'static str {
        "Install GNU make:\n\
         • macOS: xcode-select --install\n\
         • Ubuntu: sudo apt install build-essential\n\
         • Windows: winget install GnuWin32.Make\n\
         \n\
         Set MAKE to the full path of the make executable to override detection."
    }

    /// Get hint for NativeBuild.toml not found
    pub fn native_build_toml_not_found() -> &'static str {
        "Could not find NativeBuild.toml in current directory or any parent directory.\n\
         \n\
         Create one at the project root describing each platform:\n\
         \n\
         [[platform]]\n\
         name = \"windows\"\n\
         output_dir = \"Assets/Plugins/Windows\"\n\
         \n\
         [[platform.project]]\n\
         file = \"Win64.sln\"\n\
         outputs = [\"x64/native.dll\"]"
    }

    /// Get hint for invalid NativeBuild.toml
    pub fn invalid_native_build_toml() -> &'static str {
        "NativeBuild.toml is invalid. Common issues:\n\
         • Missing output_dir for a [[platform]] entry\n\
         • A [[platform.project]] entry without any outputs\n\
         • The same project file listed twice for one platform\n\
         • Invalid TOML syntax (check quotes, brackets, commas)"
    }

    /// Get hint shown after a validation failure
    pub fn validation_failure() -> &'static str {
        "Fix the native projects listed above so they produce their outputs, then re-run.\n\
         Run `nativegate check <platform>` to verify the required toolchains are installed."
    }
}
