//! Configuration validation with helpful error messages
//!
//! Registration rules enforced again later by the orchestrator are checked
//! here up front so a bad NativeBuild.toml fails before any tool is run.

use std::collections::HashSet;

use anyhow::Result;
use regex::Regex;

use super::{NativeConfig, PlatformConfig};
use crate::error::{hints, NativeBuildError};

/// Validate the entire configuration
pub fn validate_config(config: &NativeConfig) -> Result<()> {
    if config.native.code_dir.trim().is_empty() {
        return Err(NativeBuildError::config_error_with_hint(
            "[native] code_dir cannot be empty",
            "Point code_dir at the directory holding the native solutions, e.g. \"lib/NativeCode\"",
        )
        .into());
    }

    let mut seen = HashSet::new();
    for platform in &config.platforms {
        validate_platform_name(&platform.name)?;

        if !seen.insert(platform.name.to_ascii_lowercase()) {
            return Err(NativeBuildError::config_error_with_hint(
                format!("Platform '{}' is defined more than once", platform.name),
                "Merge the duplicate [[platform]] entries into one",
            )
            .into());
        }

        validate_platform(platform)?;
    }

    Ok(())
}

/// Validate a platform name
fn validate_platform_name(name: &str) -> Result<()> {
    let valid_name = Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$")?;

    if !valid_name.is_match(name) {
        return Err(NativeBuildError::config_error_with_hint(
            format!("Platform name '{}' is not valid", name),
            "Platform names must start with a letter and contain only letters, digits, '-' or '_'",
        )
        .into());
    }

    Ok(())
}

/// Validate a single [[platform]] entry
fn validate_platform(platform: &PlatformConfig) -> Result<()> {
    if platform.output_dir.trim().is_empty() {
        return Err(NativeBuildError::config_error_with_hint(
            format!("Platform '{}' has an empty output_dir", platform.name),
            hints::invalid_native_build_toml(),
        )
        .into());
    }

    let mut project_files = HashSet::new();
    let mut output_files = HashSet::new();

    for project in &platform.projects {
        if project.file.trim().is_empty() {
            return Err(NativeBuildError::config_error_with_hint(
                format!("Platform '{}' has a project entry with an empty file", platform.name),
                hints::invalid_native_build_toml(),
            )
            .into());
        }

        if !project_files.insert(project.file.as_str()) {
            return Err(NativeBuildError::config_error_with_hint(
                format!(
                    "Project '{}' is listed more than once for platform '{}'",
                    project.file, platform.name
                ),
                "List all outputs of a project in a single [[platform.project]] entry",
            )
            .into());
        }

        if project.outputs.is_empty() {
            return Err(NativeBuildError::config_error_with_hint(
                format!(
                    "Project '{}' for platform '{}' declares no outputs",
                    project.file, platform.name
                ),
                hints::invalid_native_build_toml(),
            )
            .into());
        }

        for output in &project.outputs {
            if output.trim().is_empty() {
                return Err(NativeBuildError::config_error(format!(
                    "Project '{}' for platform '{}' has an empty output path",
                    project.file, platform.name
                ))
                .into());
            }

            if !output_files.insert(output.as_str()) {
                return Err(NativeBuildError::config_error_with_hint(
                    format!(
                        "Output '{}' is declared by more than one project for platform '{}'",
                        output, platform.name
                    ),
                    "Each output file must be produced by exactly one project",
                )
                .into());
            }
        }
    }

    for step in &platform.post_build {
        if step.program.trim().is_empty() {
            return Err(NativeBuildError::config_error(format!(
                "Platform '{}' has a post_build step without a program",
                platform.name
            ))
            .into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_err(content: &str) -> String {
        NativeConfig::parse(content).unwrap_err().to_string()
    }

    #[test]
    fn test_duplicate_platform_rejected() {
        let msg = parse_err(
            r#"
[[platform]]
name = "windows"
output_dir = "a"

[[platform]]
name = "Windows"
output_dir = "b"
"#,
        );
        assert!(msg.contains("defined more than once"));
    }

    #[test]
    fn test_invalid_platform_name_rejected() {
        let msg = parse_err("[[platform]]\nname = \"9lives\"\noutput_dir = \"x\"\n");
        assert!(msg.contains("is not valid"));
    }

    #[test]
    fn test_project_without_outputs_rejected() {
        let msg = parse_err(
            r#"
[[platform]]
name = "linux"
output_dir = "out"

[[platform.project]]
file = "Makefile"
outputs = []
"#,
        );
        assert!(msg.contains("declares no outputs"));
    }

    #[test]
    fn test_duplicate_project_rejected() {
        let msg = parse_err(
            r#"
[[platform]]
name = "linux"
output_dir = "out"

[[platform.project]]
file = "Makefile"
outputs = ["a.so"]

[[platform.project]]
file = "Makefile"
outputs = ["b.so"]
"#,
        );
        assert!(msg.contains("listed more than once"));
    }

    #[test]
    fn test_overlapping_outputs_rejected() {
        let msg = parse_err(
            r#"
[[platform]]
name = "windows"
output_dir = "out"

[[platform.project]]
file = "A.sln"
outputs = ["shared.dll"]

[[platform.project]]
file = "B.sln"
outputs = ["shared.dll"]
"#,
        );
        assert!(msg.contains("more than one project"));
    }

    #[test]
    fn test_empty_code_dir_rejected() {
        let msg = parse_err("[native]\ncode_dir = \"\"\n");
        assert!(msg.contains("code_dir"));
    }
}
