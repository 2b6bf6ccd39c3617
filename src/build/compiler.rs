//! External compiler boundary
//!
//! The orchestrator only needs to know whether a build invocation succeeded.
//! `ToolCompiler` is the real implementation: `.sln`/`.vcxproj` projects go
//! through msbuild, makefiles through make.

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::toolchains::make::MakeToolchain;
use super::toolchains::msvc::MsbuildToolchain;
use super::toolchains::Toolchain;
use crate::error::{hints, NativeBuildError};
use crate::exec::subprocess::run_command;
use crate::utils::terminal::{create_spinner, format_duration, print_verbose};

/// Result of one compiler invocation
#[derive(Debug, Clone)]
pub struct CompileOutcome {
    /// Whether the tool reported success
    pub success: bool,
    /// Tool exit code, if it ran and exited normally
    pub exit_code: Option<i32>,
    /// Captured tool output
    pub output: String,
}

impl CompileOutcome {
    pub fn succeeded(output: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            output: output.into(),
        }
    }

    pub fn failed(exit_code: Option<i32>, output: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code,
            output: output.into(),
        }
    }
}

/// Builds a native project into an output directory
pub trait ExternalCompiler {
    /// Build `project`, placing binaries under `output_dir`
    ///
    /// An `Err` means the tool could not be run at all; a non-success
    /// outcome means it ran and failed. Both are treated as a failed build.
    fn build(&self, project: &Path, output_dir: &Path) -> Result<CompileOutcome>;
}

/// Kind of native project, selected by file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProjectKind {
    /// Visual Studio solution or project (msbuild)
    Solution,
    /// Makefile (make)
    Makefile,
}

impl ProjectKind {
    /// Detect the project kind from its file name
    pub fn detect(project: &Path) -> Option<Self> {
        let file_name = project.file_name()?.to_string_lossy();
        match file_name.as_ref() {
            "Makefile" | "makefile" | "GNUmakefile" => return Some(ProjectKind::Makefile),
            _ => {}
        }

        let extension = project.extension()?.to_string_lossy().to_ascii_lowercase();
        match extension.as_str() {
            "sln" | "vcxproj" => Some(ProjectKind::Solution),
            "mk" => Some(ProjectKind::Makefile),
            _ => None,
        }
    }

    /// Name of the tool that builds this kind of project
    pub fn tool(&self) -> &'static str {
        match self {
            ProjectKind::Solution => "msbuild",
            ProjectKind::Makefile => "make",
        }
    }

    /// Installation hint for the tool
    pub fn hint(&self) -> &'static str {
        match self {
            ProjectKind::Solution => hints::visual_studio(),
            ProjectKind::Makefile => hints::make(),
        }
    }
}

/// msbuild/make driven compiler
#[derive(Debug, Default)]
pub struct ToolCompiler {
    /// Value for msbuild /p:Platform
    platform_string: Option<String>,
    /// msbuild configuration (Release, Debug, ...)
    configuration: String,
    /// Explicit msbuild executable
    msbuild: Option<PathBuf>,
    /// Explicit make executable
    make: Option<PathBuf>,
    /// Stream tool output instead of capturing it
    verbose: bool,
}

impl ToolCompiler {
    pub fn new() -> Self {
        Self {
            configuration: "Release".to_string(),
            ..Default::default()
        }
    }

    /// Set the msbuild platform string
    pub fn platform_string(mut self, platform: Option<String>) -> Self {
        self.platform_string = platform;
        self
    }

    /// Set the msbuild configuration
    pub fn configuration(mut self, configuration: impl Into<String>) -> Self {
        self.configuration = configuration.into();
        self
    }

    /// Use a specific msbuild executable
    pub fn msbuild(mut self, path: PathBuf) -> Self {
        self.msbuild = Some(path);
        self
    }

    /// Use a specific make executable
    pub fn make(mut self, path: PathBuf) -> Self {
        self.make = Some(path);
        self
    }

    /// Enable verbose output
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Arguments passed to the tool for a project
    pub fn arguments(&self, kind: ProjectKind, project: &Path, output_dir: &Path) -> Vec<String> {
        match kind {
            ProjectKind::Solution => {
                // msbuild requires a trailing separator on OutDir
                let mut out_dir = output_dir.display().to_string();
                if !out_dir.ends_with('/') && !out_dir.ends_with('\\') {
                    out_dir.push(std::path::MAIN_SEPARATOR);
                }

                let mut args = vec![
                    project.display().to_string(),
                    "/t:Build".to_string(),
                    format!("/p:Configuration={}", self.configuration),
                    format!("/p:OutDir={}", out_dir),
                    "/nologo".to_string(),
                ];
                if let Some(platform) = self.platform_string.as_deref().filter(|p| !p.is_empty()) {
                    args.push(format!("/p:Platform={}", platform));
                }
                args
            }
            ProjectKind::Makefile => {
                let dir = project.parent().unwrap_or_else(|| Path::new("."));
                vec![
                    "-C".to_string(),
                    dir.display().to_string(),
                    "-f".to_string(),
                    project.display().to_string(),
                    format!("OUTPUT_DIR={}", output_dir.display()),
                ]
            }
        }
    }

    /// Resolve the tool executable for a project kind
    fn tool_path(&self, kind: ProjectKind, project: &Path) -> Result<PathBuf> {
        let explicit = match kind {
            ProjectKind::Solution => self.msbuild.clone(),
            ProjectKind::Makefile => self.make.clone(),
        };
        if let Some(path) = explicit {
            return Ok(path);
        }

        let detected = match kind {
            ProjectKind::Solution => MsbuildToolchain::detect().ok().and_then(|t| t.path()),
            ProjectKind::Makefile => MakeToolchain::detect().ok().and_then(|t| t.path()),
        };

        detected.ok_or_else(|| {
            NativeBuildError::missing_tool(kind.tool(), project.display().to_string(), kind.hint())
                .into()
        })
    }
}

impl ExternalCompiler for ToolCompiler {
    fn build(&self, project: &Path, output_dir: &Path) -> Result<CompileOutcome> {
        let Some(kind) = ProjectKind::detect(project) else {
            return Ok(CompileOutcome::failed(
                None,
                format!(
                    "Unsupported project kind '{}': expected a .sln, .vcxproj or Makefile",
                    project.display()
                ),
            ));
        };

        if !project.is_file() {
            return Ok(CompileOutcome::failed(
                None,
                format!("Project file not found: {}", project.display()),
            ));
        }

        let tool = self.tool_path(kind, project)?;
        let args = self.arguments(kind, project, output_dir);
        let cwd = project.parent();

        print_verbose(
            self.verbose,
            &format!("Running: {} {}", tool.display(), args.join(" ")),
        );

        let result = if self.verbose {
            run_command(&tool, args.as_slice(), cwd, true)?
        } else {
            let file_name = project
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| project.display().to_string());
            let spinner = create_spinner(&format!("Building {} with {}...", file_name, kind.tool()));
            let result = run_command(&tool, args.as_slice(), cwd, false);
            spinner.finish_and_clear();
            result?
        };

        print_verbose(
            self.verbose,
            &format!(
                "{} finished in {}",
                kind.tool(),
                format_duration(result.duration.as_secs_f64())
            ),
        );

        if result.success {
            Ok(CompileOutcome::succeeded(result.combined_output()))
        } else {
            Ok(CompileOutcome::failed(result.exit_code, result.combined_output()))
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_project_kind() {
        assert_eq!(ProjectKind::detect(Path::new("/n/Win64.sln")), Some(ProjectKind::Solution));
        assert_eq!(ProjectKind::detect(Path::new("/n/Plugin.VCXPROJ")), Some(ProjectKind::Solution));
        assert_eq!(ProjectKind::detect(Path::new("/n/linux/Makefile")), Some(ProjectKind::Makefile));
        assert_eq!(ProjectKind::detect(Path::new("/n/GNUmakefile")), Some(ProjectKind::Makefile));
        assert_eq!(ProjectKind::detect(Path::new("/n/rules.mk")), Some(ProjectKind::Makefile));
        assert_eq!(ProjectKind::detect(Path::new("/n/CMakeLists.txt")), None);
    }

    #[test]
    fn test_msbuild_arguments() {
        let compiler = ToolCompiler::new().platform_string(Some("x64".to_string()));
        let args = compiler.arguments(
            ProjectKind::Solution,
            Path::new("/n/Win64.sln"),
            Path::new("/o/Windows"),
        );

        assert_eq!(args[0], "/n/Win64.sln");
        assert!(args.contains(&"/t:Build".to_string()));
        assert!(args.contains(&"/p:Configuration=Release".to_string()));
        assert!(args.contains(&format!("/p:OutDir=/o/Windows{}", std::path::MAIN_SEPARATOR)));
        assert_eq!(args.last().unwrap(), "/p:Platform=x64");
    }

    #[test]
    fn test_msbuild_arguments_without_platform() {
        let compiler = ToolCompiler::new()
            .platform_string(Some(String::new()))
            .configuration("Debug");
        let args = compiler.arguments(ProjectKind::Solution, Path::new("/n/A.sln"), Path::new("/o/"));

        assert!(args.contains(&"/p:Configuration=Debug".to_string()));
        assert!(args.contains(&"/p:OutDir=/o/".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("/p:Platform")));
    }

    #[test]
    fn test_make_arguments() {
        let compiler = ToolCompiler::new();
        let args = compiler.arguments(
            ProjectKind::Makefile,
            Path::new("/n/linux/Makefile"),
            Path::new("/o/Linux"),
        );
        assert_eq!(
            args,
            vec!["-C", "/n/linux", "-f", "/n/linux/Makefile", "OUTPUT_DIR=/o/Linux"]
        );
    }

    #[test]
    fn test_unsupported_project_is_failed_outcome() {
        let outcome = ToolCompiler::new()
            .build(Path::new("/n/CMakeLists.txt"), Path::new("/o"))
            .unwrap();
        assert!(!outcome.success);
        assert!(outcome.output.contains("Unsupported project kind"));
    }

    #[test]
    fn test_missing_project_file_is_failed_outcome() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project = temp_dir.path().join("bad/Makefile");

        // The tool is never resolved or run for a project that does not exist
        let compiler = ToolCompiler::new().make(PathBuf::from("definitely-not-a-real-tool-4711"));
        let outcome = compiler.build(&project, temp_dir.path()).unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.exit_code, None);
        assert!(outcome.output.contains("Project file not found"));
        assert!(outcome.output.contains("Makefile"));
    }

    #[cfg(unix)]
    #[test]
    fn test_make_build_runs_tool() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project = temp_dir.path().join("Makefile");
        std::fs::write(&project, "").unwrap();

        // `true` accepts any arguments and exits 0
        let compiler = ToolCompiler::new().make(PathBuf::from("true"));
        let outcome = compiler.build(&project, temp_dir.path()).unwrap();
        assert!(outcome.success);

        let compiler = ToolCompiler::new().make(PathBuf::from("false"));
        let outcome = compiler.build(&project, temp_dir.path()).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.exit_code, Some(1));
    }
}
