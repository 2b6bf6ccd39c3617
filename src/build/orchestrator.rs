//! Native build orchestration
//!
//! Each platform registers which project files produce which binaries. A
//! pass builds only the projects with at least one missing output, then
//! re-checks every output of every mapping and reports everything still
//! missing in a single error. Presence on disk is the only freshness signal.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::compiler::{ExternalCompiler, ProjectKind};
use super::{FailedBuild, MissingOutput, OrchestrationResult, OutputMapping};
use crate::error::{output_tail, NativeBuildError, OUTPUT_TAIL_LINES};
use crate::utils::paths::resolve_under;
use crate::utils::terminal::{print_info, print_verbose, print_warning};

/// Ensures all registered outputs for one platform exist
#[derive(Debug)]
pub struct NativeBuildOrchestrator {
    /// Platform name used in reports
    platform: String,
    /// Root that project files are resolved against
    native_code_dir: PathBuf,
    /// Root that outputs are resolved against; passed to the compiler
    output_dir: PathBuf,
    /// Registered mappings, in registration order
    mappings: Vec<OutputMapping>,
    verbose: bool,
}

impl NativeBuildOrchestrator {
    /// Create an orchestrator with explicit native code and output roots
    pub fn new(platform: impl Into<String>, native_code_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            platform: platform.into(),
            native_code_dir,
            output_dir,
            mappings: Vec::new(),
            verbose: false,
        }
    }

    /// Enable verbose output
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Register a project and the outputs it must produce
    ///
    /// `project` is resolved against the native code directory and each
    /// output against the output directory. Fails without modifying existing
    /// registrations if the project is already registered, `outputs` is
    /// empty, or an output is already claimed by another project.
    pub fn register<P: AsRef<Path>>(
        &mut self,
        project: impl AsRef<Path>,
        outputs: &[P],
    ) -> Result<(), NativeBuildError> {
        let project = resolve_under(&self.native_code_dir, project);
        let outputs: Vec<PathBuf> = outputs
            .iter()
            .map(|output| resolve_under(&self.output_dir, output))
            .collect();

        if self.mappings.iter().any(|m| m.project() == project) {
            return Err(NativeBuildError::config_error(format!(
                "Project '{}' is already registered for platform '{}'",
                project.display(),
                self.platform
            )));
        }

        let mut seen = HashSet::new();
        for output in &outputs {
            if !seen.insert(output) {
                return Err(NativeBuildError::config_error(format!(
                    "Output '{}' is listed twice for project '{}'",
                    output.display(),
                    project.display()
                )));
            }
            if let Some(owner) = self.mappings.iter().find(|m| m.outputs().contains(output)) {
                return Err(NativeBuildError::config_error(format!(
                    "Output '{}' is already produced by project '{}'",
                    output.display(),
                    owner.project().display()
                )));
            }
        }

        let mapping = OutputMapping::new(project, outputs)?;
        self.mappings.push(mapping);
        Ok(())
    }

    /// Platform name
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Output root
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Registered mappings
    pub fn mappings(&self) -> &[OutputMapping] {
        &self.mappings
    }

    /// Every expected output currently absent from disk
    pub fn missing_outputs(&self) -> Vec<MissingOutput> {
        self.mappings
            .iter()
            .flat_map(OutputMapping::missing_outputs)
            .collect()
    }

    /// Mappings with at least one missing output
    pub fn incomplete_mappings(&self) -> Vec<&OutputMapping> {
        self.mappings.iter().filter(|m| !m.is_complete()).collect()
    }

    /// Distinct project kinds among the incomplete mappings
    pub fn required_project_kinds(&self) -> Vec<ProjectKind> {
        let mut kinds: Vec<ProjectKind> = self
            .incomplete_mappings()
            .iter()
            .filter_map(|m| ProjectKind::detect(m.project()))
            .collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    /// Invoke the compiler once per incomplete mapping
    ///
    /// A failed invocation is logged and recorded; the remaining mappings
    /// are still built.
    pub fn build_missing(&self, compiler: &dyn ExternalCompiler) -> OrchestrationResult {
        let mut result = OrchestrationResult {
            missing_before_build: self.missing_outputs(),
            ..Default::default()
        };

        let projects_to_build: Vec<&Path> = self
            .incomplete_mappings()
            .into_iter()
            .map(OutputMapping::project)
            .collect();

        if projects_to_build.is_empty() {
            print_verbose(
                self.verbose,
                &format!("All native outputs for {} are present", self.platform),
            );
            return result;
        }

        print_info(&format!(
            "Building {} native project(s) for {}",
            projects_to_build.len(),
            self.platform
        ));

        for project in projects_to_build {
            print_verbose(self.verbose, &format!("Building {}", project.display()));
            result.built_projects.push(project.to_path_buf());

            match compiler.build(project, &self.output_dir) {
                Ok(outcome) if outcome.success => {
                    print_verbose(self.verbose, &format!("Built {}", project.display()));
                }
                Ok(outcome) => {
                    let failed = FailedBuild {
                        project: project.to_path_buf(),
                        exit_code: outcome.exit_code,
                        output: outcome.output,
                    };
                    self.report_failure(&failed);
                    result.failed_builds.push(failed);
                }
                Err(e) => {
                    let failed = FailedBuild {
                        project: project.to_path_buf(),
                        exit_code: None,
                        output: format!("{:#}", e),
                    };
                    self.report_failure(&failed);
                    result.failed_builds.push(failed);
                }
            }
        }

        result
    }

    /// Log a failed build with the tail of its tool output
    ///
    /// Verbose mode logs the full output.
    fn report_failure(&self, failed: &FailedBuild) {
        print_warning(&format!(
            "Build of \"{}\" failed{}",
            failed.project.display(),
            failed
                .exit_code
                .map(|code| format!(" with exit code {}", code))
                .unwrap_or_default()
        ));

        let lines = if self.verbose {
            output_tail(&failed.output, usize::MAX)
        } else {
            output_tail(&failed.output, OUTPUT_TAIL_LINES)
        };
        for line in lines {
            eprintln!("  | {}", line);
        }
    }

    /// Re-check every output of every mapping
    ///
    /// Missing pairs are returned in one aggregated error; the caller reports them.
    pub fn validate(
        &self,
        mut result: OrchestrationResult,
    ) -> Result<OrchestrationResult, NativeBuildError> {
        result.missing_after_build = self.missing_outputs();

        if result.missing_after_build.is_empty() {
            return Ok(result);
        }

        Err(NativeBuildError::Validation {
            platform: self.platform.clone(),
            missing: result.missing_after_build,
        })
    }

    /// Build whatever is missing, then validate all outputs
    pub fn ensure_outputs(
        &self,
        compiler: &dyn ExternalCompiler,
    ) -> Result<OrchestrationResult, NativeBuildError> {
        let result = self.build_missing(compiler);
        self.validate(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::compiler::fake::{Behavior, RecordingCompiler};
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        native: PathBuf,
        out: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = tempfile::tempdir().unwrap();
            let native = temp.path().join("lib/NativeCode");
            let out = temp.path().join("Assets/Plugins");
            std::fs::create_dir_all(&native).unwrap();
            std::fs::create_dir_all(&out).unwrap();
            Self {
                _temp: temp,
                native,
                out,
            }
        }

        fn orchestrator(&self) -> NativeBuildOrchestrator {
            NativeBuildOrchestrator::new("windows", self.native.clone(), self.out.clone())
        }

        fn touch(&self, output: &str) {
            let path = self.out.join(output);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, b"bin").unwrap();
        }

        fn project(&self, name: &str) -> PathBuf {
            self.native.join(name)
        }

        fn output(&self, name: &str) -> PathBuf {
            self.out.join(name)
        }
    }

    #[test]
    fn test_all_present_builds_nothing() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        orch.register("A.sln", &["a.bin"]).unwrap();
        orch.register("B.sln", &["b.bin", "b2.bin"]).unwrap();
        fx.touch("a.bin");
        fx.touch("b.bin");
        fx.touch("b2.bin");

        let compiler = RecordingCompiler::new();
        let result = orch.ensure_outputs(&compiler).unwrap();

        assert!(compiler.invocations().is_empty());
        assert!(result.missing_before_build.is_empty());
        assert!(result.built_projects.is_empty());
        assert!(result.is_success());
    }

    #[test]
    fn test_scenario_a_builds_missing_output() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        orch.register("Win64.sln", &["out/native.dll"]).unwrap();

        let compiler = RecordingCompiler::new().on(
            fx.project("Win64.sln"),
            Behavior::Produce(vec![fx.output("out/native.dll")]),
        );
        let result = orch.ensure_outputs(&compiler).unwrap();

        assert_eq!(compiler.invocations(), vec![fx.project("Win64.sln")]);
        assert_eq!(result.missing_before_build.len(), 1);
        assert!(fx.output("out/native.dll").exists());
        assert!(result.is_success());
    }

    #[test]
    fn test_scenario_b_builds_only_incomplete_mapping() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        orch.register("A.sln", &["a.bin"]).unwrap();
        orch.register("B.sln", &["b.bin"]).unwrap();
        fx.touch("b.bin");

        let compiler = RecordingCompiler::new()
            .on(fx.project("A.sln"), Behavior::Produce(vec![fx.output("a.bin")]));
        let result = orch.ensure_outputs(&compiler).unwrap();

        assert_eq!(compiler.invocations(), vec![fx.project("A.sln")]);
        assert_eq!(result.built_projects, vec![fx.project("A.sln")]);
        assert!(result.is_success());
    }

    #[test]
    fn test_scenario_c_reports_still_missing_output() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        orch.register("C.sln", &["c.bin", "d.bin"]).unwrap();
        fx.touch("c.bin");

        let compiler = RecordingCompiler::new().on(fx.project("C.sln"), Behavior::Fail);
        let err = orch.ensure_outputs(&compiler).unwrap_err();

        assert_eq!(compiler.invocations(), vec![fx.project("C.sln")]);
        match err {
            NativeBuildError::Validation { platform, missing } => {
                assert_eq!(platform, "windows");
                assert_eq!(
                    missing,
                    vec![MissingOutput::new(fx.project("C.sln"), fx.output("d.bin"))]
                );
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_single_invocation_per_mapping_with_many_missing() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        orch.register("Multi.sln", &["x.bin", "y.bin", "z.bin"]).unwrap();

        let compiler = RecordingCompiler::new().on(
            fx.project("Multi.sln"),
            Behavior::Produce(vec![fx.output("x.bin"), fx.output("y.bin"), fx.output("z.bin")]),
        );
        let result = orch.ensure_outputs(&compiler).unwrap();

        assert_eq!(compiler.invocations().len(), 1);
        assert_eq!(result.missing_before_build.len(), 3);
        for output in ["x.bin", "y.bin", "z.bin"] {
            assert!(fx.output(output).exists());
        }
    }

    #[test]
    fn test_failures_are_aggregated_across_mappings() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        orch.register("A.sln", &["a.bin"]).unwrap();
        orch.register("B.sln", &["b.bin", "b2.bin"]).unwrap();
        orch.register("Good.sln", &["good.bin"]).unwrap();
        fx.touch("b.bin");

        let compiler = RecordingCompiler::new()
            .on(fx.project("A.sln"), Behavior::Error)
            .on(fx.project("B.sln"), Behavior::Fail)
            .on(fx.project("Good.sln"), Behavior::Produce(vec![fx.output("good.bin")]));

        let err = orch.ensure_outputs(&compiler).unwrap_err();

        // A failing build never stops the remaining ones
        assert_eq!(
            compiler.invocations(),
            vec![fx.project("A.sln"), fx.project("B.sln"), fx.project("Good.sln")]
        );
        match err {
            NativeBuildError::Validation { missing, .. } => {
                assert_eq!(
                    missing,
                    vec![
                        MissingOutput::new(fx.project("A.sln"), fx.output("a.bin")),
                        MissingOutput::new(fx.project("B.sln"), fx.output("b2.bin")),
                    ]
                );
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
        assert!(fx.output("good.bin").exists());
    }

    #[test]
    fn test_directory_at_output_path_triggers_build() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        orch.register("Win64.sln", &["native.dll"]).unwrap();
        std::fs::create_dir_all(fx.output("native.dll")).unwrap();

        let compiler = RecordingCompiler::new();
        let err = orch.ensure_outputs(&compiler).unwrap_err();

        assert_eq!(compiler.invocations(), vec![fx.project("Win64.sln")]);
        let NativeBuildError::Validation { missing, .. } = err else {
            panic!("expected validation failure");
        };
        assert_eq!(
            missing,
            vec![MissingOutput::new(fx.project("Win64.sln"), fx.output("native.dll"))]
        );
    }

    #[test]
    fn test_failed_build_records_tool_output() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        orch.register("A.sln", &["a.bin"]).unwrap();
        orch.register("B.sln", &["b.bin"]).unwrap();

        let compiler = RecordingCompiler::new().on(fx.project("B.sln"), Behavior::Error);
        let result = orch.build_missing(&compiler);

        assert_eq!(result.failed_builds.len(), 2);
        assert_eq!(result.failed_builds[0].project, fx.project("A.sln"));
        assert_eq!(result.failed_builds[0].exit_code, Some(1));
        assert!(result.failed_builds[0].output.contains("error MSB1009"));
        assert_eq!(result.failed_builds[1].exit_code, None);
        assert!(result.failed_builds[1].output.contains("Failed to execute msbuild"));
    }

    #[test]
    fn test_failed_build_that_still_produces_output_succeeds() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        orch.register("Multi.mk", &["lib.so"]).unwrap();

        let compiler = RecordingCompiler::new().on(
            fx.project("Multi.mk"),
            Behavior::FailAfterProducing(vec![fx.output("lib.so")]),
        );

        let result = orch.build_missing(&compiler);
        assert_eq!(result.failed_builds.len(), 1);
        assert_eq!(result.failed_builds[0].exit_code, Some(1));

        let result = orch.validate(result).unwrap();
        assert!(result.is_success());
    }

    #[test]
    fn test_missing_after_is_subset_of_missing_before() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        orch.register("A.sln", &["a1.bin", "a2.bin"]).unwrap();
        orch.register("B.sln", &["b.bin"]).unwrap();
        fx.touch("b.bin");

        let compiler = RecordingCompiler::new()
            .on(fx.project("A.sln"), Behavior::FailAfterProducing(vec![fx.output("a1.bin")]));

        let result = orch.build_missing(&compiler);
        let before = result.missing_before_build.clone();
        let err = orch.validate(result).unwrap_err();

        let NativeBuildError::Validation { missing, .. } = err else {
            panic!("expected validation failure");
        };
        assert!(missing.iter().all(|m| before.contains(m)));
        assert_eq!(missing.len(), 1);
    }

    #[test]
    fn test_second_pass_is_idempotent() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        orch.register("A.sln", &["a.bin"]).unwrap();

        let compiler = RecordingCompiler::new()
            .on(fx.project("A.sln"), Behavior::Produce(vec![fx.output("a.bin")]));

        orch.ensure_outputs(&compiler).unwrap();
        assert_eq!(compiler.invocations().len(), 1);

        let second = orch.ensure_outputs(&compiler).unwrap();
        assert_eq!(compiler.invocations().len(), 1);
        assert!(second.built_projects.is_empty());
    }

    #[test]
    fn test_duplicate_registration_rejected_without_mutation() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        orch.register("A.sln", &["a.bin"]).unwrap();

        let err = orch.register("A.sln", &["other.bin"]).unwrap_err();
        assert!(matches!(err, NativeBuildError::Config { .. }));

        assert_eq!(orch.mappings().len(), 1);
        assert_eq!(orch.mappings()[0].outputs(), &[fx.output("a.bin")]);
    }

    #[test]
    fn test_empty_outputs_rejected() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        let outputs: [&str; 0] = [];
        let err = orch.register("A.sln", &outputs).unwrap_err();
        assert!(matches!(err, NativeBuildError::Config { .. }));
        assert!(orch.mappings().is_empty());
    }

    #[test]
    fn test_overlapping_outputs_rejected() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        orch.register("A.sln", &["shared.dll"]).unwrap();

        let err = orch.register("B.sln", &["shared.dll"]).unwrap_err();
        assert!(matches!(err, NativeBuildError::Config { .. }));
        assert_eq!(orch.mappings().len(), 1);
    }

    #[test]
    fn test_paths_resolved_against_roots() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        orch.register("Win64/Plugin.sln", &["x64/plugin.dll"]).unwrap();

        let mapping = &orch.mappings()[0];
        assert_eq!(mapping.project(), fx.project("Win64/Plugin.sln"));
        assert_eq!(mapping.outputs(), &[fx.output("x64/plugin.dll")]);
    }

    #[test]
    fn test_required_project_kinds_only_for_incomplete() {
        let fx = Fixture::new();
        let mut orch = fx.orchestrator();
        orch.register("A.sln", &["a.bin"]).unwrap();
        orch.register("B.vcxproj", &["b.bin"]).unwrap();
        orch.register("linux/Makefile", &["lib.so"]).unwrap();
        fx.touch("lib.so");

        assert_eq!(orch.required_project_kinds(), vec![ProjectKind::Solution]);

        fx.touch("a.bin");
        fx.touch("b.bin");
        assert!(orch.required_project_kinds().is_empty());
    }
}
