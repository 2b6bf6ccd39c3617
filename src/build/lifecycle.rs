//! Per-platform build lifecycle
//!
//! ```text
//! NotStarted → PrerequisitesChecked → Built → Validated → PostStepsRun
//!      └──────────────┴─────────────────┴─────────┴──────→ Aborted
//! ```
//!
//! `pre_build` runs tool discovery and the native orchestration pass; any
//! failure aborts the lifecycle and is fatal for the host build. `post_build`
//! is only legal once the native outputs validated and the host build itself
//! succeeded.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};

use super::compiler::ExternalCompiler;
use super::orchestrator::NativeBuildOrchestrator;
use super::platforms::Platform;
use super::toolchains::{ToolDiscovery, ToolInfo};
use super::OrchestrationResult;
use crate::config::PostBuildConfig;
use crate::error::NativeBuildError;
use crate::exec::subprocess::run_command;
use crate::utils::terminal::{print_info, print_verbose};

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    PrerequisitesChecked,
    Built,
    Validated,
    PostStepsRun,
    Aborted,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::NotStarted => "not started",
            LifecycleState::PrerequisitesChecked => "prerequisites checked",
            LifecycleState::Built => "built",
            LifecycleState::Validated => "validated",
            LifecycleState::PostStepsRun => "post-steps run",
            LifecycleState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Opaque step run after a successful host build (e.g. anti-cheat setup)
pub trait PostStep {
    /// Name shown in logs
    fn name(&self) -> &str;

    /// Run the step for `platform`, whose native binaries live in `output_dir`
    fn run(&self, platform: &Platform, output_dir: &Path) -> Result<()>;
}

/// Post-step that runs a configured command
///
/// `{output_dir}` and `{platform}` in the arguments are substituted.
#[derive(Debug, Clone)]
pub struct CommandPostStep {
    program: String,
    args: Vec<String>,
}

impl CommandPostStep {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Arguments after placeholder substitution
    pub fn expanded_args(&self, platform: &Platform, output_dir: &Path) -> Vec<String> {
        let output_dir = output_dir.display().to_string();
        let platform = platform.to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{output_dir}", &output_dir)
                    .replace("{platform}", &platform)
            })
            .collect()
    }
}

impl From<&PostBuildConfig> for CommandPostStep {
    fn from(config: &PostBuildConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }
}

impl PostStep for CommandPostStep {
    fn name(&self) -> &str {
        &self.program
    }

    fn run(&self, platform: &Platform, output_dir: &Path) -> Result<()> {
        let args = self.expanded_args(platform, output_dir);
        let result = run_command(&self.program, args.as_slice(), None, false)
            .with_context(|| format!("Failed to run post-build step '{}'", self.program))?;

        if !result.success {
            return Err(NativeBuildError::build_step(
                &self.program,
                format!(
                    "post-build step exited with code {}",
                    result
                        .exit_code
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "unknown".to_string())
                ),
                result.combined_output(),
            )
            .into());
        }

        Ok(())
    }
}

/// Everything platform-specific the shared lifecycle needs
pub struct PlatformDescriptor {
    /// Target platform
    pub platform: Platform,
    /// Mappings for this platform
    pub orchestrator: NativeBuildOrchestrator,
    /// Whether post-steps apply to this platform
    pub capability: Box<dyn Fn(&Platform) -> bool>,
    /// Steps run after a successful host build
    pub post_steps: Vec<Box<dyn PostStep>>,
}

impl fmt::Debug for PlatformDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformDescriptor")
            .field("platform", &self.platform)
            .field("orchestrator", &self.orchestrator)
            .field(
                "post_steps",
                &self.post_steps.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Drives one platform through pre-build and post-build
pub struct PlatformBuildLifecycle {
    descriptor: PlatformDescriptor,
    discovery: Box<dyn ToolDiscovery>,
    state: LifecycleState,
    tools: Vec<ToolInfo>,
    result: Option<OrchestrationResult>,
    verbose: bool,
}

impl PlatformBuildLifecycle {
    pub fn new(descriptor: PlatformDescriptor, discovery: Box<dyn ToolDiscovery>) -> Self {
        Self {
            descriptor,
            discovery,
            state: LifecycleState::NotStarted,
            tools: Vec::new(),
            result: None,
            verbose: false,
        }
    }

    /// Enable verbose output
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Current state
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Tools found during discovery
    pub fn tools(&self) -> &[ToolInfo] {
        &self.tools
    }

    /// Result of the orchestration pass, once it completed
    pub fn result(&self) -> Option<&OrchestrationResult> {
        self.result.as_ref()
    }

    /// Discover tools, build missing native projects and validate outputs
    pub fn pre_build(&mut self, compiler: &dyn ExternalCompiler) -> Result<(), NativeBuildError> {
        if self.state != LifecycleState::NotStarted {
            return Err(NativeBuildError::lifecycle(format!(
                "pre-build already ran for {} (state: {})",
                self.descriptor.platform, self.state
            )));
        }

        print_info(&format!(
            "Checking for platform-specific prerequisites ({})",
            self.descriptor.platform
        ));

        // Tools are only needed when something has to be built
        let kinds = self.descriptor.orchestrator.required_project_kinds();
        if !kinds.is_empty() {
            match self.discovery.discover(&kinds) {
                Ok(tools) => {
                    for tool in &tools {
                        print_verbose(
                            self.verbose,
                            &format!("Found {} {} at {}", tool.name, tool.version, tool.path.display()),
                        );
                    }
                    self.tools = tools;
                }
                Err(e) => {
                    self.state = LifecycleState::Aborted;
                    return Err(e);
                }
            }
        }
        self.state = LifecycleState::PrerequisitesChecked;

        let result = self.descriptor.orchestrator.build_missing(compiler);
        self.state = LifecycleState::Built;

        match self.descriptor.orchestrator.validate(result) {
            Ok(result) => {
                self.result = Some(result);
                self.state = LifecycleState::Validated;
                Ok(())
            }
            Err(e) => {
                self.state = LifecycleState::Aborted;
                Err(e)
            }
        }
    }

    /// Mark the lifecycle aborted (e.g. the host build failed)
    pub fn abort(&mut self) {
        self.state = LifecycleState::Aborted;
    }

    /// Run post-steps if the platform capability holds
    ///
    /// Returns the number of steps that ran.
    pub fn post_build(&mut self) -> Result<usize, NativeBuildError> {
        if self.state != LifecycleState::Validated {
            return Err(NativeBuildError::lifecycle(format!(
                "post-build requires validated native outputs for {} (state: {})",
                self.descriptor.platform, self.state
            )));
        }

        let platform = &self.descriptor.platform;
        if !(self.descriptor.capability)(platform) {
            print_verbose(
                self.verbose,
                &format!("Skipping post-build steps: not applicable to {}", platform),
            );
            self.state = LifecycleState::PostStepsRun;
            return Ok(0);
        }

        let output_dir = self.descriptor.orchestrator.output_dir();
        for step in &self.descriptor.post_steps {
            print_info(&format!("Running post-build step '{}'", step.name()));
            if let Err(e) = step.run(platform, output_dir) {
                self.state = LifecycleState::Aborted;
                return Err(match e.downcast::<NativeBuildError>() {
                    Ok(native_err) => native_err,
                    Err(other) => {
                        NativeBuildError::build_step(step.name(), format!("{:#}", other), "")
                    }
                });
            }
        }

        self.state = LifecycleState::PostStepsRun;
        Ok(self.descriptor.post_steps.len())
    }
}
