//! Run orchestration.
//!
//! A run walks a fixed state machine:
//!
//! ```text
//! Idle -> ConfigLoaded -> PackagesSetUp -> GateEvaluated -> UpToDate
//!                                                       \-> Regenerating -> Succeeded
//! ```
//!
//! Any stage may end the run in `Failed(stage)`. Failures are values, not
//! panics: [`PipelineOrchestrator::run`] always returns a [`RunReport`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use super::migrate::{MigrationSummary, OutputMigrator};
use crate::config::{AsmgenConfig, PackageSpec, ResolvedPaths};
use crate::error::AsmgenError;
use crate::packages::{CommandPackageFactory, ExecuteContext, PackageFactory, PackageSet};
use crate::state::{ContentHashGate, RegenerationReason, StateStore};
use crate::versions::{OfflineVersionResolver, RemoteVersionResolver, VersionResolver};

/// A step of the pipeline that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Setup,
    Gate,
    ExecuteDump,
    ExecuteShim,
    Migrate,
    Persist,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Setup => "setup",
            Stage::Gate => "gate",
            Stage::ExecuteDump => "execute-dump",
            Stage::ExecuteShim => "execute-shim",
            Stage::Migrate => "migrate",
            Stage::Persist => "persist",
        };
        write!(f, "{}", s)
    }
}

/// States a run passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    ConfigLoaded,
    PackagesSetUp,
    GateEvaluated,
    UpToDate,
    Regenerating,
    Succeeded,
    Failed(Stage),
}

impl RunState {
    /// Whether the run ends in this state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::UpToDate | RunState::Succeeded | RunState::Failed(_)
        )
    }
}

/// Ephemeral record of one run.
#[derive(Debug, Clone)]
pub struct RunRecord {
    /// Every state visited, in order.
    pub states: Vec<RunState>,
    /// Whether the gate or a package demanded regeneration.
    pub needs_regeneration: bool,
    /// The stage that failed; set at most once.
    pub failed_stage: Option<Stage>,
    /// Message of the failure.
    pub error: Option<String>,
}

impl Default for RunRecord {
    fn default() -> Self {
        Self {
            states: vec![RunState::Idle],
            needs_regeneration: false,
            failed_stage: None,
            error: None,
        }
    }
}

impl RunRecord {
    fn enter(&mut self, state: RunState) {
        self.states.push(state);
    }

    fn fail(&mut self, stage: Stage, error: &AsmgenError) {
        if self.failed_stage.is_some() {
            return;
        }
        self.failed_stage = Some(stage);
        self.error = Some(error.to_string());
        self.enter(RunState::Failed(stage));
    }

    /// The state the run ended in.
    pub fn final_state(&self) -> RunState {
        self.states.last().copied().unwrap_or(RunState::Idle)
    }

    /// Whether the run ended without a failed stage.
    pub fn success(&self) -> bool {
        self.failed_stage.is_none()
    }

    /// Process exit code for this run.
    pub fn exit_code(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }
}

/// Outcome of a run with the details worth reporting.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub record: RunRecord,
    /// Why the gate asked for regeneration, if it did.
    pub reason: Option<RegenerationReason>,
    /// Packages whose version changed since the last save.
    pub changed_packages: Vec<String>,
    /// Optional packages whose setup failed and were left out.
    pub skipped_packages: Vec<String>,
    /// What the migration did, when it ran.
    pub migration: Option<MigrationSummary>,
    /// Wall time of the run.
    pub duration: Duration,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.record.success()
    }

    pub fn exit_code(&self) -> i32 {
        self.record.exit_code()
    }
}

/// Inputs consulted once per run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub paths: ResolvedPaths,
    pub force_regeneration: bool,
    /// Per-package version pins; they beat every other version source.
    pub pins: BTreeMap<String, String>,
}

/// Command-line overrides layered over the config.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub force_regeneration: bool,
    pub offline: bool,
    pub pins: BTreeMap<String, String>,
}

struct StageError {
    stage: Stage,
    error: AsmgenError,
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, StageError>;
}

impl<T> AtStage<T> for crate::error::Result<T> {
    fn at(self, stage: Stage) -> Result<T, StageError> {
        self.map_err(|error| StageError { stage, error })
    }
}

/// Drives the packages through setup, gate, execution and migration.
pub struct PipelineOrchestrator {
    settings: PipelineSettings,
    specs: Vec<PackageSpec>,
    resolver: Box<dyn VersionResolver>,
    factory: Box<dyn PackageFactory>,
}

impl PipelineOrchestrator {
    /// Create an orchestrator from its parts.
    pub fn new(
        settings: PipelineSettings,
        specs: Vec<PackageSpec>,
        resolver: Box<dyn VersionResolver>,
        factory: Box<dyn PackageFactory>,
    ) -> Self {
        Self {
            settings,
            specs,
            resolver,
            factory,
        }
    }

    /// Create an orchestrator running config-driven command packages.
    pub fn from_config(
        config: &AsmgenConfig,
        project_root: &Path,
        overrides: &RunOverrides,
    ) -> Self {
        let settings = PipelineSettings {
            paths: config.resolve_paths(project_root),
            force_regeneration: config.force_regeneration || overrides.force_regeneration,
            pins: overrides.pins.clone(),
        };

        Self::new(
            settings,
            config.packages.clone(),
            resolver_for(config, overrides.offline),
            Box::new(CommandPackageFactory::new(project_root)),
        )
    }

    /// Settings in effect.
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Execute one run. Never returns an error; failures are in the report.
    pub fn run(&self) -> RunReport {
        let start = Instant::now();
        let mut report = RunReport::default();

        if let Err(StageError { stage, error }) = self.drive(&mut report) {
            error!("Run failed at {}: {}", stage, error);
            report.record.fail(stage, &error);
        }

        report.duration = start.elapsed();
        report
    }

    fn drive(&self, report: &mut RunReport) -> Result<(), StageError> {
        let paths = &self.settings.paths;

        let mut state = StateStore::load_or_fresh(&paths.state_file);
        report.record.enter(RunState::ConfigLoaded);

        let mut packages = PackageSet::build(
            &self.specs,
            &paths.work_dir,
            &self.settings.pins,
            self.resolver.as_ref(),
            &state,
            self.factory.as_ref(),
        )
        .at(Stage::Setup)?;

        for package in packages.iter() {
            let descriptor = package.descriptor();
            info!(
                "Using {} version: {}",
                descriptor.name,
                descriptor.display_version()
            );
        }

        let mut skipped = BTreeSet::new();
        for package in packages.iter_mut() {
            let name = package.descriptor().name.clone();
            let refresh = package.should_setup(&state);

            if let Err(e) = package.setup(refresh) {
                if package.optional() {
                    warn!("Optional package {} failed to set up: {}", name, e);
                    report.skipped_packages.push(name.clone());
                    skipped.insert(name);
                    continue;
                }
                return Err(StageError {
                    stage: Stage::Setup,
                    error: e,
                });
            }

            if refresh {
                report.changed_packages.push(name);
            }
        }
        report.record.enter(RunState::PackagesSetUp);

        let gate = ContentHashGate::new(&paths.tracked_artifact);
        let decision = gate
            .evaluate(state.input_hash(), self.settings.force_regeneration)
            .at(Stage::Gate)?;
        report.record.enter(RunState::GateEvaluated);
        report.reason = decision.reason;

        let needs_regeneration =
            decision.needs_regeneration() || !report.changed_packages.is_empty();
        report.record.needs_regeneration = needs_regeneration;

        if !needs_regeneration {
            info!("Up to date");
            report.record.enter(RunState::UpToDate);
            return Ok(());
        }

        match decision.reason {
            Some(reason) => info!("Assembly generation needed: {}", reason),
            None => info!(
                "Assembly generation needed: package versions changed ({})",
                report.changed_packages.join(", ")
            ),
        }
        report.record.enter(RunState::Regenerating);

        packages.cleanup_primary();

        let ctx = ExecuteContext {
            project_root: &paths.project_root,
            artifact: &paths.tracked_artifact,
            dump_output: None,
        };
        if let Err(e) = packages.dumper_mut().execute(&ctx) {
            packages.dumper_mut().cleanup();
            return Err(StageError {
                stage: Stage::ExecuteDump,
                error: e,
            });
        }

        let dump_output = packages.dumper().descriptor().output.clone();
        let ctx = ExecuteContext {
            dump_output: Some(&dump_output),
            ..ctx
        };
        if let Err(e) = packages.shim_generator_mut().execute(&ctx) {
            packages.cleanup_primary();
            return Err(StageError {
                stage: Stage::ExecuteShim,
                error: e,
            });
        }

        let shim_output = packages.shim_generator().descriptor().output.clone();
        let migrator = OutputMigrator::new(&paths.output_dir, &paths.state_file);
        let migrated = migrator.migrate(&shim_output, &mut state);
        packages.cleanup_primary();
        report.migration = Some(migrated.at(Stage::Migrate)?);

        state.commit_success(&decision.current_hash);
        for package in packages.iter() {
            if !skipped.contains(&package.descriptor().name) {
                package.save(&mut state);
            }
        }
        state.save(&paths.state_file).at(Stage::Persist)?;

        info!("Assembly generation finished");
        report.record.enter(RunState::Succeeded);
        Ok(())
    }
}

/// Pick the version resolver for a run.
///
/// Offline mode, from either the config or the command line, skips the
/// remote lookup entirely.
pub fn resolver_for(config: &AsmgenConfig, offline: bool) -> Box<dyn VersionResolver> {
    if offline || config.offline {
        info!("Offline mode: skipping remote version lookup");
        return Box::new(OfflineVersionResolver);
    }

    match &config.version_source {
        Some(source) => Box::new(RemoteVersionResolver::contact(
            &source.url,
            Duration::from_secs(source.timeout_secs),
        )),
        None => Box::new(OfflineVersionResolver),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackageRole;
    use crate::error::Result;
    use crate::packages::{Package, PackageDescriptor};
    use crate::versions::StaticVersionResolver;
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::fs;
    use std::path::PathBuf;
    use std::rc::Rc;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Script {
        fail_setup: HashSet<String>,
        fail_execute: HashSet<String>,
        outputs: HashMap<String, Vec<(String, String)>>,
    }

    #[derive(Clone, Default)]
    struct Harness {
        log: Rc<RefCell<Vec<String>>>,
        script: Rc<RefCell<Script>>,
    }

    impl Harness {
        fn calls(&self) -> Vec<String> {
            self.log.borrow().clone()
        }

        fn clear(&self) {
            self.log.borrow_mut().clear();
        }

        fn produce(&self, package: &str, files: &[(&str, &str)]) {
            self.script.borrow_mut().outputs.insert(
                package.to_string(),
                files
                    .iter()
                    .map(|(n, c)| (n.to_string(), c.to_string()))
                    .collect(),
            );
        }

        fn fail_execute(&self, package: &str) {
            self.script
                .borrow_mut()
                .fail_execute
                .insert(package.to_string());
        }

        fn fail_setup(&self, package: &str) {
            self.script
                .borrow_mut()
                .fail_setup
                .insert(package.to_string());
        }
    }

    struct FakePackage {
        descriptor: PackageDescriptor,
        role: PackageRole,
        optional: bool,
        harness: Harness,
    }

    impl FakePackage {
        fn log(&self, call: &str) {
            self.harness
                .log
                .borrow_mut()
                .push(format!("{}:{}", call, self.descriptor.name));
        }
    }

    impl Package for FakePackage {
        fn descriptor(&self) -> &PackageDescriptor {
            &self.descriptor
        }

        fn role(&self) -> PackageRole {
            self.role
        }

        fn optional(&self) -> bool {
            self.optional
        }

        fn setup(&mut self, refresh: bool) -> Result<()> {
            self.log(if refresh { "setup-refresh" } else { "setup" });
            if self.harness.script.borrow().fail_setup.contains(&self.descriptor.name) {
                return Err(AsmgenError::SetupFailure {
                    package: self.descriptor.name.clone(),
                    message: "unavailable".to_string(),
                });
            }
            Ok(())
        }

        fn execute(&mut self, ctx: &ExecuteContext<'_>) -> Result<()> {
            self.log("execute");
            if self.role == PackageRole::ShimGenerator {
                assert!(ctx.dump_output.is_some());
            }

            let script = self.harness.script.borrow();
            if script.fail_execute.contains(&self.descriptor.name) {
                return Err(AsmgenError::ExecutionFailure {
                    package: self.descriptor.name.clone(),
                    message: "boom".to_string(),
                });
            }

            fs::create_dir_all(&self.descriptor.output)?;
            if let Some(files) = script.outputs.get(&self.descriptor.name) {
                for (name, content) in files {
                    fs::write(self.descriptor.output.join(name), content)?;
                }
            }
            Ok(())
        }

        fn cleanup(&mut self) {
            self.log("cleanup");
            let _ = fs::remove_dir_all(&self.descriptor.output);
        }
    }

    struct FakeFactory(Harness);

    impl PackageFactory for FakeFactory {
        fn create(&self, spec: &PackageSpec, descriptor: PackageDescriptor) -> Box<dyn Package> {
            Box::new(FakePackage {
                descriptor,
                role: spec.role,
                optional: spec.optional,
                harness: self.0.clone(),
            })
        }
    }

    struct Project {
        temp: TempDir,
        paths: ResolvedPaths,
        harness: Harness,
        specs: Vec<PackageSpec>,
    }

    impl Project {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let root = temp.path().to_path_buf();
            let paths = ResolvedPaths {
                tracked_artifact: root.join("libil2cpp.so"),
                output_dir: root.join("generated"),
                work_dir: root.join("work"),
                state_file: root.join("state.yml"),
                project_root: root,
            };
            fs::write(&paths.tracked_artifact, "H1").unwrap();

            let mut dumper = PackageSpec::new("cpp2il", PackageRole::Dumper);
            dumper.default_version = Some("2022.1".to_string());
            let mut shim = PackageSpec::new("interop", PackageRole::ShimGenerator);
            shim.default_version = Some("1.4".to_string());
            let mut deps = PackageSpec::new("unity_deps", PackageRole::Support);
            deps.default_version = Some("2019.4".to_string());

            let harness = Harness::default();
            harness.produce("interop", &[("a.dll", "a1"), ("b.dll", "b1")]);

            Self {
                temp,
                paths,
                harness,
                specs: vec![dumper, shim, deps],
            }
        }

        fn orchestrator(&self, force: bool) -> PipelineOrchestrator {
            self.orchestrator_with(force, Box::new(OfflineVersionResolver))
        }

        fn orchestrator_with(
            &self,
            force: bool,
            resolver: Box<dyn VersionResolver>,
        ) -> PipelineOrchestrator {
            PipelineOrchestrator::new(
                PipelineSettings {
                    paths: self.paths.clone(),
                    force_regeneration: force,
                    pins: BTreeMap::new(),
                },
                self.specs.clone(),
                resolver,
                Box::new(FakeFactory(self.harness.clone())),
            )
        }

        fn run(&self) -> RunReport {
            self.orchestrator(false).run()
        }

        fn state(&self) -> StateStore {
            StateStore::load(&self.paths.state_file).unwrap()
        }

        fn set_artifact(&self, content: &str) {
            fs::write(&self.paths.tracked_artifact, content).unwrap();
        }

        fn output_files(&self) -> Vec<String> {
            let mut names: Vec<String> = fs::read_dir(&self.paths.output_dir)
                .unwrap()
                .map(|e| e.unwrap().file_name().into_string().unwrap())
                .collect();
            names.sort();
            names
        }

        fn output(&self, name: &str) -> String {
            fs::read_to_string(self.paths.output_dir.join(name)).unwrap()
        }

        fn artifact_hash(&self) -> String {
            ContentHashGate::new(&self.paths.tracked_artifact)
                .compute_hash()
                .unwrap()
        }

        fn root(&self) -> PathBuf {
            self.temp.path().to_path_buf()
        }
    }

    #[test]
    fn fresh_state_regenerates_and_commits() {
        let project = Project::new();

        let report = project.run();

        assert!(report.success());
        assert_eq!(report.record.final_state(), RunState::Succeeded);
        assert_eq!(report.reason, Some(RegenerationReason::NoPreviousHash));
        assert_eq!(project.output_files(), vec!["a.dll", "b.dll"]);

        let state = project.state();
        assert_eq!(state.input_hash(), Some(project.artifact_hash().as_str()));
        assert_eq!(state.stale_files, vec!["a.dll", "b.dll"]);
        assert_eq!(state.package_version("cpp2il"), Some("2022.1"));
        assert_eq!(state.package_version("unity_deps"), Some("2019.4"));
        assert!(state.last_success.is_some());
    }

    #[test]
    fn visits_states_in_order() {
        let project = Project::new();

        let report = project.run();

        assert_eq!(
            report.record.states,
            vec![
                RunState::Idle,
                RunState::ConfigLoaded,
                RunState::PackagesSetUp,
                RunState::GateEvaluated,
                RunState::Regenerating,
                RunState::Succeeded,
            ]
        );
    }

    #[test]
    fn lifecycle_call_order() {
        let project = Project::new();

        project.run();

        assert_eq!(
            project.harness.calls(),
            vec![
                "setup-refresh:cpp2il",
                "setup-refresh:interop",
                "setup-refresh:unity_deps",
                "cleanup:cpp2il",
                "cleanup:interop",
                "execute:cpp2il",
                "execute:interop",
                "cleanup:cpp2il",
                "cleanup:interop",
            ]
        );
    }

    #[test]
    fn unchanged_artifact_is_up_to_date_with_no_writes() {
        let project = Project::new();
        project.run();
        let state_before = fs::read_to_string(&project.paths.state_file).unwrap();
        let modified_before = fs::metadata(&project.paths.state_file)
            .unwrap()
            .modified()
            .unwrap();
        project.harness.clear();

        let report = project.run();

        assert!(report.success());
        assert_eq!(report.record.final_state(), RunState::UpToDate);
        assert!(!report.record.needs_regeneration);
        assert_eq!(
            project.harness.calls(),
            vec!["setup:cpp2il", "setup:interop", "setup:unity_deps"]
        );
        assert_eq!(
            fs::read_to_string(&project.paths.state_file).unwrap(),
            state_before
        );
        assert_eq!(
            fs::metadata(&project.paths.state_file)
                .unwrap()
                .modified()
                .unwrap(),
            modified_before
        );
        assert_eq!(project.output_files(), vec!["a.dll", "b.dll"]);
    }

    #[test]
    fn force_flag_regenerates_unchanged_artifact() {
        let project = Project::new();
        project.run();

        let report = project.orchestrator(true).run();

        assert_eq!(report.reason, Some(RegenerationReason::Forced));
        assert_eq!(report.record.final_state(), RunState::Succeeded);
    }

    #[test]
    fn changed_artifact_replaces_output_and_purges_stale_files() {
        let project = Project::new();
        project.run();
        fs::write(project.paths.output_dir.join("notes.txt"), "mine").unwrap();

        project.set_artifact("H2");
        project
            .harness
            .produce("interop", &[("b.dll", "b2"), ("c.dll", "c2")]);
        let report = project.run();

        assert_eq!(report.reason, Some(RegenerationReason::HashChanged));
        assert_eq!(
            project.output_files(),
            vec!["b.dll", "c.dll", "notes.txt"]
        );
        assert_eq!(project.output("b.dll"), "b2");
        let state = project.state();
        assert_eq!(state.stale_files, vec!["b.dll", "c.dll"]);
        assert_eq!(state.input_hash(), Some(project.artifact_hash().as_str()));
    }

    #[test]
    fn hash_scenario_h1_then_h2() {
        let project = Project::new();

        assert_eq!(project.run().record.final_state(), RunState::Succeeded);
        let h1 = project.state().input_hash().map(str::to_string);

        assert_eq!(project.run().record.final_state(), RunState::UpToDate);

        project.set_artifact("H2");
        assert_eq!(project.run().record.final_state(), RunState::Succeeded);
        let h2 = project.state().input_hash().map(str::to_string);

        assert_ne!(h1, h2);
        assert_eq!(h2.as_deref(), Some(project.artifact_hash().as_str()));
    }

    #[test]
    fn setup_failure_stops_before_execution() {
        let project = Project::new();
        project.harness.fail_setup("interop");

        let report = project.run();

        assert_eq!(report.record.failed_stage, Some(Stage::Setup));
        assert_eq!(report.exit_code(), 1);
        assert_eq!(
            project.harness.calls(),
            vec!["setup-refresh:cpp2il", "setup-refresh:interop"]
        );
        assert!(!project.paths.state_file.exists());
        assert!(!project.paths.output_dir.exists());
    }

    #[test]
    fn optional_support_setup_failure_is_tolerated() {
        let mut project = Project::new();
        project.specs[2].optional = true;
        project.harness.fail_setup("unity_deps");

        let report = project.run();

        assert!(report.success());
        assert_eq!(report.skipped_packages, vec!["unity_deps"]);
        let state = project.state();
        assert_eq!(state.package_version("unity_deps"), None);
        assert_eq!(state.package_version("cpp2il"), Some("2022.1"));
    }

    #[test]
    fn dump_failure_cleans_dumper_and_keeps_hash() {
        let project = Project::new();
        project.run();
        project.set_artifact("H2");
        project.harness.fail_execute("cpp2il");
        project.harness.clear();

        let report = project.run();

        assert_eq!(report.record.failed_stage, Some(Stage::ExecuteDump));
        let calls = project.harness.calls();
        assert_eq!(&calls[calls.len() - 2..], ["execute:cpp2il", "cleanup:cpp2il"]);
        assert!(!calls.contains(&"execute:interop".to_string()));
        assert_ne!(
            project.state().input_hash(),
            Some(project.artifact_hash().as_str())
        );
    }

    #[test]
    fn shim_failure_leaves_output_and_hash_unchanged() {
        let project = Project::new();
        project.run();
        let state_before = project.state();
        project.set_artifact("H2");
        project.harness.fail_execute("interop");
        project.harness.clear();

        let report = project.run();

        assert_eq!(report.record.failed_stage, Some(Stage::ExecuteShim));
        assert_eq!(
            report.record.final_state(),
            RunState::Failed(Stage::ExecuteShim)
        );
        let calls = project.harness.calls();
        assert_eq!(
            &calls[calls.len() - 3..],
            ["execute:interop", "cleanup:cpp2il", "cleanup:interop"]
        );
        assert_eq!(project.output_files(), vec!["a.dll", "b.dll"]);
        assert_eq!(project.output("a.dll"), "a1");
        assert_eq!(project.state(), state_before);
    }

    #[test]
    fn failed_run_is_retried_next_time() {
        let project = Project::new();
        project.harness.fail_execute("interop");
        assert!(!project.run().success());

        project.harness.script.borrow_mut().fail_execute.clear();
        let report = project.run();

        assert!(report.success());
        assert_eq!(report.reason, Some(RegenerationReason::NoPreviousHash));
    }

    #[test]
    fn unreadable_artifact_fails_at_gate() {
        let project = Project::new();
        fs::remove_file(&project.paths.tracked_artifact).unwrap();

        let report = project.run();

        assert_eq!(report.record.failed_stage, Some(Stage::Gate));
        assert!(report.record.error.unwrap().contains("libil2cpp.so"));
    }

    #[test]
    fn version_change_demands_regeneration() {
        let project = Project::new();
        project.run();
        project.harness.clear();

        let resolver = StaticVersionResolver::new().with("unity_deps", "2020.3");
        let report = project.orchestrator_with(false, Box::new(resolver)).run();

        assert_eq!(report.reason, None);
        assert_eq!(report.changed_packages, vec!["unity_deps"]);
        assert_eq!(report.record.final_state(), RunState::Succeeded);
        assert!(project
            .harness
            .calls()
            .contains(&"setup-refresh:unity_deps".to_string()));
        assert_eq!(project.state().package_version("unity_deps"), Some("2020.3"));
    }

    #[test]
    fn corrupt_state_forces_regeneration() {
        let project = Project::new();
        project.run();
        fs::write(&project.paths.state_file, "input_hash: [unclosed").unwrap();

        let report = project.run();

        assert_eq!(report.record.final_state(), RunState::Succeeded);
        assert_eq!(report.reason, Some(RegenerationReason::NoPreviousHash));
    }

    #[test]
    fn transient_output_is_cleaned_after_success() {
        let project = Project::new();
        project.run();

        assert!(!project.root().join("work").join("cpp2il").join("out").exists());
    }

    #[test]
    fn record_failure_is_set_once() {
        let mut record = RunRecord::default();
        let err = AsmgenError::ConfigValidationError {
            message: "x".to_string(),
        };

        record.fail(Stage::ExecuteShim, &err);
        record.fail(Stage::Persist, &err);

        assert_eq!(record.failed_stage, Some(Stage::ExecuteShim));
        assert_eq!(record.final_state(), RunState::Failed(Stage::ExecuteShim));
        assert!(record.final_state().is_terminal());
    }

    #[test]
    fn stage_names() {
        assert_eq!(Stage::ExecuteDump.to_string(), "execute-dump");
        assert_eq!(Stage::ExecuteShim.to_string(), "execute-shim");
        assert_eq!(Stage::Persist.to_string(), "persist");
    }

    #[test]
    fn offline_skips_remote_resolver() {
        let mut config = AsmgenConfig::default();
        config.version_source = Some(crate::config::VersionSourceConfig {
            url: "http://127.0.0.1:9/versions.json".to_string(),
            timeout_secs: 1,
        });

        let resolver = resolver_for(&config, true);
        assert_eq!(resolver.resolve("cpp2il"), None);
    }
}
