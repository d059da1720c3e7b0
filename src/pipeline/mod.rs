//! The regeneration pipeline.
//!
//! [`PipelineOrchestrator`] sets up every package, asks the
//! [`ContentHashGate`](crate::state::ContentHashGate) whether the tracked
//! artifact changed, runs the dumper and the shim generator, and hands the
//! shim generator's output to the [`OutputMigrator`].

pub mod migrate;
pub mod orchestrator;

pub use migrate::{MigrationSummary, OutputMigrator};
pub use orchestrator::{
    resolver_for, PipelineOrchestrator, PipelineSettings, RunOverrides, RunRecord, RunReport,
    RunState, Stage,
};
