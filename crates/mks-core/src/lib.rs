// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod classifier;
pub mod config;
pub mod diagnostics;
pub mod episode;
pub mod error;
pub mod metric;
pub mod outcome;

pub use classifier::{
    ClassProbabilities, Classifier, FnClassifier, WindowBatch, validate_batch_output,
};
pub use config::{
    MakespanConfig, OnsetConfig, ScanConfig, SimulationConfig, TimingConfig, validate_threshold,
};
pub use diagnostics::{DIAGNOSTICS_SCHEMA_VERSION, RunDiagnostics};
pub use episode::{Episode, EpisodeLabeler, EpisodeView, LabeledEpisode, TaskOutcome};
pub use error::MksError;
pub use metric::MetricValue;
pub use outcome::{DecisionOutcome, EpisodeResult, OutcomeTag};

/// Core shared types and traits for makespan estimation.
pub fn crate_name() -> &'static str {
    "mks-core"
}
