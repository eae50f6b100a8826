// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod bootstrap;
pub mod offline;
pub mod reactive;
pub mod simulator;
pub mod stats;
pub mod trial;

pub use bootstrap::{BootstrapReport, bootstrap_makespan, bootstrap_transition};
pub use offline::{EpisodePredictions, OfflineEvaluation, evaluate_predictions};
pub use reactive::{ReactiveBaseline, ReactiveSimulation, reactive_baseline, simulate_reactive};
pub use simulator::{MakespanSimulator, SimulationReport, transition};
pub use stats::{MakespanDistribution, mean_and_std};
pub use trial::{Draw, TrialCounters, TrialState, run_trial};

/// Simulation namespace.
pub fn crate_name() -> &'static str {
    let _ = (
        mks_core::crate_name(),
        mks_eval::crate_name(),
        mks_monitor::crate_name(),
    );
    "mks-sim"
}
