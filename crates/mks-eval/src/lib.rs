// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod accumulator;
pub mod equations;
pub mod metrics;
#[cfg(feature = "serde")]
pub mod record;
pub mod sensitivity;

pub use accumulator::{PerformanceAccumulator, TimeSum};
pub use equations::{
    MeanTimes, MonitoredBranch, OutcomeProbabilities, RenewalClass, monitored_makespan,
    monitored_makespan_alternative, reactive_makespan, renewal_reward_makespan,
    select_monitored_makespan, simulator_protocol,
};
pub use metrics::{ConfusionRates, MakespanMetrics};
#[cfg(feature = "serde")]
pub use record::{BatchReport, RecordMakespan, ResultRecord, ResultStore};
pub use sensitivity::{
    DEFAULT_PROBABILITY_GRID_END, DEFAULT_SWEEP_POINTS, SweepPoint, SweepVariable, linspace,
    sensitivity_sweep,
};

/// Evaluation namespace.
pub fn crate_name() -> &'static str {
    let _ = mks_core::crate_name();
    "mks-eval"
}
