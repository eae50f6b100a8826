// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod monitor;
pub mod onset;
pub mod scanner;
pub mod window;

pub use monitor::{EpisodeMonitor, MonitoredEpisode};
pub use onset::{Onset, detect_onset};
pub use scanner::{Decision, DecisionScanner, scan_for_decision};
pub use window::SlidingWindowClassifier;

/// Online monitoring namespace.
pub fn crate_name() -> &'static str {
    let _ = mks_core::crate_name();
    "mks-monitor"
}
