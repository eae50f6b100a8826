// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::MksError;

const DEFAULT_TIMESTEP_S: f64 = 20.0 / 1000.0;
const DEFAULT_WINDOW_WIDTH: usize = 350;
const DEFAULT_ONSET_SEARCH_START_S: f64 = 1.5;
const DEFAULT_ONSET_SUB_WINDOW: usize = 10;
/// Fz is the third force/torque channel (Fx, Fy, Fz, Tx, Ty, Tz).
const DEFAULT_FORCE_CHANNEL: usize = 2;
const DEFAULT_SPIKE_THRESHOLD: f64 = 0.05;
const DEFAULT_MAX_ONSET_S: f64 = 15.0;
const DEFAULT_CONFIDENCE: f64 = 0.9;
const DEFAULT_BATCH_SIZE: usize = 256;
const DEFAULT_TRIALS: usize = 1_000;
const DEFAULT_MAX_DRAWS_PER_TRIAL: usize = 100_000;

/// Sampling period and rolling window width shared by every component.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimingConfig {
    pub timestep_s: f64,
    pub window_width: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            timestep_s: DEFAULT_TIMESTEP_S,
            window_width: DEFAULT_WINDOW_WIDTH,
        }
    }
}

impl TimingConfig {
    pub fn validate(&self) -> Result<(), MksError> {
        if !self.timestep_s.is_finite() || self.timestep_s <= 0.0 {
            return Err(MksError::invalid_input(format!(
                "TimingConfig.timestep_s must be finite and > 0; got {}",
                self.timestep_s
            )));
        }
        if self.window_width == 0 {
            return Err(MksError::invalid_input(
                "TimingConfig.window_width must be >= 1; got 0",
            ));
        }
        Ok(())
    }

    /// Elapsed seconds covered by `samples` timesteps.
    pub fn samples_to_seconds(&self, samples: usize) -> f64 {
        samples as f64 * self.timestep_s
    }

    /// Nearest whole number of timesteps for a duration in seconds.
    pub fn seconds_to_samples(&self, seconds: f64) -> usize {
        if !seconds.is_finite() || seconds <= 0.0 {
            return 0;
        }
        (seconds / self.timestep_s).round() as usize
    }

    /// Time at which the decision for window `index` becomes available, measured
    /// from the first sample the windows were taken from.
    pub fn decision_time_s(&self, index: usize) -> f64 {
        self.samples_to_seconds(index + self.window_width)
    }
}

/// Parameters of the force-onset ("chop") heuristic.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OnsetConfig {
    pub search_start_s: f64,
    pub sub_window: usize,
    /// Index into the feature channels (time and label columns excluded).
    pub force_channel: usize,
    pub spike_threshold: f64,
    pub max_onset_s: f64,
}

impl Default for OnsetConfig {
    fn default() -> Self {
        Self {
            search_start_s: DEFAULT_ONSET_SEARCH_START_S,
            sub_window: DEFAULT_ONSET_SUB_WINDOW,
            force_channel: DEFAULT_FORCE_CHANNEL,
            spike_threshold: DEFAULT_SPIKE_THRESHOLD,
            max_onset_s: DEFAULT_MAX_ONSET_S,
        }
    }
}

impl OnsetConfig {
    pub fn validate(&self) -> Result<(), MksError> {
        if !self.search_start_s.is_finite() || self.search_start_s < 0.0 {
            return Err(MksError::invalid_input(format!(
                "OnsetConfig.search_start_s must be finite and >= 0; got {}",
                self.search_start_s
            )));
        }
        if self.sub_window == 0 {
            return Err(MksError::invalid_input(
                "OnsetConfig.sub_window must be >= 1; got 0",
            ));
        }
        if !self.spike_threshold.is_finite() || self.spike_threshold < 0.0 {
            return Err(MksError::invalid_input(format!(
                "OnsetConfig.spike_threshold must be finite and >= 0; got {}",
                self.spike_threshold
            )));
        }
        if !self.max_onset_s.is_finite() || self.max_onset_s <= 0.0 {
            return Err(MksError::invalid_input(format!(
                "OnsetConfig.max_onset_s must be finite and > 0; got {}",
                self.max_onset_s
            )));
        }
        Ok(())
    }
}

/// Decision threshold and classifier batching.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanConfig {
    pub confidence: f64,
    pub batch_size: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), MksError> {
        validate_threshold(self.confidence)?;
        if self.batch_size == 0 {
            return Err(MksError::invalid_input(
                "ScanConfig.batch_size must be >= 1; got 0",
            ));
        }
        Ok(())
    }

    /// Integer percentage used to name confidence-scoped result directories.
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0).round() as u32
    }
}

/// Checks a decision threshold: finite and inside `[0, 1]`.
pub fn validate_threshold(threshold: f64) -> Result<(), MksError> {
    if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
        return Err(MksError::invalid_input(format!(
            "confidence threshold must be finite and in [0, 1]; got {threshold}"
        )));
    }
    Ok(())
}

/// Monte-Carlo run parameters.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationConfig {
    pub trials: usize,
    pub seed: Option<u64>,
    pub max_draws_per_trial: usize,
    pub cache_episode_outcomes: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            seed: None,
            max_draws_per_trial: DEFAULT_MAX_DRAWS_PER_TRIAL,
            cache_episode_outcomes: true,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), MksError> {
        if self.trials == 0 {
            return Err(MksError::invalid_input(
                "SimulationConfig.trials must be >= 1; got 0",
            ));
        }
        if self.max_draws_per_trial == 0 {
            return Err(MksError::invalid_input(
                "SimulationConfig.max_draws_per_trial must be >= 1; got 0",
            ));
        }
        Ok(())
    }
}

/// Full configuration for one evaluation or simulation run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MakespanConfig {
    pub timing: TimingConfig,
    pub onset: Option<OnsetConfig>,
    pub scan: ScanConfig,
    pub simulation: SimulationConfig,
}

impl Default for MakespanConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            onset: Some(OnsetConfig::default()),
            scan: ScanConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl MakespanConfig {
    pub fn validate(&self) -> Result<(), MksError> {
        self.timing.validate()?;
        if let Some(onset) = &self.onset {
            onset.validate()?;
        }
        self.scan.validate()?;
        self.simulation.validate()?;
        Ok(())
    }
}
