// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use mks_core::{EpisodeView, MksError, OnsetConfig, TimingConfig};

/// Detected start of physical interaction within one episode.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Onset {
    /// Truncation index: end of the first spiking sub-window, or 0 if none.
    pub index: usize,
    pub time_s: f64,
}

impl Onset {
    pub const NONE: Self = Self {
        index: 0,
        time_s: 0.0,
    };

    pub fn detected(&self) -> bool {
        self.index > 0
    }

    /// An episode is usable only when its onset comes strictly before `max_onset_s`.
    pub fn is_within(&self, config: &OnsetConfig) -> bool {
        self.time_s < config.max_onset_s
    }
}

/// Finds the first trailing sub-window on the force channel whose peak-to-peak
/// range reaches the spike threshold.
pub fn detect_onset(
    view: &EpisodeView<'_>,
    timing: &TimingConfig,
    config: &OnsetConfig,
) -> Result<Onset, MksError> {
    config.validate()?;
    if config.force_channel >= view.channels() {
        return Err(MksError::invalid_input(format!(
            "OnsetConfig.force_channel={} out of range for episode with {} channels",
            config.force_channel,
            view.channels()
        )));
    }

    let width = config.sub_window;
    let search_start = timing.seconds_to_samples(config.search_start_s);
    if view.len() < width || search_start > view.len() - width {
        return Ok(Onset::NONE);
    }

    let force: Vec<f64> = view.channel(config.force_channel).collect();
    for begin in search_start..=(force.len() - width) {
        let slice = &force[begin..begin + width];
        let (lo, hi) = slice
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                (lo.min(x), hi.max(x))
            });
        if hi - lo >= config.spike_threshold {
            let index = begin + width;
            return Ok(Onset {
                index,
                time_s: timing.samples_to_seconds(index),
            });
        }
    }

    Ok(Onset::NONE)
}
