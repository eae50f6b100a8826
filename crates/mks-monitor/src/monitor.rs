// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::onset::{Onset, detect_onset};
use crate::scanner::{Decision, DecisionScanner};
use crate::window::SlidingWindowClassifier;
use mks_core::{
    Classifier, DecisionOutcome, Episode, EpisodeLabeler, EpisodeResult, MakespanConfig, MksError,
    OnsetConfig, OutcomeTag, TaskOutcome, TimingConfig,
};
use tracing::debug;

/// What the online monitor concluded for one episode, with the times needed
/// to charge it in a makespan simulation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonitoredEpisode {
    pub truth: TaskOutcome,
    pub decision: Decision,
    /// Full, unchopped episode duration.
    pub episode_time_s: f64,
    pub onset: Onset,
    /// `(index + W) * dt` from the chopped start; `None` for NC.
    pub decision_time_s: Option<f64>,
}

impl MonitoredEpisode {
    pub fn outcome(&self) -> DecisionOutcome {
        self.decision.outcome
    }

    pub fn tag(&self) -> OutcomeTag {
        self.decision.outcome.tag(self.truth)
    }

    /// Time spent before the monitor stopped the attempt: onset offset plus
    /// decision time. Equals the full episode time for NC.
    pub fn stop_time_s(&self) -> f64 {
        match self.decision_time_s {
            Some(decision) => self.onset.time_s + decision,
            None => self.episode_time_s,
        }
    }

    pub fn to_episode_result(&self) -> EpisodeResult {
        EpisodeResult::timed(
            self.truth,
            self.decision.outcome,
            self.episode_time_s,
            self.stop_time_s(),
        )
    }
}

/// Per-episode pipeline: label, optional onset chop, sliding classification
/// and first-crossing scan.
#[derive(Debug)]
pub struct EpisodeMonitor<C> {
    labeler: EpisodeLabeler,
    windows: SlidingWindowClassifier<C>,
    onset: Option<OnsetConfig>,
    threshold: f64,
}

impl<C: Classifier> EpisodeMonitor<C> {
    pub fn new(classifier: C, config: &MakespanConfig) -> Result<Self, MksError> {
        config.validate()?;
        Ok(Self {
            labeler: EpisodeLabeler::new(config.timing)?,
            windows: SlidingWindowClassifier::from_config(
                classifier,
                &config.timing,
                &config.scan,
            )?,
            onset: config.onset,
            threshold: config.scan.confidence,
        })
    }

    pub fn timing(&self) -> &TimingConfig {
        self.labeler.timing()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn into_classifier(self) -> C {
        self.windows.into_inner()
    }

    /// Runs the monitor over one episode.
    ///
    /// Fails with `InvalidEpisode` when the onset comes too late or the chopped
    /// episode is shorter than one window.
    pub fn monitor(&mut self, episode: &Episode) -> Result<MonitoredEpisode, MksError> {
        let labeled = self.labeler.label(episode);
        let timing = *self.labeler.timing();
        let full = episode.view();

        let onset = match &self.onset {
            Some(config) => {
                let onset = detect_onset(&full, &timing, config)?;
                if !onset.is_within(config) {
                    return Err(MksError::invalid_episode(format!(
                        "onset at {:.3} s is not before the {:.3} s budget",
                        onset.time_s, config.max_onset_s
                    )));
                }
                onset
            }
            None => Onset::NONE,
        };

        let chopped = full.truncate_front(onset.index)?;
        let mut scanner = DecisionScanner::new(labeled.outcome, self.threshold)?;
        let decision = self.windows.scan_episode(&chopped, &mut scanner)?;
        let decision_time_s = decision
            .is_classified()
            .then(|| timing.decision_time_s(decision.index));

        debug!(
            truth = ?labeled.outcome,
            outcome = %decision.outcome,
            index = decision.index,
            onset_index = onset.index,
            "episode decision"
        );

        Ok(MonitoredEpisode {
            truth: labeled.outcome,
            decision,
            episode_time_s: labeled.duration_s,
            onset,
            decision_time_s,
        })
    }
}
