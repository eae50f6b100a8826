// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::stats::MakespanDistribution;
use crate::trial::{Draw, TrialCounters, TrialState, run_trial};
use mks_core::{
    Classifier, DecisionOutcome, Episode, MakespanConfig, MetricValue, MksError, RunDiagnostics,
    SimulationConfig, TaskOutcome,
};
use mks_eval::{ConfusionRates, MakespanMetrics, PerformanceAccumulator};
use mks_monitor::{EpisodeMonitor, MonitoredEpisode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Output of one monitored Monte-Carlo run.
///
/// MTP and MTN in `metrics` are stop times: onset offset plus decision time,
/// not the full episode time a positive call goes on to run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationReport {
    pub distribution: MakespanDistribution,
    pub performance: PerformanceAccumulator,
    pub confusion: ConfusionRates,
    /// Aggregates of every tallied draw; `metrics.ems` is the analytic estimate.
    pub metrics: MakespanMetrics,
    pub diagnostics: RunDiagnostics,
}

impl SimulationReport {
    pub fn mean(&self) -> MetricValue {
        self.distribution.mean
    }

    pub fn equation_makespan(&self) -> MetricValue {
        self.metrics.ems
    }

    #[cfg(feature = "serde")]
    pub fn to_record(&self) -> mks_eval::ResultRecord {
        mks_eval::ResultRecord::from_accumulator(
            &self.performance,
            mks_eval::RecordMakespan::Simulated {
                equation_predicted_makespan: self.metrics.ems,
                simulation_makespan: self.distribution.mean,
                simulation_makespan_list: self.distribution.makespans.clone(),
                simulation_makespan_std: self.distribution.std,
            },
        )
    }
}

#[derive(Clone, Copy, Debug)]
enum CachedOutcome {
    Valid(MonitoredEpisode),
    Invalid,
}

/// Charged time and next state for one monitored episode.
///
/// NC on a failure retries after the full episode, NC on a success wins after
/// it; negative calls retry after onset plus decision time; positive calls
/// let the episode run to completion and end the task.
pub fn transition(episode: &MonitoredEpisode) -> (f64, TrialState) {
    match episode.outcome() {
        DecisionOutcome::NC => match episode.truth {
            TaskOutcome::Success => (episode.episode_time_s, TrialState::Win),
            TaskOutcome::Failure => (episode.episode_time_s, TrialState::Retry),
        },
        DecisionOutcome::TN | DecisionOutcome::FN => (episode.stop_time_s(), TrialState::Retry),
        DecisionOutcome::TP | DecisionOutcome::FP => (episode.episode_time_s, TrialState::Win),
    }
}

/// Monte-Carlo estimate of the monitored makespan over a pool of episodes
/// sampled with replacement.
#[derive(Debug)]
pub struct MakespanSimulator<'a, C> {
    episodes: &'a [Episode],
    monitor: EpisodeMonitor<C>,
    config: SimulationConfig,
    cache: Vec<Option<CachedOutcome>>,
}

impl<'a, C: Classifier> MakespanSimulator<'a, C> {
    pub fn new(
        episodes: &'a [Episode],
        classifier: C,
        config: &MakespanConfig,
    ) -> Result<Self, MksError> {
        if episodes.is_empty() {
            return Err(MksError::invalid_input(
                "MakespanSimulator requires a non-empty episode pool",
            ));
        }
        config.validate()?;
        Ok(Self {
            episodes,
            monitor: EpisodeMonitor::new(classifier, config)?,
            config: config.simulation,
            cache: vec![None; episodes.len()],
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn into_classifier(self) -> C {
        self.monitor.into_classifier()
    }

    /// Runs with the configured seed, or thread-local entropy when none is set.
    pub fn run_from_config(&mut self) -> Result<SimulationReport, MksError> {
        match self.config.seed {
            Some(seed) => self.run(&mut StdRng::seed_from_u64(seed)),
            None => self.run(&mut rand::thread_rng()),
        }
    }

    pub fn run<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<SimulationReport, MksError> {
        let started_at = Instant::now();
        let mut performance = PerformanceAccumulator::new();
        let mut counters = TrialCounters::default();
        let mut makespans = Vec::with_capacity(self.config.trials);

        for trial in 0..self.config.trials {
            let makespan = self.run_trial(rng, &mut performance, &mut counters)?;
            debug!(trial, makespan, "monitored trial finished");
            makespans.push(makespan);
        }

        let metrics = performance.metrics();
        let mut diagnostics = RunDiagnostics {
            runtime_ms: Some(u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)),
            episodes: self.episodes.len(),
            trials: self.config.trials,
            draws: counters.draws,
            invalid_draws: counters.discarded,
            seed: self.config.seed,
            ..RunDiagnostics::default()
        };
        if counters.discarded > 0 {
            warn!(
                discarded = counters.discarded,
                draws = counters.draws,
                "discarded draws of episodes invalid for this run"
            );
            diagnostics.warnings.push(format!(
                "{} draws discarded as invalid episodes",
                counters.discarded
            ));
        }
        if !metrics.ems.is_defined() {
            diagnostics
                .notes
                .push("analytic EMS not applicable for this run".to_string());
        }

        let distribution = MakespanDistribution::from_samples(makespans);
        info!(
            trials = self.config.trials,
            mean = %distribution.mean,
            equation = %metrics.ems,
            "monitored simulation finished"
        );

        Ok(SimulationReport {
            distribution,
            confusion: performance.confusion_rates(),
            metrics,
            performance,
            diagnostics,
        })
    }

    fn run_trial<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        performance: &mut PerformanceAccumulator,
        counters: &mut TrialCounters,
    ) -> Result<f64, MksError> {
        let max_draws = self.config.max_draws_per_trial;
        run_trial(rng, max_draws, counters, |rng| {
            let index = rng.gen_range(0..self.episodes.len());
            match self.outcome_for(index)? {
                CachedOutcome::Invalid => Ok(Draw::Discarded),
                CachedOutcome::Valid(episode) => {
                    performance.record(&episode.to_episode_result())?;
                    let (cost_s, next) = transition(&episode);
                    Ok(Draw::Charged { cost_s, next })
                }
            }
        })
    }

    fn outcome_for(&mut self, index: usize) -> Result<CachedOutcome, MksError> {
        if let Some(cached) = self.cache[index] {
            return Ok(cached);
        }
        let outcome = match self.monitor.monitor(&self.episodes[index]) {
            Ok(episode) => CachedOutcome::Valid(episode),
            Err(err) if err.is_episode_local() => {
                debug!(index, error = %err, "episode invalid for this run");
                CachedOutcome::Invalid
            }
            Err(err) => return Err(err),
        };
        if self.config.cache_episode_outcomes {
            self.cache[index] = Some(outcome);
        }
        Ok(outcome)
    }
}
