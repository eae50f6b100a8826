// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::stats::MakespanDistribution;
use crate::trial::{Draw, TrialCounters, TrialState, run_trial};
use mks_core::{
    Episode, EpisodeLabeler, MetricValue, MksError, RunDiagnostics, SimulationConfig, TaskOutcome,
    TimingConfig,
};
use mks_eval::reactive_makespan;
use rand::Rng;
use std::time::Instant;
use tracing::info;

/// Unmonitored statistics of an episode pool.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReactiveBaseline {
    pub episodes: usize,
    pub mts: MetricValue,
    pub mtf: MetricValue,
    pub p_success: MetricValue,
    pub p_failure: MetricValue,
    /// Reactive expected makespan; undefined without successes.
    pub ems: MetricValue,
}

/// MTS, MTF and outcome frequencies over `episodes`, plus the reactive EMS.
pub fn reactive_baseline(
    episodes: &[Episode],
    timing: &TimingConfig,
) -> Result<ReactiveBaseline, MksError> {
    let labeler = EpisodeLabeler::new(*timing)?;
    let mut success = (0.0, 0usize);
    let mut failure = (0.0, 0usize);
    for episode in episodes {
        let labeled = labeler.label(episode);
        let slot = match labeled.outcome {
            TaskOutcome::Success => &mut success,
            TaskOutcome::Failure => &mut failure,
        };
        slot.0 += labeled.duration_s;
        slot.1 += 1;
    }

    let total = episodes.len() as f64;
    let mts = MetricValue::ratio(success.0, success.1 as f64);
    let mtf = MetricValue::ratio(failure.0, failure.1 as f64);
    let p_success = MetricValue::ratio(success.1 as f64, total);
    let p_failure = MetricValue::ratio(failure.1 as f64, total);

    // With no failures MTF is never weighted, so it is treated as zero.
    let ems = match (mts, p_success, p_failure) {
        (MetricValue::Defined(mts), MetricValue::Defined(ps), MetricValue::Defined(pf)) => {
            reactive_makespan(mts, mtf.as_option().unwrap_or(0.0), ps, pf)
        }
        _ => MetricValue::NotApplicable,
    };

    Ok(ReactiveBaseline {
        episodes: episodes.len(),
        mts,
        mtf,
        p_success,
        p_failure,
        ems,
    })
}

/// Monte-Carlo run of the unmonitored process.
#[derive(Clone, Debug, PartialEq)]
pub struct ReactiveSimulation {
    pub distribution: MakespanDistribution,
    pub diagnostics: RunDiagnostics,
}

/// Draws episodes with replacement until one truly succeeds, charging the full
/// episode each time.
pub fn simulate_reactive<R: Rng + ?Sized>(
    episodes: &[Episode],
    timing: &TimingConfig,
    config: &SimulationConfig,
    rng: &mut R,
) -> Result<ReactiveSimulation, MksError> {
    if episodes.is_empty() {
        return Err(MksError::invalid_input(
            "reactive simulation requires a non-empty episode pool",
        ));
    }
    config.validate()?;
    let labeler = EpisodeLabeler::new(*timing)?;
    let labeled: Vec<_> = episodes.iter().map(|e| labeler.label(e)).collect();

    let started_at = Instant::now();
    let mut counters = TrialCounters::default();
    let mut makespans = Vec::with_capacity(config.trials);
    for _ in 0..config.trials {
        let makespan = run_trial(rng, config.max_draws_per_trial, &mut counters, |rng| {
            let episode = &labeled[rng.gen_range(0..labeled.len())];
            let next = if episode.outcome.is_success() {
                TrialState::Win
            } else {
                TrialState::Retry
            };
            Ok(Draw::Charged {
                cost_s: episode.duration_s,
                next,
            })
        })?;
        makespans.push(makespan);
    }

    let distribution = MakespanDistribution::from_samples(makespans);
    info!(trials = config.trials, mean = %distribution.mean, "reactive simulation finished");
    Ok(ReactiveSimulation {
        distribution,
        diagnostics: RunDiagnostics {
            runtime_ms: Some(u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)),
            episodes: episodes.len(),
            trials: config.trials,
            draws: counters.draws,
            invalid_draws: counters.discarded,
            seed: config.seed,
            ..RunDiagnostics::default()
        },
    })
}
