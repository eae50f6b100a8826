// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::stats::MakespanDistribution;
use crate::trial::{Draw, TrialCounters, TrialState, run_trial};
use mks_core::{EpisodeResult, MksError, RunDiagnostics, SimulationConfig, TaskOutcome};
use rand::Rng;
use tracing::info;

/// Charged time and next state for one resampled episode result.
///
/// A negative call aborts after its decision time. Anything else runs the
/// episode to completion, and the task is done only when it truly succeeded.
pub fn bootstrap_transition(result: &EpisodeResult) -> (f64, TrialState) {
    if result.outcome.is_negative() {
        return (result.time_to_negative_s, TrialState::Retry);
    }
    let next = match result.truth {
        TaskOutcome::Success => TrialState::Win,
        TaskOutcome::Failure => TrialState::Retry,
    };
    (result.run_time_s, next)
}

/// Makespan distribution from resampling timed episode results.
#[derive(Clone, Debug, PartialEq)]
pub struct BootstrapReport {
    pub distribution: MakespanDistribution,
    pub diagnostics: RunDiagnostics,
}

pub fn bootstrap_makespan<R: Rng + ?Sized>(
    results: &[EpisodeResult],
    config: &SimulationConfig,
    rng: &mut R,
) -> Result<BootstrapReport, MksError> {
    if results.is_empty() {
        return Err(MksError::invalid_input(
            "bootstrap requires at least one episode result",
        ));
    }
    config.validate()?;
    for (i, result) in results.iter().enumerate() {
        let (cost, _) = bootstrap_transition(result);
        if !cost.is_finite() || cost < 0.0 {
            return Err(MksError::invalid_input(format!(
                "episode result {i} ({}) has no usable charge time; got {cost}",
                result.tag()
            )));
        }
    }

    let mut counters = TrialCounters::default();
    let mut makespans = Vec::with_capacity(config.trials);
    for _ in 0..config.trials {
        let makespan = run_trial(rng, config.max_draws_per_trial, &mut counters, |rng| {
            let (cost_s, next) = bootstrap_transition(&results[rng.gen_range(0..results.len())]);
            Ok(Draw::Charged { cost_s, next })
        })?;
        makespans.push(makespan);
    }

    let distribution = MakespanDistribution::from_samples(makespans);
    info!(trials = config.trials, mean = %distribution.mean, "bootstrap finished");
    Ok(BootstrapReport {
        distribution,
        diagnostics: RunDiagnostics {
            episodes: results.len(),
            trials: config.trials,
            draws: counters.draws,
            seed: config.seed,
            ..RunDiagnostics::default()
        },
    })
}
