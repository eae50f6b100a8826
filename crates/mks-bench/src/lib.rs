// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Synthetic workloads shared by the benchmarks.

use mks_core::{
    ClassProbabilities, DecisionOutcome, Episode, EpisodeResult, FnClassifier, MakespanConfig,
    MksError, ScanConfig, SimulationConfig, TaskOutcome, TimingConfig,
};
use mks_eval::PerformanceAccumulator;

/// Feature channels of generated episodes: `[marker, step]`.
pub const CHANNELS: usize = 2;

/// Probability rows that stay below any threshold until `crossing_at`, then
/// turn confidently positive.
pub fn probability_rows(n: usize, crossing_at: Option<usize>) -> Vec<ClassProbabilities> {
    (0..n)
        .map(|i| match crossing_at {
            Some(at) if i >= at => [0.97, 0.03],
            _ => [0.55, 0.45],
        })
        .collect()
}

/// Episode whose marker channel is `+1` for a success and `-1` for a failure.
pub fn marker_episode(n: usize, outcome: TaskOutcome) -> Result<Episode, MksError> {
    let marker = if outcome.is_success() { 1.0 } else { -1.0 };
    let features = (0..n).flat_map(|t| [marker, t as f64]).collect();
    Episode::new(features, n, CHANNELS, outcome)
}

/// Alternating success/failure pool of `count` episodes of `n` samples each.
pub fn episode_pool(count: usize, n: usize) -> Result<Vec<Episode>, MksError> {
    (0..count)
        .map(|i| {
            let outcome = if i % 2 == 0 {
                TaskOutcome::Success
            } else {
                TaskOutcome::Failure
            };
            marker_episode(n, outcome)
        })
        .collect()
}

/// Reads the marker once the window ends at or after `confident_from`.
pub fn marker_classifier(
    confident_from: f64,
) -> FnClassifier<impl FnMut(&[f64]) -> ClassProbabilities> {
    FnClassifier::new(move |w: &[f64]| match w.len().checked_sub(CHANNELS) {
        Some(start) if w[start + 1] >= confident_from => {
            if w[start] > 0.0 {
                [0.95, 0.05]
            } else {
                [0.05, 0.95]
            }
        }
        _ => [0.5, 0.5],
    })
}

/// `n` timed results cycling through all six outcome tags.
pub fn mixed_results(n: usize) -> Vec<EpisodeResult> {
    const KINDS: [(TaskOutcome, DecisionOutcome); 6] = [
        (TaskOutcome::Success, DecisionOutcome::TP),
        (TaskOutcome::Success, DecisionOutcome::FN),
        (TaskOutcome::Success, DecisionOutcome::NC),
        (TaskOutcome::Failure, DecisionOutcome::TN),
        (TaskOutcome::Failure, DecisionOutcome::FP),
        (TaskOutcome::Failure, DecisionOutcome::NC),
    ];
    (0..n)
        .map(|i| {
            let (truth, outcome) = KINDS[i % KINDS.len()];
            let run = 20.0 + (i % 17) as f64;
            let stop = if outcome.is_classified() {
                5.0 + (i % 7) as f64
            } else {
                f64::NAN
            };
            EpisodeResult::timed(truth, outcome, run, stop)
        })
        .collect()
}

pub fn tally(results: &[EpisodeResult]) -> Result<PerformanceAccumulator, MksError> {
    let mut acc = PerformanceAccumulator::new();
    for result in results {
        acc.record(result)?;
    }
    Ok(acc)
}

/// Small-window configuration without onset chopping.
pub fn bench_config(window_width: usize, trials: usize) -> MakespanConfig {
    MakespanConfig {
        timing: TimingConfig {
            timestep_s: 0.02,
            window_width,
        },
        onset: None,
        scan: ScanConfig::default(),
        simulation: SimulationConfig {
            trials,
            seed: Some(42),
            ..SimulationConfig::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{episode_pool, marker_classifier, mixed_results, probability_rows, tally};
    use mks_core::{Classifier, MetricValue, OutcomeTag, TaskOutcome, WindowBatch};

    #[test]
    fn rows_cross_only_after_requested_index() {
        let rows = probability_rows(5, Some(3));
        assert_eq!(rows[2], [0.55, 0.45]);
        assert_eq!(rows[3], [0.97, 0.03]);
        assert!(probability_rows(4, None).iter().all(|r| r[0] < 0.9));
    }

    #[test]
    fn pool_alternates_outcomes() {
        let pool = episode_pool(4, 10).expect("valid pool");
        assert_eq!(pool[0].outcome(), TaskOutcome::Success);
        assert_eq!(pool[1].outcome(), TaskOutcome::Failure);
        assert_eq!(pool[3].len(), 10);
    }

    #[test]
    fn classifier_reads_last_row_of_window() {
        let mut classifier = marker_classifier(2.0);
        let mut batch = WindowBatch::new(2, 2);
        batch.push(&[-1.0, 0.0, -1.0, 1.0]).expect("window fits");
        batch.push(&[-1.0, 1.0, -1.0, 2.0]).expect("window fits");
        let rows = classifier.classify(&batch).expect("classifies");
        assert_eq!(rows, vec![[0.5, 0.5], [0.05, 0.95]]);
    }

    #[test]
    fn mixed_results_fill_every_tag_evenly() {
        let acc = tally(&mixed_results(600)).expect("valid results");
        for tag in OutcomeTag::ALL {
            assert_eq!(acc.get(tag), 100, "{tag}");
        }
        let metrics = acc.metrics();
        assert!(matches!(metrics.ems, MetricValue::Defined(v) if v > 0.0));
        assert!(matches!(metrics.mtn, MetricValue::Defined(v) if (5.0..=11.0).contains(&v)));
    }
}
