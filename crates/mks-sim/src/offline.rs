// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use mks_core::{
    ClassProbabilities, EpisodeResult, MetricValue, MksError, RunDiagnostics, TaskOutcome,
    TimingConfig,
};
use mks_eval::{ConfusionRates, MakespanMetrics, PerformanceAccumulator};
use mks_monitor::scan_for_decision;
use tracing::{info, warn};

/// Saved per-window classifier output for one episode.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodePredictions {
    pub truth: TaskOutcome,
    /// One row per window, in temporal order.
    pub probabilities: Vec<ClassProbabilities>,
}

/// Result of one pass of the decision protocol over saved predictions.
#[derive(Clone, Debug, PartialEq)]
pub struct OfflineEvaluation {
    pub results: Vec<EpisodeResult>,
    pub performance: PerformanceAccumulator,
    pub confusion: ConfusionRates,
    pub metrics: MakespanMetrics,
    pub diagnostics: RunDiagnostics,
}

impl OfflineEvaluation {
    pub fn predicted_makespan(&self) -> MetricValue {
        self.metrics.ems
    }

    #[cfg(feature = "serde")]
    pub fn to_record(&self) -> mks_eval::ResultRecord {
        mks_eval::ResultRecord::from_accumulator(
            &self.performance,
            mks_eval::RecordMakespan::Predicted {
                predicted_makespan: self.metrics.ems,
            },
        )
    }
}

/// Scans every episode's saved predictions once and tallies the outcomes.
///
/// Run time is `(n_windows + W - 1) * dt`; decision time is `(index + W) * dt`.
/// Episodes without a single window are skipped.
pub fn evaluate_predictions(
    predictions: &[EpisodePredictions],
    timing: &TimingConfig,
    threshold: f64,
) -> Result<OfflineEvaluation, MksError> {
    timing.validate()?;
    mks_core::validate_threshold(threshold)?;

    let mut performance = PerformanceAccumulator::new();
    let mut results = Vec::with_capacity(predictions.len());
    let mut diagnostics = RunDiagnostics {
        episodes: predictions.len(),
        trials: 1,
        ..RunDiagnostics::default()
    };

    for (i, episode) in predictions.iter().enumerate() {
        let n_windows = episode.probabilities.len();
        if n_windows == 0 {
            warn!(episode = i, "skipping episode without window predictions");
            diagnostics.invalid_draws += 1;
            continue;
        }
        let decision = scan_for_decision(&episode.probabilities, episode.truth, threshold)?;
        let run_time_s = timing.samples_to_seconds(n_windows + timing.window_width - 1);
        let decision_time_s = if decision.is_classified() {
            timing.decision_time_s(decision.index)
        } else {
            f64::NAN
        };
        let result =
            EpisodeResult::timed(episode.truth, decision.outcome, run_time_s, decision_time_s);
        performance.record(&result)?;
        diagnostics.draws += 1;
        results.push(result);
    }

    if diagnostics.invalid_draws > 0 {
        diagnostics.warnings.push(format!(
            "{} episodes without predictions were skipped",
            diagnostics.invalid_draws
        ));
    }

    let metrics = performance.metrics();
    info!(
        episodes = results.len(),
        threshold,
        predicted = %metrics.ems,
        "offline evaluation finished"
    );
    Ok(OfflineEvaluation {
        results,
        confusion: performance.confusion_rates(),
        metrics,
        performance,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::{EpisodePredictions, evaluate_predictions};
    use mks_core::{DecisionOutcome, MetricValue, OutcomeTag, TaskOutcome, TimingConfig};

    fn timing() -> TimingConfig {
        TimingConfig {
            timestep_s: 0.5,
            window_width: 4,
        }
    }

    fn episode(truth: TaskOutcome, rows: Vec<[f64; 2]>) -> EpisodePredictions {
        EpisodePredictions {
            truth,
            probabilities: rows,
        }
    }

    #[test]
    fn times_follow_window_geometry() {
        let preds = [episode(
            TaskOutcome::Failure,
            vec![[0.5, 0.5], [0.5, 0.5], [0.05, 0.95], [0.5, 0.5]],
        )];
        let eval = evaluate_predictions(&preds, &timing(), 0.9).expect("valid");
        let result = eval.results[0];
        assert_eq!(result.outcome, DecisionOutcome::TN);
        // (4 windows + 4 - 1) * 0.5
        assert_eq!(result.run_time_s, 3.5);
        // (2 + 4) * 0.5
        assert_eq!(result.time_to_negative_s, 3.0);
    }

    #[test]
    fn mixed_pool_populates_confusion_table() {
        let preds = [
            episode(TaskOutcome::Success, vec![[0.95, 0.05]]),
            episode(TaskOutcome::Success, vec![[0.5, 0.5]]),
            episode(TaskOutcome::Failure, vec![[0.02, 0.98]]),
            episode(TaskOutcome::Failure, vec![[0.97, 0.03]]),
            episode(TaskOutcome::Failure, vec![]),
        ];
        let eval = evaluate_predictions(&preds, &timing(), 0.9).expect("valid");
        assert_eq!(eval.performance.get(OutcomeTag::TP), 1);
        assert_eq!(eval.performance.get(OutcomeTag::NCS), 1);
        assert_eq!(eval.performance.get(OutcomeTag::TN), 1);
        assert_eq!(eval.performance.get(OutcomeTag::FP), 1);
        assert_eq!(eval.results.len(), 4);
        assert_eq!(eval.diagnostics.invalid_draws, 1);
        assert_eq!(eval.confusion.tp, MetricValue::Defined(1.0));
        assert_eq!(eval.confusion.fp, MetricValue::Defined(0.5));
        assert_eq!(eval.metrics.p_ncs, MetricValue::Defined(0.25));
    }

    #[test]
    fn single_polarity_pool_has_no_predicted_makespan() {
        let preds = [episode(TaskOutcome::Success, vec![[0.95, 0.05]])];
        let eval = evaluate_predictions(&preds, &timing(), 0.9).expect("valid");
        assert_eq!(eval.predicted_makespan(), MetricValue::NotApplicable);
    }

    #[test]
    fn rejects_bad_threshold() {
        let err = evaluate_predictions(&[], &timing(), 1.5).expect_err("threshold out of range");
        assert_eq!(err.code(), "invalid_input");
    }
}
