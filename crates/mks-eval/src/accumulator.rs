// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::equations::{MeanTimes, OutcomeProbabilities, select_monitored_makespan};
use crate::metrics::{ConfusionRates, MakespanMetrics};
use mks_core::{EpisodeResult, MetricValue, MksError, OutcomeTag, TaskOutcome};
use std::collections::BTreeMap;

const TAGS: usize = OutcomeTag::ALL.len();

/// Running sum of durations with its own sample count.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimeSum {
    pub total_s: f64,
    pub n: u64,
}

impl TimeSum {
    fn add(&mut self, seconds: f64) -> Result<(), MksError> {
        self.n = self.n.checked_add(1).ok_or_else(|| {
            MksError::resource_limit("time sample counter overflowed u64")
        })?;
        self.total_s += seconds;
        Ok(())
    }

    fn merge(&mut self, other: &Self) -> Result<(), MksError> {
        self.n = self.n.checked_add(other.n).ok_or_else(|| {
            MksError::resource_limit("time sample counter overflowed u64 while merging")
        })?;
        self.total_s += other.total_s;
        Ok(())
    }

    pub fn mean(&self) -> MetricValue {
        MetricValue::ratio(self.total_s, self.n as f64)
    }
}

fn combine(sums: &[TimeSum]) -> TimeSum {
    sums.iter().fold(TimeSum::default(), |acc, s| TimeSum {
        total_s: acc.total_s + s.total_s,
        n: acc.n.saturating_add(s.n),
    })
}

fn truth_of(tag: OutcomeTag) -> TaskOutcome {
    match tag {
        OutcomeTag::TP | OutcomeTag::FN | OutcomeTag::NCS => TaskOutcome::Success,
        OutcomeTag::TN | OutcomeTag::FP | OutcomeTag::NCF => TaskOutcome::Failure,
    }
}

/// Confusion-style tally of decision outcomes plus per-category elapsed times.
///
/// One accumulator belongs to one evaluation run and is threaded through the
/// loop by `&mut`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PerformanceAccumulator {
    counts: [u64; TAGS],
    /// Full episode time per tag.
    run_time: [TimeSum; TAGS],
    /// Time until the classification that stopped or confirmed the attempt.
    decision_time: [TimeSum; TAGS],
}

impl PerformanceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the tally for `tag`.
    pub fn count(&mut self, tag: OutcomeTag) -> Result<(), MksError> {
        let slot = &mut self.counts[tag.index()];
        *slot = slot.checked_add(1).ok_or_else(|| {
            MksError::resource_limit(format!("{tag} counter overflowed u64"))
        })?;
        Ok(())
    }

    /// Counts the result's tag and adds its applicable times.
    pub fn record(&mut self, result: &EpisodeResult) -> Result<(), MksError> {
        let tag = result.tag();
        if !result.run_time_s.is_finite() || result.run_time_s < 0.0 {
            return Err(MksError::invalid_input(format!(
                "EpisodeResult.run_time_s must be finite and >= 0 for {tag}; got {}",
                result.run_time_s
            )));
        }
        let decision_time = if result.outcome.is_positive() {
            Some(result.time_to_positive_s)
        } else if result.outcome.is_negative() {
            Some(result.time_to_negative_s)
        } else {
            None
        };
        if let Some(t) = decision_time {
            if !t.is_finite() || t < 0.0 {
                return Err(MksError::invalid_input(format!(
                    "decision time must be finite and >= 0 for {tag}; got {t}"
                )));
            }
        }

        self.count(tag)?;
        self.run_time[tag.index()].add(result.run_time_s)?;
        if let Some(t) = decision_time {
            self.decision_time[tag.index()].add(t)?;
        }
        Ok(())
    }

    pub fn merge(&mut self, other: &Self) -> Result<(), MksError> {
        for i in 0..TAGS {
            self.counts[i] = self.counts[i].checked_add(other.counts[i]).ok_or_else(|| {
                MksError::resource_limit("outcome counter overflowed u64 while merging")
            })?;
            self.run_time[i].merge(&other.run_time[i])?;
            self.decision_time[i].merge(&other.decision_time[i])?;
        }
        Ok(())
    }

    pub fn get(&self, tag: OutcomeTag) -> u64 {
        self.counts[tag.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn positives(&self) -> u64 {
        self.get(OutcomeTag::TP) + self.get(OutcomeTag::FP)
    }

    pub fn negatives(&self) -> u64 {
        self.get(OutcomeTag::TN) + self.get(OutcomeTag::FN)
    }

    /// Tag name to count, for persisted `perf` tables.
    pub fn counts_by_tag(&self) -> BTreeMap<String, u64> {
        OutcomeTag::ALL
            .iter()
            .map(|tag| (tag.as_str().to_string(), self.get(*tag)))
            .collect()
    }

    /// `P_X = X / total`.
    pub fn probability(&self, tag: OutcomeTag) -> MetricValue {
        MetricValue::ratio(self.get(tag) as f64, self.total() as f64)
    }

    pub fn confusion_rates(&self) -> ConfusionRates {
        let tp = self.get(OutcomeTag::TP) as f64;
        let fn_ = self.get(OutcomeTag::FN) as f64;
        let tn = self.get(OutcomeTag::TN) as f64;
        let fp = self.get(OutcomeTag::FP) as f64;
        let nc = (self.get(OutcomeTag::NCS) + self.get(OutcomeTag::NCF)) as f64;
        ConfusionRates {
            tp: MetricValue::ratio(tp, tp + fn_),
            fn_: MetricValue::ratio(fn_, tp + fn_),
            tn: MetricValue::ratio(tn, tn + fp),
            fp: MetricValue::ratio(fp, tn + fp),
            nc: MetricValue::ratio(nc, self.total() as f64),
        }
    }

    /// Mean full-episode time of draws whose truth is `truth`.
    pub fn mean_time_by_truth(&self, truth: TaskOutcome) -> MetricValue {
        let sums: Vec<TimeSum> = OutcomeTag::ALL
            .iter()
            .filter(|tag| truth_of(**tag) == truth)
            .map(|tag| self.run_time[tag.index()])
            .collect();
        combine(&sums).mean()
    }

    pub fn mean_time_to_positive(&self) -> MetricValue {
        combine(&[
            self.decision_time[OutcomeTag::TP.index()],
            self.decision_time[OutcomeTag::FP.index()],
        ])
        .mean()
    }

    pub fn mean_time_to_negative(&self) -> MetricValue {
        combine(&[
            self.decision_time[OutcomeTag::TN.index()],
            self.decision_time[OutcomeTag::FN.index()],
        ])
        .mean()
    }

    /// Mean full-episode time of one tag.
    pub fn mean_run_time(&self, tag: OutcomeTag) -> MetricValue {
        self.run_time[tag.index()].mean()
    }

    /// Mean decision time of one classified tag.
    pub fn mean_decision_time(&self, tag: OutcomeTag) -> MetricValue {
        self.decision_time[tag.index()].mean()
    }

    /// Aggregate metrics with EMS from the monitored equations.
    ///
    /// EMS is not applicable when the run produced no positive or no negative
    /// classification, or when any mean it needs is undefined.
    pub fn metrics(&self) -> MakespanMetrics {
        let mut metrics = MakespanMetrics {
            mts: self.mean_time_by_truth(TaskOutcome::Success),
            mtf: self.mean_time_by_truth(TaskOutcome::Failure),
            mtp: self.mean_time_to_positive(),
            mtn: self.mean_time_to_negative(),
            ems: MetricValue::NotApplicable,
            p_tp: self.probability(OutcomeTag::TP),
            p_fn: self.probability(OutcomeTag::FN),
            p_tn: self.probability(OutcomeTag::TN),
            p_fp: self.probability(OutcomeTag::FP),
            p_ncs: self.probability(OutcomeTag::NCS),
            p_ncf: self.probability(OutcomeTag::NCF),
        };
        if self.positives() > 0 && self.negatives() > 0 {
            metrics.ems = expected_makespan(&metrics);
        }
        metrics
    }
}

fn expected_makespan(metrics: &MakespanMetrics) -> MetricValue {
    let inputs = MeanTimes::from_metrics(metrics)
        .and_then(|times| OutcomeProbabilities::from_metrics(metrics).map(|probs| (times, probs)));
    match inputs {
        Ok((times, probs)) => select_monitored_makespan(&times, &probs),
        Err(_) => MetricValue::NotApplicable,
    }
}

#[cfg(test)]
mod tests {
    use super::PerformanceAccumulator;
    use mks_core::{DecisionOutcome, EpisodeResult, MetricValue, OutcomeTag, TaskOutcome};

    fn assert_close(actual: MetricValue, expected: f64) {
        let value = actual.try_value("test metric").expect("metric should be defined");
        assert!(
            (value - expected).abs() < 1e-12,
            "expected {expected}, got {value}"
        );
    }

    fn result(truth: TaskOutcome, outcome: DecisionOutcome, run: f64, stop: f64) -> EpisodeResult {
        EpisodeResult::timed(truth, outcome, run, stop)
    }

    #[test]
    fn empty_accumulator_reports_only_sentinels() {
        let acc = PerformanceAccumulator::new();
        let rates = acc.confusion_rates();
        assert_eq!(rates.tp, MetricValue::NotApplicable);
        assert_eq!(rates.nc, MetricValue::NotApplicable);
        assert_eq!(acc.probability(OutcomeTag::TP), MetricValue::NotApplicable);
        let metrics = acc.metrics();
        assert_eq!(metrics.mts, MetricValue::NotApplicable);
        assert_eq!(metrics.ems, MetricValue::NotApplicable);
    }

    #[test]
    fn count_does_not_deduplicate() {
        let mut acc = PerformanceAccumulator::new();
        for _ in 0..3 {
            acc.count(OutcomeTag::NCF).expect("no overflow");
        }
        assert_eq!(acc.get(OutcomeTag::NCF), 3);
        assert_eq!(acc.total(), 3);
        assert_eq!(acc.counts_by_tag()["NCF"], 3);
    }

    #[test]
    fn confusion_rates_use_truth_conditioned_denominators() {
        let mut acc = PerformanceAccumulator::new();
        for (tag, n) in [
            (OutcomeTag::TP, 6),
            (OutcomeTag::FN, 2),
            (OutcomeTag::TN, 3),
            (OutcomeTag::FP, 1),
            (OutcomeTag::NCS, 4),
            (OutcomeTag::NCF, 4),
        ] {
            for _ in 0..n {
                acc.count(tag).expect("no overflow");
            }
        }
        let rates = acc.confusion_rates();
        assert_close(rates.tp, 0.75);
        assert_close(rates.fn_, 0.25);
        assert_close(rates.tn, 0.75);
        assert_close(rates.fp, 0.25);
        assert_close(rates.nc, 0.4);
        assert_close(acc.probability(OutcomeTag::TP), 0.3);
    }

    #[test]
    fn zero_negative_truth_leaves_tn_rate_undefined() {
        let mut acc = PerformanceAccumulator::new();
        acc.count(OutcomeTag::TP).expect("no overflow");
        let rates = acc.confusion_rates();
        assert_close(rates.tp, 1.0);
        assert_eq!(rates.tn, MetricValue::NotApplicable);
        assert_eq!(rates.fp, MetricValue::NotApplicable);
    }

    #[test]
    fn record_tracks_truth_and_decision_means() {
        let mut acc = PerformanceAccumulator::new();
        let s = TaskOutcome::Success;
        let f = TaskOutcome::Failure;
        acc.record(&result(s, DecisionOutcome::TP, 10.0, 4.0)).expect("valid");
        acc.record(&result(s, DecisionOutcome::FN, 14.0, 6.0)).expect("valid");
        acc.record(&result(f, DecisionOutcome::TN, 8.0, 2.0)).expect("valid");
        acc.record(&result(f, DecisionOutcome::NC, 12.0, f64::NAN)).expect("valid");

        let metrics = acc.metrics();
        assert_close(metrics.mts, 12.0);
        assert_close(metrics.mtf, 10.0);
        assert_close(metrics.mtp, 4.0);
        assert_close(metrics.mtn, 4.0);
        assert_close(metrics.p_ncf, 0.25);
        assert_close(acc.mean_run_time(OutcomeTag::NCF), 12.0);
        assert!(metrics.ems.is_defined());
    }

    #[test]
    fn ems_requires_both_polarities() {
        let mut acc = PerformanceAccumulator::new();
        acc.record(&result(TaskOutcome::Success, DecisionOutcome::TP, 10.0, 4.0))
            .expect("valid");
        acc.record(&result(TaskOutcome::Failure, DecisionOutcome::NC, 10.0, f64::NAN))
            .expect("valid");
        assert_eq!(acc.metrics().ems, MetricValue::NotApplicable);
    }

    #[test]
    fn record_rejects_missing_decision_time() {
        let mut acc = PerformanceAccumulator::new();
        let mut bad = EpisodeResult::new(TaskOutcome::Success, DecisionOutcome::TP);
        bad.run_time_s = 3.0;
        let err = acc.record(&bad).expect_err("NaN decision time must fail");
        assert_eq!(err.code(), "invalid_input");
        assert_eq!(acc.total(), 0);
    }

    #[test]
    fn merge_adds_counts_and_times() {
        let mut a = PerformanceAccumulator::new();
        let mut b = PerformanceAccumulator::new();
        a.record(&result(TaskOutcome::Success, DecisionOutcome::TP, 10.0, 1.0))
            .expect("valid");
        b.record(&result(TaskOutcome::Success, DecisionOutcome::TP, 20.0, 3.0))
            .expect("valid");
        a.merge(&b).expect("no overflow");
        assert_eq!(a.get(OutcomeTag::TP), 2);
        assert_close(a.mean_run_time(OutcomeTag::TP), 15.0);
        assert_close(a.mean_decision_time(OutcomeTag::TP), 2.0);
    }

    #[test]
    fn combined_sample_count_saturates_instead_of_wrapping() {
        use super::{TimeSum, combine};
        let full = TimeSum {
            total_s: 4.0,
            n: u64::MAX,
        };
        let one = TimeSum { total_s: 1.0, n: 1 };
        let combined = combine(&[full, one]);
        assert_eq!(combined.n, u64::MAX);
        assert_eq!(combined.total_s, 5.0);
    }
}
