// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::accumulator::PerformanceAccumulator;
use crate::metrics::MakespanMetrics;
use mks_core::{MetricValue, MksError, OutcomeTag};

/// Mean outcome times consumed by the monitored equations.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeanTimes {
    pub mts: f64,
    pub mtf: f64,
    pub mtn: f64,
}

impl MeanTimes {
    pub fn from_metrics(metrics: &MakespanMetrics) -> Result<Self, MksError> {
        Ok(Self {
            mts: metrics.mts.try_value("MTS")?,
            mtf: metrics.mtf.try_value("MTF")?,
            mtn: metrics.mtn.try_value("MTN")?,
        })
    }
}

/// Per-draw outcome probabilities; they sum to 1 for a complete tally.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OutcomeProbabilities {
    pub p_tp: f64,
    pub p_fn: f64,
    pub p_tn: f64,
    pub p_fp: f64,
    pub p_ncs: f64,
    pub p_ncf: f64,
}

impl OutcomeProbabilities {
    pub fn from_metrics(metrics: &MakespanMetrics) -> Result<Self, MksError> {
        Ok(Self {
            p_tp: metrics.p_tp.try_value("P_TP")?,
            p_fn: metrics.p_fn.try_value("P_FN")?,
            p_tn: metrics.p_tn.try_value("P_TN")?,
            p_fp: metrics.p_fp.try_value("P_FP")?,
            p_ncs: metrics.p_ncs.try_value("P_NCS")?,
            p_ncf: metrics.p_ncf.try_value("P_NCF")?,
        })
    }

    pub fn get(&self, tag: OutcomeTag) -> f64 {
        match tag {
            OutcomeTag::TP => self.p_tp,
            OutcomeTag::FN => self.p_fn,
            OutcomeTag::TN => self.p_tn,
            OutcomeTag::FP => self.p_fp,
            OutcomeTag::NCS => self.p_ncs,
            OutcomeTag::NCF => self.p_ncf,
        }
    }
}

/// Which monitored formula [`select_monitored_makespan`] applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitoredBranch {
    Standard,
    Alternative,
}

impl MonitoredBranch {
    /// Alternative when a negative call costs at least as much as a failed run.
    pub fn for_times(times: &MeanTimes) -> Self {
        if times.mtn >= times.mtf {
            Self::Alternative
        } else {
            Self::Standard
        }
    }
}

fn guarded_quotient(numerator: f64, denominator: f64) -> MetricValue {
    if !denominator.is_finite() || denominator <= 0.0 {
        return MetricValue::NotApplicable;
    }
    MetricValue::from_f64(numerator / denominator)
}

/// Expected makespan with no online monitor: every attempt runs to completion.
pub fn reactive_makespan(mts: f64, mtf: f64, p_success: f64, p_failure: f64) -> MetricValue {
    if 1.0 - p_failure <= 0.0 {
        return MetricValue::NotApplicable;
    }
    MetricValue::from_f64(-(mtf * p_failure + mts * p_success + 1.0) / (p_failure - 1.0))
}

/// Expected makespan when negative calls abort the attempt early.
pub fn monitored_makespan(times: &MeanTimes, p: &OutcomeProbabilities) -> MetricValue {
    let numerator = 1.0
        + times.mtf * (p.p_fp + p.p_ncf)
        + times.mts * (p.p_ncs + p.p_tp)
        + times.mtn * (p.p_fn + p.p_tn);
    let denominator = 1.0 - p.p_fn - p.p_fp - p.p_tn - p.p_ncf;
    guarded_quotient(numerator, denominator)
}

/// Variant used when negative calls are no cheaper than failed runs.
pub fn monitored_makespan_alternative(times: &MeanTimes, p: &OutcomeProbabilities) -> MetricValue {
    let numerator = 1.0
        + times.mtf * (p.p_fp + p.p_ncf)
        + times.mts * (p.p_ncs + p.p_tp)
        + times.mtf * (p.p_fn + p.p_tn);
    let denominator = 1.0 - p.p_fn - p.p_fp - p.p_tn;
    guarded_quotient(numerator, denominator)
}

pub fn select_monitored_makespan(times: &MeanTimes, p: &OutcomeProbabilities) -> MetricValue {
    match MonitoredBranch::for_times(times) {
        MonitoredBranch::Standard => monitored_makespan(times, p),
        MonitoredBranch::Alternative => monitored_makespan_alternative(times, p),
    }
}

/// One outcome class of a renewal-reward process.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenewalClass {
    pub probability: f64,
    pub mean_cost: f64,
    /// The task ends after this outcome.
    pub absorbing: bool,
}

/// `E = sum(p_i * c_i) / sum(p_i over absorbing classes)`.
pub fn renewal_reward_makespan(classes: &[RenewalClass]) -> MetricValue {
    let mut cost = 0.0;
    let mut absorbing = 0.0;
    for class in classes {
        if class.probability == 0.0 {
            continue;
        }
        cost += class.probability * class.mean_cost;
        if class.absorbing {
            absorbing += class.probability;
        }
    }
    guarded_quotient(cost, absorbing)
}

/// The monitored simulation protocol as a renewal-reward model, with mean
/// costs taken per outcome tag from `acc`.
///
/// Positive calls and true-success NCs end the task after the full episode;
/// negative calls cost their decision time and NCs on failures cost the full
/// episode before a retry.
pub fn simulator_protocol(acc: &PerformanceAccumulator) -> Result<Vec<RenewalClass>, MksError> {
    let mut classes = Vec::with_capacity(OutcomeTag::ALL.len());
    for tag in OutcomeTag::ALL {
        if acc.get(tag) == 0 {
            continue;
        }
        let probability = acc.probability(tag).try_value(tag.as_str())?;
        let (mean_cost, absorbing) = match tag {
            OutcomeTag::TP | OutcomeTag::FP | OutcomeTag::NCS => {
                (acc.mean_run_time(tag).try_value(tag.as_str())?, true)
            }
            OutcomeTag::NCF => (acc.mean_run_time(tag).try_value(tag.as_str())?, false),
            OutcomeTag::TN | OutcomeTag::FN => {
                (acc.mean_decision_time(tag).try_value(tag.as_str())?, false)
            }
        };
        classes.push(RenewalClass {
            probability,
            mean_cost,
            absorbing,
        });
    }
    Ok(classes)
}
