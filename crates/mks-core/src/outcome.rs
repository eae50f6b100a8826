// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::TaskOutcome;
use std::fmt;

/// Result of scanning one episode's window decisions against ground truth.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DecisionOutcome {
    TP,
    FP,
    TN,
    FN,
    NC,
}

impl DecisionOutcome {
    pub const ALL: [Self; 5] = [Self::TP, Self::FP, Self::TN, Self::FN, Self::NC];

    /// Builds a classified outcome from correctness and polarity.
    pub fn classified(correct: bool, positive: bool) -> Self {
        match (correct, positive) {
            (true, true) => Self::TP,
            (false, true) => Self::FP,
            (true, false) => Self::TN,
            (false, false) => Self::FN,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TP => "TP",
            Self::FP => "FP",
            Self::TN => "TN",
            Self::FN => "FN",
            Self::NC => "NC",
        }
    }

    pub fn is_positive(self) -> bool {
        matches!(self, Self::TP | Self::FP)
    }

    pub fn is_negative(self) -> bool {
        matches!(self, Self::TN | Self::FN)
    }

    pub fn is_classified(self) -> bool {
        !matches!(self, Self::NC)
    }

    /// Tally tag; NC is split by ground truth.
    pub fn tag(self, truth: TaskOutcome) -> OutcomeTag {
        match self {
            Self::TP => OutcomeTag::TP,
            Self::FP => OutcomeTag::FP,
            Self::TN => OutcomeTag::TN,
            Self::FN => OutcomeTag::FN,
            Self::NC => match truth {
                TaskOutcome::Success => OutcomeTag::NCS,
                TaskOutcome::Failure => OutcomeTag::NCF,
            },
        }
    }
}

impl fmt::Display for DecisionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulator key: classified outcomes plus truth-split no-classification.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutcomeTag {
    TP,
    FP,
    TN,
    FN,
    NCS,
    NCF,
}

impl OutcomeTag {
    pub const ALL: [Self; 6] = [
        Self::TP,
        Self::FP,
        Self::TN,
        Self::FN,
        Self::NCS,
        Self::NCF,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::TP => 0,
            Self::FP => 1,
            Self::TN => 2,
            Self::FN => 3,
            Self::NCS => 4,
            Self::NCF => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TP => "TP",
            Self::FP => "FP",
            Self::TN => "TN",
            Self::FN => "FN",
            Self::NCS => "NCS",
            Self::NCF => "NCF",
        }
    }

    pub fn decision(self) -> DecisionOutcome {
        match self {
            Self::TP => DecisionOutcome::TP,
            Self::FP => DecisionOutcome::FP,
            Self::TN => DecisionOutcome::TN,
            Self::FN => DecisionOutcome::FN,
            Self::NCS | Self::NCF => DecisionOutcome::NC,
        }
    }
}

impl fmt::Display for OutcomeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing record for one episode under one decision protocol.
///
/// Fields that do not apply to the outcome stay NaN.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpisodeResult {
    pub truth: TaskOutcome,
    pub outcome: DecisionOutcome,
    pub run_time_s: f64,
    pub time_to_positive_s: f64,
    pub time_to_negative_s: f64,
    pub time_to_success_s: f64,
    pub time_to_failure_s: f64,
}

impl EpisodeResult {
    pub fn new(truth: TaskOutcome, outcome: DecisionOutcome) -> Self {
        Self {
            truth,
            outcome,
            run_time_s: f64::NAN,
            time_to_positive_s: f64::NAN,
            time_to_negative_s: f64::NAN,
            time_to_success_s: f64::NAN,
            time_to_failure_s: f64::NAN,
        }
    }

    /// Fills every applicable field from the full run time and the decision time.
    pub fn timed(
        truth: TaskOutcome,
        outcome: DecisionOutcome,
        run_time_s: f64,
        decision_time_s: f64,
    ) -> Self {
        let mut result = Self::new(truth, outcome);
        result.run_time_s = run_time_s;
        if outcome.is_positive() {
            result.time_to_positive_s = decision_time_s;
        } else if outcome.is_negative() {
            result.time_to_negative_s = decision_time_s;
        }
        match truth {
            TaskOutcome::Success => result.time_to_success_s = run_time_s,
            TaskOutcome::Failure => result.time_to_failure_s = run_time_s,
        }
        result
    }

    pub fn tag(&self) -> OutcomeTag {
        self.outcome.tag(self.truth)
    }
}
