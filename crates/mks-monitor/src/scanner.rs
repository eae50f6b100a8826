// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use mks_core::{ClassProbabilities, DecisionOutcome, MksError, TaskOutcome, validate_threshold};

/// First confident decision for one episode, or NC.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub outcome: DecisionOutcome,
    /// Zero-based triggering window; the total window count for NC.
    pub index: usize,
}

impl Decision {
    pub fn no_classification(window_count: usize) -> Self {
        Self {
            outcome: DecisionOutcome::NC,
            index: window_count,
        }
    }

    pub fn is_classified(&self) -> bool {
        self.outcome.is_classified()
    }
}

/// Classifies one row that already crossed the threshold.
fn classify_row(row: ClassProbabilities, truth: [f64; 2], threshold: f64) -> DecisionOutcome {
    let agreement = row[0] * truth[0] + row[1] * truth[1];
    DecisionOutcome::classified(agreement >= threshold, row[0] > row[1])
}

fn crosses(row: ClassProbabilities, threshold: f64) -> bool {
    let confidence = row[0].max(row[1]);
    // All-zero rows carry no decision even at threshold 0.
    confidence > 0.0 && confidence >= threshold
}

/// Incremental first-crossing scanner fed one window row at a time.
#[derive(Clone, Debug)]
pub struct DecisionScanner {
    truth: [f64; 2],
    threshold: f64,
    seen: usize,
    decision: Option<Decision>,
}

impl DecisionScanner {
    pub fn new(truth: TaskOutcome, threshold: f64) -> Result<Self, MksError> {
        validate_threshold(threshold)?;
        Ok(Self {
            truth: truth.one_hot(),
            threshold,
            seen: 0,
            decision: None,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn rows_seen(&self) -> usize {
        self.seen
    }

    pub fn is_decided(&self) -> bool {
        self.decision.is_some()
    }

    /// Feeds the next window row. Returns the decision once one is reached;
    /// rows after that are ignored.
    pub fn push(&mut self, row: ClassProbabilities) -> Option<Decision> {
        if self.decision.is_some() {
            return self.decision;
        }
        let index = self.seen;
        self.seen += 1;
        if crosses(row, self.threshold) {
            self.decision = Some(Decision {
                outcome: classify_row(row, self.truth, self.threshold),
                index,
            });
        }
        self.decision
    }

    /// Feeds rows until a decision is reached; returns how many rows were consumed.
    pub fn push_all(&mut self, rows: &[ClassProbabilities]) -> usize {
        for (i, row) in rows.iter().enumerate() {
            if self.push(*row).is_some() {
                return i + 1;
            }
        }
        rows.len()
    }

    pub fn finish(&self) -> Decision {
        self.decision
            .unwrap_or_else(|| Decision::no_classification(self.seen))
    }
}

/// Scans a complete probability sequence for the first window reaching `threshold`.
pub fn scan_for_decision(
    rows: &[ClassProbabilities],
    truth: TaskOutcome,
    threshold: f64,
) -> Result<Decision, MksError> {
    let mut scanner = DecisionScanner::new(truth, threshold)?;
    scanner.push_all(rows);
    Ok(scanner.finish())
}
