// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::equations::{MeanTimes, OutcomeProbabilities, select_monitored_makespan};
use mks_core::{MetricValue, MksError};
use std::fmt;
use std::str::FromStr;

/// Default probability grid: 200 points over `[0, 0.99]`.
pub const DEFAULT_SWEEP_POINTS: usize = 200;
pub const DEFAULT_PROBABILITY_GRID_END: f64 = 0.99;

/// The single equation input varied by a sensitivity sweep.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SweepVariable {
    PTp,
    PTn,
    Mtf,
    Mts,
}

impl SweepVariable {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PTp => "p_tp",
            Self::PTn => "p_tn",
            Self::Mtf => "mtf",
            Self::Mts => "mts",
        }
    }

    pub fn is_probability(self) -> bool {
        matches!(self, Self::PTp | Self::PTn)
    }

    fn apply(self, value: f64, times: &mut MeanTimes, p: &mut OutcomeProbabilities) {
        match self {
            Self::PTp => p.p_tp = value,
            Self::PTn => p.p_tn = value,
            Self::Mtf => times.mtf = value,
            Self::Mts => times.mts = value,
        }
    }

    fn current(self, times: &MeanTimes, p: &OutcomeProbabilities) -> f64 {
        match self {
            Self::PTp => p.p_tp,
            Self::PTn => p.p_tn,
            Self::Mtf => times.mtf,
            Self::Mts => times.mts,
        }
    }

    /// Grid used when the caller gives no range: `[0, 0.99]` for probabilities,
    /// `[0, 2 * current]` for times.
    pub fn default_grid(
        self,
        times: &MeanTimes,
        p: &OutcomeProbabilities,
        points: usize,
    ) -> Vec<f64> {
        let end = if self.is_probability() {
            DEFAULT_PROBABILITY_GRID_END
        } else {
            2.0 * self.current(times, p)
        };
        linspace(0.0, end, points)
    }
}

impl fmt::Display for SweepVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SweepVariable {
    type Err = MksError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "p_tp" => Ok(Self::PTp),
            "p_tn" => Ok(Self::PTn),
            "mtf" => Ok(Self::Mtf),
            "mts" => Ok(Self::Mts),
            other => Err(MksError::invalid_input(format!(
                "unknown sweep variable '{other}'; expected one of p_tp, p_tn, mtf, mts"
            ))),
        }
    }
}

/// One grid point of a sensitivity curve.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepPoint {
    pub value: f64,
    pub monitored: MetricValue,
    pub reactive: MetricValue,
    /// `reactive - monitored`.
    pub time_saved: MetricValue,
}

/// `points` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (points - 1) as f64;
            (0..points)
                .map(|i| {
                    if i == points - 1 {
                        end
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

/// Evaluates the monitored makespan while one input moves over `grid`, all
/// other inputs held at their measured values.
pub fn sensitivity_sweep(
    times: &MeanTimes,
    probabilities: &OutcomeProbabilities,
    variable: SweepVariable,
    grid: &[f64],
    reactive: MetricValue,
) -> Result<Vec<SweepPoint>, MksError> {
    if grid.is_empty() {
        return Err(MksError::invalid_input("sensitivity grid must have >= 1 point"));
    }
    let mut out = Vec::with_capacity(grid.len());
    for (i, &value) in grid.iter().enumerate() {
        if !value.is_finite() {
            return Err(MksError::invalid_input(format!(
                "sensitivity grid values must be finite; grid[{i}]={value}"
            )));
        }
        let mut t = *times;
        let mut p = *probabilities;
        variable.apply(value, &mut t, &mut p);
        let monitored = select_monitored_makespan(&t, &p);
        let time_saved = match (reactive, monitored) {
            (MetricValue::Defined(r), MetricValue::Defined(m)) => MetricValue::from_f64(r - m),
            _ => MetricValue::NotApplicable,
        };
        out.push(SweepPoint {
            value,
            monitored,
            reactive,
            time_saved,
        });
    }
    Ok(out)
}
