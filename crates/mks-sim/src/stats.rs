// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use mks_core::MetricValue;

/// Per-trial makespans of one Monte-Carlo run with their summary statistics.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct MakespanDistribution {
    pub makespans: Vec<f64>,
    pub mean: MetricValue,
    /// Population standard deviation.
    pub std: MetricValue,
}

impl MakespanDistribution {
    pub fn from_samples(makespans: Vec<f64>) -> Self {
        let (mean, std) = mean_and_std(&makespans);
        Self {
            makespans,
            mean,
            std,
        }
    }

    pub fn len(&self) -> usize {
        self.makespans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.makespans.is_empty()
    }
}

/// Mean and population standard deviation; both undefined for no samples.
pub fn mean_and_std(values: &[f64]) -> (MetricValue, MetricValue) {
    if values.is_empty() {
        return (MetricValue::NotApplicable, MetricValue::NotApplicable);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|v| {
            let centered = v - mean;
            centered * centered
        })
        .sum::<f64>()
        / n;
    (MetricValue::from_f64(mean), MetricValue::from_f64(variance.sqrt()))
}
