// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]
#![allow(dead_code)]

use mks_core::{ClassProbabilities, Episode, FnClassifier, TaskOutcome};

/// Feature channels of generated episodes: `[marker, step, force]`.
pub const CHANNELS: usize = 3;

/// Builds an episode whose marker channel holds `marker`, whose step channel
/// counts timesteps, and whose force channel jumps by 1.0 at `force_step`.
pub fn episode(n: usize, marker: f64, force_step: Option<usize>, outcome: TaskOutcome) -> Episode {
    let mut features = Vec::with_capacity(n * CHANNELS);
    for t in 0..n {
        let force = match force_step {
            Some(at) if t >= at => 1.0,
            _ => 0.0,
        };
        features.extend_from_slice(&[marker, t as f64, force]);
    }
    Episode::new(features, n, CHANNELS, outcome).expect("generated episode should be valid")
}

/// Confident once the window ends at or after step `confident_from`:
/// positive for a positive marker, negative for a negative one, and a
/// coin-flip row for a zero marker.
pub fn marker_classifier(
    confident_from: f64,
) -> FnClassifier<impl FnMut(&[f64]) -> ClassProbabilities> {
    FnClassifier::new(move |w: &[f64]| {
        let last_row = &w[w.len() - CHANNELS..];
        if last_row[1] < confident_from {
            return [0.5, 0.5];
        }
        if last_row[0] > 0.0 {
            [0.95, 0.05]
        } else if last_row[0] < 0.0 {
            [0.05, 0.95]
        } else {
            [0.5, 0.5]
        }
    })
}
