// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Diagnostics schema version for makespan run metadata.
pub const DIAGNOSTICS_SCHEMA_VERSION: u32 = 1;

/// Structured metadata captured from one evaluation or simulation run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct RunDiagnostics {
    pub schema_version: u32,
    pub engine_version: Option<String>,
    pub runtime_ms: Option<u64>,
    pub episodes: usize,
    pub trials: usize,
    /// Draws that reached a decision and were tallied.
    pub draws: u64,
    /// Draws discarded because the episode was invalid for this run.
    pub invalid_draws: u64,
    pub seed: Option<u64>,
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for RunDiagnostics {
    fn default() -> Self {
        Self {
            schema_version: DIAGNOSTICS_SCHEMA_VERSION,
            engine_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            runtime_ms: None,
            episodes: 0,
            trials: 0,
            draws: 0,
            invalid_draws: 0,
            seed: None,
            notes: vec![],
            warnings: vec![],
        }
    }
}

impl RunDiagnostics {
    /// Fraction of draws that were discarded, if any draw happened.
    pub fn invalid_fraction(&self) -> Option<f64> {
        let total = self.draws + self.invalid_draws;
        (total > 0).then(|| self.invalid_draws as f64 / total as f64)
    }
}
