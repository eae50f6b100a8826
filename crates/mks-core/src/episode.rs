// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::{MksError, TimingConfig};

/// Ground-truth outcome of one recorded episode.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskOutcome {
    Success,
    Failure,
}

impl TaskOutcome {
    /// Maps the raw label column (`1` success, `0` failure).
    pub fn from_label(label: f64) -> Result<Self, MksError> {
        if label == 1.0 {
            Ok(Self::Success)
        } else if label == 0.0 {
            Ok(Self::Failure)
        } else {
            Err(MksError::invalid_input(format!(
                "episode label must be 0 (failure) or 1 (success); got {label}"
            )))
        }
    }

    pub fn label(self) -> f64 {
        match self {
            Self::Success => 1.0,
            Self::Failure => 0.0,
        }
    }

    /// One-hot truth vector in class order `[success, failure]`.
    pub fn one_hot(self) -> [f64; 2] {
        match self {
            Self::Success => [1.0, 0.0],
            Self::Failure => [0.0, 1.0],
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Owned episode: row-major feature channels plus a constant ground-truth label.
///
/// Time and label columns of the raw matrix are not kept in `features`, so every
/// window of consecutive timesteps is one contiguous slice.
#[derive(Clone, Debug, PartialEq)]
pub struct Episode {
    features: Vec<f64>,
    n: usize,
    d: usize,
    outcome: TaskOutcome,
}

impl Episode {
    /// Builds an episode from already separated feature rows.
    pub fn new(
        features: Vec<f64>,
        n: usize,
        d: usize,
        outcome: TaskOutcome,
    ) -> Result<Self, MksError> {
        if n == 0 {
            return Err(MksError::invalid_input("episode must have >= 1 timestep"));
        }
        if d == 0 {
            return Err(MksError::invalid_input("episode must have >= 1 feature channel"));
        }
        let expected = n
            .checked_mul(d)
            .ok_or_else(|| MksError::invalid_input("n*d overflow while validating episode shape"))?;
        if features.len() != expected {
            return Err(MksError::invalid_input(format!(
                "episode feature length mismatch: got {}, expected {expected} (n={n}, d={d})",
                features.len()
            )));
        }
        Ok(Self {
            features,
            n,
            d,
            outcome,
        })
    }

    /// Builds an episode from a raw row-major matrix whose rows are
    /// `[time, channel_1..channel_k, label]`.
    pub fn from_raw(values: &[f64], n: usize, cols: usize) -> Result<Self, MksError> {
        if cols < 3 {
            return Err(MksError::invalid_input(format!(
                "raw episode rows need time, >= 1 channel and label columns; got {cols} columns"
            )));
        }
        let expected = n
            .checked_mul(cols)
            .ok_or_else(|| MksError::invalid_input("n*cols overflow while reading raw episode"))?;
        if values.len() != expected || n == 0 {
            return Err(MksError::invalid_input(format!(
                "raw episode length mismatch: got {}, expected {expected} (n={n}, cols={cols})",
                values.len()
            )));
        }

        let d = cols - 2;
        let first_label = values[cols - 1];
        let outcome = TaskOutcome::from_label(first_label)?;
        let mut features = Vec::with_capacity(n * d);
        for (t, row) in values.chunks_exact(cols).enumerate() {
            let label = row[cols - 1];
            if label != first_label {
                return Err(MksError::invalid_input(format!(
                    "episode label must be constant; row 0 has {first_label}, row {t} has {label}"
                )));
            }
            features.extend_from_slice(&row[1..cols - 1]);
        }

        Self::new(features, n, d, outcome)
    }

    /// Row-oriented convenience wrapper over [`Episode::from_raw`].
    pub fn from_raw_rows(rows: &[Vec<f64>]) -> Result<Self, MksError> {
        let cols = rows
            .first()
            .map(Vec::len)
            .ok_or_else(|| MksError::invalid_input("raw episode has no rows"))?;
        let mut values = Vec::with_capacity(rows.len() * cols);
        for (t, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(MksError::invalid_input(format!(
                    "raw episode row {t} has {} columns but expected {cols}",
                    row.len()
                )));
            }
            values.extend_from_slice(row);
        }
        Self::from_raw(&values, rows.len(), cols)
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn channels(&self) -> usize {
        self.d
    }

    pub fn outcome(&self) -> TaskOutcome {
        self.outcome
    }

    pub fn features(&self) -> &[f64] {
        &self.features
    }

    pub fn view(&self) -> EpisodeView<'_> {
        EpisodeView {
            values: &self.features,
            n: self.n,
            d: self.d,
            offset: 0,
        }
    }
}

/// Borrowed, possibly front-truncated view over an episode's feature rows.
#[derive(Clone, Copy, Debug)]
pub struct EpisodeView<'a> {
    values: &'a [f64],
    n: usize,
    d: usize,
    offset: usize,
}

impl<'a> EpisodeView<'a> {
    pub fn new(values: &'a [f64], n: usize, d: usize) -> Result<Self, MksError> {
        if d == 0 {
            return Err(MksError::invalid_input("episode view needs >= 1 channel"));
        }
        if n.checked_mul(d) != Some(values.len()) {
            return Err(MksError::invalid_input(format!(
                "episode view length mismatch: got {}, expected n*d with n={n}, d={d}",
                values.len()
            )));
        }
        Ok(Self {
            values,
            n,
            d,
            offset: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn channels(&self) -> usize {
        self.d
    }

    /// Number of leading timesteps dropped from the owning episode.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn row(&self, t: usize) -> Option<&'a [f64]> {
        if t >= self.n {
            return None;
        }
        Some(&self.values[t * self.d..(t + 1) * self.d])
    }

    /// Contiguous `width x channels` slice starting at timestep `start`.
    pub fn window(&self, start: usize, width: usize) -> Option<&'a [f64]> {
        let end = start.checked_add(width)?;
        if width == 0 || end > self.n {
            return None;
        }
        Some(&self.values[start * self.d..end * self.d])
    }

    /// Values of one channel in time order.
    pub fn channel(&self, j: usize) -> impl Iterator<Item = f64> + 'a {
        let d = self.d;
        let values = self.values;
        let take = if j < d { self.n } else { 0 };
        (0..take).map(move |t| values[t * d + j])
    }

    /// Number of full windows of `width` that fit: `len - width + 1`, or 0.
    pub fn window_count(&self, width: usize) -> usize {
        if width == 0 || width > self.n {
            0
        } else {
            self.n - width + 1
        }
    }

    /// Drops the first `offset` timesteps.
    pub fn truncate_front(&self, offset: usize) -> Result<Self, MksError> {
        if offset > self.n {
            return Err(MksError::invalid_input(format!(
                "cannot truncate {offset} timesteps from an episode of length {}",
                self.n
            )));
        }
        Ok(Self {
            values: &self.values[offset * self.d..],
            n: self.n - offset,
            d: self.d,
            offset: self.offset + offset,
        })
    }
}

/// Ground truth plus timing reference extracted from one episode.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabeledEpisode {
    pub outcome: TaskOutcome,
    pub samples: usize,
    pub duration_s: f64,
}

impl LabeledEpisode {
    pub fn truth(&self) -> [f64; 2] {
        self.outcome.one_hot()
    }
}

/// Extracts outcome and elapsed time of episodes under a fixed sampling period.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpisodeLabeler {
    timing: TimingConfig,
}

impl EpisodeLabeler {
    pub fn new(timing: TimingConfig) -> Result<Self, MksError> {
        timing.validate()?;
        Ok(Self { timing })
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn label(&self, episode: &Episode) -> LabeledEpisode {
        LabeledEpisode {
            outcome: episode.outcome(),
            samples: episode.len(),
            duration_s: self.timing.samples_to_seconds(episode.len()),
        }
    }
}
