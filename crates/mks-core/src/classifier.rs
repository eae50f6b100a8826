// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::MksError;

/// Class-probability pair `[p_success, p_failure]`.
pub type ClassProbabilities = [f64; 2];

/// Batch of equally shaped windows, each `width x channels` row-major.
#[derive(Clone, Debug)]
pub struct WindowBatch<'a> {
    windows: Vec<&'a [f64]>,
    width: usize,
    channels: usize,
}

impl<'a> WindowBatch<'a> {
    pub fn new(width: usize, channels: usize) -> Self {
        Self {
            windows: Vec::new(),
            width,
            channels,
        }
    }

    pub fn with_capacity(width: usize, channels: usize, capacity: usize) -> Self {
        Self {
            windows: Vec::with_capacity(capacity),
            width,
            channels,
        }
    }

    pub fn push(&mut self, window: &'a [f64]) -> Result<(), MksError> {
        let expected = self.width * self.channels;
        if window.len() != expected {
            return Err(MksError::invalid_input(format!(
                "window length mismatch: got {}, expected {expected} (width={}, channels={})",
                window.len(),
                self.width,
                self.channels
            )));
        }
        self.windows.push(window);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.windows.clear();
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn windows(&self) -> &[&'a [f64]] {
        &self.windows
    }
}

/// Trained binary success/failure model applied to fixed-width windows.
///
/// Implementations must return exactly one finite pair per window, in input order.
pub trait Classifier {
    fn classify(&mut self, batch: &WindowBatch<'_>) -> Result<Vec<ClassProbabilities>, MksError>;
}

impl<C: Classifier + ?Sized> Classifier for &mut C {
    fn classify(&mut self, batch: &WindowBatch<'_>) -> Result<Vec<ClassProbabilities>, MksError> {
        (**self).classify(batch)
    }
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn classify(&mut self, batch: &WindowBatch<'_>) -> Result<Vec<ClassProbabilities>, MksError> {
        (**self).classify(batch)
    }
}

/// Adapts a per-window closure into a [`Classifier`].
pub struct FnClassifier<F> {
    f: F,
}

impl<F> FnClassifier<F>
where
    F: FnMut(&[f64]) -> ClassProbabilities,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Classifier for FnClassifier<F>
where
    F: FnMut(&[f64]) -> ClassProbabilities,
{
    fn classify(&mut self, batch: &WindowBatch<'_>) -> Result<Vec<ClassProbabilities>, MksError> {
        Ok(batch.windows().iter().map(|w| (self.f)(w)).collect())
    }
}

impl<F> std::fmt::Debug for FnClassifier<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnClassifier")
    }
}

/// Checks a classifier reply against the batch it answered.
pub fn validate_batch_output(
    batch: &WindowBatch<'_>,
    output: &[ClassProbabilities],
) -> Result<(), MksError> {
    if output.len() != batch.len() {
        return Err(MksError::classifier(format!(
            "classifier returned {} rows for a batch of {} windows",
            output.len(),
            batch.len()
        )));
    }
    for (i, row) in output.iter().enumerate() {
        if !row[0].is_finite() || !row[1].is_finite() {
            return Err(MksError::classifier(format!(
                "classifier returned non-finite probabilities at batch row {i}: [{}, {}]",
                row[0], row[1]
            )));
        }
    }
    Ok(())
}
