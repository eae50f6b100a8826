// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::scanner::{Decision, DecisionScanner};
use mks_core::{
    ClassProbabilities, Classifier, EpisodeView, MksError, ScanConfig, TimingConfig, WindowBatch,
    validate_batch_output,
};

/// Applies a [`Classifier`] to every length-`W` window of an episode, one
/// timestep apart, in temporal order.
#[derive(Debug)]
pub struct SlidingWindowClassifier<C> {
    classifier: C,
    window_width: usize,
    batch_size: usize,
}

impl<C: Classifier> SlidingWindowClassifier<C> {
    pub fn new(classifier: C, window_width: usize, batch_size: usize) -> Result<Self, MksError> {
        if window_width == 0 {
            return Err(MksError::invalid_input(
                "SlidingWindowClassifier window_width must be >= 1; got 0",
            ));
        }
        if batch_size == 0 {
            return Err(MksError::invalid_input(
                "SlidingWindowClassifier batch_size must be >= 1; got 0",
            ));
        }
        Ok(Self {
            classifier,
            window_width,
            batch_size,
        })
    }

    pub fn from_config(
        classifier: C,
        timing: &TimingConfig,
        scan: &ScanConfig,
    ) -> Result<Self, MksError> {
        timing.validate()?;
        scan.validate()?;
        Self::new(classifier, timing.window_width, scan.batch_size)
    }

    pub fn window_width(&self) -> usize {
        self.window_width
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn classifier_mut(&mut self) -> &mut C {
        &mut self.classifier
    }

    pub fn into_inner(self) -> C {
        self.classifier
    }

    /// Probability rows for all `len - W + 1` windows.
    pub fn classify_episode(
        &mut self,
        view: &EpisodeView<'_>,
    ) -> Result<Vec<ClassProbabilities>, MksError> {
        let mut out = Vec::with_capacity(view.window_count(self.window_width));
        self.run_batches(view, |rows| {
            out.extend_from_slice(rows);
            false
        })?;
        Ok(out)
    }

    /// Classifies windows batch by batch, feeding `scanner` until it decides.
    /// Windows after the deciding batch are never sent to the classifier.
    pub fn scan_episode(
        &mut self,
        view: &EpisodeView<'_>,
        scanner: &mut DecisionScanner,
    ) -> Result<Decision, MksError> {
        self.run_batches(view, |rows| {
            scanner.push_all(rows);
            scanner.is_decided()
        })?;
        Ok(scanner.finish())
    }

    /// Drives the classifier over consecutive batches; `on_batch` returns true to stop.
    fn run_batches<F>(&mut self, view: &EpisodeView<'_>, mut on_batch: F) -> Result<usize, MksError>
    where
        F: FnMut(&[ClassProbabilities]) -> bool,
    {
        let total = view.window_count(self.window_width);
        if total == 0 {
            return Err(MksError::invalid_episode(format!(
                "episode of {} timesteps is shorter than one window of {}",
                view.len(),
                self.window_width
            )));
        }

        let mut batch =
            WindowBatch::with_capacity(self.window_width, view.channels(), self.batch_size);
        let mut start = 0;
        while start < total {
            let end = (start + self.batch_size).min(total);
            batch.clear();
            for idx in start..end {
                let window = view.window(idx, self.window_width).ok_or_else(|| {
                    MksError::invalid_input(format!(
                        "window {idx} out of range for episode of {} timesteps",
                        view.len()
                    ))
                })?;
                batch.push(window)?;
            }

            let rows = self.classifier.classify(&batch)?;
            validate_batch_output(&batch, &rows)?;
            if on_batch(&rows) {
                return Ok(end);
            }
            start = end;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::SlidingWindowClassifier;
    use crate::scanner::DecisionScanner;
    use mks_core::{
        ClassProbabilities, Classifier, DecisionOutcome, EpisodeView, FnClassifier, MksError,
        TaskOutcome, WindowBatch,
    };

    /// Records batch sizes; emits the first value of each window.
    struct CountingClassifier {
        batches: Vec<usize>,
    }

    impl Classifier for CountingClassifier {
        fn classify(
            &mut self,
            batch: &WindowBatch<'_>,
        ) -> Result<Vec<ClassProbabilities>, MksError> {
            self.batches.push(batch.len());
            Ok(batch.windows().iter().map(|w| [w[0], 0.0]).collect())
        }
    }

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|t| t as f64).collect()
    }

    #[test]
    fn output_length_is_len_minus_width_plus_one() {
        let values = ramp(10);
        let view = EpisodeView::new(&values, 10, 1).expect("valid view");
        let edges = FnClassifier::new(|w: &[f64]| [w[0], w[w.len() - 1]]);
        let mut sliding = SlidingWindowClassifier::new(edges, 4, 3).expect("valid");
        let out = sliding.classify_episode(&view).expect("classification");
        assert_eq!(out.len(), 7);
        for (i, row) in out.iter().enumerate() {
            assert_eq!(row[0], i as f64);
            assert_eq!(row[1], (i + 3) as f64);
        }
    }

    #[test]
    fn batching_does_not_change_output() {
        let values = ramp(23);
        let view = EpisodeView::new(&values, 23, 1).expect("valid view");
        let mut reference = None;
        for batch_size in [1, 2, 5, 20, 64] {
            let mut sliding = SlidingWindowClassifier::new(
                CountingClassifier { batches: vec![] },
                5,
                batch_size,
            )
            .expect("valid");
            let out = sliding.classify_episode(&view).expect("classification");
            let batches = sliding.into_inner().batches;
            assert_eq!(batches.iter().sum::<usize>(), 19);
            assert!(batches.iter().all(|&b| b <= batch_size));
            match &reference {
                None => reference = Some(out),
                Some(expected) => assert_eq!(&out, expected),
            }
        }
    }

    #[test]
    fn exactly_one_window_when_len_equals_width() {
        let values = ramp(6);
        let view = EpisodeView::new(&values, 3, 2).expect("valid view");
        let mut sliding =
            SlidingWindowClassifier::new(FnClassifier::new(|_: &[f64]| [0.5, 0.5]), 3, 8)
                .expect("valid");
        assert_eq!(sliding.classify_episode(&view).expect("one window").len(), 1);
    }

    #[test]
    fn too_short_episode_is_invalid_episode() {
        let values = ramp(3);
        let view = EpisodeView::new(&values, 3, 1).expect("valid view");
        let mut sliding =
            SlidingWindowClassifier::new(FnClassifier::new(|_: &[f64]| [0.5, 0.5]), 4, 8)
                .expect("valid");
        let err = sliding.classify_episode(&view).expect_err("too short");
        assert!(err.is_episode_local());
    }

    #[test]
    fn wrong_row_count_is_classifier_error() {
        struct Short;
        impl Classifier for Short {
            fn classify(
                &mut self,
                _batch: &WindowBatch<'_>,
            ) -> Result<Vec<ClassProbabilities>, MksError> {
                Ok(vec![[1.0, 0.0]])
            }
        }
        let values = ramp(8);
        let view = EpisodeView::new(&values, 8, 1).expect("valid view");
        let mut sliding = SlidingWindowClassifier::new(Short, 2, 4).expect("valid");
        let err = sliding.classify_episode(&view).expect_err("short reply");
        assert_eq!(err.code(), "classifier");
    }

    #[test]
    fn scan_stops_requesting_batches_after_decision() {
        let values = ramp(100);
        let view = EpisodeView::new(&values, 100, 1).expect("valid view");
        let mut sliding =
            SlidingWindowClassifier::new(CountingClassifier { batches: vec![] }, 10, 8)
                .expect("valid");
        // Window i yields [i, 0]; window 1 already reaches 1.0.
        let mut scanner = DecisionScanner::new(TaskOutcome::Success, 1.0).expect("valid");
        let decision = sliding.scan_episode(&view, &mut scanner).expect("scan");
        assert_eq!(decision.outcome, DecisionOutcome::TP);
        assert_eq!(decision.index, 1);
        assert_eq!(sliding.into_inner().batches, vec![8]);
    }

    #[test]
    fn rejects_zero_width_and_batch() {
        let classifier = || FnClassifier::new(|_: &[f64]| [0.5, 0.5]);
        assert!(SlidingWindowClassifier::new(classifier(), 0, 1).is_err());
        assert!(SlidingWindowClassifier::new(classifier(), 1, 0).is_err());
    }
}
