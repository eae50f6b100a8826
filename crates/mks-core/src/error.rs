// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use thiserror::Error;

/// Error taxonomy shared by every makespan crate.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MksError {
    /// Configuration, argument or data shape violation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Episode cannot be used for this run (late onset, too short after chopping).
    #[error("invalid episode: {0}")]
    InvalidEpisode(String),
    /// A rate or mean whose denominator count is zero was used as a number.
    #[error("undefined metric: {0}")]
    UndefinedMetric(String),
    /// A classifier, prediction file or result record is absent.
    #[error("missing artifact: {0}")]
    MissingArtifact(String),
    /// The external classifier broke its batch contract.
    #[error("classifier contract violated: {0}")]
    Classifier(String),
    /// Counter overflow or a run that cannot terminate within its draw budget.
    #[error("resource limit: {0}")]
    ResourceLimit(String),
}

impl MksError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn invalid_episode(msg: impl Into<String>) -> Self {
        Self::InvalidEpisode(msg.into())
    }

    pub fn undefined_metric(msg: impl Into<String>) -> Self {
        Self::UndefinedMetric(msg.into())
    }

    pub fn missing_artifact(msg: impl Into<String>) -> Self {
        Self::MissingArtifact(msg.into())
    }

    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    pub fn resource_limit(msg: impl Into<String>) -> Self {
        Self::ResourceLimit(msg.into())
    }

    /// Stable snake_case code used in structured error output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidEpisode(_) => "invalid_episode",
            Self::UndefinedMetric(_) => "undefined_metric",
            Self::MissingArtifact(_) => "missing_artifact",
            Self::Classifier(_) => "classifier",
            Self::ResourceLimit(_) => "resource_limit",
        }
    }

    /// True for errors that exclude one episode but leave the run usable.
    pub fn is_episode_local(&self) -> bool {
        matches!(self, Self::InvalidEpisode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::MksError;

    #[test]
    fn constructors_map_to_matching_variants_and_codes() {
        let cases = [
            (MksError::invalid_input("x"), "invalid_input"),
            (MksError::invalid_episode("x"), "invalid_episode"),
            (MksError::undefined_metric("x"), "undefined_metric"),
            (MksError::missing_artifact("x"), "missing_artifact"),
            (MksError::classifier("x"), "classifier"),
            (MksError::resource_limit("x"), "resource_limit"),
        ];
        for (err, code) in cases {
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn display_includes_message() {
        let err = MksError::undefined_metric("MTN has no negative classifications");
        assert_eq!(
            err.to_string(),
            "undefined metric: MTN has no negative classifications"
        );
    }

    #[test]
    fn only_invalid_episode_is_episode_local() {
        assert!(MksError::invalid_episode("late onset").is_episode_local());
        assert!(!MksError::invalid_input("bad").is_episode_local());
        assert!(!MksError::resource_limit("cap").is_episode_local());
    }
}
