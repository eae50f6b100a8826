// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::MksError;
use std::fmt;

const NOT_APPLICABLE: &str = "N/A";

/// A rate, probability, mean or makespan that may be undefined.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum MetricValue {
    Defined(f64),
    #[default]
    NotApplicable,
}

impl MetricValue {
    /// Wraps a finite number; anything else becomes `NotApplicable`.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Self::Defined(value)
        } else {
            Self::NotApplicable
        }
    }

    /// `numerator / denominator`, undefined for a zero denominator.
    pub fn ratio(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            Self::NotApplicable
        } else {
            Self::from_f64(numerator / denominator)
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Self::Defined(_))
    }

    pub fn as_option(&self) -> Option<f64> {
        match self {
            Self::Defined(v) => Some(*v),
            Self::NotApplicable => None,
        }
    }

    /// Numeric value, or `UndefinedMetric` naming `what`.
    pub fn try_value(&self, what: &str) -> Result<f64, MksError> {
        self.as_option().ok_or_else(|| {
            MksError::undefined_metric(format!("{what} is not applicable for this run"))
        })
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl From<Option<f64>> for MetricValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::NotApplicable, Self::from_f64)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defined(v) => write!(f, "{v}"),
            Self::NotApplicable => f.write_str(NOT_APPLICABLE),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for MetricValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Defined(v) => serializer.serialize_f64(*v),
            Self::NotApplicable => serializer.serialize_str(NOT_APPLICABLE),
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for MetricValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
            Null(()),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(Self::from_f64(v)),
            Raw::Text(text) if text == NOT_APPLICABLE || text.eq_ignore_ascii_case("nan") => {
                Ok(Self::NotApplicable)
            }
            Raw::Text(text) => Err(serde::de::Error::custom(format!(
                "expected a number or \"{NOT_APPLICABLE}\", got \"{text}\""
            ))),
            Raw::Null(()) => Ok(Self::NotApplicable),
        }
    }
}
