// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::accumulator::PerformanceAccumulator;
use crate::metrics::{ConfusionRates, MakespanMetrics};
use mks_core::{MetricValue, MksError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Makespan estimate stored with a record: either the equation alone or the
/// equation next to a simulated distribution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordMakespan {
    Simulated {
        equation_predicted_makespan: MetricValue,
        simulation_makespan: MetricValue,
        simulation_makespan_list: Vec<f64>,
        #[serde(default)]
        simulation_makespan_std: MetricValue,
    },
    Predicted {
        predicted_makespan: MetricValue,
    },
}

impl RecordMakespan {
    /// The analytic estimate, whichever shape the record has.
    pub fn equation(&self) -> MetricValue {
        match self {
            Self::Simulated {
                equation_predicted_makespan,
                ..
            } => *equation_predicted_makespan,
            Self::Predicted { predicted_makespan } => *predicted_makespan,
        }
    }

    pub fn simulated(&self) -> Option<MetricValue> {
        match self {
            Self::Simulated {
                simulation_makespan,
                ..
            } => Some(*simulation_makespan),
            Self::Predicted { .. } => None,
        }
    }
}

/// Persisted result of one (model, confidence) evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub perf: BTreeMap<String, u64>,
    pub conf_mat: ConfusionRates,
    #[serde(alias = "variables")]
    pub metrics: MakespanMetrics,
    #[serde(flatten)]
    pub makespan: RecordMakespan,
}

impl ResultRecord {
    pub fn from_accumulator(acc: &PerformanceAccumulator, makespan: RecordMakespan) -> Self {
        Self {
            perf: acc.counts_by_tag(),
            conf_mat: acc.confusion_rates(),
            metrics: acc.metrics(),
            makespan,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, MksError> {
        serde_json::to_string_pretty(self).map_err(|err| {
            MksError::invalid_input(format!("failed to encode result record: {err}"))
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, MksError> {
        serde_json::from_str(raw)
            .map_err(|err| MksError::invalid_input(format!("failed to parse result record: {err}")))
    }
}

/// Records found and not found by [`ResultStore::load_many`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchReport {
    pub loaded: Vec<(String, ResultRecord)>,
    pub failed: Vec<(String, MksError)>,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}

/// Directory of records laid out as `<root>/confidence_<pct>/<model>.json`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record_path(&self, confidence_percent: u32, model: &str) -> Result<PathBuf, MksError> {
        if confidence_percent > 100 {
            return Err(MksError::invalid_input(format!(
                "confidence percent must be <= 100; got {confidence_percent}"
            )));
        }
        if model.is_empty()
            || model == "."
            || model == ".."
            || model.contains(['/', '\\'])
        {
            return Err(MksError::invalid_input(format!(
                "model name must be a plain file stem; got '{model}'"
            )));
        }
        Ok(self
            .root
            .join(format!("confidence_{confidence_percent}"))
            .join(format!("{model}.json")))
    }

    pub fn save(
        &self,
        confidence_percent: u32,
        model: &str,
        record: &ResultRecord,
    ) -> Result<PathBuf, MksError> {
        let path = self.record_path(confidence_percent, model)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|err| {
                MksError::invalid_input(format!(
                    "failed to create record directory {}: {err}",
                    dir.display()
                ))
            })?;
        }
        fs::write(&path, record.to_json_pretty()?).map_err(|err| {
            MksError::invalid_input(format!("failed to write record {}: {err}", path.display()))
        })?;
        info!(model, confidence_percent, path = %path.display(), "saved result record");
        Ok(path)
    }

    pub fn load(&self, confidence_percent: u32, model: &str) -> Result<ResultRecord, MksError> {
        let path = self.record_path(confidence_percent, model)?;
        let raw = fs::read_to_string(&path).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                MksError::missing_artifact(format!(
                    "no record for model '{model}' at confidence {confidence_percent}% ({})",
                    path.display()
                ))
            } else {
                MksError::invalid_input(format!("failed to read record {}: {err}", path.display()))
            }
        })?;
        ResultRecord::from_json(&raw)
    }

    /// Loads every requested model; failures are collected, not fatal.
    pub fn load_many<S: AsRef<str>>(&self, confidence_percent: u32, models: &[S]) -> BatchReport {
        let mut report = BatchReport::default();
        for model in models {
            let model = model.as_ref();
            match self.load(confidence_percent, model) {
                Ok(record) => report.loaded.push((model.to_string(), record)),
                Err(err) => {
                    warn!(model, error = %err, "skipping model without a usable record");
                    report.failed.push((model.to_string(), err));
                }
            }
        }
        report
    }
}
