// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::CliError;
use mks_core::{Episode, MakespanConfig};
use mks_eval::ResultRecord;
use mks_sim::EpisodePredictions;
use std::fs;
use std::path::Path;

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path)
        .map_err(|source| CliError::io(format!("failed to read '{}'", path.display()), source))
}

/// Reads a TOML configuration file; missing sections keep their defaults.
pub(crate) fn load_config(path: Option<&Path>) -> Result<MakespanConfig, CliError> {
    let Some(path) = path else {
        return Ok(MakespanConfig::default());
    };
    let raw = read_file(path)?;
    parse_config(raw.as_str())
        .map_err(|err| err.with_context(format!("invalid config '{}'", path.display())))
}

pub(crate) fn parse_config(raw: &str) -> Result<MakespanConfig, CliError> {
    let config: MakespanConfig =
        toml::from_str(raw).map_err(|source| CliError::toml("failed to parse config", source))?;
    config.validate()?;
    Ok(config)
}

/// Loads one episode from a CSV file with rows `time, channel..., label`.
pub(crate) fn load_episode(path: &Path) -> Result<Episode, CliError> {
    let raw = read_file(path)?;
    parse_episode_csv(raw.as_str())
        .map_err(|err| err.with_context(format!("invalid episode '{}'", path.display())))
}

pub(crate) fn parse_episode_csv(raw: &str) -> Result<Episode, CliError> {
    let rows = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();
    if rows.is_empty() {
        return Err(CliError::invalid_input("CSV input is empty"));
    }

    let body = if rows.len() > 1 && !row_is_numeric(rows[0]) {
        &rows[1..]
    } else {
        &rows[..]
    };

    let mut values = Vec::new();
    let mut cols: Option<usize> = None;
    for (row_idx, row) in body.iter().enumerate() {
        let cells = row.split(',').map(str::trim).collect::<Vec<_>>();
        match cols {
            Some(expected) if cells.len() != expected => {
                return Err(CliError::invalid_input(format!(
                    "CSV row {} has {} columns but expected {expected}",
                    row_idx + 1,
                    cells.len()
                )));
            }
            Some(_) => {}
            None => cols = Some(cells.len()),
        }
        for (col_idx, cell) in cells.iter().enumerate() {
            let value = cell.parse::<f64>().map_err(|_| {
                CliError::invalid_input(format!(
                    "CSV row {} column {} is not a number: '{cell}'",
                    row_idx + 1,
                    col_idx + 1
                ))
            })?;
            values.push(value);
        }
    }

    let cols = cols.unwrap_or(0);
    Ok(Episode::from_raw(&values, body.len(), cols)?)
}

fn row_is_numeric(row: &str) -> bool {
    row.split(',').all(|cell| cell.trim().parse::<f64>().is_ok())
}

/// Saved per-window predictions: a JSON array of `{truth, probabilities}`.
pub(crate) fn load_predictions(path: &Path) -> Result<Vec<EpisodePredictions>, CliError> {
    let raw = read_file(path)?;
    serde_json::from_str(raw.as_str()).map_err(|source| {
        CliError::json(format!("invalid predictions JSON in '{}'", path.display()), source)
    })
}

pub(crate) fn load_record(path: &Path) -> Result<ResultRecord, CliError> {
    let raw = read_file(path)?;
    Ok(ResultRecord::from_json(raw.as_str())?)
}
