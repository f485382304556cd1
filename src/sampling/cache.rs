//! On-disk reuse of baseline sampling results.
//!
//! Two JSON files are written next to the reduction output: `ignition_output.json`
//! (ignition delays per condition) and `ignition_data.json` (the sampled states as a
//! flat row array, one row per snapshot: `[T, P, Y_1, .., Y_n]`). Cached data is reused
//! only when the row count matches `conditions * 20` and every row carries
//! `2 + n_species` columns for the current species count.

use crate::error::ReductionError;
use crate::sampling::autoignition::{SNAPSHOTS_PER_CONDITION, Snapshot};
use crate::sampling::SampledData;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DATA_FILE: &str = "ignition_data.json";
const METRICS_FILE: &str = "ignition_output.json";

#[derive(Serialize, Deserialize)]
struct DataFile {
    species: Vec<String>,
    rows: Vec<Vec<f64>>,
}

#[derive(Serialize, Deserialize)]
struct MetricsFile {
    ignition_delays: Vec<f64>,
}

/// Try to load previously sampled baseline data. Returns `None` when the cache is
/// absent or fails the shape check.
pub fn load(directory: &Path, n_conditions: usize, n_species: usize) -> Option<SampledData> {
    let data_text = std::fs::read_to_string(directory.join(DATA_FILE)).ok()?;
    let metrics_text = std::fs::read_to_string(directory.join(METRICS_FILE)).ok()?;
    let data: DataFile = serde_json::from_str(&data_text).ok()?;
    let metrics: MetricsFile = serde_json::from_str(&metrics_text).ok()?;

    let expected_rows = n_conditions * SNAPSHOTS_PER_CONDITION;
    let columns = 2 + n_species;
    if data.species.len() != n_species
        || data.rows.len() != expected_rows
        || data.rows.iter().any(|row| row.len() != columns)
        || metrics.ignition_delays.len() != n_conditions
    {
        debug!(
            "Ignoring sample cache in {}: shape mismatch ({} rows, {} species).",
            directory.display(),
            data.rows.len(),
            data.species.len()
        );
        return None;
    }

    let snapshots = data
        .rows
        .chunks(SNAPSHOTS_PER_CONDITION)
        .map(|chunk| {
            chunk
                .iter()
                .map(|row| Snapshot {
                    temperature: row[0],
                    pressure: row[1],
                    mass_fractions: row[2..].to_vec(),
                })
                .collect()
        })
        .collect();
    info!(
        "Reusing cached baseline samples from {} ({} conditions).",
        directory.display(),
        n_conditions
    );
    Some(SampledData {
        ignition_delays: metrics.ignition_delays,
        snapshots,
    })
}

/// Persist baseline sampling results for later reuse.
pub fn store(
    directory: &Path,
    species: &[String],
    data: &SampledData,
) -> Result<(), ReductionError> {
    let rows: Vec<Vec<f64>> = data
        .snapshots
        .iter()
        .flatten()
        .map(|snapshot| {
            let mut row = Vec::with_capacity(2 + snapshot.mass_fractions.len());
            row.push(snapshot.temperature);
            row.push(snapshot.pressure);
            row.extend_from_slice(&snapshot.mass_fractions);
            row
        })
        .collect();

    let data_file = DataFile {
        species: species.to_vec(),
        rows,
    };
    let metrics_file = MetricsFile {
        ignition_delays: data.ignition_delays.clone(),
    };
    std::fs::write(
        directory.join(DATA_FILE),
        serde_json::to_string(&data_file)
            .map_err(|e| ReductionError::Parse(e.to_string()))?,
    )?;
    std::fs::write(
        directory.join(METRICS_FILE),
        serde_json::to_string(&metrics_file)
            .map_err(|e| ReductionError::Parse(e.to_string()))?,
    )?;
    debug!("Stored baseline samples in {}.", directory.display());
    Ok(())
}
