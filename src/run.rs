//! Run records as served by the scheduler's `/api/v1/runs` endpoint.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A single run, consumed read-only by the filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    #[serde(default)]
    pub run_id: String,
    pub job_id: String,
    pub state: String,
    #[serde(default)]
    pub args: BTreeMap<String, String>,
    /// Start and end of the run's time range, when known
    #[serde(default)]
    pub time_range: Option<(Timestamp, Timestamp)>,
}

impl RunRecord {
    pub fn new(run_id: &str, job_id: &str, state: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            job_id: job_id.to_string(),
            state: state.to_string(),
            args: BTreeMap::new(),
            time_range: None,
        }
    }

    pub fn with_arg(mut self, name: &str, value: &str) -> Self {
        self.args.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_time_range(mut self, start: Timestamp, end: Timestamp) -> Self {
        self.time_range = Some((start, end));
        self
    }
}

/// The runs response envelope: `{"when": ..., "runs": {run_id: run, ...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunsResponse {
    #[serde(default)]
    pub when: Option<String>,
    pub runs: BTreeMap<String, RunRecord>,
}

impl RunsResponse {
    /// Consumes the envelope, filling in run ids from the map keys where the
    /// record itself omits one.
    pub fn into_runs(self) -> Vec<RunRecord> {
        self.runs
            .into_iter()
            .map(|(run_id, mut run)| {
                if run.run_id.is_empty() {
                    run.run_id = run_id;
                }
                run
            })
            .collect()
    }
}

/// Error loading a runs snapshot
#[derive(Debug)]
pub struct RunsError {
    pub message: String,
}

impl std::fmt::Display for RunsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "runs snapshot error: {}", self.message)
    }
}

impl std::error::Error for RunsError {}

impl RunsError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

/// Loads a runs snapshot saved from the runs endpoint.
pub fn load_runs<P: AsRef<Path>>(path: P) -> Result<Vec<RunRecord>, RunsError> {
    let path_ref = path.as_ref();

    let content = fs::read_to_string(path_ref).map_err(|e| {
        RunsError::new(format!("cannot read {}: {}", path_ref.display(), e))
    })?;

    parse_runs(&content)
        .map_err(|e| RunsError::new(format!("{}: {}", path_ref.display(), e.message)))
}

/// Parses the JSON text of a runs response.
pub fn parse_runs(json: &str) -> Result<Vec<RunRecord>, RunsError> {
    let response: RunsResponse = serde_json::from_str(json)
        .map_err(|e| RunsError::new(format!("invalid runs JSON: {}", e)))?;
    Ok(response.into_runs())
}
