//! Wire-level bodies for the platform REST API.
//!
//! Lightweight serde models covering the subset of the platform the exporter
//! talks to: feature lookup, asset projection metadata, and the export job
//! surface. Field names follow the platform's snake_case JSON.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::model::{ExportRequest, ExportTask, Reducer, TaskState};

// ---------------------------------------------------------------------------
// Export job submission
// ---------------------------------------------------------------------------

/// Body for `POST /v1/exports`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportJobBody {
    pub source: ExportSource,
    pub output: ExportOutput,
}

/// What to read and how to collapse the time dimension. An absent `reducer`
/// asks for the most recent image in the window instead of an aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSource {
    pub collection: String,
    pub band: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub region: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reducer: Option<Reducer>,
}

/// Where and how to write the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOutput {
    pub description: String,
    pub file_format: String,
    pub scale: u32,
    pub crs: String,
    pub crs_transform: [f64; 6],
    pub folder: String,
    pub max_pixels: u64,
}

impl ExportJobBody {
    pub fn from_request(request: &ExportRequest) -> Self {
        Self {
            source: ExportSource {
                collection: request.collection.clone(),
                band: request.band.clone(),
                start_date: request.dates.start,
                end_date: request.dates.end,
                region: request.region_id.clone(),
                reducer: request.reducer,
            },
            output: ExportOutput {
                description: request.description.clone(),
                file_format: request.file_format.clone(),
                scale: request.scale,
                crs: request.crs.clone(),
                crs_transform: request.crs_transform,
                folder: request.folder.clone(),
                max_pixels: request.max_pixels,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Response of `GET /v1/tables/{dataset}/features`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeatureMatch {
    pub id: String,
    pub dataset: String,
    /// Number of features matching the filter. Zero is surfaced locally as
    /// an error before any job is submitted.
    pub matched: u64,
}

/// Response of `GET /v1/assets/{asset}/projection`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectionInfo {
    pub crs: String,
    pub transform: [f64; 6],

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal_scale: Option<f64>,
}

/// Response of `POST /v1/exports` and `GET /v1/exports/{task_id}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskStatus {
    pub task_id: String,

    #[serde(default)]
    pub description: Option<String>,

    pub state: TaskState,

    #[serde(default)]
    pub error: Option<String>,
}

impl TaskStatus {
    /// Convert into the domain task handle, falling back to the submitted
    /// description when the platform omits it.
    pub fn into_task(self, fallback_description: &str) -> ExportTask {
        let description = self
            .description
            .unwrap_or_else(|| fallback_description.to_string());
        ExportTask {
            id: self.task_id,
            description,
            state: self.state,
            error: self.error,
        }
    }
}
