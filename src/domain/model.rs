use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Global administrative boundaries feature collection (level 0 = countries).
pub const DEFAULT_BOUNDARIES_DATASET: &str = "FAO/GAUL/2015/level0";
pub const DEFAULT_NAME_PROPERTY: &str = "ADM0_NAME";
pub const DEFAULT_COUNTRY: &str = "Nigeria";

/// Population raster whose grid every export is aligned to.
pub const DEFAULT_REFERENCE_ASSET: &str = "WorldPop/GP/100m/pop_age_sex/NGA_2020";
pub const DEFAULT_REFERENCE_BAND: &str = "population";

/// GPM monthly precipitation and TerraClimate collections.
pub const GPM_MONTHLY: &str = "NASA/GPM_L3/IMERG_MONTHLY_V06";
pub const TERRACLIMATE: &str = "IDAHO_EPSCOR/TERRACLIMATE";

pub const DEFAULT_RES_SCALE: u32 = 500;
pub const DEFAULT_FOLDER: &str = "Data";
pub const DEFAULT_MAX_PIXELS: u64 = 900_000_000;
pub const GEOTIFF: &str = "GeoTIFF";

/// Inclusive-exclusive date window applied to every image collection filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The 2010-2020 window the covariate catalog was built for.
    pub fn default_window() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.start < self.end
    }
}

/// CRS plus the 6-element affine pixel-to-map transform of the reference
/// raster. Propagated unchanged into every export request so all outputs
/// share one grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub crs: String,
    pub transform: [f64; 6],
}

/// Server-side aggregation across an image collection's time dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reducer {
    #[serde(rename = "mean")]
    Mean,
    #[serde(rename = "stdDev")]
    StdDev,
}

impl Reducer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::StdDev => "stdDev",
        }
    }
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One covariate to export: a band of a remote collection plus how to
/// collapse the time dimension. `reducer: None` means "most recent image in
/// the window" (descending time sort, limit 1) instead of an aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Covariate {
    pub name: String,
    pub collection: String,
    pub band: String,
    pub reducer: Option<Reducer>,
    pub description_stem: String,
}

impl Covariate {
    pub fn new(
        name: &str,
        collection: &str,
        band: &str,
        reducer: Option<Reducer>,
        description_stem: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            collection: collection.to_string(),
            band: band.to_string(),
            reducer,
            description_stem: description_stem.to_string(),
        }
    }

    /// Export description, suffixed with the resolution scale so outputs at
    /// different scales never collide.
    pub fn description(&self, res_scale: u32) -> String {
        format!("{}_{}", self.description_stem, res_scale)
    }
}

/// The five climate covariates of the poverty-indicator pipeline, in
/// submission order.
pub fn default_covariates() -> Vec<Covariate> {
    vec![
        Covariate::new(
            "precipitation_mean",
            GPM_MONTHLY,
            "precipitation",
            Some(Reducer::Mean),
            "cpiPrecipiMeanData",
        ),
        Covariate::new(
            "precipitation_stddev",
            GPM_MONTHLY,
            "precipitation",
            Some(Reducer::StdDev),
            "cpiPrecipiStData",
        ),
        Covariate::new(
            "precipitation_accumulation",
            TERRACLIMATE,
            "pr",
            Some(Reducer::Mean),
            "cpiPrecipiAccData",
        ),
        Covariate::new("drought_index", TERRACLIMATE, "pdsi", None, "cpiPDSIData"),
        Covariate::new(
            "evapotranspiration",
            TERRACLIMATE,
            "aet",
            Some(Reducer::Mean),
            "cpiEvapotransData",
        ),
    ]
}

/// Opaque handle to a boundary polygon resolved on the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionHandle {
    pub id: String,
    pub dataset: String,
    pub name: String,
}

/// Everything the planner needs beyond configuration: the resolved region
/// and the reference grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportContext {
    pub region: RegionHandle,
    pub projection: Projection,
}

/// A fully specified export job, ready for submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub description: String,
    pub collection: String,
    pub band: String,
    pub dates: DateRange,
    pub region_id: String,
    pub reducer: Option<Reducer>,
    pub file_format: String,
    pub scale: u32,
    pub crs: String,
    pub crs_transform: [f64; 6],
    pub folder: String,
    pub max_pixels: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// An export job accepted by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportTask {
    pub id: String,
    pub description: String,
    pub state: TaskState,
    pub error: Option<String>,
}
