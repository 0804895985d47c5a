use crate::domain::model::{
    Covariate, DateRange, ExportContext, ExportRequest, ExportTask, Projection, RegionHandle,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Thin client abstraction over the hosted geospatial platform. Everything
/// heavy (filtering, reduction, reprojection, export) runs server-side; this
/// trait only names the four calls the exporter needs.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Filter a feature collection down to the single feature whose
    /// `property` equals `value`, returning an opaque region handle.
    async fn resolve_region(
        &self,
        dataset: &str,
        property: &str,
        value: &str,
    ) -> Result<RegionHandle>;

    /// Read the CRS and affine transform of one band of a raster asset.
    async fn image_projection(&self, asset: &str, band: &str) -> Result<Projection>;

    /// Submit an export job; returns the accepted task handle.
    async fn submit_export(&self, request: &ExportRequest) -> Result<ExportTask>;

    /// Current state of a previously submitted task.
    async fn export_status(&self, task_id: &str) -> Result<ExportTask>;
}

pub trait ConfigProvider: Send + Sync {
    fn country(&self) -> &str;
    fn boundaries_dataset(&self) -> &str;
    fn name_property(&self) -> &str;
    fn reference_asset(&self) -> &str;
    fn reference_band(&self) -> &str;
    fn date_range(&self) -> DateRange;
    fn res_scale(&self) -> u32;
    fn folder(&self) -> &str;
    fn max_pixels(&self) -> u64;
    fn covariates(&self) -> &[Covariate];
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Resolve the country boundary and the reference projection.
    async fn resolve(&self) -> Result<ExportContext>;

    /// Build one export request per configured covariate.
    async fn plan(&self, context: &ExportContext) -> Result<Vec<ExportRequest>>;

    /// Submit the planned jobs and return the accepted task handles.
    async fn submit(&self, requests: Vec<ExportRequest>) -> Result<Vec<ExportTask>>;
}
