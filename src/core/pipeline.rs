use crate::core::{ConfigProvider, Pipeline, Platform};
use crate::domain::model::{ExportContext, ExportRequest, ExportTask, GEOTIFF};
use crate::utils::error::{ExportError, Result};

/// Plans and submits one export job per configured covariate. The generic
/// job builder lives in `plan`: covariate rows in, fully specified export
/// requests out, all sharing the resolved region and reference grid.
pub struct CovariatePipeline<P: Platform, C: ConfigProvider> {
    platform: P,
    config: C,
}

impl<P: Platform, C: ConfigProvider> CovariatePipeline<P, C> {
    pub fn new(platform: P, config: C) -> Self {
        Self { platform, config }
    }
}

#[async_trait::async_trait]
impl<P: Platform, C: ConfigProvider> Pipeline for CovariatePipeline<P, C> {
    async fn resolve(&self) -> Result<ExportContext> {
        tracing::debug!(
            "Resolving boundary for '{}' in {}",
            self.config.country(),
            self.config.boundaries_dataset()
        );
        let region = self
            .platform
            .resolve_region(
                self.config.boundaries_dataset(),
                self.config.name_property(),
                self.config.country(),
            )
            .await?;
        tracing::debug!("Region handle: {}", region.id);

        tracing::debug!(
            "Reading reference projection from {} band '{}'",
            self.config.reference_asset(),
            self.config.reference_band()
        );
        let projection = self
            .platform
            .image_projection(self.config.reference_asset(), self.config.reference_band())
            .await?;
        tracing::debug!("Reference grid: {} {:?}", projection.crs, projection.transform);

        Ok(ExportContext { region, projection })
    }

    async fn plan(&self, context: &ExportContext) -> Result<Vec<ExportRequest>> {
        let covariates = self.config.covariates();
        if covariates.is_empty() {
            return Err(ExportError::MissingConfig {
                field: "covariates".to_string(),
            });
        }

        let scale = self.config.res_scale();
        let requests = covariates
            .iter()
            .map(|covariate| ExportRequest {
                description: covariate.description(scale),
                collection: covariate.collection.clone(),
                band: covariate.band.clone(),
                dates: self.config.date_range(),
                region_id: context.region.id.clone(),
                reducer: covariate.reducer,
                file_format: GEOTIFF.to_string(),
                scale,
                crs: context.projection.crs.clone(),
                crs_transform: context.projection.transform,
                folder: self.config.folder().to_string(),
                max_pixels: self.config.max_pixels(),
            })
            .collect();

        Ok(requests)
    }

    async fn submit(&self, requests: Vec<ExportRequest>) -> Result<Vec<ExportTask>> {
        let mut tasks = Vec::with_capacity(requests.len());

        for request in &requests {
            let task = self.platform.submit_export(request).await?;
            tracing::info!("Submitted '{}' as task {}", request.description, task.id);
            tasks.push(task);
        }

        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportConfig;
    use crate::domain::model::{
        default_covariates, DateRange, Projection, Reducer, RegionHandle, TaskState,
    };
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockPlatform {
        projection: Projection,
        matched: u64,
        submitted: Arc<Mutex<Vec<ExportRequest>>>,
        states: Arc<Mutex<HashMap<String, TaskState>>>,
    }

    impl MockPlatform {
        fn new() -> Self {
            Self {
                projection: Projection {
                    crs: "EPSG:4326".to_string(),
                    transform: [0.0008333, 0.0, 2.6, 0.0, -0.0008333, 13.9],
                },
                matched: 1,
                submitted: Arc::new(Mutex::new(Vec::new())),
                states: Arc::new(Mutex::new(HashMap::new())),
            }
        }
    }

    #[async_trait::async_trait]
    impl Platform for MockPlatform {
        async fn resolve_region(
            &self,
            dataset: &str,
            property: &str,
            value: &str,
        ) -> Result<RegionHandle> {
            if self.matched == 0 {
                return Err(ExportError::EmptyCollection {
                    dataset: dataset.to_string(),
                    property: property.to_string(),
                    value: value.to_string(),
                });
            }
            Ok(RegionHandle {
                id: format!("regions/{}", value.to_lowercase()),
                dataset: dataset.to_string(),
                name: value.to_string(),
            })
        }

        async fn image_projection(&self, _asset: &str, _band: &str) -> Result<Projection> {
            Ok(self.projection.clone())
        }

        async fn submit_export(&self, request: &ExportRequest) -> Result<ExportTask> {
            let mut submitted = self.submitted.lock().await;
            submitted.push(request.clone());
            let id = format!("tasks/{}", submitted.len());
            self.states.lock().await.insert(id.clone(), TaskState::Pending);
            Ok(ExportTask {
                id,
                description: request.description.clone(),
                state: TaskState::Pending,
                error: None,
            })
        }

        async fn export_status(&self, task_id: &str) -> Result<ExportTask> {
            let state = self
                .states
                .lock()
                .await
                .get(task_id)
                .copied()
                .unwrap_or(TaskState::Completed);
            Ok(ExportTask {
                id: task_id.to_string(),
                description: String::new(),
                state,
                error: None,
            })
        }
    }

    fn test_config() -> ExportConfig {
        ExportConfig {
            endpoint: "http://platform.test".to_string(),
            token: None,
            request_timeout: Duration::from_secs(30),
            retry_attempts: 0,
            country: "Nigeria".to_string(),
            dates: DateRange::default_window(),
            res_scale: 500,
            folder: "Data".to_string(),
            max_pixels: 900_000_000,
            boundaries_dataset: "FAO/GAUL/2015/level0".to_string(),
            name_property: "ADM0_NAME".to_string(),
            reference_asset: "WorldPop/GP/100m/pop_age_sex/NGA_2020".to_string(),
            reference_band: "population".to_string(),
            covariates: default_covariates(),
        }
    }

    #[tokio::test]
    async fn test_resolve_produces_region_and_projection() {
        let pipeline = CovariatePipeline::new(MockPlatform::new(), test_config());

        let context = pipeline.resolve().await.unwrap();

        assert_eq!(context.region.id, "regions/nigeria");
        assert_eq!(context.region.name, "Nigeria");
        assert_eq!(context.projection.crs, "EPSG:4326");
    }

    #[tokio::test]
    async fn test_resolve_fails_for_unknown_country() {
        let platform = MockPlatform {
            matched: 0,
            ..MockPlatform::new()
        };
        let mut config = test_config();
        config.country = "Atlantis".to_string();
        let pipeline = CovariatePipeline::new(platform, config);

        let err = pipeline.resolve().await.unwrap_err();
        assert!(matches!(err, ExportError::EmptyCollection { .. }));
    }

    #[tokio::test]
    async fn test_plan_builds_one_request_per_covariate() {
        let pipeline = CovariatePipeline::new(MockPlatform::new(), test_config());
        let context = pipeline.resolve().await.unwrap();

        let requests = pipeline.plan(&context).await.unwrap();

        assert_eq!(requests.len(), 5);
        for request in &requests {
            assert_eq!(request.region_id, "regions/nigeria");
            assert_eq!(request.file_format, "GeoTIFF");
            assert_eq!(request.folder, "Data");
            assert_eq!(request.max_pixels, 900_000_000);
            assert_eq!(request.dates, DateRange::default_window());
        }

        assert_eq!(requests[0].description, "cpiPrecipiMeanData_500");
        assert_eq!(requests[0].reducer, Some(Reducer::Mean));
        assert_eq!(requests[3].band, "pdsi");
        assert!(requests[3].reducer.is_none());
    }

    #[tokio::test]
    async fn test_plan_rejects_empty_covariate_list() {
        let mut config = test_config();
        config.covariates.clear();
        let pipeline = CovariatePipeline::new(MockPlatform::new(), config);
        let context = ExportContext {
            region: RegionHandle {
                id: "regions/nigeria".to_string(),
                dataset: "FAO/GAUL/2015/level0".to_string(),
                name: "Nigeria".to_string(),
            },
            projection: Projection {
                crs: "EPSG:4326".to_string(),
                transform: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            },
        };

        let err = pipeline.plan(&context).await.unwrap_err();
        assert!(matches!(err, ExportError::MissingConfig { .. }));
    }

    #[tokio::test]
    async fn test_submit_forwards_every_request() {
        let platform = MockPlatform::new();
        let pipeline = CovariatePipeline::new(platform.clone(), test_config());
        let context = pipeline.resolve().await.unwrap();
        let requests = pipeline.plan(&context).await.unwrap();

        let tasks = pipeline.submit(requests.clone()).await.unwrap();

        assert_eq!(tasks.len(), 5);
        let submitted = platform.submitted.lock().await;
        assert_eq!(*submitted, requests);
        assert!(tasks.iter().all(|t| t.state == TaskState::Pending));
    }
}
