//! HTTP implementation of the [`Platform`] port.
//!
//! Bounded retries with exponential backoff on transport errors and 5xx
//! responses; 4xx responses fail fast since resubmitting the same bad
//! request cannot help.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::model::{ExportRequest, ExportTask, Projection, RegionHandle};
use crate::domain::ports::Platform;
use crate::platform::wire::{ExportJobBody, FeatureMatch, ProjectionInfo, TaskStatus};
use crate::utils::error::{ExportError, Result};

/// Configuration for [`HttpPlatform`].
#[derive(Debug, Clone)]
pub struct HttpPlatformOptions {
    /// Per-request timeout (default 30 s).
    pub request_timeout: Duration,
    /// Maximum retries on transient failures (default 3).
    pub max_retries: u32,
    /// Optional bearer token sent with every request.
    pub token: Option<String>,
}

impl Default for HttpPlatformOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            token: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpPlatform {
    base_url: String,
    client: reqwest::Client,
    options: HttpPlatformOptions,
}

impl HttpPlatform {
    pub fn new(base_url: &str, options: HttpPlatformOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            options,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.options.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.url(path);
        let body = self
            .send_with_retry(|| self.authorize(self.client.get(&url).query(query)))
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        let text = self
            .send_with_retry(|| self.authorize(self.client.post(&url).json(body)))
            .await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Send a request up to `max_retries + 1` times. Backoff doubles from
    /// 500 ms. Client errors (4xx) are returned immediately.
    async fn send_with_retry<F>(&self, make_request: F) -> Result<String>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut last_err: Option<ExportError> = None;

        for attempt in 0..=self.options.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(500 * (1 << (attempt - 1)));
                tracing::debug!("Retrying in {:?} (attempt {})", delay, attempt + 1);
                tokio::time::sleep(delay).await;
            }

            match make_request().send().await {
                Ok(resp) if resp.status().is_success() => {
                    return Ok(resp.text().await?);
                }
                Ok(resp) => {
                    let status = resp.status();
                    let message = resp
                        .text()
                        .await
                        .unwrap_or_default()
                        .chars()
                        .take(500)
                        .collect::<String>();
                    let err = ExportError::Platform {
                        status: status.as_u16(),
                        message,
                    };
                    if status.is_client_error() {
                        return Err(err);
                    }
                    last_err = Some(err);
                }
                Err(e) => {
                    last_err = Some(ExportError::Api(e));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| ExportError::Platform {
            status: 0,
            message: "request failed without a response".to_string(),
        }))
    }
}

#[async_trait]
impl Platform for HttpPlatform {
    async fn resolve_region(
        &self,
        dataset: &str,
        property: &str,
        value: &str,
    ) -> Result<RegionHandle> {
        let path = format!("/v1/tables/{}/features", dataset);
        let matched: FeatureMatch = self
            .get_json(&path, &[("property", property), ("value", value)])
            .await?;

        if matched.matched == 0 {
            return Err(ExportError::EmptyCollection {
                dataset: dataset.to_string(),
                property: property.to_string(),
                value: value.to_string(),
            });
        }

        tracing::debug!(
            "Matched {} feature(s) for {} = '{}' in {}",
            matched.matched,
            property,
            value,
            dataset
        );

        Ok(RegionHandle {
            id: matched.id,
            dataset: matched.dataset,
            name: value.to_string(),
        })
    }

    async fn image_projection(&self, asset: &str, band: &str) -> Result<Projection> {
        let path = format!("/v1/assets/{}/projection", asset);
        let info: ProjectionInfo = self.get_json(&path, &[("band", band)]).await?;

        if let Some(scale) = info.nominal_scale {
            tracing::debug!("Reference band '{}' nominal scale: {} m", band, scale);
        }

        Ok(Projection {
            crs: info.crs,
            transform: info.transform,
        })
    }

    async fn submit_export(&self, request: &ExportRequest) -> Result<ExportTask> {
        let body = ExportJobBody::from_request(request);
        let status: TaskStatus = self.post_json("/v1/exports", &body).await?;
        Ok(status.into_task(&request.description))
    }

    async fn export_status(&self, task_id: &str) -> Result<ExportTask> {
        let path = format!("/v1/exports/{}", task_id);
        let status: TaskStatus = self.get_json(&path, &[]).await?;
        Ok(status.into_task(task_id))
    }
}
