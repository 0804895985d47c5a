pub mod config;
pub mod core;
pub mod domain;
pub mod platform;
pub mod utils;

pub use config::{CliConfig, ExportConfig, TomlConfig};
pub use crate::core::engine::ExportEngine;
pub use crate::core::pipeline::CovariatePipeline;
pub use domain::model::{
    default_covariates, Covariate, DateRange, ExportContext, ExportRequest, ExportTask,
    Projection, Reducer, RegionHandle, TaskState,
};
pub use domain::ports::{ConfigProvider, Pipeline, Platform};
pub use platform::http::{HttpPlatform, HttpPlatformOptions};
pub use utils::error::{ExportError, Result};
