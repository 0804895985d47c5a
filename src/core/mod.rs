pub mod engine;
pub mod pipeline;

pub use crate::domain::model::{ExportContext, ExportRequest, ExportTask};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Platform};
pub use crate::utils::error::Result;
