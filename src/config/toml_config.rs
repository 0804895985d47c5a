use crate::domain::model::{Covariate, Reducer};
use crate::utils::error::{ExportError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File-based configuration. Only `[platform]` is required; every other
/// section falls back to the defaults of the original covariate run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub platform: PlatformSection,
    pub export: Option<ExportSection>,
    pub boundaries: Option<BoundariesSection>,
    pub reference: Option<ReferenceSection>,
    pub covariates: Option<Vec<CovariateSection>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformSection {
    pub endpoint: String,
    pub token: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSection {
    pub country: Option<String>,
    /// ISO dates, quoted: start_date = "2010-01-01"
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub res_scale: Option<u32>,
    pub folder: Option<String>,
    pub max_pixels: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundariesSection {
    pub dataset: Option<String>,
    pub name_property: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceSection {
    pub asset: Option<String>,
    pub band: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CovariateSection {
    pub name: String,
    pub collection: String,
    pub band: String,
    /// "mean", "stdDev", or "latest" (most recent image in the window)
    pub reducer: Option<String>,
    pub description_stem: Option<String>,
}

impl CovariateSection {
    pub fn to_covariate(&self) -> Result<Covariate> {
        let reducer = match self.reducer.as_deref() {
            None | Some("latest") | Some("none") => None,
            Some("mean") => Some(Reducer::Mean),
            Some("stdDev") | Some("stddev") | Some("std_dev") => Some(Reducer::StdDev),
            Some(other) => {
                return Err(ExportError::InvalidConfigValue {
                    field: format!("covariates.{}.reducer", self.name),
                    value: other.to_string(),
                    reason: "expected one of: mean, stdDev, latest".to_string(),
                })
            }
        };

        let stem = self
            .description_stem
            .clone()
            .unwrap_or_else(|| self.name.clone());

        Ok(Covariate {
            name: self.name.clone(),
            collection: self.collection.clone(),
            band: self.band.clone(),
            reducer,
            description_stem: stem,
        })
    }
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ExportError::Io)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ExportError::InvalidConfigValue {
            field: "toml_parsing".to_string(),
            value: String::new(),
            reason: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR_NAME}` with the environment variable's value. Unset
    /// variables are left as-is so validation reports them by name.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }
}
