pub mod toml_config;

pub use toml_config::TomlConfig;

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;

use crate::domain::model::{
    default_covariates, Covariate, DateRange, DEFAULT_BOUNDARIES_DATASET, DEFAULT_COUNTRY,
    DEFAULT_FOLDER, DEFAULT_MAX_PIXELS, DEFAULT_NAME_PROPERTY, DEFAULT_REFERENCE_ASSET,
    DEFAULT_REFERENCE_BAND, DEFAULT_RES_SCALE,
};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ExportError, Result};
use crate::utils::validation::{self, Validate};

#[derive(Debug, Clone, Parser)]
#[command(name = "geoexport")]
#[command(about = "Submit per-country climate covariate raster exports")]
pub struct CliConfig {
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Platform API base URL (overrides [platform].endpoint)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Country name matched against the boundaries dataset
    #[arg(long)]
    pub country: Option<String>,

    /// Date window start, ISO format (inclusive)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Date window end, ISO format (exclusive)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Output resolution in meters
    #[arg(long)]
    pub res_scale: Option<u32>,

    /// Destination cloud folder
    #[arg(long)]
    pub folder: Option<String>,

    /// Per-job output pixel cap
    #[arg(long)]
    pub max_pixels: Option<u64>,

    #[arg(long, help = "Poll task status until every export finishes")]
    pub wait: bool,

    #[arg(long, default_value = "30")]
    pub poll_interval_seconds: u64,

    #[arg(long, default_value = "60")]
    pub timeout_minutes: u64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

/// Fully merged configuration: CLI flags beat the TOML file, the file beats
/// the built-in defaults of the original covariate run.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub endpoint: String,
    pub token: Option<String>,
    pub request_timeout: Duration,
    pub retry_attempts: u32,
    pub country: String,
    pub dates: DateRange,
    pub res_scale: u32,
    pub folder: String,
    pub max_pixels: u64,
    pub boundaries_dataset: String,
    pub name_property: String,
    pub reference_asset: String,
    pub reference_band: String,
    pub covariates: Vec<Covariate>,
}

impl ExportConfig {
    pub fn from_cli(cli: &CliConfig) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => Some(TomlConfig::from_file(path)?),
            None => None,
        };
        Self::merge(cli, file.as_ref())
    }

    pub fn merge(cli: &CliConfig, file: Option<&TomlConfig>) -> Result<Self> {
        let endpoint = cli
            .endpoint
            .clone()
            .or_else(|| file.map(|f| f.platform.endpoint.clone()))
            .ok_or_else(|| ExportError::MissingConfig {
                field: "platform.endpoint".to_string(),
            })?;

        let export = file.and_then(|f| f.export.as_ref());
        let boundaries = file.and_then(|f| f.boundaries.as_ref());
        let reference = file.and_then(|f| f.reference.as_ref());

        let defaults = DateRange::default_window();
        let start = match cli.start_date {
            Some(d) => d,
            None => match export.and_then(|e| e.start_date.as_deref()) {
                Some(s) => parse_date("export.start_date", s)?,
                None => defaults.start,
            },
        };
        let end = match cli.end_date {
            Some(d) => d,
            None => match export.and_then(|e| e.end_date.as_deref()) {
                Some(s) => parse_date("export.end_date", s)?,
                None => defaults.end,
            },
        };

        let covariates = match file.and_then(|f| f.covariates.as_ref()) {
            Some(sections) => sections
                .iter()
                .map(|s| s.to_covariate())
                .collect::<Result<Vec<_>>>()?,
            None => default_covariates(),
        };

        Ok(Self {
            endpoint,
            token: file.and_then(|f| f.platform.token.clone()),
            request_timeout: Duration::from_secs(
                file.and_then(|f| f.platform.timeout_seconds).unwrap_or(30),
            ),
            retry_attempts: file.and_then(|f| f.platform.retry_attempts).unwrap_or(3),
            country: cli
                .country
                .clone()
                .or_else(|| export.and_then(|e| e.country.clone()))
                .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            dates: DateRange::new(start, end),
            res_scale: cli
                .res_scale
                .or_else(|| export.and_then(|e| e.res_scale))
                .unwrap_or(DEFAULT_RES_SCALE),
            folder: cli
                .folder
                .clone()
                .or_else(|| export.and_then(|e| e.folder.clone()))
                .unwrap_or_else(|| DEFAULT_FOLDER.to_string()),
            max_pixels: cli
                .max_pixels
                .or_else(|| export.and_then(|e| e.max_pixels))
                .unwrap_or(DEFAULT_MAX_PIXELS),
            boundaries_dataset: boundaries
                .and_then(|b| b.dataset.clone())
                .unwrap_or_else(|| DEFAULT_BOUNDARIES_DATASET.to_string()),
            name_property: boundaries
                .and_then(|b| b.name_property.clone())
                .unwrap_or_else(|| DEFAULT_NAME_PROPERTY.to_string()),
            reference_asset: reference
                .and_then(|r| r.asset.clone())
                .unwrap_or_else(|| DEFAULT_REFERENCE_ASSET.to_string()),
            reference_band: reference
                .and_then(|r| r.band.clone())
                .unwrap_or_else(|| DEFAULT_REFERENCE_BAND.to_string()),
            covariates,
        })
    }
}

fn parse_date(field_name: &str, value: &str) -> Result<NaiveDate> {
    value
        .parse::<NaiveDate>()
        .map_err(|e| ExportError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("expected an ISO date (YYYY-MM-DD): {}", e),
        })
}

impl ConfigProvider for ExportConfig {
    fn country(&self) -> &str {
        &self.country
    }

    fn boundaries_dataset(&self) -> &str {
        &self.boundaries_dataset
    }

    fn name_property(&self) -> &str {
        &self.name_property
    }

    fn reference_asset(&self) -> &str {
        &self.reference_asset
    }

    fn reference_band(&self) -> &str {
        &self.reference_band
    }

    fn date_range(&self) -> DateRange {
        self.dates
    }

    fn res_scale(&self) -> u32 {
        self.res_scale
    }

    fn folder(&self) -> &str {
        &self.folder
    }

    fn max_pixels(&self) -> u64 {
        self.max_pixels
    }

    fn covariates(&self) -> &[Covariate] {
        &self.covariates
    }
}

impl Validate for ExportConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("platform.endpoint", &self.endpoint)?;
        validation::validate_non_empty_string("export.country", &self.country)?;
        validation::validate_date_order("export.dates", &self.dates)?;
        validation::validate_positive_number("export.res_scale", u64::from(self.res_scale), 1)?;
        validation::validate_positive_number("export.max_pixels", self.max_pixels, 1)?;
        validation::validate_non_empty_string("export.folder", &self.folder)?;
        validation::validate_non_empty_string("boundaries.dataset", &self.boundaries_dataset)?;
        validation::validate_non_empty_string("reference.asset", &self.reference_asset)?;

        if self.covariates.is_empty() {
            return Err(ExportError::MissingConfig {
                field: "covariates".to_string(),
            });
        }
        for covariate in &self.covariates {
            let prefix = format!("covariates.{}", covariate.name);
            validation::validate_non_empty_string(&format!("{}.collection", prefix), &covariate.collection)?;
            validation::validate_non_empty_string(&format!("{}.band", prefix), &covariate.band)?;
            validation::validate_non_empty_string(
                &format!("{}.description_stem", prefix),
                &covariate.description_stem,
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_cli() -> CliConfig {
        CliConfig {
            config: None,
            endpoint: Some("https://platform.example.com".to_string()),
            country: None,
            start_date: None,
            end_date: None,
            res_scale: None,
            folder: None,
            max_pixels: None,
            wait: false,
            poll_interval_seconds: 30,
            timeout_minutes: 60,
            verbose: false,
        }
    }

    #[test]
    fn test_defaults_reproduce_original_run() {
        let config = ExportConfig::merge(&bare_cli(), None).unwrap();

        assert_eq!(config.country, "Nigeria");
        assert_eq!(config.dates, DateRange::default_window());
        assert_eq!(config.res_scale, 500);
        assert_eq!(config.folder, "Data");
        assert_eq!(config.max_pixels, 900_000_000);
        assert_eq!(config.boundaries_dataset, "FAO/GAUL/2015/level0");
        assert_eq!(config.name_property, "ADM0_NAME");
        assert_eq!(
            config.reference_asset,
            "WorldPop/GP/100m/pop_age_sex/NGA_2020"
        );
        assert_eq!(config.reference_band, "population");
        assert_eq!(config.covariates.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_endpoint_is_an_error() {
        let mut cli = bare_cli();
        cli.endpoint = None;

        let err = ExportConfig::merge(&cli, None).unwrap_err();
        assert!(matches!(err, ExportError::MissingConfig { .. }));
    }

    #[test]
    fn test_cli_flags_override_file() {
        let file = TomlConfig::from_toml_str(
            r#"
[platform]
endpoint = "https://file.example.com"

[export]
country = "Senegal"
res_scale = 1000
"#,
        )
        .unwrap();

        let mut cli = bare_cli();
        cli.endpoint = None;
        cli.country = Some("Ghana".to_string());

        let config = ExportConfig::merge(&cli, Some(&file)).unwrap();

        assert_eq!(config.endpoint, "https://file.example.com");
        assert_eq!(config.country, "Ghana");
        assert_eq!(config.res_scale, 1000);
    }

    #[test]
    fn test_bad_file_date_is_reported_by_field() {
        let file = TomlConfig::from_toml_str(
            r#"
[platform]
endpoint = "https://file.example.com"

[export]
start_date = "01/02/2010"
"#,
        )
        .unwrap();

        let err = ExportConfig::merge(&bare_cli(), Some(&file)).unwrap_err();
        match err {
            ExportError::InvalidConfigValue { field, .. } => {
                assert_eq!(field, "export.start_date")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_reversed_dates_fail_validation() {
        let mut cli = bare_cli();
        cli.start_date = Some("2020-01-01".parse().unwrap());
        cli.end_date = Some("2010-01-01".parse().unwrap());

        let config = ExportConfig::merge(&cli, None).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_covariates_replace_default_catalog() {
        let file = TomlConfig::from_toml_str(
            r#"
[platform]
endpoint = "https://file.example.com"

[[covariates]]
name = "drought_index"
collection = "IDAHO_EPSCOR/TERRACLIMATE"
band = "pdsi"
reducer = "latest"
"#,
        )
        .unwrap();

        let config = ExportConfig::merge(&bare_cli(), Some(&file)).unwrap();

        assert_eq!(config.covariates.len(), 1);
        assert_eq!(config.covariates[0].band, "pdsi");
        assert!(config.validate().is_ok());
    }
}
