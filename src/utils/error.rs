use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("API request failed: {0}")]
    Api(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },

    #[error("Platform returned HTTP {status}: {message}")]
    Platform { status: u16, message: String },

    #[error("No features matched {property} = '{value}' in {dataset}")]
    EmptyCollection {
        dataset: String,
        property: String,
        value: String,
    },

    #[error("Export task {task_id} failed: {message}")]
    TaskFailed { task_id: String, message: String },

    #[error("Timed out after {minutes} minutes waiting for export tasks")]
    Timeout { minutes: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ExportError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Api(_) | Self::Platform { .. } | Self::Timeout { .. } => ErrorSeverity::Medium,
            Self::InvalidConfigValue { .. } | Self::MissingConfig { .. } => ErrorSeverity::High,
            Self::EmptyCollection { .. } | Self::TaskFailed { .. } => ErrorSeverity::High,
            Self::Io(_) | Self::Serialization(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Api(e) => format!("Could not reach the platform: {}", e),
            Self::Io(e) => format!("File access failed: {}", e),
            Self::Serialization(e) => format!("Unexpected response from the platform: {}", e),
            Self::InvalidConfigValue { field, reason, .. } => {
                format!("Configuration field '{}' is invalid: {}", field, reason)
            }
            Self::MissingConfig { field } => {
                format!("Configuration field '{}' was not provided", field)
            }
            Self::Platform { status, message } => {
                format!("The platform rejected the request ({}): {}", status, message)
            }
            Self::EmptyCollection { value, dataset, .. } => {
                format!("'{}' was not found in {}", value, dataset)
            }
            Self::TaskFailed { task_id, message } => {
                format!("Export task {} failed on the platform: {}", task_id, message)
            }
            Self::Timeout { minutes } => {
                format!("Export tasks did not finish within {} minutes", minutes)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::Api(_) => "Check the endpoint URL and your network connection, then retry",
            Self::Io(_) => "Check that the config file path exists and is readable",
            Self::Serialization(_) => {
                "Verify the endpoint points at a compatible platform API version"
            }
            Self::InvalidConfigValue { .. } => "Fix the named field in the config file or flags",
            Self::MissingConfig { .. } => "Provide the field via --config or the matching CLI flag",
            Self::Platform { .. } => {
                "Inspect the platform message; check quota, token, and asset ids"
            }
            Self::EmptyCollection { .. } => {
                "Check the country spelling against the boundaries dataset's name property"
            }
            Self::TaskFailed { .. } => "Inspect the task in the platform console and resubmit",
            Self::Timeout { .. } => {
                "Increase --timeout-minutes or track the tasks in the platform console"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = ExportError::MissingConfig {
            field: "platform.endpoint".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("platform.endpoint"));
    }

    #[test]
    fn test_empty_collection_message_names_dataset() {
        let err = ExportError::EmptyCollection {
            dataset: "FAO/GAUL/2015/level0".to_string(),
            property: "ADM0_NAME".to_string(),
            value: "Atlantis".to_string(),
        };
        assert!(err.to_string().contains("Atlantis"));
        assert!(err.user_friendly_message().contains("FAO/GAUL/2015/level0"));
    }
}
