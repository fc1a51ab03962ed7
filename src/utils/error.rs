use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Zip bundle error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV export error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Reference results not found at {path}")]
    MissingReference { path: String },

    #[error("Candidate results for version {version} not found at {path}")]
    MissingResults { version: String, path: String },

    #[error("Stale cache entry {key}: {message}")]
    StaleCache { key: String, message: String },

    #[error("No cached candidate results found for version {version}")]
    EmptyCache { version: String },

    #[error("Schema validation failed for {record}: {message}")]
    SchemaValidation { record: String, message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Analysis engine failed on {analysis_id}: {message}")]
    EngineError {
        analysis_id: String,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    System,
    Data,
    Cache,
    Config,
    Engine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl VerifyError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            VerifyError::IoError(_) | VerifyError::ZipError(_) => ErrorCategory::System,
            VerifyError::JsonError(_)
            | VerifyError::CsvError(_)
            | VerifyError::MissingReference { .. }
            | VerifyError::MissingResults { .. }
            | VerifyError::SchemaValidation { .. } => ErrorCategory::Data,
            VerifyError::StaleCache { .. } | VerifyError::EmptyCache { .. } => ErrorCategory::Cache,
            VerifyError::ConfigValidationError { .. }
            | VerifyError::InvalidConfigValueError { .. }
            | VerifyError::MissingConfigError { .. } => ErrorCategory::Config,
            VerifyError::EngineError { .. } => ErrorCategory::Engine,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            VerifyError::IoError(_) | VerifyError::ZipError(_) => ErrorSeverity::Critical,
            VerifyError::JsonError(_)
            | VerifyError::CsvError(_)
            | VerifyError::MissingReference { .. }
            | VerifyError::MissingResults { .. }
            | VerifyError::SchemaValidation { .. }
            | VerifyError::ConfigValidationError { .. }
            | VerifyError::InvalidConfigValueError { .. }
            | VerifyError::MissingConfigError { .. } => ErrorSeverity::High,
            VerifyError::StaleCache { .. }
            | VerifyError::EmptyCache { .. }
            | VerifyError::EngineError { .. } => ErrorSeverity::Medium,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            VerifyError::MissingReference { path } => {
                format!("The reference results file is missing ({})", path)
            }
            VerifyError::MissingResults { version, path } => format!(
                "No candidate results were found for version {} ({})",
                version, path
            ),
            VerifyError::StaleCache { key, .. } => {
                format!("A cached analysis result is out of date (key {})", key)
            }
            VerifyError::EmptyCache { version } => format!(
                "The cache holds no candidate results for version {}",
                version
            ),
            VerifyError::SchemaValidation { record, message } => format!(
                "Record {} does not match the results schema: {}",
                record, message
            ),
            VerifyError::ConfigValidationError { field, message } => {
                format!("Configuration problem in '{}': {}", field, message)
            }
            VerifyError::InvalidConfigValueError { field, value, .. } => {
                format!("'{}' is not a valid value for '{}'", value, field)
            }
            VerifyError::MissingConfigError { field } => {
                format!("Required configuration field '{}' is missing", field)
            }
            VerifyError::EngineError { analysis_id, .. } => {
                format!("The analysis engine could not process {}", analysis_id)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            VerifyError::IoError(_) => {
                "Check file permissions and free disk space, then retry".to_string()
            }
            VerifyError::JsonError(_) => {
                "The file is not valid JSON; regenerate it from the source data".to_string()
            }
            VerifyError::ZipError(_) => {
                "Delete the partial bundle and run the verification again".to_string()
            }
            VerifyError::CsvError(_) => {
                "Re-run the verification to regenerate the CSV export".to_string()
            }
            VerifyError::MissingReference { .. } => {
                "Place reference_results.json.gz under <data-dir>/results/".to_string()
            }
            VerifyError::MissingResults { version, .. } => format!(
                "Run the candidate analyses and collect them with collect-results --version {}",
                version
            ),
            VerifyError::StaleCache { .. } => {
                "Clear <data-dir>/cache/ and re-run the candidate analyses".to_string()
            }
            VerifyError::EmptyCache { .. } => {
                "Run the candidate analyses before collecting results".to_string()
            }
            VerifyError::SchemaValidation { .. } => {
                "Regenerate the results file; its contents do not match schema 1.0".to_string()
            }
            VerifyError::ConfigValidationError { .. }
            | VerifyError::InvalidConfigValueError { .. }
            | VerifyError::MissingConfigError { .. } => {
                "Fix the tolerance configuration file and retry".to_string()
            }
            VerifyError::EngineError { .. } => {
                "Inspect the engine log for this analysis; other records are unaffected".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, VerifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping() {
        let io = VerifyError::IoError(std::io::Error::new(std::io::ErrorKind::Other, "x"));
        assert_eq!(io.severity(), ErrorSeverity::Critical);

        let missing = VerifyError::MissingReference {
            path: "results/reference_results.json.gz".to_string(),
        };
        assert_eq!(missing.severity(), ErrorSeverity::High);
        assert_eq!(missing.category(), ErrorCategory::Data);

        let stale = VerifyError::StaleCache {
            key: "abc123".to_string(),
            message: "analysis id mismatch".to_string(),
        };
        assert_eq!(stale.severity(), ErrorSeverity::Medium);
        assert_eq!(stale.category(), ErrorCategory::Cache);
    }

    #[test]
    fn test_recovery_suggestion_names_the_version() {
        let err = VerifyError::MissingResults {
            version: "0.3.1".to_string(),
            path: "results/candidate_0.3.1_results.json.gz".to_string(),
        };
        assert!(err.recovery_suggestion().contains("0.3.1"));
        assert!(err.user_friendly_message().contains("0.3.1"));
    }
}
