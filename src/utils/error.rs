use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Transport failure while fetching {resource}: {source}")]
    Transport {
        resource: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Malformed response for {resource}: {source}")]
    Decode {
        resource: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Rack not found: no rack named '{name}'")]
    RackNotFound { name: String },

    #[error("Required data unavailable: {resource}")]
    MissingData { resource: String },

    #[error("Template rendering failed: {0}")]
    Template(#[from] tera::Error),

    #[error("PDF rendering failed: {message}")]
    Pdf { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Zip operation failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Render,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReportError::Transport { .. } => ErrorCategory::Network,
            ReportError::Decode { .. }
            | ReportError::RackNotFound { .. }
            | ReportError::MissingData { .. }
            | ReportError::Serialization(_) => ErrorCategory::Data,
            ReportError::Template(_)
            | ReportError::Pdf { .. }
            | ReportError::Csv(_)
            | ReportError::Zip(_) => ErrorCategory::Render,
            ReportError::Io(_) => ErrorCategory::Storage,
            ReportError::ConfigError { .. }
            | ReportError::MissingConfigError { .. }
            | ReportError::InvalidConfigValueError { .. }
            | ReportError::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 網路問題通常重試即可
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Render | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ReportError::Transport { .. } => {
                "Check that the NetBox URL is reachable (DNS, firewall, TLS settings) and retry"
                    .to_string()
            }
            ReportError::Decode { .. } => {
                "Verify the URL points at the NetBox API root (usually ending in /api)".to_string()
            }
            ReportError::RackNotFound { .. } => {
                "Check the rack name spelling, or pass --rack-id instead".to_string()
            }
            ReportError::MissingData { .. } => {
                "Check the API token permissions and that the rack id exists".to_string()
            }
            ReportError::Template(_) => {
                "Check the custom template syntax, or drop --template to use the built-in one"
                    .to_string()
            }
            ReportError::Pdf { .. } => "Retry with --format html to skip PDF output".to_string(),
            ReportError::Io(_) => {
                "Check that the output directory exists and is writable".to_string()
            }
            ReportError::Csv(_) | ReportError::Zip(_) | ReportError::Serialization(_) => {
                "Retry without the csv/configs output formats".to_string()
            }
            ReportError::ConfigError { .. }
            | ReportError::MissingConfigError { .. }
            | ReportError::InvalidConfigValueError { .. }
            | ReportError::ConfigValidationError { .. } => {
                "Review the configuration file and command-line flags".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ReportError::Transport { resource, .. } => {
                format!("Could not reach NetBox while fetching {resource}")
            }
            ReportError::Decode { resource, .. } => {
                format!("NetBox returned an unexpected response for {resource}")
            }
            ReportError::RackNotFound { name } => format!("No rack named '{name}' exists"),
            ReportError::MissingData { resource } => {
                format!("NetBox did not return {resource}")
            }
            ReportError::MissingConfigError { field } => {
                format!("Missing required setting: {field}")
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
