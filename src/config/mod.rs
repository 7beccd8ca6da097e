#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::domain::model::{sanitize_file_stem, OutputFormat, RackSelector};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ReportError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_required_field,
    validate_url, Validate,
};
use std::fmt;
use toml_config::TomlConfig;

pub const DEFAULT_OUTPUT_PATH: &str = "./outputs";
pub const DEFAULT_REPORT_NAME: &str = "rack";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Connection settings for the NetBox API.
#[derive(Clone)]
pub struct DcimSettings {
    /// API root, e.g. `https://netbox.example.com/api`.
    pub url: String,
    pub token: String,
    pub insecure_tls: bool,
    pub timeout_seconds: u64,
    pub page_limit: Option<usize>,
}

impl fmt::Debug for DcimSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DcimSettings")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("insecure_tls", &self.insecure_tls)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("page_limit", &self.page_limit)
            .finish()
    }
}

/// Values given on the command line or through the environment. They win over the file.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub url: Option<String>,
    pub token: Option<String>,
    pub insecure_tls: bool,
    pub timeout_seconds: Option<u64>,
    pub page_limit: Option<usize>,
    pub output_path: Option<String>,
    pub formats: Option<Vec<OutputFormat>>,
    pub default_name: Option<String>,
    pub template_path: Option<String>,
    pub monitor: bool,
}

/// Fully resolved settings for one report run.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub dcim: DcimSettings,
    pub rack: RackSelector,
    pub output_path: String,
    pub formats: Vec<OutputFormat>,
    pub default_name: String,
    pub template_path: Option<String>,
    pub monitor: bool,
}

impl ReportSettings {
    pub fn resolve(
        rack: RackSelector,
        overrides: SettingsOverrides,
        file: Option<&TomlConfig>,
    ) -> Result<Self> {
        let defaults = TomlConfig::default();
        let file = file.unwrap_or(&defaults);

        let url = overrides.url.or_else(|| file.dcim.url.clone());
        let token = overrides.token.or_else(|| file.dcim.token.clone());

        let mut formats = Vec::new();
        for format in overrides
            .formats
            .filter(|f| !f.is_empty())
            .or_else(|| file.report.formats.clone())
            .unwrap_or_else(OutputFormat::defaults)
        {
            if !formats.contains(&format) {
                formats.push(format);
            }
        }

        Ok(Self {
            dcim: DcimSettings {
                url: validate_required_field("dcim.url", &url)?.clone(),
                token: validate_required_field("dcim.token", &token)?.clone(),
                insecure_tls: overrides.insecure_tls || file.dcim.insecure_tls.unwrap_or(false),
                timeout_seconds: overrides
                    .timeout_seconds
                    .or(file.dcim.timeout_seconds)
                    .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
                page_limit: overrides.page_limit.or(file.dcim.page_limit),
            },
            rack,
            output_path: overrides
                .output_path
                .or_else(|| file.report.output_path.clone())
                .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string()),
            formats,
            default_name: overrides
                .default_name
                .or_else(|| file.report.default_name.clone())
                .unwrap_or_else(|| DEFAULT_REPORT_NAME.to_string()),
            template_path: overrides
                .template_path
                .or_else(|| file.report.template_path.clone()),
            monitor: overrides.monitor || file.monitoring_enabled(),
        })
    }
}

fn reject_placeholder(field: &str, value: &str) -> Result<()> {
    if value.contains("${") {
        return Err(ReportError::ConfigValidationError {
            field: field.to_string(),
            message: "contains an unresolved ${VAR} placeholder; is the variable exported?"
                .to_string(),
        });
    }
    Ok(())
}

impl Validate for ReportSettings {
    fn validate(&self) -> Result<()> {
        reject_placeholder("dcim.url", &self.dcim.url)?;
        validate_url("dcim.url", &self.dcim.url)?;

        reject_placeholder("dcim.token", &self.dcim.token)?;
        validate_non_empty_string("dcim.token", &self.dcim.token)?;

        validate_range("dcim.timeout_seconds", self.dcim.timeout_seconds, 1, 600)?;
        if let Some(limit) = self.dcim.page_limit {
            validate_range("dcim.page_limit", limit, 1, 1000)?;
        }

        if let RackSelector::Name(name) = &self.rack {
            validate_non_empty_string("rack_name", name)?;
        }

        validate_path("report.output_path", &self.output_path)?;
        if let Some(template) = &self.template_path {
            validate_path("report.template_path", template)?;
        }

        if self.formats.is_empty() {
            return Err(ReportError::MissingConfigError {
                field: "report.formats".to_string(),
            });
        }

        validate_non_empty_string("report.default_name", &self.default_name)?;
        if sanitize_file_stem(&self.default_name, "") != self.default_name {
            return Err(ReportError::InvalidConfigValueError {
                field: "report.default_name".to_string(),
                value: self.default_name.clone(),
                reason: "Only letters, digits, '.', '-' and '_' are allowed".to_string(),
            });
        }

        Ok(())
    }
}

impl ConfigProvider for ReportSettings {
    fn rack(&self) -> &RackSelector {
        &self.rack
    }

    fn output_formats(&self) -> &[OutputFormat] {
        &self.formats
    }

    fn default_report_name(&self) -> &str {
        &self.default_name
    }

    fn template_path(&self) -> Option<&str> {
        self.template_path.as_deref()
    }
}
