use crate::config::toml_config::TomlConfig;
use crate::config::{ReportSettings, SettingsOverrides};
use crate::domain::model::{OutputFormat, RackSelector};
use crate::utils::error::{ReportError, Result};
use clap::{ArgGroup, Parser};

#[derive(Debug, Clone, Parser)]
#[command(name = "rack-doku", version)]
#[command(about = "Generates device documentation of a specific NetBox rack")]
#[command(group(ArgGroup::new("rack").required(true).args(["rack_id", "rack_name"])))]
pub struct CliConfig {
    /// Numeric id of the rack to document
    #[arg(long = "rack-id", alias = "rack_id", value_name = "ID")]
    pub rack_id: Option<u64>,

    /// Rack name; resolved to an id before anything else is fetched
    #[arg(long = "rack-name", alias = "rack_name", value_name = "NAME")]
    pub rack_name: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// NetBox API root, e.g. https://netbox.example.com/api
    #[arg(long, env = "NETBOX_URL")]
    pub url: Option<String>,

    /// API token ("Token <key>", "Bearer <key>" or a bare key)
    #[arg(long, env = "NETBOX_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Accept invalid TLS certificates (lab setups with self-signed certs)
    #[arg(long)]
    pub insecure: bool,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Append limit=<N> to list requests
    #[arg(long, value_name = "N")]
    pub page_limit: Option<usize>,

    /// Directory the report files are written to
    #[arg(short, long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Comma-separated output formats: html, pdf, csv, configs
    #[arg(short = 'f', long = "format", value_delimiter = ',', value_name = "FORMAT")]
    pub formats: Vec<OutputFormat>,

    /// File name used when the rack name cannot be fetched
    #[arg(long, value_name = "NAME")]
    pub default_name: Option<String>,

    /// Tera template replacing the built-in HTML layout
    #[arg(long, value_name = "FILE")]
    pub template: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Print the resolved configuration without calling the API")]
    pub dry_run: bool,
}

impl CliConfig {
    pub fn rack_selector(&self) -> Result<RackSelector> {
        match (&self.rack_id, &self.rack_name) {
            (Some(id), _) => Ok(RackSelector::Id(*id)),
            (None, Some(name)) => Ok(RackSelector::Name(name.clone())),
            (None, None) => Err(ReportError::MissingConfigError {
                field: "--rack-id or --rack-name".to_string(),
            }),
        }
    }

    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            url: self.url.clone(),
            token: self.token.clone(),
            insecure_tls: self.insecure,
            timeout_seconds: self.timeout,
            page_limit: self.page_limit,
            output_path: self.output_dir.clone(),
            formats: (!self.formats.is_empty()).then(|| self.formats.clone()),
            default_name: self.default_name.clone(),
            template_path: self.template.clone(),
            monitor: self.monitor,
        }
    }

    /// Merges flags, environment and the optional config file.
    pub fn resolve(&self) -> Result<ReportSettings> {
        let file = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                Some(TomlConfig::from_file(path)?)
            }
            None => None,
        };

        ReportSettings::resolve(self.rack_selector()?, self.overrides(), file.as_ref())
    }
}
