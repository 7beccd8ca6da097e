use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// --- Inventory records as returned by the DCIM API ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rack {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedRef {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub config_template: Option<NestedRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cable {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPeer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub device: Option<NestedRef>,
}

impl LinkPeer {
    /// Circuit terminations and power feeds have no `name`; NetBox still sends `display`.
    pub fn port_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.display.as_deref())
    }

    pub fn device_name(&self) -> Option<&str> {
        self.device.as_ref().and_then(|d| d.name.as_deref())
    }
}

/// A cabled endpoint on a device. Interfaces and front ports share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    #[serde(default)]
    pub cable: Option<Cable>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub link_peers: Vec<LinkPeer>,
}

pub type Interface = Port;
pub type FrontPort = Port;

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RackFace {
    Front,
    Rear,
}

impl RackFace {
    pub fn as_str(&self) -> &'static str {
        match self {
            RackFace::Front => "front",
            RackFace::Rear => "rear",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Elevation {
    pub front: Option<String>,
    pub rear: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInventory {
    pub device: Device,
    pub interfaces: Vec<Interface>,
    pub front_ports: Vec<FrontPort>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedConfig {
    pub device_id: u64,
    pub device_name: String,
    pub content: Vec<u8>,
}

/// Everything fetched for one rack, in API order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RackSnapshot {
    pub rack_id: u64,
    pub rack_name: Option<String>,
    pub elevation: Elevation,
    pub devices: Vec<DeviceInventory>,
    pub rendered_configs: Vec<RenderedConfig>,
}

// --- Aggregated report model ---

/// Cable label and far-end names; only exists when the port has a labelled cable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CableLink {
    #[serde(rename = "cable")]
    pub label: String,
    pub peer: String,
    pub peer_device: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortEntry {
    pub name: String,
    #[serde(flatten)]
    pub link: Option<CableLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportDevice {
    pub name: String,
    pub id: u64,
    pub interfaces: Vec<PortEntry>,
    pub front_ports: Vec<PortEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RackReport {
    pub rack_id: u64,
    pub rack_name: Option<String>,
    pub file_stem: String,
    pub elevation: Elevation,
    pub devices: Vec<ReportDevice>,
    pub rendered_configs: Vec<RenderedConfig>,
}

impl RackReport {
    pub fn title(&self) -> String {
        match &self.rack_name {
            Some(name) => format!("Rack {}", name),
            None => format!("Rack #{}", self.rack_id),
        }
    }

    pub fn port_count(&self) -> usize {
        self.devices
            .iter()
            .map(|d| d.interfaces.len() + d.front_ports.len())
            .sum()
    }
}

// --- Run parameters ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RackSelector {
    Id(u64),
    Name(String),
}

impl fmt::Display for RackSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RackSelector::Id(id) => write!(f, "rack id {}", id),
            RackSelector::Name(name) => write!(f, "rack '{}'", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Html,
    Pdf,
    Csv,
    Configs,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Html,
        OutputFormat::Pdf,
        OutputFormat::Csv,
        OutputFormat::Configs,
    ];

    pub fn defaults() -> Vec<OutputFormat> {
        vec![OutputFormat::Html, OutputFormat::Pdf]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Csv => "csv",
            OutputFormat::Configs => "configs",
        }
    }

    /// Artifact file name for a report stem, e.g. `R1_doku.html`.
    pub fn file_name(&self, stem: &str) -> String {
        match self {
            OutputFormat::Html => format!("{}_doku.html", stem),
            OutputFormat::Pdf => format!("{}_doku.pdf", stem),
            OutputFormat::Csv => format!("{}_cabling.csv", stem),
            OutputFormat::Configs => format!("{}_configs.zip", stem),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        OutputFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown output format '{}' (expected one of: html, pdf, csv, configs)",
                    s
                )
            })
    }
}

/// Turns an arbitrary rack or device name into a safe file-name stem.
///
/// Keeps ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`.
/// Leading dots are dropped so the result can never be `..` or a hidden file.
pub fn sanitize_file_stem(raw: &str, fallback: &str) -> String {
    let replaced: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = replaced.trim_start_matches('.');

    if stem.is_empty() || stem.chars().all(|c| c == '_') {
        fallback.to_string()
    } else {
        stem.to_string()
    }
}
