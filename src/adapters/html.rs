use crate::domain::model::{RackReport, ReportDevice};
use crate::utils::error::Result;
use serde::Serialize;
use std::path::Path;
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "rack_report.html";
const BUILTIN_TEMPLATE: &str = include_str!("../../templates/rack_report.html.tera");

#[derive(Serialize)]
struct ReportView<'a> {
    title: String,
    rack_id: u64,
    rack_name: Option<&'a str>,
    rack_front: Option<&'a str>,
    rack_rear: Option<&'a str>,
    devices: &'a [ReportDevice],
    device_count: usize,
    port_count: usize,
}

/// Renders a [`RackReport`] to a standalone HTML document.
///
/// Values are HTML-escaped; the elevation SVGs are inserted verbatim.
pub struct HtmlRenderer {
    tera: Tera,
}

impl HtmlRenderer {
    pub fn builtin() -> Result<Self> {
        Self::from_source(BUILTIN_TEMPLATE)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_source(&source)
    }

    /// Uses `template_path` when given, the built-in layout otherwise.
    pub fn new(template_path: Option<&str>) -> Result<Self> {
        match template_path {
            Some(path) => {
                tracing::debug!("Using custom report template {}", path);
                Self::from_file(path)
            }
            None => Self::builtin(),
        }
    }

    fn from_source(source: &str) -> Result<Self> {
        let mut tera = Tera::default();
        // The .html suffix in the name keeps Tera's autoescaping on.
        tera.add_raw_template(TEMPLATE_NAME, source)?;
        Ok(Self { tera })
    }

    pub fn render(&self, report: &RackReport) -> Result<String> {
        let view = ReportView {
            title: report.title(),
            rack_id: report.rack_id,
            rack_name: report.rack_name.as_deref(),
            rack_front: report.elevation.front.as_deref(),
            rack_rear: report.elevation.rear.as_deref(),
            devices: &report.devices,
            device_count: report.devices.len(),
            port_count: report.port_count(),
        };

        let context = Context::from_serialize(&view)?;
        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }
}
