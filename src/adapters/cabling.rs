use crate::domain::model::{PortEntry, ReportDevice};
use crate::utils::error::{ReportError, Result};
use serde::Serialize;

const HEADER: [&str; 7] = [
    "device",
    "device_id",
    "kind",
    "port",
    "cable",
    "peer",
    "peer_device",
];

#[derive(Serialize)]
struct CablingRow<'a> {
    device: &'a str,
    device_id: u64,
    kind: &'static str,
    port: &'a str,
    cable: Option<&'a str>,
    peer: Option<&'a str>,
    peer_device: Option<&'a str>,
}

impl<'a> CablingRow<'a> {
    fn new(device: &'a ReportDevice, kind: &'static str, port: &'a PortEntry) -> Self {
        let link = port.link.as_ref();
        Self {
            device: &device.name,
            device_id: device.id,
            kind,
            port: &port.name,
            cable: link.map(|l| l.label.as_str()),
            peer: link.map(|l| l.peer.as_str()),
            peer_device: link.map(|l| l.peer_device.as_str()),
        }
    }
}

/// Flat cabling table, one row per interface or front port, in report order.
pub fn render_cabling_csv(devices: &[ReportDevice]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(HEADER)?;

    for device in devices {
        for port in &device.interfaces {
            writer.serialize(CablingRow::new(device, "interface", port))?;
        }
        for port in &device.front_ports {
            writer.serialize(CablingRow::new(device, "front_port", port))?;
        }
    }

    writer
        .into_inner()
        .map_err(|e| ReportError::Io(e.into_error()))
}
