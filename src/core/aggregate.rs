//! Joins devices, their ports and cabling into the report model.

use crate::domain::model::{CableLink, DeviceInventory, Port, PortEntry, ReportDevice};
use crate::utils::error::{ReportError, Result};

/// Maps one raw port of `device` to its report entry.
///
/// A port without a cable, or with an unlabelled cable, gets no link at all, so
/// stale link-peer data never appears next to an unpatched port. A labelled cable
/// must resolve to a peer port and a peer device; anything less is `MissingData`.
pub fn port_entry(device: &str, port: &Port) -> Result<PortEntry> {
    let Some(label) = port.cable.as_ref().and_then(|cable| cable.label.as_ref()) else {
        return Ok(PortEntry {
            name: port.name.clone(),
            link: None,
        });
    };

    let peer = port.link_peers.first();
    let peer_names = peer.and_then(|p| Some((p.port_name()?, p.device_name()?)));
    let Some((peer, peer_device)) = peer_names else {
        return Err(ReportError::MissingData {
            resource: format!(
                "link peer of cable '{}' on {} port '{}'",
                label, device, port.name
            ),
        });
    };

    Ok(PortEntry {
        name: port.name.clone(),
        link: Some(CableLink {
            label: label.clone(),
            peer: peer.to_string(),
            peer_device: peer_device.to_string(),
        }),
    })
}

fn port_entries(device: &str, ports: &[Port]) -> Result<Vec<PortEntry>> {
    ports.iter().map(|port| port_entry(device, port)).collect()
}

/// One `ReportDevice` per named device, in input order.
pub fn aggregate(inventory: &[DeviceInventory]) -> Result<Vec<ReportDevice>> {
    let mut devices = Vec::with_capacity(inventory.len());

    for entry in inventory {
        let Some(name) = entry.device.name.as_ref() else {
            continue;
        };
        devices.push(ReportDevice {
            name: name.clone(),
            id: entry.device.id,
            interfaces: port_entries(name, &entry.interfaces)?,
            front_ports: port_entries(name, &entry.front_ports)?,
        });
    }

    Ok(devices)
}
