use crate::domain::model::{sanitize_file_stem, RenderedConfig};
use crate::utils::error::Result;
use std::collections::HashSet;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

/// Packs rendered device configs into a ZIP, one `<device>.conf` entry per device.
///
/// Names that collide after sanitizing get the device id appended.
pub fn build_config_archive(configs: &[RenderedConfig]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let mut used = HashSet::new();

    for config in configs {
        let stem = sanitize_file_stem(
            &config.device_name,
            &format!("device-{}", config.device_id),
        );
        let mut entry = format!("{}.conf", stem);
        if !used.insert(entry.clone()) {
            entry = format!("{}-{}.conf", stem, config.device_id);
            used.insert(entry.clone());
        }

        tracing::debug!("Adding {} ({} bytes) to config archive", entry, config.content.len());
        zip.start_file::<_, ()>(entry, FileOptions::default())?;
        zip.write_all(&config.content)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
