use crate::adapters::archive::build_config_archive;
use crate::adapters::cabling::render_cabling_csv;
use crate::adapters::html::HtmlRenderer;
use crate::adapters::pdf::render_pdf;
use crate::core::aggregate::aggregate;
use crate::core::{ConfigProvider, InventorySource, Pipeline, RackReport, RackSnapshot, Storage};
use crate::domain::model::{
    sanitize_file_stem, DeviceInventory, Elevation, OutputFormat, RackFace, RackSelector,
    RenderedConfig,
};
use crate::utils::error::{ReportError, Result};

pub struct RackPipeline<D: InventorySource, S: Storage, C: ConfigProvider> {
    pub(crate) source: D,
    pub(crate) storage: S,
    pub(crate) config: C,
}

impl<D: InventorySource, S: Storage, C: ConfigProvider> RackPipeline<D, S, C> {
    pub fn new(source: D, storage: S, config: C) -> Self {
        Self {
            source,
            storage,
            config,
        }
    }

    async fn resolve_rack_id(&self) -> Result<u64> {
        match self.config.rack() {
            RackSelector::Id(id) => Ok(*id),
            RackSelector::Name(name) => {
                let id = self.source.rack_id_by_name(name).await?.ok_or_else(|| {
                    ReportError::MissingData {
                        resource: format!("rack lookup '{}'", name),
                    }
                })?;
                tracing::info!("🔎 Rack '{}' resolved to id {}", name, id);
                Ok(id)
            }
        }
    }

    async fn fetch_rendered_configs(
        &self,
        devices: &[crate::domain::model::Device],
    ) -> Result<Vec<RenderedConfig>> {
        let mut configs = Vec::new();

        for device in devices.iter().filter(|d| d.config_template.is_some()) {
            let device_name = device
                .name
                .clone()
                .unwrap_or_else(|| format!("device-{}", device.id));

            match self.source.rendered_config(device.id).await? {
                Some(content) => configs.push(RenderedConfig {
                    device_id: device.id,
                    device_name,
                    content,
                }),
                None => tracing::warn!("Skipping rendered config of {}", device_name),
            }
        }

        Ok(configs)
    }
}

#[async_trait::async_trait]
impl<D: InventorySource, S: Storage, C: ConfigProvider> Pipeline for RackPipeline<D, S, C> {
    async fn extract(&self) -> Result<RackSnapshot> {
        let rack_id = self.resolve_rack_id().await?;

        let rack_name = match self.source.rack(rack_id).await? {
            Some(rack) => Some(rack.name),
            None => {
                tracing::warn!(
                    "Rack {} name unavailable, using '{}'",
                    rack_id,
                    self.config.default_report_name()
                );
                None
            }
        };

        let elevation = Elevation {
            front: self.source.rack_elevation(rack_id, RackFace::Front).await?,
            rear: self.source.rack_elevation(rack_id, RackFace::Rear).await?,
        };

        let devices = self
            .source
            .devices_by_rack(rack_id)
            .await?
            .ok_or_else(|| ReportError::MissingData {
                resource: format!("devices of rack {}", rack_id),
            })?;
        tracing::debug!("Rack {} holds {} devices", rack_id, devices.len());

        let rendered_configs = if self.config.wants(OutputFormat::Configs) {
            self.fetch_rendered_configs(&devices).await?
        } else {
            Vec::new()
        };

        let mut inventory = Vec::with_capacity(devices.len());
        for device in devices {
            let Some(name) = device.name.as_deref() else {
                tracing::debug!("Skipping unnamed device {}", device.id);
                continue;
            };

            let interfaces = self
                .source
                .interfaces_by_device(device.id)
                .await?
                .ok_or_else(|| ReportError::MissingData {
                    resource: format!("interfaces of device '{}'", name),
                })?;
            let front_ports = self
                .source
                .front_ports_by_device(device.id)
                .await?
                .ok_or_else(|| ReportError::MissingData {
                    resource: format!("front ports of device '{}'", name),
                })?;

            inventory.push(DeviceInventory {
                device,
                interfaces,
                front_ports,
            });
        }

        Ok(RackSnapshot {
            rack_id,
            rack_name,
            elevation,
            devices: inventory,
            rendered_configs,
        })
    }

    async fn transform(&self, data: RackSnapshot) -> Result<RackReport> {
        let devices = aggregate(&data.devices)?;

        let file_stem = match &data.rack_name {
            Some(name) => sanitize_file_stem(name, self.config.default_report_name()),
            None => self.config.default_report_name().to_string(),
        };

        Ok(RackReport {
            rack_id: data.rack_id,
            rack_name: data.rack_name,
            file_stem,
            elevation: data.elevation,
            devices,
            rendered_configs: data.rendered_configs,
        })
    }

    async fn load(&self, report: RackReport) -> Result<Vec<String>> {
        // Render everything first so a failure never leaves a partial set behind.
        let html = if self.config.wants(OutputFormat::Html) || self.config.wants(OutputFormat::Pdf)
        {
            HtmlRenderer::new(self.config.template_path())?.render(&report)?
        } else {
            String::new()
        };

        let mut artifacts: Vec<(String, Vec<u8>)> = Vec::new();
        for format in self.config.output_formats() {
            let bytes = match format {
                OutputFormat::Html => html.clone().into_bytes(),
                OutputFormat::Pdf => render_pdf(&html)?,
                OutputFormat::Csv => render_cabling_csv(&report.devices)?,
                OutputFormat::Configs => {
                    if report.rendered_configs.is_empty() {
                        tracing::info!("No device in this rack has a config template");
                        continue;
                    }
                    build_config_archive(&report.rendered_configs)?
                }
            };
            artifacts.push((format.file_name(&report.file_stem), bytes));
        }

        self.storage.write_all(&artifacts).await
    }
}
