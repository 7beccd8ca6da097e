use crate::domain::model::{
    Device, FrontPort, Interface, OutputFormat, Rack, RackFace, RackReport, RackSelector,
    RackSnapshot,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    /// Writes every `(name, bytes)` pair or none of them.
    ///
    /// Returns the full paths written, in input order.
    fn write_all(
        &self,
        files: &[(String, Vec<u8>)],
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

/// Read access to the DCIM inventory.
///
/// `Ok(None)` means the API answered with something other than 200; transport
/// and decode failures are errors.
pub trait InventorySource: Send + Sync {
    fn rack_id_by_name(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<u64>>> + Send;
    fn rack(&self, rack_id: u64) -> impl std::future::Future<Output = Result<Option<Rack>>> + Send;
    fn rack_elevation(
        &self,
        rack_id: u64,
        face: RackFace,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
    fn devices_by_rack(
        &self,
        rack_id: u64,
    ) -> impl std::future::Future<Output = Result<Option<Vec<Device>>>> + Send;
    fn interfaces_by_device(
        &self,
        device_id: u64,
    ) -> impl std::future::Future<Output = Result<Option<Vec<Interface>>>> + Send;
    fn front_ports_by_device(
        &self,
        device_id: u64,
    ) -> impl std::future::Future<Output = Result<Option<Vec<FrontPort>>>> + Send;
    fn rendered_config(
        &self,
        device_id: u64,
    ) -> impl std::future::Future<Output = Result<Option<Vec<u8>>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn rack(&self) -> &RackSelector;
    fn output_formats(&self) -> &[OutputFormat];
    fn default_report_name(&self) -> &str;
    fn template_path(&self) -> Option<&str>;

    fn wants(&self, format: OutputFormat) -> bool {
        self.output_formats().contains(&format)
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<RackSnapshot>;
    async fn transform(&self, data: RackSnapshot) -> Result<RackReport>;
    async fn load(&self, report: RackReport) -> Result<Vec<String>>;
}
