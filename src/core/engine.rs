use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::ResourceMonitor;

pub struct ReportEngine<P: Pipeline> {
    pipeline: P,
    monitor: ResourceMonitor,
}

impl<P: Pipeline> ReportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: ResourceMonitor::new(monitor_enabled),
        }
    }

    /// Runs extract, transform and load in order and returns the written paths.
    pub async fn run(&self) -> Result<Vec<String>> {
        tracing::info!("🚀 Starting rack documentation run");
        self.monitor.log_phase("start");

        tracing::info!("📡 Fetching inventory...");
        let snapshot = self.pipeline.extract().await?;
        tracing::info!(
            "📊 Fetched rack {} with {} devices",
            snapshot.rack_id,
            snapshot.devices.len()
        );
        self.monitor.log_phase("extract");

        tracing::info!("🔄 Aggregating ports...");
        let report = self.pipeline.transform(snapshot).await?;
        tracing::info!(
            "✅ Aggregated {} ports across {} devices",
            report.port_count(),
            report.devices.len()
        );
        self.monitor.log_phase("transform");

        tracing::info!("💾 Writing documents...");
        let written = self.pipeline.load(report).await?;
        for path in &written {
            tracing::info!("📁 Output saved to: {}", path);
        }
        self.monitor.log_phase("load");
        self.monitor.log_summary();

        Ok(written)
    }
}
