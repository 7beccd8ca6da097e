use clap::Parser;
use rack_doku::utils::error::ErrorSeverity;
use rack_doku::utils::{logger, validation::Validate};
use rack_doku::{CliConfig, DcimClient, LocalStorage, RackPipeline, ReportEngine, ReportSettings};

fn print_dry_run(settings: &ReportSettings) {
    println!("🧪 Dry run, nothing will be fetched or written");
    println!("   NetBox:   {}", settings.dcim.url);
    println!("   Token:    <redacted>");
    println!("   TLS:      {}", if settings.dcim.insecure_tls { "unverified" } else { "verified" });
    println!("   Timeout:  {}s", settings.dcim.timeout_seconds);
    println!("   Rack:     {}", settings.rack);
    println!("   Output:   {}", settings.output_path);
    let formats: Vec<&str> = settings.formats.iter().map(|f| f.as_str()).collect();
    println!("   Formats:  {}", formats.join(", "));
    println!(
        "   Template: {}",
        settings.template_path.as_deref().unwrap_or("<built-in>")
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting rack-doku");

    let settings = match cli.resolve().and_then(|s| s.validate().map(|_| s)) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    tracing::debug!("Resolved settings: {:?}", settings);

    if cli.dry_run {
        print_dry_run(&settings);
        return Ok(());
    }

    let monitor_enabled = settings.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let client = match DcimClient::new(&settings.dcim) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    let storage = LocalStorage::new(settings.output_path.clone());
    let pipeline = RackPipeline::new(client, storage, settings);
    let engine = ReportEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(written) => {
            tracing::info!("✅ Rack documentation completed");
            println!("✅ Rack documentation completed");
            for path in &written {
                println!("📁 {}", path);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Report run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
