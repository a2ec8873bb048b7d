use calcfu::core::ConfigProvider;
use calcfu::utils::{logger, validation::Validate};
use calcfu::{CliConfig, EtlEngine, LocalStorage, ReportPipeline};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting calcfu CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    tracing::info!(
        "Reading {} (group size {}, {} significant digits)",
        config.input_path(),
        config.group_size(),
        config.significant_digits()
    );

    let storage = LocalStorage::new(".");
    let pipeline = ReportPipeline::new(storage, config);
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(summary) => {
            tracing::info!("✅ Calculated {} plate groups", summary.groups);
            if summary.failed_groups > 0 {
                tracing::warn!("{} groups could not be calculated", summary.failed_groups);
            }
            println!(
                "✅ {} plates in {} groups ({} failed)",
                summary.plates, summary.groups, summary.failed_groups
            );
            println!("📁 Results saved to: {}", summary.output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ CFU calculation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
