use anyhow::Context;
use calcfu::core::grouping::{effective_group_size, group_records};
use calcfu::core::{ConfigProvider, Pipeline};
use calcfu::utils::{logger, validation::Validate};
use calcfu::{EtlEngine, LocalStorage, ReportPipeline, TomlConfig};
use clap::Parser;

#[derive(Parser)]
#[command(name = "toml-calcfu")]
#[command(about = "CFU calculation driven by a TOML run file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "calcfu.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Read and group the report without calculating or writing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    let verbose = args.verbose || config.verbose();
    if config.json_logs() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("🚀 Starting TOML-based CFU run '{}'", config.run.name);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    display_config_summary(&config, &args);

    let storage = LocalStorage::new(".");
    let pipeline = ReportPipeline::new(storage, config.clone());

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be written");
        let records = pipeline.extract().await?;
        let plates = records.len();
        let size = effective_group_size(config.report_format(), config.group_size());
        let groups = group_records(records, size);
        println!("🔍 {} plates would form {} groups:", plates, groups.len());
        for group in &groups {
            let ids: Vec<&str> = group.iter().map(|r| r.sample_id.as_str()).collect();
            println!("  {}", ids.join(", "));
        }
        return Ok(());
    }

    let engine = EtlEngine::new(pipeline);
    match engine.run().await {
        Ok(summary) => {
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
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Run: {}", config.run.name);
    if let Some(description) = &config.run.description {
        println!("  Description: {}", description);
    }
    println!("  Input: {} ({:?})", config.input_path(), config.report_format());
    if let Some(plate_type) = config.plate_type() {
        println!("  Plate type: {}", plate_type);
    }
    println!("  Weighed: {}", config.weighed());
    match effective_group_size(config.report_format(), config.group_size()) {
        0 => println!("  Grouping: by sample id"),
        n => println!("  Grouping: every {} plates", n),
    }
    if !config.dilutions().is_empty() {
        println!("  Dilutions: {:?}", config.dilutions());
    }
    println!(
        "  Estimate: {:?}, {} significant digits",
        config.report_mode(),
        config.significant_digits()
    );
    println!("  Output: {} ({:?})", config.output_path(), config.output_format());
    println!("  On group error: {}", config.on_group_error());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}
