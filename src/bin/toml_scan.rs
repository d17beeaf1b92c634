use anyhow::Context;
use clap::Parser;
use declscan::domain::ports::ConfigProvider;
use declscan::utils::{logger, validation::Validate};
use declscan::{HeaderPipeline, LocalStorage, ScanEngine, TomlConfig};

#[derive(Parser)]
#[command(name = "declscan-toml")]
#[command(about = "Header scan driven by a TOML configuration file")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "declscan.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the strict setting from the config
    #[arg(long)]
    strict: Option<bool>,

    /// List what would be scanned without running
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-driven header scan");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    if let Some(strict) = args.strict {
        config.rules.get_or_insert_with(Default::default).strict = Some(strict);
        tracing::info!("🔧 strict mode overridden to: {}", strict);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no headers will be parsed");
        for header in config.headers() {
            println!("would scan: {}", header);
        }
        println!(
            "would write: {}/{}",
            config.output_path(),
            config.manifest_name()
        );
        return Ok(());
    }

    let storage = LocalStorage::new(config.scan_root().to_string());
    let pipeline = HeaderPipeline::new(storage, config);
    let engine = ScanEngine::new(pipeline);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Scan completed successfully!");
            println!("✅ Scan completed successfully!");
            println!("📁 Manifest saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Scan failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                declscan::utils::error::ErrorSeverity::Low => 0,
                declscan::utils::error::ErrorSeverity::Medium => 2,
                declscan::utils::error::ErrorSeverity::High => 1,
                declscan::utils::error::ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig) {
    tracing::info!("Scan: {}", config.scan.name);
    if let Some(description) = &config.scan.description {
        tracing::info!("  {}", description);
    }
    tracing::info!("  headers: {}", config.headers().len());
    tracing::info!("  include paths: {}", config.include_paths().len());
    tracing::info!(
        "  output: {}/{}",
        config.output_path(),
        config.manifest_name()
    );
}
