use clap::Parser;
use housing_forecast::core::report::console_summary;
use housing_forecast::core::ConfigProvider;
use housing_forecast::utils::{logger, validation::Validate};
use housing_forecast::{AnalysisEngine, HousingPipeline, LocalStorage, TomlConfig, FORECAST_HORIZON};

#[derive(Parser)]
#[command(name = "toml-forecast")]
#[command(about = "Housing price forecast driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "forecast-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the region from config
    #[arg(long)]
    region: Option<String>,

    /// Dry run - validate the config and show the plan without reading data
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌，--verbose 優先於設定檔
    if args.verbose {
        logger::init_cli_logger(true);
    } else {
        logger::init_configured_logger(config.log_level(), config.json_logs());
    }

    tracing::info!("🚀 Starting TOML-based housing forecast");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 套用命令列覆蓋設定
    if let Some(region) = &args.region {
        config.analysis.region = Some(region.clone());
        tracing::info!("🔧 Region overridden to: {}", region);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code().max(1));
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config);
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let sink = LocalStorage::new(config.output_path().to_string());
    let pipeline = HousingPipeline::new(LocalStorage::current_dir(), sink, config);
    let engine = AnalysisEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(outcome) => {
            print!("{}", console_summary(&outcome.result));
            println!("✅ Analysis completed successfully!");
            println!("📁 Report saved to: {}", outcome.output.report_path);
            if let Some(model_path) = &outcome.output.model_path {
                println!("📁 Model saved to: {}", model_path);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Analysis failed: {} (Category: {:?}, Severity: {:?})",
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

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Pipeline: {} v{}",
        config.pipeline.name, config.pipeline.version
    );
    println!("  Dataset: {}", config.input_path());
    println!(
        "  Region: {}",
        config.region().unwrap_or("(first region in dataset)")
    );
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.output_formats().join(", "));

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📡 Dataset:");
    println!("  Path: {}", config.input_path());
    println!(
        "  Delimiter: {}",
        match config.delimiter() {
            b'\t' => "tab".to_string(),
            d => format!("'{}'", d as char),
        }
    );
    println!("  Required columns: place_name, yr, period, index_nsa, index_sa");

    println!();
    println!("⚙️ Analysis:");
    println!(
        "  Region: {}",
        config.region().unwrap_or("(first region in dataset)")
    );
    println!("  Top regions: {}", config.top_regions());
    println!("  Forecast horizon: {} months", FORECAST_HORIZON);

    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", config.output_path());
    println!("  Report: {}", config.report_filename());
    println!("  Model: {}", config.model_filename());
    println!("  Formats: {}", config.output_formats().join(", "));
    println!("  Compression: {}", config.compression());

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
