use clap::Parser;
use housing_forecast::core::report::console_summary;
use housing_forecast::utils::{logger, validation::Validate};
use housing_forecast::{AnalysisEngine, CliConfig, HousingPipeline, LocalStorage};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting housing-forecast CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code().max(1));
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 建立儲存與管道
    let sink = LocalStorage::new(config.output_path.clone());
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
