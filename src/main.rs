use std::time::Duration;

use clap::Parser;
use geoexport::core::engine;
use geoexport::utils::error::{ErrorSeverity, ExportError};
use geoexport::utils::{logger, validation::Validate};
use geoexport::{CliConfig, CovariatePipeline, ExportConfig, ExportEngine, HttpPlatform, HttpPlatformOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting geoexport");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match ExportConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }

    tracing::info!(
        "Exporting {} covariate(s) for '{}' at {} m into '{}'",
        config.covariates.len(),
        config.country,
        config.res_scale,
        config.folder
    );

    let platform = HttpPlatform::new(
        &config.endpoint,
        HttpPlatformOptions {
            request_timeout: config.request_timeout,
            max_retries: config.retry_attempts,
            token: config.token.clone(),
        },
    )?;

    let pipeline = CovariatePipeline::new(platform.clone(), config);
    let engine = ExportEngine::new(pipeline);

    let tasks = match engine.run().await {
        Ok(tasks) => tasks,
        Err(e) => exit_with(&e),
    };

    println!("✅ Submitted {} export task(s)", tasks.len());
    for task in &tasks {
        println!("   {} → {}", task.description, task.id);
    }

    if cli.wait {
        tracing::info!("🔍 Watching export tasks until completion");
        let poll_interval = Duration::from_secs(cli.poll_interval_seconds);
        let timeout = Duration::from_secs(cli.timeout_minutes * 60);

        match engine::watch(&platform, tasks, poll_interval, timeout).await {
            Ok(completed) => {
                println!("✅ All {} export task(s) completed", completed.len());
            }
            Err(e) => exit_with(&e),
        }
    }

    Ok(())
}

fn exit_with(e: &ExportError) -> ! {
    tracing::error!("❌ Export run failed: {}", e);
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
