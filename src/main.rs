use clap::Parser;
use slide_verify::utils::{logger, validation::Validate, version};
use slide_verify::{
    LocalStorage, ToleranceConfig, VerificationPipeline, VerifyConfig, VerifyEngine,
};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = VerifyConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting slide-verify");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    // Tolerances: explicit file wins, otherwise the documented defaults.
    let tolerances = if Path::new(&config.config).exists() {
        match ToleranceConfig::from_file(&config.config) {
            Ok(tolerances) => {
                tracing::info!("📋 Loaded tolerances from {}", config.config);
                tolerances
            }
            Err(e) => {
                eprintln!("❌ Failed to load tolerance config '{}': {}", config.config, e);
                eprintln!("💡 {}", e.recovery_suggestion());
                std::process::exit(1);
            }
        }
    } else {
        tracing::info!(
            "📋 Using built-in default tolerances ({} not present)",
            config.config
        );
        ToleranceConfig::default()
    };

    if let Err(e) = tolerances.validate() {
        tracing::error!("❌ Tolerance validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    // Version selection: flag, candidate manifest, git tag, "unknown".
    let manifest_dir = config.candidate_manifest.as_deref().map(Path::new);
    let candidate_version =
        version::detect_candidate_version(config.candidate_version.as_deref(), manifest_dir);
    tracing::info!("🔎 Verifying candidate version {}", candidate_version);

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline =
        VerificationPipeline::new(storage, config, tolerances, candidate_version.clone());
    let engine = VerifyEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(outcome) => {
            println!();
            println!("{}", outcome.console_report);
            println!();

            if outcome.accepted {
                tracing::info!("✅ Verification PASSED for candidate {}", candidate_version);
                println!("✅ Verification PASSED");
                println!("📁 Report saved to: {}", outcome.report_path);
            } else {
                tracing::error!("❌ Verification FAILED for candidate {}", candidate_version);
                eprintln!("❌ Verification FAILED:");
                for failure in &outcome.failures {
                    eprintln!("  - {}", failure);
                }
                eprintln!("📁 Report saved to: {}", outcome.report_path);
                std::process::exit(1);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Verification run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                slide_verify::utils::error::ErrorSeverity::Low => 0,
                slide_verify::utils::error::ErrorSeverity::Medium => 2,
                slide_verify::utils::error::ErrorSeverity::High => 1,
                slide_verify::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
