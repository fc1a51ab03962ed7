use anyhow::Context;
use clap::Parser;
use slide_verify::core::{ConfigProvider, Pipeline};
use slide_verify::utils::{logger, version};
use slide_verify::{LocalStorage, ToleranceConfig, VerificationPipeline};
use std::path::Path;

#[derive(Parser)]
#[command(name = "gen-report")]
#[command(about = "Regenerate the Markdown verification report from existing result files")]
struct Args {
    /// Candidate version to report on; detected when omitted
    #[arg(long)]
    candidate_version: Option<String>,

    /// Candidate crate directory used for version detection
    #[arg(long)]
    candidate_manifest: Option<String>,

    /// Tolerance configuration file (built-in defaults are used when absent)
    #[arg(long, default_value = "verification.toml")]
    config: String,

    /// Verification data root holding results/
    #[arg(long, default_value = "./verification_data")]
    data_dir: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

struct ReportConfig {
    data_dir: String,
    output_path: String,
    methods: Vec<String>,
}

impl ConfigProvider for ReportConfig {
    fn data_dir(&self) -> &str {
        &self.data_dir
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn methods(&self) -> &[String] {
        &self.methods
    }

    fn include_passed(&self) -> bool {
        false
    }

    fn bundle(&self) -> bool {
        false
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    let manifest_dir = args.candidate_manifest.as_deref().map(Path::new);
    let candidate_version =
        version::detect_candidate_version(args.candidate_version.as_deref(), manifest_dir);
    tracing::info!("📝 Regenerating report for candidate {}", candidate_version);

    let tolerances = if Path::new(&args.config).exists() {
        ToleranceConfig::from_file(&args.config)
            .with_context(|| format!("loading tolerance config {}", args.config))?
    } else {
        ToleranceConfig::default()
    };

    let output_path = format!("{}/results", args.data_dir);
    let config = ReportConfig {
        data_dir: args.data_dir,
        output_path: output_path.clone(),
        methods: vec![],
    };

    let storage = LocalStorage::new(output_path);
    let pipeline = VerificationPipeline::new(storage, config, tolerances, candidate_version);

    let input = pipeline.extract().await.context("loading result sets")?;
    let outcome = pipeline
        .transform(input)
        .await
        .context("comparing result sets")?;
    let report_path = pipeline.load(outcome).await.context("writing report")?;

    println!("✅ Report generated: {}", report_path);
    Ok(())
}
