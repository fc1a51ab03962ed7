use anyhow::Context;
use clap::Parser;
use slide_verify::core::runner;
use slide_verify::core::Method;
use slide_verify::utils::logger;
use slide_verify::DataManager;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "collect-results")]
#[command(about = "Collect cached candidate analysis results into a versioned results file")]
struct Args {
    /// Candidate version the cached results were computed with
    #[arg(short, long)]
    version: String,

    /// Verification data root holding results/ and cache/
    #[arg(long, default_value = "./verification_data")]
    data_dir: String,

    /// Restrict collection to these methods (rigid, decoupled, coupled)
    #[arg(long, value_delimiter = ',')]
    methods: Vec<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);
    tracing::info!("🚀 Collecting cached results for candidate {}", args.version);

    let methods = args
        .methods
        .iter()
        .map(|m| Method::from_str(m))
        .collect::<slide_verify::Result<Vec<_>>>()
        .context("invalid --methods filter")?;

    let data = DataManager::new(args.data_dir.as_str());
    let output = runner::collect_results(&data, &args.version, &methods)
        .with_context(|| format!("collecting cached results for version {}", args.version))?;

    println!("✅ Collected results written to {}", output.display());
    Ok(())
}
