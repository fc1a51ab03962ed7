pub mod cli;
pub mod tolerance;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "slide-verify")]
#[command(about = "Verify candidate sliding-block displacement results against reference data")]
pub struct VerifyConfig {
    /// Candidate version to verify; detected from the manifest or git when omitted
    #[arg(long)]
    pub candidate_version: Option<String>,

    /// Tolerance configuration file (built-in defaults are used when absent)
    #[arg(long, default_value = "verification.toml")]
    pub config: String,

    /// Verification data root holding results/ and cache/
    #[arg(long, default_value = "./verification_data")]
    pub data_dir: String,

    /// Directory for the generated report, CSV export and summary
    #[arg(long, default_value = "./verification_data/results")]
    pub output_path: String,

    /// Restrict verification to these methods (rigid, decoupled, coupled)
    #[arg(long, value_delimiter = ',')]
    pub methods: Vec<String>,

    /// Candidate crate directory used for version detection
    #[arg(long)]
    pub candidate_manifest: Option<String>,

    #[arg(long, help = "List passed tests in the console report as well")]
    pub include_passed: bool,

    #[arg(long, help = "Bundle report, CSV and summary into a zip archive")]
    pub bundle: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Enable system monitoring")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for VerifyConfig {
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
        self.include_passed
    }

    fn bundle(&self) -> bool {
        self.bundle
    }
}

#[cfg(feature = "cli")]
impl crate::utils::validation::Validate for VerifyConfig {
    fn validate(&self) -> crate::utils::error::Result<()> {
        use crate::utils::validation;
        use std::str::FromStr;

        validation::validate_path("data_dir", &self.data_dir)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_path("config", &self.config)?;

        if let Some(version) = &self.candidate_version {
            validation::validate_version_string("candidate_version", version)?;
        }

        for method in &self.methods {
            crate::domain::model::Method::from_str(method)?;
        }

        Ok(())
    }
}
