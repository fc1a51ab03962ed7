use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::error::{Result, VerifyError};
use crate::utils::validation::Validate;

/// Results documents carry this schema version; anything else is rejected.
pub const SUPPORTED_SCHEMA_VERSION: &str = "1.0";

/// Sliding-block analysis method.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Rigid,
    Decoupled,
    Coupled,
}

impl Method {
    pub const ALL: [Method; 3] = [Method::Rigid, Method::Decoupled, Method::Coupled];

    /// Uppercase form used in report headings.
    pub fn label(&self) -> &'static str {
        match self {
            Method::Rigid => "RIGID",
            Method::Decoupled => "DECOUPLED",
            Method::Coupled => "COUPLED",
        }
    }

    /// Rigid-block analyses have no compliant column, so the dynamic site
    /// parameters are not required for them.
    pub fn requires_dynamic_response(&self) -> bool {
        matches!(self, Method::Decoupled | Method::Coupled)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Rigid => "rigid",
            Method::Decoupled => "decoupled",
            Method::Coupled => "coupled",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Method {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rigid" => Ok(Method::Rigid),
            "decoupled" => Ok(Method::Decoupled),
            "coupled" => Ok(Method::Coupled),
            other => Err(VerifyError::InvalidConfigValueError {
                field: "method".to_string(),
                value: other.to_string(),
                reason: "Known methods: rigid, decoupled, coupled".to_string(),
            }),
        }
    }
}

/// Shaking direction of a single analysis pass.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Normal,
    Inverse,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Normal => "normal",
            Direction::Inverse => "inverse",
        };
        write!(f, "{}", name)
    }
}

/// Soil response model for decoupled/coupled analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilMode {
    LinearElastic,
    EquivalentLinear,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundMotionParameters {
    pub earthquake: String,
    pub record_station: String,
    pub target_pga_g: f64,
    pub ground_motion_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub method: Method,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<SoilMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteParameters {
    pub ky_g: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vs_slope_mps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vs_base_mps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damping_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_strain: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultValues {
    pub normal_displacement_cm: f64,
    pub inverse_displacement_cm: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kmax: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vs_final_mps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damping_final: Option<f64>,
}

impl ResultValues {
    pub fn displacement_cm(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Normal => self.normal_displacement_cm,
            Direction::Inverse => self.inverse_displacement_cm,
        }
    }
}

/// One complete test case: inputs plus the displacements they produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub analysis_id: String,
    pub ground_motion_parameters: GroundMotionParameters,
    pub analysis: AnalysisConfig,
    pub site_parameters: SiteParameters,
    pub results: ResultValues,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub source_program: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_extracted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_analyses: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A full results document: reference export or collected candidate run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationData {
    pub schema_version: String,
    pub metadata: RunMetadata,
    pub analyses: Vec<AnalysisRecord>,
}

impl VerificationData {
    pub fn version_string(&self) -> &str {
        self.metadata.source_version.as_deref().unwrap_or("unknown")
    }
}

impl Validate for AnalysisRecord {
    fn validate(&self) -> Result<()> {
        let reject = |message: String| {
            Err(VerifyError::SchemaValidation {
                record: self.analysis_id.clone(),
                message,
            })
        };

        if self.analysis_id.trim().is_empty() {
            return Err(VerifyError::SchemaValidation {
                record: "<blank>".to_string(),
                message: "analysis_id is empty".to_string(),
            });
        }

        if !self.site_parameters.ky_g.is_finite() || self.site_parameters.ky_g < 0.0 {
            return reject(format!("ky_g is not a non-negative number: {}", self.site_parameters.ky_g));
        }

        for (name, value) in [
            ("normal_displacement_cm", self.results.normal_displacement_cm),
            ("inverse_displacement_cm", self.results.inverse_displacement_cm),
        ] {
            if !value.is_finite() || value < 0.0 {
                return reject(format!("{} is not a non-negative number: {}", name, value));
            }
        }

        if self.analysis.method.requires_dynamic_response() {
            for (name, value) in [
                ("height_m", self.site_parameters.height_m),
                ("vs_slope_mps", self.site_parameters.vs_slope_mps),
                ("vs_base_mps", self.site_parameters.vs_base_mps),
                ("damping_ratio", self.site_parameters.damping_ratio),
            ] {
                if value.is_none() {
                    return reject(format!(
                        "{} analyses require site parameter {}",
                        self.analysis.method, name
                    ));
                }
            }
        }

        Ok(())
    }
}

impl Validate for VerificationData {
    fn validate(&self) -> Result<()> {
        if self.schema_version != SUPPORTED_SCHEMA_VERSION {
            return Err(VerifyError::SchemaValidation {
                record: "document".to_string(),
                message: format!(
                    "unsupported schema_version {} (expected {})",
                    self.schema_version, SUPPORTED_SCHEMA_VERSION
                ),
            });
        }

        for record in &self.analyses {
            record.validate()?;
        }

        Ok(())
    }
}

/// A reference record paired with the candidate displacements for the same
/// analysis id.
#[derive(Debug, Clone)]
pub struct PairedResult {
    pub reference: AnalysisRecord,
    pub candidate: ResultValues,
}

/// Everything the comparison stage needs from the extract stage.
#[derive(Debug, Clone)]
pub struct ComparisonInput {
    pub reference_version: String,
    pub candidate_version: String,
    pub pairs: Vec<PairedResult>,
}

/// Tolerance pair applied to one individual comparison.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ToleranceSettings {
    pub relative: f64,
    pub absolute: f64,
}

/// Outcome of comparing one displacement value against its reference.
#[derive(Debug, Clone, Serialize)]
pub struct IndividualComparison {
    pub test_id: String,
    pub method: Method,
    pub direction: Direction,
    pub absolute_error: f64,
    pub relative_error: f64,
    pub percent_difference: f64,
    pub passes: bool,
    pub tolerance: ToleranceSettings,
    pub reference_cm: f64,
    pub candidate_cm: f64,
}

/// Group statistics for one (method, direction) slice. `direction = None`
/// covers both directions together.
#[derive(Debug, Clone, Serialize)]
pub struct GroupStatistics {
    pub method: Method,
    pub direction: Option<Direction>,
    pub samples: usize,
    pub pass_rate: f64,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub passes: bool,
    pub mean_relative_error: f64,
    pub std_relative_error: f64,
    pub max_absolute_error: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodSummary {
    pub total_tests: usize,
    pub passing_tests: usize,
    pub pass_rate: f64,
    pub mean_absolute_error: f64,
    pub mean_relative_error: f64,
}

/// Complete verification result set for one candidate version.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationSummary {
    pub total_tests: usize,
    pub passing_tests: usize,
    pub failing_tests: usize,
    pub overall_pass_rate: f64,
    pub individual: Vec<IndividualComparison>,
    pub groups: Vec<GroupStatistics>,
    pub methods: BTreeMap<Method, MethodSummary>,
}

/// Transform-stage output handed to the load stage.
#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    pub candidate_version: String,
    pub summary: VerificationSummary,
    pub accepted: bool,
    pub failures: Vec<String>,
    pub markdown_report: String,
    pub console_report: String,
    pub csv_export: String,
}
