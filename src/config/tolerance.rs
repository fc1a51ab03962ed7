use crate::domain::model::{Method, ToleranceSettings};
use crate::utils::error::{Result, VerifyError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_RELATIVE: f64 = 0.05;
pub const DEFAULT_ABSOLUTE_CM: f64 = 1.0;
pub const DEFAULT_PASS_RATE_PCT: f64 = 95.0;
pub const DEFAULT_R_SQUARED_MIN: f64 = 0.99;
pub const DEFAULT_SLOPE_MIN: f64 = 0.99;
pub const DEFAULT_SLOPE_MAX: f64 = 1.01;
pub const DEFAULT_INTERCEPT_MIN_CM: f64 = -0.1;
pub const DEFAULT_INTERCEPT_MAX_CM: f64 = 0.1;
pub const DEFAULT_SMALL_DISPLACEMENT_THRESHOLD_CM: f64 = 0.5;
pub const DEFAULT_SMALL_DISPLACEMENT_ABSOLUTE_CM: f64 = 0.1;
pub const DEFAULT_ADDITIONAL_OUTPUT_RELATIVE: f64 = 0.05;

/// Secondary engine outputs checked with a plain relative tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdditionalOutput {
    Kmax,
    Vs,
    Damping,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToleranceConfig {
    #[serde(default)]
    pub tolerances: Tolerances,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tolerances {
    pub default_relative: Option<f64>,
    pub default_absolute: Option<f64>,
    pub percent_passing_individual_tests: Option<f64>,
    pub lin_regression_r_squared_min: Option<f64>,
    pub lin_regression_slope_min: Option<f64>,
    pub lin_regression_slope_max: Option<f64>,
    pub lin_regression_intercept_min: Option<f64>,
    pub lin_regression_intercept_max: Option<f64>,
    pub method_specific: Option<HashMap<String, MethodTolerances>>,
    pub value_dependent: Option<ValueDependentTolerances>,
    pub additional_outputs: Option<AdditionalOutputTolerances>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MethodTolerances {
    pub relative: Option<f64>,
    pub absolute: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValueDependentTolerances {
    pub small_displacement_threshold: Option<f64>,
    pub small_displacement_absolute: Option<f64>,
    /// TOML `inf` disables the relative check below the threshold.
    pub small_displacement_relative: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdditionalOutputTolerances {
    pub kmax_relative: Option<f64>,
    pub vs_relative: Option<f64>,
    pub damping_relative: Option<f64>,
}

impl ToleranceConfig {
    /// Load tolerances from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(VerifyError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parse tolerances from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| VerifyError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR_NAME}` placeholders with environment values.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn default_relative(&self) -> f64 {
        self.tolerances.default_relative.unwrap_or(DEFAULT_RELATIVE)
    }

    pub fn default_absolute(&self) -> f64 {
        self.tolerances
            .default_absolute
            .unwrap_or(DEFAULT_ABSOLUTE_CM)
    }

    pub fn pass_rate_threshold(&self) -> f64 {
        self.tolerances
            .percent_passing_individual_tests
            .unwrap_or(DEFAULT_PASS_RATE_PCT)
    }

    pub fn r_squared_min(&self) -> f64 {
        self.tolerances
            .lin_regression_r_squared_min
            .unwrap_or(DEFAULT_R_SQUARED_MIN)
    }

    pub fn slope_bounds(&self) -> (f64, f64) {
        (
            self.tolerances
                .lin_regression_slope_min
                .unwrap_or(DEFAULT_SLOPE_MIN),
            self.tolerances
                .lin_regression_slope_max
                .unwrap_or(DEFAULT_SLOPE_MAX),
        )
    }

    pub fn intercept_bounds(&self) -> (f64, f64) {
        (
            self.tolerances
                .lin_regression_intercept_min
                .unwrap_or(DEFAULT_INTERCEPT_MIN_CM),
            self.tolerances
                .lin_regression_intercept_max
                .unwrap_or(DEFAULT_INTERCEPT_MAX_CM),
        )
    }

    pub fn small_displacement_threshold(&self) -> f64 {
        self.tolerances
            .value_dependent
            .as_ref()
            .and_then(|v| v.small_displacement_threshold)
            .unwrap_or(DEFAULT_SMALL_DISPLACEMENT_THRESHOLD_CM)
    }

    pub fn small_displacement_absolute(&self) -> f64 {
        self.tolerances
            .value_dependent
            .as_ref()
            .and_then(|v| v.small_displacement_absolute)
            .unwrap_or(DEFAULT_SMALL_DISPLACEMENT_ABSOLUTE_CM)
    }

    fn small_displacement_relative(&self) -> f64 {
        self.tolerances
            .value_dependent
            .as_ref()
            .and_then(|v| v.small_displacement_relative)
            .unwrap_or(f64::INFINITY)
    }

    /// Tolerances for one comparison, given the expected displacement.
    ///
    /// Method-specific overrides replace the defaults; below the small
    /// displacement threshold the value-dependent pair takes over and the
    /// relative bound is usually `inf`.
    pub fn tolerance_for(&self, method: Method, expected_cm: Option<f64>) -> ToleranceSettings {
        let method_overrides = self
            .tolerances
            .method_specific
            .as_ref()
            .and_then(|m| m.get(&method.to_string()));

        let mut relative = method_overrides
            .and_then(|m| m.relative)
            .unwrap_or_else(|| self.default_relative());
        let mut absolute = method_overrides
            .and_then(|m| m.absolute)
            .unwrap_or_else(|| self.default_absolute());

        if let Some(expected) = expected_cm {
            if expected <= self.small_displacement_threshold() {
                relative = self.small_displacement_relative();
                absolute = self.small_displacement_absolute();
            }
        }

        ToleranceSettings { relative, absolute }
    }

    pub fn additional_output_tolerance(&self, output: AdditionalOutput) -> f64 {
        let outputs = self.tolerances.additional_outputs.as_ref();
        let configured = match output {
            AdditionalOutput::Kmax => outputs.and_then(|o| o.kmax_relative),
            AdditionalOutput::Vs => outputs.and_then(|o| o.vs_relative),
            AdditionalOutput::Damping => outputs.and_then(|o| o.damping_relative),
        };
        configured.unwrap_or(DEFAULT_ADDITIONAL_OUTPUT_RELATIVE)
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_range(
            "tolerances.percent_passing_individual_tests",
            self.pass_rate_threshold(),
            0.0,
            100.0,
        )?;
        validation::validate_range(
            "tolerances.lin_regression_r_squared_min",
            self.r_squared_min(),
            0.0,
            1.0,
        )?;

        let (slope_min, slope_max) = self.slope_bounds();
        validation::validate_ordered_bounds("tolerances.lin_regression_slope", slope_min, slope_max)?;

        let (intercept_min, intercept_max) = self.intercept_bounds();
        validation::validate_ordered_bounds(
            "tolerances.lin_regression_intercept",
            intercept_min,
            intercept_max,
        )?;

        validation::validate_non_negative("tolerances.default_absolute", self.default_absolute())?;
        validation::validate_non_negative(
            "tolerances.value_dependent.small_displacement_threshold",
            self.small_displacement_threshold(),
        )?;
        validation::validate_non_negative(
            "tolerances.value_dependent.small_displacement_absolute",
            self.small_displacement_absolute(),
        )?;

        // Relative tolerances may legitimately be `inf`, so only NaN and
        // negative values are rejected.
        for (field, value) in [
            ("tolerances.default_relative", self.default_relative()),
            (
                "tolerances.value_dependent.small_displacement_relative",
                self.small_displacement_relative(),
            ),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(VerifyError::InvalidConfigValueError {
                    field: field.to_string(),
                    value: value.to_string(),
                    reason: "Relative tolerance must be non-negative".to_string(),
                });
            }
        }

        if let Some(method_specific) = &self.tolerances.method_specific {
            for (method, overrides) in method_specific {
                method.parse::<Method>()?;

                if let Some(relative) = overrides.relative {
                    if relative.is_nan() || relative < 0.0 {
                        return Err(VerifyError::InvalidConfigValueError {
                            field: format!("tolerances.method_specific.{}.relative", method),
                            value: relative.to_string(),
                            reason: "Relative tolerance must be non-negative".to_string(),
                        });
                    }
                }
                if let Some(absolute) = overrides.absolute {
                    validation::validate_non_negative(
                        &format!("tolerances.method_specific.{}.absolute", method),
                        absolute,
                    )?;
                }
            }
        }

        Ok(())
    }
}

impl Validate for ToleranceConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
