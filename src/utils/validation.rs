use crate::utils::error::{Result, VerifyError};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(VerifyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(VerifyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// Version strings end up embedded in result filenames, so anything that
/// would escape the results directory is rejected.
pub fn validate_version_string(field_name: &str, version: &str) -> Result<()> {
    if version.trim().is_empty() {
        return Err(VerifyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: version.to_string(),
            reason: "Version string cannot be empty".to_string(),
        });
    }

    if version.contains(['/', '\\']) || version.contains("..") {
        return Err(VerifyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: version.to_string(),
            reason: "Version string cannot contain path separators".to_string(),
        });
    }

    if version.chars().any(char::is_whitespace) {
        return Err(VerifyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: version.to_string(),
            reason: "Version string cannot contain whitespace".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_negative(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(VerifyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value must be a finite non-negative number".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(VerifyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_ordered_bounds(field_name: &str, min: f64, max: f64) -> Result<()> {
    if min > max {
        return Err(VerifyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: format!("[{}, {}]", min, max),
            reason: "Lower bound exceeds upper bound".to_string(),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| VerifyError::MissingConfigError {
        field: field_name.to_string(),
    })
}
