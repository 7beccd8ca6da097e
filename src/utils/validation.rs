use crate::utils::error::{ReportError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl Into<String>, reason: impl Into<String>) -> ReportError {
    ReportError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.into(),
        reason: reason.into(),
    }
}

/// NetBox base URL: http(s) only.
pub fn validate_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value).map_err(|e| invalid(field, value, format!("Invalid URL: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(field, value, format!("Unsupported URL scheme: {}", scheme))),
    }
}

pub fn validate_path(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(invalid(field, value, "Path cannot be empty"));
    }
    if value.contains('\0') {
        return Err(invalid(field, value.replace('\0', "\\0"), "Path contains a NUL byte"));
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| ReportError::MissingConfigError {
        field: field.to_string(),
    })
}

/// Never echoes the value, so it is safe on the API token.
pub fn validate_non_empty_string(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field, "", "Value cannot be empty or whitespace-only"));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display>(
    field: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field,
            value.to_string(),
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}
