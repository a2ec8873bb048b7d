use crate::core::reader::count_columns;
use crate::core::ConfigProvider;
use crate::domain::model::ReportFormat;
use crate::domain::plate::{PlateType, VALID_DILUTIONS};
use crate::utils::error::{EtlError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_file_extension(field_name: &str, file: &str, allowed_extensions: &[&str]) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    match std::path::Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(extension) if allowed_set.contains(extension.to_ascii_lowercase().as_str()) => Ok(()),
        Some(extension) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_dilutions(field_name: &str, dilutions: &[i32]) -> Result<()> {
    match dilutions.iter().find(|d| !VALID_DILUTIONS.contains(*d)) {
        Some(bad) => Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bad.to_string(),
            reason: "Dilution must be one of 0, -1, -2, -3, -4".to_string(),
        }),
        None => Ok(()),
    }
}

/// The reader export only carries count columns for some plate types.
pub fn validate_plate_type(field_name: &str, plate_type: &str, format: ReportFormat) -> Result<()> {
    let known = match format {
        ReportFormat::Reader => count_columns(plate_type).is_some(),
        ReportFormat::Manual => plate_type.parse::<PlateType>().is_ok(),
    };
    if known {
        Ok(())
    } else {
        Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: plate_type.to_string(),
            reason: format!("Unsupported plate type for {:?} input", format),
        })
    }
}

/// Checks shared by every configuration source.
pub fn validate_run_options(config: &impl ConfigProvider) -> Result<()> {
    validate_path("input", config.input_path())?;
    validate_file_extension("input", config.input_path(), &["csv"])?;
    validate_path("output", config.output_path())?;
    validate_positive_number("significant_digits", config.significant_digits(), 1)?;
    validate_dilutions("dilutions", config.dilutions())?;
    if let Some(plate_type) = config.plate_type() {
        validate_plate_type("plate_type", plate_type, config.report_format())?;
    }
    Ok(())
}
