use std::fmt;
use thiserror::Error;

/// A single plate field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.field, self.value, self.reason)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlateError {
    #[error("Invalid plate argument(s): {}", join_violations(.violations))]
    Invalid { violations: Vec<FieldViolation> },
}

impl PlateError {
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            PlateError::Invalid { violations } => violations,
        }
    }

    /// True if `field` is among the failing fields.
    pub fn names_field(&self, field: &str) -> bool {
        self.violations().iter().any(|v| v.field == field)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GroupError {
    #[error("Invalid plate group: at least 2 readings required, found {found}")]
    TooFewReadings { found: usize },

    #[error("Invalid plate group: mixed plate types ({expected} and {found})")]
    MixedPlateTypes { expected: String, found: String },

    #[error("Invalid plate group: readings must be all weighed or all unweighed")]
    MixedWeighing,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoundingError {
    #[error("Invalid rounding argument(s) value={value}, keep_digits={keep_digits}: {reason}")]
    InvalidArgument {
        value: u64,
        keep_digits: usize,
        reason: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("Plate type {plate_type} has no defined countable range")]
    Undefined { plate_type: String },
}

/// Everything `DilutionEstimator::calculate` can fail with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EstimateError {
    #[error(transparent)]
    Range(#[from] RangeError),

    #[error("Estimate for count {count} at dilution {dilution} overflows u64")]
    Overflow { count: u64, dilution: i32 },

    #[error(transparent)]
    Rounding(#[from] RoundingError),
}

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error(transparent)]
    PlateError(#[from] PlateError),

    #[error(transparent)]
    GroupError(#[from] GroupError),

    #[error(transparent)]
    EstimateError(#[from] EstimateError),

    #[error("Report error: {message}")]
    ReaderError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field}: {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Input,
    Calculation,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::IoError(_) => ErrorCategory::Io,
            EtlError::CsvError(_) | EtlError::SerializationError(_) | EtlError::ReaderError { .. } => {
                ErrorCategory::Input
            }
            EtlError::PlateError(_) | EtlError::GroupError(_) | EtlError::EstimateError(_) => {
                ErrorCategory::Calculation
            }
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Calculation => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Io => "Check that the input file exists and the output directory is writable",
            ErrorCategory::Input => "Check the report columns, counts and dilutions of the listed samples",
            ErrorCategory::Calculation => {
                "Check the plate group: same plate type, same weighing, at least two readings"
            }
            ErrorCategory::Configuration => "Check the command-line flags or the TOML configuration file",
        }
    }

    /// Process exit code for a run that ended with this error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Io => format!("File access failed: {}", self),
            ErrorCategory::Input => format!("Could not read the plate report: {}", self),
            ErrorCategory::Calculation => format!("CFU calculation failed: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
