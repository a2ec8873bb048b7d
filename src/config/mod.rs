pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::estimator::{ReportMode, DEFAULT_SIGNIFICANT_DIGITS};
#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::model::{GroupErrorPolicy, OutputFormat, ReportFormat};
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_run_options, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

/// Parses a dilution token; the reader's `1:1` means undiluted.
pub fn parse_dilution(token: &str) -> std::result::Result<i32, String> {
    match token.trim() {
        "1:1" => Ok(0),
        other => other
            .parse()
            .map_err(|_| format!("'{}' is not a dilution exponent", other)),
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "calcfu")]
#[command(about = "Estimate CFU concentration from diluted plate counts")]
pub struct CliConfig {
    /// Plate report to read
    #[arg(short, long)]
    pub input: String,

    /// Where to write the results table
    #[arg(short, long, default_value = "calcfu_results.csv")]
    pub output: String,

    #[arg(long, value_enum, default_value_t = ReportFormat::Reader)]
    pub format: ReportFormat,

    /// Samples were weighed (report per g instead of per mL)
    #[arg(short, long)]
    pub weighed: bool,

    /// Plates per group; 0 groups by sample id (pairs rows of a manual sheet)
    #[arg(short, long, default_value = "0")]
    pub group_size: usize,

    /// Plate type to use instead of the recorded one
    #[arg(short, long)]
    pub plate_type: Option<String>,

    /// Dilutions to assign in turn within each group, e.g. -2,-3
    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true, value_parser = parse_dilution)]
    pub dilutions: Vec<i32>,

    #[arg(long, default_value_t = DEFAULT_SIGNIFICANT_DIGITS)]
    pub significant_digits: usize,

    /// Report the raw back-calculated count instead of the rounded estimate
    #[arg(long)]
    pub numeric: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub output_format: OutputFormat,

    #[arg(long, value_enum, default_value_t = GroupErrorPolicy::Skip)]
    pub on_group_error: GroupErrorPolicy,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output
    }

    fn report_format(&self) -> ReportFormat {
        self.format
    }

    fn weighed(&self) -> bool {
        self.weighed
    }

    fn group_size(&self) -> usize {
        self.group_size
    }

    fn plate_type(&self) -> Option<&str> {
        self.plate_type.as_deref()
    }

    fn dilutions(&self) -> &[i32] {
        &self.dilutions
    }

    fn significant_digits(&self) -> usize {
        self.significant_digits
    }

    fn report_mode(&self) -> ReportMode {
        if self.numeric {
            ReportMode::Numeric
        } else {
            ReportMode::Text
        }
    }

    fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    fn on_group_error(&self) -> GroupErrorPolicy {
        self.on_group_error
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_run_options(self)
    }
}
