use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One cleaned report row: a single plate as recorded by the reader or by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub sample_id: String,
    pub plate_type: String,
    pub count: i64,
    pub dilution: i32,
    pub replicates: i64,
    pub recorded_at: Option<NaiveDateTime>,
}

/// One exported line: the estimate for a plate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "CFU")]
    pub cfu: String,
    #[serde(rename = "Counts")]
    pub counts: String,
    #[serde(rename = "Plates")]
    pub plates: String,
    /// Day the earliest plate in the group was imaged, if recorded.
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Error")]
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub rows: Vec<ResultRow>,
    pub failed_groups: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Plate reader export: Sample ID, Plate Type, Dilution, *Raw Count columns.
    #[default]
    Reader,
    /// Hand-entered sheet: Label, Type, Count, Dilution, NumberPlates.
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

/// What to do when one plate group cannot be calculated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum GroupErrorPolicy {
    /// Record the error on the group's row and carry on.
    #[default]
    Skip,
    Abort,
}

impl fmt::Display for GroupErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupErrorPolicy::Skip => f.write_str("skip"),
            GroupErrorPolicy::Abort => f.write_str("abort"),
        }
    }
}
