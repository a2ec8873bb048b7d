use crate::domain::model::Record;
use crate::domain::plate::VALID_DILUTIONS;
use crate::utils::error::{EtlError, Result};
use chrono::NaiveDateTime;
use csv::StringRecord;
use serde::Deserialize;

const SAMPLE_ID: &str = "Sample ID";
const PLATE_TYPE: &str = "Plate Type";
const DILUTION: &str = "Dilution";
const DATE_TIME: &str = "DateTime";

const DATE_TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
];

/// Count columns summed for each plate type the reader exports.
pub fn count_columns(plate_type: &str) -> Option<&'static [&'static str]> {
    match plate_type {
        "PAC" => Some(&["Red Raw Count"]),
        "RAC" => Some(&["Red Raw Count", "Blue Raw Count"]),
        "PCC" => Some(&["Red with Gas Raw Count"]),
        _ => None,
    }
}

fn column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| EtlError::ReaderError {
            message: format!("missing column '{}'", name),
        })
}

fn parse_date_time(raw: &str) -> Option<NaiveDateTime> {
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw.trim(), format).ok())
}

/// Parses a plate reader export.
///
/// Verification plates (`VE`) and rows with sample id `x` are dropped, `AC`
/// is read as `PAC`, `1:1` as dilution `0` and a `-` count as `0`. Rows with
/// non-numeric counts, plate types without known count columns or dilutions
/// outside the allowed set fail the whole report, naming the sample ids.
pub fn read_reader_report(data: &[u8], plate_type: Option<&str>) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);
    let headers = reader.headers()?.clone();

    let sample_col = column(&headers, SAMPLE_ID)?;
    let type_col = column(&headers, PLATE_TYPE)?;
    let dilution_col = column(&headers, DILUTION)?;
    let date_col = column(&headers, DATE_TIME).ok();

    let mut records = Vec::new();
    let mut bad_counts = Vec::new();
    let mut bad_types = Vec::new();
    let mut bad_dilutions = Vec::new();

    for row in reader.records() {
        let row = row?;
        let field = |idx: usize| row.get(idx).unwrap_or("").trim();

        let sample_id = field(sample_col).to_string();
        let recorded_type = field(type_col);
        if sample_id == "x" || recorded_type == "VE" {
            continue;
        }

        let recorded_type = if recorded_type == "AC" { "PAC" } else { recorded_type };
        let used_type = plate_type.unwrap_or(recorded_type).to_string();

        let Some(columns) = count_columns(&used_type) else {
            bad_types.push(sample_id);
            continue;
        };

        let mut count = 0i64;
        let mut counts_ok = true;
        for name in columns {
            let raw = match headers.iter().position(|h| h.trim() == *name) {
                Some(idx) => field(idx),
                None => {
                    return Err(EtlError::ReaderError {
                        message: format!("missing column '{}' for {} plates", name, used_type),
                    })
                }
            };
            let raw = if raw == "-" { "0" } else { raw };
            let sum = match raw.parse::<i64>() {
                Ok(value) if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) => {
                    count.checked_add(value)
                }
                _ => None,
            };
            match sum {
                Some(sum) => count = sum,
                None => counts_ok = false,
            }
        }
        if !counts_ok {
            bad_counts.push(sample_id);
            continue;
        }

        let raw_dilution = field(dilution_col);
        let raw_dilution = if raw_dilution == "1:1" { "0" } else { raw_dilution };
        let dilution = match raw_dilution.parse::<i32>() {
            Ok(d) if VALID_DILUTIONS.contains(&d) => d,
            _ => {
                bad_dilutions.push(sample_id);
                continue;
            }
        };

        records.push(Record {
            sample_id,
            plate_type: used_type,
            count,
            dilution,
            replicates: 1,
            recorded_at: date_col.and_then(|idx| parse_date_time(field(idx))),
        });
    }

    let problems: Vec<String> = [
        (bad_counts, "invalid counts"),
        (bad_types, "invalid plate types"),
        (bad_dilutions, "invalid dilutions"),
    ]
    .into_iter()
    .filter(|(ids, _)| !ids.is_empty())
    .map(|(ids, what)| format!("{:?} have {}", ids, what))
    .collect();

    if !problems.is_empty() {
        return Err(EtlError::ReaderError {
            message: problems.join("; "),
        });
    }

    tracing::debug!("Read {} plates from reader report", records.len());
    Ok(records)
}

#[derive(Debug, Deserialize)]
struct ManualRow {
    #[serde(rename = "Label")]
    label: String,
    #[serde(rename = "Type")]
    plate_type: String,
    #[serde(rename = "Count")]
    count: i64,
    #[serde(rename = "Dilution")]
    dilution: i32,
    #[serde(rename = "NumberPlates")]
    replicates: i64,
}

/// Parses a hand-entered count sheet; each row may stand for several plates.
pub fn read_manual_sheet(data: &[u8]) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(data);

    let records = reader
        .deserialize::<ManualRow>()
        .map(|row| -> Result<Record> {
            let row = row?;
            Ok(Record {
                sample_id: row.label,
                plate_type: row.plate_type,
                count: row.count,
                dilution: row.dilution,
                replicates: row.replicates,
                recorded_at: None,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!("Read {} rows from manual sheet", records.len());
    Ok(records)
}
