use crate::utils::error::{FieldViolation, GroupError, PlateError, RangeError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dilution exponents a plate may be read at. `0` is undiluted.
pub const VALID_DILUTIONS: [i32; 5] = [0, -1, -2, -3, -4];

/// Inclusive countable colony range for a plate type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountableRange {
    pub low: u64,
    pub high: u64,
}

impl CountableRange {
    pub const fn new(low: u64, high: u64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, count: u64) -> bool {
        self.low <= count && count <= self.high
    }
}

const AEROBIC_RANGE: CountableRange = CountableRange::new(25, 250);
const COLIFORM_RANGE: CountableRange = CountableRange::new(1, 154);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlateType {
    Spc,
    Pac,
    Rac,
    Cpc,
    Hscc,
    Pcc,
    Ym,
    Rym,
}

impl PlateType {
    pub const ALL: [PlateType; 8] = [
        PlateType::Spc,
        PlateType::Pac,
        PlateType::Rac,
        PlateType::Cpc,
        PlateType::Hscc,
        PlateType::Pcc,
        PlateType::Ym,
        PlateType::Rym,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            PlateType::Spc => "SPC",
            PlateType::Pac => "PAC",
            PlateType::Rac => "RAC",
            PlateType::Cpc => "CPC",
            PlateType::Hscc => "HSCC",
            PlateType::Pcc => "PCC",
            PlateType::Ym => "YM",
            PlateType::Rym => "RYM",
        }
    }

    /// Countable range, or `None` for the yeast/mold plates which have none.
    pub fn countable_range(&self) -> Option<CountableRange> {
        match self {
            PlateType::Spc | PlateType::Pac | PlateType::Rac => Some(AEROBIC_RANGE),
            PlateType::Cpc | PlateType::Hscc | PlateType::Pcc => Some(COLIFORM_RANGE),
            PlateType::Ym | PlateType::Rym => None,
        }
    }

    pub fn require_range(&self) -> Result<CountableRange, RangeError> {
        self.countable_range().ok_or_else(|| RangeError::Undefined {
            plate_type: self.code().to_string(),
        })
    }
}

impl fmt::Display for PlateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PlateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlateType::ALL
            .iter()
            .copied()
            .find(|t| t.code() == s)
            .ok_or_else(|| format!("unknown plate type '{}'", s))
    }
}

/// Which side of the countable range a count falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sign {
    Below,
    Above,
    Within,
}

impl Sign {
    pub fn symbol(&self) -> &'static str {
        match self {
            Sign::Below => "<",
            Sign::Above => ">",
            Sign::Within => "",
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A validated, immutable plate observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlateReading {
    plate_type: PlateType,
    count: u64,
    dilution: i32,
    weighed: bool,
    replicates: u32,
}

impl PlateReading {
    /// Validates every field in one pass and reports all failures together.
    pub fn new(
        plate_type: &str,
        count: i64,
        dilution: i32,
        weighed: bool,
        replicates: i64,
    ) -> Result<Self, PlateError> {
        let mut violations = Vec::new();

        let parsed_type = match plate_type.parse::<PlateType>() {
            Ok(t) => Some(t),
            Err(reason) => {
                violations.push(violation("plate_type", plate_type, reason));
                None
            }
        };

        let parsed_count = match u64::try_from(count) {
            Ok(c) => Some(c),
            Err(_) => {
                violations.push(violation("count", count, "must be a non-negative integer"));
                None
            }
        };

        if !VALID_DILUTIONS.contains(&dilution) {
            violations.push(violation(
                "dilution",
                dilution,
                "must be one of 0, -1, -2, -3, -4",
            ));
        }

        let parsed_replicates = match u32::try_from(replicates) {
            Ok(n) if n >= 1 => Some(n),
            _ => {
                violations.push(violation("replicates", replicates, "must be an integer >= 1"));
                None
            }
        };

        match (parsed_type, parsed_count, parsed_replicates) {
            (Some(plate_type), Some(count), Some(replicates)) if violations.is_empty() => {
                Ok(Self {
                    plate_type,
                    count,
                    dilution,
                    weighed,
                    replicates,
                })
            }
            _ => Err(PlateError::Invalid { violations }),
        }
    }

    /// Single-plate reading.
    pub fn single(
        plate_type: &str,
        count: i64,
        dilution: i32,
        weighed: bool,
    ) -> Result<Self, PlateError> {
        Self::new(plate_type, count, dilution, weighed, 1)
    }

    pub fn plate_type(&self) -> PlateType {
        self.plate_type
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn dilution(&self) -> i32 {
        self.dilution
    }

    pub fn weighed(&self) -> bool {
        self.weighed
    }

    pub fn replicates(&self) -> u32 {
        self.replicates
    }

    /// `10^|dilution|`, the back-calculation factor.
    pub fn dilution_factor(&self) -> u64 {
        10u64.pow(self.dilution.unsigned_abs())
    }

    /// Always false for plate types without a range.
    pub fn is_countable(&self) -> bool {
        self.plate_type
            .countable_range()
            .is_some_and(|range| range.contains(self.count))
    }

    pub fn sign(&self) -> Result<Sign, RangeError> {
        let range = self.plate_type.require_range()?;
        Ok(if self.count < range.low {
            Sign::Below
        } else if self.count > range.high {
            Sign::Above
        } else {
            Sign::Within
        })
    }

    pub fn distance_to_upper_bound(&self) -> Result<u64, RangeError> {
        let range = self.plate_type.require_range()?;
        Ok(self.count.abs_diff(range.high))
    }

    /// Nearer of the two bounds; the lower bound wins when equidistant.
    pub fn closest_bound(&self) -> Result<u64, RangeError> {
        let range = self.plate_type.require_range()?;
        if self.count.abs_diff(range.low) <= self.count.abs_diff(range.high) {
            Ok(range.low)
        } else {
            Ok(range.high)
        }
    }
}

fn violation(
    field: &'static str,
    value: impl ToString,
    reason: impl Into<String>,
) -> FieldViolation {
    FieldViolation {
        field,
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Two or more readings of one plate type, all weighed or all unweighed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingGroup {
    readings: Vec<PlateReading>,
}

impl ReadingGroup {
    pub fn new(readings: Vec<PlateReading>) -> Result<Self, GroupError> {
        let first = match readings.as_slice() {
            [first, _, ..] => first,
            _ => {
                return Err(GroupError::TooFewReadings {
                    found: readings.len(),
                })
            }
        };

        if let Some(other) = readings.iter().find(|r| r.plate_type != first.plate_type) {
            return Err(GroupError::MixedPlateTypes {
                expected: first.plate_type.to_string(),
                found: other.plate_type.to_string(),
            });
        }

        if readings.iter().any(|r| r.weighed != first.weighed) {
            return Err(GroupError::MixedWeighing);
        }

        Ok(Self { readings })
    }

    pub fn readings(&self) -> &[PlateReading] {
        &self.readings
    }

    pub fn plate_type(&self) -> PlateType {
        self.readings[0].plate_type
    }

    pub fn weighed(&self) -> bool {
        self.readings[0].weighed
    }

    pub fn countable(&self) -> Vec<&PlateReading> {
        self.readings.iter().filter(|r| r.is_countable()).collect()
    }

    /// Reported units, e.g. `PAC / mL`.
    pub fn units(&self) -> String {
        let suffix = if self.weighed() { " / g" } else { " / mL" };
        format!("{}{}", self.plate_type(), suffix)
    }
}
