use crate::core::rounding::{bank_round, group_thousands};
use crate::domain::plate::{PlateReading, ReadingGroup, Sign};
use crate::utils::error::{EstimateError, RangeError};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_SIGNIFICANT_DIGITS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    /// Rounded, signed, unit-suffixed report string.
    #[default]
    Text,
    /// Raw back-calculated count.
    Numeric,
}

/// Outcome of one calculation, before formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub value: u64,
    pub sign: Sign,
    /// No reading fell inside the countable range.
    pub estimated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Estimate {
    Text(String),
    Numeric(u64),
}

impl Estimate {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Estimate::Text(text) => Some(text),
            Estimate::Numeric(_) => None,
        }
    }

    pub fn as_numeric(&self) -> Option<u64> {
        match self {
            Estimate::Numeric(value) => Some(*value),
            Estimate::Text(_) => None,
        }
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Estimate::Text(text) => f.write_str(text),
            Estimate::Numeric(value) => write!(f, "{}", value),
        }
    }
}

/// Back-calculates CFU concentration from a group of diluted plate counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DilutionEstimator {
    significant_digits: usize,
}

impl Default for DilutionEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNIFICANT_DIGITS)
    }
}

impl DilutionEstimator {
    pub fn new(significant_digits: usize) -> Self {
        Self { significant_digits }
    }

    pub fn significant_digits(&self) -> usize {
        self.significant_digits
    }

    pub fn calculate(
        &self,
        group: &ReadingGroup,
        mode: ReportMode,
    ) -> Result<Estimate, EstimateError> {
        let assessment = self.assess(group, mode)?;
        match mode {
            ReportMode::Numeric => Ok(Estimate::Numeric(assessment.value)),
            ReportMode::Text => Ok(Estimate::Text(self.format(group, &assessment)?)),
        }
    }

    /// Picks the branch by number of countable readings. In text mode the
    /// fallback branch reports the closest bound rather than the count.
    pub fn assess(
        &self,
        group: &ReadingGroup,
        mode: ReportMode,
    ) -> Result<Assessment, EstimateError> {
        let countable = group.countable();
        tracing::debug!(
            "{} of {} {} readings countable",
            countable.len(),
            group.readings().len(),
            group.plate_type()
        );

        match countable.as_slice() {
            [] => estimate_from_nearest(group, mode),
            [only] => Ok(Assessment {
                value: only.count() * only.dilution_factor(),
                sign: Sign::Within,
                estimated: false,
            }),
            many => Ok(Assessment {
                value: weighted_average(many),
                sign: Sign::Within,
                estimated: false,
            }),
        }
    }

    fn format(
        &self,
        group: &ReadingGroup,
        assessment: &Assessment,
    ) -> Result<String, EstimateError> {
        let rounded = bank_round(assessment.value, self.significant_digits)?;
        Ok(format!(
            "{}{} {}{}",
            assessment.sign,
            group_thousands(rounded),
            if assessment.estimated { "e" } else { "" },
            group.units()
        ))
    }
}

/// No countable reading: take the one nearest the upper bound, most dilute
/// on ties. A `ReadingGroup` always holds at least two readings.
fn estimate_from_nearest(
    group: &ReadingGroup,
    mode: ReportMode,
) -> Result<Assessment, EstimateError> {
    let readings = group.readings();
    let mut reading = &readings[0];
    let mut distance = reading.distance_to_upper_bound()?;
    for candidate in &readings[1..] {
        let candidate_distance = candidate.distance_to_upper_bound()?;
        if candidate_distance < distance
            || (candidate_distance == distance && candidate.dilution() < reading.dilution())
        {
            reading = candidate;
            distance = candidate_distance;
        }
    }
    tracing::debug!(
        "no countable plate, using count {} at dilution {} ({} from upper bound)",
        reading.count(),
        reading.dilution(),
        distance
    );

    let base = match mode {
        ReportMode::Text => reading.closest_bound()?,
        ReportMode::Numeric => reading.count(),
    };
    let value = base
        .checked_mul(reading.dilution_factor())
        .ok_or(EstimateError::Overflow {
            count: base,
            dilution: reading.dilution(),
        })?;

    Ok(Assessment {
        value,
        sign: reading.sign()?,
        estimated: true,
    })
}

/// Weighted average over countable readings, expressed at the least dilute
/// level present. Weights are scaled by `10^(deepest - |dilution|)` so the
/// whole division stays in integers; the result truncates.
fn weighted_average(countable: &[&PlateReading]) -> u64 {
    let main_dilution = countable
        .iter()
        .map(|r| r.dilution())
        .max()
        .unwrap_or_default();
    let deepest = countable
        .iter()
        .map(|r| r.dilution().unsigned_abs())
        .max()
        .unwrap_or_default();

    let total: u64 = countable.iter().map(|r| r.count()).sum();
    let divisor: u64 = countable
        .iter()
        .map(|r| u64::from(r.replicates()) * 10u64.pow(deepest - r.dilution().unsigned_abs()))
        .sum();

    tracing::debug!(
        "multi-dilution average: total {} over divisor {} (main dilution {}, scale 10^{})",
        total,
        divisor,
        main_dilution,
        deepest
    );

    total * 10u64.pow(deepest) / divisor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(readings: &[(&str, i64, i32, bool, i64)]) -> ReadingGroup {
        ReadingGroup::new(
            readings
                .iter()
                .map(|&(t, c, d, w, n)| PlateReading::new(t, c, d, w, n).unwrap())
                .collect(),
        )
        .unwrap()
    }

    fn both(group: &ReadingGroup) -> (u64, String) {
        let estimator = DilutionEstimator::default();
        let numeric = estimator.calculate(group, ReportMode::Numeric).unwrap();
        let text = estimator.calculate(group, ReportMode::Text).unwrap();
        (numeric.as_numeric().unwrap(), text.as_text().unwrap().to_string())
    }

    #[test]
    fn test_two_countable_different_dilutions() {
        // 35 + 212 = 247 / 0.011 = 22454.54
        let plates = group(&[("PAC", 35, -3, false, 1), ("PAC", 212, -2, false, 1)]);
        assert_eq!(both(&plates), (22454, "22,000 PAC / mL".to_string()));
    }

    #[test]
    fn test_none_countable_below_range() {
        // 13 is closer to 250 than 12
        let plates = group(&[("RAC", 12, -2, true, 1), ("RAC", 13, -1, true, 1)]);
        assert_eq!(both(&plates), (130, "<250 eRAC / g".to_string()));

        let plates = group(&[("SPC", 19, -3, false, 1), ("SPC", 521, -2, false, 1)]);
        assert_eq!(both(&plates), (19000, "<25,000 eSPC / mL".to_string()));
    }

    #[test]
    fn test_tie_prefers_most_dilute() {
        let plates = group(&[("PAC", 0, -3, false, 1), ("PAC", 0, -2, false, 1)]);
        assert_eq!(both(&plates), (0, "<25,000 ePAC / mL".to_string()));

        // order of the tied readings does not matter
        let plates = group(&[("PAC", 0, -2, false, 1), ("PAC", 0, -3, false, 1)]);
        assert_eq!(both(&plates), (0, "<25,000 ePAC / mL".to_string()));
    }

    #[test]
    fn test_tie_above_range() {
        let plates = group(&[("PAC", 999, -3, false, 1), ("PAC", 999, -2, false, 1)]);
        assert_eq!(both(&plates), (999000, ">250,000 ePAC / mL".to_string()));
    }

    #[test]
    fn test_single_countable() {
        let plates = group(&[("PAC", 150, -2, false, 1), ("PAC", 9, -3, false, 1)]);
        assert_eq!(both(&plates), (15000, "15,000 PAC / mL".to_string()));
    }

    #[test]
    fn test_same_dilution_uses_replicates() {
        // (81 + 85) / 2 plates at 10^0
        let plates = group(&[("HSCC", 81, 0, false, 1), ("HSCC", 85, 0, false, 1)]);
        assert_eq!(both(&plates), (83, "83 HSCC / mL".to_string()));

        // (152 + 134) / (3 + 3) * 10
        let plates = group(&[("CPC", 152, -1, true, 3), ("CPC", 134, -1, true, 3)]);
        assert_eq!(both(&plates).0, 476);
    }

    #[test]
    fn test_replicates_weight_mixed_dilutions() {
        // 286 / ((3 * 1 + 3 * 0.1) * 10^-1) = 866.66
        let plates = group(&[("CPC", 152, -2, false, 3), ("CPC", 134, -1, false, 3)]);
        assert_eq!(both(&plates), (866, "870 CPC / mL".to_string()));
    }

    #[test]
    fn test_three_readings_only_countable_used() {
        let plates = group(&[
            ("PAC", 240, -1, false, 1),
            ("PAC", 30, -2, false, 1),
            ("PAC", 400, 0, false, 1),
        ]);
        // 270 / (1.1 * 10^-1) = 2454.54
        assert_eq!(both(&plates), (2454, "2,400 PAC / mL".to_string()));
    }

    #[test]
    fn test_significant_digits() {
        let plates = group(&[("PAC", 35, -3, false, 1), ("PAC", 212, -2, false, 1)]);
        let estimator = DilutionEstimator::new(3);
        let text = estimator.calculate(&plates, ReportMode::Text).unwrap();
        assert_eq!(text, Estimate::Text("22,400 PAC / mL".to_string()));

        let estimator = DilutionEstimator::new(0);
        assert!(matches!(
            estimator.calculate(&plates, ReportMode::Text),
            Err(EstimateError::Rounding(_))
        ));
        // numeric mode never rounds
        assert_eq!(
            estimator.calculate(&plates, ReportMode::Numeric).unwrap(),
            Estimate::Numeric(22454)
        );
    }

    #[test]
    fn test_rangeless_plates_fail_explicitly() {
        let plates = group(&[("YM", 40, -1, false, 1), ("YM", 4, -2, false, 1)]);
        let err = DilutionEstimator::default()
            .calculate(&plates, ReportMode::Text)
            .unwrap_err();
        assert_eq!(
            err,
            EstimateError::Range(RangeError::Undefined {
                plate_type: "YM".to_string()
            })
        );
    }

    #[test]
    fn test_rebuilt_group_gives_same_result() {
        let readings = [("PAC", 35, -3, false, 1), ("PAC", 212, -2, false, 1)];
        assert_eq!(both(&group(&readings)), both(&group(&readings)));
    }

    #[test]
    fn test_assessment_flags() {
        let plates = group(&[("RAC", 12, -2, true, 1), ("RAC", 13, -1, true, 1)]);
        let assessment = DilutionEstimator::default()
            .assess(&plates, ReportMode::Numeric)
            .unwrap();
        assert!(assessment.estimated);
        assert_eq!(assessment.sign, Sign::Below);
        assert_eq!(assessment.value, 130);
    }

    #[test]
    fn test_huge_count_overflows_instead_of_wrapping() {
        let plates = group(&[
            ("PAC", 10_000_000_000_000_000, -4, false, 1),
            ("PAC", 10_000_000_000_000_000, -3, false, 1),
        ]);
        let estimator = DilutionEstimator::default();
        assert_eq!(
            estimator.calculate(&plates, ReportMode::Numeric),
            Err(EstimateError::Overflow {
                count: 10_000_000_000_000_000,
                dilution: -4,
            })
        );
        // text mode scales the bound, which always fits
        assert_eq!(
            estimator.calculate(&plates, ReportMode::Text).unwrap(),
            Estimate::Text(">2,500,000 ePAC / mL".to_string())
        );
    }

    #[test]
    fn test_weighted_average_truncates_exactly() {
        // 99 * 10 / 11 = 90 exactly; float division would give 89.999
        let plates = group(&[("PAC", 25, 0, false, 1), ("PAC", 74, -1, false, 1)]);
        assert_eq!(both(&plates), (90, "90 PAC / mL".to_string()));
    }
}
