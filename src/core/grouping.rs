use crate::domain::model::{Record, ReportFormat};
use crate::domain::plate::{PlateReading, ReadingGroup};
use crate::utils::error::Result;

const MANUAL_GROUP_SIZE: usize = 2;

/// Manual sheets have no plate-number suffix to group on, so they pair
/// consecutive rows unless a size is given.
pub fn effective_group_size(format: ReportFormat, size: usize) -> usize {
    match (format, size) {
        (ReportFormat::Manual, 0) => MANUAL_GROUP_SIZE,
        (_, size) => size,
    }
}

/// Splits `records` into plate groups: by sample id prefix when `size == 0`,
/// otherwise into consecutive chunks of `size`.
pub fn group_records(records: Vec<Record>, size: usize) -> Vec<Vec<Record>> {
    if size == 0 {
        group_by_sample_id(records)
    } else {
        group_by_size(records, size)
    }
}

/// `12-1`, `12-2` and `12-3` form group `12`, ordered by plate number.
/// Groups keep the order their first plate appeared in.
pub fn group_by_sample_id(records: Vec<Record>) -> Vec<Vec<Record>> {
    let mut groups: Vec<(String, Vec<Record>)> = Vec::new();

    for record in records {
        let (prefix, _) = split_sample_id(&record.sample_id);
        let prefix = prefix.to_string();
        match groups.iter_mut().find(|(id, _)| *id == prefix) {
            Some((_, members)) => members.push(record),
            None => groups.push((prefix, vec![record])),
        }
    }

    groups
        .into_iter()
        .map(|(_, mut members)| {
            members.sort_by_key(|r| plate_number_key(&r.sample_id));
            members
        })
        .collect()
}

pub fn group_by_size(records: Vec<Record>, size: usize) -> Vec<Vec<Record>> {
    records
        .chunks(size.max(1))
        .map(<[Record]>::to_vec)
        .collect()
}

fn split_sample_id(sample_id: &str) -> (&str, &str) {
    sample_id.split_once('-').unwrap_or((sample_id, ""))
}

fn plate_number_key(sample_id: &str) -> (u64, String) {
    let (_, plate) = split_sample_id(sample_id);
    (plate.parse().unwrap_or(u64::MAX), plate.to_string())
}

/// Builds the validated reading group for one set of records. A non-empty
/// `dilutions` list replaces the recorded dilutions, cycling when the group
/// has more plates than the list.
pub fn build_reading_group(
    records: &[Record],
    weighed: bool,
    dilutions: &[i32],
) -> Result<ReadingGroup> {
    let recorded = records.iter().map(|r| r.dilution);
    let assigned: Vec<i32> = if dilutions.is_empty() {
        recorded.collect()
    } else {
        dilutions.iter().copied().cycle().take(records.len()).collect()
    };

    let readings = records
        .iter()
        .zip(assigned)
        .map(|(record, dilution)| {
            PlateReading::new(
                &record.plate_type,
                record.count,
                dilution,
                weighed,
                record.replicates,
            )
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(ReadingGroup::new(readings)?)
}
