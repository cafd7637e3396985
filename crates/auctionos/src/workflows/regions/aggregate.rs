use std::collections::BTreeMap;
use std::io::Read;

use serde::Deserialize;
use tracing::debug;

use super::domain::RegionAggregate;
use super::normalizer::{normalize_county, normalize_state};
use crate::workflows::listing::PropertyRecord;

/// Count properties per `(state, county)`, sorted by state then county.
///
/// Records missing either location field are skipped. Spelling variants of one county
/// fold into a single aggregate that keeps the first spelling seen.
pub fn aggregate_regions<'a, I>(records: I) -> Vec<RegionAggregate>
where
    I: IntoIterator<Item = &'a PropertyRecord>,
{
    let mut groups: BTreeMap<(String, String), RegionAggregate> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in records {
        let (Some(state), Some(county)) = (record.state_code(), record.county()) else {
            skipped += 1;
            continue;
        };
        let state = normalize_state(state);
        groups
            .entry((state.clone(), normalize_county(county)))
            .or_insert_with(|| RegionAggregate::new(state, county.trim(), 0))
            .count += 1;
    }

    if skipped > 0 {
        debug!(skipped, "properties without state or county left off the map");
    }
    groups.into_values().collect()
}

#[derive(Debug, Deserialize)]
struct AggregateRow {
    #[serde(alias = "state_code")]
    state: String,
    county: String,
    count: u64,
}

/// Read `state,county,count` rows (header required; `state_code` accepted for `state`).
pub fn read_aggregates_csv<R: Read>(reader: R) -> Result<Vec<RegionAggregate>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader
        .deserialize::<AggregateRow>()
        .map(|row| {
            row.map(|row| RegionAggregate::new(normalize_state(&row.state), row.county, row.count))
        })
        .collect()
}
