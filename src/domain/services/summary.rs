use crate::domain::model::{DatasetSummary, Observation, RawObservation, Series};
use crate::domain::services::aggregator::distinct_regions;
use crate::domain::services::loader::count_backfilled;

pub fn summarize(
    raw: &[RawObservation],
    cleaned: &[Observation],
    national: &Series,
) -> DatasetSummary {
    let latest = national.points.last();

    DatasetSummary {
        rows: cleaned.len(),
        regions: distinct_regions(cleaned).len(),
        first_date: cleaned.iter().map(|o| o.date).min(),
        last_date: cleaned.iter().map(|o| o.date).max(),
        backfilled_rows: count_backfilled(raw),
        missing_index_sa: cleaned.iter().filter(|o| o.index_sa.is_none()).count(),
        latest_national_sa: latest.and_then(|p| p.index_sa),
        latest_national_nsa: latest.and_then(|p| p.index_nsa),
    }
}
