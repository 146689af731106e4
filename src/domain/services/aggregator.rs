use crate::domain::model::{Observation, PipelineWarning, RegionSelection, Series, SeriesPoint};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};

pub const NATIONAL_LABEL: &str = "National";
pub const DEFAULT_TOP_REGIONS: usize = 5;

#[derive(Default)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Mean of each index column across all regions, one point per distinct date.
///
/// Missing values are left out of the mean; a date with no values at all
/// yields `None` rather than zero.
pub fn national_series(observations: &[Observation]) -> Series {
    let mut groups: BTreeMap<NaiveDate, (MeanAccumulator, MeanAccumulator)> = BTreeMap::new();

    for obs in observations {
        let (nsa, sa) = groups.entry(obs.date).or_default();
        nsa.add(obs.index_nsa);
        sa.add(obs.index_sa);
    }

    let points = groups
        .into_iter()
        .map(|(date, (nsa, sa))| SeriesPoint {
            date,
            index_nsa: nsa.mean(),
            index_sa: sa.mean(),
        })
        .collect();

    Series {
        label: NATIONAL_LABEL.to_string(),
        points,
    }
}

/// Distinct region names in order of first appearance.
pub fn distinct_regions(observations: &[Observation]) -> Vec<&str> {
    let mut seen = HashSet::new();
    observations
        .iter()
        .map(|obs| obs.region_name.as_str())
        .filter(|name| seen.insert(*name))
        .collect()
}

/// Resolves the region to analyse.
///
/// An absent or unknown name falls back to the first region in the dataset
/// and carries a `RegionNotFound` warning. Returns `None` only for a dataset
/// without any region.
pub fn select_region(
    observations: &[Observation],
    requested: Option<&str>,
) -> Option<(RegionSelection, Option<PipelineWarning>)> {
    let regions = distinct_regions(observations);

    if let Some(name) = requested {
        if regions.contains(&name) {
            return Some((
                RegionSelection {
                    requested: Some(name.to_string()),
                    effective: name.to_string(),
                    substituted: false,
                },
                None,
            ));
        }
    }

    let first = regions.first()?.to_string();
    let warning = PipelineWarning::RegionNotFound {
        requested: requested.map(str::to_string),
        substitute: first.clone(),
    };

    Some((
        RegionSelection {
            requested: requested.map(str::to_string),
            effective: first,
            substituted: true,
        },
        Some(warning),
    ))
}

/// Rows of one region, sorted by date ascending (stable for equal dates).
pub fn region_series(observations: &[Observation], region: &str) -> Series {
    let mut points: Vec<SeriesPoint> = observations
        .iter()
        .filter(|obs| obs.region_name == region)
        .map(|obs| SeriesPoint {
            date: obs.date,
            index_nsa: obs.index_nsa,
            index_sa: obs.index_sa,
        })
        .collect();
    points.sort_by_key(|p| p.date);

    Series {
        label: region.to_string(),
        points,
    }
}

/// The `n` regions with the most observations; ties keep first-appearance order.
pub fn top_regions(observations: &[Observation], n: usize) -> Vec<Series> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for obs in observations {
        *counts.entry(obs.region_name.as_str()).or_insert(0) += 1;
    }

    let mut ranked = distinct_regions(observations);
    // sort_by 為穩定排序，同數量時保留出現順序
    ranked.sort_by(|a, b| counts[b].cmp(&counts[a]));

    ranked
        .into_iter()
        .take(n)
        .map(|region| region_series(observations, region))
        .collect()
}
