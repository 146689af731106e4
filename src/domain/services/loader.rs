//! Parsing of the delimited housing-price dataset and the cleaning pass.

use crate::domain::model::{Observation, RawObservation};
use crate::utils::error::{ForecastError, Result};
use chrono::NaiveDate;
use csv::StringRecord;
use std::collections::HashMap;

pub const COL_REGION: &str = "place_name";
pub const COL_YEAR: &str = "yr";
pub const COL_PERIOD: &str = "period";
pub const COL_INDEX_NSA: &str = "index_nsa";
pub const COL_INDEX_SA: &str = "index_sa";

const REQUIRED_COLUMNS: [&str; 5] = [
    COL_REGION,
    COL_YEAR,
    COL_PERIOD,
    COL_INDEX_NSA,
    COL_INDEX_SA,
];

struct ColumnIndex {
    region: usize,
    year: usize,
    period: usize,
    index_nsa: usize,
    index_sa: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let header_map: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim(), i))
            .collect();

        for column in REQUIRED_COLUMNS {
            if !header_map.contains_key(column) {
                return Err(ForecastError::MissingColumnError {
                    column: column.to_string(),
                });
            }
        }

        Ok(Self {
            region: header_map[COL_REGION],
            year: header_map[COL_YEAR],
            period: header_map[COL_PERIOD],
            index_nsa: header_map[COL_INDEX_NSA],
            index_sa: header_map[COL_INDEX_SA],
        })
    }
}

/// Parses the raw bytes of the dataset into typed rows.
///
/// The header must carry the fixed column names; extra columns are ignored.
pub fn parse_observations(data: &[u8], delimiter: u8) -> Result<Vec<RawObservation>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(data);

    let columns = ColumnIndex::from_headers(reader.headers()?)?;

    let mut observations = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        // 標題列為第 1 行
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 2);
        observations.push(parse_row(&record, &columns, line)?);
    }

    tracing::debug!("Parsed {} rows from dataset", observations.len());
    Ok(observations)
}

fn parse_row(record: &StringRecord, columns: &ColumnIndex, line: usize) -> Result<RawObservation> {
    let region_name = field(record, columns.region).to_string();
    let year = parse_integer(field(record, columns.year), COL_YEAR, line)?;
    let period = parse_integer(field(record, columns.period), COL_PERIOD, line)?;
    let period = u32::try_from(period).map_err(|_| ForecastError::DataFormatError {
        line,
        column: COL_PERIOD.to_string(),
        message: format!("month {} is outside 1-12", period),
    })?;
    let year = i32::try_from(year).map_err(|_| ForecastError::DataFormatError {
        line,
        column: COL_YEAR.to_string(),
        message: format!("year {} is out of range", year),
    })?;

    Ok(RawObservation {
        line,
        region_name,
        year,
        period,
        index_nsa: parse_optional_float(field(record, columns.index_nsa), COL_INDEX_NSA, line)?,
        index_sa: parse_optional_float(field(record, columns.index_sa), COL_INDEX_SA, line)?,
    })
}

fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

/// Accepts plain integers and integral floats such as `2020.0`.
fn parse_integer(value: &str, column: &str, line: usize) -> Result<i64> {
    if let Ok(v) = value.parse::<i64>() {
        return Ok(v);
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        _ => Err(ForecastError::DataFormatError {
            line,
            column: column.to_string(),
            message: format!("'{}' is not an integer", value),
        }),
    }
}

fn parse_optional_float(value: &str, column: &str, line: usize) -> Result<Option<f64>> {
    if is_missing(value) {
        return Ok(None);
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(ForecastError::DataFormatError {
            line,
            column: column.to_string(),
            message: format!("'{}' is not a number", value),
        }),
    }
}

fn is_missing(value: &str) -> bool {
    value.is_empty()
        || value.eq_ignore_ascii_case("na")
        || value.eq_ignore_ascii_case("nan")
        || value.eq_ignore_ascii_case("null")
}

/// Returns a cleaned copy of `raw`: backfills `index_sa` from `index_nsa`
/// and derives the first-of-month date from `year` and `period`.
pub fn clean(raw: &[RawObservation]) -> Result<Vec<Observation>> {
    raw.iter()
        .map(|row| {
            let date = month_start(row)?;

            Ok(Observation {
                region_name: row.region_name.clone(),
                year: row.year,
                period: row.period,
                date,
                index_nsa: row.index_nsa,
                index_sa: row.index_sa.or(row.index_nsa),
            })
        })
        .collect()
}

fn month_start(row: &RawObservation) -> Result<NaiveDate> {
    if !(1..=12).contains(&row.period) {
        return Err(ForecastError::DataFormatError {
            line: row.line,
            column: COL_PERIOD.to_string(),
            message: format!("month {} is outside 1-12", row.period),
        });
    }
    // 月份合法時，失敗只可能來自年份超出日期範圍
    NaiveDate::from_ymd_opt(row.year, row.period, 1).ok_or_else(|| {
        ForecastError::DataFormatError {
            line: row.line,
            column: COL_YEAR.to_string(),
            message: format!("year {} is out of range", row.year),
        }
    })
}

/// 計算被補值的資料列數量
pub fn count_backfilled(raw: &[RawObservation]) -> usize {
    raw.iter()
        .filter(|row| row.index_sa.is_none() && row.index_nsa.is_some())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "hpi_type,place_name,place_id,yr,period,index_nsa,index_sa";

    fn raw(
        region: &str,
        year: i32,
        period: u32,
        nsa: Option<f64>,
        sa: Option<f64>,
    ) -> RawObservation {
        RawObservation {
            line: 2,
            region_name: region.to_string(),
            year,
            period,
            index_nsa: nsa,
            index_sa: sa,
        }
    }

    #[test]
    fn test_parse_observations_with_extra_columns() {
        let data = format!(
            "{}\ntraditional,Texas,TX,2020,1,100.5,101.0\ntraditional,Ohio,OH,2020.0,2,99.0,\n",
            HEADER
        );

        let rows = parse_observations(data.as_bytes(), b',').unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].region_name, "Texas");
        assert_eq!(rows[0].year, 2020);
        assert_eq!(rows[0].index_sa, Some(101.0));
        assert_eq!(rows[1].year, 2020);
        assert_eq!(rows[1].period, 2);
        assert_eq!(rows[1].index_sa, None);
        assert_eq!(rows[1].line, 3);
    }

    #[test]
    fn test_parse_observations_tab_delimited() {
        let data = "place_name\tyr\tperiod\tindex_nsa\tindex_sa\nUtah\t2021\t12\tNA\t150.25\n";

        let rows = parse_observations(data.as_bytes(), b'\t').unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].index_nsa, None);
        assert_eq!(rows[0].index_sa, Some(150.25));
    }

    #[test]
    fn test_parse_observations_missing_column() {
        let data = "place_name,yr,period,index_nsa\nTexas,2020,1,100.0\n";

        let err = parse_observations(data.as_bytes(), b',').unwrap_err();

        match err {
            ForecastError::MissingColumnError { column } => assert_eq!(column, "index_sa"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_observations_non_numeric_year() {
        let data = format!("{}\ntraditional,Texas,TX,twenty,1,100.0,100.0\n", HEADER);

        let err = parse_observations(data.as_bytes(), b',').unwrap_err();

        match err {
            ForecastError::DataFormatError { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, "yr");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_observations_non_numeric_index() {
        let data = format!("{}\ntraditional,Texas,TX,2020,1,abc,100.0\n", HEADER);

        let err = parse_observations(data.as_bytes(), b',').unwrap_err();
        assert!(matches!(err, ForecastError::DataFormatError { .. }));
    }

    #[test]
    fn test_clean_backfills_seasonally_adjusted_index() {
        let rows = vec![
            raw("Texas", 2020, 1, Some(100.0), None),
            raw("Texas", 2020, 2, Some(101.0), Some(100.5)),
            raw("Texas", 2020, 3, None, None),
        ];

        let cleaned = clean(&rows).unwrap();

        assert_eq!(cleaned[0].index_sa, Some(100.0));
        assert_eq!(cleaned[1].index_sa, Some(100.5));
        assert_eq!(cleaned[2].index_sa, None);
        for (before, after) in rows.iter().zip(&cleaned) {
            if before.index_nsa.is_some() {
                assert!(after.index_sa.is_some());
            }
        }
        // 原始資料不被修改
        assert_eq!(rows[0].index_sa, None);
    }

    #[test]
    fn test_clean_synthesizes_first_of_month_date() {
        let cleaned = clean(&[raw("Ohio", 2023, 12, Some(1.0), None)]).unwrap();
        assert_eq!(cleaned[0].date, NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
    }

    #[test]
    fn test_clean_rejects_period_out_of_range() {
        for period in [0, 13] {
            let err = clean(&[raw("Ohio", 2023, period, Some(1.0), None)]).unwrap_err();
            match err {
                ForecastError::DataFormatError { column, .. } => assert_eq!(column, "period"),
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[test]
    fn test_clean_rejects_year_out_of_date_range() {
        let err = clean(&[raw("Ohio", 300000, 1, Some(1.0), None)]).unwrap_err();

        match err {
            ForecastError::DataFormatError {
                line,
                column,
                message,
            } => {
                assert_eq!(line, 2);
                assert_eq!(column, "yr");
                assert!(message.contains("300000"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_count_backfilled() {
        let rows = vec![
            raw("Texas", 2020, 1, Some(100.0), None),
            raw("Texas", 2020, 2, None, None),
            raw("Texas", 2020, 3, Some(1.0), Some(1.0)),
        ];
        assert_eq!(count_backfilled(&rows), 1);
    }
}
