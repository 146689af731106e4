use crate::domain::model::{Series, TrendModel};
use crate::utils::error::{ForecastError, Result};

/// Ordinary least-squares fit of the seasonally adjusted index against the
/// zero-based time step of each point.
///
/// Points without an `index_sa` value keep their step but are left out of
/// the fit. A single usable point (or zero variance in the steps) yields
/// slope 0 and intercept equal to the mean value.
pub fn fit_trend(series: &Series) -> Result<TrendModel> {
    let (origin, last_observed) = match (series.points.first(), series.points.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => {
            return Err(ForecastError::InsufficientDataError {
                region: series.label.clone(),
            })
        }
    };

    let samples: Vec<(f64, f64)> = series
        .points
        .iter()
        .enumerate()
        .filter_map(|(step, p)| p.index_sa.map(|v| (step as f64, v)))
        .collect();

    if samples.is_empty() {
        return Err(ForecastError::InsufficientDataError {
            region: series.label.clone(),
        });
    }

    let n = samples.len() as f64;
    let mean_x = samples.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = samples.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (sxy, sxx) = samples.iter().fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
        let dx = x - mean_x;
        (sxy + dx * (y - mean_y), sxx + dx * dx)
    });

    let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };
    let intercept = mean_y - slope * mean_x;

    tracing::debug!(
        "Fitted trend for '{}': slope={:.4}, intercept={:.4} over {} points",
        series.label,
        slope,
        intercept,
        samples.len()
    );

    Ok(TrendModel {
        slope,
        intercept,
        origin,
        last_observed,
        observations: series.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::SeriesPoint;
    use chrono::NaiveDate;

    fn series(values: &[Option<f64>]) -> Series {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        Series {
            label: "Texas".to_string(),
            points: values
                .iter()
                .enumerate()
                .map(|(i, v)| SeriesPoint {
                    date: start
                        .checked_add_months(chrono::Months::new(i as u32))
                        .unwrap(),
                    index_nsa: *v,
                    index_sa: *v,
                })
                .collect(),
        }
    }

    #[test]
    fn test_fit_trend_perfect_line() {
        let model = fit_trend(&series(&[Some(100.0), Some(102.0), Some(104.0)])).unwrap();

        assert!((model.slope - 2.0).abs() < 1e-9);
        assert!((model.intercept - 100.0).abs() < 1e-9);
        assert_eq!(model.observations, 3);
        assert_eq!(model.origin, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(model.last_observed, NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
    }

    #[test]
    fn test_fit_trend_least_squares() {
        // y = 1, 3, 2, 4 -> slope 0.8, intercept 1.3
        let model = fit_trend(&series(&[Some(1.0), Some(3.0), Some(2.0), Some(4.0)])).unwrap();

        assert!((model.slope - 0.8).abs() < 1e-9);
        assert!((model.intercept - 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_fit_trend_empty_series() {
        let err = fit_trend(&series(&[])).unwrap_err();
        match err {
            ForecastError::InsufficientDataError { region } => assert_eq!(region, "Texas"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_fit_trend_no_usable_values() {
        let err = fit_trend(&series(&[None, None])).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientDataError { .. }));
    }

    #[test]
    fn test_fit_trend_single_point_is_flat() {
        let model = fit_trend(&series(&[Some(150.0)])).unwrap();

        assert_eq!(model.slope, 0.0);
        assert_eq!(model.intercept, 150.0);
        assert_eq!(model.observations, 1);
    }

    #[test]
    fn test_fit_trend_skips_missing_values_but_keeps_steps() {
        // steps 0 and 2 carry values 10 and 14
        let model = fit_trend(&series(&[Some(10.0), None, Some(14.0)])).unwrap();

        assert!((model.slope - 2.0).abs() < 1e-9);
        assert!((model.intercept - 10.0).abs() < 1e-9);
        assert_eq!(model.observations, 3);
    }
}
