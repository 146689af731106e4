use crate::domain::model::{ForecastPoint, TrendModel};
use crate::utils::error::{ForecastError, Result};
use chrono::Months;

pub const FORECAST_HORIZON: usize = 12;

/// Projects the fitted line over the `FORECAST_HORIZON` months following the
/// last observed date. Steps continue from the fitted series length.
pub fn forecast(model: &TrendModel) -> Result<Vec<ForecastPoint>> {
    (1..=FORECAST_HORIZON)
        .map(|ahead| {
            let step = model.observations + ahead - 1;
            let date = model
                .last_observed
                .checked_add_months(Months::new(ahead as u32))
                .ok_or_else(|| ForecastError::ProcessingError {
                    message: format!(
                        "cannot advance {} months past {}",
                        ahead, model.last_observed
                    ),
                })?;

            Ok(ForecastPoint {
                step,
                date,
                value: model.predict(step),
            })
        })
        .collect()
}
