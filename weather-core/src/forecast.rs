//! Reduction of 3-hourly forecast points to one representative entry per day.

use std::collections::BTreeMap;

use crate::model::ForecastDay;

/// Maximum number of days a forecast report covers.
pub const MAX_FORECAST_DAYS: usize = 5;

const NOON: &str = "12:00:00";

/// One forecast point as delivered by the upstream provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RawForecastEntry {
    /// `YYYY-MM-DD HH:MM:SS` (a `T` separator is accepted too).
    pub timestamp: String,
    pub temperature: f64,
    pub description: String,
    pub humidity_pct: u8,
}

impl RawForecastEntry {
    fn date(&self) -> &str {
        self.timestamp
            .split_once([' ', 'T'])
            .map_or(self.timestamp.as_str(), |(date, _)| date)
    }

    fn is_noon(&self) -> bool {
        self.timestamp.ends_with(NOON)
    }
}

/// Group entries by calendar day and keep the first [`MAX_FORECAST_DAYS`]
/// days in ascending order.
///
/// A day is represented by its noon entry when there is one, otherwise by
/// the entry at the floor-middle index of that day's entries, in input order.
pub fn reduce(entries: &[RawForecastEntry]) -> Vec<ForecastDay> {
    let mut by_date: BTreeMap<&str, Vec<&RawForecastEntry>> = BTreeMap::new();
    for entry in entries {
        by_date.entry(entry.date()).or_default().push(entry);
    }

    by_date
        .into_iter()
        .take(MAX_FORECAST_DAYS)
        .filter_map(|(date, day)| {
            let pick = day
                .iter()
                .find(|e| e.is_noon())
                .or_else(|| day.get(day.len() / 2))?;

            Some(ForecastDay {
                date: date.to_string(),
                temperature: pick.temperature,
                description: pick.description.clone(),
                humidity_pct: pick.humidity_pct,
            })
        })
        .collect()
}
