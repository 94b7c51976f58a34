//! Recovers structured fields from a rendered current-weather report.
//!
//! Each field has its own extraction rule. A rule that cannot find or read
//! its field yields `None` (or an empty description); it never fails.

use crate::report::{
    CONDITIONS_LABEL, FEELS_LIKE_LABEL, HUMIDITY_LABEL, TEMPERATURE_LABEL, VISIBILITY_LABEL,
    WIND_SPEED_LABEL,
};

/// The fields of a report the rule engine reasons about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedReport {
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    /// Lower-cased; empty when the report has no conditions line.
    pub description: String,
    pub humidity_pct: Option<u32>,
    pub wind_speed: Option<f64>,
    pub visibility_meters: Option<u64>,
}

impl ParsedReport {
    pub fn parse(report: &str) -> Self {
        Self {
            temperature: temperature(report),
            feels_like: feels_like(report),
            description: description(report),
            humidity_pct: humidity(report),
            wind_speed: wind_speed(report),
            visibility_meters: visibility(report),
        }
    }
}

/// First number after `Temperature:` and before the feels-like parenthetical.
pub fn temperature(report: &str) -> Option<f64> {
    let rest = after_label(report, TEMPERATURE_LABEL)?;
    let actual = rest.split('(').next().unwrap_or(rest);
    leading_number(actual)
}

/// Number following `feels like` on the temperature line. A temperature line
/// without that parenthetical has no feels-like value.
pub fn feels_like(report: &str) -> Option<f64> {
    let line = line_with(report, TEMPERATURE_LABEL)?;
    let (_, rest) = line.split_once(FEELS_LIKE_LABEL)?;
    leading_number(rest)
}

pub fn description(report: &str) -> String {
    after_label(report, CONDITIONS_LABEL)
        .map(|rest| rest.trim().to_lowercase())
        .unwrap_or_default()
}

pub fn humidity(report: &str) -> Option<u32> {
    let rest = after_label(report, HUMIDITY_LABEL)?.trim_start();
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

pub fn wind_speed(report: &str) -> Option<f64> {
    leading_number(after_label(report, WIND_SPEED_LABEL)?)
}

/// Every ASCII digit on the visibility line, read as meters. `N/A` has none.
pub fn visibility(report: &str) -> Option<u64> {
    let line = line_with(report, VISIBILITY_LABEL)?;
    let digits: String = line.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn line_with<'a>(report: &'a str, label: &str) -> Option<&'a str> {
    report.lines().find(|line| line.contains(label))
}

fn after_label<'a>(report: &'a str, label: &str) -> Option<&'a str> {
    line_with(report, label)?
        .split_once(label)
        .map(|(_, rest)| rest)
}

/// Parse an optionally signed decimal at the start of `text`, ignoring
/// leading whitespace and any trailing unit symbol.
fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let end = text
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && matches!(c, '-' | '+'))))
        .map_or(text.len(), |(i, _)| i);

    text[..end].parse().ok()
}
