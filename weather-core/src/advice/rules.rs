//! Deterministic advice derived from a rendered report, used when no
//! language model answers.

use async_trait::async_trait;
use std::collections::HashSet;

use super::{AdviceProvider, AdvisorId, AnalysisRequest, ProviderMiss, parse::ParsedReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TipCategory {
    Clothing,
    Precipitation,
    Humidity,
    Wind,
    Visibility,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceTip {
    pub category: TipCategory,
    pub message: String,
}

impl AdviceTip {
    fn new(category: TipCategory, message: impl Into<String>) -> Self {
        Self { category, message: message.into() }
    }
}

const RAIN_WORDS: [&str; 4] = ["rain", "drizzle", "thunder", "shower"];

/// Derive tips from a report. The query does not change the heuristics.
pub fn analyze(report: &str, _user_query: &str) -> Vec<AdviceTip> {
    derive_tips(&ParsedReport::parse(report))
}

/// Rules run in a fixed order; each one fires only when its inputs parsed.
pub fn derive_tips(parsed: &ParsedReport) -> Vec<AdviceTip> {
    use TipCategory::*;

    let mut tips = Vec::new();

    if let Some(temp) = parsed.temperature {
        let message = if temp <= 0.0 {
            "🥶 Very cold. Wear a heavy coat, gloves, and a hat."
        } else if temp <= 10.0 {
            "🧥 Chilly. A warm jacket and layers are recommended."
        } else if temp >= 30.0 {
            "🔥 Hot. Stay hydrated, wear light clothing, and limit midday sun."
        } else if temp >= 22.0 {
            "🌞 Warm and comfortable. A T-shirt or light layers are fine."
        } else {
            "🌤️ Mild. A light layer should be enough."
        };
        tips.push(AdviceTip::new(Clothing, message));
    }

    if let (Some(temp), Some(feels)) = (parsed.temperature, parsed.feels_like) {
        let delta = feels - temp;
        if delta <= -3.0 {
            tips.push(AdviceTip::new(
                Clothing,
                "↘️ It feels colder than the actual temperature, so add an extra layer.",
            ));
        } else if delta >= 3.0 {
            tips.push(AdviceTip::new(
                Clothing,
                "↗️ It feels warmer than the actual temperature, so dress lightly.",
            ));
        }
    }

    let desc = parsed.description.as_str();
    if RAIN_WORDS.iter().any(|word| desc.contains(word)) {
        tips.push(AdviceTip::new(
            Precipitation,
            "☔ Rain expected. Carry an umbrella or waterproof layer.",
        ));
    } else if desc.contains("snow") {
        tips.push(AdviceTip::new(
            Precipitation,
            "❄️ Snowy conditions. Wear insulated boots with good traction.",
        ));
    }

    if let Some(humidity) = parsed.humidity_pct {
        if humidity >= 80 {
            tips.push(AdviceTip::new(Humidity, "💧 Very humid, expect it to feel muggy. Stay hydrated."));
        } else if humidity <= 30 {
            tips.push(AdviceTip::new(Humidity, "💨 Dry air. Consider moisturizer and stay hydrated."));
        }
    }

    if let Some(wind) = parsed.wind_speed {
        if wind >= 10.0 {
            tips.push(AdviceTip::new(
                Wind,
                "💨 Breezy to windy. Secure hats and light items, and consider a windbreaker.",
            ));
        }
        if wind >= 17.0 {
            tips.push(AdviceTip::new(Wind, "🌬️ Strong winds. Take extra caution outdoors."));
        }
    }

    if parsed.visibility_meters.is_some_and(|v| v < 3000) {
        tips.push(AdviceTip::new(Visibility, "👁️ Low visibility. Take care if driving."));
    }

    if !desc.is_empty() {
        tips.push(AdviceTip::new(Summary, format!("ℹ️ Conditions: {}.", capitalize(desc))));
    }

    dedup(tips)
}

/// Drop tips whose text already appeared, keeping first occurrences in order.
pub fn dedup(tips: Vec<AdviceTip>) -> Vec<AdviceTip> {
    let mut seen = HashSet::new();
    tips.into_iter()
        .filter(|tip| seen.insert(tip.message.clone()))
        .collect()
}

pub fn render(tips: &[AdviceTip]) -> String {
    tips.iter()
        .map(|tip| tip.message.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Terminal tier of the cascade; always answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn advise(&self, request: &AnalysisRequest) -> String {
        render(&analyze(&request.report, &request.user_query))
    }
}

#[async_trait]
impl AdviceProvider for RuleEngine {
    fn id(&self) -> AdvisorId {
        AdvisorId::Rules
    }

    async fn try_analyze(&self, request: &AnalysisRequest) -> Result<String, ProviderMiss> {
        Ok(self.advise(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(temp: &str, feels: &str, conditions: &str, humidity: &str, wind: &str, vis: &str) -> String {
        format!(
            "Current Weather for Test, TT:\n\
             🌡️ Temperature: {temp}°C (feels like {feels}°C)\n\
             🌤️ Conditions: {conditions}\n\
             💧 Humidity: {humidity}%\n\
             💨 Wind Speed: {wind} m/s\n\
             🔽 Pressure: 1000 hPa\n\
             👁️ Visibility: {vis} meters"
        )
    }

    fn categories(tips: &[AdviceTip]) -> Vec<TipCategory> {
        tips.iter().map(|t| t.category).collect()
    }

    #[test]
    fn cold_wet_windy_example() {
        let text = report("5", "2", "Light Rain", "85", "12", "2500");
        let tips = analyze(&text, "What should I wear?");

        let messages: Vec<_> = tips.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(
            messages,
            [
                "🧥 Chilly. A warm jacket and layers are recommended.",
                "↘️ It feels colder than the actual temperature, so add an extra layer.",
                "☔ Rain expected. Carry an umbrella or waterproof layer.",
                "💧 Very humid, expect it to feel muggy. Stay hydrated.",
                "💨 Breezy to windy. Secure hats and light items, and consider a windbreaker.",
                "👁️ Low visibility. Take care if driving.",
                "ℹ️ Conditions: Light rain.",
            ]
        );
        assert_eq!(tips.last().map(|t| t.category), Some(TipCategory::Summary));
    }

    #[test]
    fn temperature_bands() {
        let clothing = |temp: &str| {
            analyze(&format!("🌡️ Temperature: {temp}°C"), "")
                .into_iter()
                .next()
                .map(|t| t.message)
                .unwrap_or_default()
        };

        assert!(clothing("0").starts_with("🥶"));
        assert!(clothing("-12.5").starts_with("🥶"));
        assert!(clothing("10").starts_with("🧥"));
        assert!(clothing("15").starts_with("🌤️"));
        assert!(clothing("22").starts_with("🌞"));
        assert!(clothing("30").starts_with("🔥"));
    }

    #[test]
    fn feels_warmer_tip() {
        let tips = analyze(&report("25", "29", "Clear Sky", "50", "1", "10000"), "");
        assert!(tips.iter().any(|t| t.message.contains("feels warmer")));
        assert!(!tips.iter().any(|t| t.message.contains("feels colder")));
    }

    #[test]
    fn small_feels_like_delta_is_silent() {
        let tips = analyze(&report("20", "18", "Clear Sky", "50", "1", "10000"), "");
        assert_eq!(categories(&tips), [TipCategory::Clothing, TipCategory::Summary]);
    }

    #[test]
    fn rain_wins_over_snow() {
        let tips = analyze(&report("0", "0", "Rain And Snow", "50", "1", "10000"), "");
        let precip: Vec<_> = tips.iter().filter(|t| t.category == TipCategory::Precipitation).collect();
        assert_eq!(precip.len(), 1);
        assert!(precip[0].message.contains("umbrella"));

        let tips = analyze(&report("0", "0", "Heavy Snow", "50", "1", "10000"), "");
        assert!(tips.iter().any(|t| t.message.contains("insulated boots")));
    }

    #[test]
    fn dry_air_and_strong_winds() {
        let tips = analyze(&report("15", "15", "Clear Sky", "25", "18.5", "10000"), "");
        assert_eq!(
            categories(&tips),
            [
                TipCategory::Clothing,
                TipCategory::Humidity,
                TipCategory::Wind,
                TipCategory::Wind,
                TipCategory::Summary,
            ]
        );
    }

    #[test]
    fn na_visibility_gives_no_visibility_tip() {
        let tips = analyze(&report("15", "15", "Fog", "50", "1", "N/A"), "");
        assert!(!tips.iter().any(|t| t.category == TipCategory::Visibility));
    }

    #[test]
    fn empty_and_malformed_reports_never_fail() {
        assert!(analyze("", "anything").is_empty());
        assert!(analyze("garbage\n::::\nTemperature: ???", "").is_empty());

        let partial = analyze("💧 Humidity: 90%", "");
        assert_eq!(categories(&partial), [TipCategory::Humidity]);
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let tips = vec![
            AdviceTip::new(TipCategory::Wind, "a"),
            AdviceTip::new(TipCategory::Humidity, "b"),
            AdviceTip::new(TipCategory::Summary, "a"),
        ];

        let deduped = dedup(tips);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].category, TipCategory::Wind);
        assert_eq!(render(&deduped), "a\nb");
    }

    #[tokio::test]
    async fn rule_engine_always_answers() {
        let request = AnalysisRequest::new("", "hello");
        assert_eq!(RuleEngine.try_analyze(&request).await.unwrap(), "");

        let request = AnalysisRequest::new(report("5", "2", "Light Rain", "85", "12", "2500"), "q");
        let advice = RuleEngine.try_analyze(&request).await.unwrap();
        assert_eq!(advice.lines().count(), 7);
    }
}
