// 🪐 Planetary Period Enricher
// birthday → 7 period start dates inside the current year, which period is
// running today, merged with the forecast's cards.
//
// Start dates are stored as "MM/DD" without a year. They are always read
// against today's calendar year.

use crate::activation::{lookup_activation, ActivationTable};
use crate::forecast::{ForecastRecord, PeriodSlot};
use crate::tables::{birthday_key, canonical_birthday_key, clean_cell, read_rows, TableKind};
use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

// ============================================================================
// START DATES
// ============================================================================

/// PlanetaryStartDates - "MM/DD" per planetary period, "" when unknown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlanetaryStartDates {
    #[serde(default)]
    pub mercury: String,
    #[serde(default)]
    pub venus: String,
    #[serde(default)]
    pub mars: String,
    #[serde(default)]
    pub jupiter: String,
    #[serde(default)]
    pub saturn: String,
    #[serde(default)]
    pub uranus: String,
    #[serde(default)]
    pub neptune: String,
}

impl PlanetaryStartDates {
    /// Raw start date for a planetary slot; None for strategic slots and blanks
    pub fn get(&self, slot: PeriodSlot) -> Option<&str> {
        let raw = match slot {
            PeriodSlot::Mercury => &self.mercury,
            PeriodSlot::Venus => &self.venus,
            PeriodSlot::Mars => &self.mars,
            PeriodSlot::Jupiter => &self.jupiter,
            PeriodSlot::Saturn => &self.saturn,
            PeriodSlot::Uranus => &self.uranus,
            PeriodSlot::Neptune => &self.neptune,
            _ => return None,
        };
        if raw.is_empty() {
            None
        } else {
            Some(raw.as_str())
        }
    }

    fn cleaned(self) -> Self {
        PlanetaryStartDates {
            mercury: clean_cell(&self.mercury),
            venus: clean_cell(&self.venus),
            mars: clean_cell(&self.mars),
            jupiter: clean_cell(&self.jupiter),
            saturn: clean_cell(&self.saturn),
            uranus: clean_cell(&self.uranus),
            neptune: clean_cell(&self.neptune),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlanetaryRow {
    #[serde(rename = "Birthdate")]
    birthdate: String,

    #[serde(rename = "Mercury", default)]
    mercury: String,
    #[serde(rename = "Venus", default)]
    venus: String,
    #[serde(rename = "Mars", default)]
    mars: String,
    #[serde(rename = "Jupiter", default)]
    jupiter: String,
    #[serde(rename = "Saturn", default)]
    saturn: String,
    #[serde(rename = "Uranus", default)]
    uranus: String,
    #[serde(rename = "Neptune", default)]
    neptune: String,
}

impl PlanetaryRow {
    fn into_start_dates(self) -> PlanetaryStartDates {
        PlanetaryStartDates {
            mercury: self.mercury,
            venus: self.venus,
            mars: self.mars,
            jupiter: self.jupiter,
            saturn: self.saturn,
            uranus: self.uranus,
            neptune: self.neptune,
        }
        .cleaned()
    }
}

/// PlanetaryPeriods table, keyed by "January 1"
#[derive(Debug, Clone, Default)]
pub struct PlanetaryTable {
    rows: HashMap<String, PlanetaryStartDates>,
}

impl PlanetaryTable {
    pub fn from_csv(text: &str) -> Result<Self> {
        let rows = read_rows::<PlanetaryRow>(TableKind::PlanetaryPeriods, text)?;
        let mut table = HashMap::with_capacity(rows.len());

        for row in rows {
            let key = canonical_birthday_key(&row.value.birthdate);
            if table.contains_key(&key) {
                warn!(line = row.line, key = %key, "duplicate planetary period row ignored");
                continue;
            }
            table.insert(key, row.value.into_start_dates());
        }

        Ok(PlanetaryTable { rows: table })
    }

    pub fn get(&self, key: &str) -> Option<&PlanetaryStartDates> {
        self.rows.get(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Start dates for a birthday, None when the table has no row for it
pub fn lookup_start_dates(
    table: &PlanetaryTable,
    month: u32,
    day: u32,
) -> Option<PlanetaryStartDates> {
    birthday_key(month, day).and_then(|key| table.get(&key).cloned())
}

// ============================================================================
// DATE HANDLING
// ============================================================================

/// Parse "MM/DD" (or "M/D") into a date within `year`
///
/// "02/29" in a common year, "13/45" or "soon" give None.
pub fn parse_start_date(raw: &str, year: i32) -> Option<NaiveDate> {
    let mut parts = raw.trim().split('/');
    let (month, day) = match (parts.next(), parts.next(), parts.next()) {
        (Some(m), Some(d), None) => (m.trim().parse::<u32>().ok()?, d.trim().parse::<u32>().ok()?),
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Display form of a start date: "Jan 1 '25"
///
/// Anything unparseable is returned verbatim.
pub fn format_start_date(raw: &str, year: i32) -> String {
    match parse_start_date(raw, year) {
        Some(date) => date.format("%b %-d '%y").to_string(),
        None => raw.to_string(),
    }
}

// ============================================================================
// CURRENT PERIOD
// ============================================================================

/// How to pick a current period when none has started yet this year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrentPeriodRule {
    /// No current period until the first one of the civil year begins
    SameYearOnly,

    /// The period with the latest start date is still running from the
    /// previous civil year
    #[default]
    CarryFromPreviousYear,
}

/// CurrentPeriod - which planetary period is running and when it began
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentPeriod {
    pub slot: PeriodSlot,
    pub started: NaiveDate,
}

/// Find the planetary period running on `today`
///
/// The current period is the one with the latest start date not after today.
/// Unparseable start dates are logged and skipped.
pub fn current_period(
    start_dates: &PlanetaryStartDates,
    today: NaiveDate,
    rule: CurrentPeriodRule,
) -> Option<CurrentPeriod> {
    let year = today.year();

    let mut dated = Vec::with_capacity(PeriodSlot::PLANETARY.len());
    for slot in PeriodSlot::PLANETARY {
        let Some(raw) = start_dates.get(slot) else {
            continue;
        };
        match parse_start_date(raw, year) {
            Some(started) => dated.push(CurrentPeriod { slot, started }),
            None => warn!(period = slot.name(), start = raw, year, "skipping unparseable start date"),
        }
    }

    let latest_started = dated
        .iter()
        .filter(|p| p.started <= today)
        .max_by_key(|p| p.started)
        .copied();

    if latest_started.is_some() || rule == CurrentPeriodRule::SameYearOnly {
        return latest_started;
    }

    // Every period of this civil year is still ahead: the last one to start
    // last year is the one still running.
    let carried = dated.iter().max_by_key(|p| p.started)?;
    let raw = start_dates.get(carried.slot)?;
    let started = parse_start_date(raw, year - 1)?;
    debug!(period = carried.slot.name(), %started, "current period carried from previous year");

    Some(CurrentPeriod {
        slot: carried.slot,
        started,
    })
}

// ============================================================================
// ENRICHMENT
// ============================================================================

/// ResolvedPeriod - one forecast slot ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPeriod {
    pub period_name: PeriodSlot,
    pub card: String,
    pub is_planetary: bool,
    pub is_strategic: bool,
    pub start_date: Option<String>,
    pub formatted_start_date: Option<String>,
    pub is_current: bool,
    pub activation: String,
}

/// EnrichedForecast - the forecast with timing attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedForecast {
    pub periods: Vec<ResolvedPeriod>,
    pub current_period_name: Option<PeriodSlot>,
    pub start_dates: PlanetaryStartDates,
}

impl EnrichedForecast {
    pub fn current(&self) -> Option<&ResolvedPeriod> {
        self.periods.iter().find(|p| p.is_current)
    }

    pub fn period(&self, slot: PeriodSlot) -> Option<&ResolvedPeriod> {
        self.periods.iter().find(|p| p.period_name == slot)
    }
}

/// Merge a forecast with planetary timing and activation text
///
/// One ResolvedPeriod per non-empty slot, canonical order. Only planetary
/// slots get start dates.
pub fn enrich(
    forecast: &ForecastRecord,
    start_dates: Option<&PlanetaryStartDates>,
    activations: &ActivationTable,
    today: NaiveDate,
    rule: CurrentPeriodRule,
) -> EnrichedForecast {
    let start_dates = start_dates.cloned().unwrap_or_default();
    let year = today.year();
    let running = current_period(&start_dates, today, rule);
    let current = running.map(|p| p.slot);

    let periods = forecast
        .iter()
        .filter(|(_, card)| !card.is_empty())
        .map(|(slot, card)| {
            let start_date = if slot.is_planetary() {
                start_dates.get(slot).map(str::to_string)
            } else {
                None
            };
            // A period carried over from last year shows last year's date
            let formatted_start_date = match running {
                Some(p) if p.slot == slot => Some(p.started.format("%b %-d '%y").to_string()),
                _ => start_date.as_deref().map(|raw| format_start_date(raw, year)),
            };

            ResolvedPeriod {
                period_name: slot,
                card: card.clone(),
                is_planetary: slot.is_planetary(),
                is_strategic: slot.is_strategic(),
                start_date,
                formatted_start_date,
                is_current: current == Some(slot),
                activation: lookup_activation(activations, card),
            }
        })
        .collect();

    EnrichedForecast {
        periods,
        current_period_name: current,
        start_dates,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn three_periods() -> PlanetaryStartDates {
        PlanetaryStartDates {
            mercury: "1/1".to_string(),
            venus: "3/1".to_string(),
            mars: "6/1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_current_period_latest_started() {
        let current = current_period(&three_periods(), date(2025, 4, 15), CurrentPeriodRule::default());
        let current = current.unwrap();

        assert_eq!(current.slot, PeriodSlot::Venus);
        assert_eq!(current.started, date(2025, 3, 1));
    }

    #[test]
    fn test_current_period_on_start_day() {
        let current = current_period(&three_periods(), date(2025, 6, 1), CurrentPeriodRule::default());
        assert_eq!(current.unwrap().slot, PeriodSlot::Mars);
    }

    #[test]
    fn test_no_candidates_same_year_only() {
        let dates = PlanetaryStartDates {
            mercury: "03/10".to_string(),
            venus: "05/01".to_string(),
            ..Default::default()
        };
        assert!(current_period(&dates, date(2025, 2, 1), CurrentPeriodRule::SameYearOnly).is_none());
    }

    #[test]
    fn test_no_candidates_carries_previous_year() {
        // Birthday Nov 9: Venus began Dec 31 and is still running mid-January
        let dates = PlanetaryStartDates {
            mercury: "11/09".to_string(),
            venus: "12/31".to_string(),
            mars: "02/21".to_string(),
            jupiter: "04/14".to_string(),
            saturn: "06/05".to_string(),
            uranus: "07/27".to_string(),
            neptune: "09/17".to_string(),
        };
        let current = current_period(&dates, date(2026, 1, 15), CurrentPeriodRule::CarryFromPreviousYear)
            .unwrap();

        assert_eq!(current.slot, PeriodSlot::Venus);
        assert_eq!(current.started, date(2025, 12, 31));
    }

    #[test]
    fn test_unparseable_start_dates_skipped() {
        let dates = PlanetaryStartDates {
            mercury: "02/29".to_string(),
            venus: "garbage".to_string(),
            mars: "04/01".to_string(),
            ..Default::default()
        };
        // 2025 has no Feb 29
        let current = current_period(&dates, date(2025, 3, 15), CurrentPeriodRule::SameYearOnly);
        assert!(current.is_none());

        let current = current_period(&dates, date(2025, 4, 2), CurrentPeriodRule::SameYearOnly);
        assert_eq!(current.unwrap().slot, PeriodSlot::Mars);
    }

    #[test]
    fn test_leap_day_start_in_leap_year() {
        let dates = PlanetaryStartDates {
            mercury: "02/29".to_string(),
            ..Default::default()
        };
        let current = current_period(&dates, date(2028, 3, 1), CurrentPeriodRule::SameYearOnly);
        assert_eq!(current.unwrap().started, date(2028, 2, 29));
    }

    #[test]
    fn test_format_start_date() {
        assert_eq!(format_start_date("1/1", 2025), "Jan 1 '25");
        assert_eq!(format_start_date("04/15", 2025), "Apr 15 '25");
        assert_eq!(format_start_date("12/31", 2009), "Dec 31 '09");
    }

    #[test]
    fn test_format_start_date_invalid_verbatim() {
        assert_eq!(format_start_date("13/45", 2025), "13/45");
        assert_eq!(format_start_date("02/29", 2025), "02/29");
        assert_eq!(format_start_date("", 2025), "");
        assert_eq!(format_start_date("1/2/3", 2025), "1/2/3");
    }

    #[test]
    fn test_planetary_table_parse() {
        let text = "Birthdate,Mercury,Venus,Mars,Jupiter,Saturn,Uranus,Neptune
January 1,01/01,02/22,04/15,06/06,07/28,09/18,11/09
March 3, 03/03 ,None,,06/16,08/07,09/28,11/19
";
        let table = PlanetaryTable::from_csv(text).unwrap();
        assert_eq!(table.len(), 2);

        let jan = lookup_start_dates(&table, 1, 1).unwrap();
        assert_eq!(jan.get(PeriodSlot::Venus), Some("02/22"));
        assert_eq!(jan.get(PeriodSlot::Pluto), None);

        let mar = lookup_start_dates(&table, 3, 3).unwrap();
        assert_eq!(mar.get(PeriodSlot::Mercury), Some("03/03"));
        assert_eq!(mar.get(PeriodSlot::Venus), None);
        assert_eq!(mar.get(PeriodSlot::Mars), None);

        assert!(lookup_start_dates(&table, 7, 7).is_none());
    }

    #[test]
    fn test_enrich_tags_and_order() {
        let activations = ActivationTable::from_csv("Card,Activation\nK♥,Lead with heart.\n").unwrap();
        let mut forecast = ForecastRecord::default();
        forecast.mercury = "K♥".to_string();
        forecast.venus = "K♦".to_string();
        forecast.long_range = "Q♦".to_string();

        let enriched = enrich(
            &forecast,
            Some(&three_periods()),
            &activations,
            date(2025, 4, 15),
            CurrentPeriodRule::default(),
        );

        assert_eq!(enriched.periods.len(), 3);
        assert_eq!(enriched.current_period_name, Some(PeriodSlot::Venus));

        let mercury = &enriched.periods[0];
        assert_eq!(mercury.period_name, PeriodSlot::Mercury);
        assert!(mercury.is_planetary && !mercury.is_strategic);
        assert_eq!(mercury.start_date.as_deref(), Some("1/1"));
        assert_eq!(mercury.formatted_start_date.as_deref(), Some("Jan 1 '25"));
        assert_eq!(mercury.activation, "Lead with heart.");
        assert!(!mercury.is_current);

        let venus = enriched.current().unwrap();
        assert_eq!(venus.card, "K♦");
        assert_eq!(venus.activation, "");

        let long_range = &enriched.periods[2];
        assert!(long_range.is_strategic && !long_range.is_planetary);
        assert_eq!(long_range.start_date, None);
        assert_eq!(long_range.formatted_start_date, None);
    }

    #[test]
    fn test_enrich_carried_period_shows_last_year() {
        let dates = PlanetaryStartDates {
            mercury: "11/09".to_string(),
            venus: "12/31".to_string(),
            mars: "02/21".to_string(),
            ..Default::default()
        };
        let mut forecast = ForecastRecord::default();
        forecast.mercury = "K♥".to_string();
        forecast.venus = "K♦".to_string();

        let enriched = enrich(
            &forecast,
            Some(&dates),
            &ActivationTable::default(),
            date(2026, 1, 15),
            CurrentPeriodRule::default(),
        );

        let venus = enriched.current().unwrap();
        assert_eq!(venus.period_name, PeriodSlot::Venus);
        assert_eq!(venus.formatted_start_date.as_deref(), Some("Dec 31 '25"));
        assert_eq!(
            enriched.period(PeriodSlot::Mercury).unwrap().formatted_start_date.as_deref(),
            Some("Nov 9 '26")
        );
    }

    #[test]
    fn test_enrich_without_start_dates() {
        let activations = ActivationTable::default();
        let mut forecast = ForecastRecord::default();
        forecast.saturn = "2♦".to_string();

        let enriched = enrich(&forecast, None, &activations, date(2025, 4, 15), CurrentPeriodRule::default());

        assert_eq!(enriched.current_period_name, None);
        assert_eq!(enriched.periods.len(), 1);
        assert_eq!(enriched.periods[0].start_date, None);
    }

    #[test]
    fn test_resolved_period_json_shape() {
        let activations = ActivationTable::default();
        let mut forecast = ForecastRecord::default();
        forecast.long_range = "Q♦".to_string();

        let enriched = enrich(&forecast, None, &activations, date(2025, 1, 1), CurrentPeriodRule::default());
        let json = serde_json::to_value(&enriched.periods[0]).unwrap();

        assert_eq!(json["periodName"], "LongRange");
        assert_eq!(json["isStrategic"], true);
        assert!(json["startDate"].is_null());
    }
}
