// 📖 Card Reading - everything the presentation layer shows for one person
// (name, month, day, year) → birth card + age-indexed forecast + planetary
// timing + guidance text, assembled from the reference tables.

use crate::activation::{activations_for, lookup_activation, lookup_profile, CardProfile};
use crate::birth_card::{resolve_birth_card, BirthCard};
use crate::card::{normalize, Card};
use crate::forecast::{resolve_forecast, ForecastRecord, PeriodSlots};
use crate::periods::{enrich, lookup_start_dates, CurrentPeriodRule, EnrichedForecast};
use crate::repository::TableSet;
use anyhow::{bail, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// REQUEST
// ============================================================================

/// ReadingRequest - what the user typed in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingRequest {
    #[serde(default)]
    pub name: String,
    pub month: u32,
    pub day: u32,
    pub year: i32,
}

impl ReadingRequest {
    pub fn new(name: impl Into<String>, month: u32, day: u32, year: i32) -> Self {
        ReadingRequest {
            name: name.into(),
            month,
            day,
            year,
        }
    }

    /// The birth date, if it exists on the calendar
    pub fn birth_date(&self) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid birth date: {}-{:02}-{:02}",
                self.year,
                self.month,
                self.day
            )
        })
    }
}

/// Completed years between `birth` and `today`
///
/// A Feb 29 birthday is reached on Mar 1 in common years. None when `birth`
/// is after `today`.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    if birth > today {
        return None;
    }
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    u32::try_from(age).ok()
}

// ============================================================================
// READING
// ============================================================================

/// CardReading - the assembled per-user result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardReading {
    pub name: String,
    pub birth_date: NaiveDate,
    pub age: u32,
    pub birth_card: BirthCard,
    pub birth_card_activation: String,
    pub birth_card_profile: CardProfile,
    pub forecast: ForecastRecord,
    pub activations: PeriodSlots<String>,
    pub enriched: EnrichedForecast,
}

/// Assemble a reading from loaded tables
///
/// Lookup misses produce placeholders (unknown card, empty slots). Only an
/// impossible or future birth date is an error.
pub fn build_reading(
    tables: &TableSet<'_>,
    request: &ReadingRequest,
    today: NaiveDate,
    rule: CurrentPeriodRule,
) -> Result<CardReading> {
    let birth_date = request.birth_date()?;
    let Some(age) = age_on(birth_date, today) else {
        bail!("Birth date {} is after today ({})", birth_date, today);
    };

    let birth_card = resolve_birth_card(tables.birthdates, request.month, request.day);
    let forecast = if birth_card.is_unknown() {
        ForecastRecord::default()
    } else {
        resolve_forecast(tables.forecasts, &birth_card.card, age)
    };

    let start_dates = lookup_start_dates(tables.periods, request.month, request.day);
    let enriched = enrich(&forecast, start_dates.as_ref(), tables.activations, today, rule);

    debug!(
        card = %birth_card.card,
        age,
        periods = enriched.periods.len(),
        current = ?enriched.current_period_name,
        "reading assembled"
    );

    Ok(CardReading {
        name: request.name.trim().to_string(),
        birth_date,
        age,
        birth_card_activation: lookup_activation(tables.activations, &birth_card.card),
        birth_card_profile: lookup_profile(tables.profiles, &birth_card.card),
        activations: activations_for(tables.activations, &forecast),
        birth_card,
        forecast,
        enriched,
    })
}

// ============================================================================
// CARD DETAILS
// ============================================================================

/// CardDetails - everything known about one card
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDetails {
    /// Canonical token, or the input unchanged if it isn't a card
    pub card: String,
    /// English name, None for unrecognized input
    pub name: Option<String>,
    pub activation: String,
    pub profile: CardProfile,
}

/// Look up a card in any notation ("K♥", "K ♥", "King of Hearts")
pub fn card_details(tables: &TableSet<'_>, input: &str) -> CardDetails {
    let card = normalize(input);
    CardDetails {
        name: Card::parse(&card).map(|c| c.english_name()),
        activation: lookup_activation(tables.activations, &card),
        profile: lookup_profile(tables.profiles, &card),
        card,
    }
}

// ============================================================================
// TESTS
// ============================================================================
