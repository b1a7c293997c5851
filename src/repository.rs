// 🗄️ Card Repository - load-once reference data
//
// One repository per process, built at startup and shared (Arc) by every
// request. Each table is loaded lazily by the first caller that needs it;
// concurrent first callers wait on the same in-flight load. A successful load
// is kept for the life of the process. A failed load is NOT cached, so the
// next request tries again.

use crate::activation::{
    activations_for, lookup_activation, lookup_profile, ActivationTable, CardProfile, ProfileTable,
};
use crate::birth_card::{resolve_birth_card, BirthCard, BirthdateTable};
use crate::forecast::{resolve_forecast, ForecastRecord, ForecastTable, PeriodSlots};
use crate::periods::{
    enrich, lookup_start_dates, CurrentPeriodRule, EnrichedForecast, PlanetaryStartDates,
    PlanetaryTable,
};
use crate::reading::{build_reading, card_details, CardDetails, CardReading, ReadingRequest};
use crate::source::TableSource;
use crate::tables::{birthday_key, TableKind};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::info;

// ============================================================================
// LOADED TABLES
// ============================================================================

/// Common shape of every parsed reference table
pub trait ReferenceTable: Sized + Send + Sync {
    const KIND: TableKind;

    fn parse(text: &str) -> Result<Self>;

    fn row_count(&self) -> usize;
}

macro_rules! reference_table {
    ($table:ty, $kind:expr) => {
        impl ReferenceTable for $table {
            const KIND: TableKind = $kind;

            fn parse(text: &str) -> Result<Self> {
                <$table>::from_csv(text)
            }

            fn row_count(&self) -> usize {
                self.len()
            }
        }
    };
}

reference_table!(BirthdateTable, TableKind::BirthdateCards);
reference_table!(ActivationTable, TableKind::CardActivities);
reference_table!(ForecastTable, TableKind::YearlyForecasts);
reference_table!(PlanetaryTable, TableKind::PlanetaryPeriods);
reference_table!(ProfileTable, TableKind::CardProfiles);

/// Borrowed view of all five tables, for the pure resolvers
#[derive(Debug, Clone, Copy)]
pub struct TableSet<'a> {
    pub birthdates: &'a BirthdateTable,
    pub activations: &'a ActivationTable,
    pub forecasts: &'a ForecastTable,
    pub periods: &'a PlanetaryTable,
    pub profiles: &'a ProfileTable,
}

/// CoverageReport - how complete the loaded reference data is
#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    pub birthdate_rows: usize,
    pub activation_rows: usize,
    pub forecast_rows: usize,
    pub planetary_rows: usize,
    pub profile_rows: usize,
    /// Calendar days (of 366) with no birth card
    pub missing_birth_cards: Vec<String>,
    /// Calendar days (of 366) with no planetary start dates
    pub missing_start_dates: Vec<String>,
}

impl CoverageReport {
    pub fn is_complete(&self) -> bool {
        self.missing_birth_cards.is_empty() && self.missing_start_dates.is_empty()
    }
}

/// Every (month, day) a birthday can fall on, Feb 29 included
pub fn all_birthdays() -> Vec<(u32, u32)> {
    (1..=12u32)
        .flat_map(|month| (1..=31u32).map(move |day| (month, day)))
        // 2000 is a leap year, so Feb 29 survives
        .filter(|(month, day)| NaiveDate::from_ymd_opt(2000, *month, *day).is_some())
        .collect()
}

/// Today's local date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ============================================================================
// REPOSITORY
// ============================================================================

pub struct CardRepository<S: TableSource> {
    source: S,
    rule: CurrentPeriodRule,
    birthdates: OnceCell<BirthdateTable>,
    activations: OnceCell<ActivationTable>,
    forecasts: OnceCell<ForecastTable>,
    periods: OnceCell<PlanetaryTable>,
    profiles: OnceCell<ProfileTable>,
}

impl<S: TableSource> CardRepository<S> {
    pub fn new(source: S) -> Self {
        CardRepository {
            source,
            rule: CurrentPeriodRule::default(),
            birthdates: OnceCell::new(),
            activations: OnceCell::new(),
            forecasts: OnceCell::new(),
            periods: OnceCell::new(),
            profiles: OnceCell::new(),
        }
    }

    /// Builder: current-period tie-break rule
    pub fn with_rule(mut self, rule: CurrentPeriodRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn rule(&self) -> CurrentPeriodRule {
        self.rule
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    async fn load<'a, T: ReferenceTable>(&'a self, cell: &'a OnceCell<T>) -> Result<&'a T> {
        cell.get_or_try_init(|| async move {
            let text = self
                .source
                .fetch(T::KIND)
                .await
                .with_context(|| format!("{} table unavailable", T::KIND.name()))?;
            let table = T::parse(&text)
                .with_context(|| format!("{} table could not be parsed", T::KIND.name()))?;
            info!(
                table = T::KIND.name(),
                rows = table.row_count(),
                source = %self.source.describe(),
                "reference table loaded"
            );
            Ok(table)
        })
        .await
    }

    // ------------------------------------------------------------------------
    // Table accessors
    // ------------------------------------------------------------------------

    pub async fn birthdates(&self) -> Result<&BirthdateTable> {
        self.load(&self.birthdates).await
    }

    pub async fn activations(&self) -> Result<&ActivationTable> {
        self.load(&self.activations).await
    }

    pub async fn forecasts(&self) -> Result<&ForecastTable> {
        self.load(&self.forecasts).await
    }

    pub async fn periods(&self) -> Result<&PlanetaryTable> {
        self.load(&self.periods).await
    }

    pub async fn profiles(&self) -> Result<&ProfileTable> {
        self.load(&self.profiles).await
    }

    /// All tables at once (loading whichever aren't loaded yet)
    pub async fn tables(&self) -> Result<TableSet<'_>> {
        let (birthdates, activations, forecasts, periods, profiles) = tokio::try_join!(
            self.birthdates(),
            self.activations(),
            self.forecasts(),
            self.periods(),
            self.profiles(),
        )?;

        Ok(TableSet {
            birthdates,
            activations,
            forecasts,
            periods,
            profiles,
        })
    }

    /// Warm every table (startup)
    pub async fn preload(&self) -> Result<()> {
        self.tables().await.map(|_| ())
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    pub async fn birth_card(&self, month: u32, day: u32) -> Result<BirthCard> {
        Ok(resolve_birth_card(self.birthdates().await?, month, day))
    }

    pub async fn forecast(&self, birth_card: &str, age: u32) -> Result<ForecastRecord> {
        Ok(resolve_forecast(self.forecasts().await?, birth_card, age))
    }

    pub async fn start_dates(&self, month: u32, day: u32) -> Result<Option<PlanetaryStartDates>> {
        Ok(lookup_start_dates(self.periods().await?, month, day))
    }

    /// Attach planetary timing to a forecast, relative to `today`
    pub async fn enrich(
        &self,
        forecast: &ForecastRecord,
        birth_month: u32,
        birth_day: u32,
        today: NaiveDate,
    ) -> Result<EnrichedForecast> {
        let (periods, activations) = tokio::try_join!(self.periods(), self.activations())?;
        let start_dates = lookup_start_dates(periods, birth_month, birth_day);
        Ok(enrich(forecast, start_dates.as_ref(), activations, today, self.rule))
    }

    pub async fn activation(&self, card: &str) -> Result<String> {
        Ok(lookup_activation(self.activations().await?, card))
    }

    pub async fn activations_for(&self, forecast: &ForecastRecord) -> Result<PeriodSlots<String>> {
        Ok(activations_for(self.activations().await?, forecast))
    }

    pub async fn profile(&self, card: &str) -> Result<CardProfile> {
        Ok(lookup_profile(self.profiles().await?, card))
    }

    pub async fn card_details(&self, card: &str) -> Result<CardDetails> {
        let tables = self.tables().await?;
        Ok(card_details(&tables, card))
    }

    /// Full reading as of `today`
    pub async fn reading_on(&self, request: &ReadingRequest, today: NaiveDate) -> Result<CardReading> {
        let tables = self.tables().await?;
        build_reading(&tables, request, today, self.rule)
    }

    /// Full reading as of the local current date
    pub async fn reading(&self, request: &ReadingRequest) -> Result<CardReading> {
        self.reading_on(request, today()).await
    }

    pub async fn coverage_report(&self) -> Result<CoverageReport> {
        let tables = self.tables().await?;

        let mut missing_birth_cards = Vec::new();
        let mut missing_start_dates = Vec::new();
        for (month, day) in all_birthdays() {
            let Some(key) = birthday_key(month, day) else {
                continue;
            };
            if resolve_birth_card(tables.birthdates, month, day).is_unknown() {
                missing_birth_cards.push(key.clone());
            }
            if lookup_start_dates(tables.periods, month, day).is_none() {
                missing_start_dates.push(key);
            }
        }

        Ok(CoverageReport {
            birthdate_rows: tables.birthdates.len(),
            activation_rows: tables.activations.len(),
            forecast_rows: tables.forecasts.len(),
            planetary_rows: tables.periods.len(),
            profile_rows: tables.profiles.len(),
            missing_birth_cards,
            missing_start_dates,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
