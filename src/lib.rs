// Cardology Forecast Engine - Core Library
// Birth date → birth card → age-indexed yearly forecast → planetary timing.
// Exposes all modules for use in the CLI, API server, and tests.

pub mod card;        // Card notation + normalizer
pub mod tables;      // CSV reading shared by every reference table
pub mod birth_card;  // Birthdate → birth card
pub mod forecast;    // (birth card, age) → 12-slot forecast
pub mod activation;  // Card → activation text / profile
pub mod periods;     // Planetary start dates + current period
pub mod config;      // TOML + env configuration
pub mod source;      // Where table text comes from
pub mod repository;  // Load-once cache over a TableSource
pub mod reading;     // Full per-user reading
pub mod shortcut;    // Quick answers for the chat assistant

// Re-export commonly used types
pub use card::{normalize, Card, Rank, Suit};
pub use tables::{birthday_key, TableKind};
pub use birth_card::{resolve_birth_card, BirthCard, BirthdateTable, UNKNOWN_CARD, UNKNOWN_CARD_NAME};
pub use forecast::{resolve_forecast, ForecastRecord, ForecastTable, PeriodSlot, PeriodSlots};
pub use activation::{
    activations_for, lookup_activation, lookup_profile, ActivationTable, CardProfile, ProfileTable,
};
pub use periods::{
    current_period, enrich, format_start_date, lookup_start_dates, parse_start_date,
    CurrentPeriod, CurrentPeriodRule, EnrichedForecast, PlanetaryStartDates, PlanetaryTable,
    ResolvedPeriod,
};
pub use config::{AppConfig, TableFiles};
pub use source::{DirectorySource, MemorySource, TableSource};
pub use repository::{CardRepository, CoverageReport, TableSet};
pub use reading::{age_on, build_reading, card_details, CardDetails, CardReading, ReadingRequest};
pub use shortcut::{describe_card, quick_answer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
