// 📚 Reference Tables - typed CSV loading
// Every table is quoted CSV with a header row. Rows are deserialized into
// typed records once, at load time; nothing downstream sees untyped maps.

use anyhow::{Context, Result};
use chrono::Month;
use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ============================================================================
// TABLE KINDS
// ============================================================================

/// TableKind - Identifies one of the static reference datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    BirthdateCards,
    CardActivities,
    YearlyForecasts,
    PlanetaryPeriods,
    CardProfiles,
}

impl TableKind {
    pub const ALL: [TableKind; 5] = [
        TableKind::BirthdateCards,
        TableKind::CardActivities,
        TableKind::YearlyForecasts,
        TableKind::PlanetaryPeriods,
        TableKind::CardProfiles,
    ];

    /// Human-readable name for logs and reports
    pub fn name(&self) -> &'static str {
        match self {
            TableKind::BirthdateCards => "BirthdateToCard",
            TableKind::CardActivities => "CardActivities",
            TableKind::YearlyForecasts => "YearlyForecasts",
            TableKind::PlanetaryPeriods => "PlanetaryPeriods",
            TableKind::CardProfiles => "CardProfiles",
        }
    }

    /// File name inside the data directory unless configured otherwise
    pub fn default_file(&self) -> &'static str {
        match self {
            TableKind::BirthdateCards => "birthdate_cards.csv",
            TableKind::CardActivities => "card_activities.csv",
            TableKind::YearlyForecasts => "yearly_forecasts.csv",
            TableKind::PlanetaryPeriods => "planetary_periods.csv",
            TableKind::CardProfiles => "card_profiles.csv",
        }
    }

    /// Columns that must be present (after trimming) for the table to be usable
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            TableKind::BirthdateCards => &["Birthdate", "Card"],
            TableKind::CardActivities => &["Card", "Activation"],
            TableKind::YearlyForecasts => &["BirthCard", "AGE"],
            TableKind::PlanetaryPeriods => &["Birthdate"],
            TableKind::CardProfiles => &["Card"],
        }
    }
}

// ============================================================================
// CSV READER
// ============================================================================

/// A successfully deserialized row plus the CSV line it came from
#[derive(Debug, Clone)]
pub struct Row<T> {
    pub line: u64,
    pub value: T,
}

/// Read a whole table into typed rows
///
/// - Header cells are trimmed, so " How to Motivate" matches "How to Motivate"
/// - Quoted fields may span lines and carry "" escapes
/// - A malformed row is logged and skipped; a missing required column
///   fails the whole load
pub fn read_rows<T: DeserializeOwned>(kind: TableKind, text: &str) -> Result<Vec<Row<T>>> {
    // Spreadsheet exports often start with a BOM that would stick to the first header
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {}", kind.name()))?
        .clone();

    for column in kind.required_columns() {
        if !headers.iter().any(|h| h == *column) {
            anyhow::bail!(
                "{} is missing required column '{}' (found: {})",
                kind.name(),
                column,
                headers.iter().collect::<Vec<_>>().join(", ")
            );
        }
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                skipped += 1;
                warn!(table = kind.name(), error = %e, "skipping unreadable row");
                continue;
            }
        };

        let line = record.position().map(|p| p.line()).unwrap_or(0);

        // Blank trailing lines show up as a single empty field
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        match record.deserialize::<T>(Some(&headers)) {
            Ok(value) => rows.push(Row { line, value }),
            Err(e) => {
                skipped += 1;
                warn!(table = kind.name(), line, error = %e, "skipping malformed row");
            }
        }
    }

    debug!(table = kind.name(), rows = rows.len(), skipped, "parsed table");
    Ok(rows)
}

/// Trim a cell; "None" (any case) and blank cells mean "no value"
pub fn clean_cell(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        String::new()
    } else {
        trimmed.to_string()
    }
}

// ============================================================================
// BIRTHDAY KEYS
// ============================================================================

/// English month name for 1-12
pub fn month_name(month: u32) -> Option<&'static str> {
    let month = u8::try_from(month).ok()?;
    Month::try_from(month).ok().map(|m| m.name())
}

/// Table key for a birthday: "January 1" (no leading zero on the day)
pub fn birthday_key(month: u32, day: u32) -> Option<String> {
    if !(1..=31).contains(&day) {
        return None;
    }
    month_name(month).map(|name| format!("{} {}", name, day))
}

/// Bring a key read from a table into birthday_key() shape
///
/// "january 01" and " January  1 " both become "January 1". Keys that
/// don't look like a birthday come back trimmed.
pub fn canonical_birthday_key(raw: &str) -> String {
    let mut parts = raw.split_whitespace();
    if let (Some(month), Some(day), None) = (parts.next(), parts.next(), parts.next()) {
        let month_num = (1..=12u32)
            .find(|m| month_name(*m).is_some_and(|name| name.eq_ignore_ascii_case(month)));
        if let (Some(m), Ok(d)) = (month_num, day.parse::<u32>()) {
            if let Some(key) = birthday_key(m, d) {
                return key;
            }
        }
    }
    raw.trim().to_string()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct ProfileLike {
        #[serde(rename = "Card")]
        card: String,
        #[serde(rename = "How to Motivate", default)]
        motivate: String,
    }

    #[test]
    fn test_header_whitespace_tolerated() {
        let text = "Card, How to Motivate \nK♠,Give them responsibility\n";
        let rows: Vec<Row<ProfileLike>> = read_rows(TableKind::CardProfiles, text).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value.card, "K♠");
        assert_eq!(rows[0].value.motivate, "Give them responsibility");
    }

    #[test]
    fn test_quoted_newlines_and_escaped_quotes() {
        let text = "Card,How to Motivate\n\"A♠\",\"Line one\nLine \"\"two\"\"\"\n";
        let rows: Vec<Row<ProfileLike>> = read_rows(TableKind::CardProfiles, text).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value.motivate, "Line one\nLine \"two\"");
    }

    #[test]
    fn test_missing_required_column_fails() {
        let text = "Name,How to Motivate\nK♠,x\n";
        let result: Result<Vec<Row<ProfileLike>>> = read_rows(TableKind::CardProfiles, text);
        assert!(result.is_err());
    }

    #[test]
    fn test_header_match_is_case_sensitive() {
        let text = "card,How to Motivate\nK♠,x\n";
        let result: Result<Vec<Row<ProfileLike>>> = read_rows(TableKind::CardProfiles, text);
        assert!(result.is_err());
    }

    #[test]
    fn test_byte_order_mark_stripped() {
        let text = "\u{feff}Card,How to Motivate\nK♠,x\n";
        let rows: Vec<Row<ProfileLike>> = read_rows(TableKind::CardProfiles, text).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_blank_lines_ignored() {
        let text = "Card,How to Motivate\nK♠,x\n\n\nQ♠,y\n";
        let rows: Vec<Row<ProfileLike>> = read_rows(TableKind::CardProfiles, text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].value.card, "Q♠");
    }

    #[test]
    fn test_clean_cell() {
        assert_eq!(clean_cell("  K♥ "), "K♥");
        assert_eq!(clean_cell("None"), "");
        assert_eq!(clean_cell(" NONE "), "");
        assert_eq!(clean_cell("   "), "");
        assert_eq!(clean_cell(""), "");
    }

    #[test]
    fn test_birthday_key() {
        assert_eq!(birthday_key(1, 1), Some("January 1".to_string()));
        assert_eq!(birthday_key(2, 29), Some("February 29".to_string()));
        assert_eq!(birthday_key(12, 31), Some("December 31".to_string()));
        assert_eq!(birthday_key(13, 1), None);
        assert_eq!(birthday_key(0, 1), None);
        assert_eq!(birthday_key(5, 0), None);
    }

    #[test]
    fn test_canonical_birthday_key() {
        assert_eq!(canonical_birthday_key("january 01"), "January 1");
        assert_eq!(canonical_birthday_key("  March   15 "), "March 15");
        assert_eq!(canonical_birthday_key("Smarch 3"), "Smarch 3");
    }
}
