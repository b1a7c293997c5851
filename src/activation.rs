// ⚡ Card Activation & Profile Lookup
// card → guidance text. Independent of age: the same text annotates a card
// whether it shows up as birth card, yearly card or planetary card.

use crate::card::{compact_key, normalize};
use crate::forecast::{ForecastRecord, PeriodSlots};
use crate::tables::{read_rows, TableKind};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

// ============================================================================
// CARD KEYED INDEX
// ============================================================================

/// Two-level index: exact normalized key first, whitespace-free key second
///
/// Table data is not consistent about spacing ("10 ♠" vs "10♠"), so a miss on
/// the exact key retries with all whitespace removed.
#[derive(Debug, Clone)]
struct CardIndex<T> {
    exact: HashMap<String, T>,
    compact: HashMap<String, T>,
}

impl<T> Default for CardIndex<T> {
    fn default() -> Self {
        CardIndex {
            exact: HashMap::new(),
            compact: HashMap::new(),
        }
    }
}

impl<T: Clone> CardIndex<T> {
    /// Returns false when the key was already present
    fn insert(&mut self, raw_key: &str, value: T) -> bool {
        let exact = normalize(raw_key.trim());
        if exact.is_empty() || self.exact.contains_key(&exact) {
            return false;
        }
        self.compact
            .entry(compact_key(&exact))
            .or_insert_with(|| value.clone());
        self.exact.insert(exact, value);
        true
    }

    fn get(&self, card: &str) -> Option<&T> {
        let key = normalize(card);
        if key.is_empty() {
            return None;
        }
        self.exact
            .get(&key)
            .or_else(|| self.compact.get(&compact_key(&key)))
    }

    fn len(&self) -> usize {
        self.exact.len()
    }
}

// ============================================================================
// ACTIVATIONS
// ============================================================================

#[derive(Debug, Deserialize)]
struct ActivationRow {
    #[serde(rename = "Card")]
    card: String,

    #[serde(rename = "Activation", alias = "Entrepreneurial Activation")]
    activation: String,
}

/// CardActivities table
#[derive(Debug, Clone, Default)]
pub struct ActivationTable {
    index: CardIndex<String>,
}

impl ActivationTable {
    pub fn from_csv(text: &str) -> Result<Self> {
        let rows = read_rows::<ActivationRow>(TableKind::CardActivities, text)?;
        let mut index = CardIndex::default();

        for row in rows {
            let text = row.value.activation.trim().to_string();
            if !index.insert(&row.value.card, text) {
                warn!(line = row.line, card = %row.value.card, "activation row skipped (empty or duplicate card)");
            }
        }

        Ok(ActivationTable { index })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.len() == 0
    }
}

/// Activation text for a card, "" when the table has none
pub fn lookup_activation(table: &ActivationTable, card: &str) -> String {
    table.index.get(card).cloned().unwrap_or_default()
}

/// Activation text for every slot of a forecast
///
/// Empty slots stay empty without a lookup.
pub fn activations_for(table: &ActivationTable, forecast: &ForecastRecord) -> PeriodSlots<String> {
    forecast.map(|_, card| {
        if card.is_empty() {
            String::new()
        } else {
            lookup_activation(table, card)
        }
    })
}

// ============================================================================
// PROFILES
// ============================================================================

/// CardProfile - descriptive guidance for a card
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardProfile {
    pub description: Option<String>,
    pub zone_of_genius: Option<String>,
    pub how_to_motivate: Option<String>,
}

impl CardProfile {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.zone_of_genius.is_none() && self.how_to_motivate.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    #[serde(rename = "Card")]
    card: String,

    #[serde(rename = "Description", default)]
    description: String,

    #[serde(rename = "Zone of Genius", default)]
    zone_of_genius: String,

    #[serde(rename = "How to Motivate", default)]
    how_to_motivate: String,
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// CardProfiles table
#[derive(Debug, Clone, Default)]
pub struct ProfileTable {
    index: CardIndex<CardProfile>,
}

impl ProfileTable {
    pub fn from_csv(text: &str) -> Result<Self> {
        let rows = read_rows::<ProfileRow>(TableKind::CardProfiles, text)?;
        let mut index = CardIndex::default();

        for row in rows {
            let card = row.value.card.clone();
            let profile = CardProfile {
                description: non_empty(row.value.description),
                zone_of_genius: non_empty(row.value.zone_of_genius),
                how_to_motivate: non_empty(row.value.how_to_motivate),
            };
            if !index.insert(&card, profile) {
                warn!(line = row.line, card = %card, "profile row skipped (empty or duplicate card)");
            }
        }

        Ok(ProfileTable { index })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.len() == 0
    }
}

/// Profile for a card; every field None when the table has no entry
pub fn lookup_profile(table: &ProfileTable, card: &str) -> CardProfile {
    table.index.get(card).cloned().unwrap_or_default()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIVATIONS: &str = "Card,Activation
K♥,Lead with heart.
\"10 ♠\",Work ethic wins.
K♥,Second row for the same card.
";

    const PROFILES: &str = "Card,Description,Zone of Genius, How to Motivate
K♠,The Master card.,Building organizations.,Give them real responsibility.
9♣,\"The Universal Teacher.\",,\"Let them finish.
Ask what they learned.\"
";

    #[test]
    fn test_lookup_activation_any_notation() {
        let table = ActivationTable::from_csv(ACTIVATIONS).unwrap();

        assert_eq!(lookup_activation(&table, "K♥"), "Lead with heart.");
        assert_eq!(lookup_activation(&table, "King of Hearts"), "Lead with heart.");
    }

    #[test]
    fn test_lookup_activation_inconsistent_spacing() {
        let table = ActivationTable::from_csv(ACTIVATIONS).unwrap();
        assert_eq!(lookup_activation(&table, "10♠"), "Work ethic wins.");
    }

    #[test]
    fn test_lookup_activation_whitespace_free_fallback() {
        let text = "Card,Activation\nThe Joker,Play every role.\n";
        let table = ActivationTable::from_csv(text).unwrap();

        assert_eq!(lookup_activation(&table, "TheJoker"), "Play every role.");
        assert_eq!(lookup_activation(&table, "The Joker"), "Play every role.");
    }

    #[test]
    fn test_lookup_activation_miss_is_empty() {
        let table = ActivationTable::from_csv(ACTIVATIONS).unwrap();
        assert_eq!(lookup_activation(&table, "2♣"), "");
        assert_eq!(lookup_activation(&table, ""), "");
        assert_eq!(lookup_activation(&table, "Joker"), "");
    }

    #[test]
    fn test_duplicate_activation_keeps_first() {
        let table = ActivationTable::from_csv(ACTIVATIONS).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(lookup_activation(&table, "K♥"), "Lead with heart.");
    }

    #[test]
    fn test_activations_for_forecast() {
        let table = ActivationTable::from_csv(ACTIVATIONS).unwrap();
        let mut forecast = ForecastRecord::default();
        forecast.mercury = "K♥".to_string();
        forecast.venus = "2♣".to_string();

        let activations = activations_for(&table, &forecast);

        assert_eq!(activations.mercury, "Lead with heart.");
        assert_eq!(activations.venus, "");
        assert_eq!(activations.development, "");
        assert_eq!(activations.iter().count(), 12);
    }

    #[test]
    fn test_lookup_profile_with_leading_space_header() {
        let table = ProfileTable::from_csv(PROFILES).unwrap();
        let profile = lookup_profile(&table, "King of Spades");

        assert_eq!(profile.description.as_deref(), Some("The Master card."));
        assert_eq!(profile.zone_of_genius.as_deref(), Some("Building organizations."));
        assert_eq!(profile.how_to_motivate.as_deref(), Some("Give them real responsibility."));
    }

    #[test]
    fn test_lookup_profile_multiline_and_blank_fields() {
        let table = ProfileTable::from_csv(PROFILES).unwrap();
        let profile = lookup_profile(&table, "9♣");

        assert_eq!(profile.zone_of_genius, None);
        assert_eq!(
            profile.how_to_motivate.as_deref(),
            Some("Let them finish.\nAsk what they learned.")
        );
    }

    #[test]
    fn test_lookup_profile_miss() {
        let table = ProfileTable::from_csv(PROFILES).unwrap();
        assert!(lookup_profile(&table, "A♦").is_empty());
    }
}
