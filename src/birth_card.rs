// 🎂 Birth Card Resolver
// (month, day) → birth card. The year never matters: birth cards repeat annually.

use crate::card::{normalize, Card};
use crate::tables::{birthday_key, canonical_birthday_key, read_rows, TableKind};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

pub const UNKNOWN_CARD: &str = "Unknown";
pub const UNKNOWN_CARD_NAME: &str = "Unknown Card";

/// BirthCard - resolved card token plus its display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthCard {
    pub card: String,
    pub name: String,
}

impl BirthCard {
    /// Sentinel for a birthday the table doesn't know
    pub fn unknown() -> Self {
        BirthCard {
            card: UNKNOWN_CARD.to_string(),
            name: UNKNOWN_CARD_NAME.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.card == UNKNOWN_CARD
    }
}

#[derive(Debug, Deserialize)]
struct BirthdateRow {
    #[serde(rename = "Birthdate")]
    birthdate: String,

    #[serde(rename = "Card")]
    card: String,

    #[serde(rename = "Card Name", alias = "Name", default)]
    name: String,
}

// ============================================================================
// TABLE
// ============================================================================

/// BirthdateToCard table, keyed by "January 1"
#[derive(Debug, Clone, Default)]
pub struct BirthdateTable {
    entries: HashMap<String, BirthCard>,
}

impl BirthdateTable {
    pub fn from_csv(text: &str) -> Result<Self> {
        let rows = read_rows::<BirthdateRow>(TableKind::BirthdateCards, text)?;
        let mut entries = HashMap::with_capacity(rows.len());

        for row in rows {
            let key = canonical_birthday_key(&row.value.birthdate);
            let card = normalize(row.value.card.trim());
            if card.is_empty() {
                warn!(line = row.line, key = %key, "birthdate row has no card");
                continue;
            }

            let name = match row.value.name.trim() {
                "" => Card::parse(&card)
                    .map(|c| c.english_name())
                    .unwrap_or_else(|| card.clone()),
                name => name.to_string(),
            };

            if entries.contains_key(&key) {
                warn!(line = row.line, key = %key, "duplicate birthdate row ignored");
                continue;
            }
            entries.insert(key, BirthCard { card, name });
        }

        Ok(BirthdateTable { entries })
    }

    pub fn get(&self, key: &str) -> Option<&BirthCard> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolve the birth card for a birthday
///
/// Never fails: a month/day the table doesn't cover yields BirthCard::unknown().
pub fn resolve_birth_card(table: &BirthdateTable, month: u32, day: u32) -> BirthCard {
    birthday_key(month, day)
        .and_then(|key| table.get(&key).cloned())
        .unwrap_or_else(BirthCard::unknown)
}

// ============================================================================
// TESTS
// ============================================================================
