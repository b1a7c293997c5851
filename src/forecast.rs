// 🔮 Yearly Forecast Resolver
// (birth card, age) → 12 named period cards
//
// 7 planetary periods (Mercury → Neptune) + 5 strategic outlook cards
// (LongRange, Pluto, Result, Support, Development). The slot set and order
// never change; an empty slot means "no card for this life-period".

use crate::card::normalize;
use crate::tables::{clean_cell, read_rows, TableKind};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

// ============================================================================
// PERIOD SLOTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodSlot {
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    LongRange,
    Pluto,
    Result,
    Support,
    Development,
}

impl PeriodSlot {
    /// Canonical order
    pub const ALL: [PeriodSlot; 12] = [
        PeriodSlot::Mercury,
        PeriodSlot::Venus,
        PeriodSlot::Mars,
        PeriodSlot::Jupiter,
        PeriodSlot::Saturn,
        PeriodSlot::Uranus,
        PeriodSlot::Neptune,
        PeriodSlot::LongRange,
        PeriodSlot::Pluto,
        PeriodSlot::Result,
        PeriodSlot::Support,
        PeriodSlot::Development,
    ];

    pub const PLANETARY: [PeriodSlot; 7] = [
        PeriodSlot::Mercury,
        PeriodSlot::Venus,
        PeriodSlot::Mars,
        PeriodSlot::Jupiter,
        PeriodSlot::Saturn,
        PeriodSlot::Uranus,
        PeriodSlot::Neptune,
    ];

    pub const STRATEGIC: [PeriodSlot; 5] = [
        PeriodSlot::LongRange,
        PeriodSlot::Pluto,
        PeriodSlot::Result,
        PeriodSlot::Support,
        PeriodSlot::Development,
    ];

    /// Key used in tables and serialized records ("LongRange")
    pub fn name(&self) -> &'static str {
        match self {
            PeriodSlot::Mercury => "Mercury",
            PeriodSlot::Venus => "Venus",
            PeriodSlot::Mars => "Mars",
            PeriodSlot::Jupiter => "Jupiter",
            PeriodSlot::Saturn => "Saturn",
            PeriodSlot::Uranus => "Uranus",
            PeriodSlot::Neptune => "Neptune",
            PeriodSlot::LongRange => "LongRange",
            PeriodSlot::Pluto => "Pluto",
            PeriodSlot::Result => "Result",
            PeriodSlot::Support => "Support",
            PeriodSlot::Development => "Development",
        }
    }

    /// Display label ("Long Range")
    pub fn label(&self) -> &'static str {
        match self {
            PeriodSlot::LongRange => "Long Range",
            other => other.name(),
        }
    }

    pub fn is_planetary(&self) -> bool {
        PeriodSlot::PLANETARY.contains(self)
    }

    pub fn is_strategic(&self) -> bool {
        PeriodSlot::STRATEGIC.contains(self)
    }

    /// Lenient lookup by name or label, case-insensitive
    pub fn from_name(name: &str) -> Option<PeriodSlot> {
        let wanted = crate::card::compact_key(name).to_lowercase();
        PeriodSlot::ALL
            .iter()
            .copied()
            .find(|slot| slot.name().to_lowercase() == wanted)
    }
}

/// PeriodSlots - one value per slot, always all 12
///
/// Serializes as a map with exactly the 12 canonical keys, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PeriodSlots<T> {
    pub mercury: T,
    pub venus: T,
    pub mars: T,
    pub jupiter: T,
    pub saturn: T,
    pub uranus: T,
    pub neptune: T,
    pub long_range: T,
    pub pluto: T,
    pub result: T,
    pub support: T,
    pub development: T,
}

impl<T> PeriodSlots<T> {
    /// Build by computing each slot
    pub fn from_fn<F>(mut f: F) -> Self
    where
        F: FnMut(PeriodSlot) -> T,
    {
        PeriodSlots {
            mercury: f(PeriodSlot::Mercury),
            venus: f(PeriodSlot::Venus),
            mars: f(PeriodSlot::Mars),
            jupiter: f(PeriodSlot::Jupiter),
            saturn: f(PeriodSlot::Saturn),
            uranus: f(PeriodSlot::Uranus),
            neptune: f(PeriodSlot::Neptune),
            long_range: f(PeriodSlot::LongRange),
            pluto: f(PeriodSlot::Pluto),
            result: f(PeriodSlot::Result),
            support: f(PeriodSlot::Support),
            development: f(PeriodSlot::Development),
        }
    }

    pub fn get(&self, slot: PeriodSlot) -> &T {
        match slot {
            PeriodSlot::Mercury => &self.mercury,
            PeriodSlot::Venus => &self.venus,
            PeriodSlot::Mars => &self.mars,
            PeriodSlot::Jupiter => &self.jupiter,
            PeriodSlot::Saturn => &self.saturn,
            PeriodSlot::Uranus => &self.uranus,
            PeriodSlot::Neptune => &self.neptune,
            PeriodSlot::LongRange => &self.long_range,
            PeriodSlot::Pluto => &self.pluto,
            PeriodSlot::Result => &self.result,
            PeriodSlot::Support => &self.support,
            PeriodSlot::Development => &self.development,
        }
    }

    /// Parallel record with every slot transformed
    pub fn map<U, F>(&self, mut f: F) -> PeriodSlots<U>
    where
        F: FnMut(PeriodSlot, &T) -> U,
    {
        PeriodSlots::from_fn(|slot| f(slot, self.get(slot)))
    }

    /// (slot, value) pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (PeriodSlot, &T)> + '_ {
        PeriodSlot::ALL.iter().map(move |slot| (*slot, self.get(*slot)))
    }
}

/// ForecastRecord - card token per slot; "" = no card assigned
pub type ForecastRecord = PeriodSlots<String>;

impl PeriodSlots<String> {
    /// True when no slot carries a card (the "no matching row" shape)
    pub fn is_blank(&self) -> bool {
        self.iter().all(|(_, card)| card.is_empty())
    }
}

// ============================================================================
// TABLE
// ============================================================================

#[derive(Debug, Deserialize)]
struct ForecastRow {
    #[serde(rename = "BirthCard")]
    birth_card: String,

    #[serde(rename = "AGE")]
    age: String,

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
    #[serde(rename = "LongRange", alias = "Long Range", default)]
    long_range: String,
    #[serde(rename = "Pluto", default)]
    pluto: String,
    #[serde(rename = "Result", default)]
    result: String,
    #[serde(rename = "Support", default)]
    support: String,
    #[serde(rename = "Development", default)]
    development: String,
}

impl ForecastRow {
    fn into_record(self) -> ForecastRecord {
        let cells = PeriodSlots {
            mercury: self.mercury,
            venus: self.venus,
            mars: self.mars,
            jupiter: self.jupiter,
            saturn: self.saturn,
            uranus: self.uranus,
            neptune: self.neptune,
            long_range: self.long_range,
            pluto: self.pluto,
            result: self.result,
            support: self.support,
            development: self.development,
        };

        cells.map(|_, raw| {
            let cell = clean_cell(raw);
            if cell.is_empty() {
                cell
            } else {
                normalize(&cell)
            }
        })
    }
}

/// YearlyForecasts table, keyed by (birth card token, age)
#[derive(Debug, Clone, Default)]
pub struct ForecastTable {
    rows: HashMap<(String, u32), ForecastRecord>,
}

impl ForecastTable {
    pub fn from_csv(text: &str) -> Result<Self> {
        let rows = read_rows::<ForecastRow>(TableKind::YearlyForecasts, text)?;
        let mut table = HashMap::with_capacity(rows.len());

        for row in rows {
            let birth_card = normalize(row.value.birth_card.trim());
            let age = match row.value.age.trim().parse::<u32>() {
                Ok(age) => age,
                Err(_) => {
                    warn!(line = row.line, age = %row.value.age, "forecast row has non-numeric AGE");
                    continue;
                }
            };

            if birth_card.is_empty() {
                warn!(line = row.line, "forecast row has no BirthCard");
                continue;
            }

            let key = (birth_card, age);
            if table.contains_key(&key) {
                warn!(line = row.line, card = %key.0, age, "duplicate forecast row ignored");
                continue;
            }
            table.insert(key, row.value.into_record());
        }

        Ok(ForecastTable { rows: table })
    }

    pub fn get(&self, birth_card: &str, age: u32) -> Option<&ForecastRecord> {
        self.rows.get(&(birth_card.to_string(), age))
    }

    /// Every age the table covers for a birth card, ascending
    pub fn ages_for(&self, birth_card: &str) -> Vec<u32> {
        let token = normalize(birth_card);
        let mut ages: Vec<u32> = self
            .rows
            .keys()
            .filter(|(card, _)| *card == token)
            .map(|(_, age)| *age)
            .collect();
        ages.sort_unstable();
        ages
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolve the forecast for a birth card at a given age
///
/// The birth card may be in any notation. No matching row gives a record
/// with all 12 slots empty.
pub fn resolve_forecast(table: &ForecastTable, birth_card: &str, age: u32) -> ForecastRecord {
    table
        .get(&normalize(birth_card), age)
        .cloned()
        .unwrap_or_default()
}

// ============================================================================
// TESTS
// ============================================================================
