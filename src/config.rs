// ⚙️ Configuration
// Optional TOML file + environment overrides. Everything has a default, so
// running from the repo root with the bundled data/ directory needs no config.
//
// | Env                 | Default          | Meaning                           |
// |---------------------|------------------|-----------------------------------|
// | CARDOLOGY_CONFIG    | (none)           | Path to a TOML config file        |
// | CARDOLOGY_DATA_DIR  | data             | Directory holding the CSV tables  |
// | CARDOLOGY_BIND      | 0.0.0.0:3000     | Server listen address             |

use crate::periods::CurrentPeriodRule;
use crate::tables::TableKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_CONFIG: &str = "CARDOLOGY_CONFIG";
pub const ENV_DATA_DIR: &str = "CARDOLOGY_DATA_DIR";
pub const ENV_BIND: &str = "CARDOLOGY_BIND";

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

// ============================================================================
// TABLE FILES
// ============================================================================

/// File name per reference table, relative to data_dir
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableFiles {
    pub birthdate_cards: String,
    pub card_activities: String,
    pub yearly_forecasts: String,
    pub planetary_periods: String,
    pub card_profiles: String,
}

impl Default for TableFiles {
    fn default() -> Self {
        TableFiles {
            birthdate_cards: TableKind::BirthdateCards.default_file().to_string(),
            card_activities: TableKind::CardActivities.default_file().to_string(),
            yearly_forecasts: TableKind::YearlyForecasts.default_file().to_string(),
            planetary_periods: TableKind::PlanetaryPeriods.default_file().to_string(),
            card_profiles: TableKind::CardProfiles.default_file().to_string(),
        }
    }
}

impl TableFiles {
    pub fn file_for(&self, kind: TableKind) -> &str {
        match kind {
            TableKind::BirthdateCards => &self.birthdate_cards,
            TableKind::CardActivities => &self.card_activities,
            TableKind::YearlyForecasts => &self.yearly_forecasts,
            TableKind::PlanetaryPeriods => &self.planetary_periods,
            TableKind::CardProfiles => &self.card_profiles,
        }
    }
}

// ============================================================================
// APP CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Tie-break when no planetary period has started yet this year
    #[serde(default)]
    pub current_period_rule: CurrentPeriodRule,

    #[serde(default)]
    pub files: TableFiles,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_dir: default_data_dir(),
            bind_addr: default_bind_addr(),
            current_period_rule: CurrentPeriodRule::default(),
            files: TableFiles::default(),
        }
    }
}

impl AppConfig {
    /// Load from CARDOLOGY_CONFIG (if set) and apply environment overrides
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Same as load(), reading variables through `env` (testable)
    pub fn load_with<F>(env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match env(ENV_CONFIG) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(dir) = env(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(bind) = env(ENV_BIND).filter(|v| !v.trim().is_empty()) {
            config.bind_addr = bind;
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Full path of a table file
    pub fn table_path(&self, kind: TableKind) -> PathBuf {
        self.data_dir.join(self.files.file_for(kind))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.current_period_rule, CurrentPeriodRule::CarryFromPreviousYear);
        assert_eq!(
            config.table_path(TableKind::YearlyForecasts),
            PathBuf::from("data/yearly_forecasts.csv")
        );
    }

    #[test]
    fn test_partial_toml() {
        let config = AppConfig::from_toml_str(
            r#"
            data_dir = "/srv/cardology"
            current_period_rule = "same_year_only"

            [files]
            card_profiles = "profiles_v2.csv"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/cardology"));
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.current_period_rule, CurrentPeriodRule::SameYearOnly);
        assert_eq!(config.files.card_profiles, "profiles_v2.csv");
        assert_eq!(config.files.birthdate_cards, "birthdate_cards.csv");
    }

    #[test]
    fn test_invalid_toml_rejected() {
        assert!(AppConfig::from_toml_str("current_period_rule = \"sometimes\"").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [(ENV_DATA_DIR, "/tmp/tables"), (ENV_BIND, "127.0.0.1:8080")]
            .into_iter()
            .collect();

        let config = AppConfig::load_with(|key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/tables"));
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let result = AppConfig::load_with(|key| {
            (key == ENV_CONFIG).then(|| "/definitely/not/here.toml".to_string())
        });
        assert!(result.is_err());
    }
}
