use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub const ENV_PREFIX: &str = "JOURNAL";
pub const DEFAULT_DATABASE_URL: &str = "sqlite:./trade_journal.db";

/// Journal-wide settings, layered: defaults, then TOML file, then `JOURNAL_*` env vars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// When > 0, charged per unit instead of each trade's recorded commission.
    pub commission_per_unit: Decimal,
    /// Largest acceptable drawdown in currency; 0 disables the check.
    pub max_drawdown_goal: Decimal,
    pub database_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            commission_per_unit: Decimal::ZERO,
            max_drawdown_goal: Decimal::ZERO,
            database_url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

impl Settings {
    /// Load settings, reading `.env` first. Without `path`, an optional
    /// `journal.toml` in the working directory is used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::layered(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn layered(path: Option<&Path>, env: Environment) -> Result<Self> {
        let defaults = Self::default();

        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("journal").required(false),
        };

        let settings: Settings = Config::builder()
            .set_default("commission_per_unit", defaults.commission_per_unit.to_string())?
            .set_default("max_drawdown_goal", defaults.max_drawdown_goal.to_string())?
            .set_default("database_url", defaults.database_url)?
            .add_source(file)
            .add_source(env)
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Failed to parse settings")?;

        if let Err(errors) = settings.validate() {
            anyhow::bail!("Invalid settings: {}", errors.join("; "));
        }

        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.commission_per_unit < Decimal::ZERO {
            errors.push("commission_per_unit must be >= 0".to_string());
        }
        if self.max_drawdown_goal < Decimal::ZERO {
            errors.push("max_drawdown_goal must be >= 0".to_string());
        }
        if self.database_url.trim().is_empty() {
            errors.push("database_url must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    fn write_temp(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("journal-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.database_url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn test_validate_collects_every_problem() {
        let settings = Settings {
            commission_per_unit: dec!(-1),
            max_drawdown_goal: dec!(-5),
            database_url: " ".to_string(),
        };
        let errors = settings.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_env_overrides_file() {
        let path = write_temp("commission_per_unit = \"0.62\"\nmax_drawdown_goal = \"1500\"\n");
        let settings = Settings::layered(Some(path.as_path()), env(&[("JOURNAL_MAX_DRAWDOWN_GOAL", "800")])).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.commission_per_unit, dec!(0.62));
        assert_eq!(settings.max_drawdown_goal, dec!(800));
        assert_eq!(settings.database_url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn test_invalid_layered_settings_are_rejected() {
        let result = Settings::layered(None, env(&[("JOURNAL_COMMISSION_PER_UNIT", "-0.5")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_required_file_is_an_error() {
        let missing = std::env::temp_dir().join("journal-does-not-exist.toml");
        assert!(Settings::layered(Some(missing.as_path()), env(&[])).is_err());
    }

    #[test]
    fn test_toml_output_loads_back() {
        let settings = Settings {
            commission_per_unit: dec!(0.25),
            max_drawdown_goal: dec!(2000),
            database_url: "sqlite::memory:".to_string(),
        };
        let path = write_temp(&settings.to_toml().unwrap());
        let loaded = Settings::layered(Some(path.as_path()), env(&[])).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, settings);
    }
}
