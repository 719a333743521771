use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::error::TouchpointError;

/// Default trailing attribution window, in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 14;

/// Upper bound for `attribution.window_days`.
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Upper bound for `generator.history_days`.
pub const MAX_HISTORY_DAYS: u32 = 3650;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TouchpointConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub attribution: AttributionConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AttributionConfig {
    pub window_days: u32,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl AttributionConfig {
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.window_days))
    }

    pub fn validate(&self) -> Result<(), TouchpointError> {
        if self.window_days > MAX_WINDOW_DAYS {
            return Err(TouchpointError::InvalidConfig(format!(
                "attribution.window_days must be <= {}, got {}",
                MAX_WINDOW_DAYS, self.window_days
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeneratorConfig {
    pub session_count: usize,
    pub user_count: usize,
    pub history_days: u32,
    pub marketing_rate: f64,
    pub activation_rate: f64,
    pub adsets_per_campaign: u32,
    pub ads_per_adset: u32,
    pub landing_url: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            session_count: 1000,
            user_count: 500,
            history_days: 30,
            marketing_rate: 0.3,
            activation_rate: 0.05,
            adsets_per_campaign: 10,
            ads_per_adset: 5,
            landing_url: "https://guard.io/".to_string(),
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), TouchpointError> {
        if self.user_count == 0 && self.session_count > 0 {
            return Err(TouchpointError::InvalidConfig(
                "generator.user_count must be > 0 when sessions are requested".to_string(),
            ));
        }
        for (name, rate) in [
            ("marketing_rate", self.marketing_rate),
            ("activation_rate", self.activation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(TouchpointError::InvalidConfig(format!(
                    "generator.{} must be within [0, 1], got {}",
                    name, rate
                )));
            }
        }
        if self.history_days > MAX_HISTORY_DAYS {
            return Err(TouchpointError::InvalidConfig(format!(
                "generator.history_days must be <= {}, got {}",
                MAX_HISTORY_DAYS, self.history_days
            )));
        }
        if self.adsets_per_campaign == 0 || self.ads_per_adset == 0 {
            return Err(TouchpointError::InvalidConfig(
                "generator.adsets_per_campaign and generator.ads_per_adset must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl TouchpointConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = TouchpointConfig::default();
        assert_eq!(config.attribution.window_days, 14);
        assert_eq!(config.attribution.window(), chrono::Duration::days(14));
        assert_eq!(config.generator.session_count, 1000);
        assert_eq!(config.generator.user_count, 500);
        assert!(config.generator.validate().is_ok());
    }

    #[test]
    fn test_load_partial_toml_fills_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[attribution]\nwindow_days = 7\n\n[generator]\nuser_count = 20").unwrap();

        let config = TouchpointConfig::load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.attribution.window_days, 7);
        assert_eq!(config.generator.user_count, 20);
        assert_eq!(config.generator.session_count, 1000);
        assert_eq!(config.service.log_level, "info");
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = TouchpointConfig::load("/nonexistent/touchpoint-config.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_rate() {
        let config = GeneratorConfig {
            activation_rate: 1.5,
            ..GeneratorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("activation_rate"));
    }

    #[test]
    fn test_attribution_table_without_window_uses_default() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[attribution]\n\n[generator]\nuser_count = 20").unwrap();

        let config = TouchpointConfig::load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.attribution.window_days, DEFAULT_WINDOW_DAYS);
    }

    #[test]
    fn test_attribution_validate_bounds_window() {
        assert!(AttributionConfig::default().validate().is_ok());
        assert!(AttributionConfig { window_days: 0 }.validate().is_ok());
        assert!(AttributionConfig { window_days: MAX_WINDOW_DAYS }.validate().is_ok());

        let err = AttributionConfig { window_days: 200_000_000 }.validate().unwrap_err();
        assert!(matches!(err, TouchpointError::InvalidConfig(_)));
        assert!(err.to_string().contains("window_days"));
    }

    #[test]
    fn test_validate_rejects_huge_history() {
        let config = GeneratorConfig {
            history_days: 200_000_000,
            ..GeneratorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("history_days"));

        let config = GeneratorConfig {
            history_days: MAX_HISTORY_DAYS,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_users() {
        let config = GeneratorConfig {
            user_count: 0,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
