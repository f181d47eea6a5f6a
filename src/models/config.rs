//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::export::ExportKind;
use crate::models::{ClassificationMode, ConditionPolicy};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Listing eligibility rules
    #[serde(default)]
    pub eligibility: EligibilityConfig,

    /// Flat-file export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Console output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.eligibility.min_source_price < 0 {
            return Err(AppError::validation(
                "eligibility.min_source_price must be >= 0",
            ));
        }
        if self.export.min_listing_price <= 0 {
            return Err(AppError::validation(
                "export.min_listing_price must be > 0",
            ));
        }
        if self.export.contract.trim().is_empty() && self.export.contract_path.is_none() {
            return Err(AppError::validation(
                "export.contract or export.contract_path must be set",
            ));
        }
        if self.export.output_dir.as_os_str().is_empty() {
            return Err(AppError::validation("export.output_dir is empty"));
        }
        Ok(())
    }
}

/// Eligibility evaluation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityConfig {
    /// Whether only new/unused listings are eligible
    #[serde(default)]
    pub condition_policy: ConditionPolicy,

    /// Whether condition and price exclusions count as NG
    #[serde(default)]
    pub mode: ClassificationMode,

    /// Source prices below this are excluded (yen)
    #[serde(default = "defaults::min_source_price")]
    pub min_source_price: i64,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            condition_policy: ConditionPolicy::default(),
            mode: ClassificationMode::default(),
            min_source_price: defaults::min_source_price(),
        }
    }
}

/// Flat-file export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Default output format
    #[serde(default)]
    pub format: ExportKind,

    /// Built-in contract version to use
    #[serde(default = "defaults::contract")]
    pub contract: String,

    /// External contract file, overrides `contract` when set
    #[serde(default)]
    pub contract_path: Option<PathBuf>,

    /// Spreadsheet contract version
    #[serde(default = "defaults::spreadsheet_contract")]
    pub spreadsheet_contract: String,

    /// Price substituted when a listing has no positive price (yen)
    #[serde(default = "defaults::min_listing_price")]
    pub min_listing_price: i64,

    /// Vendor template workbook for spreadsheet export
    #[serde(default)]
    pub template_path: Option<PathBuf>,

    /// Directory export files are written to, relative to storage
    #[serde(default = "defaults::output_dir")]
    pub output_dir: PathBuf,

    /// Mark exported listings in the store
    #[serde(default = "defaults::mark_exported")]
    pub mark_exported: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportKind::default(),
            contract: defaults::contract(),
            contract_path: None,
            spreadsheet_contract: defaults::spreadsheet_contract(),
            min_listing_price: defaults::min_listing_price(),
            template_path: None,
            output_dir: defaults::output_dir(),
            mark_exported: defaults::mark_exported(),
        }
    }
}

/// Console output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::level")]
    pub level: String,

    /// Print a line per listing during classification
    #[serde(default)]
    pub show_progress: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::level(),
            show_progress: false,
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn min_source_price() -> i64 {
        10_000
    }

    pub fn contract() -> String {
        "amazon-tsv-2021.1014".into()
    }
    pub fn spreadsheet_contract() -> String {
        "amazon-xlsm-screws".into()
    }
    pub fn min_listing_price() -> i64 {
        100
    }
    pub fn output_dir() -> PathBuf {
        PathBuf::from("exports")
    }
    pub fn mark_exported() -> bool {
        true
    }

    pub fn level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_non_positive_price_floor() {
        let mut config = Config::default();
        config.export.min_listing_price = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_contract() {
        let mut config = Config::default();
        config.export.contract = " ".to_string();
        assert!(config.validate().is_err());

        config.export.contract_path = Some(PathBuf::from("contracts/custom.toml"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [eligibility]
            condition_policy = "any"
            mode = "loose"
            "#,
        )
        .unwrap();
        assert_eq!(config.eligibility.condition_policy, ConditionPolicy::Any);
        assert_eq!(config.eligibility.mode, ClassificationMode::Loose);
        assert_eq!(config.eligibility.min_source_price, 10_000);
        assert_eq!(config.export.min_listing_price, 100);
        assert_eq!(config.export.format, ExportKind::Tsv);
    }
}
