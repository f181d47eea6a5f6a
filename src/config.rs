// src/config.rs

//! Configuration loading utilities.
//!
//! Convenience functions for loading the pipeline configuration, the
//! column contract it selects and the vendor template workbook, all
//! relative to the storage directory.

use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::export::{ColumnContract, ExportKind};
use crate::models::{Config, ExportConfig};
use crate::utils::log;

/// Config file name inside the storage directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file is missing or unreadable; a file
/// that loads but fails validation is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load(path).or_else(|e| {
        log::warn(&format!("Failed to load config from {path:?}: {e}"));
        log::warn("Using default configuration.");
        Ok::<_, AppError>(Config::default())
    })?;
    config.validate()?;
    Ok(config)
}

fn resolve(base_path: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_path.join(path)
    }
}

/// Load the contract used for an output kind.
///
/// Delimited output uses `export.contract_path` when set, else the built-in
/// `export.contract`; workbook output uses `export.spreadsheet_contract`.
pub fn load_contract(
    export: &ExportConfig,
    base_path: &Path,
    kind: ExportKind,
) -> Result<ColumnContract> {
    let contract = match (kind, &export.contract_path) {
        (ExportKind::Tsv, Some(path)) => ColumnContract::load(resolve(base_path, path))?,
        (ExportKind::Tsv, None) => ColumnContract::builtin(&export.contract)?,
        (ExportKind::Xlsm, _) => ColumnContract::builtin(&export.spreadsheet_contract)?,
    };

    if kind == ExportKind::Xlsm && contract.spreadsheet().is_none() {
        return Err(AppError::contract(
            contract.version(),
            "selected for workbook output but has no [spreadsheet] layout",
        ));
    }
    Ok(contract)
}

/// Read the vendor template workbook.
pub async fn load_template(export: &ExportConfig, base_path: &Path) -> Result<Vec<u8>> {
    let path = export
        .template_path
        .as_deref()
        .map(|p| resolve(base_path, p))
        .ok_or_else(|| AppError::config("export.template_path is required for xlsm output"))?;

    tokio::fs::read(&path).await.map_err(|e| {
        AppError::template(format!("cannot read template {}: {e}", path.display()))
    })
}

/// Load and validate the configuration and its delimited contract.
pub fn load_all(base_path: &Path) -> Result<(Config, ColumnContract)> {
    let config = load_config(&base_path.join(CONFIG_FILE))?;
    let contract = load_contract(&config.export, base_path, ExportKind::Tsv)?;
    Ok((config, contract))
}
