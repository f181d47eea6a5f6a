// src/pipeline/validate.rs

use std::path::Path;

use crate::config::{load_all, load_contract};
use crate::error::Result;
use crate::export::ExportKind;
use crate::utils::log;

/// Validate configuration and the contracts it selects.
pub fn run_validate(base_path: &Path) -> Result<()> {
    log::header("Validating configuration");

    match load_all(base_path) {
        Ok((config, contract)) => {
            log::success("Configuration OK");
            let eligibility = &config.eligibility;
            log::sub_item(&format!("Mode: {:?}", eligibility.mode));
            log::sub_item(&format!(
                "Condition policy: {:?}",
                eligibility.condition_policy
            ));
            log::sub_item(&format!(
                "Minimum source price: ¥{}",
                eligibility.min_source_price
            ));
            log::sub_item(&format!(
                "Minimum listing price: ¥{}",
                config.export.min_listing_price
            ));

            log::success(&format!("Contract OK: {}", contract.name()));
            log::sub_item(&format!("Version: {}", contract.version()));
            log::sub_item(&format!("Columns: {}", contract.column_count()));
            log::sub_item(&format!("Header rows: {}", contract.header_rows().len()));

            match load_contract(&config.export, base_path, ExportKind::Xlsm) {
                Ok(sheet) => log::sub_item(&format!("Workbook contract: {}", sheet.name())),
                Err(e) => log::warn(&format!("Workbook contract unavailable: {e}")),
            }
            match &config.export.template_path {
                Some(path) if base_path.join(path).exists() => {
                    log::sub_item(&format!("Template: {}", path.display()))
                }
                Some(path) => log::warn(&format!("Template not found: {}", path.display())),
                None => log::sub_item("Template: not configured (xlsm export disabled)"),
            }
            Ok(())
        }
        Err(e) => {
            log::error(&format!("Validation failed: {e}"));
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_validate() {
        let tmp = TempDir::new().unwrap();
        assert!(run_validate(tmp.path()).is_ok());
    }

    #[test]
    fn unknown_contract_fails() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("config.toml"),
            "[export]\ncontract = \"amazon-tsv-1999\"\n",
        )
        .unwrap();
        assert!(run_validate(tmp.path()).is_err());
    }
}
