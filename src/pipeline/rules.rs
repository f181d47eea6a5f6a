// src/pipeline/rules.rs

//! Keyword rule and seller blocklist maintenance from CSV files.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::Result;
use crate::services::import::{
    merge_keyword_rules, merge_seller_entries, parse_keyword_csv, parse_seller_csv,
    write_keyword_csv,
};
use crate::storage::ListingStore;
use crate::utils::log;

/// Merge keyword rules from a CSV file into the store. Returns the number
/// of new rules.
pub async fn run_import_keywords(store: &dyn ListingStore, path: &Path) -> Result<usize> {
    log::header("Importing keyword rules");

    let imported = parse_keyword_csv(File::open(path)?)?;
    let parsed = imported.len();

    let mut rules = store.load_keyword_rules().await?;
    let added = merge_keyword_rules(&mut rules, imported);
    if added > 0 {
        store.save_keyword_rules(&rules).await?;
    }

    log::success(&format!(
        "{} rule(s) read, {} added, {} total",
        parsed,
        added,
        rules.len()
    ));
    Ok(added)
}

/// Write the stored keyword rules to a CSV file. Returns the rule count.
pub async fn run_export_keywords(store: &dyn ListingStore, path: &Path) -> Result<usize> {
    let rules = store.load_keyword_rules().await?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_keyword_csv(&rules, BufWriter::new(File::create(path)?))?;

    log::success(&format!(
        "{} rule(s) written to {}",
        rules.len(),
        path.display()
    ));
    Ok(rules.len())
}

/// Merge seller blocklist entries from a CSV file. Returns the number of
/// new entries.
pub async fn run_import_sellers(store: &dyn ListingStore, path: &Path) -> Result<usize> {
    log::header("Importing NG sellers");

    let imported = parse_seller_csv(File::open(path)?)?;
    let parsed = imported.len();

    let mut entries = store.load_seller_entries().await?;
    let added = merge_seller_entries(&mut entries, imported);
    if added > 0 {
        store.save_seller_entries(&entries).await?;
    }

    log::success(&format!(
        "{} seller(s) read, {} added, {} total",
        parsed,
        added,
        entries.len()
    ));
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{KeywordRule, RuleKind};
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    #[tokio::test]
    async fn import_merges_and_export_writes() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path());
        store
            .save_keyword_rules(&[KeywordRule::exclude("ジャンク")])
            .await
            .unwrap();

        let csv = tmp.path().join("rules.csv");
        std::fs::write(
            &csv,
            "キーワード,フィルタータイプ,アクティブ\nジャンク,除外,有効\n[,文字削除,有効\n",
        )
        .unwrap();

        assert_eq!(run_import_keywords(&store, &csv).await.unwrap(), 1);
        let rules = store.load_keyword_rules().await.unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].kind, RuleKind::Redact);

        let out = tmp.path().join("out/rules.csv");
        assert_eq!(run_export_keywords(&store, &out).await.unwrap(), 2);
        let written = std::fs::read_to_string(out).unwrap();
        assert!(written.contains("[,文字削除,有効"));
    }

    #[tokio::test]
    async fn import_sellers_skips_known() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path());
        let csv = tmp.path().join("sellers.csv");
        std::fs::write(&csv, "platform,seller_id,name,reason\nmercari,1,,\nmercari,1,,\n").unwrap();

        assert_eq!(run_import_sellers(&store, &csv).await.unwrap(), 1);
        assert_eq!(run_import_sellers(&store, &csv).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path());
        let err = run_import_keywords(&store, &tmp.path().join("nope.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::AppError::Io(_)));
    }
}
