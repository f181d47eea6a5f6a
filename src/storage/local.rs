//! Local filesystem storage implementation.
//!
//! All files are JSON and written atomically (temp file, then rename), so
//! an interrupted run leaves the previous version in place.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{KeywordRule, Listing, SellerBlockEntry};
use crate::storage::{ListingStore, ListingsData, ListingsFile, WriteMetadata};

const LISTINGS: &str = "listings.json";
const KEYWORD_RULES: &str = "keyword_rules.json";
const NG_SELLERS: &str = "ng_sellers.json";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    export_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory. Exports go
    /// to `exports/` under the root.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            export_dir: PathBuf::from("exports"),
        }
    }

    /// Override the export directory. Relative paths are resolved against
    /// the storage root.
    pub fn with_export_dir(mut self, export_dir: impl Into<PathBuf>) -> Self {
        self.export_dir = export_dir.into();
        self
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_path(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_dir(path).await?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.write_path(&self.path(key), bytes).await
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Load, mutate and save listings; returns how many the closure changed.
    async fn update_listings<F>(&self, ids: &[String], mut update: F) -> Result<usize>
    where
        F: FnMut(&mut Listing) -> bool + Send,
    {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut listings = self.load_listings().await?;

        let mut changed = 0;
        for listing in listings.iter_mut().filter(|l| wanted.contains(l.id.as_str())) {
            if update(listing) {
                changed += 1;
            }
        }

        if changed > 0 {
            self.save_listings(&listings).await?;
        }
        Ok(changed)
    }
}

#[async_trait]
impl ListingStore for LocalStorage {
    async fn load_listings(&self) -> Result<Vec<Listing>> {
        match self.read_json::<ListingsFile>(LISTINGS).await? {
            Some(file) => Ok(file.into_listings()),
            None => {
                log::warn!("No {} found", LISTINGS);
                Ok(Vec::new())
            }
        }
    }

    async fn save_listings(&self, listings: &[Listing]) -> Result<WriteMetadata> {
        let data = ListingsData::new(listings.to_vec());
        self.write_json(LISTINGS, &data).await?;
        log::debug!("{} listing(s) written to {}", data.count, LISTINGS);
        Ok(WriteMetadata {
            count: data.count,
            timestamp: data.updated_at,
        })
    }

    async fn load_keyword_rules(&self) -> Result<Vec<KeywordRule>> {
        Ok(self.read_json(KEYWORD_RULES).await?.unwrap_or_default())
    }

    async fn save_keyword_rules(&self, rules: &[KeywordRule]) -> Result<WriteMetadata> {
        self.write_json(KEYWORD_RULES, rules).await?;
        Ok(WriteMetadata {
            count: rules.len(),
            timestamp: Utc::now(),
        })
    }

    async fn load_seller_entries(&self) -> Result<Vec<SellerBlockEntry>> {
        Ok(self.read_json(NG_SELLERS).await?.unwrap_or_default())
    }

    async fn save_seller_entries(&self, entries: &[SellerBlockEntry]) -> Result<WriteMetadata> {
        self.write_json(NG_SELLERS, entries).await?;
        Ok(WriteMetadata {
            count: entries.len(),
            timestamp: Utc::now(),
        })
    }

    async fn mark_exported(&self, ids: &[String], at: DateTime<Utc>) -> Result<usize> {
        self.update_listings(ids, |listing| {
            listing.exported = true;
            listing.exported_at = Some(at);
            true
        })
        .await
    }

    async fn mark_filtered(&self, ids: &[String]) -> Result<usize> {
        self.update_listings(ids, |listing| {
            let changed = !listing.is_filtered;
            listing.is_filtered = true;
            changed
        })
        .await
    }

    async fn write_export(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        let path = self.root_dir.join(&self.export_dir).join(file_name);
        self.write_path(&path, bytes).await?;
        log::info!("Export written to {}", path.display());
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn listing(id: &str) -> Listing {
        Listing {
            id: id.to_string(),
            platform: "mercari".to_string(),
            title: "レザー バッグ".to_string(),
            price: Some(12000),
            ..Listing::default()
        }
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_bytes("test.txt", b"hello").await.unwrap();
        let data = storage.read_bytes("test.txt").await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
        assert!(!tmp.path().join("test.txt.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_files_are_empty() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        assert!(storage.load_listings().await.unwrap().is_empty());
        assert!(storage.load_keyword_rules().await.unwrap().is_empty());
        assert!(storage.load_seller_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listings_round_trip_in_order() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let listings = vec![listing("b"), listing("a"), listing("c")];
        let meta = storage.save_listings(&listings).await.unwrap();
        assert_eq!(meta.count, 3);

        let loaded = storage.load_listings().await.unwrap();
        assert_eq!(loaded, listings);
    }

    #[tokio::test]
    async fn test_bare_array_is_accepted() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage
            .write_bytes(LISTINGS, br#"[{"id": "m1", "title": "t", "price": 5000}]"#)
            .await
            .unwrap();
        let loaded = storage.load_listings().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].price, Some(5000));
        assert!(!loaded[0].exported);
    }

    #[tokio::test]
    async fn test_mark_exported() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        storage
            .save_listings(&[listing("a"), listing("b")])
            .await
            .unwrap();

        let at = Utc::now();
        let updated = storage
            .mark_exported(&["b".to_string(), "zzz".to_string()], at)
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let loaded = storage.load_listings().await.unwrap();
        assert!(!loaded[0].exported);
        assert!(loaded[1].exported);
        assert_eq!(loaded[1].exported_at, Some(at));
    }

    #[tokio::test]
    async fn test_mark_filtered_counts_changes() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let mut flagged = listing("a");
        flagged.is_filtered = true;
        storage.save_listings(&[flagged, listing("b")]).await.unwrap();

        let changed = storage
            .mark_filtered(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(changed, 1);
        assert!(storage.load_listings().await.unwrap().iter().all(|l| l.is_filtered));
    }

    #[tokio::test]
    async fn test_rules_and_sellers_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let rules = vec![KeywordRule::exclude("ジャンク"), KeywordRule::redact("[")];
        storage.save_keyword_rules(&rules).await.unwrap();
        assert_eq!(storage.load_keyword_rules().await.unwrap(), rules);

        let sellers = vec![SellerBlockEntry {
            platform: "mercari".to_string(),
            seller_id: "123".to_string(),
            seller_name: None,
            reason: Some("偽物".to_string()),
        }];
        storage.save_seller_entries(&sellers).await.unwrap();
        assert_eq!(storage.load_seller_entries().await.unwrap(), sellers);
    }

    #[tokio::test]
    async fn test_write_export_under_export_dir() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path()).with_export_dir("out");

        let location = storage
            .write_export("Amazon_inventory_20250101T000000.tsv", b"data")
            .await
            .unwrap();
        let expected = tmp.path().join("out/Amazon_inventory_20250101T000000.tsv");
        assert_eq!(location, expected.display().to_string());
        assert_eq!(std::fs::read(expected).unwrap(), b"data");
    }
}
