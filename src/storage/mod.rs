//! Storage abstractions for listings, rules and export files.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml           # Pipeline configuration
//! ├── listings.json         # Scraped listings with filter/export flags
//! ├── keyword_rules.json    # Exclusion and redaction rules
//! ├── ng_sellers.json       # Administered seller blocklist
//! └── exports/              # Generated flat files
//!     └── Amazon_inventory_YYYYMMDDTHHMMSS.tsv
//! ```

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{KeywordRule, Listing, SellerBlockEntry};

// Re-export for convenience
pub use local::LocalStorage;

/// Metadata about a storage write operation.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    /// Number of records in the written file
    pub count: usize,
    /// Timestamp of the write
    pub timestamp: DateTime<Utc>,
}

/// Envelope for listings.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingsData {
    /// ISO 8601 timestamp of last update
    pub updated_at: DateTime<Utc>,
    /// Total listing count
    pub count: usize,
    /// The listings array
    pub listings: Vec<Listing>,
}

impl ListingsData {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self {
            updated_at: Utc::now(),
            count: listings.len(),
            listings,
        }
    }
}

/// listings.json as written by us or as a bare array from a scraper dump.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListingsFile {
    Wrapped(ListingsData),
    Bare(Vec<Listing>),
}

impl ListingsFile {
    pub(crate) fn into_listings(self) -> Vec<Listing> {
        match self {
            ListingsFile::Wrapped(data) => data.listings,
            ListingsFile::Bare(listings) => listings,
        }
    }
}

/// Trait for listing storage backends.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Load all listings in stored order. Missing data is an empty list.
    async fn load_listings(&self) -> Result<Vec<Listing>>;

    /// Replace the stored listings.
    async fn save_listings(&self, listings: &[Listing]) -> Result<WriteMetadata>;

    async fn load_keyword_rules(&self) -> Result<Vec<KeywordRule>>;

    async fn save_keyword_rules(&self, rules: &[KeywordRule]) -> Result<WriteMetadata>;

    async fn load_seller_entries(&self) -> Result<Vec<SellerBlockEntry>>;

    async fn save_seller_entries(&self, entries: &[SellerBlockEntry]) -> Result<WriteMetadata>;

    /// Flag listings as exported at `at`. Returns how many were updated;
    /// unknown ids are ignored.
    async fn mark_exported(&self, ids: &[String], at: DateTime<Utc>) -> Result<usize>;

    /// Set `is_filtered` on listings. Returns how many changed.
    async fn mark_filtered(&self, ids: &[String]) -> Result<usize>;

    /// Persist a generated export file and return where it was written.
    async fn write_export(&self, file_name: &str, bytes: &[u8]) -> Result<String>;
}
