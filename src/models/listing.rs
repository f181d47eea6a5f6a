//! Listing data structure.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Item condition as labelled by the flea-market platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    NewUnused,
    LikeNew,
    NoNoticeableWear,
    SomeWear,
    Wear,
    Poor,
}

impl Condition {
    pub const ALL: [Condition; 6] = [
        Condition::NewUnused,
        Condition::LikeNew,
        Condition::NoNoticeableWear,
        Condition::SomeWear,
        Condition::Wear,
        Condition::Poor,
    ];

    /// The platform's label for this condition.
    pub fn label(self) -> &'static str {
        match self {
            Condition::NewUnused => "新品、未使用",
            Condition::LikeNew => "未使用に近い",
            Condition::NoNoticeableWear => "目立った傷や汚れなし",
            Condition::SomeWear => "やや傷や汚れあり",
            Condition::Wear => "傷や汚れあり",
            Condition::Poor => "全体的に状態が悪い",
        }
    }

    /// Parse a platform label. Unknown labels (including the scraper's
    /// placeholder values) yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A listing scraped from the source platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Listing {
    /// Record identifier, used as the seller SKU on export
    pub id: String,

    /// Source platform code (e.g. "mercari")
    #[serde(default)]
    pub platform: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Source cost in yen
    #[serde(default)]
    pub price: Option<i64>,

    /// Intended resale price in yen
    #[serde(default)]
    pub listing_price: Option<i64>,

    /// Raw condition label
    #[serde(default)]
    pub condition: Option<String>,

    #[serde(default)]
    pub seller_code: Option<String>,

    #[serde(default)]
    pub seller_name: Option<String>,

    /// Brand as listed by the seller, if any
    #[serde(default)]
    pub brand: Option<String>,

    /// Image URLs, main image first
    #[serde(default)]
    pub images: Vec<String>,

    /// Set by bulk operations (blocklisting, condition filtering)
    #[serde(default)]
    pub is_filtered: bool,

    #[serde(default)]
    pub exported: bool,

    #[serde(default)]
    pub exported_at: Option<DateTime<Utc>>,
}

impl Listing {
    /// Parsed condition, if the label is one of the canonical values.
    pub fn parsed_condition(&self) -> Option<Condition> {
        self.condition.as_deref().and_then(Condition::from_label)
    }

    /// Whether the listing is labelled new/unused.
    pub fn is_new(&self) -> bool {
        self.parsed_condition() == Some(Condition::NewUnused)
    }

    /// Seller code with surrounding whitespace removed; `None` when blank.
    pub fn seller(&self) -> Option<&str> {
        self.seller_code
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Brand with surrounding whitespace removed; `None` when blank.
    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Price to list at: resale price, then source price, then zero.
    pub fn effective_price(&self) -> i64 {
        self.listing_price
            .filter(|p| *p != 0)
            .or(self.price)
            .unwrap_or(0)
    }
}
