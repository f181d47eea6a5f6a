// src/services/sellers.rs

//! Seller blocklist.
//!
//! Two sources are unioned: sellers of listings already flagged
//! `is_filtered`, and administered blocklist entries.

use std::collections::HashSet;

use crate::models::{Listing, SellerBlockEntry};

/// Set of blocked seller identifiers.
#[derive(Debug, Clone, Default)]
pub struct SellerBlocklist {
    implicit: HashSet<String>,
    administered: HashSet<String>,
}

impl SellerBlocklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every seller that has at least one flagged listing in the batch.
    pub fn from_listings(listings: &[Listing]) -> Self {
        let implicit = listings
            .iter()
            .filter(|l| l.is_filtered)
            .filter_map(Listing::seller)
            .map(str::to_string)
            .collect();

        Self {
            implicit,
            administered: HashSet::new(),
        }
    }

    /// Union administered entries into the blocklist.
    pub fn with_entries(mut self, entries: &[SellerBlockEntry]) -> Self {
        self.administered.extend(
            entries
                .iter()
                .map(|e| e.seller_id.trim())
                .filter(|id| !id.is_empty())
                .map(str::to_string),
        );
        self
    }

    pub fn is_blocked(&self, seller_id: &str) -> bool {
        let seller_id = seller_id.trim();
        !seller_id.is_empty()
            && (self.implicit.contains(seller_id) || self.administered.contains(seller_id))
    }

    /// Number of distinct blocked sellers.
    pub fn len(&self) -> usize {
        self.implicit.union(&self.administered).count()
    }

    pub fn is_empty(&self) -> bool {
        self.implicit.is_empty() && self.administered.is_empty()
    }

    pub fn implicit_count(&self) -> usize {
        self.implicit.len()
    }

    pub fn administered_count(&self) -> usize {
        self.administered.len()
    }
}
