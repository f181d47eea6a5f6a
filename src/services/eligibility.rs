// src/services/eligibility.rs

//! Listing eligibility evaluation.
//!
//! Rules are checked in a fixed precedence:
//!
//! 1. `is_filtered` flag set by a bulk operation
//! 2. seller on the blocklist
//! 3. exclusion keyword in the redacted title/description
//! 4. condition other than new/unused (only under [`ConditionPolicy::NewOnly`])
//! 5. source price below the configured floor
//!
//! Every rule is evaluated so the report lists all matched reasons; the
//! first one decides the classification.

use crate::models::{
    Classification, ClassificationReport, ConditionPolicy, EligibilityConfig, Listing, Reason,
};
use crate::services::{KeywordRuleEngine, SellerBlocklist};

/// Classifies listings against a rule set and blocklist.
#[derive(Debug, Clone)]
pub struct EligibilityEvaluator {
    keywords: KeywordRuleEngine,
    sellers: SellerBlocklist,
    config: EligibilityConfig,
}

impl EligibilityEvaluator {
    pub fn new(
        keywords: KeywordRuleEngine,
        sellers: SellerBlocklist,
        config: EligibilityConfig,
    ) -> Self {
        Self {
            keywords,
            sellers,
            config,
        }
    }

    pub fn config(&self) -> &EligibilityConfig {
        &self.config
    }

    /// Classify a single listing.
    pub fn classify(&self, listing: &Listing) -> ClassificationReport {
        let mut reasons = Vec::new();

        if listing.is_filtered {
            reasons.push(Reason::DbFlag);
        }

        if let Some(seller_id) = listing.seller() {
            if self.sellers.is_blocked(seller_id) {
                reasons.push(Reason::Seller {
                    seller_id: seller_id.to_string(),
                });
            }
        }

        let verdict = self.keywords.evaluate(&listing.title, &listing.description);
        reasons.extend(
            verdict
                .matched_exclude_keywords
                .into_iter()
                .map(|keyword| Reason::Keyword { keyword }),
        );

        if self.config.condition_policy == ConditionPolicy::NewOnly && !listing.is_new() {
            reasons.push(Reason::Condition {
                label: listing.condition.clone().unwrap_or_default(),
            });
        }

        if let Some(price) = listing.price {
            if price < self.config.min_source_price {
                reasons.push(Reason::LowPrice {
                    price,
                    floor: self.config.min_source_price,
                });
            }
        }

        let classification = reasons
            .first()
            .map(Reason::classification)
            .unwrap_or(Classification::Valid);

        ClassificationReport {
            listing_id: listing.id.clone(),
            classification,
            reasons,
        }
    }

    /// Classify a batch, preserving input order.
    pub fn classify_batch(&self, listings: &[Listing]) -> Vec<ClassificationReport> {
        listings.iter().map(|l| self.classify(l)).collect()
    }
}
