//! Service layer for the export pipeline.
//!
//! This module contains the business logic for:
//! - Keyword rule evaluation (`KeywordRuleEngine`)
//! - Seller blocklisting (`SellerBlocklist`)
//! - Listing classification (`EligibilityEvaluator`)
//! - Rule and blocklist CSV interchange (`import`)

mod eligibility;
pub mod import;
pub mod keywords;
mod sellers;

pub use eligibility::EligibilityEvaluator;
pub use keywords::{KeywordRuleEngine, KeywordVerdict};
pub use sellers::SellerBlocklist;
