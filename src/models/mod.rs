// src/models/mod.rs

//! Domain models for the export pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod classification;
mod config;
mod listing;
mod rules;

// Re-export all public types
pub use classification::{
    Classification, ClassificationMode, ClassificationReport, ClassificationSummary,
    ConditionPolicy, Reason,
};
pub use config::{Config, EligibilityConfig, ExportConfig, LoggingConfig};
pub use listing::{Condition, Listing};
pub use rules::{KeywordRule, RuleKind, RuleSource, SellerBlockEntry};
