//! Pipeline entry points for listing operations.
//!
//! - `run_classify`: Classify stored listings and summarize
//! - `run_export`: Classify, build and write a marketplace feed
//! - `run_filter_non_new`: Flag listings that are not new/unused
//! - `run_import_keywords` / `run_export_keywords` / `run_import_sellers`:
//!   CSV rule maintenance
//! - `run_validate`: Check configuration and contracts

pub mod classify;
pub mod export;
pub mod filter;
pub mod rules;
pub mod validate;

pub use classify::{ClassifyOutcome, build_evaluator, run_classify};
pub use export::{ExportOptions, ExportSummary, Feed, build_feed, run_export};
pub use filter::{non_new_ids, run_filter_non_new};
pub use rules::{run_export_keywords, run_import_keywords, run_import_sellers};
pub use validate::run_validate;
