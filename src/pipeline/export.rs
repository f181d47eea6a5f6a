// src/pipeline/export.rs

//! Classify, build and serialize a marketplace feed.

use std::path::Path;

use chrono::{Local, Utc};

use crate::config::{load_contract, load_template};
use crate::error::Result;
use crate::export::{ColumnContract, ExportFormat, ExportKind, RecordBuilder, serialize};
use crate::models::{ClassificationMode, Config, Listing};
use crate::services::EligibilityEvaluator;
use crate::storage::ListingStore;
use crate::utils::log;

use super::classify::{ClassifyOutcome, build_evaluator};

/// Serialized feed plus the listings it contains.
#[derive(Debug, Clone)]
pub struct Feed {
    pub bytes: Vec<u8>,
    /// Exported listing ids, in row order
    pub listing_ids: Vec<String>,
    pub outcome: ClassifyOutcome,
}

/// Classify `listings` and serialize the exportable ones.
///
/// Rows follow input order. NG listings under `mode` are left out.
pub fn build_feed(
    listings: &[Listing],
    evaluator: &EligibilityEvaluator,
    mode: ClassificationMode,
    contract: &ColumnContract,
    format: ExportFormat<'_>,
    min_listing_price: i64,
) -> Result<Feed> {
    let outcome = ClassifyOutcome::new(evaluator.classify_batch(listings), mode);

    // Reports are positional; ids need not be unique.
    let selected: Vec<&Listing> = listings
        .iter()
        .zip(&outcome.reports)
        .filter(|(_, report)| report.is_exportable(mode))
        .map(|(listing, _)| listing)
        .collect();

    let builder = RecordBuilder::new(contract, min_listing_price);
    let records: Vec<_> = selected.iter().map(|l| builder.build(l)).collect();
    let bytes = serialize(&records, contract, format)?;

    Ok(Feed {
        bytes,
        listing_ids: selected.iter().map(|l| l.id.clone()).collect(),
        outcome,
    })
}

/// Options for an export run.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub kind: ExportKind,
    /// Flag exported listings in the store
    pub mark_exported: bool,
    /// Re-export listings already marked exported
    pub include_exported: bool,
}

/// What an export run produced.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub location: String,
    pub file_name: String,
    pub content_type: &'static str,
    pub rows: usize,
    pub skipped: usize,
    pub marked: usize,
}

/// Run an export against the store and write the file.
pub async fn run_export(
    store: &dyn ListingStore,
    config: &Config,
    base_path: &Path,
    options: &ExportOptions,
) -> Result<ExportSummary> {
    log::header(&format!("Exporting {} feed", options.kind));
    let total_steps = if options.mark_exported { 4 } else { 3 };

    log::step(1, total_steps, "Load - Reading listings and rules");
    let stored = store.load_listings().await?;
    let listings: Vec<Listing> = stored
        .iter()
        .filter(|l| options.include_exported || !l.exported)
        .cloned()
        .collect();
    log::info(&format!(
        "{} listing(s) to consider ({} stored)",
        listings.len(),
        stored.len()
    ));

    let contract = load_contract(&config.export, base_path, options.kind)?;
    log::sub_item(&format!(
        "Contract: {} ({} columns)",
        contract.name(),
        contract.column_count()
    ));
    let template = match options.kind {
        ExportKind::Tsv => None,
        ExportKind::Xlsm => Some(load_template(&config.export, base_path).await?),
    };
    let format = match &template {
        Some(template) => ExportFormat::Xlsm { template },
        None => ExportFormat::Tsv,
    };

    // The implicit blocklist covers every stored listing, exported or not.
    let evaluator = build_evaluator(store, &stored, &config.eligibility).await?;

    log::step(2, total_steps, "Build - Classifying and serializing");
    let feed = build_feed(
        &listings,
        &evaluator,
        config.eligibility.mode,
        &contract,
        format,
        config.export.min_listing_price,
    )?;

    log::step(3, total_steps, "Write - Saving export file");
    let file_name = options.kind.file_name(Local::now());
    let location = store.write_export(&file_name, &feed.bytes).await?;

    let marked = if options.mark_exported {
        log::step(4, total_steps, "Mark - Flagging exported listings");
        store.mark_exported(&feed.listing_ids, Utc::now()).await?
    } else {
        0
    };

    let summary = ExportSummary {
        location,
        file_name,
        content_type: options.kind.content_type(),
        rows: feed.listing_ids.len(),
        skipped: listings.len() - feed.listing_ids.len(),
        marked,
    };

    log::success(&format!(
        "Exported {} row(s) to {}",
        summary.rows, summary.location
    ));
    log::summary(
        "Export",
        &[
            ("File", summary.file_name.clone()),
            ("Rows", summary.rows.to_string()),
            ("Skipped (NG)", summary.skipped.to_string()),
            ("Marked exported", summary.marked.to_string()),
            ("Content type", summary.content_type.to_string()),
        ],
    );

    Ok(summary)
}
