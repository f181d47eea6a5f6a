// src/pipeline/classify.rs

//! Classification run over the stored listings.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::{
    ClassificationMode, ClassificationReport, ClassificationSummary, EligibilityConfig, Listing,
};
use crate::services::{EligibilityEvaluator, KeywordRuleEngine, SellerBlocklist};
use crate::storage::ListingStore;
use crate::utils::log;

/// Result of classifying a batch.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyOutcome {
    pub generated_at: DateTime<Utc>,
    pub mode: ClassificationMode,
    pub summary: ClassificationSummary,
    /// One report per listing, in stored order
    pub reports: Vec<ClassificationReport>,
}

impl ClassifyOutcome {
    pub fn new(reports: Vec<ClassificationReport>, mode: ClassificationMode) -> Self {
        Self {
            generated_at: Utc::now(),
            mode,
            summary: ClassificationSummary::from_reports(&reports),
            reports,
        }
    }

    /// Listings that are not NG under the outcome's mode.
    pub fn exportable(&self) -> impl Iterator<Item = &ClassificationReport> {
        self.reports.iter().filter(|r| r.is_exportable(self.mode))
    }

    pub fn ng(&self) -> impl Iterator<Item = &ClassificationReport> {
        self.reports.iter().filter(|r| r.is_ng(self.mode))
    }

    /// Write the outcome as pretty JSON.
    pub async fn write_report(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}

/// Build an evaluator from the stored rules and blocklist. The implicit
/// seller blocklist is derived from `listings`.
pub async fn build_evaluator(
    store: &dyn ListingStore,
    listings: &[Listing],
    config: &EligibilityConfig,
) -> Result<EligibilityEvaluator> {
    let rules = store.load_keyword_rules().await?;
    let entries = store.load_seller_entries().await?;

    let keywords = KeywordRuleEngine::new(&rules);
    let sellers = SellerBlocklist::from_listings(listings).with_entries(&entries);

    log::sub_item(&format!(
        "Rules: {} exclusion, {} redaction",
        keywords.exclusion_count(),
        keywords.redaction_count()
    ));
    log::sub_item(&format!(
        "Blocked sellers: {} ({} from flagged listings, {} administered)",
        sellers.len(),
        sellers.implicit_count(),
        sellers.administered_count()
    ));

    Ok(EligibilityEvaluator::new(keywords, sellers, config.clone()))
}

/// Classify every stored listing.
pub async fn run_classify(
    store: &dyn ListingStore,
    config: &EligibilityConfig,
    show_progress: bool,
) -> Result<ClassifyOutcome> {
    log::header("Classifying listings");

    let listings = store.load_listings().await?;
    log::info(&format!("Loaded {} listing(s)", listings.len()));

    let evaluator = build_evaluator(store, &listings, config).await?;
    let reports = evaluator.classify_batch(&listings);

    if show_progress {
        for report in &reports {
            if report.reasons.is_empty() {
                log::debug(&format!("{}: {}", report.listing_id, report.classification));
            } else {
                log::sub_item(&format!(
                    "{}: {} ({})",
                    report.listing_id,
                    report.classification,
                    report.reason_strings().join(", ")
                ));
            }
        }
    }

    let outcome = ClassifyOutcome::new(reports, config.mode);
    log_summary(&outcome);
    Ok(outcome)
}

fn log_summary(outcome: &ClassifyOutcome) {
    let s = &outcome.summary;
    log::summary(
        "Classification",
        &[
            ("Total", s.total.to_string()),
            ("Valid", s.valid.to_string()),
            ("DB flag", s.db_flag.to_string()),
            ("NG seller", s.seller.to_string()),
            ("NG keyword", s.keyword.to_string()),
            ("Condition", s.condition.to_string()),
            ("Low price", s.low_price.to_string()),
            (
                "NG",
                format!("{} ({:?} mode)", s.ng_count(outcome.mode), outcome.mode),
            ),
        ],
    );
}
