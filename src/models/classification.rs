//! Classification results produced by the eligibility evaluator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of evaluating one listing, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    FilteredByDbFlag,
    FilteredBySeller,
    FilteredByKeyword,
    FilteredByCondition,
    FilteredByLowPrice,
    Valid,
}

impl Classification {
    pub const ALL: [Classification; 6] = [
        Classification::FilteredByDbFlag,
        Classification::FilteredBySeller,
        Classification::FilteredByKeyword,
        Classification::FilteredByCondition,
        Classification::FilteredByLowPrice,
        Classification::Valid,
    ];

    /// Rules that mark a listing as NG regardless of mode.
    pub fn is_hard_filter(self) -> bool {
        matches!(
            self,
            Classification::FilteredByDbFlag
                | Classification::FilteredBySeller
                | Classification::FilteredByKeyword
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::FilteredByDbFlag => "FILTERED_BY_DB_FLAG",
            Classification::FilteredBySeller => "FILTERED_BY_SELLER",
            Classification::FilteredByKeyword => "FILTERED_BY_KEYWORD",
            Classification::FilteredByCondition => "FILTERED_BY_CONDITION",
            Classification::FilteredByLowPrice => "FILTERED_BY_LOW_PRICE",
            Classification::Valid => "VALID",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How condition and price exclusions count towards the NG bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ClassificationMode {
    /// Every non-valid classification is NG
    #[default]
    Strict,
    /// Only DB flag, seller and keyword exclusions are NG; condition and
    /// price exclusions are reported but stay exportable
    Loose,
}

/// Which condition labels are acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionPolicy {
    /// Only new/unused listings pass
    #[default]
    NewOnly,
    /// Condition is not checked
    Any,
}

/// A single matched exclusion reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reason {
    DbFlag,
    Seller { seller_id: String },
    Keyword { keyword: String },
    Condition { label: String },
    LowPrice { price: i64, floor: i64 },
}

impl Reason {
    /// The classification this reason produces.
    pub fn classification(&self) -> Classification {
        match self {
            Reason::DbFlag => Classification::FilteredByDbFlag,
            Reason::Seller { .. } => Classification::FilteredBySeller,
            Reason::Keyword { .. } => Classification::FilteredByKeyword,
            Reason::Condition { .. } => Classification::FilteredByCondition,
            Reason::LowPrice { .. } => Classification::FilteredByLowPrice,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::DbFlag => f.write_str("DB filter flag"),
            Reason::Seller { seller_id } => write!(f, "NG seller: {seller_id}"),
            Reason::Keyword { keyword } => write!(f, "NG keyword: {keyword}"),
            Reason::Condition { label } if label.is_empty() => f.write_str("condition: (none)"),
            Reason::Condition { label } => write!(f, "condition: {label}"),
            Reason::LowPrice { price, .. } => write!(f, "low price: ¥{price}"),
        }
    }
}

/// Classification of one listing plus every reason that matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub listing_id: String,

    /// First matched reason in precedence order, or `Valid`
    pub classification: Classification,

    /// All matched reasons, in precedence order
    pub reasons: Vec<Reason>,
}

impl ClassificationReport {
    /// Whether the listing belongs in the NG bucket under `mode`.
    pub fn is_ng(&self, mode: ClassificationMode) -> bool {
        match mode {
            ClassificationMode::Strict => self.classification != Classification::Valid,
            ClassificationMode::Loose => self.classification.is_hard_filter(),
        }
    }

    /// Whether the listing may be exported under `mode`.
    pub fn is_exportable(&self, mode: ClassificationMode) -> bool {
        !self.is_ng(mode)
    }

    /// Keywords that caused a keyword exclusion.
    pub fn matched_keywords(&self) -> impl Iterator<Item = &str> {
        self.reasons.iter().filter_map(|r| match r {
            Reason::Keyword { keyword } => Some(keyword.as_str()),
            _ => None,
        })
    }

    /// Human-readable reason strings for operator display.
    pub fn reason_strings(&self) -> Vec<String> {
        self.reasons.iter().map(ToString::to_string).collect()
    }
}

/// Per-classification counts for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationSummary {
    pub total: usize,
    pub valid: usize,
    pub db_flag: usize,
    pub seller: usize,
    pub keyword: usize,
    pub condition: usize,
    pub low_price: usize,
}

impl ClassificationSummary {
    pub fn from_reports(reports: &[ClassificationReport]) -> Self {
        let mut summary = Self::default();
        for report in reports {
            summary.total += 1;
            match report.classification {
                Classification::Valid => summary.valid += 1,
                Classification::FilteredByDbFlag => summary.db_flag += 1,
                Classification::FilteredBySeller => summary.seller += 1,
                Classification::FilteredByKeyword => summary.keyword += 1,
                Classification::FilteredByCondition => summary.condition += 1,
                Classification::FilteredByLowPrice => summary.low_price += 1,
            }
        }
        summary
    }

    /// Count of listings in the NG bucket under `mode`.
    pub fn ng_count(&self, mode: ClassificationMode) -> usize {
        let hard = self.db_flag + self.seller + self.keyword;
        match mode {
            ClassificationMode::Strict => hard + self.condition + self.low_price,
            ClassificationMode::Loose => hard,
        }
    }
}
