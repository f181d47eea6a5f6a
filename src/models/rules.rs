//! Keyword rules and seller blocklist entries.

use serde::{Deserialize, Serialize};

/// What a keyword rule does to a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Disqualify listings whose text contains the keyword
    Exclude,
    /// Strip the keyword from the text before exclusion matching
    #[serde(alias = "replace_blank")]
    Redact,
}

impl RuleKind {
    /// Operator-facing label, as used in rule CSV files.
    pub fn label(self) -> &'static str {
        match self {
            RuleKind::Exclude => "除外",
            RuleKind::Redact => "文字削除",
        }
    }

    /// Parse a CSV type column. Anything unrecognised is an exclusion.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "文字削除" | "replace_blank" | "redact" => RuleKind::Redact,
            _ => RuleKind::Exclude,
        }
    }
}

/// Where a rule came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    #[default]
    Manual,
    CsvImport,
}

/// A keyword rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub keyword: String,

    pub kind: RuleKind,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default)]
    pub source: RuleSource,
}

fn default_active() -> bool {
    true
}

impl KeywordRule {
    /// Active manual exclusion rule.
    pub fn exclude(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            kind: RuleKind::Exclude,
            is_active: true,
            source: RuleSource::Manual,
        }
    }

    /// Active manual redaction rule.
    pub fn redact(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            kind: RuleKind::Redact,
            is_active: true,
            source: RuleSource::Manual,
        }
    }

    /// Whether the rule takes part in evaluation. Blank keywords never do.
    pub fn is_usable(&self) -> bool {
        self.is_active && !self.keyword.trim().is_empty()
    }
}

/// An administered seller blocklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerBlockEntry {
    pub platform: String,

    pub seller_id: String,

    #[serde(default)]
    pub seller_name: Option<String>,

    #[serde(default)]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_label() {
        assert_eq!(RuleKind::from_label("文字削除"), RuleKind::Redact);
        assert_eq!(RuleKind::from_label("replace_blank"), RuleKind::Redact);
        assert_eq!(RuleKind::from_label("除外"), RuleKind::Exclude);
        assert_eq!(RuleKind::from_label(""), RuleKind::Exclude);
    }

    #[test]
    fn legacy_kind_name_deserializes() {
        let rule: KeywordRule =
            serde_json::from_str(r#"{"keyword":"[","kind":"replace_blank"}"#).unwrap();
        assert_eq!(rule.kind, RuleKind::Redact);
        assert!(rule.is_active);
        assert_eq!(rule.source, RuleSource::Manual);
    }

    #[test]
    fn blank_keyword_is_unusable() {
        assert!(!KeywordRule::exclude("   ").is_usable());
        let mut rule = KeywordRule::exclude("ジャンク");
        assert!(rule.is_usable());
        rule.is_active = false;
        assert!(!rule.is_usable());
    }
}
