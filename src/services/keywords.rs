// src/services/keywords.rs

//! Keyword rule engine.
//!
//! Redaction rules run first and strip every case-insensitive occurrence of
//! their keyword from the title and the description separately. Exclusion
//! rules are then tested as case-insensitive substrings of the combined,
//! redacted text. All matches are collected, not just the first.

use regex::{Regex, RegexBuilder};

use crate::models::{KeywordRule, RuleKind};

/// Result of evaluating one listing's text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordVerdict {
    pub is_excluded: bool,

    /// Exclusion keywords that matched, in rule order
    pub matched_exclude_keywords: Vec<String>,

    pub redacted_title: String,

    pub redacted_description: String,
}

/// Compiled keyword rules, ready to evaluate many listings.
#[derive(Debug, Clone, Default)]
pub struct KeywordRuleEngine {
    redactions: Vec<Regex>,
    /// (original keyword, lowercased keyword)
    exclusions: Vec<(String, String)>,
}

impl KeywordRuleEngine {
    /// Compile the usable rules. Inactive and blank rules are dropped.
    pub fn new(rules: &[KeywordRule]) -> Self {
        let mut engine = Self::default();

        for rule in rules.iter().filter(|r| r.is_usable()) {
            match rule.kind {
                RuleKind::Redact => match Self::redaction_pattern(&rule.keyword) {
                    Ok(pattern) => engine.redactions.push(pattern),
                    Err(e) => log::warn!("Skipping redaction rule {:?}: {}", rule.keyword, e),
                },
                RuleKind::Exclude => engine
                    .exclusions
                    .push((rule.keyword.clone(), rule.keyword.to_lowercase())),
            }
        }

        log::debug!(
            "Keyword engine ready: {} exclusion, {} redaction rule(s)",
            engine.exclusions.len(),
            engine.redactions.len()
        );
        engine
    }

    fn redaction_pattern(keyword: &str) -> std::result::Result<Regex, regex::Error> {
        RegexBuilder::new(&regex::escape(keyword))
            .case_insensitive(true)
            .build()
    }

    pub fn exclusion_count(&self) -> usize {
        self.exclusions.len()
    }

    pub fn redaction_count(&self) -> usize {
        self.redactions.len()
    }

    /// Apply every redaction rule once, in rule order.
    pub fn redact(&self, text: &str) -> String {
        self.redactions
            .iter()
            .fold(text.to_string(), |acc, pattern| {
                pattern.replace_all(&acc, "").into_owned()
            })
    }

    /// Evaluate a title and description against the rule set.
    pub fn evaluate(&self, title: &str, description: &str) -> KeywordVerdict {
        let redacted_title = self.redact(title);
        let redacted_description = self.redact(description);

        let combined = format!("{redacted_title} {redacted_description}").to_lowercase();
        let matched_exclude_keywords: Vec<String> = self
            .exclusions
            .iter()
            .filter(|(_, lower)| combined.contains(lower.as_str()))
            .map(|(keyword, _)| keyword.clone())
            .collect();

        KeywordVerdict {
            is_excluded: !matched_exclude_keywords.is_empty(),
            matched_exclude_keywords,
            redacted_title,
            redacted_description,
        }
    }
}

/// One-shot evaluation without keeping the compiled engine.
pub fn evaluate(title: &str, description: &str, rules: &[KeywordRule]) -> KeywordVerdict {
    KeywordRuleEngine::new(rules).evaluate(title, description)
}
