// src/services/import.rs

//! CSV import and export of keyword rules and seller blocklist entries.
//!
//! Keyword files carry `keyword, type, active` columns after a header row;
//! the type column uses the operator labels `除外` / `文字削除` (or the raw
//! `exclude` / `replace_blank` names) and `無効` / `false` marks a rule
//! inactive. Seller files carry `platform, seller_id, seller_name, reason`.

use std::io::{Read, Write};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::error::Result;
use crate::models::{KeywordRule, RuleKind, RuleSource, SellerBlockEntry};

const BOM: &str = "\u{FEFF}";

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

fn field(record: &StringRecord, index: usize) -> &str {
    record
        .get(index)
        .map(|s| s.trim_start_matches(BOM).trim())
        .unwrap_or("")
}

fn optional(record: &StringRecord, index: usize) -> Option<String> {
    Some(field(record, index))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse a keyword rule CSV. Rows with fewer than two columns or a blank
/// keyword are skipped.
pub fn parse_keyword_csv<R: Read>(input: R) -> Result<Vec<KeywordRule>> {
    let mut rules = Vec::new();

    for record in reader(input).records() {
        let record = record?;
        if record.len() < 2 {
            continue;
        }
        let keyword = field(&record, 0);
        if keyword.is_empty() {
            continue;
        }
        let active = field(&record, 2);
        rules.push(KeywordRule {
            keyword: keyword.to_string(),
            kind: RuleKind::from_label(field(&record, 1)),
            is_active: active != "無効" && active != "false",
            source: RuleSource::CsvImport,
        });
    }

    log::debug!("Parsed {} keyword rule(s) from CSV", rules.len());
    Ok(rules)
}

/// Write keyword rules as CSV with a BOM so spreadsheet tools detect UTF-8.
pub fn write_keyword_csv<W: Write>(rules: &[KeywordRule], mut output: W) -> Result<()> {
    output.write_all(BOM.as_bytes())?;

    let mut writer = WriterBuilder::new().from_writer(output);
    writer.write_record(["キーワード", "フィルタータイプ", "アクティブ"])?;
    for rule in rules {
        writer.write_record([
            rule.keyword.as_str(),
            rule.kind.label(),
            if rule.is_active { "有効" } else { "無効" },
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Parse a seller blocklist CSV. Rows without a seller id are skipped.
pub fn parse_seller_csv<R: Read>(input: R) -> Result<Vec<SellerBlockEntry>> {
    let mut entries = Vec::new();

    for record in reader(input).records() {
        let record = record?;
        let seller_id = field(&record, 1);
        if seller_id.is_empty() {
            continue;
        }
        let platform = field(&record, 0);
        entries.push(SellerBlockEntry {
            platform: if platform.is_empty() {
                "mercari".to_string()
            } else {
                platform.to_string()
            },
            seller_id: seller_id.to_string(),
            seller_name: optional(&record, 2),
            reason: optional(&record, 3),
        });
    }

    log::debug!("Parsed {} seller entr(ies) from CSV", entries.len());
    Ok(entries)
}

/// Append rules not already present (same keyword and kind). Returns the
/// number added.
pub fn merge_keyword_rules(existing: &mut Vec<KeywordRule>, imported: Vec<KeywordRule>) -> usize {
    let before = existing.len();
    for rule in imported {
        let duplicate = existing
            .iter()
            .any(|r| r.keyword == rule.keyword && r.kind == rule.kind);
        if !duplicate {
            existing.push(rule);
        }
    }
    existing.len() - before
}

/// Append entries for sellers not already blocked on the same platform.
/// Returns the number added.
pub fn merge_seller_entries(
    existing: &mut Vec<SellerBlockEntry>,
    imported: Vec<SellerBlockEntry>,
) -> usize {
    let before = existing.len();
    for entry in imported {
        let duplicate = existing
            .iter()
            .any(|e| e.platform == entry.platform && e.seller_id == entry.seller_id);
        if !duplicate {
            existing.push(entry);
        }
    }
    existing.len() - before
}
