//! End-to-end: stored listings to a Shift_JIS inventory file.

use encoding_rs::SHIFT_JIS;
use resale_feed::export::{ColumnContract, ExportFormat, RecordBuilder, serialize};
use resale_feed::models::{
    Classification, ClassificationMode, EligibilityConfig, KeywordRule, Listing,
};
use resale_feed::pipeline::build_feed;
use resale_feed::services::{EligibilityEvaluator, KeywordRuleEngine, SellerBlocklist};
use resale_feed::utils::text::sanitize;

fn listing(id: &str, title: &str, price: i64, condition: &str) -> Listing {
    Listing {
        id: id.to_string(),
        platform: "mercari".to_string(),
        title: title.to_string(),
        description: format!("{title}の説明です。\n送料込み"),
        price: Some(price),
        condition: Some(condition.to_string()),
        images: vec![format!("https://static.example/{id}/1.jpg")],
        ..Listing::default()
    }
}

fn evaluator(rules: &[KeywordRule]) -> EligibilityEvaluator {
    EligibilityEvaluator::new(
        KeywordRuleEngine::new(rules),
        SellerBlocklist::new(),
        EligibilityConfig::default(),
    )
}

fn decode_rows(bytes: &[u8]) -> Vec<Vec<String>> {
    let (text, _, had_errors) = SHIFT_JIS.decode(bytes);
    assert!(!had_errors);
    text.split("\r\n")
        .map(|row| row.split('\t').map(str::to_string).collect())
        .collect()
}

#[test]
fn n_listings_m_valid_gives_headers_plus_m_rows_in_order() {
    let contract = ColumnContract::builtin("amazon-tsv-2021.1014").unwrap();
    let listings = vec![
        listing("m1", "レザー バッグ", 15000, "新品、未使用"),
        listing("m2", "ジャンク スマホ", 20000, "新品、未使用"),
        listing("m3", "腕時計", 3000, "新品、未使用"),
        listing("m4", "財布", 12000, "やや傷や汚れあり"),
        listing("m5", "[限定] スニーカー", 18000, "新品、未使用"),
    ];
    let rules = vec![KeywordRule::exclude("ジャンク"), KeywordRule::redact("[")];

    let feed = build_feed(
        &listings,
        &evaluator(&rules),
        ClassificationMode::Strict,
        &contract,
        ExportFormat::Tsv,
        100,
    )
    .unwrap();

    let classes: Vec<_> = feed
        .outcome
        .reports
        .iter()
        .map(|r| r.classification)
        .collect();
    assert_eq!(
        classes,
        vec![
            Classification::Valid,
            Classification::FilteredByKeyword,
            Classification::FilteredByLowPrice,
            Classification::FilteredByCondition,
            Classification::Valid,
        ]
    );

    let rows = decode_rows(&feed.bytes);
    assert_eq!(rows.len(), contract.header_rows().len() + 2);
    assert!(rows.iter().all(|r| r.len() == contract.column_count()));

    let data = &rows[contract.header_rows().len()..];
    assert_eq!(data[0][1], "m1");
    assert_eq!(data[1][1], "m5");
    assert_eq!(data[0][0], "Hobbies");
    assert_eq!(data[0][10], "15000");
    assert_eq!(data[0][28], "レザー バッグの説明です。 送料込み");
}

#[test]
fn loose_mode_exports_condition_and_price_exclusions() {
    let contract = ColumnContract::builtin("amazon-tsv-2021.1014").unwrap();
    let listings = vec![
        listing("m3", "腕時計", 3000, "新品、未使用"),
        listing("m4", "財布", 12000, "やや傷や汚れあり"),
    ];

    let feed = build_feed(
        &listings,
        &evaluator(&[]),
        ClassificationMode::Loose,
        &contract,
        ExportFormat::Tsv,
        100,
    )
    .unwrap();

    assert_eq!(feed.listing_ids, vec!["m3", "m4"]);
    let rows = decode_rows(&feed.bytes);
    assert_eq!(rows[4][158], "中古 - 良い");
}

#[test]
fn hostile_text_still_encodes() {
    let contract = ColumnContract::builtin("amazon-tsv-2021.1014").unwrap();
    let mut hostile = listing("m9", "Nike™ “Air” 😀 ①②", 15000, "新品、未使用");
    hostile.description = "サイズ：27㎝\u{0097}\r\n状態…良好 • 箱付き\t€50".to_string();

    let records = RecordBuilder::new(&contract, 100).build_all(&[hostile]);
    let bytes = serialize(&records, &contract, ExportFormat::Tsv).unwrap();
    let rows = decode_rows(&bytes);

    let row = &rows[3];
    assert_eq!(row.len(), 183);
    assert_eq!(row[3], "Nike \"Air\"");
    assert_eq!(row[28], sanitize(&row[28]));
    assert!(!row[28].contains('€'));
}

#[test]
fn redaction_example_from_bracketed_title() {
    let verdict = KeywordRuleEngine::new(&[KeywordRule::redact("[")]).evaluate("[新品] バッグ", "");
    assert_eq!(verdict.redacted_title, "新品] バッグ");
}
