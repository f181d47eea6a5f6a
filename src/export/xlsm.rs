// src/export/xlsm.rs

//! Macro-enabled workbook output.
//!
//! The vendor template is treated as an opaque container: every part is
//! copied byte-for-byte (macros, styles, other sheets, validation lists)
//! except the target worksheet, whose `<sheetData>` keeps the preserved
//! template rows and receives one row per record after them.
//!
//! Element names may carry a namespace prefix (`<x:row>`) and attribute
//! values may use either quote style; appended rows reuse the sheet's prefix.

use std::io::{Cursor, Read, Write};

use regex::Regex;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{AppError, Result};
use crate::export::{Cell, ColumnContract, FlatFileRecord, check_records};

const WORKBOOK: &str = "xl/workbook.xml";
const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";

/// Write records into a copy of `template`.
pub fn write_xlsm(
    records: &[FlatFileRecord],
    contract: &ColumnContract,
    template: &[u8],
) -> Result<Vec<u8>> {
    let layout = contract.spreadsheet().ok_or_else(|| {
        AppError::contract(contract.version(), "no [spreadsheet] layout for workbook output")
    })?;
    check_records(records, contract)?;

    let mut archive = ZipArchive::new(Cursor::new(template))
        .map_err(|e| AppError::template(format!("template is not a workbook: {e}")))?;

    let sheet_path = locate_sheet(&mut archive, &layout.sheet)?;
    let sheet_xml = read_entry(&mut archive, &sheet_path)?;
    let patched = patch_sheet(&sheet_xml, layout.preserved_rows, records)?;

    log::debug!(
        "Writing {} row(s) into {} ({}) after {} preserved row(s)",
        records.len(),
        layout.sheet,
        sheet_path,
        layout.preserved_rows
    );

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        if entry.name() == sheet_path {
            drop(entry);
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            writer.start_file(sheet_path.as_str(), options)?;
            writer.write_all(patched.as_bytes())?;
        } else {
            writer.raw_copy_file(entry)?;
        }
    }

    Ok(writer.finish()?.into_inner())
}

fn read_entry<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| AppError::template(format!("{name}: {e}")))?;
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    Ok(content)
}

fn pattern(re: &str) -> Result<Regex> {
    Regex::new(re).map_err(|e| AppError::template(format!("bad pattern {re:?}: {e}")))
}

/// Optional namespace prefix of an element name, e.g. `x:`.
const PREFIX: &str = r"(?:[\w.-]+:)?";

fn attribute(tag: &str, name: &str) -> Result<Option<String>> {
    attribute_matching(tag, &regex::escape(name))
}

/// Attribute whose name matches the regex fragment `name`.
fn attribute_matching(tag: &str, name: &str) -> Result<Option<String>> {
    let re = pattern(&format!(r#"\s{name}\s*=\s*(?:"([^"]*)"|'([^']*)')"#))?;
    Ok(re
        .captures(tag)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| unescape(m.as_str())))
}

/// Resolve a sheet name to its part path through the workbook relationships.
fn locate_sheet<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    sheet: &str,
) -> Result<String> {
    let workbook = read_entry(archive, WORKBOOK)?;
    let mut rel_id = None;
    for tag in pattern(&format!(r"<{PREFIX}sheet\s[^>]*>"))?.find_iter(&workbook) {
        if attribute(tag.as_str(), "name")?.as_deref() == Some(sheet) {
            rel_id = attribute_matching(tag.as_str(), r"[\w.-]+:id")?;
            break;
        }
    }
    let rel_id =
        rel_id.ok_or_else(|| AppError::template(format!("sheet '{sheet}' not found in template")))?;

    let rels = read_entry(archive, WORKBOOK_RELS)?;
    for tag in pattern(&format!(r"<{PREFIX}Relationship\s[^>]*>"))?.find_iter(&rels) {
        if attribute(tag.as_str(), "Id")?.as_deref() != Some(rel_id.as_str()) {
            continue;
        }
        let target = attribute(tag.as_str(), "Target")?
            .ok_or_else(|| AppError::template(format!("relationship {rel_id} has no target")))?;
        return Ok(match target.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => format!("xl/{target}"),
        });
    }

    Err(AppError::template(format!(
        "relationship {rel_id} for sheet '{sheet}' not found"
    )))
}

/// Keep rows up to `preserved`, drop later template rows, append records.
fn patch_sheet(xml: &str, preserved: usize, records: &[FlatFileRecord]) -> Result<String> {
    let sheet_data = pattern(&format!(
        r"(?s)<((?:[\w.-]+:)?)sheetData(\s[^>]*?)?\s*(?:/>|>(.*?)</{PREFIX}sheetData>)"
    ))?;
    let caps = sheet_data
        .captures(xml)
        .ok_or_else(|| AppError::template("worksheet has no <sheetData>"))?;
    let whole = caps
        .get(0)
        .ok_or_else(|| AppError::template("worksheet has no <sheetData>"))?;
    let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let open_attrs = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    let body = caps.get(3).map(|m| m.as_str()).unwrap_or("");

    let mut out = String::with_capacity(body.len() + records.len() * 512);
    let mut last_row = 0;
    let mut max_col = 0;
    let mut implicit = 0;
    let row_re = pattern(&format!(r"(?s)<{PREFIX}row\b([^>]*?)(?:/>|>.*?</{PREFIX}row>)"))?;
    for row in row_re.captures_iter(body) {
        let number = match attribute(&row[1], "r")?.and_then(|r| r.parse::<usize>().ok()) {
            Some(n) => n,
            None => implicit + 1,
        };
        implicit = number;
        if number <= preserved {
            out.push_str(&row[0]);
            last_row = last_row.max(number);
        }
    }
    if let Some(spans) = pattern(r#"\sspans\s*=\s*["']\d+:(\d+)["']"#)?.captures(body) {
        max_col = spans[1].parse().unwrap_or(0);
    }

    for (i, record) in records.iter().enumerate() {
        let number = preserved + i + 1;
        out.push_str(&row_xml(prefix, number, record));
        last_row = number;
        max_col = max_col.max(record.len());
    }

    let mut patched = String::with_capacity(xml.len() + out.len());
    patched.push_str(&xml[..whole.start()]);
    patched.push_str(&format!("<{prefix}sheetData{open_attrs}>"));
    patched.push_str(&out);
    patched.push_str(&format!("</{prefix}sheetData>"));
    patched.push_str(&xml[whole.end()..]);

    if last_row > 0 && max_col > 0 {
        let dimension = format!(
            r#"<{prefix}dimension ref="A1:{}{}"/>"#,
            column_letter(max_col - 1),
            last_row
        );
        patched = pattern(&format!(r"<{PREFIX}dimension\s[^>]*/>"))?
            .replace(&patched, regex::NoExpand(&dimension))
            .into_owned();
    }

    Ok(patched)
}

fn row_xml(p: &str, number: usize, record: &FlatFileRecord) -> String {
    let mut xml = format!(r#"<{p}row r="{number}">"#);
    for (col, cell) in record.cells().iter().enumerate() {
        let reference = format!("{}{}", column_letter(col), number);
        match cell {
            Cell::Empty => {}
            Cell::Number(n) => {
                xml.push_str(&format!(r#"<{p}c r="{reference}"><{p}v>{n}</{p}v></{p}c>"#))
            }
            Cell::Text(s) => xml.push_str(&format!(
                concat!(
                    r#"<{p}c r="{reference}" t="inlineStr"><{p}is>"#,
                    r#"<{p}t xml:space="preserve">{text}</{p}t></{p}is></{p}c>"#
                ),
                p = p,
                reference = reference,
                text = escape(s)
            )),
        }
    }
    xml.push_str(&format!("</{p}row>"));
    xml
}

/// Zero-based column index to spreadsheet letters (0 -> A, 26 -> AA).
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::RecordBuilder;
    use crate::models::Listing;

    const SHEET: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        r#"<dimension ref="A1:C8"/>"#,
        r#"<sheetData>"#,
        r#"<row r="1" spans="1:3"><c r="A1" t="inlineStr"><is><t>TemplateType=fptcustom</t></is></c></row>"#,
        r#"<row r="2"><c r="A2" t="inlineStr"><is><t>SKU</t></is></c></row>"#,
        r#"<row r="3"/><row r="4"/><row r="5"/>"#,
        r#"<row r="6"><c r="A6" t="inlineStr"><is><t>example</t></is></c></row>"#,
        r#"<row r="7"><c r="A7" t="inlineStr"><is><t>OLD-SKU</t></is></c></row>"#,
        r#"</sheetData>"#,
        r#"<dataValidations count="0"/>"#,
        r#"</worksheet>"#,
    );

    fn template() -> Vec<u8> {
        let workbook = concat!(
            r#"<workbook xmlns:r="r"><sheets>"#,
            r#"<sheet name="Instructions" sheetId="1" r:id="rId1"/>"#,
            r#"<sheet name="テンプレート" sheetId="2" r:id="rId2"/>"#,
            r#"</sheets></workbook>"#
        );
        let rels = concat!(
            r#"<Relationships>"#,
            r#"<Relationship Id="rId1" Type="ws" Target="worksheets/sheet1.xml"/>"#,
            r#"<Relationship Id="rId2" Type="ws" Target="/xl/worksheets/sheet2.xml"/>"#,
            r#"</Relationships>"#
        );
        template_with(workbook, rels, SHEET)
    }

    fn template_with(workbook: &str, rels: &str, sheet: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        let parts = [
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0"?><Types/>"#.to_string(),
            ),
            (WORKBOOK, workbook.to_string()),
            (WORKBOOK_RELS, rels.to_string()),
            ("xl/worksheets/sheet1.xml", "<worksheet>instructions</worksheet>".to_string()),
            ("xl/worksheets/sheet2.xml", sheet.to_string()),
            ("xl/vbaProject.bin", "\u{1}\u{2}macro".to_string()),
        ];
        for (name, body) in parts {
            writer.start_file(name, options).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn read(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        read_entry(&mut archive, name).unwrap()
    }

    fn records(contract: &ColumnContract, ids: &[&str]) -> Vec<FlatFileRecord> {
        let listings: Vec<Listing> = ids
            .iter()
            .map(|id| Listing {
                id: id.to_string(),
                title: "ネジ <M3> & ナット".to_string(),
                listing_price: Some(1200),
                condition: Some("新品、未使用".to_string()),
                ..Listing::default()
            })
            .collect();
        RecordBuilder::new(contract, 100).build_all(&listings)
    }

    #[test]
    fn column_letters() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(231), "HX");
    }

    #[test]
    fn appends_rows_after_preserved_rows() {
        let contract = ColumnContract::builtin("amazon-xlsm-screws").unwrap();
        let bytes = write_xlsm(&records(&contract, &["s-1", "s-2"]), &contract, &template()).unwrap();
        let sheet = read(&bytes, "xl/worksheets/sheet2.xml");

        assert!(sheet.contains("TemplateType=fptcustom"));
        assert!(sheet.contains(">example<"));
        assert!(!sheet.contains("OLD-SKU"));
        assert!(sheet.contains(r#"<row r="7"><c r="A7" t="inlineStr"><is><t xml:space="preserve">s-1</t>"#));
        assert!(sheet.contains(r#"<c r="C8" t="inlineStr"><is><t xml:space="preserve">SCREWS</t>"#));
        assert!(sheet.contains(r#"<c r="K7"><v>1200</v></c>"#));
        assert!(sheet.contains("ネジ &lt;M3&gt; &amp; ナット"));
        assert!(sheet.contains(r#"<c r="FJ7" t="inlineStr"><is><t xml:space="preserve">New</t>"#));
        assert!(sheet.contains(r#"<dimension ref="A1:HX8"/>"#));
        assert!(sheet.ends_with("<dataValidations count=\"0\"/></worksheet>"));
    }

    #[test]
    fn prefixed_elements_and_single_quotes() {
        let contract = ColumnContract::builtin("amazon-xlsm-screws").unwrap();
        let workbook = concat!(
            r#"<x:workbook xmlns:x="main" xmlns:rel="r"><x:sheets>"#,
            r#"<x:sheet name='テンプレート' sheetId='2' rel:id='rId9'/>"#,
            r#"</x:sheets></x:workbook>"#
        );
        let rels = concat!(
            r#"<Relationships>"#,
            r#"<Relationship Id='rId9' Type='ws' Target='worksheets/sheet2.xml'/>"#,
            r#"</Relationships>"#
        );
        let sheet = concat!(
            r#"<x:worksheet xmlns:x="main">"#,
            r#"<x:dimension ref='A1:A7'/>"#,
            r#"<x:sheetData>"#,
            r#"<x:row r='1' spans='1:1'><x:c r='A1' t='inlineStr'><x:is><x:t>head</x:t></x:is></x:c></x:row>"#,
            r#"<x:row r='7'><x:c r='A7' t='inlineStr'><x:is><x:t>OLD-SKU</x:t></x:is></x:c></x:row>"#,
            r#"</x:sheetData>"#,
            r#"</x:worksheet>"#,
        );

        let bytes = write_xlsm(
            &records(&contract, &["s-1"]),
            &contract,
            &template_with(workbook, rels, sheet),
        )
        .unwrap();
        let patched = read(&bytes, "xl/worksheets/sheet2.xml");

        assert!(patched.contains(">head<"));
        assert!(!patched.contains("OLD-SKU"));
        assert!(patched.contains(
            r#"<x:row r="7"><x:c r="A7" t="inlineStr"><x:is><x:t xml:space="preserve">s-1</x:t>"#
        ));
        assert!(patched.contains(r#"<x:c r="K7"><x:v>1200</x:v></x:c>"#));
        assert!(patched.contains(r#"<x:dimension ref="A1:HX7"/>"#));
        assert!(patched.contains("</x:row></x:sheetData></x:worksheet>"));
    }

    #[test]
    fn other_parts_are_copied_unchanged() {
        let contract = ColumnContract::builtin("amazon-xlsm-screws").unwrap();
        let bytes = write_xlsm(&records(&contract, &["s-1"]), &contract, &template()).unwrap();

        assert_eq!(read(&bytes, "xl/worksheets/sheet1.xml"), "<worksheet>instructions</worksheet>");
        assert_eq!(read(&bytes, "xl/vbaProject.bin"), "\u{1}\u{2}macro");
        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        assert_eq!(archive.len(), 6);
    }

    #[test]
    fn empty_batch_keeps_template_rows() {
        let contract = ColumnContract::builtin("amazon-xlsm-screws").unwrap();
        let bytes = write_xlsm(&[], &contract, &template()).unwrap();
        let sheet = read(&bytes, "xl/worksheets/sheet2.xml");
        assert!(sheet.contains(r#"<row r="6">"#));
        assert!(!sheet.contains(r#"<row r="7">"#));
    }

    #[test]
    fn missing_sheet_is_a_template_error() {
        let contract = ColumnContract::builtin("amazon-xlsm-screws").unwrap();
        let bytes = template();
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let err = locate_sheet(&mut archive, "Data").unwrap_err();
        assert!(matches!(err, AppError::Template(_)));

        assert!(write_xlsm(&[], &contract, b"not a zip").is_err());
    }

    #[test]
    fn delimited_contract_cannot_write_workbooks() {
        let contract = ColumnContract::builtin("amazon-tsv-2021.1014").unwrap();
        let err = write_xlsm(&[], &contract, &template()).unwrap_err();
        assert!(matches!(err, AppError::Contract { .. }));
    }
}
