// src/export/tsv.rs

//! Delimited flat-file output in the marketplace's legacy encoding.

use encoding_rs::SHIFT_JIS;

use crate::error::{AppError, Result};
use crate::export::{Cell, ColumnContract, FlatFileRecord, check_records};

pub const ENCODING_NAME: &str = "Shift_JIS";

/// Serialize header rows and records, then encode to Shift_JIS.
///
/// Rows are joined with the contract's row delimiter, without a trailing
/// one. A character the encoding cannot represent fails the whole file
/// with its row and column; nothing is substituted.
pub fn write_tsv(records: &[FlatFileRecord], contract: &ColumnContract) -> Result<Vec<u8>> {
    check_records(records, contract)?;

    let headers = contract.header_rows();
    let delimiter = contract.delimiter();

    let mut rows: Vec<String> = Vec::with_capacity(headers.len() + records.len());
    for (i, header) in headers.iter().enumerate() {
        check_encodable(i + 1, header.iter().map(String::as_str))?;
        rows.push(header.join(delimiter));
    }
    for (i, record) in records.iter().enumerate() {
        let row = headers.len() + i + 1;
        let cells: Vec<_> = record.cells().iter().map(Cell::render).collect();
        check_encodable(row, cells.iter().map(|c| &**c))?;
        rows.push(cells.join(delimiter));
    }

    let text = rows.join(contract.row_delimiter());
    let (bytes, _, had_errors) = SHIFT_JIS.encode(&text);
    if had_errors {
        return Err(AppError::validation(format!(
            "output is not representable in {ENCODING_NAME}"
        )));
    }

    log::debug!(
        "Encoded {} row(s) ({} bytes) for contract {}",
        rows.len(),
        bytes.len(),
        contract.version()
    );
    Ok(bytes.into_owned())
}

/// Fail on the first cell character outside the encoding. `row` is 1-based
/// over the whole file, columns are 1-based too.
fn check_encodable<'a>(row: usize, cells: impl Iterator<Item = &'a str>) -> Result<()> {
    for (i, cell) in cells.enumerate() {
        if cell.is_ascii() {
            continue;
        }
        let (_, _, had_errors) = SHIFT_JIS.encode(cell);
        if !had_errors {
            continue;
        }
        let mut buf = [0u8; 4];
        let ch = cell
            .chars()
            .find(|c| SHIFT_JIS.encode(c.encode_utf8(&mut buf)).2)
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        return Err(AppError::Encoding {
            row,
            column: i + 1,
            ch,
            encoding: ENCODING_NAME,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::RecordBuilder;
    use crate::models::Listing;

    fn contract() -> ColumnContract {
        ColumnContract::builtin("amazon-tsv-2021.1014").unwrap()
    }

    fn listing(id: &str) -> Listing {
        Listing {
            id: id.to_string(),
            title: "レザー バッグ".to_string(),
            description: "未使用品です。".to_string(),
            listing_price: Some(22000),
            condition: Some("新品、未使用".to_string()),
            ..Listing::default()
        }
    }

    fn decode(bytes: &[u8]) -> String {
        let (text, _, had_errors) = SHIFT_JIS.decode(bytes);
        assert!(!had_errors);
        text.into_owned()
    }

    #[test]
    fn writes_headers_then_rows_in_order() {
        let contract = contract();
        let builder = RecordBuilder::new(&contract, 100);
        let records = builder.build_all(&[listing("a1"), listing("b2")]);

        let text = decode(&write_tsv(&records, &contract).unwrap());
        let rows: Vec<&str> = text.split("\r\n").collect();

        assert_eq!(rows.len(), 5);
        assert!(rows[0].starts_with("TemplateType=fptcustom\tVersion=2021.1014"));
        assert!(rows[1].starts_with("商品タイプ\t出品者SKU"));
        assert!(rows[2].starts_with("feed_product_type\titem_sku\tbrand_name"));
        for row in &rows {
            assert_eq!(row.split('\t').count(), 183);
        }
        assert_eq!(rows[3].split('\t').nth(1), Some("a1"));
        assert_eq!(rows[4].split('\t').nth(1), Some("b2"));
        assert!(!text.ends_with("\r\n"));
    }

    #[test]
    fn empty_batch_is_headers_only() {
        let contract = contract();
        let text = decode(&write_tsv(&[], &contract).unwrap());
        assert_eq!(text.split("\r\n").count(), 3);
    }

    #[test]
    fn wrong_width_is_rejected() {
        let contract = contract();
        let records = vec![FlatFileRecord::empty(182)];
        let err = write_tsv(&records, &contract).unwrap_err();
        assert!(matches!(
            err,
            AppError::RowLength {
                row: 1,
                expected: 183,
                actual: 182
            }
        ));
    }

    #[test]
    fn unencodable_cell_is_reported() {
        let contract = contract();
        let mut cells = vec![Cell::Empty; 183];
        cells[3] = Cell::text("bag \u{1F600}");
        let err = write_tsv(&[FlatFileRecord::from_cells(cells)], &contract).unwrap_err();
        match err {
            AppError::Encoding { row, column, ch, .. } => {
                assert_eq!(row, 4);
                assert_eq!(column, 4);
                assert_eq!(ch, '\u{1F600}');
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn delimiter_inside_cell_is_rejected() {
        let contract = contract();
        let mut cells = vec![Cell::Empty; 183];
        cells[3] = Cell::Text("a\tb".to_string());
        assert!(write_tsv(&[FlatFileRecord::from_cells(cells)], &contract).is_err());
    }
}
