//! Marketplace flat-file export.
//!
//! - `contract`: versioned column layouts
//! - `record`: listing to contract-shaped row
//! - `tsv`: delimited Shift_JIS output
//! - `xlsm`: rows written into a vendor template workbook

pub mod contract;
pub mod record;
pub mod tsv;
#[cfg(feature = "xlsm")]
pub mod xlsm;

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub use contract::{
    ColumnContract, ConditionMapping, FieldPositions, SpreadsheetLayout, builtin_versions,
};
pub use record::{Cell, FlatFileRecord, RecordBuilder};

/// Output file kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ExportKind {
    /// Tab-delimited, Shift_JIS
    #[default]
    Tsv,
    /// Macro-enabled workbook built from a vendor template
    Xlsm,
}

impl ExportKind {
    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::Tsv => "tsv",
            ExportKind::Xlsm => "xlsm",
        }
    }

    /// MIME type for download responses.
    pub fn content_type(self) -> &'static str {
        match self {
            ExportKind::Tsv => "text/tab-separated-values;charset=shift_jis",
            ExportKind::Xlsm => "application/vnd.ms-excel.sheet.macroEnabled.12",
        }
    }

    /// Timestamped file name, e.g. `Amazon_inventory_20250101T093000.tsv`.
    pub fn file_name(self, at: DateTime<Local>) -> String {
        format!(
            "Amazon_inventory_{}.{}",
            at.format("%Y%m%dT%H%M%S"),
            self.extension()
        )
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Output format with whatever the serializer needs beyond the records.
#[derive(Debug, Clone, Copy)]
pub enum ExportFormat<'a> {
    Tsv,
    /// Template workbook bytes
    Xlsm { template: &'a [u8] },
}

impl ExportFormat<'_> {
    pub fn kind(&self) -> ExportKind {
        match self {
            ExportFormat::Tsv => ExportKind::Tsv,
            ExportFormat::Xlsm { .. } => ExportKind::Xlsm,
        }
    }
}

/// Serialize records under a contract.
pub fn serialize(
    records: &[FlatFileRecord],
    contract: &ColumnContract,
    format: ExportFormat<'_>,
) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Tsv => tsv::write_tsv(records, contract),
        #[cfg(feature = "xlsm")]
        ExportFormat::Xlsm { template } => xlsm::write_xlsm(records, contract, template),
        #[cfg(not(feature = "xlsm"))]
        ExportFormat::Xlsm { .. } => Err(AppError::config(
            "workbook export requires the `xlsm` feature",
        )),
    }
}

/// Every record must have the contract's width, and no text cell may
/// contain a delimiter or line break.
pub(crate) fn check_records(records: &[FlatFileRecord], contract: &ColumnContract) -> Result<()> {
    let expected = contract.column_count();
    let delimiter = contract.delimiter();

    for (i, record) in records.iter().enumerate() {
        if record.len() != expected {
            return Err(AppError::RowLength {
                row: i + 1,
                expected,
                actual: record.len(),
            });
        }
        for (col, cell) in record.cells().iter().enumerate() {
            if let Cell::Text(text) = cell {
                if text.contains(delimiter) || text.contains(['\r', '\n']) {
                    return Err(AppError::validation(format!(
                        "record {}, column {}: cell contains a delimiter or line break",
                        i + 1,
                        col + 1
                    )));
                }
            }
        }
    }
    Ok(())
}
