// src/export/contract.rs

//! Versioned column contracts.
//!
//! A contract is the marketplace's flat-file layout for one template
//! version: the column count, the position of every field, the header rows
//! emitted before data, fixed literal values, the condition vocabulary and,
//! for workbook output, which sheet and how many template rows to keep.
//!
//! Contracts are data, not code. Two are built in (see [`builtin_versions`]);
//! additional versions can be loaded from TOML with [`ColumnContract::load`].
//! Every name a contract refers to is resolved to a position at load time,
//! so a contract that loads successfully can always build complete rows.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::export::Cell;

const AMAZON_TSV_2021_1014: &str = include_str!("../../contracts/amazon_tsv_2021_1014.toml");
const AMAZON_XLSM_SCREWS: &str = include_str!("../../contracts/amazon_xlsm_screws.toml");

const BUILTIN: &[(&str, &str)] = &[
    ("amazon-tsv-2021.1014", AMAZON_TSV_2021_1014),
    ("amazon-xlsm-screws", AMAZON_XLSM_SCREWS),
];

/// Versions of the contracts compiled into the binary.
pub fn builtin_versions() -> impl Iterator<Item = &'static str> {
    BUILTIN.iter().map(|(version, _)| *version)
}

// ============================================================================
// On-disk format
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ContractFile {
    version: String,
    #[serde(default)]
    name: String,
    column_count: usize,
    #[serde(default = "defaults::delimiter")]
    delimiter: String,
    #[serde(default = "defaults::row_delimiter")]
    row_delimiter: String,
    /// Delimiter-joined header rows, emitted first
    #[serde(default)]
    header_rows: Vec<String>,
    /// Emit the dense `columns` list as a final header row
    #[serde(default)]
    field_name_header: bool,
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    positions: BTreeMap<String, usize>,
    #[serde(default)]
    blank: Vec<String>,
    fields: FieldsFile,
    #[serde(default)]
    defaults: BTreeMap<String, toml::Value>,
    conditions: ConditionsFile,
    #[serde(default)]
    spreadsheet: Option<SpreadsheetLayout>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldsFile {
    sku: String,
    #[serde(default)]
    part_number: Option<String>,
    title: String,
    #[serde(default)]
    brand: Option<String>,
    price: String,
    quantity: String,
    main_image: String,
    #[serde(default)]
    other_images: Vec<String>,
    description: String,
    condition: String,
    #[serde(default)]
    condition_note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConditionsFile {
    default: String,
    #[serde(default)]
    note_from_description: bool,
    #[serde(default)]
    default_note: String,
    #[serde(default)]
    map: BTreeMap<String, String>,
}

mod defaults {
    pub fn delimiter() -> String {
        "\t".to_string()
    }

    pub fn row_delimiter() -> String {
        "\r\n".to_string()
    }
}

// ============================================================================
// Resolved contract
// ============================================================================

/// Column positions of the fields populated from a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPositions {
    pub sku: usize,
    pub part_number: Option<usize>,
    pub title: usize,
    pub brand: Option<usize>,
    pub price: usize,
    pub quantity: usize,
    pub main_image: usize,
    /// Additional image slots, in order
    pub other_images: Vec<usize>,
    pub description: usize,
    pub condition: usize,
    pub condition_note: Option<usize>,
}

/// Source condition label to marketplace condition value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionMapping {
    map: HashMap<String, String>,
    default: String,
    /// Use the sanitized description as the condition note when non-empty
    pub note_from_description: bool,
    /// Condition note used otherwise
    pub default_note: String,
}

impl ConditionMapping {
    /// Map a source label. Unknown or missing labels get the default.
    pub fn map(&self, label: Option<&str>) -> &str {
        label
            .map(str::trim)
            .and_then(|l| self.map.get(l))
            .map(String::as_str)
            .unwrap_or(&self.default)
    }

    pub fn default_value(&self) -> &str {
        &self.default
    }
}

/// Where rows go inside a vendor template workbook.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpreadsheetLayout {
    /// Worksheet that receives the rows
    pub sheet: String,
    /// Leading template rows kept verbatim; data starts on the next row
    pub preserved_rows: usize,
}

/// A loaded and validated column contract.
#[derive(Debug, Clone)]
pub struct ColumnContract {
    version: String,
    name: String,
    column_count: usize,
    delimiter: String,
    row_delimiter: String,
    header_rows: Vec<Vec<String>>,
    /// Field name per position, empty when the position is unnamed
    columns: Vec<String>,
    index: HashMap<String, usize>,
    fields: FieldPositions,
    defaults: Vec<(usize, Cell)>,
    blank: Vec<usize>,
    conditions: ConditionMapping,
    spreadsheet: Option<SpreadsheetLayout>,
}

impl ColumnContract {
    /// Load one of the built-in contracts by version.
    pub fn builtin(version: &str) -> Result<Self> {
        let (_, source) = BUILTIN
            .iter()
            .find(|(v, _)| *v == version)
            .ok_or_else(|| {
                AppError::contract(
                    version,
                    format!(
                        "unknown contract version (built in: {})",
                        builtin_versions().collect::<Vec<_>>().join(", ")
                    ),
                )
            })?;
        Self::from_toml_str(source)
    }

    /// Load a contract from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        log::debug!("Loading column contract from {:?}", path);
        Self::from_toml_str(&content)
    }

    /// Parse and validate a contract.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ContractFile = toml::from_str(content)?;
        Self::resolve(file)
    }

    fn resolve(file: ContractFile) -> Result<Self> {
        let version = file.version.trim().to_string();
        let fail = |message: String| AppError::contract(version.clone(), message);

        if version.is_empty() {
            return Err(AppError::contract("(unnamed)", "version is empty"));
        }
        if file.column_count == 0 {
            return Err(fail("column_count must be > 0".to_string()));
        }
        if file.delimiter.is_empty() || file.row_delimiter.is_empty() {
            return Err(fail("delimiters must not be empty".to_string()));
        }

        let n = file.column_count;
        let mut columns = vec![String::new(); n];
        let mut index = HashMap::new();

        if !file.columns.is_empty() {
            if file.columns.len() != n {
                return Err(fail(format!(
                    "columns lists {} names, column_count is {}",
                    file.columns.len(),
                    n
                )));
            }
            for (position, name) in file.columns.iter().enumerate() {
                if !name.is_empty() {
                    index.entry(name.clone()).or_insert(position);
                }
            }
            columns.clone_from(&file.columns);
        }
        for (name, &position) in &file.positions {
            if position >= n {
                return Err(fail(format!(
                    "position of '{name}' is {position}, beyond column_count {n}"
                )));
            }
            index.insert(name.clone(), position);
            if columns[position].is_empty() {
                columns[position].clone_from(name);
            }
        }

        let lookup = |name: &str| -> Result<usize> {
            index
                .get(name)
                .copied()
                .ok_or_else(|| fail(format!("field '{name}' has no column position")))
        };
        let lookup_opt = |name: &Option<String>| -> Result<Option<usize>> {
            name.as_deref().map(lookup).transpose()
        };

        let f = &file.fields;
        let fields = FieldPositions {
            sku: lookup(&f.sku)?,
            part_number: lookup_opt(&f.part_number)?,
            title: lookup(&f.title)?,
            brand: lookup_opt(&f.brand)?,
            price: lookup(&f.price)?,
            quantity: lookup(&f.quantity)?,
            main_image: lookup(&f.main_image)?,
            other_images: f
                .other_images
                .iter()
                .map(|name| lookup(name))
                .collect::<Result<_>>()?,
            description: lookup(&f.description)?,
            condition: lookup(&f.condition)?,
            condition_note: lookup_opt(&f.condition_note)?,
        };

        let mut defaults = Vec::with_capacity(file.defaults.len());
        for (name, value) in &file.defaults {
            let cell = match value {
                toml::Value::String(s) => Cell::text(s.clone()),
                toml::Value::Integer(i) => Cell::Number(*i),
                toml::Value::Boolean(b) => Cell::text(if *b { "TRUE" } else { "FALSE" }),
                other => {
                    return Err(fail(format!(
                        "default for '{name}' must be a string, integer or boolean, got {}",
                        other.type_str()
                    )));
                }
            };
            defaults.push((lookup(name)?, cell));
        }
        defaults.sort_by_key(|(position, _)| *position);

        let blank = file
            .blank
            .iter()
            .map(|name| lookup(name))
            .collect::<Result<Vec<_>>>()?;

        let mut header_rows = Vec::with_capacity(file.header_rows.len() + 1);
        for (i, row) in file.header_rows.iter().enumerate() {
            let mut cells: Vec<String> = row
                .split(file.delimiter.as_str())
                .map(str::to_string)
                .collect();
            if cells.len() > n {
                return Err(fail(format!(
                    "header row {} has {} cells, column_count is {}",
                    i + 1,
                    cells.len(),
                    n
                )));
            }
            // Vendor metadata rows are often shorter than the grid.
            cells.resize(n, String::new());
            header_rows.push(cells);
        }
        if file.field_name_header {
            if file.columns.is_empty() {
                return Err(fail(
                    "field_name_header requires a complete columns list".to_string(),
                ));
            }
            header_rows.push(file.columns.clone());
        }

        if file.conditions.default.trim().is_empty() {
            return Err(fail("conditions.default is empty".to_string()));
        }
        let conditions = ConditionMapping {
            map: file
                .conditions
                .map
                .into_iter()
                .map(|(k, v)| (k.trim().to_string(), v))
                .collect(),
            default: file.conditions.default,
            note_from_description: file.conditions.note_from_description,
            default_note: file.conditions.default_note,
        };

        if let Some(layout) = &file.spreadsheet {
            if layout.sheet.trim().is_empty() {
                return Err(fail("spreadsheet.sheet is empty".to_string()));
            }
        }

        log::debug!(
            "Contract {} resolved: {} columns, {} header row(s), {} default(s)",
            version,
            n,
            header_rows.len(),
            defaults.len()
        );

        Ok(Self {
            version,
            name: file.name,
            column_count: n,
            delimiter: file.delimiter,
            row_delimiter: file.row_delimiter,
            header_rows,
            columns,
            index,
            fields,
            defaults,
            blank,
            conditions,
            spreadsheet: file.spreadsheet,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Human-readable name, falling back to the version.
    pub fn name(&self) -> &str {
        if self.name.is_empty() {
            &self.version
        } else {
            &self.name
        }
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn row_delimiter(&self) -> &str {
        &self.row_delimiter
    }

    /// Header rows, each padded to the column count.
    pub fn header_rows(&self) -> &[Vec<String>] {
        &self.header_rows
    }

    /// Position of a named field.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Field name at a position, if the position is named.
    pub fn column_name(&self, position: usize) -> Option<&str> {
        self.columns
            .get(position)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn fields(&self) -> &FieldPositions {
        &self.fields
    }

    /// Fixed literals as (position, value), sorted by position.
    pub fn defaults(&self) -> &[(usize, Cell)] {
        &self.defaults
    }

    /// Positions forced empty on every row.
    pub fn blank_positions(&self) -> &[usize] {
        &self.blank
    }

    pub fn conditions(&self) -> &ConditionMapping {
        &self.conditions
    }

    /// Workbook layout, present only for spreadsheet contracts.
    pub fn spreadsheet(&self) -> Option<&SpreadsheetLayout> {
        self.spreadsheet.as_ref()
    }
}
