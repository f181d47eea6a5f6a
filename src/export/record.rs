// src/export/record.rs

//! Flat-file records and the listing-to-row builder.

use std::borrow::Cow;
use std::fmt;

use crate::export::ColumnContract;
use crate::models::Listing;
use crate::utils::text::sanitize_cell;

/// One grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(i64),
}

impl Cell {
    /// Text cell, or [`Cell::Empty`] for an empty string.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Cell content as written to a delimited file.
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Cell::Empty => Cow::Borrowed(""),
            Cell::Text(s) => Cow::Borrowed(s),
            Cell::Number(n) => Cow::Owned(n.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// A full row with exactly the contract's column count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatFileRecord {
    cells: Vec<Cell>,
}

impl FlatFileRecord {
    /// Row of `len` empty cells.
    pub fn empty(len: usize) -> Self {
        Self {
            cells: vec![Cell::Empty; len],
        }
    }

    pub fn from_cells(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, position: usize) -> Option<&Cell> {
        self.cells.get(position)
    }

    /// Value of a named column, rendered.
    pub fn value<'a>(&'a self, contract: &ColumnContract, name: &str) -> Option<Cow<'a, str>> {
        contract
            .position(name)
            .and_then(|p| self.get(p))
            .map(Cell::render)
    }

    fn set(&mut self, position: usize, cell: Cell) {
        if let Some(slot) = self.cells.get_mut(position) {
            *slot = cell;
        }
    }
}

/// Builds contract-shaped rows from listings.
#[derive(Debug, Clone, Copy)]
pub struct RecordBuilder<'a> {
    contract: &'a ColumnContract,
    min_listing_price: i64,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(contract: &'a ColumnContract, min_listing_price: i64) -> Self {
        Self {
            contract,
            min_listing_price,
        }
    }

    pub fn contract(&self) -> &'a ColumnContract {
        self.contract
    }

    /// Build one row. Every free-text value passes through the sanitizer;
    /// positions the contract does not bind stay empty.
    pub fn build(&self, listing: &Listing) -> FlatFileRecord {
        let contract = self.contract;
        let fields = contract.fields();
        let mut record = FlatFileRecord::empty(contract.column_count());

        for (position, cell) in contract.defaults() {
            record.set(*position, cell.clone());
        }

        let sku = sanitize_cell(&listing.id);
        if let Some(position) = fields.part_number {
            record.set(position, Cell::text(sku.clone()));
        }
        record.set(fields.sku, Cell::text(sku));
        record.set(fields.title, Cell::text(sanitize_cell(&listing.title)));

        if let (Some(position), Some(brand)) = (fields.brand, listing.brand()) {
            let brand = sanitize_cell(brand);
            if !brand.is_empty() {
                record.set(position, Cell::Text(brand));
            }
        }

        record.set(fields.quantity, Cell::Number(1));
        record.set(fields.price, Cell::Number(self.price(listing)));

        let mut images = listing.images.iter().map(|url| Cell::text(sanitize_cell(url)));
        if let Some(main) = images.next() {
            record.set(fields.main_image, main);
        }
        for (position, image) in fields.other_images.iter().zip(images) {
            record.set(*position, image);
        }

        let description = sanitize_cell(&listing.description);

        let conditions = contract.conditions();
        record.set(
            fields.condition,
            Cell::text(conditions.map(listing.condition.as_deref())),
        );
        if let Some(position) = fields.condition_note {
            let note = if conditions.note_from_description && !description.is_empty() {
                description.clone()
            } else {
                sanitize_cell(&conditions.default_note)
            };
            record.set(position, Cell::text(note));
        }

        record.set(fields.description, Cell::text(description));

        for position in contract.blank_positions() {
            record.set(*position, Cell::Empty);
        }

        record
    }

    /// Build rows for a batch, preserving order.
    pub fn build_all(&self, listings: &[Listing]) -> Vec<FlatFileRecord> {
        listings.iter().map(|l| self.build(l)).collect()
    }

    fn price(&self, listing: &Listing) -> i64 {
        match listing.effective_price() {
            p if p > 0 => p,
            _ => self.min_listing_price,
        }
    }
}
