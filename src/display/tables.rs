//! Table formatting utilities for structured output.

use comfy_table::{
    Attribute, Cell, CellAlignment, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
};

use crate::assemble::Recommendation;
use crate::summary::{price_description, rating_text};

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    /// Create a new table builder.
    pub fn new() -> Self {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.apply_modifier(UTF8_ROUND_CORNERS);
        Self { table }
    }

    /// Set the table headers.
    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        let header_cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect();
        self.table.set_header(header_cells);
        self
    }

    /// Add a row to the table.
    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Build and return the formatted table.
    pub fn build(self) -> String {
        self.table.to_string()
    }
}

/// Ranked results, one row per entity in result order.
pub fn create_recommendation_table(records: &[Recommendation]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);

    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Name").add_attribute(Attribute::Bold),
        Cell::new("Cuisine").add_attribute(Attribute::Bold),
        Cell::new("Locality").add_attribute(Attribute::Bold),
        Cell::new("Rating").add_attribute(Attribute::Bold),
        Cell::new("Votes").add_attribute(Attribute::Bold),
        Cell::new("Price").add_attribute(Attribute::Bold),
        Cell::new("Pros").add_attribute(Attribute::Bold),
        Cell::new("Cons").add_attribute(Attribute::Bold),
    ]);

    for (rank, record) in records.iter().enumerate() {
        let entity = &record.entity;
        table.add_row(vec![
            Cell::new(rank + 1).set_alignment(CellAlignment::Right),
            Cell::new(&entity.name),
            Cell::new(&entity.cuisine),
            Cell::new(&entity.locality),
            Cell::new(rating_text(entity.rating)),
            Cell::new(entity.votes).set_alignment(CellAlignment::Right),
            Cell::new(price_description(
                entity.price_range,
                entity.avg_cost,
                &entity.currency,
            )),
            Cell::new(record.pros().join(", ")),
            Cell::new(record.cons().join(", ")),
        ]);
    }

    table.to_string()
}

/// Single-column listing, used for cities and cuisines.
pub fn create_value_list(header: &str, values: &[String]) -> String {
    let mut builder = TableBuilder::new().set_headers(vec![header]);
    for value in values {
        builder = builder.add_row(vec![value.clone()]);
    }
    builder.build()
}
