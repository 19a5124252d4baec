// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::macros::format_description;
use time::{Date, OffsetDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub header: &'static str,
    pub width: usize,
}

impl Column {
    pub const fn new(header: &'static str, width: usize) -> Self {
        Self { header, width }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableCell {
    Integer(i64),
    Text(String),
    Date(Date),
    Null,
}

impl TableCell {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn optional_text(value: Option<&str>) -> Self {
        value.map_or(Self::Null, Self::text)
    }

    pub fn timestamp(value: OffsetDateTime) -> Self {
        Self::Date(value.date())
    }

    pub fn display(&self) -> String {
        match self {
            Self::Integer(value) => value.to_string(),
            Self::Text(value) => value.clone(),
            Self::Date(value) => format_date(*value),
            Self::Null => String::new(),
        }
    }
}

pub fn format_date(value: Date) -> String {
    value
        .format(&format_description!("[year]/[month]/[day]"))
        .unwrap_or_default()
}

fn pad(value: &str, width: usize) -> String {
    format!("{value:<width$}")
}

fn join_cells(cells: impl Iterator<Item = String>) -> String {
    format!("|{}|", cells.collect::<Vec<_>>().join(" |"))
}

/// Lay out a fixed-width table: every cell is left-aligned and padded to its
/// column width. With `numbered` set, rows carry a 1-based page-relative
/// number and the header line a `#` marker.
pub fn render_table(columns: &[Column], rows: &[Vec<TableCell>], numbered: bool) -> Vec<String> {
    let header = join_cells(
        columns
            .iter()
            .map(|column| pad(column.header, column.width)),
    );
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(if numbered {
        format!("# {header}")
    } else {
        header
    });

    for (index, row) in rows.iter().enumerate() {
        let cells = join_cells(
            columns
                .iter()
                .zip(row)
                .map(|(column, cell)| pad(&cell.display(), column.width)),
        );
        if numbered {
            lines.push(format!("{:<2}{cells}", index + 1));
        } else {
            lines.push(cells);
        }
    }
    lines
}
