use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Column pandas writes for an unnamed index; never treated as a label.
pub const INDEX_COLUMN: &str = "Unnamed: 0";

/// Per-sample numeric labels, one named column per label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelTable {
    columns: Vec<(String, Vec<f64>)>,
    n_rows: usize,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. The first column fixes the row count; later
    /// columns must match it.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if !self.columns.is_empty() && values.len() != self.n_rows {
            return Err(Error::Validation(format!(
                "column {name:?} has {} rows, table has {}",
                values.len(),
                self.n_rows
            )));
        }
        if self.columns.iter().any(|(existing, _)| *existing == name) {
            return Err(Error::Validation(format!("duplicate column {name:?}")));
        }
        self.n_rows = values.len();
        self.columns.push((name, values));
        Ok(())
    }

    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.push_column(name, values)?;
        Ok(self)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Column names excluding the pandas index column, in table order.
    pub fn label_names(&self) -> Vec<&str> {
        self.column_names()
            .filter(|name| *name != INDEX_COLUMN)
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Parse a header-first comma-separated table. Fields may be
    /// double-quoted (`""` inside quotes is a literal quote) but not span
    /// lines. Empty cells and `nan` read as NaN.
    pub fn parse_csv(text: &str) -> Result<Self> {
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());
        let header = lines
            .next()
            .ok_or_else(|| Error::Validation("label csv is empty".to_string()))?;
        let names: Vec<String> = split_record(header, 0)?
            .into_iter()
            .map(|name| name.trim().to_string())
            .collect();

        let mut values: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
        for (row, line) in lines.enumerate() {
            let cells = split_record(line, row + 1)?;
            if cells.len() != names.len() {
                return Err(Error::Validation(format!(
                    "label csv row {} has {} fields, header has {}",
                    row + 1,
                    cells.len(),
                    names.len()
                )));
            }
            for (col, cell) in cells.iter().enumerate() {
                values[col].push(parse_cell(cell, &names[col], row + 1)?);
            }
        }

        let mut table = Self::new();
        for (name, column) in names.into_iter().zip(values) {
            table.push_column(name, column)?;
        }
        Ok(table)
    }

    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        Self::parse_csv(&text)
    }
}

/// Split one record on commas outside double quotes.
fn split_record(line: &str, row: usize) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    if quoted {
        return Err(Error::Validation(format!(
            "label csv row {row} has an unterminated quote"
        )));
    }
    fields.push(field);
    Ok(fields)
}

fn parse_cell(cell: &str, column: &str, row: usize) -> Result<f64> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>().map_err(|_| {
        Error::Validation(format!(
            "label csv row {row} column {column:?}: {cell:?} is not numeric"
        ))
    })
}
