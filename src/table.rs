//! In-memory tabular dataset: named columns over rows of loosely typed cells.
//!
//! Loaders produce a raw [`Table`] (mostly text cells); the normalizer returns
//! a new `Table` whose designated columns carry typed cells. Nothing here
//! knows about the survey schema.

use crate::util::{number_to_text, parse_f64_safe};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    Date(NaiveDateTime),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// Build a cell from raw text: blank input is `Empty`, everything else is
    /// kept verbatim (trimming is the normalizer's job).
    pub fn from_raw(s: &str) -> Self {
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Best-effort numeric view. Text is parsed leniently; dates and booleans
    /// are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => parse_f64_safe(Some(s)),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Text rendering used for identifiers, labels and previews.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) => number_to_text(*n),
            Cell::Text(s) => s.clone(),
            Cell::Bool(b) => b.to_string(),
            Cell::Date(d) => d.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table. Duplicate header names keep their first
    /// position for lookups.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Table {
            columns,
            index,
            rows: Vec::new(),
        }
    }

    /// Convenience constructor over string cells; blank strings become `Empty`.
    pub fn from_strings(columns: &[&str], rows: &[Vec<&str>]) -> Self {
        let mut table = Table::new(columns.iter().copied());
        for row in rows {
            table.push_row(row.iter().map(|s| Cell::from_raw(s)).collect());
        }
        table
    }

    /// Append a row, padding short rows with `Empty` and dropping extra cells.
    pub fn push_row(&mut self, mut cells: Vec<Cell>) {
        cells.resize(self.columns.len(), Cell::Empty);
        self.rows.push(cells);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, idx: usize) -> Option<Row<'_>> {
        (idx < self.rows.len()).then_some(Row { table: self, idx })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        (0..self.rows.len()).map(move |idx| Row { table: self, idx })
    }

    /// Cells of one column, top to bottom. `None` when the column is absent.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Cell> + '_> {
        let col = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| &r[col]))
    }

    /// Numeric view of a column; non-numeric cells read as 0.
    pub fn numbers(&self, name: &str) -> Option<Vec<f64>> {
        Some(
            self.column(name)?
                .map(|c| c.as_f64().unwrap_or(0.0))
                .collect(),
        )
    }

    /// Rewrite every cell of `name` in place. No-op if the column is absent.
    pub fn map_column<F>(&mut self, name: &str, mut f: F)
    where
        F: FnMut(&Cell) -> Cell,
    {
        let Some(col) = self.column_index(name) else {
            return;
        };
        for row in &mut self.rows {
            row[col] = f(&row[col]);
        }
    }

    /// Rebuild a table over `columns` from field -> cell snapshots. Fields a
    /// snapshot lacks become `Empty`.
    pub fn from_snapshots<'a>(
        columns: &[String],
        snapshots: impl IntoIterator<Item = &'a HashMap<String, Cell>>,
    ) -> Self {
        let mut table = Table::new(columns.iter().cloned());
        for snap in snapshots {
            let cells = columns
                .iter()
                .map(|c| snap.get(c).cloned().unwrap_or_default())
                .collect();
            table.push_row(cells);
        }
        table
    }
}

/// Borrowed view of one row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    idx: usize,
}

impl<'a> Row<'a> {
    pub fn index(&self) -> usize {
        self.idx
    }

    /// Cell for `field`, or `Empty` when the column does not exist.
    pub fn get(&self, field: &str) -> &'a Cell {
        match self.table.column_index(field) {
            Some(col) => &self.table.rows[self.idx][col],
            None => &EMPTY_CELL,
        }
    }

    pub fn number(&self, field: &str) -> f64 {
        self.get(field).as_f64().unwrap_or(0.0)
    }

    pub fn text(&self, field: &str) -> String {
        self.get(field).to_text().trim().to_string()
    }

    pub fn to_map(&self) -> HashMap<String, Cell> {
        self.table
            .columns
            .iter()
            .zip(&self.table.rows[self.idx])
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_rows_and_reads_missing_columns_as_empty() {
        let mut t = Table::new(["a", "b", "c"]);
        t.push_row(vec![Cell::Number(1.0)]);
        let row = t.row(0).unwrap();
        assert_eq!(row.get("a"), &Cell::Number(1.0));
        assert_eq!(row.get("c"), &Cell::Empty);
        assert_eq!(row.get("zzz"), &Cell::Empty);
        assert_eq!(row.number("zzz"), 0.0);
    }

    #[test]
    fn cell_views() {
        assert_eq!(Cell::from_raw("  "), Cell::Empty);
        assert_eq!(Cell::Text(" 7 ".into()).as_f64(), Some(7.0));
        assert_eq!(Cell::Number(f64::NAN).as_f64(), None);
        assert_eq!(Cell::Number(3.0).to_text(), "3");
        assert!(Cell::Text("   ".into()).is_blank());
    }

    #[test]
    fn snapshots_round_back_into_a_table() {
        let t = Table::from_strings(&["id", "v"], &[vec!["p1", "4"], vec!["p2", ""]]);
        let snaps: Vec<_> = t.rows().map(|r| r.to_map()).collect();
        let rebuilt = Table::from_snapshots(t.columns(), &snaps);
        assert_eq!(rebuilt, t);
    }

    #[test]
    fn map_column_ignores_absent_columns() {
        let mut t = Table::from_strings(&["v"], &[vec!["1"]]);
        t.map_column("missing", |_| Cell::Number(9.0));
        t.map_column("v", |c| Cell::Number(c.as_f64().unwrap_or(0.0) * 2.0));
        assert_eq!(t.numbers("v"), Some(vec![2.0]));
    }
}
