//! Cell-level coercion of a validated table.
//!
//! - date columns: parsed, unparseable cells become `Empty` (never epoch 0)
//! - numeric columns: parsed, unparseable cells become `0`
//! - coordinate columns: parsed, unparseable cells become `Empty`
//! - text columns: trimmed strings, missing becomes `""`
//!
//! Nothing in here fails; what got defaulted is counted in
//! [`NormalizationReport`]. Running the normalizer on its own output changes
//! nothing.

use crate::config::Settings;
use crate::table::{Cell, Table};
use crate::util::{excel_serial_to_datetime, number_to_text, parse_datetime_safe};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizationReport {
    /// Non-blank numeric cells that could not be parsed and were zero-filled.
    #[serde(rename = "celdas_numericas_por_defecto")]
    pub defaulted_numbers: BTreeMap<String, usize>,
    /// Non-blank date cells that could not be parsed and became missing.
    #[serde(rename = "fechas_no_reconocidas")]
    pub unparsed_dates: BTreeMap<String, usize>,
    /// Non-blank coordinate cells that could not be parsed.
    #[serde(rename = "coordenadas_no_reconocidas")]
    pub unparsed_coordinates: BTreeMap<String, usize>,
}

impl NormalizationReport {
    pub fn total_defaulted(&self) -> usize {
        self.defaulted_numbers.values().sum::<usize>()
            + self.unparsed_dates.values().sum::<usize>()
            + self.unparsed_coordinates.values().sum::<usize>()
    }
}

pub struct Normalizer<'a> {
    settings: &'a Settings,
}

impl<'a> Normalizer<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Normalizer { settings }
    }

    pub fn normalize(&self, table: &Table) -> (Table, NormalizationReport) {
        let mut out = table.clone();
        let mut report = NormalizationReport::default();

        for col in &self.settings.date_columns {
            let mut failed = 0usize;
            out.map_column(col, |c| {
                let (cell, ok) = to_date(c);
                failed += usize::from(!ok);
                cell
            });
            record(&mut report.unparsed_dates, col, failed);
        }

        for col in &self.settings.numeric_columns {
            let mut failed = 0usize;
            out.map_column(col, |c| {
                let (cell, ok) = to_number(c);
                failed += usize::from(!ok);
                cell
            });
            record(&mut report.defaulted_numbers, col, failed);
        }

        for col in &self.settings.coordinate_columns {
            let mut failed = 0usize;
            out.map_column(col, |c| {
                let (cell, ok) = to_coordinate(c);
                failed += usize::from(!ok);
                cell
            });
            record(&mut report.unparsed_coordinates, col, failed);
        }

        for col in &self.settings.text_columns {
            out.map_column(col, to_text);
        }

        if report.total_defaulted() > 0 {
            warn!(
                numbers = report.defaulted_numbers.values().sum::<usize>(),
                dates = report.unparsed_dates.values().sum::<usize>(),
                coordinates = report.unparsed_coordinates.values().sum::<usize>(),
                "cells defaulted during normalization"
            );
        }
        (out, report)
    }
}

fn record(counts: &mut BTreeMap<String, usize>, col: &str, failed: usize) {
    if failed > 0 {
        counts.insert(col.to_string(), failed);
    }
}

// Each coercion returns the new cell and whether the input was usable
// (blank input counts as usable: it was missing, not malformed).

fn to_date(c: &Cell) -> (Cell, bool) {
    match c {
        Cell::Date(_) => (c.clone(), true),
        Cell::Number(n) => match excel_serial_to_datetime(*n) {
            Some(d) => (Cell::Date(d), true),
            None => (Cell::Empty, false),
        },
        Cell::Text(s) => match parse_datetime_safe(Some(s)) {
            Some(d) => (Cell::Date(d), true),
            None => (Cell::Empty, s.trim().is_empty()),
        },
        Cell::Empty => (Cell::Empty, true),
        Cell::Bool(_) => (Cell::Empty, false),
    }
}

fn to_number(c: &Cell) -> (Cell, bool) {
    match c {
        Cell::Number(n) if n.is_finite() => (c.clone(), true),
        Cell::Bool(b) => (Cell::Number(if *b { 1.0 } else { 0.0 }), true),
        Cell::Empty => (Cell::Number(0.0), true),
        Cell::Text(s) if s.trim().is_empty() => (Cell::Number(0.0), true),
        other => match other.as_f64() {
            Some(n) => (Cell::Number(n), true),
            None => (Cell::Number(0.0), false),
        },
    }
}

fn to_coordinate(c: &Cell) -> (Cell, bool) {
    if c.is_blank() {
        return (Cell::Empty, true);
    }
    match c.as_f64() {
        Some(n) => (Cell::Number(n), true),
        None => (Cell::Empty, false),
    }
}

fn to_text(c: &Cell) -> Cell {
    match c {
        Cell::Text(s) => Cell::Text(s.trim().to_string()),
        Cell::Empty => Cell::Text(String::new()),
        Cell::Number(n) => Cell::Text(number_to_text(*n)),
        other => Cell::Text(other.to_text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_strings(
            &["id_punto", "fecha_dilig", "start", "cant_ayuda", "horas_retr", "X", "Y", "libre"],
            &[
                vec!["  P-1 ", "2024-03-05", "", "2", "1.5", "-75.58", "6.24", " x "],
                vec!["", "no aplica", "3/5/2024 8:00:00 AM", "N/A", "", "", "6.2", ""],
            ],
        )
    }

    #[test]
    fn coerces_each_column_family() {
        let settings = Settings::default();
        let (t, report) = Normalizer::new(&settings).normalize(&sample());
        let r0 = t.row(0).unwrap();
        let r1 = t.row(1).unwrap();

        assert_eq!(r0.get("id_punto"), &Cell::Text("P-1".into()));
        assert_eq!(r1.get("id_punto"), &Cell::Text(String::new()));

        assert!(r0.get("fecha_dilig").as_date().is_some());
        assert_eq!(r1.get("fecha_dilig"), &Cell::Empty);
        assert_eq!(r0.get("start"), &Cell::Empty);
        assert!(r1.get("start").as_date().is_some());

        assert_eq!(r0.get("cant_ayuda"), &Cell::Number(2.0));
        assert_eq!(r1.get("cant_ayuda"), &Cell::Number(0.0));
        assert_eq!(r1.get("horas_retr"), &Cell::Number(0.0));

        assert_eq!(r0.get("X"), &Cell::Number(-75.58));
        assert_eq!(r1.get("X"), &Cell::Empty);

        // columns outside every list are left alone
        assert_eq!(r0.get("libre"), &Cell::Text(" x ".into()));

        assert_eq!(report.defaulted_numbers.get("cant_ayuda"), Some(&1));
        assert_eq!(report.defaulted_numbers.get("horas_retr"), None);
        assert_eq!(report.unparsed_dates.get("fecha_dilig"), Some(&1));
        assert_eq!(report.total_defaulted(), 2);
    }

    #[test]
    fn normalizing_twice_is_a_fixed_point() {
        let settings = Settings::default();
        let normalizer = Normalizer::new(&settings);
        let (once, _) = normalizer.normalize(&sample());
        let (twice, report) = normalizer.normalize(&once);
        assert_eq!(once, twice);
        assert_eq!(report.total_defaulted(), 0);
    }

    #[test]
    fn numeric_dates_are_excel_serials() {
        let (cell, ok) = to_date(&Cell::Number(45356.0));
        assert!(ok);
        assert_eq!(cell.to_text(), "2024-03-05 00:00:00");
    }
}
