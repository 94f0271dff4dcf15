use crate::table::{Cell, Table};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use csv::ReaderBuilder;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("unsupported file extension: {0:?}")]
    UnsupportedExtension(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook has no sheets")]
    NoSheets,
}

/// Load a survey export into a raw table. `.csv` goes through the csv
/// reader, spreadsheet formats through calamine (first sheet only).
pub fn load_table(path: impl AsRef<Path>) -> Result<Table, LoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoadError::NotFound(path.display().to_string()));
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let table = match ext.as_str() {
        "csv" => load_csv(path)?,
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => load_workbook(path)?,
        _ => return Err(LoadError::UnsupportedExtension(ext)),
    };
    info!(
        path = %path.display(),
        rows = table.len(),
        columns = table.columns().len(),
        "dataset loaded"
    );
    Ok(table)
}

pub fn load_csv(path: &Path) -> Result<Table, LoadError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut table = Table::new(headers);
    for result in rdr.records() {
        let record = result?;
        table.push_row(record.iter().map(Cell::from_raw).collect());
    }
    Ok(table)
}

pub fn load_workbook(path: &Path) -> Result<Table, LoadError> {
    // calamine auto-detects the format: xls, xlsx, xlsb, ods
    let mut workbook = open_workbook_auto(path)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(LoadError::NoSheets)?;
    let range = workbook.worksheet_range(&sheet)?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Table::default());
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| match cell {
            Data::String(s) => s.trim().to_string(),
            Data::Empty => String::new(),
            other => other.to_string(),
        })
        .collect();

    let mut table = Table::new(headers);
    for row in rows {
        if row.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        table.push_row(row.iter().map(cell_from_workbook).collect());
    }
    Ok(table)
}

fn cell_from_workbook(value: &Data) -> Cell {
    match value {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::from_raw(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) => {
            value.as_datetime().map(Cell::Date).unwrap_or(Cell::Empty)
        }
        other => Cell::from_raw(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_extension_and_missing_file() {
        assert!(matches!(
            load_table("definitely/not/here.csv"),
            Err(LoadError::NotFound(_))
        ));
        let manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
        assert!(matches!(
            load_table(&manifest),
            Err(LoadError::UnsupportedExtension(ext)) if ext == "toml"
        ));
    }

    #[test]
    fn workbook_cells_map_to_typed_cells() {
        assert_eq!(cell_from_workbook(&Data::Int(4)), Cell::Number(4.0));
        assert_eq!(cell_from_workbook(&Data::String("  ".into())), Cell::Empty);
        assert_eq!(
            cell_from_workbook(&Data::String("Finalizada".into())),
            Cell::Text("Finalizada".into())
        );
        assert_eq!(cell_from_workbook(&Data::Bool(true)), Cell::Bool(true));
    }

    #[test]
    fn loads_csv_fixture() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/encuesta.csv");
        let table = load_table(&path).unwrap();
        assert!(table.has_column("estado_obr"));
        assert!(table.len() > 0);
    }
}
