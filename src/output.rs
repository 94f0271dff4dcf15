use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

/// Creates `dir` if needed and returns the path of `file` inside it.
pub fn output_path(dir: impl AsRef<Path>, file: &str) -> Result<PathBuf, Box<dyn Error>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    Ok(dir.join(file))
}

pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Markdown rendering of the first `max_rows` rows.
pub fn render_rows<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(sin filas)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", render_rows(rows, max_rows));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StatusRow;

    fn rows() -> Vec<StatusRow> {
        vec![
            StatusRow {
                status: "Finalizada".into(),
                records: 2,
                share: "66.67".into(),
            },
            StatusRow {
                status: "En ejecución".into(),
                records: 1,
                share: "33.33".into(),
            },
        ]
    }

    #[test]
    fn markdown_preview_is_truncated() {
        let text = render_rows(&rows(), 1);
        assert!(text.contains("Finalizada"));
        assert!(!text.contains("En ejecución"));
        assert!(text.contains("Estado"));
        assert_eq!(render_rows::<StatusRow>(&[], 5), "(sin filas)");
    }

    #[test]
    fn csv_uses_renamed_headers() {
        let dir = std::env::temp_dir().join(format!("survey_report_out_{}", std::process::id()));
        let path = output_path(&dir, "estados.csv").unwrap();
        write_csv(&path, &rows()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("Estado,Registros,Porcentaje\n"));
        assert!(written.contains("Finalizada,2,66.67"));
        let _ = std::fs::remove_dir_all(dir);
    }
}
