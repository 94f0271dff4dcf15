//! Structural checks run before any cell is touched.
//!
//! The validator fails closed: an empty table, a missing required column, or
//! a coordinate column that cannot be read as numbers rejects the whole
//! dataset. Out-of-range coordinate values are not checked here.

use crate::config::Settings;
use crate::error::{IngestError, SchemaProblem};
use crate::table::Table;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Validation {
    pub valid: bool,
    /// Required columns the table lacks, in required-list order.
    pub missing_fields: Vec<String>,
    /// Present columns that failed their type check.
    pub invalid_fields: Vec<String>,
    pub problems: Vec<SchemaProblem>,
}

impl Validation {
    /// `(valid, offending field names)`.
    pub fn verdict(&self) -> (bool, Vec<String>) {
        let mut fields = self.missing_fields.clone();
        fields.extend(self.invalid_fields.iter().cloned());
        (self.valid, fields)
    }

    pub fn into_result(self) -> Result<(), IngestError> {
        if self.valid {
            Ok(())
        } else {
            Err(IngestError::Schema(self.problems))
        }
    }
}

pub struct SchemaValidator<'a> {
    required: &'a [String],
    numeric: &'a [String],
}

impl<'a> SchemaValidator<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        SchemaValidator {
            required: &settings.required_columns,
            numeric: &settings.coordinate_columns,
        }
    }

    pub fn validate(&self, table: &Table) -> Validation {
        let mut problems = Vec::new();

        let mut missing_fields: Vec<String> = Vec::new();
        for col in self.required {
            if !table.has_column(col) && !missing_fields.contains(col) {
                missing_fields.push(col.clone());
            }
        }
        if !missing_fields.is_empty() {
            problems.push(SchemaProblem::MissingColumns {
                columns: missing_fields.clone(),
            });
        }

        if table.is_empty() {
            problems.push(SchemaProblem::EmptyDataset);
        }

        let mut invalid_fields = Vec::new();
        for field in self.numeric {
            if let Some(sample) = first_non_numeric(table, field) {
                problems.push(SchemaProblem::NonNumericColumn {
                    field: field.clone(),
                    sample,
                });
                invalid_fields.push(field.clone());
            }
        }

        let valid = problems.is_empty();
        if valid {
            debug!(rows = table.len(), columns = table.columns().len(), "schema ok");
        } else {
            for p in &problems {
                warn!(problem = %p, "schema validation failed");
            }
        }
        Validation {
            valid,
            missing_fields,
            invalid_fields,
            problems,
        }
    }
}

/// First non-blank cell of `field` that cannot be coerced to a number.
/// Blank cells pass; the record builder deals with those row by row.
fn first_non_numeric(table: &Table, field: &str) -> Option<String> {
    table
        .column(field)?
        .find(|c| !c.is_blank() && c.as_f64().is_none())
        .map(|c| c.to_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::REQUIRED_COLUMNS;

    fn full_row() -> Vec<&'static str> {
        vec![
            "POINT", "-75.58", "6.24", "2024-03-01", "P-1", "Finalizada", "2024-03-02",
            "Ana", "2", "5",
        ]
    }

    #[test]
    fn valid_table_passes_with_no_missing_fields() {
        let table = Table::from_strings(REQUIRED_COLUMNS, &[full_row()]);
        let settings = Settings::default();
        let v = SchemaValidator::new(&settings).validate(&table);
        assert!(v.valid);
        assert_eq!(v.verdict(), (true, vec![]));
    }

    #[test]
    fn missing_fields_are_the_set_difference() {
        let present = ["Shape", "X", "Y", "id_punto", "nombre_int", "extra"];
        let table = Table::from_strings(&present, &[vec!["a", "-75.5", "6.2", "p", "n", "e"]]);
        let settings = Settings::default();
        let v = SchemaValidator::new(&settings).validate(&table);
        assert!(!v.valid);
        let expected: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !present.contains(*c))
            .map(|c| c.to_string())
            .collect();
        assert_eq!(v.missing_fields, expected);
        assert_eq!(v.verdict().1, expected);
    }

    #[test]
    fn empty_table_is_rejected() {
        let table = Table::new(REQUIRED_COLUMNS.iter().copied());
        let settings = Settings::default();
        let v = SchemaValidator::new(&settings).validate(&table);
        assert!(!v.valid);
        assert!(v.missing_fields.is_empty());
        assert_eq!(v.problems, vec![SchemaProblem::EmptyDataset]);
        let err = v.into_result().unwrap_err();
        assert!(err.to_string().contains("dataset is empty"));
    }

    #[test]
    fn coordinate_column_must_coerce_to_numbers() {
        let mut bad = full_row();
        bad[1] = "norte";
        let table = Table::from_strings(REQUIRED_COLUMNS, &[full_row(), bad]);
        let settings = Settings::default();
        let v = SchemaValidator::new(&settings).validate(&table);
        assert!(!v.valid);
        assert_eq!(v.invalid_fields, vec!["X".to_string()]);
        assert_eq!(v.verdict().1, vec!["X".to_string()]);
    }

    #[test]
    fn blank_and_out_of_range_coordinates_are_not_structural() {
        let mut blank = full_row();
        blank[2] = "";
        let mut far = full_row();
        far[1] = "0";
        far[2] = "0";
        let table = Table::from_strings(REQUIRED_COLUMNS, &[blank, far]);
        let settings = Settings::default();
        assert!(SchemaValidator::new(&settings).validate(&table).valid);
    }
}
