//! Reported totals versus the sum of their components.
//!
//! Advisory only: every mismatching row is counted and listed, nothing is
//! rejected.

use crate::table::Table;
use crate::taxonomy::{self, POINT_ID, TOTAL_WORKERS, WORKER_FIELDS};
use serde::Serialize;
use tracing::warn;

/// A reported-total column and the columns it should add up from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotalRule {
    pub total: &'static str,
    pub components: &'static [&'static str],
}

pub const TOTAL_RULES: &[TotalRule] = &[TotalRule {
    total: TOTAL_WORKERS,
    components: WORKER_FIELDS,
}];

const TOLERANCE: f64 = 1e-9;

/// Whether a reported total agrees with the sum of its components.
pub fn totals_agree(reported: f64, computed: f64) -> bool {
    (reported - computed).abs() <= TOLERANCE
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    #[serde(rename = "fila")]
    pub row: usize,
    #[serde(rename = "id_punto")]
    pub point_id: String,
    #[serde(rename = "reportado")]
    pub reported: f64,
    #[serde(rename = "calculado")]
    pub computed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalCheck {
    #[serde(rename = "campo_total")]
    pub total_field: String,
    #[serde(rename = "componentes")]
    pub components: Vec<String>,
    #[serde(rename = "filas_revisadas")]
    pub rows_checked: usize,
    #[serde(rename = "filas_con_diferencia")]
    pub mismatched_rows: usize,
    #[serde(rename = "diferencia_maxima")]
    pub max_difference: f64,
    #[serde(rename = "detalle")]
    pub mismatches: Vec<Mismatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsistencyReport {
    #[serde(rename = "verificaciones")]
    pub checks: Vec<TotalCheck>,
}

impl ConsistencyReport {
    pub fn warnings(&self) -> usize {
        self.checks.iter().map(|c| c.mismatched_rows).sum()
    }
}

/// Checks every rule whose total column exists and at least one component
/// exists. Absent components count as nothing.
pub fn check(table: &Table, rules: &[TotalRule]) -> ConsistencyReport {
    let mut checks = Vec::new();
    for rule in rules {
        if !table.has_column(rule.total) {
            continue;
        }
        let components = taxonomy::present(table, rule.components);
        if components.is_empty() {
            continue;
        }

        let mut mismatches = Vec::new();
        let mut max_difference = 0.0f64;
        for row in table.rows() {
            let reported = row.number(rule.total);
            let computed: f64 = components.iter().map(|f| row.number(f)).sum();
            if !totals_agree(reported, computed) {
                max_difference = max_difference.max((reported - computed).abs());
                mismatches.push(Mismatch {
                    row: row.index() + 1,
                    point_id: row.text(POINT_ID),
                    reported,
                    computed,
                });
            }
        }

        if !mismatches.is_empty() {
            warn!(
                total = rule.total,
                rows = mismatches.len(),
                "reported total disagrees with its components"
            );
        }
        checks.push(TotalCheck {
            total_field: rule.total.to_string(),
            components: components.iter().map(|c| c.to_string()).collect(),
            rows_checked: table.len(),
            mismatched_rows: mismatches.len(),
            max_difference,
            mismatches,
        });
    }
    ConsistencyReport { checks }
}
