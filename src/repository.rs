use crate::aggregate::{aggregate, Aggregate, Statistics};
use crate::config::Settings;
use crate::model::{Kpi, Record, WorkStatus};
use crate::rollup::OrderedMap;
use crate::table::Table;
use crate::taxonomy::POINT_ID;
use serde::Serialize;
use tracing::warn;

/// A source row that could not become a [`Record`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    #[serde(rename = "fila")]
    pub row: usize,
    #[serde(rename = "id_punto")]
    pub point_id: String,
    #[serde(rename = "motivo")]
    pub reason: String,
}

/// The records of one loaded dataset. Loading a new table replaces the
/// whole collection.
#[derive(Debug, Clone, Default)]
pub struct RecordRepository {
    columns: Vec<String>,
    records: Vec<Record>,
    skipped: Vec<SkippedRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryStatistics {
    #[serde(flatten)]
    pub statistics: Statistics,
    pub total_intervenciones: usize,
    pub distribucion_estados: OrderedMap<usize>,
    pub kpis_agregados: Kpi,
}

impl RecordRepository {
    /// One record per row; rows that fail are skipped and logged by point id.
    pub fn from_table(table: &Table) -> Self {
        let mut repo = RecordRepository::default();
        repo.replace(table);
        repo
    }

    pub fn replace(&mut self, table: &Table) {
        self.columns = table.columns().to_vec();
        self.records.clear();
        self.skipped.clear();
        for row in table.rows() {
            match Record::from_row(&row) {
                Ok(record) => self.records.push(record),
                Err(e) => {
                    let point_id = row.text(POINT_ID);
                    warn!(row = row.index() + 1, id_punto = %point_id, error = %e, "row skipped");
                    self.skipped.push(SkippedRow {
                        row: row.index() + 1,
                        point_id,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn skipped(&self) -> &[SkippedRow] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn by_status(&self, status: WorkStatus) -> impl Iterator<Item = &Record> + '_ {
        self.records
            .iter()
            .filter(move |r| r.general.status == status)
    }

    /// Count per canonical status, every status listed.
    pub fn status_distribution(&self) -> OrderedMap<usize> {
        WorkStatus::ALL
            .iter()
            .map(|s| (s.label().to_string(), self.by_status(*s).count()))
            .collect()
    }

    pub fn aggregate_kpis(&self) -> Kpi {
        if self.records.is_empty() {
            return Kpi::default();
        }
        let mut workers = 0u64;
        let (mut human, mut machine, mut clearing) = (0.0, 0.0, 0.0);
        for r in &self.records {
            let k = r.kpi();
            workers += k.total_workers;
            human += k.human_hours;
            machine += k.machinery_hours;
            clearing += k.clearing;
        }
        Kpi::new(workers, human, machine, clearing)
    }

    /// Table of the stored records' original rows, in source column order.
    pub fn to_table(&self) -> Table {
        Table::from_snapshots(&self.columns, self.records.iter().map(Record::snapshot))
    }

    pub fn statistics(&self, settings: &Settings) -> RepositoryStatistics {
        self.summarize(self.aggregate(settings))
    }

    /// Attaches the record-level figures to statistics computed elsewhere.
    pub fn summarize(&self, statistics: Statistics) -> RepositoryStatistics {
        RepositoryStatistics {
            statistics,
            total_intervenciones: self.records.len(),
            distribucion_estados: self.status_distribution(),
            kpis_agregados: self.aggregate_kpis(),
        }
    }
}

impl Aggregate for RecordRepository {
    fn aggregate(&self, settings: &Settings) -> Statistics {
        aggregate(&self.to_table(), settings)
    }
}
