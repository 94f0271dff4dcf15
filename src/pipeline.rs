//! Ingestion pipeline: raw table in, validated records plus an anomaly
//! report out. Either the whole dataset loads or nothing does.

use crate::aggregate::aggregate;
use crate::config::Settings;
use crate::consistency::{self, ConsistencyReport, TOTAL_RULES};
use crate::error::Result;
use crate::loader::load_table;
use crate::model::RecordAnomaly;
use crate::normalize::{NormalizationReport, Normalizer};
use crate::repository::{RecordRepository, RepositoryStatistics, SkippedRow};
use crate::schema::SchemaValidator;
use crate::table::Table;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeoAnomalies {
    pub total: usize,
    #[serde(rename = "puntos")]
    pub point_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    #[serde(rename = "filas")]
    pub rows: usize,
    #[serde(rename = "columnas")]
    pub columns: usize,
    #[serde(rename = "registros")]
    pub records: usize,
    #[serde(rename = "filas_omitidas")]
    pub skipped: Vec<SkippedRow>,
    #[serde(rename = "normalizacion")]
    pub normalization: NormalizationReport,
    #[serde(rename = "consistencia")]
    pub consistency: ConsistencyReport,
    #[serde(rename = "advertencias_consistencia")]
    pub consistency_warnings: usize,
    #[serde(rename = "anomalias_geograficas")]
    pub geographic: GeoAnomalies,
    #[serde(rename = "fechas_invertidas")]
    pub start_after_submission: usize,
}

/// A successfully loaded dataset.
#[derive(Debug, Clone)]
pub struct Ingestion {
    pub table: Table,
    pub repository: RecordRepository,
    pub report: IngestReport,
}

impl Ingestion {
    /// Statistics over every normalized row, including rows that could not
    /// become records, plus the record-level figures.
    pub fn statistics(&self, settings: &Settings) -> RepositoryStatistics {
        self.repository.summarize(aggregate(&self.table, settings))
    }
}

pub struct Pipeline<'a> {
    settings: &'a Settings,
}

impl<'a> Pipeline<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Pipeline { settings }
    }

    pub fn ingest_file(&self, path: impl AsRef<Path>) -> Result<Ingestion> {
        let raw = load_table(path)?;
        self.ingest(&raw)
    }

    /// Validate, normalize, check totals and build records. Structural
    /// problems abort before any record exists; everything else is reported.
    pub fn ingest(&self, raw: &Table) -> Result<Ingestion> {
        SchemaValidator::new(self.settings)
            .validate(raw)
            .into_result()?;

        let (table, normalization) = Normalizer::new(self.settings).normalize(raw);
        let consistency = consistency::check(&table, TOTAL_RULES);
        let repository = RecordRepository::from_table(&table);

        let bbox = &self.settings.bounding_box;
        let mut geographic = GeoAnomalies::default();
        let mut start_after_submission = 0;
        for record in repository.records() {
            for anomaly in record.anomalies(bbox) {
                match anomaly {
                    RecordAnomaly::OutOfRegion => {
                        geographic.total += 1;
                        geographic.point_ids.push(record.general.point_id.clone());
                    }
                    RecordAnomaly::StartAfterSubmission => start_after_submission += 1,
                    // already counted by the table-level consistency check
                    RecordAnomaly::WorkerTotalMismatch => {}
                }
            }
        }
        if geographic.total > 0 {
            warn!(
                count = geographic.total,
                "coordinates outside the expected region"
            );
        }

        let report = IngestReport {
            rows: raw.len(),
            columns: raw.columns().len(),
            records: repository.len(),
            skipped: repository.skipped().to_vec(),
            normalization,
            consistency_warnings: consistency.warnings(),
            consistency,
            geographic,
            start_after_submission,
        };
        info!(
            rows = report.rows,
            records = report.records,
            skipped = report.skipped.len(),
            consistency_warnings = report.consistency_warnings,
            "dataset ingested"
        );
        Ok(Ingestion {
            table,
            repository,
            report,
        })
    }
}

/// Holder of the currently loaded dataset. A failed load leaves the previous
/// dataset in place; a successful one replaces it.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<Ingestion>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, settings: &Settings, raw: &Table) -> Result<&Ingestion> {
        let ingestion = Pipeline::new(settings).ingest(raw)?;
        Ok(&*self.current.insert(ingestion))
    }

    pub fn load_file(&mut self, settings: &Settings, path: impl AsRef<Path>) -> Result<&Ingestion> {
        let ingestion = Pipeline::new(settings).ingest_file(path)?;
        Ok(&*self.current.insert(ingestion))
    }

    pub fn current(&self) -> Option<&Ingestion> {
        self.current.as_ref()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
