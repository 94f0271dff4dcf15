//! One survey submission as a structured, immutable record.
//!
//! A [`Record`] keeps a typed core (general info, crew, machinery,
//! preliminary work) plus the full normalized row, since the activity
//! taxonomy reads far more columns than are modelled here.

use crate::config::BoundingBox;
use crate::consistency::totals_agree;
use crate::table::{Cell, Row};
use crate::taxonomy::{
    CREWS, INSPECTOR, MACHINERY, OTHER_MACHINERY_NAME, POINT_ID, SHAPE, START, STATUS,
    SUBMITTED, TOTAL_HOURS, TOTAL_WORKERS, WORKERS_PER_CREW, WORKER_FIELDS, X, Y,
};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub enum WorkStatus {
    #[default]
    #[serde(rename = "Sin iniciar")]
    NotStarted,
    #[serde(rename = "En ejecución")]
    InProgress,
    #[serde(rename = "Finalizada")]
    Finished,
}

static STATUS_ALIASES: Lazy<HashMap<&'static str, WorkStatus>> = Lazy::new(|| {
    HashMap::from([
        ("sin iniciar", WorkStatus::NotStarted),
        ("sin_iniciar", WorkStatus::NotStarted),
        ("no iniciada", WorkStatus::NotStarted),
        ("en ejecución", WorkStatus::InProgress),
        ("en ejecucion", WorkStatus::InProgress),
        ("en_ejecucion", WorkStatus::InProgress),
        ("en proceso", WorkStatus::InProgress),
        ("finalizada", WorkStatus::Finished),
        ("finalizado", WorkStatus::Finished),
        ("terminada", WorkStatus::Finished),
    ])
});

impl WorkStatus {
    pub const ALL: [WorkStatus; 3] = [
        WorkStatus::NotStarted,
        WorkStatus::InProgress,
        WorkStatus::Finished,
    ];

    /// Lenient parse: unknown or blank spellings fall back to `NotStarted`.
    pub fn parse(raw: &str) -> Self {
        let key = raw.trim().to_lowercase();
        STATUS_ALIASES.get(key.as_str()).copied().unwrap_or_default()
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkStatus::NotStarted => "Sin iniciar",
            WorkStatus::InProgress => "En ejecución",
            WorkStatus::Finished => "Finalizada",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MachineryKind {
    Retroexcavadora,
    Minicargador,
    Volqueta,
    Compactadora,
    Otra,
}

impl MachineryKind {
    pub const ALL: [MachineryKind; 5] = [
        MachineryKind::Retroexcavadora,
        MachineryKind::Minicargador,
        MachineryKind::Volqueta,
        MachineryKind::Compactadora,
        MachineryKind::Otra,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MachineryKind::Retroexcavadora => "Retroexcavadora",
            MachineryKind::Minicargador => "Minicargador",
            MachineryKind::Volqueta => "Volqueta",
            MachineryKind::Compactadora => "Compactadora",
            MachineryKind::Otra => "Otra",
        }
    }

    /// Case-insensitive match against the equipment vocabulary. The raw value
    /// may be the full name, contain it ("volqueta doble troque"), or be a
    /// prefix of at least four letters ("retro").
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_lowercase();
        if raw.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|kind| {
            let name = kind.name().to_lowercase();
            raw == name || raw.contains(&name) || (raw.len() >= 4 && name.starts_with(&raw))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralInfo {
    pub point_id: String,
    pub status: WorkStatus,
    pub submitted_at: Option<NaiveDateTime>,
    pub inspector: String,
    pub longitude: f64,
    pub latitude: f64,
    pub started_at: Option<NaiveDateTime>,
    pub shape: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HumanResources {
    pub crews: u32,
    pub workers_per_crew: u32,
    pub helpers: u32,
    pub foremen: u32,
    pub operators: u32,
    pub traffic_auxiliaries: u32,
    pub others: u32,
    pub reported_total: u32,
    pub total_hours: f64,
    /// Category cells as read, before rounding to head counts.
    pub category_sum: f64,
    /// `num_total_` as read.
    pub reported_value: f64,
}

impl HumanResources {
    pub fn computed_total(&self) -> u64 {
        [
            self.helpers,
            self.foremen,
            self.operators,
            self.traffic_auxiliaries,
            self.others,
        ]
        .into_iter()
        .map(u64::from)
        .sum()
    }

    /// Same comparison as the table-level consistency check, on unrounded
    /// values.
    pub fn is_consistent(&self) -> bool {
        totals_agree(self.reported_value, self.category_sum)
    }

    pub fn distribution(&self) -> [(&'static str, u32); 5] {
        [
            ("Ayudantes", self.helpers),
            ("Oficiales", self.foremen),
            ("Operadores", self.operators),
            ("Auxiliares de tránsito", self.traffic_auxiliaries),
            ("Otros", self.others),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Machinery {
    pub primary: Option<MachineryKind>,
    pub backhoe_hours: f64,
    pub mini_loader_hours: f64,
    pub dump_truck_hours: f64,
    pub compactor_hours: f64,
    pub other_name: Option<String>,
    pub other_hours: f64,
}

impl Machinery {
    pub fn total_hours(&self) -> f64 {
        self.backhoe_hours
            + self.mini_loader_hours
            + self.dump_truck_hours
            + self.compactor_hours
            + self.other_hours
    }

    pub fn hours_distribution(&self) -> [(MachineryKind, f64); 5] {
        [
            (MachineryKind::Retroexcavadora, self.backhoe_hours),
            (MachineryKind::Minicargador, self.mini_loader_hours),
            (MachineryKind::Volqueta, self.dump_truck_hours),
            (MachineryKind::Compactadora, self.compactor_hours),
            (MachineryKind::Otra, self.other_hours),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreliminaryActivities {
    pub staking: f64,
    pub clearing: f64,
    pub clearing_manual: f64,
    pub clearing_mechanical: f64,
    pub tree_felling: f64,
    pub brush_clearing: f64,
    pub fencing: f64,
    pub green_mesh: f64,
    pub orange_mesh: f64,
    pub corrugated_sheet: f64,
    pub plastic_cover: f64,
    pub pedestrian_walkway: f64,
}

impl PreliminaryActivities {
    pub fn clearing_subtotal(&self) -> f64 {
        self.clearing_manual + self.clearing_mechanical
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecordError {
    #[error("coordinate {field} is missing")]
    MissingCoordinate { field: &'static str },

    #[error("coordinate {field} is not a number: {value:?}")]
    InvalidCoordinate { field: &'static str, value: String },
}

/// Soft findings on a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordAnomaly {
    OutOfRegion,
    WorkerTotalMismatch,
    StartAfterSubmission,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpi {
    #[serde(rename = "total_trabajadores")]
    pub total_workers: u64,
    #[serde(rename = "total_horas_humanas")]
    pub human_hours: f64,
    #[serde(rename = "total_horas_maquinaria")]
    pub machinery_hours: f64,
    #[serde(rename = "total_descapote")]
    pub clearing: f64,
    #[serde(rename = "horas_por_trabajador")]
    pub hours_per_worker: f64,
}

impl Kpi {
    pub fn new(workers: u64, human_hours: f64, machinery_hours: f64, clearing: f64) -> Self {
        Kpi {
            total_workers: workers,
            human_hours,
            machinery_hours,
            clearing,
            hours_per_worker: human_hours / workers.max(1) as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub general: GeneralInfo,
    pub human_resources: HumanResources,
    pub machinery: Machinery,
    pub preliminary: PreliminaryActivities,
    #[serde(skip)]
    raw: HashMap<String, Cell>,
}

fn count(row: &Row<'_>, field: &str) -> u32 {
    let v = row.number(field);
    if v <= 0.0 {
        0
    } else {
        v.round().min(u32::MAX as f64) as u32
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

fn coordinate(row: &Row<'_>, field: &'static str) -> Result<f64, RecordError> {
    let cell = row.get(field);
    if cell.is_blank() {
        return Err(RecordError::MissingCoordinate { field });
    }
    cell.as_f64().ok_or_else(|| RecordError::InvalidCoordinate {
        field,
        value: cell.to_text(),
    })
}

fn datetime(cell: &Cell) -> Option<NaiveDateTime> {
    cell.as_date()
        .or_else(|| crate::util::parse_datetime_safe(cell.as_str()))
}

impl Record {
    /// Build a record from one (normalized) row. Optional fields default to
    /// zero/empty/`None`; only a coordinate that is not a number fails.
    pub fn from_row(row: &Row<'_>) -> Result<Self, RecordError> {
        let longitude = coordinate(row, X)?;
        let latitude = coordinate(row, Y)?;

        let general = GeneralInfo {
            point_id: row.text(POINT_ID),
            status: WorkStatus::parse(&row.text(STATUS)),
            submitted_at: datetime(row.get(SUBMITTED)),
            inspector: row.text(INSPECTOR),
            longitude,
            latitude,
            started_at: datetime(row.get(START)),
            shape: non_empty(row.text(SHAPE)),
        };

        let human_resources = HumanResources {
            crews: count(row, CREWS),
            workers_per_crew: count(row, WORKERS_PER_CREW),
            helpers: count(row, "cant_ayuda"),
            foremen: count(row, "cant_ofici"),
            operators: count(row, "cant_opera"),
            traffic_auxiliaries: count(row, "cant_auxil"),
            others: count(row, "cant_otros"),
            reported_total: count(row, TOTAL_WORKERS),
            total_hours: row.number(TOTAL_HOURS),
            category_sum: WORKER_FIELDS.iter().map(|f| row.number(f)).sum(),
            reported_value: row.number(TOTAL_WORKERS),
        };

        let machinery = Machinery {
            primary: MachineryKind::parse(&row.text(MACHINERY)),
            backhoe_hours: row.number("horas_retr"),
            mini_loader_hours: row.number("horas_mini"),
            dump_truck_hours: row.number("horas_volq"),
            compactor_hours: row.number("horas_comp"),
            other_name: non_empty(row.text(OTHER_MACHINERY_NAME)),
            other_hours: row.number("horas_otra"),
        };

        let preliminary = PreliminaryActivities {
            staking: row.number("localizaci"),
            clearing: row.number("descapote"),
            clearing_manual: row.number("a_mano"),
            clearing_mechanical: row.number("a_maquina"),
            tree_felling: row.number("Tala_poda"),
            brush_clearing: row.number("roceria_li"),
            fencing: row.number("cerramient"),
            green_mesh: row.number("tela_verde"),
            orange_mesh: row.number("malla_nara"),
            corrugated_sheet: row.number("teja_ondul"),
            plastic_cover: row.number("cubierta_p"),
            pedestrian_walkway: row.number("pasarela_p"),
        };

        Ok(Record {
            general,
            human_resources,
            machinery,
            preliminary,
            raw: row.to_map(),
        })
    }

    /// Normalized cell for any column of the row, including columns the
    /// typed groups do not model.
    pub fn raw(&self, field: &str) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.raw.get(field).unwrap_or(&EMPTY)
    }

    pub fn snapshot(&self) -> &HashMap<String, Cell> {
        &self.raw
    }

    pub fn in_region(&self, bbox: &BoundingBox) -> bool {
        bbox.contains(self.general.longitude, self.general.latitude)
    }

    pub fn anomalies(&self, bbox: &BoundingBox) -> Vec<RecordAnomaly> {
        let mut found = Vec::new();
        if !self.in_region(bbox) {
            found.push(RecordAnomaly::OutOfRegion);
        }
        if !self.human_resources.is_consistent() {
            found.push(RecordAnomaly::WorkerTotalMismatch);
        }
        if let (Some(start), Some(submitted)) = (self.general.started_at, self.general.submitted_at)
        {
            if start > submitted {
                found.push(RecordAnomaly::StartAfterSubmission);
            }
        }
        found
    }

    pub fn kpi(&self) -> Kpi {
        Kpi::new(
            u64::from(self.human_resources.reported_total),
            self.human_resources.total_hours,
            self.machinery.total_hours(),
            self.preliminary.clearing_subtotal(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    fn record_from(columns: &[&str], values: Vec<&str>) -> Result<Record, RecordError> {
        let t = Table::from_strings(columns, &[values]);
        let row = t.row(0).unwrap();
        Record::from_row(&row)
    }

    #[test]
    fn status_aliases_collapse_to_one_variant() {
        assert_eq!(WorkStatus::parse("En ejecución"), WorkStatus::InProgress);
        assert_eq!(WorkStatus::parse(" en EJECUCION "), WorkStatus::InProgress);
        assert_eq!(WorkStatus::parse("Finalizado"), WorkStatus::Finished);
        assert_eq!(WorkStatus::parse("???"), WorkStatus::NotStarted);
        assert_eq!(WorkStatus::parse(""), WorkStatus::NotStarted);
        assert_eq!(WorkStatus::Finished.label(), "Finalizada");
    }

    #[test]
    fn machinery_vocabulary_matching() {
        assert_eq!(MachineryKind::parse("VOLQUETA"), Some(MachineryKind::Volqueta));
        assert_eq!(MachineryKind::parse("retro"), Some(MachineryKind::Retroexcavadora));
        assert_eq!(
            MachineryKind::parse("Minicargador Bobcat"),
            Some(MachineryKind::Minicargador)
        );
        assert_eq!(MachineryKind::parse("grúa"), None);
        assert_eq!(MachineryKind::parse("  "), None);
    }

    #[test]
    fn builds_record_with_defaults_for_missing_optionals() {
        let rec = record_from(
            &["id_punto", "X", "Y", "estado_obr", "cant_ayuda", "cant_ofici", "num_total_"],
            vec!["P-7", "-75.58", "6.24", "Finalizada", "2", "3", "5"],
        )
        .unwrap();
        assert_eq!(rec.general.point_id, "P-7");
        assert_eq!(rec.general.status, WorkStatus::Finished);
        assert_eq!(rec.general.submitted_at, None);
        assert_eq!(rec.general.shape, None);
        assert_eq!(rec.human_resources.computed_total(), 5);
        assert!(rec.human_resources.is_consistent());
        assert_eq!(rec.machinery.primary, None);
        assert_eq!(rec.machinery.total_hours(), 0.0);
        assert_eq!(rec.raw("cant_ayuda"), &Cell::Text("2".into()));
        assert_eq!(rec.raw("no_such"), &Cell::Empty);
        assert!(rec.anomalies(&BoundingBox::default()).is_empty());
    }

    #[test]
    fn coordinate_must_be_numeric() {
        let cols = ["id_punto", "X", "Y"];
        assert_eq!(
            record_from(&cols, vec!["P-1", "", "6.2"]),
            Err(RecordError::MissingCoordinate { field: "X" })
        );
        assert!(matches!(
            record_from(&cols, vec!["P-1", "-75.5", "lejos"]),
            Err(RecordError::InvalidCoordinate { field: "Y", .. })
        ));
    }

    #[test]
    fn anomalies_cover_region_totals_and_dates() {
        let rec = record_from(
            &["id_punto", "X", "Y", "cant_ayuda", "num_total_", "start", "fecha_dilig"],
            vec!["P-2", "0", "0", "2", "3", "2024-05-02", "2024-05-01"],
        )
        .unwrap();
        assert_eq!(
            rec.anomalies(&BoundingBox::default()),
            vec![
                RecordAnomaly::OutOfRegion,
                RecordAnomaly::WorkerTotalMismatch,
                RecordAnomaly::StartAfterSubmission
            ]
        );
    }

    #[test]
    fn kpi_guards_zero_workers() {
        let rec = record_from(
            &["X", "Y", "total_hora", "a_mano", "a_maquina", "horas_volq"],
            vec!["-75.5", "6.2", "16", "10", "5", "3"],
        )
        .unwrap();
        let kpi = rec.kpi();
        assert_eq!(kpi.total_workers, 0);
        assert_eq!(kpi.hours_per_worker, 16.0);
        assert_eq!(kpi.clearing, 15.0);
        assert_eq!(kpi.machinery_hours, 3.0);
    }

    #[test]
    fn huge_worker_counts_do_not_overflow() {
        let rec = record_from(
            &["X", "Y", "cant_ayuda", "cant_ofici", "num_total_"],
            vec!["-75.58", "6.24", "3000000000", "3000000000", "6000000000"],
        )
        .unwrap();
        assert_eq!(rec.human_resources.computed_total(), 6_000_000_000);
        assert!(rec.human_resources.is_consistent());
        assert!(rec.anomalies(&BoundingBox::default()).is_empty());
    }

    #[test]
    fn record_and_table_checks_agree_on_unrounded_counts() {
        let cols = ["id_punto", "X", "Y", "cant_ayuda", "cant_ofici", "num_total_"];
        let rows = vec![
            vec!["P1", "-75.58", "6.24", "2.5", "2.5", "5"],
            vec!["P2", "-75.58", "6.24", "-1", "3", "2"],
            vec!["P3", "-75.58", "6.24", "2.4", "2.4", "5"],
            vec!["P4", "-75.58", "6.24", "-1", "3", "3"],
        ];
        let t = Table::from_strings(&cols, &rows);
        let report = crate::consistency::check(&t, crate::consistency::TOTAL_RULES);
        let flagged: Vec<usize> = report.checks[0].mismatches.iter().map(|m| m.row).collect();
        assert_eq!(flagged, vec![3, 4]);

        for row in t.rows() {
            let rec = Record::from_row(&row).unwrap();
            let mismatch = rec
                .anomalies(&BoundingBox::default())
                .contains(&RecordAnomaly::WorkerTotalMismatch);
            assert_eq!(mismatch, flagged.contains(&(row.index() + 1)));
        }
    }
}
