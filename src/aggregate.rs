//! Statistics engine: turns a normalized table into the nested statistics
//! document handed to reporting and dashboards.
//!
//! Every number here is a function of the multiset of rows, so permuting the
//! input leaves sums, means, extrema and counts unchanged. The only
//! order-sensitive output is the tie order of frequency tables, which is the
//! first-seen order of the input.

use crate::config::Settings;
use crate::rollup::{column_frequencies, CategoryRollup, FieldStats, OrderedMap};
use crate::table::Table;
use crate::taxonomy::{
    self, ActiveTaxonomy, CREWS, MACHINERY, MACHINERY_HOUR_FIELDS, OTHER_MACHINERY_NAME, POINT_ID,
    PRELIMINARY_FIELDS, START, STATUS, SUBMITTED, TOTAL_HOURS, TOTAL_WORKERS, WORKER_FIELDS, X, Y,
};
use crate::util::{days_diff, ratio};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    #[serde(rename = "metricas_generales")]
    pub general: GeneralMetrics,
    #[serde(rename = "recursos_humanos")]
    pub human_resources: HumanResourcesStats,
    #[serde(rename = "maquinaria")]
    pub machinery: MachineryStats,
    #[serde(rename = "actividades_construccion")]
    pub activities: ActivityStats,
    #[serde(rename = "analisis_geografico")]
    pub geographic: Option<GeoStats>,
    #[serde(rename = "analisis_temporal")]
    pub temporal: Option<TemporalStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralMetrics {
    pub total_registros: usize,
    pub total_puntos_unicos: usize,
    pub columnas_analizadas: usize,
    pub estados_obra: OrderedMap<usize>,
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
    pub duracion_proyecto: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HumanResourcesStats {
    #[serde(rename = "personal")]
    pub workers: CategoryRollup,
    #[serde(rename = "distribucion_personal")]
    pub distribution: OrderedMap<f64>,
    #[serde(rename = "total_trabajadores")]
    pub reported_total: Option<FieldStats>,
    #[serde(rename = "horas_trabajadas")]
    pub hours: Option<FieldStats>,
    #[serde(rename = "cuadrillas")]
    pub crews: Option<FieldStats>,
    #[serde(rename = "promedio_trabajadores_por_obra")]
    pub workers_per_record: f64,
    #[serde(rename = "promedio_horas_por_obra")]
    pub hours_per_record: f64,
    #[serde(rename = "horas_por_trabajador")]
    pub hours_per_worker: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineryStats {
    #[serde(rename = "horas")]
    pub hours: CategoryRollup,
    #[serde(rename = "distribucion_horas_maquinaria")]
    pub distribution: OrderedMap<f64>,
    #[serde(rename = "tipos_maquinaria_usada")]
    pub kinds: OrderedMap<usize>,
    #[serde(rename = "otras_maquinarias")]
    pub other_names: OrderedMap<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    #[serde(rename = "columnas_analizadas")]
    pub fields: Vec<String>,
    #[serde(rename = "totales_por_actividad")]
    pub per_field: OrderedMap<FieldStats>,
    #[serde(rename = "total_grupo")]
    pub total: f64,
    #[serde(rename = "obras_con_actividad")]
    pub records_with_activity: usize,
    #[serde(rename = "promedio_por_obra")]
    pub per_record: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coverage {
    pub columnas_totales: usize,
    pub columnas_presentes: usize,
    /// Present fields with at least one nonzero cell.
    pub columnas_con_datos: usize,
    /// In `[0, 1]`.
    pub proporcion: f64,
    pub porcentaje: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityStats {
    #[serde(rename = "preliminares")]
    pub preliminary: CategoryRollup,
    #[serde(rename = "resumen_por_grupo")]
    pub groups: OrderedMap<GroupStats>,
    pub total_todas_actividades: f64,
    pub promedio_actividades_por_obra: f64,
    #[serde(rename = "actividades_mas_comunes")]
    pub top: OrderedMap<f64>,
    #[serde(rename = "cobertura_actividades")]
    pub coverage: Coverage,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoStats {
    #[serde(rename = "centroide")]
    pub centroid: Point,
    #[serde(rename = "rango_coordenadas")]
    pub extent: Extent,
    #[serde(rename = "puntos_unicos")]
    pub unique_points: usize,
    #[serde(rename = "registros_con_coordenadas")]
    pub located: usize,
    #[serde(rename = "fuera_de_region")]
    pub out_of_region: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalStats {
    pub campo_fecha: String,
    pub fecha_inicio: String,
    pub fecha_fin: String,
    pub duracion_dias: i64,
    pub registros_por_dia: f64,
    pub registros_con_fecha: usize,
    pub registros_sin_fecha: usize,
    pub por_fecha: OrderedMap<usize>,
    pub por_dia_semana: OrderedMap<usize>,
    pub por_mes: OrderedMap<usize>,
}

/// Anything the engine can be run over.
pub trait Aggregate {
    fn aggregate(&self, settings: &Settings) -> Statistics;
}

impl Aggregate for Table {
    fn aggregate(&self, settings: &Settings) -> Statistics {
        aggregate(self, settings)
    }
}

pub fn aggregate(table: &Table, settings: &Settings) -> Statistics {
    let temporal = temporal_rollup(table);
    let stats = Statistics {
        general: general_metrics(table, temporal.as_ref()),
        human_resources: human_resources(table),
        machinery: machinery(table),
        activities: activities(table, settings.top_activities),
        geographic: geographic_rollup(table, settings),
        temporal,
    };
    debug!(
        records = table.len(),
        groups = stats.activities.groups.len(),
        "statistics computed"
    );
    stats
}

fn general_metrics(table: &Table, temporal: Option<&TemporalStats>) -> GeneralMetrics {
    let unique_points = table
        .column(POINT_ID)
        .map(|cells| {
            cells
                .map(|c| c.to_text().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<HashSet<_>>()
                .len()
        })
        .unwrap_or(0);
    GeneralMetrics {
        total_registros: table.len(),
        total_puntos_unicos: unique_points,
        columnas_analizadas: table.columns().len(),
        estados_obra: column_frequencies(table, STATUS).unwrap_or_default(),
        fecha_inicio: temporal.map(|t| t.fecha_inicio.clone()),
        fecha_fin: temporal.map(|t| t.fecha_fin.clone()),
        duracion_proyecto: temporal.map(|t| t.duracion_dias).unwrap_or(0),
    }
}

fn human_resources(table: &Table) -> HumanResourcesStats {
    let workers = CategoryRollup::over(table, WORKER_FIELDS);
    let reported_total = FieldStats::of_column(table, TOTAL_WORKERS);
    let hours = FieldStats::of_column(table, TOTAL_HOURS);
    let n = table.len() as f64;

    // Prefer the reported head count; fall back to the category sum.
    let worker_sum = reported_total.map(|s| s.sum).unwrap_or(workers.subtotal);
    let hour_sum = hours.map(|s| s.sum).unwrap_or(0.0);

    HumanResourcesStats {
        distribution: workers.labelled_sums(|f| taxonomy::label(f).to_string()),
        workers,
        reported_total,
        hours,
        crews: FieldStats::of_column(table, CREWS),
        workers_per_record: ratio(worker_sum, n),
        hours_per_record: ratio(hour_sum, n),
        hours_per_worker: hour_sum / worker_sum.max(1.0),
    }
}

fn machinery(table: &Table) -> MachineryStats {
    let hours = CategoryRollup::over(table, MACHINERY_HOUR_FIELDS);
    MachineryStats {
        distribution: hours.labelled_sums(|f| taxonomy::label(f).to_string()),
        hours,
        kinds: column_frequencies(table, MACHINERY).unwrap_or_default(),
        other_names: column_frequencies(table, OTHER_MACHINERY_NAME).unwrap_or_default(),
    }
}

fn activities(table: &Table, top_n: usize) -> ActivityStats {
    let active = ActiveTaxonomy::resolve(table);
    let n = table.len() as f64;

    let mut groups = OrderedMap::new();
    let mut grand_total = 0.0;
    for group in &active.groups {
        let columns: Vec<Vec<f64>> = group
            .fields
            .iter()
            .filter_map(|f| table.numbers(f))
            .collect();
        let per_field: OrderedMap<FieldStats> = group
            .fields
            .iter()
            .zip(&columns)
            .map(|(f, values)| (f.to_string(), FieldStats::from_values(values)))
            .collect();
        let total: f64 = per_field.iter().map(|(_, s)| s.sum).sum();
        let records_with_activity = (0..table.len())
            .filter(|&i| columns.iter().any(|col| col[i] != 0.0))
            .count();
        grand_total += total;
        groups.push(
            group.name,
            GroupStats {
                fields: group.fields.iter().map(|f| f.to_string()).collect(),
                per_field,
                total,
                records_with_activity,
                per_record: ratio(total, n),
            },
        );
    }

    // One entry per present field; a field shared by two groups counts once.
    let field_stats: Vec<(&str, FieldStats)> = active
        .fields()
        .into_iter()
        .map(|f| (f, FieldStats::of_column(table, f).unwrap_or_default()))
        .collect();
    let field_totals: Vec<(&str, f64)> = field_stats.iter().map(|(f, s)| (*f, s.sum)).collect();

    let mut ranked: Vec<(&str, f64)> = field_totals
        .iter()
        .copied()
        .filter(|(_, total)| *total != 0.0)
        .collect();
    // stable: equal totals keep taxonomy order
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let top = ranked
        .into_iter()
        .take(top_n)
        .map(|(f, t)| (f.to_string(), t))
        .collect();

    let with_data = field_stats.iter().filter(|(_, s)| s.nonzero > 0).count();
    let proportion = ratio(with_data as f64, active.declared_fields as f64);

    ActivityStats {
        preliminary: CategoryRollup::over(table, PRELIMINARY_FIELDS),
        groups,
        total_todas_actividades: grand_total,
        promedio_actividades_por_obra: ratio(grand_total, n),
        top,
        coverage: Coverage {
            columnas_totales: active.declared_fields,
            columnas_presentes: field_stats.len(),
            columnas_con_datos: with_data,
            proporcion: proportion,
            porcentaje: proportion * 100.0,
        },
    }
}

fn geographic_rollup(table: &Table, settings: &Settings) -> Option<GeoStats> {
    let xs = table.column(X)?;
    let ys = table.column(Y)?;
    let points: Vec<(f64, f64)> = xs
        .zip(ys)
        .filter_map(|(x, y)| Some((x.as_f64()?, y.as_f64()?)))
        .collect();
    if points.is_empty() {
        return None;
    }

    let n = points.len() as f64;
    let mut extent = Extent {
        min_x: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        min_y: f64::INFINITY,
        max_y: f64::NEG_INFINITY,
    };
    let (mut sx, mut sy) = (0.0, 0.0);
    for &(x, y) in &points {
        sx += x;
        sy += y;
        extent.min_x = extent.min_x.min(x);
        extent.max_x = extent.max_x.max(x);
        extent.min_y = extent.min_y.min(y);
        extent.max_y = extent.max_y.max(y);
    }

    let scale = 10f64.powi(settings.coordinate_precision as i32);
    let unique_points = points
        .iter()
        .map(|&(x, y)| ((x * scale).round() as i64, (y * scale).round() as i64))
        .collect::<HashSet<_>>()
        .len();
    let out_of_region = points
        .iter()
        .filter(|&&(x, y)| !settings.bounding_box.contains(x, y))
        .count();

    Some(GeoStats {
        centroid: Point {
            x: sx / n,
            y: sy / n,
        },
        extent,
        unique_points,
        located: points.len(),
        out_of_region,
    })
}

const WEEKDAYS: [(Weekday, &str); 7] = [
    (Weekday::Mon, "Lunes"),
    (Weekday::Tue, "Martes"),
    (Weekday::Wed, "Miércoles"),
    (Weekday::Thu, "Jueves"),
    (Weekday::Fri, "Viernes"),
    (Weekday::Sat, "Sábado"),
    (Weekday::Sun, "Domingo"),
];

fn temporal_rollup(table: &Table) -> Option<TemporalStats> {
    // submission date first, survey start as a fallback
    let field = [SUBMITTED, START]
        .into_iter()
        .find(|f| table.column(f).is_some_and(|mut c| c.any(|cell| cell.as_date().is_some())))?;

    let dates: Vec<NaiveDate> = table
        .column(field)?
        .filter_map(|c| c.as_date().map(|d| d.date()))
        .collect();
    let first = *dates.iter().min()?;
    let last = *dates.iter().max()?;
    let span = days_diff(first, last);

    let mut by_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    let mut by_month: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    let mut by_weekday = [0usize; 7];
    for d in &dates {
        *by_day.entry(*d).or_default() += 1;
        *by_month.entry((d.year(), d.month())).or_default() += 1;
        by_weekday[d.weekday().num_days_from_monday() as usize] += 1;
    }

    Some(TemporalStats {
        campo_fecha: field.to_string(),
        fecha_inicio: first.to_string(),
        fecha_fin: last.to_string(),
        duracion_dias: span,
        registros_por_dia: table.len() as f64 / span.max(1) as f64,
        registros_con_fecha: dates.len(),
        registros_sin_fecha: table.len() - dates.len(),
        por_fecha: by_day
            .into_iter()
            .map(|(d, c)| (d.to_string(), c))
            .collect(),
        por_dia_semana: WEEKDAYS
            .iter()
            .zip(by_weekday)
            .filter(|(_, c)| *c > 0)
            .map(|((_, name), c)| (name.to_string(), c))
            .collect(),
        por_mes: by_month
            .into_iter()
            .map(|((y, m), c)| (format!("{y:04}-{m:02}"), c))
            .collect(),
    })
}
