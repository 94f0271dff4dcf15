//! Flat summary tables derived from a [`Statistics`] document, for CSV export
//! and console previews.

use crate::aggregate::Statistics;
use crate::config::BoundingBox;
use crate::model::Record;
use crate::taxonomy::label;
use crate::types::{
    ActivityGroupRow, ActivityRankRow, InterventionRow, MachineryRow, StatusRow, SummaryStats,
    WorkforceRow,
};
use crate::util::{average, format_number, ratio};

pub fn status_report(stats: &Statistics) -> Vec<StatusRow> {
    let total = stats.general.total_registros as f64;
    stats
        .general
        .estados_obra
        .iter()
        .map(|(status, count)| StatusRow {
            status: status.to_string(),
            records: *count,
            share: format_number(ratio(*count as f64, total) * 100.0, 2),
        })
        .collect()
}

pub fn workforce_report(stats: &Statistics) -> Vec<WorkforceRow> {
    stats
        .human_resources
        .workers
        .fields
        .iter()
        .map(|(field, s)| WorkforceRow {
            category: label(field).to_string(),
            total: format_number(s.sum, 0),
            mean: format_number(s.mean, 2),
            max: format_number(s.max, 0),
            records_with_value: s.nonzero,
        })
        .collect()
}

pub fn machinery_report(stats: &Statistics) -> Vec<MachineryRow> {
    let hours = &stats.machinery.hours;
    hours
        .fields
        .iter()
        .map(|(field, s)| MachineryRow {
            kind: label(field).to_string(),
            hours: format_number(s.sum, 2),
            share: format_number(ratio(s.sum, hours.subtotal) * 100.0, 2),
            records_with_value: s.nonzero,
        })
        .collect()
}

/// Groups ordered by total, largest first.
pub fn activity_group_report(stats: &Statistics) -> Vec<ActivityGroupRow> {
    let mut groups: Vec<_> = stats.activities.groups.iter().collect();
    groups.sort_by(|a, b| b.1.total.total_cmp(&a.1.total));
    groups
        .into_iter()
        .map(|(name, g)| ActivityGroupRow {
            group: name.to_string(),
            fields: g.fields.len(),
            total: format_number(g.total, 2),
            records_with_activity: g.records_with_activity,
            per_record: format_number(g.per_record, 2),
        })
        .collect()
}

pub fn top_activity_report(stats: &Statistics) -> Vec<ActivityRankRow> {
    stats
        .activities
        .top
        .iter()
        .enumerate()
        .map(|(idx, (field, total))| ActivityRankRow {
            rank: idx + 1,
            activity: label(field).to_string(),
            field: field.to_string(),
            total: format_number(*total, 2),
        })
        .collect()
}

/// Per-record overview. The main category and machinery are the ones with
/// the largest count or hours; a declared primary machinery wins when no
/// hours were reported.
pub fn intervention_report(records: &[Record], bbox: &BoundingBox) -> Vec<InterventionRow> {
    records
        .iter()
        .map(|r| {
            let hr = &r.human_resources;
            let main_category = hr
                .distribution()
                .into_iter()
                .filter(|(_, n)| *n > 0)
                .fold(None, |best: Option<(&str, u32)>, (name, n)| match best {
                    Some((_, m)) if m >= n => best,
                    _ => Some((name, n)),
                })
                .map(|(name, _)| name.to_string())
                .unwrap_or_default();
            let main_machinery = r
                .machinery
                .hours_distribution()
                .into_iter()
                .filter(|(_, h)| *h > 0.0)
                .fold(None, |best: Option<(_, f64)>, (kind, h)| match best {
                    Some((_, m)) if m >= h => best,
                    _ => Some((kind, h)),
                })
                .map(|(kind, _)| kind)
                .or(r.machinery.primary)
                .map(|kind| kind.name().to_string())
                .unwrap_or_default();
            InterventionRow {
                point_id: r.general.point_id.clone(),
                status: r.general.status.label().to_string(),
                workers: hr.reported_total,
                main_category,
                human_hours: format_number(hr.total_hours, 2),
                main_machinery,
                machinery_hours: format_number(r.machinery.total_hours(), 2),
                anomalies: r.anomalies(bbox).len(),
            }
        })
        .collect()
}

pub fn generate_summary(stats: &Statistics) -> SummaryStats {
    let hr = &stats.human_resources;
    let per_group: Vec<f64> = stats
        .activities
        .groups
        .iter()
        .map(|(_, g)| g.per_record)
        .collect();
    SummaryStats {
        total_registros: stats.general.total_registros,
        total_trabajadores: hr.reported_total.map(|s| s.sum).unwrap_or(hr.workers.subtotal),
        total_horas_hombre: hr.hours.map(|s| s.sum).unwrap_or(0.0),
        total_horas_maquinaria: stats.machinery.hours.subtotal,
        promedio_grupo_por_obra: average(&per_group),
        cobertura_actividades: stats.activities.coverage.porcentaje,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::config::Settings;
    use crate::table::Table;

    fn stats() -> Statistics {
        let t = Table::from_strings(
            &[
                "estado_obr",
                "cant_ayuda",
                "cant_ofici",
                "horas_retr",
                "horas_volq",
                "excav_manu",
                "e_concreto",
                "num_total_",
                "total_hora",
            ],
            &[
                vec!["Finalizada", "2", "1", "3", "1", "4", "0", "3", "24"],
                vec!["Finalizada", "1", "0", "0", "0", "0", "6", "1", "8"],
                vec!["En ejecucion", "0", "2", "0", "0", "2", "0", "2", "16"],
                vec!["Sin iniciar", "0", "0", "0", "0", "0", "0", "0", "0"],
            ],
        );
        aggregate(&t, &Settings::default())
    }

    #[test]
    fn status_shares_are_percentages_of_all_rows() {
        let rows = status_report(&stats());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].status, "Finalizada");
        assert_eq!(rows[0].records, 2);
        assert_eq!(rows[0].share, "50.00");
        assert_eq!(rows[2].share, "25.00");
    }

    #[test]
    fn machinery_shares_sum_of_reported_hours() {
        let rows = machinery_report(&stats());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].share, "75.00");
        assert_eq!(rows[1].share, "25.00");
        assert_eq!(rows[0].records_with_value, 1);
    }

    #[test]
    fn groups_are_ranked_by_total() {
        let rows = activity_group_report(&stats());
        let totals: Vec<_> = rows.iter().map(|r| r.total.clone()).collect();
        let mut sorted = totals.clone();
        sorted.sort_by(|a, b| {
            let pa: f64 = a.replace(',', "").parse().unwrap();
            let pb: f64 = b.replace(',', "").parse().unwrap();
            pb.total_cmp(&pa)
        });
        assert_eq!(totals, sorted);
        assert!(!rows.is_empty());
    }

    #[test]
    fn top_activities_are_numbered_from_one() {
        let rows = top_activity_report(&stats());
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].field, "excav_manu");
        assert_eq!(rows[0].total, "6.00");
        assert_eq!(rows[1].field, "e_concreto");
    }

    #[test]
    fn intervention_rows_pick_the_largest_category_and_machine() {
        let t = Table::from_strings(
            &[
                "id_punto", "X", "Y", "estado_obr", "cant_ayuda", "cant_ofici", "num_total_",
                "maquinaria", "horas_retr", "horas_volq",
            ],
            &[
                vec!["P1", "-75.58", "6.24", "finalizado", "1", "3", "4", "", "2", "5"],
                vec!["P2", "0", "0", "", "0", "0", "0", "Compactadora", "0", "0"],
            ],
        );
        let repo = crate::repository::RecordRepository::from_table(&t);
        let rows = intervention_report(repo.records(), &BoundingBox::default());
        assert_eq!(rows[0].status, "Finalizada");
        assert_eq!(rows[0].main_category, "Oficiales");
        assert_eq!(rows[0].main_machinery, "Volqueta");
        assert_eq!(rows[0].machinery_hours, "7.00");
        assert_eq!(rows[0].anomalies, 0);
        assert_eq!(rows[1].main_category, "");
        assert_eq!(rows[1].main_machinery, "Compactadora");
        assert_eq!(rows[1].anomalies, 1);
    }

    #[test]
    fn summary_prefers_reported_worker_total() {
        let s = generate_summary(&stats());
        assert_eq!(s.total_registros, 4);
        assert_eq!(s.total_trabajadores, 6.0);
        assert_eq!(s.total_horas_hombre, 48.0);
        assert_eq!(s.total_horas_maquinaria, 4.0);
        assert_eq!(workforce_report(&stats()).len(), 2);
    }
}
