use std::path::{Path, PathBuf};
use survey_report::model::WorkStatus;
use survey_report::{Pipeline, SchemaProblem, Session, Settings};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/encuesta.csv")
}

#[test]
fn fixture_ingests_with_expected_diagnostics() {
    let settings = Settings::default();
    let ing = Pipeline::new(&settings).ingest_file(fixture()).unwrap();
    let report = &ing.report;

    assert_eq!(report.rows, 6);
    assert_eq!(report.records, 5);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].point_id, "P003");
    assert_eq!(report.skipped[0].row, 3);

    assert_eq!(report.normalization.defaulted_numbers.get("cant_ayuda"), Some(&1));
    assert_eq!(report.normalization.total_defaulted(), 1);

    assert_eq!(report.consistency_warnings, 1);
    let check = &report.consistency.checks[0];
    assert_eq!(check.rows_checked, 6);
    assert_eq!(check.mismatches[0].point_id, "P002");
    assert_eq!(check.mismatches[0].reported, 6.0);
    assert_eq!(check.mismatches[0].computed, 5.0);

    assert_eq!(report.geographic.point_ids, vec!["P004".to_string()]);
    assert_eq!(report.start_after_submission, 1);
}

#[test]
fn fixture_statistics() {
    let settings = Settings::default();
    let ing = Pipeline::new(&settings).ingest_file(fixture()).unwrap();
    let stats = ing.statistics(&settings);
    let s = &stats.statistics;

    assert_eq!(s.general.total_registros, 6);
    assert_eq!(s.general.total_puntos_unicos, 5);
    let statuses: Vec<_> = s.general.estados_obra.iter().map(|(k, v)| (k.to_string(), *v)).collect();
    assert_eq!(
        statuses,
        vec![
            ("Finalizada".to_string(), 3),
            ("En ejecución".to_string(), 1),
            ("Sin iniciar".to_string(), 1),
            ("en ejecucion".to_string(), 1),
        ]
    );

    assert_eq!(s.human_resources.reported_total.unwrap().sum, 21.0);
    assert_eq!(s.human_resources.hours.unwrap().sum, 168.0);

    assert_eq!(s.machinery.hours.subtotal, 20.0);
    assert_eq!(s.machinery.kinds.get("Retroexcavadora"), Some(&2));
    assert_eq!(s.machinery.other_names.get("Vibrocompactador"), Some(&1));

    let top: Vec<_> = s.activities.top.keys().collect();
    assert_eq!(top, vec!["descapote", "excav_manu", "a_mano", "e_concreto"]);
    assert_eq!(s.activities.coverage.columnas_con_datos, 4);
    assert!(s.activities.coverage.proporcion > 0.0 && s.activities.coverage.proporcion <= 1.0);

    let geo = s.geographic.as_ref().unwrap();
    assert_eq!(geo.located, 5);
    assert_eq!(geo.unique_points, 4);
    assert_eq!(geo.out_of_region, 1);

    let temporal = s.temporal.as_ref().unwrap();
    assert_eq!(temporal.campo_fecha, "fecha_dilig");
    assert_eq!(temporal.fecha_inicio, "2024-03-04");
    assert_eq!(temporal.fecha_fin, "2024-03-11");
    assert_eq!(temporal.duracion_dias, 7);
    assert_eq!(temporal.por_dia_semana.get("Lunes"), Some(&2));
    assert_eq!(temporal.por_dia_semana.get("Miércoles"), Some(&2));
    assert_eq!(s.general.duracion_proyecto, 7);

    assert_eq!(stats.total_intervenciones, 5);
    assert_eq!(stats.distribucion_estados.get(WorkStatus::Finished.label()), Some(&2));
    assert_eq!(stats.distribucion_estados.get(WorkStatus::InProgress.label()), Some(&2));
}

#[test]
fn statistics_document_has_every_section() {
    let settings = Settings::default();
    let ing = Pipeline::new(&settings).ingest_file(fixture()).unwrap();
    let json = serde_json::to_value(ing.statistics(&settings)).unwrap();
    for key in [
        "metricas_generales",
        "recursos_humanos",
        "maquinaria",
        "actividades_construccion",
        "analisis_geografico",
        "analisis_temporal",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
}

#[test]
fn rejected_upload_keeps_the_loaded_dataset() {
    let settings = Settings::default();
    let mut session = Session::new();
    session.load_file(&settings, fixture()).unwrap();

    let broken = std::env::temp_dir().join(format!("survey_broken_{}.csv", std::process::id()));
    std::fs::write(&broken, "X,Y,id_punto\n-75.5,6.2,P1\n").unwrap();
    let err = session.load_file(&settings, &broken).unwrap_err();
    let _ = std::fs::remove_file(&broken);

    match &err.problems()[0] {
        SchemaProblem::MissingColumns { columns } => {
            assert!(columns.contains(&"estado_obr".to_string()));
            assert!(!columns.contains(&"X".to_string()));
        }
        other => panic!("unexpected problem {other:?}"),
    }
    assert_eq!(session.current().unwrap().report.rows, 6);
}

#[test]
fn unknown_extension_is_a_load_error() {
    let settings = Settings::default();
    let err = Pipeline::new(&settings).ingest_file("encuesta.txt").unwrap_err();
    assert!(err.problems().is_empty());
}
