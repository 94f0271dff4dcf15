use serde::Serialize;
use tabled::Tabled;

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct StatusRow {
    #[serde(rename = "Estado")]
    #[tabled(rename = "Estado")]
    pub status: String,
    #[serde(rename = "Registros")]
    #[tabled(rename = "Registros")]
    pub records: usize,
    #[serde(rename = "Porcentaje")]
    #[tabled(rename = "Porcentaje")]
    pub share: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct WorkforceRow {
    #[serde(rename = "Categoria")]
    #[tabled(rename = "Categoria")]
    pub category: String,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total")]
    pub total: String,
    #[serde(rename = "Promedio")]
    #[tabled(rename = "Promedio")]
    pub mean: String,
    #[serde(rename = "Maximo")]
    #[tabled(rename = "Maximo")]
    pub max: String,
    #[serde(rename = "ObrasConPersonal")]
    #[tabled(rename = "ObrasConPersonal")]
    pub records_with_value: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MachineryRow {
    #[serde(rename = "Maquinaria")]
    #[tabled(rename = "Maquinaria")]
    pub kind: String,
    #[serde(rename = "Horas")]
    #[tabled(rename = "Horas")]
    pub hours: String,
    #[serde(rename = "PorcentajeHoras")]
    #[tabled(rename = "PorcentajeHoras")]
    pub share: String,
    #[serde(rename = "ObrasQueReportan")]
    #[tabled(rename = "ObrasQueReportan")]
    pub records_with_value: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ActivityGroupRow {
    #[serde(rename = "Grupo")]
    #[tabled(rename = "Grupo")]
    pub group: String,
    #[serde(rename = "Columnas")]
    #[tabled(rename = "Columnas")]
    pub fields: usize,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total")]
    pub total: String,
    #[serde(rename = "ObrasConActividad")]
    #[tabled(rename = "ObrasConActividad")]
    pub records_with_activity: usize,
    #[serde(rename = "PromedioPorObra")]
    #[tabled(rename = "PromedioPorObra")]
    pub per_record: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ActivityRankRow {
    #[serde(rename = "Puesto")]
    #[tabled(rename = "Puesto")]
    pub rank: usize,
    #[serde(rename = "Actividad")]
    #[tabled(rename = "Actividad")]
    pub activity: String,
    #[serde(rename = "Columna")]
    #[tabled(rename = "Columna")]
    pub field: String,
    #[serde(rename = "Total")]
    #[tabled(rename = "Total")]
    pub total: String,
}

/// Headline figures printed after a report run.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SummaryStats {
    pub total_registros: usize,
    pub total_trabajadores: f64,
    pub total_horas_hombre: f64,
    pub total_horas_maquinaria: f64,
    pub promedio_grupo_por_obra: f64,
    pub cobertura_actividades: f64,
}

/// One line per built record.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct InterventionRow {
    #[serde(rename = "Punto")]
    #[tabled(rename = "Punto")]
    pub point_id: String,
    #[serde(rename = "Estado")]
    #[tabled(rename = "Estado")]
    pub status: String,
    #[serde(rename = "Trabajadores")]
    #[tabled(rename = "Trabajadores")]
    pub workers: u32,
    #[serde(rename = "CategoriaPrincipal")]
    #[tabled(rename = "CategoriaPrincipal")]
    pub main_category: String,
    #[serde(rename = "HorasHombre")]
    #[tabled(rename = "HorasHombre")]
    pub human_hours: String,
    #[serde(rename = "MaquinariaPrincipal")]
    #[tabled(rename = "MaquinariaPrincipal")]
    pub main_machinery: String,
    #[serde(rename = "HorasMaquinaria")]
    #[tabled(rename = "HorasMaquinaria")]
    pub machinery_hours: String,
    #[serde(rename = "Anomalias")]
    #[tabled(rename = "Anomalias")]
    pub anomalies: usize,
}
