//! Static column catalogue of the field survey export.
//!
//! Column names are the (truncated, Spanish) names the survey tool writes.
//! Everything that depends on "which columns exist" goes through
//! [`ActiveTaxonomy::resolve`] once per table instead of probing inline.

use crate::table::Table;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

pub const SHAPE: &str = "Shape";
pub const X: &str = "X";
pub const Y: &str = "Y";
pub const START: &str = "start";
pub const POINT_ID: &str = "id_punto";
pub const STATUS: &str = "estado_obr";
pub const SUBMITTED: &str = "fecha_dilig";
pub const INSPECTOR: &str = "nombre_int";
pub const CREWS: &str = "num_cuadri";
pub const WORKERS_PER_CREW: &str = "trabajador";
pub const TOTAL_WORKERS: &str = "num_total_";
pub const TOTAL_HOURS: &str = "total_hora";
pub const MACHINERY: &str = "maquinaria";
pub const OTHER_MACHINERY_NAME: &str = "nombre_otr";

pub const REQUIRED_COLUMNS: &[&str] = &[
    SHAPE,
    X,
    Y,
    START,
    POINT_ID,
    STATUS,
    SUBMITTED,
    INSPECTOR,
    CREWS,
    WORKERS_PER_CREW,
];

pub const DATE_COLUMNS: &[&str] = &[SUBMITTED, START];
pub const COORDINATE_COLUMNS: &[&str] = &[X, Y];
pub const TEXT_COLUMNS: &[&str] = &[
    POINT_ID,
    STATUS,
    INSPECTOR,
    MACHINERY,
    OTHER_MACHINERY_NAME,
    SHAPE,
];

/// Worker-category head counts; their sum should equal `num_total_`.
pub const WORKER_FIELDS: &[&str] = &[
    "cant_ayuda",
    "cant_ofici",
    "cant_opera",
    "cant_auxil",
    "cant_otros",
];

pub const MACHINERY_HOUR_FIELDS: &[&str] = &[
    "horas_retr",
    "horas_mini",
    "horas_volq",
    "horas_comp",
    "horas_otra",
];

pub const PRELIMINARY_FIELDS: &[&str] = &[
    "localizaci",
    "descapote",
    "a_mano",
    "a_maquina",
    "Tala_poda",
    "roceria_li",
    "cerramient",
    "tela_verde",
    "malla_nara",
    "teja_ondul",
    "cubierta_p",
    "pasarela_p",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityGroup {
    pub name: &'static str,
    pub fields: &'static [&'static str],
}

pub const ACTIVITY_GROUPS: &[ActivityGroup] = &[
    ActivityGroup {
        name: "preparacion_terreno",
        fields: &["descapote", "a_mano", "a_maquina", "Tala_poda", "roceria_li"],
    },
    ActivityGroup {
        name: "cerramientos_proteccion",
        fields: &[
            "cerramient",
            "tela_verde",
            "malla_nara",
            "teja_ondul",
            "cubierta_p",
            "pasarela_p",
            "proteccion",
            "protecci_vehicular",
        ],
    },
    ActivityGroup {
        name: "limpieza_mantenimiento",
        fields: &["limpieza_e", "limpieza_s"],
    },
    ActivityGroup {
        name: "infraestructura_hidrica",
        fields: &["malla_esla", "canoas_rua", "bajantes", "tuberia_en"],
    },
    ActivityGroup {
        name: "estructuras_seguridad",
        fields: &[
            "cerco_made",
            "pintura_ba",
            "pasamanos_",
            "barrera_me",
            "pintura_pa",
        ],
    },
    ActivityGroup {
        name: "elementos_servicio",
        fields: &[
            "aparatos_s",
            "puertas",
            "senal_vert",
            "reparacion",
            "ventanas",
            "teja_barro",
        ],
    },
    ActivityGroup {
        name: "pavimentacion",
        fields: &["piso_adoqu", "piso_ado_1", "cordones_c"],
    },
    ActivityGroup {
        name: "drenajes",
        fields: &["carcamos_c", "Cunetas_co", "drenaje_pe"],
    },
    ActivityGroup {
        name: "excavaciones",
        fields: &[
            "excav_manu",
            "excav_ma_1",
            "excav_meca",
            "excav_me_1",
            "excav_me_2",
            "excav_me_3",
            "explanacio",
            "explanac_1",
            "excav_terrazas",
        ],
    },
    ActivityGroup {
        name: "trabajos_roca",
        fields: &["roca_cielo_cuña", "roca_cielo_martillo", "roca_pila_"],
    },
    ActivityGroup {
        name: "concreto",
        fields: &["e_concreto"],
    },
    ActivityGroup {
        name: "cortes_taludes",
        fields: &["corte_talu", "corte_ta_1", "corte_ta_2"],
    },
    ActivityGroup {
        name: "transporte",
        fields: &["transpor_1"],
    },
];

static LABELS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("cant_ayuda", "Ayudantes"),
        ("cant_ofici", "Oficiales"),
        ("cant_opera", "Operadores"),
        ("cant_auxil", "Auxiliares de tránsito"),
        ("cant_otros", "Otros"),
        ("horas_retr", "Retroexcavadora"),
        ("horas_mini", "Minicargador"),
        ("horas_volq", "Volqueta"),
        ("horas_comp", "Compactadora"),
        ("horas_otra", "Otra"),
        ("localizaci", "Localización y replanteo"),
        ("descapote", "Descapote"),
        ("a_mano", "Descapote manual"),
        ("a_maquina", "Descapote mecánico"),
        ("Tala_poda", "Tala y poda"),
        ("roceria_li", "Rocería y limpieza"),
        ("cerramient", "Cerramiento"),
        ("tela_verde", "Tela verde"),
        ("malla_nara", "Malla naranja"),
        ("teja_ondul", "Teja ondulada"),
        ("cubierta_p", "Cubierta plástica"),
        ("pasarela_p", "Pasarela peatonal"),
    ])
});

/// Display label for a known field, falling back to the column name.
pub fn label(field: &str) -> &str {
    LABELS.get(field).copied().unwrap_or(field)
}

/// Every distinct field named by the activity taxonomy, in declaration order.
pub static ACTIVITY_FIELDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut seen = HashSet::new();
    ACTIVITY_GROUPS
        .iter()
        .flat_map(|g| g.fields.iter().copied())
        .filter(|f| seen.insert(*f))
        .collect()
});

/// Columns the normalizer coerces to numbers (zero-fill on failure).
pub static NUMERIC_COLUMNS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut seen = HashSet::new();
    [CREWS, WORKERS_PER_CREW, TOTAL_WORKERS, TOTAL_HOURS]
        .into_iter()
        .chain(WORKER_FIELDS.iter().copied())
        .chain(MACHINERY_HOUR_FIELDS.iter().copied())
        .chain(PRELIMINARY_FIELDS.iter().copied())
        .chain(ACTIVITY_FIELDS.iter().copied())
        .filter(|f| seen.insert(*f))
        .collect()
});

/// Keep only the fields of `fields` that exist in `table`, in order.
pub fn present<'f>(table: &Table, fields: &[&'f str]) -> Vec<&'f str> {
    fields
        .iter()
        .copied()
        .filter(|f| table.has_column(f))
        .collect()
}

/// The activity taxonomy evaluated against one table's columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveTaxonomy {
    pub groups: Vec<ActiveGroup>,
    /// Distinct taxonomy fields, present or not.
    pub declared_fields: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveGroup {
    pub name: &'static str,
    pub fields: Vec<&'static str>,
}

impl ActiveTaxonomy {
    /// Groups whose fields are all absent are dropped.
    pub fn resolve(table: &Table) -> Self {
        let groups = ACTIVITY_GROUPS
            .iter()
            .filter_map(|g| {
                let fields = present(table, g.fields);
                (!fields.is_empty()).then_some(ActiveGroup {
                    name: g.name,
                    fields,
                })
            })
            .collect();
        ActiveTaxonomy {
            groups,
            declared_fields: ACTIVITY_FIELDS.len(),
        }
    }

    /// Present fields across all groups, deduplicated, in taxonomy order.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut seen = HashSet::new();
        self.groups
            .iter()
            .flat_map(|g| g.fields.iter().copied())
            .filter(|f| seen.insert(*f))
            .collect()
    }
}
