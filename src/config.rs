use crate::taxonomy::{
    COORDINATE_COLUMNS, DATE_COLUMNS, NUMERIC_COLUMNS, REQUIRED_COLUMNS, TEXT_COLUMNS,
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;

/// Rectangular lon/lat window used as a soft sanity check on coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl BoundingBox {
    /// Approximate extent of Medellín.
    pub const MEDELLIN: BoundingBox = BoundingBox {
        lon_min: -75.7,
        lon_max: -75.4,
        lat_min: 6.1,
        lat_max: 6.4,
    };

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        (self.lon_min..=self.lon_max).contains(&lon) && (self.lat_min..=self.lat_max).contains(&lat)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        BoundingBox::MEDELLIN
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub required_columns: Vec<String>,
    pub date_columns: Vec<String>,
    pub numeric_columns: Vec<String>,
    pub coordinate_columns: Vec<String>,
    pub text_columns: Vec<String>,
    pub bounding_box: BoundingBox,
    /// Length of the activity ranking.
    pub top_activities: usize,
    /// Decimals kept when counting distinct coordinate pairs.
    pub coordinate_precision: u32,
    pub input_path: Option<String>,
    pub output_dir: String,
    pub log_level: String,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            required_columns: owned(REQUIRED_COLUMNS),
            date_columns: owned(DATE_COLUMNS),
            numeric_columns: owned(&NUMERIC_COLUMNS),
            coordinate_columns: owned(COORDINATE_COLUMNS),
            text_columns: owned(TEXT_COLUMNS),
            bounding_box: BoundingBox::default(),
            top_activities: 10,
            coordinate_precision: 6,
            input_path: None,
            output_dir: "reportes".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from a JSON file; keys that are left out keep their
    /// defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Applies `SURVEY_INPUT`, `SURVEY_OUTPUT_DIR` and `SURVEY_LOG` on top.
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SURVEY_INPUT") {
            self.input_path = Some(v);
        }
        if let Some(v) = lookup("SURVEY_OUTPUT_DIR") {
            self.output_dir = v;
        }
        if let Some(v) = lookup("SURVEY_LOG") {
            self.log_level = v;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_scenarios() {
        let bbox = BoundingBox::default();
        assert!(bbox.contains(-75.58, 6.24));
        assert!(!bbox.contains(0.0, 0.0));
        assert!(!bbox.contains(-75.58, 7.0));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let s: Settings = serde_json::from_str(r#"{"top_activities": 3}"#).unwrap();
        assert_eq!(s.top_activities, 3);
        assert_eq!(s.required_columns.len(), 10);
        assert_eq!(s.bounding_box, BoundingBox::MEDELLIN);
    }

    #[test]
    fn overrides_replace_paths() {
        let s = Settings::default().with_overrides(|key| match key {
            "SURVEY_INPUT" => Some("datos.xlsx".to_string()),
            _ => None,
        });
        assert_eq!(s.input_path.as_deref(), Some("datos.xlsx"));
        assert_eq!(s.output_dir, "reportes");
    }
}
