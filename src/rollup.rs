//! Aggregation building blocks shared by the statistics engine.

use crate::table::Table;
use crate::util::ratio;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// Insertion-ordered string-keyed map. Serializes as a JSON object whose key
/// order is the insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V>(Vec<(String, V)>);

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        OrderedMap(Vec::new())
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: V) {
        self.0.push((key.into(), value));
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        OrderedMap(iter.into_iter().collect())
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Frequency table of non-blank values, most frequent first. Ties keep the
/// order in which values were first seen.
pub fn frequencies<'a, I>(values: I) -> OrderedMap<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut slot: HashMap<String, usize> = HashMap::new();
    for v in values {
        let v = v.trim();
        if v.is_empty() {
            continue;
        }
        match slot.get(v) {
            Some(&i) => order[i].1 += 1,
            None => {
                slot.insert(v.to_string(), order.len());
                order.push((v.to_string(), 1));
            }
        }
    }
    // stable sort keeps first-seen order among equal counts
    order.sort_by(|a, b| b.1.cmp(&a.1));
    OrderedMap(order)
}

/// Frequency table of a text column; `None` if the column is absent.
pub fn column_frequencies(table: &Table, field: &str) -> Option<OrderedMap<usize>> {
    let texts: Vec<String> = table.column(field)?.map(|c| c.to_text()).collect();
    Some(frequencies(texts.iter().map(String::as_str)))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct FieldStats {
    #[serde(rename = "total")]
    pub sum: f64,
    #[serde(rename = "promedio")]
    pub mean: f64,
    #[serde(rename = "maximo")]
    pub max: f64,
    #[serde(rename = "minimo")]
    pub min: f64,
    #[serde(rename = "registros_con_valor")]
    pub nonzero: usize,
}

impl FieldStats {
    /// All zeros for an empty input.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return FieldStats::default();
        }
        let sum: f64 = values.iter().sum();
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        FieldStats {
            sum,
            mean: sum / values.len() as f64,
            max,
            min,
            nonzero: values.iter().filter(|v| **v != 0.0).count(),
        }
    }

    pub fn of_column(table: &Table, field: &str) -> Option<Self> {
        table.numbers(field).map(|v| Self::from_values(&v))
    }
}

/// Per-field statistics over a named set of numeric fields.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct CategoryRollup {
    #[serde(rename = "campos")]
    pub fields: OrderedMap<FieldStats>,
    /// Sum of the member field sums.
    pub subtotal: f64,
    #[serde(rename = "promedio_por_registro")]
    pub per_record: f64,
}

impl CategoryRollup {
    /// Fields missing from `table` are left out entirely.
    pub fn over(table: &Table, fields: &[&str]) -> Self {
        let stats: OrderedMap<FieldStats> = fields
            .iter()
            .filter_map(|f| FieldStats::of_column(table, f).map(|s| (f.to_string(), s)))
            .collect();
        let subtotal: f64 = stats.iter().map(|(_, s)| s.sum).sum();
        CategoryRollup {
            per_record: ratio(subtotal, table.len() as f64),
            fields: stats,
            subtotal,
        }
    }

    /// Field sums keyed by a display label.
    pub fn labelled_sums<F>(&self, label: F) -> OrderedMap<f64>
    where
        F: Fn(&str) -> String,
    {
        self.fields.iter().map(|(k, s)| (label(k), s.sum)).collect()
    }
}
