//! Ingestion and statistics for georeferenced construction-site survey
//! spreadsheets.
//!
//! A table is loaded from CSV or a workbook, checked for structure,
//! normalized cell by cell, checked for internal consistency and turned into
//! [`model::Record`]s. The statistics engine then reduces it into one nested
//! document covering status, workforce, machinery, construction activities,
//! geography and time.

pub mod aggregate;
pub mod config;
pub mod consistency;
pub mod error;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod reports;
pub mod repository;
pub mod rollup;
pub mod schema;
pub mod table;
pub mod taxonomy;
pub mod types;
pub mod util;

pub use aggregate::{aggregate, Aggregate, Statistics};
pub use config::Settings;
pub use error::{IngestError, SchemaProblem};
pub use pipeline::{Ingestion, Pipeline, Session};
pub use table::{Cell, Table};
