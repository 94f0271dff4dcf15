use crate::loader::LoadError;
use serde::Serialize;
use thiserror::Error;

/// A whole-dataset structural defect. Any of these rejects the upload.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "tipo", rename_all = "snake_case")]
pub enum SchemaProblem {
    #[error("missing required columns: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("column {field} is not numeric (first bad value: {sample:?})")]
    NonNumericColumn { field: String, sample: String },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid dataset structure: {}", summarize(.0))]
    Schema(Vec<SchemaProblem>),

    #[error(transparent)]
    Load(#[from] LoadError),
}

fn summarize(problems: &[SchemaProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl IngestError {
    pub fn problems(&self) -> &[SchemaProblem] {
        match self {
            IngestError::Schema(p) => p,
            IngestError::Load(_) => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
