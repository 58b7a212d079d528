use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("No sequence content to submit")]
    EmptyContent,
    #[error("At least one model must be selected")]
    NoModels,
}

/// Normalized FASTA text plus the set of models to run it through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    fasta: String,
    file_name: String,
    model_ids: BTreeSet<String>,
}

impl PredictionRequest {
    /// Blank model ids are ignored; duplicates collapse.
    pub fn new<I, S>(
        fasta: impl Into<String>,
        file_name: impl Into<String>,
        model_ids: I,
    ) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fasta = fasta.into();
        if fasta.trim().is_empty() {
            return Err(RequestError::EmptyContent);
        }

        let model_ids: BTreeSet<String> = model_ids
            .into_iter()
            .map(|id| id.as_ref().trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        if model_ids.is_empty() {
            return Err(RequestError::NoModels);
        }

        Ok(Self {
            fasta,
            file_name: file_name.into(),
            model_ids,
        })
    }

    pub fn fasta(&self) -> &str {
        &self.fasta
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn model_ids(&self) -> &BTreeSet<String> {
        &self.model_ids
    }
}
