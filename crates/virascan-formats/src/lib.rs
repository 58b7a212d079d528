pub mod detect;
pub mod export;
pub mod fasta;

pub use fasta::{parse as parse_fasta, FastaDocument, ParseMode};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Header on line {line} has no sequence id")]
    MissingId { line: usize },
    #[error("Header '{id}' on line {line} has no sequence")]
    MissingSequence { line: usize, id: String },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Export is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Fasta,
    /// Bare nucleotides with no header.
    Plain,
    Unknown,
}
