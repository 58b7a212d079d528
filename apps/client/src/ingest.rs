//! Turning user input into the normalized FASTA text that gets staged.

use thiserror::Error;
use virascan_core::sequence::{is_valid_sequence, normalize, SequenceRecord};
use virascan_core::upload::UploadedFileMeta;
use virascan_formats::detect::{detect_format, mime_type_for, UploadPolicy};
use virascan_formats::fasta::{self, FastaDocument, ParseMode};
use virascan_formats::FileFormat;

/// File name recorded for sequences pasted as text.
pub const PASTED_FILE_NAME: &str = "pasted_sequence.fasta";

/// Input the user can fix; every problem found is listed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .reasons.join("; "))]
pub struct ValidationError {
    pub reasons: Vec<String>,
}

impl ValidationError {
    pub fn new(reasons: Vec<String>) -> Self {
        Self { reasons }
    }

    pub fn single(reason: impl Into<String>) -> Self {
        Self {
            reasons: vec![reason.into()],
        }
    }
}

/// Validated input, ready for the upload slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedInput {
    pub meta: UploadedFileMeta,
    /// Normalized FASTA text.
    pub content: String,
    pub record_count: usize,
}

/// Pasted text: either bare nucleotides or FASTA.
pub fn ingest_text(text: &str, mode: ParseMode) -> Result<StagedInput, ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::single("Please enter a DNA sequence"));
    }

    let (content, record_count) = match detect_format(text) {
        FileFormat::Fasta => normalize_fasta(text, mode)?,
        _ => (normalize_raw(text)?, 1),
    };
    let meta = UploadedFileMeta::new(PASTED_FILE_NAME, content.len() as u64, "text/plain");
    Ok(StagedInput {
        meta,
        content,
        record_count,
    })
}

/// An uploaded file. File-level checks run before the content is looked at.
pub fn ingest_file(
    name: &str,
    content: &str,
    policy: &UploadPolicy,
    mode: ParseMode,
) -> Result<StagedInput, ValidationError> {
    policy
        .check(name, content.len() as u64)
        .map_err(ValidationError::new)?;

    let (normalized, record_count) = match detect_format(content) {
        FileFormat::Fasta => normalize_fasta(content, mode)?,
        FileFormat::Plain => (normalize_raw(content)?, 1),
        FileFormat::Unknown => {
            return Err(ValidationError::single(format!(
                "'{name}' does not contain FASTA or nucleotide sequence data"
            )))
        }
    };

    Ok(StagedInput {
        meta: UploadedFileMeta::new(name, content.len() as u64, mime_type_for(name)),
        content: normalized,
        record_count,
    })
}

fn normalize_raw(text: &str) -> Result<String, ValidationError> {
    SequenceRecord::from_raw(text)
        .map(|record| record.to_fasta())
        .ok_or_else(|| {
            ValidationError::single("Sequence contains invalid characters; only A, T, G, C and N are allowed")
        })
}

fn normalize_fasta(text: &str, mode: ParseMode) -> Result<(String, usize), ValidationError> {
    let doc = fasta::parse(text);

    let mut reasons: Vec<String> = doc.violations(mode).iter().map(ToString::to_string).collect();
    if doc.is_empty() {
        reasons.push("No sequences found in FASTA input".to_string());
    }
    for record in doc.iter() {
        if !is_valid_sequence(&record.sequence) {
            reasons.push(format!(
                "Sequence '{}' contains invalid characters; only A, T, G, C and N are allowed",
                record.id
            ));
        }
    }
    if !reasons.is_empty() {
        return Err(ValidationError::new(reasons));
    }

    let normalized = FastaDocument {
        records: doc
            .iter()
            .map(|r| SequenceRecord::new(r.id.clone(), normalize(&r.sequence)))
            .collect(),
        dropped_headers: Vec::new(),
    };
    Ok((normalized.to_fasta_text(), normalized.len()))
}
