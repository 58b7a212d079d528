use virascan_core::sequence::SequenceRecord;

use crate::ParseError;

/// How to treat headers that never received a sequence line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Drop them silently.
    #[default]
    Lenient,
    /// Report them as errors.
    Strict,
}

/// A header that produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedHeader {
    /// 1-based line number of the header.
    pub line: usize,
    pub id: String,
}

/// Records parsed from FASTA text, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FastaDocument {
    pub records: Vec<SequenceRecord>,
    pub dropped_headers: Vec<DroppedHeader>,
}

impl FastaDocument {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SequenceRecord> {
        self.records.iter()
    }

    /// Problems that `mode` does not tolerate. Always empty in lenient mode.
    pub fn violations(&self, mode: ParseMode) -> Vec<ParseError> {
        if mode == ParseMode::Lenient {
            return Vec::new();
        }
        self.dropped_headers
            .iter()
            .map(|h| {
                if h.id.is_empty() {
                    ParseError::MissingId { line: h.line }
                } else {
                    ParseError::MissingSequence {
                        line: h.line,
                        id: h.id.clone(),
                    }
                }
            })
            .collect()
    }

    /// One header line and one sequence line per record, joined by `\n`.
    pub fn to_fasta_text(&self) -> String {
        self.records
            .iter()
            .map(SequenceRecord::to_fasta)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parse FASTA text. Never fails: a header is only turned into a record once
/// both its id and its sequence are non-empty, everything else is dropped.
pub fn parse(input: &str) -> FastaDocument {
    let mut doc = FastaDocument::default();
    let mut current: Option<(usize, String)> = None;
    let mut current_seq = String::new();

    for (idx, line) in input.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        if let Some(header) = trimmed.strip_prefix('>') {
            flush(&mut doc, current.take(), std::mem::take(&mut current_seq));
            current = Some((idx + 1, header.to_string()));
        } else {
            current_seq.push_str(trimmed);
        }
    }

    flush(&mut doc, current, current_seq);
    doc
}

fn flush(doc: &mut FastaDocument, header: Option<(usize, String)>, sequence: String) {
    // Sequence lines seen before any header have no id to attach to.
    let Some((line, id)) = header else {
        return;
    };
    if id.is_empty() || sequence.is_empty() {
        doc.dropped_headers.push(DroppedHeader { line, id });
    } else {
        doc.records.push(SequenceRecord::new(id, sequence));
    }
}
