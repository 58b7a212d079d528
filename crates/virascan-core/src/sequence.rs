use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Identifier given to a raw sequence submitted without a FASTA header.
pub const DEFAULT_SEQUENCE_ID: &str = "User_Sequence";

static NUCLEOTIDES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ATGCNatgcn]+$").expect("nucleotide pattern is valid"));

/// A single named nucleotide sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceRecord {
    pub id: String,
    pub sequence: String,
}

impl SequenceRecord {
    pub fn new(id: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sequence: sequence.into(),
        }
    }

    /// Build a record from pasted text, or `None` if the text is not a valid
    /// nucleotide sequence. The sequence is normalized and gets the default id.
    pub fn from_raw(text: &str) -> Option<Self> {
        if !is_valid_sequence(text) {
            return None;
        }
        Some(Self::new(DEFAULT_SEQUENCE_ID, normalize(text)))
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn to_fasta(&self) -> String {
        to_fasta(&self.sequence, &self.id)
    }
}

/// True iff every non-whitespace character is one of `ATGCN` (any case).
/// Text that is empty after removing whitespace is not a valid sequence.
pub fn is_valid_sequence(text: &str) -> bool {
    let compact: String = text.chars().filter(|c| !is_sequence_whitespace(*c)).collect();
    NUCLEOTIDES.is_match(&compact)
}

/// Strip whitespace and uppercase, keeping the order of everything else.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !is_sequence_whitespace(*c))
        .collect::<String>()
        .to_uppercase()
}

/// Space, tab, CR and LF only; other Unicode spacing is an invalid character.
fn is_sequence_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Render a normalized sequence as a two-line FASTA entry.
pub fn to_fasta(sequence: &str, id: &str) -> String {
    let mut out = String::with_capacity(id.len() + sequence.len() + 2);
    out.push('>');
    out.push_str(id);
    out.push('\n');
    out.push_str(sequence);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_mixed_case_with_whitespace() {
        assert!(is_valid_sequence("atcg ATCG\n nnNN\tgc\r\n"));
        assert!(is_valid_sequence("N"));
    }

    #[test]
    fn test_invalid_characters() {
        assert!(!is_valid_sequence("ATCGX"));
        assert!(!is_valid_sequence("ATCG-ATCG"));
        assert!(!is_valid_sequence(">seq1\nATCG"));
        assert!(!is_valid_sequence("ACGU"));
    }

    #[test]
    fn test_empty_is_invalid() {
        assert!(!is_valid_sequence(""));
        assert!(!is_valid_sequence("  \n\t "));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("atcg\natcg"), "ATCGATCG");
        assert_eq!(normalize(" a t\tg\r\nc "), "ATGC");
        assert_eq!(normalize("NnAa"), "NNAA");
    }

    #[test]
    fn test_only_ascii_whitespace_is_stripped() {
        assert!(!is_valid_sequence("AC\u{00A0}GT"));
        assert!(!is_valid_sequence("AC\u{2003}GT"));
        assert_eq!(normalize("ac\u{00A0}gt"), "AC\u{00A0}GT");
        assert_eq!(normalize(" a\tc\r\ng "), "ACG");
    }

    #[test]
    fn test_to_fasta_default_id() {
        let seq = normalize("atcg\natcg");
        assert_eq!(to_fasta(&seq, DEFAULT_SEQUENCE_ID), ">User_Sequence\nATCGATCG");
    }

    #[test]
    fn test_from_raw() {
        let rec = SequenceRecord::from_raw("acgt\nnnac").unwrap();
        assert_eq!(rec.id, DEFAULT_SEQUENCE_ID);
        assert_eq!(rec.sequence, "ACGTNNAC");
        assert_eq!(rec.len(), 8);
        assert!(SequenceRecord::from_raw("hello").is_none());
        assert!(SequenceRecord::from_raw("").is_none());
    }
}
