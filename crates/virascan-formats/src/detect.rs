use virascan_core::sequence::is_valid_sequence;

use crate::FileFormat;

/// Upload size ceiling when none is configured: 100 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Extensions accepted for upload, without the leading dot.
pub const DEFAULT_EXTENSIONS: [&str; 5] = ["fasta", "fas", "fa", "fna", "txt"];

/// Auto-detect format from content
pub fn detect_format(content: &str) -> FileFormat {
    let trimmed = content.trim_start();

    if trimmed.starts_with('>') {
        FileFormat::Fasta
    } else if is_valid_sequence(trimmed) {
        FileFormat::Plain
    } else {
        FileFormat::Unknown
    }
}

/// Detect format from file extension
pub fn detect_format_from_extension(path: &str) -> FileFormat {
    match extension(path).as_deref() {
        Some("fasta" | "fas" | "fa" | "fna") => FileFormat::Fasta,
        Some("txt") => FileFormat::Plain,
        _ => FileFormat::Unknown,
    }
}

/// MIME type recorded for an accepted upload.
pub fn mime_type_for(path: &str) -> &'static str {
    match detect_format_from_extension(path) {
        FileFormat::Fasta => "text/x-fasta",
        FileFormat::Plain => "text/plain",
        FileFormat::Unknown => "application/octet-stream",
    }
}

/// Lowercased extension after the last dot, if any.
fn extension(path: &str) -> Option<String> {
    let name = path.rsplit(&['/', '\\'][..]).next().unwrap_or(path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// File-level checks run before any content is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_size_bytes: u64,
    /// Lowercase, without the leading dot.
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl UploadPolicy {
    /// Every reason the file is rejected, or `Ok` if it may be read.
    pub fn check(&self, name: &str, size: u64) -> Result<(), Vec<String>> {
        let mut reasons = Vec::new();

        let ext = extension(name);
        let allowed = ext.as_ref().is_some_and(|e| {
            self.allowed_extensions
                .iter()
                .any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(e))
        });
        if !allowed {
            let listed = self
                .allowed_extensions
                .iter()
                .map(|e| format!(".{}", e.trim_start_matches('.')))
                .collect::<Vec<_>>()
                .join(", ");
            reasons.push(match ext {
                Some(e) => format!("Unsupported file type .{e} (allowed: {listed})"),
                None => format!("File has no extension (allowed: {listed})"),
            });
        }

        if size == 0 {
            reasons.push("File is empty".to_string());
        } else if size > self.max_size_bytes {
            reasons.push(format!(
                "File is too large: {} (maximum {})",
                format_size(size),
                format_size(self.max_size_bytes)
            ));
        }

        if reasons.is_empty() {
            Ok(())
        } else {
            Err(reasons)
        }
    }
}

/// Human-readable byte count, e.g. `1.5 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_fasta() {
        assert_eq!(detect_format("\n  >seq1\nATCGATCG"), FileFormat::Fasta);
    }

    #[test]
    fn test_detect_plain() {
        assert_eq!(detect_format("acgt\nACGN\n"), FileFormat::Plain);
        assert_eq!(detect_format("hello world"), FileFormat::Unknown);
        assert_eq!(detect_format(""), FileFormat::Unknown);
    }

    #[test]
    fn test_detect_from_extension() {
        assert_eq!(detect_format_from_extension("test.FASTA"), FileFormat::Fasta);
        assert_eq!(detect_format_from_extension("dir.v2/test.fna"), FileFormat::Fasta);
        assert_eq!(detect_format_from_extension("notes.txt"), FileFormat::Plain);
        assert_eq!(detect_format_from_extension("test.gb"), FileFormat::Unknown);
        assert_eq!(detect_format_from_extension(".fasta"), FileFormat::Unknown);
        assert_eq!(mime_type_for("a.fa"), "text/x-fasta");
    }

    #[test]
    fn test_policy_accepts_known_extensions() {
        let policy = UploadPolicy::default();
        for name in ["a.fasta", "b.FAS", "c.fa", "d.fna", "e.txt"] {
            assert_eq!(policy.check(name, 10), Ok(()), "{name}");
        }
    }

    #[test]
    fn test_policy_collects_all_reasons() {
        let policy = UploadPolicy::default();
        let reasons = policy.check("genome.exe", DEFAULT_MAX_UPLOAD_BYTES + 1).unwrap_err();
        assert_eq!(reasons.len(), 2);
        assert!(reasons[0].contains("Unsupported file type .exe"));
        assert!(reasons[0].contains(".fasta, .fas, .fa, .fna, .txt"));
        assert!(reasons[1].contains("100.0 MB"));
    }

    #[test]
    fn test_policy_limits() {
        let policy = UploadPolicy {
            max_size_bytes: 1024,
            allowed_extensions: vec![".fa".to_string()],
        };
        assert_eq!(policy.check("x.fa", 1024), Ok(()));
        assert!(policy.check("x.fa", 1025).is_err());
        assert_eq!(policy.check("x.fa", 0), Err(vec!["File is empty".to_string()]));
        assert!(policy.check("x.fasta", 10).is_err());
        assert!(policy.check("README", 10).unwrap_err()[0].contains("no extension"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(DEFAULT_MAX_UPLOAD_BYTES), "100.0 MB");
    }
}
