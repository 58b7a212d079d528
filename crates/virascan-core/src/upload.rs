use serde::{Deserialize, Serialize};

/// Describes the active input artifact. Replaced wholesale on every upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFileMeta {
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    pub mime_type: String,
}

impl UploadedFileMeta {
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
        }
    }
}
