use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;

use serde::Serialize;
use uuid::Uuid;

/// Opaque identifier of one upload session.
///
/// Generated from a random v4 UUID rendered without hyphens, so it is safe to use
/// directly as a directory or file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UploadId(String);

impl UploadId {
    pub fn generate() -> Self {
        UploadId(Uuid::new_v4().simple().to_string())
    }

    /// Accepts only the 32 lowercase hex characters produced by `generate`
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = raw.len() == 32
            && raw
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        valid.then(|| UploadId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UploadId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Lifecycle of an upload session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Committed,
    Aborted,
}

/// Persisted content of one file field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFileRef {
    /// Form field the file arrived under (e.g. "File")
    pub key: String,
    /// Sanitized original file name
    pub display_name: String,
    /// Location in final storage
    pub final_path: PathBuf,
    pub byte_length: u64,
}

/// Result of a committed upload: the caller's record plus the stored files
#[derive(Debug, Clone)]
pub struct BoundModel<T> {
    pub upload_id: UploadId,
    pub record: T,
    pub files: Vec<StoredFileRef>,
}

impl<T> BoundModel<T> {
    pub fn file(&self, key: &str) -> Option<&StoredFileRef> {
        self.files.iter().find(|f| f.key == key)
    }
}
