//! Path layout for scratch and final storage.

use std::path::{Path, PathBuf};

use upform_core::{SinkKind, UploadId};

use crate::error::{StorageError, StorageResult};

const FILES_DIR: &str = "files";
const IMAGES_DIR: &str = "images";

#[derive(Clone, Debug)]
pub struct StorageLayout {
    scratch_root: PathBuf,
    final_root: PathBuf,
}

impl StorageLayout {
    /// # Arguments
    /// * `scratch_root` - Parent of the per-upload scratch directories (e.g. "./TempFiles")
    /// * `final_root` - Root of promoted files (e.g. "./wwwroot")
    pub fn new(scratch_root: impl Into<PathBuf>, final_root: impl Into<PathBuf>) -> Self {
        Self {
            scratch_root: scratch_root.into(),
            final_root: final_root.into(),
        }
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    pub fn final_root(&self) -> &Path {
        &self.final_root
    }

    pub fn session_dir(&self, upload_id: &UploadId) -> PathBuf {
        self.scratch_root.join(upload_id.as_str())
    }

    pub fn scratch_path(
        &self,
        upload_id: &UploadId,
        sink: SinkKind,
        file_name: &str,
    ) -> StorageResult<PathBuf> {
        let dir = self.session_dir(upload_id);
        match sink {
            SinkKind::Named => Ok(dir.join(FILES_DIR).join(checked_name(file_name)?)),
            SinkKind::Identified => Ok(dir.join(IMAGES_DIR).join(upload_id.as_str())),
        }
    }

    /// Directory holding the named files of one upload in final storage
    pub fn final_upload_dir(&self, upload_id: &UploadId) -> PathBuf {
        self.final_root.join("Files").join(upload_id.as_str())
    }

    pub fn final_path(
        &self,
        upload_id: &UploadId,
        sink: SinkKind,
        file_name: &str,
    ) -> StorageResult<PathBuf> {
        match sink {
            SinkKind::Named => Ok(self
                .final_upload_dir(upload_id)
                .join(checked_name(file_name)?)),
            SinkKind::Identified => Ok(self
                .final_root
                .join("Images")
                .join("Files")
                .join(upload_id.as_str())),
        }
    }
}

/// Reject names that could escape their directory.
///
/// Names are expected to be sanitized already; this is the last check before a
/// name becomes a path.
fn checked_name(file_name: &str) -> StorageResult<&str> {
    if file_name.is_empty()
        || file_name == "."
        || file_name.contains("..")
        || file_name.contains('/')
        || file_name.contains('\\')
        || file_name.contains('\0')
    {
        return Err(StorageError::InvalidKey(format!(
            "file name '{}' is not a plain file name",
            file_name
        )));
    }
    Ok(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> StorageLayout {
        StorageLayout::new("/srv/scratch", "/srv/final")
    }

    #[test]
    fn named_files_keep_their_name() {
        let id = UploadId::generate();
        let scratch = layout()
            .scratch_path(&id, SinkKind::Named, "report.pdf")
            .unwrap();
        assert_eq!(
            scratch,
            PathBuf::from(format!("/srv/scratch/{}/files/report.pdf", id))
        );

        let final_path = layout()
            .final_path(&id, SinkKind::Named, "report.pdf")
            .unwrap();
        assert_eq!(
            final_path,
            PathBuf::from(format!("/srv/final/Files/{}/report.pdf", id))
        );
    }

    #[test]
    fn identified_files_use_upload_id() {
        let id = UploadId::generate();
        let scratch = layout()
            .scratch_path(&id, SinkKind::Identified, "cat.png")
            .unwrap();
        assert_eq!(
            scratch,
            PathBuf::from(format!("/srv/scratch/{}/images/{}", id, id))
        );

        let final_path = layout()
            .final_path(&id, SinkKind::Identified, "cat.png")
            .unwrap();
        assert_eq!(
            final_path,
            PathBuf::from(format!("/srv/final/Images/Files/{}", id))
        );
    }

    #[test]
    fn path_traversal_rejected() {
        let id = UploadId::generate();
        for name in ["../etc/passwd", "a/b", "a\\b", "..", "", "."] {
            let result = layout().scratch_path(&id, SinkKind::Named, name);
            assert!(
                matches!(result, Err(StorageError::InvalidKey(_))),
                "{name} accepted"
            );
        }
    }
}
