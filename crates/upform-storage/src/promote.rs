//! Promotion of finished scratch files into final storage.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{StorageError, StorageResult};

/// Move `from` to `to`, creating the destination directory.
///
/// A rename is used whenever both paths share a volume. Across volumes the file is
/// copied next to its destination, synced, renamed into place, and only then is
/// the scratch original deleted.
pub async fn promote(from: &Path, to: &Path) -> StorageResult<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).await.map_err(|e| {
            StorageError::PromoteFailed(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            tracing::debug!(
                from = %from.display(),
                to = %to.display(),
                "Rename crosses volumes, falling back to copy"
            );
            copy_then_remove(from, to).await
        }
        Err(e) => Err(StorageError::PromoteFailed(format!(
            "Failed to move {} to {}: {}",
            from.display(),
            to.display(),
            e
        ))),
    }
}

/// EXDEV on unix, ERROR_NOT_SAME_DEVICE on windows
#[cfg(unix)]
const CROSS_DEVICE_ERROR: i32 = 18;
#[cfg(not(unix))]
const CROSS_DEVICE_ERROR: i32 = 17;

fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(CROSS_DEVICE_ERROR)
}

pub(crate) async fn copy_then_remove(from: &Path, to: &Path) -> StorageResult<()> {
    let staging = staging_path(to);

    let copied = async {
        fs::copy(from, &staging).await?;
        fs::File::open(&staging).await?.sync_all().await?;
        fs::rename(&staging, to).await
    }
    .await;

    if let Err(e) = copied {
        if let Err(cleanup) = fs::remove_file(&staging).await {
            if cleanup.kind() != io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %staging.display(),
                    error = %cleanup,
                    "Failed to remove partial copy"
                );
            }
        }
        return Err(StorageError::PromoteFailed(format!(
            "Failed to copy {} to {}: {}",
            from.display(),
            to.display(),
            e
        )));
    }

    fs::remove_file(from).await.map_err(|e| {
        StorageError::PromoteFailed(format!(
            "Copied but failed to remove {}: {}",
            from.display(),
            e
        ))
    })
}

fn staging_path(to: &Path) -> PathBuf {
    let mut name = to
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("promoted"));
    name.push(".partial");
    to.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn promote_moves_file_and_creates_parents() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("scratch.bin");
        let to = dir.path().join("final").join("nested").join("file.bin");
        fs::write(&from, b"payload").await.unwrap();

        promote(&from, &to).await.unwrap();

        assert!(!from.exists());
        assert_eq!(fs::read(&to).await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn copy_fallback_removes_source_after_destination_is_complete() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("scratch.bin");
        let to = dir.path().join("file.bin");
        fs::write(&from, b"cross volume").await.unwrap();

        copy_then_remove(&from, &to).await.unwrap();

        assert!(!from.exists());
        assert!(!staging_path(&to).exists());
        assert_eq!(fs::read(&to).await.unwrap(), b"cross volume");
    }

    #[tokio::test]
    async fn copy_fallback_keeps_source_on_failure() {
        let dir = tempdir().unwrap();
        let from = dir.path().join("scratch.bin");
        let to = dir.path().join("missing-dir").join("file.bin");
        fs::write(&from, b"keep me").await.unwrap();

        let result = copy_then_remove(&from, &to).await;

        assert!(matches!(result, Err(StorageError::PromoteFailed(_))));
        assert_eq!(fs::read(&from).await.unwrap(), b"keep me");
    }

    #[tokio::test]
    async fn promote_missing_source_fails() {
        let dir = tempdir().unwrap();
        let result = promote(&dir.path().join("nope"), &dir.path().join("dest")).await;
        assert!(matches!(result, Err(StorageError::PromoteFailed(_))));
    }
}
