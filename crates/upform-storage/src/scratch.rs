//! Per-upload scratch storage.
//!
//! A `ScratchSession` owns one scratch directory for as long as an upload is being
//! received. Dropping a session that was neither committed nor aborted removes the
//! directory synchronously, so a cancelled request leaves nothing behind.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::{pin_mut, Stream, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use upform_core::{SessionState, SinkKind, StoredFileRef, UploadId};

use crate::error::{StorageError, StorageResult};
use crate::layout::StorageLayout;
use crate::promote::promote;

/// Factory for scratch sessions
#[derive(Clone, Debug)]
pub struct ScratchStorage {
    layout: StorageLayout,
}

impl ScratchStorage {
    /// Create the scratch and final roots if they do not exist yet
    pub async fn new(layout: StorageLayout) -> StorageResult<Self> {
        for root in [layout.scratch_root(), layout.final_root()] {
            fs::create_dir_all(root).await.map_err(|e| {
                StorageError::CreateFailed(format!(
                    "Failed to create storage directory {}: {}",
                    root.display(),
                    e
                ))
            })?;
        }

        Ok(ScratchStorage { layout })
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Create the scratch directory of a new upload.
    ///
    /// Fails if the directory already exists: identifiers are never reused.
    pub async fn begin(&self, upload_id: &UploadId) -> StorageResult<ScratchSession> {
        let dir = self.layout.session_dir(upload_id);

        fs::create_dir(&dir).await.map_err(|e| {
            StorageError::CreateFailed(format!("{}: {}", dir.display(), e))
        })?;

        tracing::debug!(upload_id = %upload_id, dir = %dir.display(), "Scratch session opened");

        Ok(ScratchSession {
            upload_id: upload_id.clone(),
            dir,
            layout: self.layout.clone(),
            pending: Vec::new(),
            state: SessionState::Open,
        })
    }
}

#[derive(Debug)]
struct PendingFile {
    key: String,
    display_name: String,
    sink: SinkKind,
    scratch_path: PathBuf,
    byte_length: u64,
}

#[derive(Debug)]
pub struct ScratchSession {
    upload_id: UploadId,
    dir: PathBuf,
    layout: StorageLayout,
    pending: Vec<PendingFile>,
    state: SessionState,
}

impl ScratchSession {
    pub fn upload_id(&self) -> &UploadId {
        &self.upload_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of fully written files waiting for promotion
    pub fn pending_files(&self) -> usize {
        self.pending.len()
    }

    /// Stream one file field into scratch storage and return its byte length.
    ///
    /// The body is copied chunk by chunk; it is never held in memory as a whole.
    /// A later write under the same `key` replaces the earlier one. A body that
    /// fails partway is not recorded; its partial file stays in the scratch
    /// directory until the session is aborted or dropped.
    pub async fn write_file<S, E>(
        &mut self,
        key: &str,
        display_name: &str,
        sink: SinkKind,
        body: S,
    ) -> Result<u64, E>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: From<StorageError>,
    {
        if self.state != SessionState::Open {
            return Err(StorageError::SessionClosed.into());
        }

        let path = self
            .layout
            .scratch_path(&self.upload_id, sink, display_name)?;

        if self
            .pending
            .iter()
            .any(|p| p.key != key && p.scratch_path == path)
        {
            return Err(StorageError::InvalidKey(format!(
                "file name '{}' is already used by another field",
                display_name
            ))
            .into());
        }

        if let Some(index) = self.pending.iter().position(|p| p.key == key) {
            let replaced = self.pending.remove(index);
            tracing::debug!(
                upload_id = %self.upload_id,
                field = %key,
                "Replacing earlier file for field"
            );
            if replaced.scratch_path != path {
                remove_file_if_exists(&replaced.scratch_path)
                    .await
                    .map_err(StorageError::IoError)?;
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(StorageError::IoError)?;
        }

        let start = std::time::Instant::now();
        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let written = match copy_body(&mut file, &path, body).await {
            Ok(n) => file.sync_all().await.map(|_| n).map_err(|e| {
                E::from(StorageError::WriteFailed(format!(
                    "Failed to sync file {}: {}",
                    path.display(),
                    e
                )))
            }),
            Err(e) => Err(e),
        };

        // Close the handle before anything may remove the directory.
        drop(file.into_std().await);
        let byte_length = written?;

        tracing::info!(
            upload_id = %self.upload_id,
            field = %key,
            path = %path.display(),
            size_bytes = byte_length,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Scratch file written"
        );

        self.pending.push(PendingFile {
            key: key.to_string(),
            display_name: display_name.to_string(),
            sink,
            scratch_path: path,
            byte_length,
        });

        Ok(byte_length)
    }

    /// Promote every pending file into final storage and remove the scratch directory.
    ///
    /// If any promotion fails, files promoted so far are removed again along with
    /// the upload's final directory, and the scratch directory is deleted.
    pub async fn commit(mut self) -> StorageResult<Vec<StoredFileRef>> {
        if self.state != SessionState::Open {
            return Err(StorageError::SessionClosed);
        }

        let start = std::time::Instant::now();
        let pending = std::mem::take(&mut self.pending);
        let mut stored = Vec::with_capacity(pending.len());

        for file in &pending {
            let promoted = match self
                .layout
                .final_path(&self.upload_id, file.sink, &file.display_name)
            {
                Ok(final_path) => {
                    let moved = promote(&file.scratch_path, &final_path).await;
                    moved.map(|_| final_path)
                }
                Err(e) => Err(e),
            };

            match promoted {
                Ok(final_path) => stored.push(StoredFileRef {
                    key: file.key.clone(),
                    display_name: file.display_name.clone(),
                    final_path,
                    byte_length: file.byte_length,
                }),
                Err(e) => {
                    tracing::error!(
                        upload_id = %self.upload_id,
                        field = %file.key,
                        error = %e,
                        "Promotion failed, rolling back upload"
                    );
                    for done in &stored {
                        if let Err(err) = remove_file_if_exists(&done.final_path).await {
                            tracing::warn!(
                                path = %done.final_path.display(),
                                error = %err,
                                "Failed to roll back promoted file"
                            );
                        }
                    }
                    let final_dir = self.layout.final_upload_dir(&self.upload_id);
                    remove_dir_logged(&self.upload_id, &final_dir).await;
                    self.abort_in_place().await;
                    return Err(e);
                }
            }
        }

        self.state = SessionState::Committed;
        remove_dir_logged(&self.upload_id, &self.dir).await;

        tracing::info!(
            upload_id = %self.upload_id,
            files = stored.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload committed"
        );

        Ok(stored)
    }

    /// Discard everything written so far
    pub async fn abort(mut self) {
        self.abort_in_place().await;
    }

    async fn abort_in_place(&mut self) {
        if self.state == SessionState::Aborted {
            return;
        }
        self.state = SessionState::Aborted;
        self.pending.clear();
        remove_dir_logged(&self.upload_id, &self.dir).await;
        tracing::debug!(upload_id = %self.upload_id, "Scratch session aborted");
    }
}

impl Drop for ScratchSession {
    fn drop(&mut self) {
        if self.state != SessionState::Open {
            return;
        }
        self.state = SessionState::Aborted;
        // Dropped while still open: the request was cancelled or panicked.
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => tracing::debug!(
                upload_id = %self.upload_id,
                "Scratch directory removed for abandoned upload"
            ),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                upload_id = %self.upload_id,
                dir = %self.dir.display(),
                error = %e,
                "Failed to remove scratch directory of abandoned upload"
            ),
        }
    }
}

async fn copy_body<S, E>(file: &mut fs::File, path: &Path, body: S) -> Result<u64, E>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: From<StorageError>,
{
    pin_mut!(body);
    let mut written: u64 = 0;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| {
        StorageError::WriteFailed(format!("Failed to flush file {}: {}", path.display(), e))
    })?;

    Ok(written)
}

async fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path).await {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Best-effort recursive removal; failures are logged, never returned.
async fn remove_dir_logged(upload_id: &UploadId, dir: &Path) {
    match fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            upload_id = %upload_id,
            dir = %dir.display(),
            error = %e,
            "Failed to remove upload directory"
        ),
    }
}
