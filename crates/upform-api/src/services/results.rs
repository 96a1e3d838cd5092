//! One-shot store of upload summaries.
//!
//! A summary is kept after a committed upload so the client can fetch it once,
//! after following the `location` it was given.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::Mutex;
use upform_core::models::{format_kilobytes, format_megabytes};
use upform_core::{BoundModel, UploadId, UploadSummary};

use crate::forms::DownloadForm;

/// Summaries kept before the oldest is evicted
const MAX_PENDING_RESULTS: usize = 1024;

#[derive(Debug, Default)]
pub struct UploadResults {
    inner: Mutex<Pending>,
}

#[derive(Debug, Default)]
struct Pending {
    next_seq: u64,
    /// Summary with its insertion sequence number
    by_id: HashMap<UploadId, (u64, UploadSummary)>,
}

impl UploadResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, summary: UploadSummary) {
        let mut pending = self.inner.lock().await;
        if pending.by_id.len() >= MAX_PENDING_RESULTS {
            let oldest = pending
                .by_id
                .iter()
                .min_by_key(|(_, (seq, _))| *seq)
                .map(|(id, _)| id.clone());
            if let Some(id) = oldest {
                tracing::debug!(upload_id = %id, "Evicting unread upload summary");
                pending.by_id.remove(&id);
            }
        }
        let seq = pending.next_seq;
        pending.next_seq += 1;
        pending
            .by_id
            .insert(summary.upload_id.clone(), (seq, summary));
    }

    /// Remove and return the summary for `upload_id`
    pub async fn take(&self, upload_id: &UploadId) -> Option<UploadSummary> {
        self.inner
            .lock()
            .await
            .by_id
            .remove(upload_id)
            .map(|(_, summary)| summary)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.by_id.len()
    }
}

/// Build the report shown for a committed upload
pub fn summarize(
    model: &BoundModel<DownloadForm>,
    primary_field: &str,
    image_field: &str,
) -> UploadSummary {
    let file = model.file(primary_field);
    let image = model.file(image_field);

    UploadSummary {
        upload_id: model.upload_id.clone(),
        title: model.record.title.clone(),
        description: model.record.description.clone(),
        category: model.record.category.clone(),
        file_name: file.map(|f| f.display_name.clone()).unwrap_or_default(),
        file_size_mb: format_megabytes(file.map(|f| f.byte_length)),
        image_name: image.map(|f| f.display_name.clone()).unwrap_or_default(),
        image_size_kb: format_kilobytes(image.map(|f| f.byte_length)),
        created_at: Utc::now(),
    }
}
