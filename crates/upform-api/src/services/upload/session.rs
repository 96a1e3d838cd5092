//! One upload in flight.

use bytes::Bytes;
use futures::Stream;
use upform_core::{FormValues, IngestError, SinkKind, StoredFileRef, UploadId};
use upform_processing::TextAccumulator;
use upform_storage::ScratchSession;

/// Where an ingestion currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    AwaitingValidation,
    Framing,
    Routing,
    Binding,
    Committed,
    Aborted,
}

impl IngestStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestStage::AwaitingValidation => "awaiting_validation",
            IngestStage::Framing => "framing",
            IngestStage::Routing => "routing",
            IngestStage::Binding => "binding",
            IngestStage::Committed => "committed",
            IngestStage::Aborted => "aborted",
        }
    }
}

/// Owns everything one request accumulates: the scratch files and the text
/// fields. Dropping it without committing discards the scratch directory.
pub struct UploadSession {
    scratch: ScratchSession,
    texts: TextAccumulator,
    stage: IngestStage,
}

impl UploadSession {
    pub fn new(scratch: ScratchSession, max_text_field_bytes: usize) -> Self {
        Self {
            scratch,
            texts: TextAccumulator::new(max_text_field_bytes),
            stage: IngestStage::Routing,
        }
    }

    pub fn upload_id(&self) -> &UploadId {
        self.scratch.upload_id()
    }

    pub fn stage(&self) -> IngestStage {
        self.stage
    }

    pub fn enter(&mut self, stage: IngestStage) {
        tracing::debug!(
            upload_id = %self.upload_id(),
            from = self.stage.as_str(),
            to = stage.as_str(),
            "Upload stage changed"
        );
        self.stage = stage;
    }

    pub async fn store_file<S>(
        &mut self,
        key: &str,
        file_name: &str,
        sink: SinkKind,
        body: S,
    ) -> Result<u64, IngestError>
    where
        S: Stream<Item = Result<Bytes, IngestError>>,
    {
        self.scratch.write_file(key, file_name, sink, body).await
    }

    pub async fn store_text<S>(
        &mut self,
        key: &str,
        charset: Option<&str>,
        body: S,
    ) -> Result<(), IngestError>
    where
        S: Stream<Item = Result<Bytes, IngestError>>,
    {
        self.texts.read_field(key, charset, body).await
    }

    pub fn values(&self) -> &FormValues {
        self.texts.values()
    }

    pub async fn commit(mut self) -> Result<Vec<StoredFileRef>, IngestError> {
        self.enter(IngestStage::Committed);
        Ok(self.scratch.commit().await?)
    }

    pub async fn abort(mut self) {
        self.enter(IngestStage::Aborted);
        self.scratch.abort().await;
    }
}
