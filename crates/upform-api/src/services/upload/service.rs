//! Ingestion orchestrator
//!
//! Drives one multipart upload through validation → framing → routing → binding →
//! commit. Every failure after the scratch directory exists aborts the session
//! before the error is returned, so nothing partial stays on disk.

use std::fmt::Display;
use std::sync::Arc;

use bytes::Bytes;
use futures::Stream;
use upform_core::{
    AntiforgeryContext, AntiforgeryValidator, BindForm, BoundModel, FilePolicy, FormBinder,
    IngestError, UploadId, UploadLimits,
};
use upform_processing::{
    boundary_from_content_type, MultipartStream, Route, SectionDescriptor, SectionRouter,
};
use upform_storage::ScratchStorage;

use super::session::{IngestStage, UploadSession};

pub struct IngestionService {
    storage: ScratchStorage,
    router: SectionRouter,
    limits: UploadLimits,
    antiforgery: Arc<dyn AntiforgeryValidator>,
}

impl IngestionService {
    pub fn new(
        storage: ScratchStorage,
        policy: FilePolicy,
        limits: UploadLimits,
        antiforgery: Arc<dyn AntiforgeryValidator>,
    ) -> Self {
        Self {
            storage,
            router: SectionRouter::new(policy),
            limits,
            antiforgery,
        }
    }

    pub fn storage(&self) -> &ScratchStorage {
        &self.storage
    }

    /// Ingest one `multipart/form-data` body and bind its text fields onto `T`.
    ///
    /// The anti-forgery check and the content type are verified before the body
    /// is polled or any storage is touched.
    ///
    /// # Arguments
    /// - `antiforgery`: tokens presented with the request
    /// - `content_type`: the request's `Content-Type` header
    /// - `body`: the raw request body
    ///
    /// # Returns
    /// The bound record and the promoted files, under a fresh upload identifier
    pub async fn ingest<T, S, E>(
        &self,
        antiforgery: &AntiforgeryContext,
        content_type: Option<&str>,
        body: S,
    ) -> Result<BoundModel<T>, IngestError>
    where
        T: BindForm,
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        if !self.antiforgery.is_request_valid(antiforgery) {
            tracing::debug!(
                stage = IngestStage::AwaitingValidation.as_str(),
                "Anti-forgery validation failed"
            );
            return Err(IngestError::AntiforgeryRejected);
        }

        let boundary = boundary_from_content_type(content_type)?;
        tracing::trace!(stage = IngestStage::Framing.as_str(), "Multipart boundary accepted");

        let upload_id = UploadId::generate();
        let scratch = self.storage.begin(&upload_id).await?;
        let mut session = UploadSession::new(scratch, self.limits.max_text_field_bytes);

        let mut parts =
            MultipartStream::new(Box::pin(body), &boundary, self.limits.max_header_bytes);

        if let Err(e) = self.route_sections(&mut session, &mut parts).await {
            tracing::debug!(
                upload_id = %upload_id,
                stage = session.stage().as_str(),
                error = %e,
                "Upload aborted"
            );
            session.abort().await;
            return Err(e);
        }

        session.enter(IngestStage::Binding);
        let record = match FormBinder::bind::<T>(session.values()) {
            Ok(record) => record,
            Err(errors) => {
                tracing::debug!(
                    upload_id = %upload_id,
                    fields = ?errors.fields(),
                    "Form binding failed"
                );
                session.abort().await;
                return Err(IngestError::Validation(errors));
            }
        };

        let files = session.commit().await?;

        Ok(BoundModel {
            upload_id,
            record,
            files,
        })
    }

    async fn route_sections<S, E>(
        &self,
        session: &mut UploadSession,
        parts: &mut MultipartStream<S>,
    ) -> Result<(), IngestError>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Display,
    {
        while let Some(headers) = parts.next_section().await? {
            let Some(section) = SectionDescriptor::parse(&headers)? else {
                continue;
            };

            match self.router.route(&section)? {
                Route::File(sink) => {
                    let file_name = section.file_name.as_deref().unwrap_or_default();
                    session
                        .store_file(&section.name, file_name, sink, parts.body())
                        .await?;
                }
                Route::Text => {
                    session
                        .store_text(&section.name, section.charset.as_deref(), parts.body())
                        .await?;
                }
            }
        }

        Ok(())
    }
}
