use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use upform_core::{FormValues, IngestError};

use crate::charset::decode_text;

/// Most text fields accepted in one request
pub const MAX_TEXT_FIELDS: usize = 1024;

/// Placeholder some front-ends send for unset fields; stored as empty.
const UNDEFINED: &str = "undefined";

/// Collects the text sections of a form into [`FormValues`].
///
/// Each value is buffered in memory up to `max_value_bytes`; a longer value is a
/// malformed request.
#[derive(Debug)]
pub struct TextAccumulator {
    values: FormValues,
    max_value_bytes: usize,
}

impl TextAccumulator {
    pub fn new(max_value_bytes: usize) -> Self {
        Self {
            values: FormValues::new(),
            max_value_bytes,
        }
    }

    /// Read a whole section body and record it under `name`.
    pub async fn read_field<S>(
        &mut self,
        name: &str,
        charset: Option<&str>,
        body: S,
    ) -> Result<(), IngestError>
    where
        S: Stream<Item = Result<Bytes, IngestError>>,
    {
        if self.values.len() >= MAX_TEXT_FIELDS {
            return Err(IngestError::malformed(format!(
                "form value count limit {} exceeded",
                MAX_TEXT_FIELDS
            )));
        }

        let mut buf = BytesMut::new();
        let mut body = std::pin::pin!(body);
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            if buf.len() + chunk.len() > self.max_value_bytes {
                return Err(IngestError::malformed(format!(
                    "form value length limit {} exceeded for '{}'",
                    self.max_value_bytes, name
                )));
            }
            buf.extend_from_slice(&chunk);
        }

        self.append(name, decode_text(&buf, charset));
        Ok(())
    }

    /// Record a value, normalizing the `undefined` placeholder to an empty string.
    pub fn append(&mut self, name: &str, value: String) {
        let value = if value.eq_ignore_ascii_case(UNDEFINED) {
            String::new()
        } else {
            value
        };
        tracing::trace!(field = %name, len = value.len(), "Form value collected");
        self.values.append(name, value);
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn into_values(self) -> FormValues {
        self.values
    }
}
