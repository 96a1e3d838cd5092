use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

pub const BOUNDARY: &str = "----upformTestBoundary7MA4YWxk";

/// Builds `multipart/form-data` bodies section by section.
pub struct MultipartBuilder {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBuilder {
    pub fn new() -> Self {
        Self::with_boundary(BOUNDARY)
    }

    pub fn with_boundary(boundary: &str) -> Self {
        Self {
            boundary: boundary.to_string(),
            body: Vec::new(),
        }
    }

    pub fn text(self, name: &str, value: &str) -> Self {
        let headers = format!("Content-Disposition: form-data; name=\"{}\"", name);
        self.section(&headers, value.as_bytes())
    }

    pub fn file(self, name: &str, file_name: &str, content: &[u8]) -> Self {
        let headers = format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
             Content-Type: application/octet-stream",
            name, file_name
        );
        self.section(&headers, content)
    }

    /// Section with arbitrary header lines (CRLF separated, no trailing CRLF)
    pub fn section(mut self, headers: &str, content: &[u8]) -> Self {
        self.body.extend_from_slice(b"--");
        self.body.extend_from_slice(self.boundary.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self.body.extend_from_slice(headers.as_bytes());
        self.body.extend_from_slice(b"\r\n\r\n");
        self.body.extend_from_slice(content);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn build(mut self) -> Vec<u8> {
        self.body.extend_from_slice(b"--");
        self.body.extend_from_slice(self.boundary.as_bytes());
        self.body.extend_from_slice(b"--\r\n");
        self.body
    }

    /// Body without the closing delimiter
    pub fn build_unterminated(self) -> Vec<u8> {
        self.body
    }
}

impl Default for MultipartBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Split `body` into chunks of `chunk_size` bytes
pub fn chunked(body: &[u8], chunk_size: usize) -> impl Stream<Item = Result<Bytes, io::Error>> {
    let chunks: Vec<Result<Bytes, io::Error>> = body
        .chunks(chunk_size)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    stream::iter(chunks)
}

/// Yield the first `cut` bytes of `body`, then fail like a dropped connection
pub fn failing_after(body: &[u8], cut: usize) -> impl Stream<Item = Result<Bytes, io::Error>> {
    let head = Bytes::copy_from_slice(&body[..cut]);
    stream::iter(vec![
        Ok(head),
        Err(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        )),
    ])
}

/// Yield the first `cut` bytes of `body`, then never produce anything again
pub fn stalled_after(body: &[u8], cut: usize) -> impl Stream<Item = Result<Bytes, io::Error>> {
    let head = Bytes::copy_from_slice(&body[..cut]);
    stream::iter(vec![Ok(head)]).chain(stream::pending())
}

/// Stream that records whether it was ever polled
pub fn watched(body: Vec<u8>) -> (impl Stream<Item = Result<Bytes, io::Error>>, Arc<AtomicBool>) {
    let polled = Arc::new(AtomicBool::new(false));
    let flag = polled.clone();
    let stream = stream::once(async move {
        flag.store(true, Ordering::SeqCst);
        Ok(Bytes::from(body))
    });
    (stream, polled)
}
