use std::fmt::Display;

use bytes::{Buf, Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};
use memchr::memmem;
use upform_core::IngestError;

/// Most header lines accepted in one section
const MAX_HEADER_LINES: usize = 16;

/// Most transport padding tolerated after a delimiter
const MAX_DELIMITER_PADDING: usize = 256;

const CRLF: &[u8] = b"\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before the first delimiter
    Preamble,
    /// Right after a delimiter, deciding between another section and the end
    AfterDelimiter,
    /// Reading a section's header block
    Headers,
    /// Streaming a section's body
    Body,
    /// Closing delimiter seen, or the stream failed
    Done,
}

/// Raw headers of one multipart section, in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionHeaders {
    headers: Vec<(String, String)>,
}

impl SectionHeaders {
    /// First value for `name`, compared ASCII case-insensitively
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/// Incremental splitter of a `multipart/form-data` body.
///
/// Only headers and a look-behind window of one delimiter length are buffered;
/// section bodies are handed out chunk by chunk as they arrive. A section must
/// be consumed (or skipped by calling [`next_section`](Self::next_section)
/// again) before the following one is read.
pub struct MultipartStream<S> {
    source: S,
    buf: BytesMut,
    /// `--boundary`, which may open the body without a leading CRLF
    dash_boundary: Vec<u8>,
    /// `\r\n--boundary`, which ends every section body
    delimiter: memmem::Finder<'static>,
    delimiter_len: usize,
    header_end: memmem::Finder<'static>,
    max_header_bytes: usize,
    state: State,
    eof: bool,
}

impl<S, E> MultipartStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    pub fn new(source: S, boundary: &str, max_header_bytes: usize) -> Self {
        let dash_boundary = [b"--".as_slice(), boundary.as_bytes()].concat();
        let delimiter = [CRLF, dash_boundary.as_slice()].concat();
        Self {
            source,
            buf: BytesMut::new(),
            delimiter_len: delimiter.len(),
            delimiter: memmem::Finder::new(&delimiter).into_owned(),
            dash_boundary,
            header_end: memmem::Finder::new(b"\r\n\r\n").into_owned(),
            max_header_bytes,
            state: State::Preamble,
            eof: false,
        }
    }

    /// Advance to the next section and return its headers.
    ///
    /// Any unread body of the current section is discarded. `Ok(None)` means the
    /// closing delimiter was reached.
    pub async fn next_section(&mut self) -> Result<Option<SectionHeaders>, IngestError> {
        let result = self.advance_to_section().await;
        if result.is_err() {
            self.state = State::Done;
        }
        result
    }

    /// Next chunk of the current section's body, or `None` at its end.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, IngestError> {
        let result = self.read_body_chunk().await;
        if result.is_err() {
            self.state = State::Done;
        }
        result
    }

    /// The current section's body as a stream of chunks.
    ///
    /// The stream ends after the section's last chunk, or right after yielding
    /// an error.
    pub fn body(&mut self) -> impl Stream<Item = Result<Bytes, IngestError>> + '_ {
        stream::unfold(self, |this| async move {
            match this.next_chunk().await {
                Ok(Some(chunk)) => Some((Ok(chunk), this)),
                Ok(None) => None,
                Err(e) => Some((Err(e), this)),
            }
        })
    }

    async fn advance_to_section(&mut self) -> Result<Option<SectionHeaders>, IngestError> {
        loop {
            match self.state {
                State::Preamble => self.skip_preamble().await?,
                State::Body => {
                    while self.read_body_chunk().await?.is_some() {}
                }
                State::AfterDelimiter => {
                    if self.read_after_delimiter().await? {
                        self.state = State::Headers;
                    } else {
                        tracing::trace!("Closing multipart delimiter reached");
                        self.state = State::Done;
                    }
                }
                State::Headers => {
                    let headers = self.read_headers().await?;
                    self.state = State::Body;
                    return Ok(Some(headers));
                }
                State::Done => return Ok(None),
            }
        }
    }

    /// Pull one more chunk from the source. Returns `false` at end of input.
    async fn fill(&mut self) -> Result<bool, IngestError> {
        if self.eof {
            return Ok(false);
        }
        match self.source.next().await {
            Some(Ok(chunk)) => {
                self.buf.extend_from_slice(&chunk);
                Ok(true)
            }
            Some(Err(e)) => Err(IngestError::transport(e)),
            None => {
                self.eof = true;
                Ok(false)
            }
        }
    }

    async fn fill_or_unterminated(&mut self) -> Result<(), IngestError> {
        if self.fill().await? {
            Ok(())
        } else {
            Err(IngestError::malformed("unterminated multipart stream"))
        }
    }

    async fn skip_preamble(&mut self) -> Result<(), IngestError> {
        // A bare `--boundary` only counts at the very start of the body
        let mut at_start = true;
        loop {
            if at_start && self.buf.starts_with(&self.dash_boundary) {
                self.buf.advance(self.dash_boundary.len());
                self.state = State::AfterDelimiter;
                return Ok(());
            }

            if !at_start
                || self.buf.len() >= self.dash_boundary.len()
                || !self.dash_boundary.starts_with(&self.buf)
            {
                at_start = false;
                if let Some(pos) = self.delimiter.find(&self.buf) {
                    self.buf.advance(pos + self.delimiter_len);
                    self.state = State::AfterDelimiter;
                    return Ok(());
                }
                let keep = (self.delimiter_len - 1).min(self.buf.len());
                let discard = self.buf.len() - keep;
                self.buf.advance(discard);
            }

            self.fill_or_unterminated().await?;
        }
    }

    /// Returns `true` when another section follows, `false` for the closing
    /// delimiter.
    async fn read_after_delimiter(&mut self) -> Result<bool, IngestError> {
        loop {
            if self.buf.starts_with(b"--") {
                self.buf.advance(2);
                return Ok(false);
            }

            if let Some(pos) = memmem::find(&self.buf, CRLF) {
                let padding = &self.buf[..pos];
                if !padding.iter().all(|b| *b == b' ' || *b == b'\t') {
                    return Err(IngestError::malformed(
                        "unexpected data after multipart boundary",
                    ));
                }
                self.buf.advance(pos + CRLF.len());
                return Ok(true);
            }

            if self.buf.len() > MAX_DELIMITER_PADDING {
                return Err(IngestError::malformed(
                    "unexpected data after multipart boundary",
                ));
            }
            // A lone "-" could still become "--"
            self.fill_or_unterminated().await?;
        }
    }

    async fn read_headers(&mut self) -> Result<SectionHeaders, IngestError> {
        loop {
            if self.buf.starts_with(CRLF) {
                self.buf.advance(CRLF.len());
                return Ok(SectionHeaders::default());
            }

            if let Some(pos) = self.header_end.find(&self.buf) {
                if pos > self.max_header_bytes {
                    return Err(self.header_too_large());
                }
                let block = self.buf.split_to(pos + 4);
                return parse_header_block(&block[..pos]);
            }

            if self.buf.len() > self.max_header_bytes + 4 {
                return Err(self.header_too_large());
            }
            self.fill_or_unterminated().await?;
        }
    }

    fn header_too_large(&self) -> IngestError {
        IngestError::malformed(format!(
            "multipart headers length limit {} exceeded",
            self.max_header_bytes
        ))
    }

    async fn read_body_chunk(&mut self) -> Result<Option<Bytes>, IngestError> {
        loop {
            if self.state != State::Body {
                return Ok(None);
            }

            if let Some(pos) = self.delimiter.find(&self.buf) {
                if pos > 0 {
                    return Ok(Some(self.buf.split_to(pos).freeze()));
                }
                self.buf.advance(self.delimiter_len);
                self.state = State::AfterDelimiter;
                return Ok(None);
            }

            // The tail might be the start of a delimiter split across reads
            let keep = self.delimiter_len - 1;
            if self.buf.len() > keep {
                let ready = self.buf.len() - keep;
                return Ok(Some(self.buf.split_to(ready).freeze()));
            }

            self.fill_or_unterminated().await?;
        }
    }
}

fn parse_header_block(block: &[u8]) -> Result<SectionHeaders, IngestError> {
    let text = String::from_utf8_lossy(block);
    let mut headers: Vec<(String, String)> = Vec::new();

    for line in text.split("\r\n") {
        if line.starts_with([' ', '\t']) {
            // Obsolete line folding continues the previous header
            let Some((_, value)) = headers.last_mut() else {
                return Err(IngestError::malformed("multipart header starts with folding"));
            };
            value.push(' ');
            value.push_str(line.trim());
            continue;
        }

        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| IngestError::malformed(format!("invalid multipart header line '{}'", line)))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(IngestError::malformed("empty multipart header name"));
        }

        headers.push((name.to_string(), value.trim().to_string()));
        if headers.len() > MAX_HEADER_LINES {
            return Err(IngestError::malformed(format!(
                "multipart header count limit {} exceeded",
                MAX_HEADER_LINES
            )));
        }
    }

    Ok(SectionHeaders { headers })
}
