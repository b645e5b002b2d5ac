//! Message framing: `Content-Length` headers or newline-delimited JSON.

use std::fmt;
use std::str::FromStr;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::types::McpError;

/// Upper bound on the total size of one header block.
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Default upper bound on one payload.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

const CONTENT_LENGTH: &str = "content-length";

/// How frames are delimited on the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// `Content-Length: N\r\n\r\n` followed by exactly N bytes.
    #[default]
    ContentLength,
    /// One JSON document per line.
    NewlineDelimited,
}

impl Framing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Framing::ContentLength => "content-length",
            Framing::NewlineDelimited => "newline",
        }
    }

    /// Wrap a payload for the wire.
    pub fn encode(&self, payload: &[u8]) -> Vec<u8> {
        match self {
            Framing::ContentLength => encode_frame(payload),
            Framing::NewlineDelimited => {
                let mut out = Vec::with_capacity(payload.len() + 1);
                out.extend_from_slice(payload);
                out.push(b'\n');
                out
            }
        }
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framing {
    type Err = McpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "content-length" | "contentlength" | "lsp" => Ok(Framing::ContentLength),
            "newline" | "ndjson" | "line" => Ok(Framing::NewlineDelimited),
            other => Err(McpError::Config(format!(
                "unknown framing '{other}', expected 'content-length' or 'newline'"
            ))),
        }
    }
}

/// Why a frame could not be read.
#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    /// The peer closed the stream, possibly mid-frame.
    #[error("end of stream")]
    EndOfStream,

    /// The header block or payload size is invalid. The stream cannot be
    /// resynchronised after this.
    #[error("framing error: {0}")]
    Framing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<FrameError> for McpError {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::EndOfStream => McpError::EndOfStream,
            FrameError::Framing(msg) => McpError::Framing(msg),
            FrameError::Io(err) => McpError::Io(err),
        }
    }
}

/// Encode a payload as `Content-Length: N\r\n\r\n<payload>`.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let header = format!("Content-Length: {}\r\n\r\n", payload.len());
    let mut out = Vec::with_capacity(header.len() + payload.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(payload);
    out
}

/// Reads whole frames from a buffered byte stream.
pub struct FrameReader<R> {
    reader: R,
    framing: Framing,
    max_frame_bytes: usize,
}

impl<R: AsyncBufRead + Unpin> FrameReader<R> {
    pub fn new(reader: R, framing: Framing) -> Self {
        Self {
            reader,
            framing,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    pub fn with_max_frame_bytes(mut self, max: usize) -> Self {
        self.max_frame_bytes = max;
        self
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Read the next payload. Short reads are retried until the frame is
    /// complete or the stream ends.
    pub async fn read_frame(&mut self) -> Result<Vec<u8>, FrameError> {
        match self.framing {
            Framing::ContentLength => self.read_content_length_frame().await,
            Framing::NewlineDelimited => self.read_line_frame().await,
        }
    }

    async fn read_content_length_frame(&mut self) -> Result<Vec<u8>, FrameError> {
        let mut header_bytes = 0usize;
        let mut seen_header = false;
        let mut content_length: Option<usize> = None;

        loop {
            let remaining = MAX_HEADER_BYTES.saturating_sub(header_bytes);
            if remaining == 0 {
                return Err(FrameError::Framing(format!(
                    "header block exceeds {MAX_HEADER_BYTES} bytes"
                )));
            }

            let mut line = Vec::new();
            let n = (&mut self.reader)
                .take(remaining as u64)
                .read_until(b'\n', &mut line)
                .await?;
            if n == 0 {
                if seen_header {
                    tracing::debug!("Stream ended inside a header block");
                }
                return Err(FrameError::EndOfStream);
            }
            header_bytes += n;

            if line.last() != Some(&b'\n') {
                if n == remaining {
                    return Err(FrameError::Framing(format!(
                        "header block exceeds {MAX_HEADER_BYTES} bytes"
                    )));
                }
                tracing::debug!("Stream ended inside a header line");
                return Err(FrameError::EndOfStream);
            }

            let text = std::str::from_utf8(&line)
                .map_err(|_| FrameError::Framing("header line is not valid UTF-8".to_string()))?;
            let text = text.trim_end_matches(['\r', '\n']);

            if text.is_empty() {
                if !seen_header {
                    // Stray separator between frames.
                    header_bytes = 0;
                    continue;
                }
                break;
            }
            seen_header = true;

            let (name, value) = text
                .split_once(':')
                .ok_or_else(|| FrameError::Framing(format!("malformed header line '{text}'")))?;

            if !name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
                tracing::trace!("Ignoring header {}", name.trim());
                continue;
            }

            let value = value.trim();
            let parsed: i64 = value.parse().map_err(|_| {
                FrameError::Framing(format!("invalid Content-Length value '{value}'"))
            })?;
            if parsed <= 0 {
                return Err(FrameError::Framing(format!(
                    "Content-Length must be positive, got {parsed}"
                )));
            }
            let length = usize::try_from(parsed).map_err(|_| {
                FrameError::Framing(format!("Content-Length {parsed} is not addressable"))
            })?;
            if let Some(previous) = content_length {
                if previous != length {
                    return Err(FrameError::Framing(format!(
                        "conflicting Content-Length headers: {previous} and {length}"
                    )));
                }
            }
            content_length = Some(length);
        }

        let length = content_length
            .ok_or_else(|| FrameError::Framing("missing Content-Length header".to_string()))?;
        if length > self.max_frame_bytes {
            return Err(FrameError::Framing(format!(
                "frame of {length} bytes exceeds limit of {} bytes",
                self.max_frame_bytes
            )));
        }

        let mut payload = vec![0u8; length];
        match self.reader.read_exact(&mut payload).await {
            Ok(_) => Ok(payload),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                tracing::debug!("Stream ended inside a {length}-byte payload");
                Err(FrameError::EndOfStream)
            }
            Err(e) => Err(FrameError::Io(e)),
        }
    }

    async fn read_line_frame(&mut self) -> Result<Vec<u8>, FrameError> {
        loop {
            let limit = self.max_frame_bytes.saturating_add(1);
            let mut line = Vec::new();
            let n = (&mut self.reader)
                .take(limit as u64)
                .read_until(b'\n', &mut line)
                .await?;
            if n == 0 {
                return Err(FrameError::EndOfStream);
            }
            if line.last() != Some(&b'\n') && n == limit {
                return Err(FrameError::Framing(format!(
                    "line exceeds limit of {} bytes",
                    self.max_frame_bytes
                )));
            }

            while matches!(line.last(), Some(b'\n' | b'\r')) {
                line.pop();
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Ok(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;
    use tokio_test::io::Builder;

    fn reader(data: &[u8], framing: Framing) -> FrameReader<&[u8]> {
        FrameReader::new(data, framing)
    }

    #[test]
    fn test_encode_frame_header() {
        let frame = encode_frame(br#"{"a":1}"#);
        assert_eq!(frame, b"Content-Length: 7\r\n\r\n{\"a\":1}".to_vec());
    }

    #[tokio::test]
    async fn test_reads_consecutive_frames() {
        let mut data = encode_frame(b"first");
        data.extend(encode_frame(b"second"));
        let mut frames = reader(&data, Framing::ContentLength);
        assert_eq!(frames.read_frame().await.unwrap(), b"first");
        assert_eq!(frames.read_frame().await.unwrap(), b"second");
        assert!(matches!(
            frames.read_frame().await,
            Err(FrameError::EndOfStream)
        ));
    }

    #[tokio::test]
    async fn test_header_name_is_case_insensitive_and_bare_lf_accepted() {
        let data = b"content-length: 2\nX-Other: yes\n\nhi";
        let mut frames = reader(data, Framing::ContentLength);
        assert_eq!(frames.read_frame().await.unwrap(), b"hi");
    }

    #[tokio::test]
    async fn test_reassembles_split_reads() {
        let mock = Builder::new()
            .read(b"Content-Len")
            .read(b"gth: 11\r")
            .read(b"\n\r\nhello")
            .read(b" world")
            .build();
        let mut frames = FrameReader::new(BufReader::new(mock), Framing::ContentLength);
        assert_eq!(frames.read_frame().await.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_rejects_missing_or_bad_length() {
        let mut frames = reader(b"X-Foo: 1\r\n\r\n{}", Framing::ContentLength);
        assert!(matches!(
            frames.read_frame().await,
            Err(FrameError::Framing(_))
        ));

        let mut frames = reader(b"Content-Length: abc\r\n\r\n{}", Framing::ContentLength);
        assert!(matches!(
            frames.read_frame().await,
            Err(FrameError::Framing(_))
        ));

        let mut frames = reader(b"Content-Length: 0\r\n\r\n", Framing::ContentLength);
        assert!(matches!(
            frames.read_frame().await,
            Err(FrameError::Framing(_))
        ));

        let mut frames = reader(b"Content-Length: -4\r\n\r\n{}{}", Framing::ContentLength);
        assert!(matches!(
            frames.read_frame().await,
            Err(FrameError::Framing(_))
        ));
    }

    #[tokio::test]
    async fn test_conflicting_duplicate_lengths_rejected() {
        let data = b"Content-Length: 2\r\nContent-Length: 3\r\n\r\n{}";
        let mut frames = reader(data, Framing::ContentLength);
        assert!(matches!(
            frames.read_frame().await,
            Err(FrameError::Framing(_))
        ));

        let data = b"Content-Length: 2\r\nContent-Length: 2\r\n\r\n{}";
        let mut frames = reader(data, Framing::ContentLength);
        assert_eq!(frames.read_frame().await.unwrap(), b"{}");
    }

    #[tokio::test]
    async fn test_truncated_payload_is_end_of_stream() {
        let mut frames = reader(b"Content-Length: 10\r\n\r\nabc", Framing::ContentLength);
        assert!(matches!(
            frames.read_frame().await,
            Err(FrameError::EndOfStream)
        ));
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let data = b"Content-Length: 100\r\n\r\n";
        let mut frames = reader(data, Framing::ContentLength).with_max_frame_bytes(10);
        assert!(matches!(
            frames.read_frame().await,
            Err(FrameError::Framing(_))
        ));
    }

    #[tokio::test]
    async fn test_runaway_header_block_rejected() {
        let data = vec![b'a'; MAX_HEADER_BYTES + 10];
        let mut frames = reader(&data, Framing::ContentLength);
        assert!(matches!(
            frames.read_frame().await,
            Err(FrameError::Framing(_))
        ));
    }

    #[tokio::test]
    async fn test_newline_framing_skips_blank_lines() {
        let data = b"{\"a\":1}\r\n\n   \n{\"b\":2}\n";
        let mut frames = reader(data, Framing::NewlineDelimited);
        assert_eq!(frames.read_frame().await.unwrap(), b"{\"a\":1}");
        assert_eq!(frames.read_frame().await.unwrap(), b"{\"b\":2}");
        assert!(matches!(
            frames.read_frame().await,
            Err(FrameError::EndOfStream)
        ));
    }

    #[test]
    fn test_framing_parses_from_config_strings() {
        assert_eq!(
            "Content-Length".parse::<Framing>().unwrap(),
            Framing::ContentLength
        );
        assert_eq!(
            "newline".parse::<Framing>().unwrap(),
            Framing::NewlineDelimited
        );
        assert!("carrier-pigeon".parse::<Framing>().is_err());
        assert_eq!(Framing::NewlineDelimited.encode(b"{}"), b"{}\n".to_vec());
    }
}
