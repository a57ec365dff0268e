//! Framed I/O for the IMAP protocol.
//!
//! Responses are CRLF-terminated lines that may continue across literals
//! (`{n}` followed by n raw bytes and more line data). The reader keeps
//! everything in a persistent buffer and only hands out complete
//! responses, which makes `read_response` cancel-safe: a future dropped
//! mid-read loses nothing, the partial data stays buffered. The session
//! driver relies on this to `select!` between socket reads and command
//! submissions while idling.

#![allow(clippy::missing_errors_doc)]

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{Error, Result};

/// Initial read buffer size.
const INITIAL_BUFFER_SIZE: usize = 8192;

/// Maximum literal size to prevent memory exhaustion.
const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024; // 100 MB

/// Maximum total response size.
const MAX_RESPONSE_SIZE: usize = 128 * 1024 * 1024; // 128 MB

/// Framed connection for the IMAP protocol.
pub struct FramedStream<S> {
    stream: S,
    read_buf: BytesMut,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new framed stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            read_buf: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
        }
    }

    /// Reads one complete response, including any embedded literals.
    ///
    /// Cancel-safe: partially received data stays in the internal buffer
    /// across cancelled calls.
    pub async fn read_response(&mut self) -> Result<Vec<u8>> {
        loop {
            if let Some(len) = complete_response_len(&self.read_buf)? {
                let response = self.read_buf.copy_to_bytes(len);
                return Ok(response.to_vec());
            }

            if self.read_buf.len() > MAX_RESPONSE_SIZE {
                return Err(Error::Protocol("response too large".to_string()));
            }

            let n = self.stream.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }
        }
    }

    /// Writes a serialized command and flushes.
    pub async fn write_command(&mut self, data: &[u8]) -> Result<()> {
        self.stream.write_all(data).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Writes raw bytes in a single buffer and flushes.
    ///
    /// Used for the IDLE `DONE\r\n` fast path, which bypasses the command
    /// encoder entirely.
    pub async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.stream.write_all(data).await?;
        self.stream.flush().await?;
        Ok(())
    }
}

/// Returns the length of the first complete response in the buffer, or
/// `None` when more data is needed.
fn complete_response_len(buf: &[u8]) -> Result<Option<usize>> {
    let mut offset = 0;

    loop {
        let Some(crlf) = find_crlf(&buf[offset..]) else {
            return Ok(None);
        };
        let line_end = offset + crlf + 2;

        match parse_literal_length(&buf[offset..line_end]) {
            Some(len) => {
                if len > MAX_LITERAL_SIZE {
                    return Err(Error::Protocol(format!(
                        "literal too large: {len} bytes (max {MAX_LITERAL_SIZE})"
                    )));
                }
                if buf.len() < line_end + len {
                    return Ok(None);
                }
                // The response continues after the literal data.
                offset = line_end + len;
            }
            None => return Ok(Some(line_end)),
        }
    }
}

/// Finds the position of CRLF in a buffer.
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Parses a literal length from the end of a line.
///
/// Matches `{123}\r\n` and the non-synchronizing `{123+}\r\n` form.
fn parse_literal_length(line: &[u8]) -> Option<usize> {
    if !line.ends_with(b"\r\n") {
        return None;
    }

    let line = &line[..line.len() - 2];

    let open = line.iter().rposition(|&b| b == b'{')?;
    if !line.ends_with(b"}") {
        return None;
    }

    let num_end = if line.ends_with(b"+}") {
        line.len() - 2
    } else {
        line.len() - 1
    };

    let num_str = std::str::from_utf8(&line[open + 1..num_end]).ok()?;
    if num_str.is_empty() {
        return None;
    }
    num_str.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_find_crlf() {
        assert_eq!(find_crlf(b"hello\r\n"), Some(5));
        assert_eq!(find_crlf(b"\r\n"), Some(0));
        assert_eq!(find_crlf(b"no newline"), None);
        assert_eq!(find_crlf(b"just\n"), None);
    }

    #[test]
    fn test_parse_literal_length() {
        assert_eq!(parse_literal_length(b"BODY {123}\r\n"), Some(123));
        assert_eq!(parse_literal_length(b"BODY {123+}\r\n"), Some(123));
        assert_eq!(parse_literal_length(b"{0}\r\n"), Some(0));
        assert_eq!(parse_literal_length(b"no literal\r\n"), None);
        assert_eq!(parse_literal_length(b"incomplete {123"), None);
        assert_eq!(parse_literal_length(b"wrong {abc}\r\n"), None);
    }

    #[test]
    fn test_complete_response_simple() {
        assert_eq!(
            complete_response_len(b"* OK ready\r\n").unwrap(),
            Some(12)
        );
        assert_eq!(complete_response_len(b"* OK partial").unwrap(), None);
    }

    #[test]
    fn test_complete_response_with_literal() {
        let full = b"* 1 FETCH (BODY {5}\r\nhello)\r\n";
        assert_eq!(complete_response_len(full).unwrap(), Some(full.len()));

        // Literal data not fully received yet
        assert_eq!(
            complete_response_len(b"* 1 FETCH (BODY {5}\r\nhel").unwrap(),
            None
        );
        // Literal received but closing line incomplete
        assert_eq!(
            complete_response_len(b"* 1 FETCH (BODY {5}\r\nhello)").unwrap(),
            None
        );
    }

    #[test]
    fn test_literal_size_limit() {
        let line = format!("* 1 FETCH (BODY {{{}}}\r\n", MAX_LITERAL_SIZE + 1);
        assert!(complete_response_len(line.as_bytes()).is_err());
    }

    #[tokio::test]
    async fn test_read_simple_line() {
        use tokio_test::io::Builder;

        let mock = Builder::new().read(b"* OK ready\r\n").build();
        let mut framed = FramedStream::new(mock);

        let response = framed.read_response().await.unwrap();
        assert_eq!(response, b"* OK ready\r\n");
    }

    #[tokio::test]
    async fn test_read_response_spanning_chunks() {
        use tokio_test::io::Builder;

        let mock = Builder::new()
            .read(b"* 1 FETCH (BODY {5}\r\n")
            .read(b"hello)\r\n* 2 EXISTS\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let first = framed.read_response().await.unwrap();
        assert_eq!(first, b"* 1 FETCH (BODY {5}\r\nhello)\r\n");

        // The trailing data stays buffered for the next call
        let second = framed.read_response().await.unwrap();
        assert_eq!(second, b"* 2 EXISTS\r\n");
    }

    #[tokio::test]
    async fn test_eof_is_error() {
        use tokio_test::io::Builder;

        let mock = Builder::new().read(b"").build();
        let mut framed = FramedStream::new(mock);
        assert!(framed.read_response().await.is_err());
    }

    #[tokio::test]
    async fn test_write_command() {
        use tokio_test::io::Builder;

        let mock = Builder::new().write(b"W0001 NOOP\r\n").build();
        let mut framed = FramedStream::new(mock);
        framed.write_command(b"W0001 NOOP\r\n").await.unwrap();
    }
}
