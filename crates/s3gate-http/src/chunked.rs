//! AWS chunked upload decoding.
//!
//! Streaming SigV4 uploads (`x-amz-content-sha256: STREAMING-...` or
//! `Content-Encoding: aws-chunked`) wrap the payload in their own framing:
//!
//! ```text
//! <hex-size>;chunk-signature=<sig>\r\n
//! <data>\r\n
//! 0;chunk-signature=<sig>\r\n
//! [<trailer-name>:<value>\r\n ...]
//! \r\n
//! ```
//!
//! [`ChunkDecoder`] reads that framing lazily from the transport body, one
//! chunk at a time. Bodies that are not aws-chunked are passed through frame
//! by frame and terminated by a single empty final chunk, so callers handle
//! both the same way.

use bytes::{Buf, Bytes, BytesMut};
use http::HeaderMap;
use http_body::Body;
use http_body_util::BodyExt;
use s3gate_model::{S3Error, S3ErrorCode};
use tracing::debug;

/// Longest accepted chunk header or trailer line, CRLF excluded.
pub const MAX_CHUNK_META: usize = 1024;

const SIGNATURE_EXT: &str = "chunk-signature=";

/// One decoded payload chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    /// Payload bytes, empty for the final chunk.
    pub data: Bytes,
    /// True for the zero-length terminating chunk.
    pub is_final: bool,
    /// The `chunk-signature` extension, when present. Not verified.
    pub signature: Option<String>,
}

/// Chunk decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkError {
    /// The body ended, or the transport failed, in the middle of a chunk.
    #[error("request body ended before the final chunk")]
    Incomplete,
    /// The chunk framing is malformed.
    #[error("malformed aws-chunked body: {0}")]
    Format(String),
}

impl From<ChunkError> for S3Error {
    fn from(err: ChunkError) -> Self {
        let code = match err {
            ChunkError::Incomplete => S3ErrorCode::IncompleteBody,
            ChunkError::Format(_) => S3ErrorCode::InvalidRequest,
        };
        S3Error::with_message(code, err.to_string()).with_source(err)
    }
}

/// Return `true` if the request body uses AWS chunked framing.
///
/// Detection checks:
/// - `Content-Encoding` header contains `aws-chunked`, OR
/// - `x-amz-content-sha256` starts with `STREAMING-`
#[must_use]
pub fn is_aws_chunked(headers: &HeaderMap) -> bool {
    let encoded = headers
        .get_all(http::header::CONTENT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.split(',').any(|e| e.trim().eq_ignore_ascii_case("aws-chunked")));
    encoded
        || headers
            .get("x-amz-content-sha256")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("STREAMING-"))
}

/// Decode a fully buffered aws-chunked body into the raw payload.
///
/// # Errors
///
/// [`ChunkError::Incomplete`] when the final chunk is missing,
/// [`ChunkError::Format`] for malformed framing.
pub fn decode_aws_chunked(body: &[u8]) -> Result<Bytes, ChunkError> {
    let mut buf = BytesMut::from(body);
    let mut output = BytesMut::with_capacity(body.len());
    loop {
        match try_parse(&mut buf, true)? {
            Some(chunk) if chunk.is_final => return Ok(output.freeze()),
            Some(chunk) => output.extend_from_slice(&chunk.data),
            None => return Err(ChunkError::Incomplete),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Aws,
    Passthrough,
    Done,
}

/// Lazy, forward-only reader of payload chunks.
///
/// Ends with exactly one chunk whose `is_final` is set; every later call to
/// [`next_chunk`](Self::next_chunk) returns `Ok(None)`.
#[derive(Debug)]
pub struct ChunkDecoder<B> {
    body: B,
    mode: Mode,
    buf: BytesMut,
    eof: bool,
}

impl<B> ChunkDecoder<B>
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: std::fmt::Display,
{
    /// Wrap a body. `aws_chunked` selects framing decode over passthrough.
    pub fn new(body: B, aws_chunked: bool) -> Self {
        Self {
            body,
            mode: if aws_chunked { Mode::Aws } else { Mode::Passthrough },
            buf: BytesMut::new(),
            eof: false,
        }
    }

    /// Read the next chunk.
    ///
    /// # Errors
    ///
    /// [`ChunkError::Incomplete`] when the body stops mid-chunk or the
    /// transport fails, [`ChunkError::Format`] for malformed framing.
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>, ChunkError> {
        match self.mode {
            Mode::Done => Ok(None),
            Mode::Passthrough => self.next_passthrough().await,
            Mode::Aws => loop {
                if let Some(chunk) = try_parse(&mut self.buf, self.eof)? {
                    if chunk.is_final {
                        self.mode = Mode::Done;
                    }
                    return Ok(Some(chunk));
                }
                if self.eof {
                    return Err(ChunkError::Incomplete);
                }
                match self.read_frame().await? {
                    Some(data) => self.buf.extend_from_slice(&data),
                    None => self.eof = true,
                }
            },
        }
    }

    /// Drain the remaining chunks into one buffer.
    ///
    /// # Errors
    ///
    /// Same as [`next_chunk`](Self::next_chunk).
    pub async fn collect(mut self) -> Result<Bytes, ChunkError> {
        let mut output = BytesMut::new();
        while let Some(chunk) = self.next_chunk().await? {
            output.extend_from_slice(&chunk.data);
        }
        Ok(output.freeze())
    }

    async fn next_passthrough(&mut self) -> Result<Option<Chunk>, ChunkError> {
        loop {
            match self.read_frame().await? {
                Some(data) if data.is_empty() => {}
                Some(data) => {
                    return Ok(Some(Chunk {
                        data,
                        is_final: false,
                        signature: None,
                    }));
                }
                None => {
                    self.mode = Mode::Done;
                    return Ok(Some(Chunk {
                        is_final: true,
                        ..Chunk::default()
                    }));
                }
            }
        }
    }

    /// Next data frame; trailer frames are skipped.
    async fn read_frame(&mut self) -> Result<Option<Bytes>, ChunkError> {
        loop {
            match self.body.frame().await {
                None => return Ok(None),
                Some(Err(e)) => {
                    debug!(error = %e, "request body transport error");
                    self.mode = Mode::Done;
                    return Err(ChunkError::Incomplete);
                }
                Some(Ok(frame)) => {
                    if let Ok(data) = frame.into_data() {
                        return Ok(Some(data));
                    }
                }
            }
        }
    }
}

/// Parse one chunk from the front of `buf`.
///
/// Nothing is consumed until a whole chunk is available. Returns `Ok(None)`
/// when more input is needed; with `at_eof` set a short buffer is an error
/// instead, except for trailers after the final chunk, which may end with the
/// body.
fn try_parse(buf: &mut BytesMut, at_eof: bool) -> Result<Option<Chunk>, ChunkError> {
    let Some(line_end) = find_crlf(buf, 0) else {
        if buf.len() > MAX_CHUNK_META {
            return Err(ChunkError::Format("chunk header too long".to_owned()));
        }
        return if at_eof {
            Err(ChunkError::Incomplete)
        } else {
            Ok(None)
        };
    };
    if line_end > MAX_CHUNK_META {
        return Err(ChunkError::Format("chunk header too long".to_owned()));
    }

    let (size, signature) = parse_header(&buf[..line_end])?;
    let data_start = line_end + 2;

    if size == 0 {
        let Some(consumed) = scan_trailers(&buf[data_start..], at_eof)? else {
            return Ok(None);
        };
        buf.advance(data_start + consumed);
        return Ok(Some(Chunk {
            data: Bytes::new(),
            is_final: true,
            signature,
        }));
    }

    let frame_end = data_start
        .checked_add(size)
        .and_then(|end| end.checked_add(2))
        .ok_or_else(|| ChunkError::Format("chunk size overflow".to_owned()))?;
    let data_end = frame_end - 2;
    if buf.len() < frame_end {
        return if at_eof {
            Err(ChunkError::Incomplete)
        } else {
            Ok(None)
        };
    }
    if &buf[data_end..frame_end] != b"\r\n" {
        return Err(ChunkError::Format("missing CRLF after chunk data".to_owned()));
    }

    buf.advance(data_start);
    let data = buf.split_to(size).freeze();
    buf.advance(2);
    Ok(Some(Chunk {
        data,
        is_final: false,
        signature,
    }))
}

/// Parse `<hex-size>[;ext=value]*`.
fn parse_header(line: &[u8]) -> Result<(usize, Option<String>), ChunkError> {
    let line = std::str::from_utf8(line)
        .map_err(|_| ChunkError::Format("chunk header is not UTF-8".to_owned()))?;
    let mut parts = line.split(';');
    let hex = parts.next().unwrap_or_default().trim();
    let size = usize::from_str_radix(hex, 16)
        .map_err(|_| ChunkError::Format(format!("invalid chunk size '{hex}'")))?;
    let signature = parts
        .find_map(|ext| ext.trim().strip_prefix(SIGNATURE_EXT))
        .map(str::to_owned);
    Ok((size, signature))
}

/// Length of the trailer section after the final chunk header, including
/// the terminating blank line.
fn scan_trailers(rest: &[u8], at_eof: bool) -> Result<Option<usize>, ChunkError> {
    let mut pos = 0;
    loop {
        match find_crlf(rest, pos) {
            Some(end) if end == pos => return Ok(Some(end + 2)),
            Some(end) if end - pos > MAX_CHUNK_META => {
                return Err(ChunkError::Format("trailer line too long".to_owned()));
            }
            Some(end) => pos = end + 2,
            None if at_eof => return Ok(Some(rest.len())),
            None if rest.len() - pos > MAX_CHUNK_META => {
                return Err(ChunkError::Format("trailer line too long".to_owned()));
            }
            None => return Ok(None),
        }
    }
}

/// Find the position of the next `\r\n` starting from `start`.
fn find_crlf(data: &[u8], start: usize) -> Option<usize> {
    if data.len() < start + 2 {
        return None;
    }
    data[start..]
        .windows(2)
        .position(|w| w == b"\r\n")
        .map(|p| start + p)
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use http_body::Frame;
    use http_body_util::{Full, StreamBody};

    use super::*;

    fn encode(chunks: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            out.extend_from_slice(format!("{:x};chunk-signature=sig{i}\r\n", chunk.len()).as_bytes());
            out.extend_from_slice(chunk);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"0;chunk-signature=final\r\n\r\n");
        out
    }

    fn split_body(data: &[u8], at: usize) -> StreamBody<futures::stream::Iter<std::vec::IntoIter<Result<Frame<Bytes>, Infallible>>>> {
        let frames: Vec<Result<Frame<Bytes>, Infallible>> = data
            .chunks(at)
            .map(|c| Ok(Frame::data(Bytes::copy_from_slice(c))))
            .collect();
        StreamBody::new(futures::stream::iter(frames))
    }

    async fn drain<B>(mut decoder: ChunkDecoder<B>) -> Result<Vec<Chunk>, ChunkError>
    where
        B: Body<Data = Bytes> + Unpin,
        B::Error: std::fmt::Display,
    {
        let mut out = Vec::new();
        while let Some(chunk) = decoder.next_chunk().await? {
            out.push(chunk);
        }
        assert_eq!(decoder.next_chunk().await, Ok(None));
        Ok(out)
    }

    #[test]
    fn test_should_detect_aws_chunked_requests() {
        let mut headers = HeaderMap::new();
        assert!(!is_aws_chunked(&headers));
        headers.insert("x-amz-content-sha256", "UNSIGNED-PAYLOAD".parse().unwrap());
        assert!(!is_aws_chunked(&headers));
        headers.insert("x-amz-content-sha256", "STREAMING-AWS4-HMAC-SHA256-PAYLOAD".parse().unwrap());
        assert!(is_aws_chunked(&headers));

        let mut headers = HeaderMap::new();
        headers.insert(http::header::CONTENT_ENCODING, "gzip, aws-chunked".parse().unwrap());
        assert!(is_aws_chunked(&headers));
    }

    #[test]
    fn test_should_decode_buffered_body() {
        let body = encode(&[b"hello", b" world"]);
        assert_eq!(decode_aws_chunked(&body).unwrap().as_ref(), b"hello world");
        assert_eq!(decode_aws_chunked(b"3\r\nabc\r\n0\r\n\r\n").unwrap().as_ref(), b"abc");
    }

    #[test]
    fn test_should_report_truncation_and_bad_framing() {
        assert_eq!(decode_aws_chunked(b"10;chunk-signature=abc\r\nshort\r\n"), Err(ChunkError::Incomplete));
        assert_eq!(decode_aws_chunked(b"5;chunk-signature=abc"), Err(ChunkError::Incomplete));
        assert!(matches!(decode_aws_chunked(b"zz\r\nabc\r\n"), Err(ChunkError::Format(_))));
        assert!(matches!(decode_aws_chunked(b"3\r\nabcXX0\r\n\r\n"), Err(ChunkError::Format(_))));

        let long = vec![b'a'; MAX_CHUNK_META + 10];
        assert!(matches!(decode_aws_chunked(&long), Err(ChunkError::Format(_))));
    }

    #[test]
    fn test_should_reject_chunk_size_near_usize_max() {
        assert!(matches!(decode_aws_chunked(b"ffffffffffffffed\r\nX"), Err(ChunkError::Format(_))));
        assert!(matches!(
            decode_aws_chunked(b"ffffffffffffffff;chunk-signature=abc\r\nX"),
            Err(ChunkError::Format(_))
        ));
    }

    #[test]
    fn test_should_consume_trailers_after_final_chunk() {
        let body = b"3\r\nabc\r\n0\r\nx-amz-checksum-crc32:AAAAAA==\r\n\r\n";
        assert_eq!(decode_aws_chunked(body).unwrap().as_ref(), b"abc");
        // Trailers may end with the body.
        assert_eq!(decode_aws_chunked(b"0\r\n").unwrap().len(), 0);
    }

    #[test]
    fn test_should_map_errors_to_s3_codes() {
        let err: S3Error = ChunkError::Incomplete.into();
        assert_eq!(err.code, S3ErrorCode::IncompleteBody);
        let err: S3Error = ChunkError::Format("x".to_owned()).into();
        assert_eq!(err.code, S3ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn test_should_round_trip_chunks_with_exactly_one_final() {
        let payloads: [&[u8]; 3] = [b"hello", b"", b"chunked world"];
        let encoded = encode(&[payloads[0], payloads[2]]);
        for split in [1, 3, 7, encoded.len()] {
            let chunks = drain(ChunkDecoder::new(split_body(&encoded, split), true)).await.unwrap();
            assert_eq!(chunks.iter().filter(|c| c.is_final).count(), 1);
            assert!(chunks.last().unwrap().is_final);
            assert_eq!(chunks[0].data.as_ref(), payloads[0]);
            assert_eq!(chunks[0].signature.as_deref(), Some("sig0"));
            assert_eq!(chunks[1].data.as_ref(), payloads[2]);
            assert_eq!(chunks[2].signature.as_deref(), Some("final"));
        }
    }

    #[tokio::test]
    async fn test_should_fail_when_stream_closes_mid_chunk() {
        let decoder = ChunkDecoder::new(Full::new(Bytes::from_static(b"a;chunk-signature=s\r\nabc")), true);
        assert_eq!(drain(decoder).await, Err(ChunkError::Incomplete));
    }

    #[tokio::test]
    async fn test_should_pass_plain_bodies_through() {
        let chunks = drain(ChunkDecoder::new(split_body(b"plain body", 4), false)).await.unwrap();
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].data.as_ref(), b"plai");
        assert!(chunks[..3].iter().all(|c| !c.is_final));
        assert_eq!(chunks[3], Chunk { is_final: true, ..Chunk::default() });
    }

    #[tokio::test]
    async fn test_should_collect_chunks() {
        let encoded = encode(&[b"abc", b"def"]);
        let decoder = ChunkDecoder::new(Full::new(Bytes::from(encoded)), true);
        assert_eq!(decoder.collect().await.unwrap().as_ref(), b"abcdef");
    }
}
