//! Fetching chains from peers
//!
//! [`ChainFetcher`] is the boundary chain sync talks to. The HTTP
//! implementation issues a plain `GET /chain` over a TCP stream and expects a
//! JSON [`ChainSnapshot`] back.

use crate::core::ChainSnapshot;
use async_trait::async_trait;
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Port assumed for peers registered without one
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Largest peer response read before the peer is treated as malformed
pub const MAX_CHAIN_RESPONSE_BYTES: u64 = 16 * 1024 * 1024;

/// Peer fetch errors
#[derive(Error, Debug)]
pub enum PeerError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Unexpected HTTP status {0}")]
    HttpStatus(u16),
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Source of peer chains. Implementations must not retry.
#[async_trait]
pub trait ChainFetcher: Send + Sync {
    async fn fetch_chain(&self, address: &str) -> Result<ChainSnapshot, PeerError>;
}

/// Fetches `/chain` from peers over HTTP/1.0
#[derive(Debug, Clone, Default)]
pub struct HttpChainFetcher;

impl HttpChainFetcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChainFetcher for HttpChainFetcher {
    async fn fetch_chain(&self, address: &str) -> Result<ChainSnapshot, PeerError> {
        let target = if address.rsplit_once(':').is_some() && !address.ends_with(']') {
            address.to_string()
        } else {
            format!("{}:{}", address, DEFAULT_HTTP_PORT)
        };

        let mut stream = TcpStream::connect(&target).await?;

        // HTTP/1.0 keeps the server from chunking the body
        let request = format!(
            "GET /chain HTTP/1.0\r\nHost: {}\r\nAccept: application/json\r\nConnection: close\r\n\r\n",
            address
        );
        stream.write_all(request.as_bytes()).await?;

        let response = read_capped(stream, MAX_CHAIN_RESPONSE_BYTES).await?;
        parse_chain_response(&response)
    }
}

/// Read to EOF, failing once more than `limit` bytes arrive
async fn read_capped<R: AsyncRead + Unpin>(reader: R, limit: u64) -> Result<Vec<u8>, PeerError> {
    let mut response = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut response)
        .await?;

    if response.len() as u64 > limit {
        return Err(PeerError::Malformed(format!(
            "response exceeds {} bytes",
            limit
        )));
    }

    Ok(response)
}

/// Split a raw HTTP response and decode its body as a chain snapshot
pub fn parse_chain_response(response: &[u8]) -> Result<ChainSnapshot, PeerError> {
    let header_end = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .ok_or_else(|| PeerError::Malformed("missing header terminator".to_string()))?;

    let head = std::str::from_utf8(&response[..header_end])
        .map_err(|_| PeerError::Malformed("non-UTF-8 headers".to_string()))?;
    let status_line = head.lines().next().unwrap_or_default();

    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| PeerError::Malformed(format!("bad status line {:?}", status_line)))?;

    if status != 200 {
        return Err(PeerError::HttpStatus(status));
    }

    let snapshot: ChainSnapshot = serde_json::from_slice(&response[header_end + 4..])?;

    if !snapshot.is_consistent() {
        return Err(PeerError::Malformed(format!(
            "advertised length {} but carried {} blocks",
            snapshot.length,
            snapshot.chain.len()
        )));
    }

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Block;
    use tokio::net::TcpListener;

    fn http_response(status: &str, body: &str) -> Vec<u8> {
        format!(
            "HTTP/1.0 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            status,
            body.len(),
            body
        )
        .into_bytes()
    }

    fn genesis_body() -> String {
        serde_json::to_string(&ChainSnapshot::new(vec![Block::genesis()])).unwrap()
    }

    #[test]
    fn test_parse_ok_response() {
        let snapshot = parse_chain_response(&http_response("200 OK", &genesis_body())).unwrap();
        assert_eq!(snapshot.length, 1);
        assert_eq!(snapshot.chain, vec![Block::genesis()]);
    }

    #[test]
    fn test_parse_rejects_bad_status() {
        let err = parse_chain_response(&http_response("503 Service Unavailable", "{}")).unwrap_err();
        assert!(matches!(err, PeerError::HttpStatus(503)));
    }

    #[test]
    fn test_parse_rejects_length_mismatch() {
        let body = r#"{"chain": [], "length": 3}"#;
        let err = parse_chain_response(&http_response("200 OK", body)).unwrap_err();
        assert!(matches!(err, PeerError::Malformed(_)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_chain_response(b"garbage"),
            Err(PeerError::Malformed(_))
        ));
        assert!(matches!(
            parse_chain_response(&http_response("200 OK", "not json")),
            Err(PeerError::SerializationError(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let n = socket.read(&mut buf).await.unwrap();
            assert!(buf[..n].starts_with(b"GET /chain HTTP/1.0\r\n"));
            socket
                .write_all(&http_response("200 OK", &genesis_body()))
                .await
                .unwrap();
        });

        let snapshot = HttpChainFetcher::new()
            .fetch_chain(&addr.to_string())
            .await
            .unwrap();
        assert_eq!(snapshot.length, 1);
    }

    #[tokio::test]
    async fn test_read_capped_limits_response_size() {
        let body = vec![b'x'; 64];

        let read = read_capped(&body[..], 64).await.unwrap();
        assert_eq!(read.len(), 64);

        let err = read_capped(&body[..], 63).await.unwrap_err();
        assert!(matches!(err, PeerError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_peer() {
        // Bind then drop to get a port nothing listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let result = HttpChainFetcher::new()
            .fetch_chain(&format!("127.0.0.1:{}", port))
            .await;
        assert!(matches!(result, Err(PeerError::IoError(_))));
    }
}
