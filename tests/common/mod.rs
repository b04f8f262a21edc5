//! Shared scripted mock server used by the integration tests.
//!
//! The server accepts one connection and, for each entry in its script,
//! reads exactly the given number of request bytes (recording them) and
//! then writes back the given canned response bytes, in order. It knows
//! nothing about the wire format beyond byte counts: callers compute
//! `expected_request.len()` themselves from the same frame builders the
//! client uses, so a mismatch shows up as the read hanging rather than as
//! a silently wrong comparison.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// One exchange: the number of request bytes to read and record, and the
/// response bytes to send back once they've all arrived.
pub struct Exchange {
    pub request_len: usize,
    pub response: Vec<u8>,
}

impl Exchange {
    pub fn new(request_len: usize, response: impl Into<Vec<u8>>) -> Self {
        Exchange {
            request_len,
            response: response.into(),
        }
    }
}

/// Bind a listener on an ephemeral port and run `script` against the
/// first connection accepted. Returns the bound address plus a receiver
/// that yields every request's recorded bytes, in order.
pub async fn spawn_scripted_server(
    script: Vec<Exchange>,
) -> (std::net::SocketAddr, tokio::sync::mpsc::UnboundedReceiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        for exchange in script {
            let mut buf = vec![0u8; exchange.request_len];
            stream.read_exact(&mut buf).await.unwrap();
            tx.send(buf).unwrap();
            stream.write_all(&exchange.response).await.unwrap();
        }
    });

    (addr, rx)
}

/// Bind a listener that replies to `count` identical well-formed
/// exchanges with the same canned response, without recording any of
/// them — used for high-depth sequential chains where recording every
/// request would just be wasted allocation.
pub async fn spawn_repeating_server(
    request_len: usize,
    response: Vec<u8>,
    count: usize,
) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; request_len];
        for _ in 0..count {
            stream.read_exact(&mut buf).await.unwrap();
            stream.write_all(&response).await.unwrap();
        }
    });

    addr
}
