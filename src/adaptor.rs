//! The transport adaptor contract (§6).
//!
//! The distilled spec treats the event loop / socket transport as an
//! external collaborator and specifies only the contract the engine
//! consumes: non-blocking `read`/`write` plus an `is_waiting()` flag and a
//! `schedule(fn)` deferred-callback facility. [`Adaptor`] is that contract,
//! expressed as an `async_trait` capability set (per the "adaptor
//! polymorphism" design note: compose, don't inherit).
//!
//! [`TokioAdaptor`] is the default, continuous-stream implementation, used
//! by every client in this crate against a real `TcpStream`. [`Buffered`]
//! is the read-buffering helper (§4.2): it adapts a transport that can only
//! deliver arbitrary-size chunks — rather than fulfilling an exact-length
//! read in one shot — into the same `Adaptor` contract, by accumulating
//! chunks until the requested length is reached.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::wire::Frame;

/// Non-blocking transport contract consumed by the step-program engine and
/// the suspension-style client.
#[async_trait]
pub trait Adaptor: Send {
    /// Request exactly `n` bytes; resolves once they have all arrived.
    async fn read_exact(&mut self, n: usize) -> io::Result<Vec<u8>>;

    /// Concatenate `frame`'s segments and write them as a single buffer;
    /// resolves once everything has been flushed.
    async fn write_frame(&mut self, frame: &Frame) -> io::Result<()>;

    /// True while a read or write is outstanding. Tracked for observability
    /// (logged by the engine); since `.await` is itself the suspension
    /// point, nothing polls this flag to decide whether to keep scheduling.
    fn is_waiting(&self) -> bool;
}

/// Defer `fut` to run on the runtime's own schedule rather than inline on
/// the caller's stack — the transcription of the source's `schedule(fn)`.
/// Used by the engine when draining a backlog of already-queued commands
/// after the connection has been tainted, so failing a long backlog doesn't
/// run as one synchronous call stack.
pub fn schedule<F>(fut: F)
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(fut);
}

/// Default adaptor: a Tokio `TcpStream` that already exposes exact-length
/// reads and whole-buffer writes, so no buffering helper is needed.
pub struct TokioAdaptor {
    stream: TcpStream,
    waiting: AtomicBool,
}

impl TokioAdaptor {
    pub fn new(stream: TcpStream) -> Self {
        TokioAdaptor {
            stream,
            waiting: AtomicBool::new(false),
        }
    }

    pub fn set_nodelay(&self, nodelay: bool) -> io::Result<()> {
        self.stream.set_nodelay(nodelay)
    }
}

#[async_trait]
impl Adaptor for TokioAdaptor {
    async fn read_exact(&mut self, n: usize) -> io::Result<Vec<u8>> {
        self.waiting.store(true, Ordering::SeqCst);
        let mut buf = vec![0u8; n];
        let result = self.stream.read_exact(&mut buf).await;
        self.waiting.store(false, Ordering::SeqCst);
        result.map(|_| buf)
    }

    async fn write_frame(&mut self, frame: &Frame) -> io::Result<()> {
        self.waiting.store(true, Ordering::SeqCst);
        let buf = frame.concat();
        let result = self.stream.write_all(&buf).await;
        self.waiting.store(false, Ordering::SeqCst);
        result
    }

    fn is_waiting(&self) -> bool {
        self.waiting.load(Ordering::SeqCst)
    }
}

/// A source of arbitrary-size inbound chunks and a sink for outbound bytes,
/// for transports that cannot hand back exactly the length asked for.
#[async_trait]
pub trait ChunkSource: Send {
    /// Yields the next available chunk, or `Ok(None)` at end of stream.
    async fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>>;
    /// Writes a full buffer out.
    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;
}

/// The read-buffering helper (§4.2): accumulates chunks from a
/// [`ChunkSource`] until a requested length is reached, then splits off
/// exactly that many bytes and retains any remainder for the next read.
pub struct Buffered<S> {
    source: S,
    carry_over: BytesMut,
    waiting: AtomicBool,
}

impl<S: ChunkSource> Buffered<S> {
    pub fn new(source: S) -> Self {
        Buffered {
            source,
            carry_over: BytesMut::new(),
            waiting: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl<S: ChunkSource> Adaptor for Buffered<S> {
    async fn read_exact(&mut self, n: usize) -> io::Result<Vec<u8>> {
        self.waiting.store(true, Ordering::SeqCst);
        while self.carry_over.len() < n {
            match self.source.next_chunk().await? {
                Some(chunk) => self.carry_over.extend_from_slice(&chunk),
                None => {
                    self.waiting.store(false, Ordering::SeqCst);
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "chunk source ended before the requested length was reached",
                    ));
                }
            }
        }
        let result = self.carry_over.split_to(n);
        self.waiting.store(false, Ordering::SeqCst);
        Ok(result.to_vec())
    }

    async fn write_frame(&mut self, frame: &Frame) -> io::Result<()> {
        self.waiting.store(true, Ordering::SeqCst);
        let buf = frame.concat();
        let result = self.source.write_all(&buf).await;
        self.waiting.store(false, Ordering::SeqCst);
        result
    }

    fn is_waiting(&self) -> bool {
        self.waiting.load(Ordering::SeqCst)
    }
}

/// Blanket helper used by tests and the suspension client: wraps a raw
/// `Arc<tokio::sync::Mutex<dyn Adaptor>>`-free direct use of an `Adaptor` so
/// call sites can hold one behind a mutex without extra trait objects.
pub type SharedAdaptor<A> = Arc<tokio::sync::Mutex<A>>;
