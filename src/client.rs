//! The protocol client: one async method per server operation (§4.4),
//! each building a fixed request frame and step program and submitting it
//! to a [`crate::engine`] task.

use tokio::net::TcpStream;

use crate::adaptor::TokioAdaptor;
use crate::config::ClientConfig;
use crate::engine::{self, EngineHandle};
use crate::error::{ClientError, Result};
use crate::protocol::op;
use crate::step::Step;
use crate::value::Value;
use crate::wire::{frame, Frame};

/// An asynchronous client driving a single connection through the
/// step-program engine. Cheap to clone: clones share the same engine
/// handle and therefore the same underlying connection.
#[derive(Clone)]
pub struct TyrantClient {
    engine: EngineHandle,
    request_timeout: std::time::Duration,
    max_frame_len: u32,
}

/// Builder for [`TyrantClient`], mirroring the teacher lineage's own
/// connection builders.
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn new() -> Self {
        ClientBuilder {
            config: ClientConfig::default(),
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Connect to `addr` (e.g. `"127.0.0.1:1978"`) and spawn the engine
    /// task that will own the resulting socket.
    pub async fn connect(self, addr: impl tokio::net::ToSocketAddrs) -> Result<TyrantClient> {
        let connect = TcpStream::connect(addr);
        let stream = match tokio::time::timeout(self.config.connect_timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "client: connect failed");
                return Err(e.into());
            }
            Err(_) => {
                tracing::error!("client: connect timed out");
                return Err(ClientError::Timeout);
            }
        };
        if self.config.tcp_nodelay {
            stream.set_nodelay(true)?;
        }
        tracing::debug!(peer = ?stream.peer_addr().ok(), "client: connected");
        let adaptor = TokioAdaptor::new(stream);
        let engine = engine::spawn(adaptor, self.config.max_frame_len);
        Ok(TyrantClient {
            engine,
            request_timeout: self.config.request_timeout,
            max_frame_len: self.config.max_frame_len,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TyrantClient {
    /// Connect with default configuration.
    pub async fn connect(addr: impl tokio::net::ToSocketAddrs) -> Result<Self> {
        ClientBuilder::new().connect(addr).await
    }

    fn check_len(len: usize, what: &str) -> Result<()> {
        if len as u64 > u32::MAX as u64 {
            return Err(ClientError::Misuse(format!(
                "{what} length {len} does not fit in a u32 length field"
            )));
        }
        Ok(())
    }

    async fn submit(&self, frame: Frame, steps: Vec<Step>) -> Result<Value> {
        tracing::debug!("client: submit");
        let outcome = tokio::time::timeout(self.request_timeout, self.engine.submit(frame, steps))
            .await
            .map_err(|_| {
                tracing::error!("client: request timed out waiting for engine reply");
                ClientError::Timeout
            })?;
        match &outcome {
            Ok(_) => tracing::debug!("client: submit complete"),
            Err(e) => tracing::debug!(error = %e, "client: submit complete with error"),
        }
        outcome
    }

    /// Fetch the value stored under `key`.
    pub async fn get(&self, key: impl AsRef<[u8]>) -> Result<bytes::Bytes> {
        let key = key.as_ref();
        Self::check_len(key.len(), "key")?;
        self.submit(frame::t1(op::GET, key), vec![Step::DecodeSuccess, Step::DecodeString])
            .await?
            .into_bytes()
    }

    /// Store `value` under `key`, overwriting any existing value.
    pub async fn put(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        let (key, value) = (key.as_ref(), value.as_ref());
        Self::check_len(key.len(), "key")?;
        Self::check_len(value.len(), "value")?;
        self.submit(frame::t2(op::PUT, key, value), vec![Step::DecodeSuccess])
            .await?
            .into_unit()
    }

    /// Store `value` under `key` only if `key` does not already exist.
    pub async fn putkeep(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        let (key, value) = (key.as_ref(), value.as_ref());
        Self::check_len(key.len(), "key")?;
        Self::check_len(value.len(), "value")?;
        self.submit(frame::t2(op::PUTKEEP, key, value), vec![Step::DecodeSuccess])
            .await?
            .into_unit()
    }

    /// Append `value` to whatever is already stored under `key`.
    pub async fn putcat(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        let (key, value) = (key.as_ref(), value.as_ref());
        Self::check_len(key.len(), "key")?;
        Self::check_len(value.len(), "value")?;
        self.submit(frame::t2(op::PUTCAT, key, value), vec![Step::DecodeSuccess])
            .await?
            .into_unit()
    }

    /// Append `value` to `key`, keeping only the trailing `width` bytes.
    pub async fn putshl(
        &self,
        key: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
        width: u32,
    ) -> Result<()> {
        let (key, value) = (key.as_ref(), value.as_ref());
        Self::check_len(key.len(), "key")?;
        Self::check_len(value.len(), "value")?;
        self.submit(frame::t2w(op::PUTSHL, key, value, width), vec![Step::DecodeSuccess])
            .await?
            .into_unit()
    }

    /// Store `value` under `key` without waiting for a server reply; the
    /// protocol defines no response frame for this operation.
    pub async fn putnr(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        let (key, value) = (key.as_ref(), value.as_ref());
        Self::check_len(key.len(), "key")?;
        Self::check_len(value.len(), "value")?;
        self.submit(frame::t2(op::PUTNR, key, value), Vec::new())
            .await?
            .into_unit()
    }

    /// Remove `key`. Protocol error if it did not exist.
    pub async fn out(&self, key: impl AsRef<[u8]>) -> Result<()> {
        let key = key.as_ref();
        Self::check_len(key.len(), "key")?;
        self.submit(frame::t1(op::OUT, key), vec![Step::DecodeSuccess])
            .await?
            .into_unit()
    }

    /// Fetch every `(key, value)` pair present among `keys`. Keys absent
    /// on the server are silently omitted from the result.
    pub async fn mget<K: AsRef<[u8]>>(
        &self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<Vec<(bytes::Bytes, bytes::Bytes)>> {
        let owned: Vec<Vec<u8>> = keys.into_iter().map(|k| k.as_ref().to_vec()).collect();
        let refs: Vec<&[u8]> = owned.iter().map(|k| k.as_slice()).collect();
        self.submit(
            frame::t_n(op::MGET, refs),
            vec![Step::DecodeSuccess, Step::DecodeStringPairList],
        )
        .await?
        .into_pair_list()
    }

    /// Size in bytes of the value stored under `key`.
    pub async fn vsiz(&self, key: impl AsRef<[u8]>) -> Result<u32> {
        let key = key.as_ref();
        Self::check_len(key.len(), "key")?;
        self.submit(frame::t1(op::VSIZ, key), vec![Step::DecodeSuccess, Step::DecodeU32])
            .await?
            .into_u32()
    }

    /// Reset the server's key iterator to the first key.
    pub async fn iterinit(&self) -> Result<()> {
        self.submit(frame::t0(op::ITERINIT), vec![Step::DecodeSuccess])
            .await?
            .into_unit()
    }

    /// Advance the server's key iterator and return the next key.
    /// Protocol error once iteration is exhausted.
    pub async fn iternext(&self) -> Result<bytes::Bytes> {
        self.submit(
            frame::t0(op::ITERNEXT),
            vec![Step::DecodeSuccess, Step::DecodeString],
        )
        .await?
        .into_bytes()
    }

    /// Keys beginning with `prefix`, capped at `max` results.
    pub async fn fwmkeys(&self, prefix: impl AsRef<[u8]>, max: u32) -> Result<Vec<bytes::Bytes>> {
        let prefix = prefix.as_ref();
        Self::check_len(prefix.len(), "prefix")?;
        self.submit(
            frame::t1m(op::FWMKEYS, prefix, max),
            vec![Step::DecodeSuccess, Step::DecodeStringList],
        )
        .await?
        .into_list()
    }

    /// Add `delta` to the integer stored under `key`, returning the new
    /// value. Protocol error if the stored value is not numeric.
    pub async fn addint(&self, key: impl AsRef<[u8]>, delta: i32) -> Result<i32> {
        let key = key.as_ref();
        Self::check_len(key.len(), "key")?;
        let value = self
            .submit(
                frame::t1m(op::ADDINT, key, delta as u32),
                vec![Step::DecodeSuccess, Step::DecodeU32],
            )
            .await?
            .into_u32()?;
        Ok(value as i32)
    }

    /// Add a fractional `integ.fract` amount to the double stored under
    /// `key`, returning the new value.
    pub async fn adddouble(&self, key: impl AsRef<[u8]>, integ: u64, fract: u64) -> Result<f64> {
        let key = key.as_ref();
        Self::check_len(key.len(), "key")?;
        self.submit(
            frame::t_double(op::ADDDOUBLE, key, integ, fract),
            vec![Step::DecodeSuccess, Step::DecodeDouble],
        )
        .await?
        .into_double()
    }

    /// Invoke the server-side extension function `func` with `opts` and
    /// a `(key, value)` argument pair.
    pub async fn ext(
        &self,
        func: impl AsRef<[u8]>,
        opts: u32,
        key: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<bytes::Bytes> {
        let (func, key, value) = (func.as_ref(), key.as_ref(), value.as_ref());
        self.submit(
            frame::t3f(op::EXT, func, opts, key, value),
            vec![Step::DecodeSuccess, Step::DecodeString],
        )
        .await?
        .into_bytes()
    }

    /// Flush pending updates to disk.
    pub async fn sync(&self) -> Result<()> {
        self.submit(frame::t0(op::SYNC), vec![Step::DecodeSuccess])
            .await?
            .into_unit()
    }

    /// Remove every record.
    pub async fn vanish(&self) -> Result<()> {
        self.submit(frame::t0(op::VANISH), vec![Step::DecodeSuccess])
            .await?
            .into_unit()
    }

    /// Copy the database file to `path` on the server host.
    pub async fn copy(&self, path: impl AsRef<[u8]>) -> Result<()> {
        self.submit(frame::t1(op::COPY, path.as_ref()), vec![Step::DecodeSuccess])
            .await?
            .into_unit()
    }

    /// Restore the database from the update log at `path`, replaying
    /// entries up to `msec`.
    pub async fn restore(&self, path: impl AsRef<[u8]>, msec: u64) -> Result<()> {
        self.submit(
            frame::t1r(op::RESTORE, path.as_ref(), msec),
            vec![Step::DecodeSuccess],
        )
        .await?
        .into_unit()
    }

    /// Set the replication master at `host:port`.
    pub async fn setmst(&self, host: impl AsRef<[u8]>, port: u32) -> Result<()> {
        self.submit(
            frame::t1m(op::SETMST, host.as_ref(), port),
            vec![Step::DecodeSuccess],
        )
        .await?
        .into_unit()
    }

    /// Number of records currently stored.
    pub async fn rnum(&self) -> Result<u64> {
        self.submit(frame::t0(op::RNUM), vec![Step::DecodeSuccess, Step::DecodeU64])
            .await?
            .into_u64()
    }

    /// Total size of the database in bytes.
    pub async fn size(&self) -> Result<u64> {
        self.submit(frame::t0(op::SIZE), vec![Step::DecodeSuccess, Step::DecodeU64])
            .await?
            .into_u64()
    }

    /// Server status string (implementation-defined key/value report).
    pub async fn stat(&self) -> Result<bytes::Bytes> {
        self.submit(frame::t0(op::STAT), vec![Step::DecodeSuccess, Step::DecodeString])
            .await?
            .into_bytes()
    }

    /// Invoke a miscellaneous/extension-defined database function by name.
    pub async fn misc<A: AsRef<[u8]>>(
        &self,
        name: impl AsRef<[u8]>,
        opts: u32,
        args: impl IntoIterator<Item = A>,
    ) -> Result<Vec<bytes::Bytes>> {
        let owned: Vec<Vec<u8>> = args.into_iter().map(|a| a.as_ref().to_vec()).collect();
        let refs: Vec<&[u8]> = owned.iter().map(|a| a.as_slice()).collect();
        self.submit(
            frame::t1fn(op::MISC, name.as_ref(), opts, refs),
            vec![Step::DecodeSuccess, Step::DecodeStringList],
        )
        .await?
        .into_list()
    }

    pub fn max_frame_len(&self) -> u32 {
        self.max_frame_len
    }
}
