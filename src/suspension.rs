//! The suspension-style client (§4.5): the same operation set as
//! [`crate::client::TyrantClient`], expressed as plain `async fn`s that
//! `.await` the wire codec directly instead of building a [`crate::step`]
//! program for an actor to interpret.
//!
//! This is the direct Rust analogue of the source's generator-coroutine
//! driver: an `async fn` body already is the suspended-coroutine
//! representation the source has to hand-roll with generators and a
//! trampoline. The connection is held behind a mutex rather than owned by
//! a dedicated task, so callers serialise through the mutex guard instead
//! of through a command channel; both flavors call the same
//! `wire::frame`/`wire::decode` functions and are therefore byte-for-byte
//! identical on the wire.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;

use crate::adaptor::{Adaptor, TokioAdaptor};
use crate::error::Result;
use crate::protocol::op;
use crate::wire::{decode, frame};

/// A client that drives its connection directly, one `async fn` per
/// operation, serialised through a shared mutex rather than an actor task.
#[derive(Clone)]
pub struct SuspensionClient<A: Adaptor> {
    adaptor: Arc<Mutex<A>>,
    max_frame_len: u32,
}

impl SuspensionClient<TokioAdaptor> {
    /// Connect to `addr` with default framing limits.
    pub async fn connect(addr: impl tokio::net::ToSocketAddrs) -> Result<Self> {
        let stream = match tokio::net::TcpStream::connect(addr).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(error = %e, "suspension client: connect failed");
                return Err(e.into());
            }
        };
        stream.set_nodelay(true)?;
        tracing::debug!(peer = ?stream.peer_addr().ok(), "suspension client: connected");
        Ok(SuspensionClient {
            adaptor: Arc::new(Mutex::new(TokioAdaptor::new(stream))),
            max_frame_len: decode::DEFAULT_MAX_FRAME_LEN,
        })
    }
}

impl<A: Adaptor> SuspensionClient<A> {
    /// Wrap an already-connected adaptor. Used by tests and by callers
    /// supplying a non-default [`Adaptor`] (e.g. [`crate::adaptor::Buffered`]).
    pub fn from_adaptor(adaptor: A, max_frame_len: u32) -> Self {
        SuspensionClient {
            adaptor: Arc::new(Mutex::new(adaptor)),
            max_frame_len,
        }
    }

    pub async fn get(&self, key: impl AsRef<[u8]>) -> Result<Bytes> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t1(op::GET, key.as_ref())).await?;
        decode::success(&mut *a).await?;
        decode::string(&mut *a, self.max_frame_len).await
    }

    pub async fn put(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t2(op::PUT, key.as_ref(), value.as_ref()))
            .await?;
        decode::success(&mut *a).await
    }

    pub async fn putkeep(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t2(op::PUTKEEP, key.as_ref(), value.as_ref()))
            .await?;
        decode::success(&mut *a).await
    }

    pub async fn putcat(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t2(op::PUTCAT, key.as_ref(), value.as_ref()))
            .await?;
        decode::success(&mut *a).await
    }

    pub async fn putshl(
        &self,
        key: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
        width: u32,
    ) -> Result<()> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t2w(op::PUTSHL, key.as_ref(), value.as_ref(), width))
            .await?;
        decode::success(&mut *a).await
    }

    pub async fn putnr(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t2(op::PUTNR, key.as_ref(), value.as_ref()))
            .await?;
        Ok(())
    }

    pub async fn out(&self, key: impl AsRef<[u8]>) -> Result<()> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t1(op::OUT, key.as_ref())).await?;
        decode::success(&mut *a).await
    }

    pub async fn mget<K: AsRef<[u8]>>(
        &self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<Vec<(Bytes, Bytes)>> {
        let owned: Vec<Vec<u8>> = keys.into_iter().map(|k| k.as_ref().to_vec()).collect();
        let refs: Vec<&[u8]> = owned.iter().map(|k| k.as_slice()).collect();
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t_n(op::MGET, refs)).await?;
        decode::success(&mut *a).await?;
        decode::string_pair_list(&mut *a, self.max_frame_len).await
    }

    pub async fn vsiz(&self, key: impl AsRef<[u8]>) -> Result<u32> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t1(op::VSIZ, key.as_ref())).await?;
        decode::success(&mut *a).await?;
        decode::u32(&mut *a).await
    }

    pub async fn iterinit(&self) -> Result<()> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t0(op::ITERINIT)).await?;
        decode::success(&mut *a).await
    }

    pub async fn iternext(&self) -> Result<Bytes> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t0(op::ITERNEXT)).await?;
        decode::success(&mut *a).await?;
        decode::string(&mut *a, self.max_frame_len).await
    }

    pub async fn fwmkeys(&self, prefix: impl AsRef<[u8]>, max: u32) -> Result<Vec<Bytes>> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t1m(op::FWMKEYS, prefix.as_ref(), max))
            .await?;
        decode::success(&mut *a).await?;
        decode::string_list(&mut *a, self.max_frame_len).await
    }

    pub async fn addint(&self, key: impl AsRef<[u8]>, delta: i32) -> Result<i32> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t1m(op::ADDINT, key.as_ref(), delta as u32))
            .await?;
        decode::success(&mut *a).await?;
        Ok(decode::u32(&mut *a).await? as i32)
    }

    pub async fn adddouble(&self, key: impl AsRef<[u8]>, integ: u64, fract: u64) -> Result<f64> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t_double(op::ADDDOUBLE, key.as_ref(), integ, fract))
            .await?;
        decode::success(&mut *a).await?;
        decode::double(&mut *a).await
    }

    pub async fn ext(
        &self,
        func: impl AsRef<[u8]>,
        opts: u32,
        key: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> Result<Bytes> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t3f(op::EXT, func.as_ref(), opts, key.as_ref(), value.as_ref()))
            .await?;
        decode::success(&mut *a).await?;
        decode::string(&mut *a, self.max_frame_len).await
    }

    pub async fn sync(&self) -> Result<()> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t0(op::SYNC)).await?;
        decode::success(&mut *a).await
    }

    pub async fn vanish(&self) -> Result<()> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t0(op::VANISH)).await?;
        decode::success(&mut *a).await
    }

    pub async fn copy(&self, path: impl AsRef<[u8]>) -> Result<()> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t1(op::COPY, path.as_ref())).await?;
        decode::success(&mut *a).await
    }

    pub async fn restore(&self, path: impl AsRef<[u8]>, msec: u64) -> Result<()> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t1r(op::RESTORE, path.as_ref(), msec))
            .await?;
        decode::success(&mut *a).await
    }

    pub async fn setmst(&self, host: impl AsRef<[u8]>, port: u32) -> Result<()> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t1m(op::SETMST, host.as_ref(), port))
            .await?;
        decode::success(&mut *a).await
    }

    pub async fn rnum(&self) -> Result<u64> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t0(op::RNUM)).await?;
        decode::success(&mut *a).await?;
        decode::u64(&mut *a).await
    }

    pub async fn size(&self) -> Result<u64> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t0(op::SIZE)).await?;
        decode::success(&mut *a).await?;
        decode::u64(&mut *a).await
    }

    pub async fn stat(&self) -> Result<Bytes> {
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t0(op::STAT)).await?;
        decode::success(&mut *a).await?;
        decode::string(&mut *a, self.max_frame_len).await
    }

    pub async fn misc<Arg: AsRef<[u8]>>(
        &self,
        name: impl AsRef<[u8]>,
        opts: u32,
        args: impl IntoIterator<Item = Arg>,
    ) -> Result<Vec<Bytes>> {
        let owned: Vec<Vec<u8>> = args.into_iter().map(|a| a.as_ref().to_vec()).collect();
        let refs: Vec<&[u8]> = owned.iter().map(|a| a.as_slice()).collect();
        let mut a = self.adaptor.lock().await;
        a.write_frame(&frame::t1fn(op::MISC, name.as_ref(), opts, refs))
            .await?;
        decode::success(&mut *a).await?;
        decode::string_list(&mut *a, self.max_frame_len).await
    }
}
