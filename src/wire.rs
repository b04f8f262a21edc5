//! Binary codec for the Tyrant wire protocol: request frame builders and
//! response decoders.
//!
//! Frames are built as a [`Frame`] — an ordered list of byte segments — and
//! concatenated into a single buffer only at the [`crate::adaptor::Adaptor`]
//! boundary, per the "segment-list in, concatenated-bytes out" resolution of
//! the frame-assembly ambiguity in the source (some revisions pass
//! pre-joined buffers to `_write`, others pass a segment list; this crate
//! always builds segments and joins them exactly once, right before the
//! socket write).
//!
//! Decoders are plain `async fn`s generic over `AsyncRead`, so both the
//! step-program engine ([`crate::engine`]) and the suspension-style client
//! ([`crate::suspension`]) call the same functions and therefore produce
//! identical bytes on the wire and identical decoded values off it.

use bytes::{BufMut, Bytes, BytesMut};

use crate::adaptor::Adaptor;
use crate::error::{ClientError, Result};
use crate::protocol::MAGIC;

/// An outbound request, represented as the ordered segments that make it up.
///
/// Segments are concatenated into one buffer immediately before the socket
/// write; nothing upstream of that boundary ever sees a joined buffer.
#[derive(Debug, Clone, Default)]
pub struct Frame(Vec<Bytes>);

impl Frame {
    fn new() -> Self {
        Frame(Vec::new())
    }

    fn push(&mut self, segment: impl Into<Bytes>) {
        self.0.push(segment.into());
    }

    /// Concatenate all segments into a single contiguous buffer.
    pub fn concat(&self) -> BytesMut {
        let total: usize = self.0.iter().map(|s| s.len()).sum();
        let mut out = BytesMut::with_capacity(total);
        for seg in &self.0 {
            out.extend_from_slice(seg);
        }
        out
    }
}

/// Request frame builders, one per frame family in the protocol (§4.1).
pub mod frame {
    use super::*;

    /// `t0(code)`: header only.
    pub fn t0(code: u8) -> Frame {
        let mut f = Frame::new();
        f.push(Bytes::from_static(&[]));
        let mut head = BytesMut::with_capacity(2);
        head.put_u8(MAGIC);
        head.put_u8(code);
        f.0[0] = head.freeze();
        f
    }

    /// `t1(code, k)`: `u32 len(k)`, then `k`.
    pub fn t1(code: u8, key: &[u8]) -> Frame {
        let mut f = Frame::new();
        let mut head = BytesMut::with_capacity(6);
        head.put_u8(MAGIC);
        head.put_u8(code);
        head.put_u32(key.len() as u32);
        f.push(head.freeze());
        f.push(Bytes::copy_from_slice(key));
        f
    }

    /// `t1R(code, k, msec)`: `u32 len(k), u64 msec`, then `k`.
    pub fn t1r(code: u8, key: &[u8], msec: u64) -> Frame {
        let mut f = Frame::new();
        let mut head = BytesMut::with_capacity(14);
        head.put_u8(MAGIC);
        head.put_u8(code);
        head.put_u32(key.len() as u32);
        head.put_u64(msec);
        f.push(head.freeze());
        f.push(Bytes::copy_from_slice(key));
        f
    }

    /// `t1M(code, k, count)`: `u32 len(k), u32 count`, then `k`.
    pub fn t1m(code: u8, key: &[u8], count: u32) -> Frame {
        let mut f = Frame::new();
        let mut head = BytesMut::with_capacity(10);
        head.put_u8(MAGIC);
        head.put_u8(code);
        head.put_u32(key.len() as u32);
        head.put_u32(count);
        f.push(head.freeze());
        f.push(Bytes::copy_from_slice(key));
        f
    }

    /// `tN(code, keys)`: `u32 n`, then for each key: `u32 len(k), k`.
    pub fn t_n<'a>(code: u8, keys: impl IntoIterator<Item = &'a [u8]>) -> Frame {
        let mut f = Frame::new();
        let keys: Vec<&[u8]> = keys.into_iter().collect();
        let mut head = BytesMut::with_capacity(6);
        head.put_u8(MAGIC);
        head.put_u8(code);
        head.put_u32(keys.len() as u32);
        f.push(head.freeze());
        for k in keys {
            let mut len_hdr = BytesMut::with_capacity(4);
            len_hdr.put_u32(k.len() as u32);
            f.push(len_hdr.freeze());
            f.push(Bytes::copy_from_slice(k));
        }
        f
    }

    /// `t2(code, k, v)`: `u32 len(k), u32 len(v)`, then `k`, then `v`.
    pub fn t2(code: u8, key: &[u8], value: &[u8]) -> Frame {
        let mut f = Frame::new();
        let mut head = BytesMut::with_capacity(10);
        head.put_u8(MAGIC);
        head.put_u8(code);
        head.put_u32(key.len() as u32);
        head.put_u32(value.len() as u32);
        f.push(head.freeze());
        f.push(Bytes::copy_from_slice(key));
        f.push(Bytes::copy_from_slice(value));
        f
    }

    /// `t2W(code, k, v, width)`: `u32 len(k), u32 len(v), u32 width`, then
    /// `k`, then `v`.
    pub fn t2w(code: u8, key: &[u8], value: &[u8], width: u32) -> Frame {
        let mut f = Frame::new();
        let mut head = BytesMut::with_capacity(14);
        head.put_u8(MAGIC);
        head.put_u8(code);
        head.put_u32(key.len() as u32);
        head.put_u32(value.len() as u32);
        head.put_u32(width);
        f.push(head.freeze());
        f.push(Bytes::copy_from_slice(key));
        f.push(Bytes::copy_from_slice(value));
        f
    }

    /// `t1FN(code, func, opts, args)`: `u32 len(func), u32 opts, u32 n`,
    /// `func`, then for each arg: `u32 len, arg`.
    pub fn t1fn<'a>(
        code: u8,
        func: &[u8],
        opts: u32,
        args: impl IntoIterator<Item = &'a [u8]>,
    ) -> Frame {
        let mut f = Frame::new();
        let args: Vec<&[u8]> = args.into_iter().collect();
        let mut head = BytesMut::with_capacity(14);
        head.put_u8(MAGIC);
        head.put_u8(code);
        head.put_u32(func.len() as u32);
        head.put_u32(opts);
        head.put_u32(args.len() as u32);
        f.push(head.freeze());
        f.push(Bytes::copy_from_slice(func));
        for a in args {
            let mut len_hdr = BytesMut::with_capacity(4);
            len_hdr.put_u32(a.len() as u32);
            f.push(len_hdr.freeze());
            f.push(Bytes::copy_from_slice(a));
        }
        f
    }

    /// `t3F(code, func, opts, k, v)`: `u32 len(func), u32 opts, u32 len(k),
    /// u32 len(v)`, `func, k, v`.
    pub fn t3f(code: u8, func: &[u8], opts: u32, key: &[u8], value: &[u8]) -> Frame {
        let mut f = Frame::new();
        let mut head = BytesMut::with_capacity(18);
        head.put_u8(MAGIC);
        head.put_u8(code);
        head.put_u32(func.len() as u32);
        head.put_u32(opts);
        head.put_u32(key.len() as u32);
        head.put_u32(value.len() as u32);
        f.push(head.freeze());
        f.push(Bytes::copy_from_slice(func));
        f.push(Bytes::copy_from_slice(key));
        f.push(Bytes::copy_from_slice(value));
        f
    }

    /// `tDouble(code, k, integ, fract)`: `u32 len(k), u64 integ, u64 fract`,
    /// then `k`.
    pub fn t_double(code: u8, key: &[u8], integ: u64, fract: u64) -> Frame {
        let mut f = Frame::new();
        let mut head = BytesMut::with_capacity(22);
        head.put_u8(MAGIC);
        head.put_u8(code);
        head.put_u32(key.len() as u32);
        head.put_u64(integ);
        head.put_u64(fract);
        f.push(head.freeze());
        f.push(Bytes::copy_from_slice(key));
        f
    }
}

/// Response decoders. Each consumes exactly the advertised number of bytes
/// from `r`, never less — a short read blocks (awaits more bytes) rather
/// than returning a truncated value.
pub mod decode {
    use super::*;

    /// Default cap on any length field the server sends us. A length past
    /// this is treated as a framing error rather than an attempt to read
    /// gigabytes into memory because of a corrupted response.
    pub const DEFAULT_MAX_FRAME_LEN: u32 = 64 * 1024 * 1024;

    /// Status byte. `Ok(())` on success; `Err(Protocol)` carrying the
    /// nonzero status otherwise.
    pub async fn success<A: Adaptor + ?Sized>(a: &mut A) -> Result<()> {
        let buf = a.read_exact(1).await?;
        let status = buf[0];
        if status == 0 {
            Ok(())
        } else {
            Err(ClientError::Protocol { status })
        }
    }

    /// A raw big-endian `u32`.
    pub async fn u32<A: Adaptor + ?Sized>(a: &mut A) -> Result<u32> {
        let buf = a.read_exact(4).await?;
        Ok(u32::from_be_bytes(buf.try_into().unwrap()))
    }

    /// A raw big-endian `u64`.
    pub async fn u64<A: Adaptor + ?Sized>(a: &mut A) -> Result<u64> {
        let buf = a.read_exact(8).await?;
        Ok(u64::from_be_bytes(buf.try_into().unwrap()))
    }

    /// A length-checked `u32`, used as a length prefix ahead of a payload.
    async fn checked_len<A: Adaptor + ?Sized>(a: &mut A, max_frame_len: u32) -> Result<usize> {
        let len = u32(a).await?;
        if len > max_frame_len {
            return Err(ClientError::Framing(format!(
                "length field {len} exceeds max_frame_len {max_frame_len}"
            )));
        }
        Ok(len as usize)
    }

    /// A length-prefixed byte string.
    pub async fn string<A: Adaptor + ?Sized>(a: &mut A, max_frame_len: u32) -> Result<Bytes> {
        let len = checked_len(a, max_frame_len).await?;
        let buf = a.read_exact(len).await?;
        Ok(Bytes::from(buf))
    }

    /// A length-prefixed key/value pair.
    pub async fn string_pair<A: Adaptor + ?Sized>(
        a: &mut A,
        max_frame_len: u32,
    ) -> Result<(Bytes, Bytes)> {
        let klen = checked_len(a, max_frame_len).await?;
        let vlen = checked_len(a, max_frame_len).await?;
        let k = a.read_exact(klen).await?;
        let v = a.read_exact(vlen).await?;
        Ok((Bytes::from(k), Bytes::from(v)))
    }

    /// An 8-byte integer part + 8-byte fractional part packed double:
    /// `value = integer + fractional * 1e-12`.
    pub async fn double<A: Adaptor + ?Sized>(a: &mut A) -> Result<f64> {
        let integ = u64(a).await?;
        let fract = u64(a).await?;
        Ok(integ as f64 + (fract as f64) * 1e-12)
    }

    /// A count-prefixed list of length-prefixed strings.
    pub async fn string_list<A: Adaptor + ?Sized>(
        a: &mut A,
        max_frame_len: u32,
    ) -> Result<Vec<Bytes>> {
        let count = checked_len(a, max_frame_len).await?;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(string(a, max_frame_len).await?);
        }
        Ok(out)
    }

    /// A count-prefixed list of key/value pairs (used by `mget`).
    pub async fn string_pair_list<A: Adaptor + ?Sized>(
        a: &mut A,
        max_frame_len: u32,
    ) -> Result<Vec<(Bytes, Bytes)>> {
        let count = checked_len(a, max_frame_len).await?;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(string_pair(a, max_frame_len).await?);
        }
        Ok(out)
    }
}
