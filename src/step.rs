//! The step program: the statically-typed transcription of the source's
//! runtime-dispatched step list.
//!
//! The source represents a step as either a bare callable or a
//! `(callable, args)` tuple, inspected at runtime, with a separate
//! "use-result" flag that splices the previous step's result into the next
//! step's argument list — needed there because a decode like "string" has to
//! be expressed as two separately-queued steps (`_len` then `read`) linked by
//! that flag. In Rust, a decode that needs a nested read (read a length, then
//! read that many bytes) is just sequential `.await`s inside one step's
//! executor, so the flag itself has no transcription; what remains is the
//! tagged-variant `Step` the design notes call for.

use crate::adaptor::Adaptor;
use crate::error::Result;
use crate::value::Value;
use crate::wire::decode;

/// One decode primitive to run, in order, after a command's request frame
/// has already been written.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Read the 1-byte status code; fail the whole program on a nonzero
    /// status. Produces [`Value::Unit`].
    DecodeSuccess,
    /// Read a raw big-endian `u32`.
    DecodeU32,
    /// Read a raw big-endian `u64`.
    DecodeU64,
    /// Read a length-prefixed byte string.
    DecodeString,
    /// Read a length-prefixed key/value pair.
    DecodeStringPair,
    /// Read a packed integer+fractional double.
    DecodeDouble,
    /// Read a count-prefixed list of length-prefixed strings.
    DecodeStringList,
    /// Read a count-prefixed list of key/value pairs.
    DecodeStringPairList,
}

/// A fixed sequence of steps implementing one client operation's response
/// decoding. Built once per call by a [`crate::client`] method.
pub type Program = Vec<Step>;

/// Run a single step against `r`, producing the `Value` it decodes.
///
/// `max_frame_len` bounds any length field the step reads, per the framing
/// rule in §4.1: a length past this bound is a framing error, not an
/// invitation to allocate an attacker- or corruption-controlled buffer.
pub async fn execute<A: Adaptor + ?Sized>(
    step: Step,
    a: &mut A,
    max_frame_len: u32,
) -> Result<Value> {
    Ok(match step {
        Step::DecodeSuccess => {
            decode::success(a).await?;
            Value::Unit
        }
        Step::DecodeU32 => Value::U32(decode::u32(a).await?),
        Step::DecodeU64 => Value::U64(decode::u64(a).await?),
        Step::DecodeString => Value::Bytes(decode::string(a, max_frame_len).await?),
        Step::DecodeStringPair => {
            let (k, v) = decode::string_pair(a, max_frame_len).await?;
            Value::Pair(k, v)
        }
        Step::DecodeDouble => Value::Double(decode::double(a).await?),
        Step::DecodeStringList => Value::List(decode::string_list(a, max_frame_len).await?),
        Step::DecodeStringPairList => {
            Value::PairList(decode::string_pair_list(a, max_frame_len).await?)
        }
    })
}

/// Run a whole program against `a`, returning the last step's value (the
/// program's overall result). An empty program yields [`Value::Unit`] — used
/// by operations like `putnr` that expect no response at all.
pub async fn run_program<A: Adaptor + ?Sized>(
    program: &Program,
    a: &mut A,
    max_frame_len: u32,
) -> Result<Value> {
    let mut result = Value::Unit;
    for &step in program {
        result = execute(step, a, max_frame_len).await?;
    }
    Ok(result)
}
