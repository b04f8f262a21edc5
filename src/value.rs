//! The decoded-result sum type.
//!
//! The source threads an untyped "result slot" through its step program,
//! written by decode steps and read by whichever step is flagged
//! `use_result`. Here that slot is a proper typed enum: every decoder in
//! [`crate::wire::decode`] produces exactly one `Value` variant, and every
//! client method in [`crate::client`] knows statically which variant its own
//! step program will yield.

use bytes::Bytes;

/// One decoded response value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A success-only response (`put`, `out`, `sync`, ...).
    Unit,
    /// Reserved for decoders that produce a boolean directly.
    Bool(bool),
    /// A 32-bit big-endian integer field (`vsiz`, `addint`).
    U32(u32),
    /// A 64-bit big-endian integer field (`rnum`, `size`).
    U64(u64),
    /// A packed integer+fractional double (`adddouble`).
    Double(f64),
    /// A length-prefixed byte string (`get`, `stat`, `ext`, `iternext`).
    Bytes(Bytes),
    /// A length-prefixed key/value pair.
    Pair(Bytes, Bytes),
    /// A count-prefixed list of strings (`fwmkeys`, `misc`).
    List(Vec<Bytes>),
    /// A count-prefixed list of key/value pairs (`mget`).
    PairList(Vec<(Bytes, Bytes)>),
}

impl Value {
    pub fn into_unit(self) -> crate::error::Result<()> {
        match self {
            Value::Unit => Ok(()),
            other => Err(unexpected("Unit", &other)),
        }
    }

    pub fn into_bytes(self) -> crate::error::Result<Bytes> {
        match self {
            Value::Bytes(b) => Ok(b),
            other => Err(unexpected("Bytes", &other)),
        }
    }

    pub fn into_u32(self) -> crate::error::Result<u32> {
        match self {
            Value::U32(n) => Ok(n),
            other => Err(unexpected("U32", &other)),
        }
    }

    pub fn into_u64(self) -> crate::error::Result<u64> {
        match self {
            Value::U64(n) => Ok(n),
            other => Err(unexpected("U64", &other)),
        }
    }

    pub fn into_double(self) -> crate::error::Result<f64> {
        match self {
            Value::Double(d) => Ok(d),
            other => Err(unexpected("Double", &other)),
        }
    }

    pub fn into_list(self) -> crate::error::Result<Vec<Bytes>> {
        match self {
            Value::List(l) => Ok(l),
            other => Err(unexpected("List", &other)),
        }
    }

    pub fn into_pair_list(self) -> crate::error::Result<Vec<(Bytes, Bytes)>> {
        match self {
            Value::PairList(l) => Ok(l),
            other => Err(unexpected("PairList", &other)),
        }
    }
}

fn unexpected(wanted: &str, got: &Value) -> crate::error::ClientError {
    crate::error::ClientError::InvalidResponse(format!(
        "expected {wanted}, step program produced {got:?}"
    ))
}
