use thiserror::Error;

/// Error taxonomy for the protocol driver.
///
/// The source's `_fail()` is a stub that delivers a bare `None` result to the
/// waiting callback, leaving callers unable to distinguish "no value" from
/// "error", and leaving "protocol vs. transport" unions entirely to the
/// caller's imagination. This enum is the typed replacement the source left
/// as a TODO.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The server returned a nonzero status byte.
    #[error("server returned status {status}")]
    Protocol { status: u8 },

    /// A response could not be decoded under the expected schema (e.g. a
    /// length field exceeded the configured bound). The connection is no
    /// longer usable.
    #[error("framing error: {0}")]
    Framing(String),

    /// Socket read/write failed, or the peer closed mid-frame. The
    /// connection is no longer usable.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// The caller violated a contract the wire format can't express (e.g. a
    /// key too long for its length field). Surfaces before any I/O.
    #[error("misuse: {0}")]
    Misuse(String),

    /// A command queued behind a failed command on the same connection.
    #[error("connection closed after a prior error")]
    ConnectionClosed,

    /// The configured request timeout elapsed before the engine replied.
    #[error("request timed out")]
    Timeout,

    /// A step program produced a `Value` shape the calling method didn't
    /// expect. Indicates a bug in a client method's step program, not a
    /// server or transport fault.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// True for errors that leave the connection's byte stream in an
    /// inconsistent state and therefore must taint the whole connection
    /// (§7: "any framing or transport error taints the connection"). A
    /// `Protocol` error (e.g. `get` of a missing key) is a normal, expected
    /// outcome of a well-formed exchange and does not taint anything.
    pub fn is_connection_fatal(&self) -> bool {
        matches!(self, ClientError::Framing(_) | ClientError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
