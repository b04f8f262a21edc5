//! Test-only fixtures shared by the unit tests in `wire`, `step`, and
//! `engine`. Not part of the public API.

use async_trait::async_trait;
use std::io;

use crate::adaptor::Adaptor;
use crate::wire::Frame;

/// An in-memory adaptor over a fixed response buffer, plus a recorder of
/// every frame written to it. Lets unit tests drive the decode primitives
/// and step programs without a real socket.
pub struct MockAdaptor {
    inbound: Vec<u8>,
    pos: usize,
    pub written: Vec<u8>,
}

impl MockAdaptor {
    pub fn with_response(bytes: impl Into<Vec<u8>>) -> Self {
        MockAdaptor {
            inbound: bytes.into(),
            pos: 0,
            written: Vec::new(),
        }
    }
}

#[async_trait]
impl Adaptor for MockAdaptor {
    async fn read_exact(&mut self, n: usize) -> io::Result<Vec<u8>> {
        if self.pos + n > self.inbound.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "mock adaptor ran out of bytes",
            ));
        }
        let slice = self.inbound[self.pos..self.pos + n].to_vec();
        self.pos += n;
        Ok(slice)
    }

    async fn write_frame(&mut self, frame: &Frame) -> io::Result<()> {
        self.written.extend_from_slice(&frame.concat());
        Ok(())
    }

    fn is_waiting(&self) -> bool {
        false
    }
}
