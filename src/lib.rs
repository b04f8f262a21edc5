//! Asynchronous client library for the Tokyo Tyrant 1.1.17 binary
//! key/value protocol.
//!
//! Two client flavors share the same wire codec and therefore produce
//! identical bytes on the wire:
//!
//! - [`client::TyrantClient`] submits each operation as a step program to
//!   a dedicated engine task that owns the connection ([`engine`],
//!   [`step`]).
//! - [`suspension::SuspensionClient`] runs each operation as a plain
//!   `async fn` serialised through a shared mutex, without an engine task.
//!
//! ```no_run
//! # async fn run() -> tyrant_client::error::Result<()> {
//! let client = tyrant_client::client::TyrantClient::connect("127.0.0.1:1978").await?;
//! client.put("key", "value").await?;
//! let value = client.get("key").await?;
//! assert_eq!(&value[..], b"value");
//! # Ok(())
//! # }
//! ```

pub mod adaptor;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod step;
pub mod suspension;
pub mod value;
pub mod wire;

#[cfg(test)]
mod test_support;

pub use client::{ClientBuilder, TyrantClient};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{ClientError, Result};
pub use value::Value;
