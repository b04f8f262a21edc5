//! Connection configuration, composed the way the teacher lineage's own
//! `ClientBuilder` composes a `PoolConfig` — except here there is exactly
//! one connection per client, since pooling across hosts is out of scope.

use std::time::Duration;

/// Knobs governing a single connection.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Timeout for the initial TCP connect.
    pub connect_timeout: Duration,
    /// Timeout applied to each submitted command (write + full decode).
    pub request_timeout: Duration,
    /// Whether to set `TCP_NODELAY` on the connection.
    pub tcp_nodelay: bool,
    /// Upper bound on any length field a response decoder will honor before
    /// treating it as a framing error.
    pub max_frame_len: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
            tcp_nodelay: true,
            max_frame_len: crate::wire::decode::DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// Builder for [`ClientConfig`], mirrored after the teacher's own
/// `ClientBuilder`/`ClientBuilderV2`.
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn tcp_nodelay(mut self, nodelay: bool) -> Self {
        self.config.tcp_nodelay = nodelay;
        self
    }

    pub fn max_frame_len(mut self, max: u32) -> Self {
        self.config.max_frame_len = max;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_values() {
        let config = ClientConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn builder_overrides_apply() {
        let config = ClientConfigBuilder::new()
            .connect_timeout(Duration::from_millis(100))
            .tcp_nodelay(false)
            .build();
        assert_eq!(config.connect_timeout, Duration::from_millis(100));
        assert!(!config.tcp_nodelay);
    }
}
