use std::time::Duration;

/// Default number of redirects followed for one request.
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

/// Settings of an [`HttpClient`](crate::client::HttpClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    max_redirects: usize,
    read_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { max_redirects: DEFAULT_MAX_REDIRECTS, read_timeout: None }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of redirect hops followed for one request; `0` disables
    /// redirect following.
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Option<Duration>) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn max_redirects(&self) -> usize {
        self.max_redirects
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }
}
