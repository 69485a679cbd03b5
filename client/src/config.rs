use crate::error::ClientError;
use shared::{DEFAULT_BUFFER_SIZE, DEFAULT_PORT};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// How long to wait for a reply and how many times to resend on silence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        Self {
            timeout,
            max_retries,
        }
    }

    /// One initial send plus `max_retries` resends
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Longest a request operation can block before reporting a timeout
    pub fn max_wait(&self) -> Duration {
        self.timeout * self.attempts()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), 5)
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_addr: SocketAddr,
    pub retry: RetryPolicy,
    /// Receive buffer size; longer replies are truncated
    pub buffer_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            retry: RetryPolicy::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// Resolves `host:port` (names included) to the first matching address.
pub async fn resolve_server(addr: &str) -> Result<SocketAddr, ClientError> {
    tokio::net::lookup_host(addr)
        .await
        .map_err(|e| ClientError::InvalidAddress(format!("{}: {}", addr, e)))?
        .next()
        .ok_or_else(|| ClientError::InvalidAddress(addr.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_budget() {
        let policy = RetryPolicy::new(Duration::from_secs(1), 2);
        assert_eq!(policy.attempts(), 3);
        assert_eq!(policy.max_wait(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_resolve_server() {
        let addr = resolve_server("127.0.0.1:12345").await.unwrap();
        assert_eq!(addr, SocketAddr::from((Ipv4Addr::LOCALHOST, 12345)));

        assert!(matches!(
            resolve_server("not an address").await,
            Err(ClientError::InvalidAddress(_))
        ));
    }
}
