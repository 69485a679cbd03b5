use shared::{DEFAULT_BUFFER_SIZE, DEFAULT_PORT};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub data_file: PathBuf,
    /// Receive buffer size; longer datagrams are truncated
    pub buffer_size: usize,
    /// Upper bound on in-flight workers, 0 for unbounded
    pub max_workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            data_file: PathBuf::from("data.txt"),
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_workers: 0,
        }
    }
}
