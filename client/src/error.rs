use crate::pending::RequestKind;
use shared::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no {kind} reply from server after {attempts} attempts")]
    Timeout { kind: RequestKind, attempts: u32 },
    #[error("{kind} request was superseded and no newer reply arrived in time")]
    Superseded { kind: RequestKind },
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("invalid server address: {0}")]
    InvalidAddress(String),
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}
