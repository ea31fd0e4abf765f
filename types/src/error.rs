use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypeError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid transaction hash: {0}")]
    InvalidHash(String),
}
