use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    /// The request did not complete in time. Transient: retry next tick.
    #[error("rpc request timed out")]
    Timeout,

    /// The endpoint could not be reached or the connection broke.
    #[error("rpc transport error: {0}")]
    Transport(String),

    /// A well-formed JSON-RPC error response (e.g. nonce too low).
    #[error("rpc error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// The response did not have the shape the method promises.
    #[error("invalid rpc response: {0}")]
    InvalidResponse(String),
}

impl RpcError {
    /// Transient errors leave record state untouched and are retried on the
    /// next polling tick; protocol errors are interpreted chain-specifically.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Transport(_))
    }
}
