use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("store error: {0}")]
    Store(#[from] vela_store::StoreError),

    #[error("rpc error: {0}")]
    Rpc(#[from] vela_rpc::RpcError),

    #[error("signing error: {0}")]
    Signer(#[from] vela_signer::SignerError),

    #[error("configuration error: {0}")]
    Config(String),
}
