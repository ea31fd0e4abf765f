//! The outbound send flow: sign, broadcast, persist.
//!
//! Host app flows call [`SendFlow::sign_and_send`] with an unsigned payload
//! and a key source; everything from the signature to the tracked record is
//! handled here. A cancelled signature leaves no trace at all.

use crate::pipeline::BroadcastPipeline;
use crate::TrackerError;
use std::sync::Arc;
use vela_events::{AssetKind, TxBroadcast};
use vela_rpc::RpcGateway;
use vela_signer::{KeySource, Signer};
use vela_store::{TxId, TxPayload};
use vela_types::{AccountAddress, Timestamp};

/// Signs and broadcasts a transaction, then hands it to the pipeline.
pub struct SendFlow {
    signer: Arc<dyn Signer>,
    gateway: Arc<dyn RpcGateway>,
    pipeline: Arc<BroadcastPipeline>,
}

impl SendFlow {
    pub fn new(
        signer: Arc<dyn Signer>,
        gateway: Arc<dyn RpcGateway>,
        pipeline: Arc<BroadcastPipeline>,
    ) -> Self {
        Self {
            signer,
            gateway,
            pipeline,
        }
    }

    /// Sign `payload` with `key` and submit it.
    ///
    /// - Cancelled signature: returns the signer error, creates nothing.
    /// - Accepted submission: record registered Pending (or Waiting when
    ///   the nonce is ahead of the network).
    /// - Transient submission failure (timeout): the record is registered
    ///   Pending anyway — the tracker's resend path retries the raw bytes.
    /// - Protocol rejection: the record is registered Failed with the
    ///   endpoint's message, so the attempt stays visible in history.
    pub async fn sign_and_send(
        &self,
        payload: TxPayload,
        key: &KeySource,
        asset_kind: AssetKind,
        contract_address: Option<AccountAddress>,
    ) -> Result<TxId, TrackerError> {
        let signed = self.signer.sign(&payload, key).await?;
        let event = TxBroadcast {
            hash: signed.hash,
            raw: signed.raw,
            owner: payload.from.clone(),
            payload,
            asset_kind,
            contract_address,
            sent_at: Timestamp::now(),
        };
        match self.gateway.send_raw_transaction(&event.raw).await {
            Ok(_) => self.pipeline.register(event),
            Err(error) if error.is_transient() => {
                tracing::warn!(%error, "broadcast timed out, tracking for resend");
                self.pipeline.register(event)
            }
            Err(error) => self.pipeline.register_send_failure(event, error.to_string()),
        }
    }
}
