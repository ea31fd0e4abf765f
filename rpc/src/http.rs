//! JSON-RPC 2.0 client over HTTP.

use crate::gateway::{HeightTag, NonceTag, RpcGateway};
use crate::RpcError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use vela_types::{AccountAddress, ChainKind, ExecutedStatus, Receipt, TxHash};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    id: u64,
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    data: Option<Value>,
}

/// Production [`RpcGateway`] over HTTP.
///
/// One instance per network; the endpoint and chain kind are fixed at
/// construction. Every request carries a bounded timeout so a stuck
/// endpoint degrades into a transient [`RpcError::Timeout`].
pub struct HttpGateway {
    http: reqwest::Client,
    endpoint: String,
    kind: ChainKind,
    next_id: AtomicU64,
}

impl HttpGateway {
    pub fn new(endpoint: impl Into<String>, kind: ChainKind) -> Result<Self, RpcError> {
        Self::with_timeout(endpoint, kind, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        endpoint: impl Into<String>,
        kind: ChainKind,
        timeout: Duration,
    ) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| RpcError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            kind,
            next_id: AtomicU64::new(1),
        })
    }

    fn transport_error(e: reqwest::Error) -> RpcError {
        if e.is_timeout() {
            RpcError::Timeout
        } else {
            RpcError::Transport(e.to_string())
        }
    }

    fn unwrap_response(response: RpcResponse) -> Result<Value, RpcError> {
        if let Some(err) = response.error {
            return Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
                data: err.data,
            });
        }
        response
            .result
            .ok_or_else(|| RpcError::InvalidResponse("missing result".into()))
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        tracing::trace!(method, "rpc call");
        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(Self::transport_error)?;
        if !response.status().is_success() {
            return Err(RpcError::Transport(format!(
                "endpoint returned HTTP {}",
                response.status()
            )));
        }
        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;
        Self::unwrap_response(parsed)
    }

    /// Send a batch; `result[i]` matches `requests[i]` even when the
    /// endpoint reorders responses (matched by request id).
    async fn call_batch(
        &self,
        requests: &[(&str, Value)],
    ) -> Result<Vec<Result<Value, RpcError>>, RpcError> {
        if requests.is_empty() {
            return Ok(vec![]);
        }
        let first_id = self.next_id.fetch_add(requests.len() as u64, Ordering::Relaxed);
        let body: Vec<RpcRequest<'_>> = requests
            .iter()
            .enumerate()
            .map(|(i, (method, params))| RpcRequest {
                jsonrpc: "2.0",
                id: first_id + i as u64,
                method,
                params: params.clone(),
            })
            .collect();
        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_error)?;
        if !response.status().is_success() {
            return Err(RpcError::Transport(format!(
                "endpoint returned HTTP {}",
                response.status()
            )));
        }
        let parsed: Vec<RpcResponse> = response
            .json()
            .await
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;
        match_batch_responses(first_id, requests.len(), parsed)
    }

    fn parse_receipt(&self, value: Value) -> Result<Option<Receipt>, RpcError> {
        if value.is_null() {
            return Ok(None);
        }
        parse_receipt(self.kind, &value).map(Some)
    }
}

#[async_trait]
impl RpcGateway for HttpGateway {
    async fn next_nonce(&self, address: &AccountAddress, tag: NonceTag) -> Result<u64, RpcError> {
        let (method, params) = match (self.kind, tag) {
            (ChainKind::Evm, NonceTag::Pending) => {
                ("eth_getTransactionCount", json!([address.as_str(), "pending"]))
            }
            (ChainKind::Evm, NonceTag::Finalized) => {
                ("eth_getTransactionCount", json!([address.as_str(), "finalized"]))
            }
            (ChainKind::ConfluxCore, NonceTag::Pending) => {
                ("cfx_getNextNonce", json!([address.as_str(), "latest_state"]))
            }
            (ChainKind::ConfluxCore, NonceTag::Finalized) => {
                ("cfx_getNextNonce", json!([address.as_str(), "latest_finalized"]))
            }
        };
        let result = self.call(method, params).await?;
        parse_quantity(&result)
    }

    async fn transaction_receipt(&self, hash: &TxHash) -> Result<Option<Receipt>, RpcError> {
        let method = match self.kind {
            ChainKind::Evm => "eth_getTransactionReceipt",
            ChainKind::ConfluxCore => "cfx_getTransactionReceipt",
        };
        let result = self.call(method, json!([hash.as_str()])).await?;
        self.parse_receipt(result)
    }

    async fn transaction_receipts(
        &self,
        hashes: &[TxHash],
    ) -> Result<Vec<Option<Receipt>>, RpcError> {
        let method = match self.kind {
            ChainKind::Evm => "eth_getTransactionReceipt",
            ChainKind::ConfluxCore => "cfx_getTransactionReceipt",
        };
        let requests: Vec<(&str, Value)> = hashes
            .iter()
            .map(|h| (method, json!([h.as_str()])))
            .collect();
        let responses = self.call_batch(&requests).await?;
        responses
            .into_iter()
            .map(|r| self.parse_receipt(r?))
            .collect()
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, RpcError> {
        let method = match self.kind {
            ChainKind::Evm => "eth_sendRawTransaction",
            ChainKind::ConfluxCore => "cfx_sendRawTransaction",
        };
        let hex: String = raw.iter().map(|b| format!("{b:02x}")).collect();
        let result = self.call(method, json!([format!("0x{hex}")])).await?;
        let hash = result
            .as_str()
            .ok_or_else(|| RpcError::InvalidResponse("hash is not a string".into()))?;
        TxHash::new(hash).map_err(|e| RpcError::InvalidResponse(e.to_string()))
    }

    async fn chain_height(&self, tag: HeightTag) -> Result<u64, RpcError> {
        match (self.kind, tag) {
            (ChainKind::Evm, HeightTag::Latest) => {
                let result = self.call("eth_blockNumber", json!([])).await?;
                parse_quantity(&result)
            }
            // eth_blockNumber has no tag; the finalized head comes from the
            // block header instead.
            (ChainKind::Evm, HeightTag::Finalized) => {
                let result = self
                    .call("eth_getBlockByNumber", json!(["finalized", false]))
                    .await?;
                let number = result
                    .get("number")
                    .ok_or_else(|| RpcError::InvalidResponse("block without number".into()))?;
                parse_quantity(number)
            }
            (ChainKind::ConfluxCore, HeightTag::Latest) => {
                let result = self.call("cfx_epochNumber", json!(["latest_state"])).await?;
                parse_quantity(&result)
            }
            (ChainKind::ConfluxCore, HeightTag::Finalized) => {
                let result = self
                    .call("cfx_epochNumber", json!(["latest_finalized"]))
                    .await?;
                parse_quantity(&result)
            }
        }
    }

    async fn gas_price(&self) -> Result<u128, RpcError> {
        let method = match self.kind {
            ChainKind::Evm => "eth_gasPrice",
            ChainKind::ConfluxCore => "cfx_gasPrice",
        };
        let result = self.call(method, json!([])).await?;
        parse_quantity_u128(&result)
    }

    async fn estimate_gas(&self, call: Value) -> Result<u128, RpcError> {
        match self.kind {
            ChainKind::Evm => {
                let result = self.call("eth_estimateGas", json!([call])).await?;
                parse_quantity_u128(&result)
            }
            ChainKind::ConfluxCore => {
                let result = self
                    .call("cfx_estimateGasAndCollateral", json!([call]))
                    .await?;
                let gas = result
                    .get("gasLimit")
                    .ok_or_else(|| RpcError::InvalidResponse("estimate without gasLimit".into()))?;
                parse_quantity_u128(gas)
            }
        }
    }
}

/// Place each batch response into the slot of the request it answers,
/// matched by id. Endpoints are free to reorder batch responses; position
/// means nothing. An id outside the issued range rejects the whole batch.
fn match_batch_responses(
    first_id: u64,
    expected: usize,
    responses: Vec<RpcResponse>,
) -> Result<Vec<Result<Value, RpcError>>, RpcError> {
    let mut slots: Vec<Result<Value, RpcError>> = (0..expected)
        .map(|_| Err(RpcError::InvalidResponse("missing batch response".into())))
        .collect();
    for item in responses {
        let index = item.id.checked_sub(first_id).map(|i| i as usize);
        match index {
            Some(i) if i < slots.len() => slots[i] = HttpGateway::unwrap_response(item),
            _ => {
                return Err(RpcError::InvalidResponse(
                    "batch response id out of range".into(),
                ))
            }
        }
    }
    Ok(slots)
}

/// Parse a JSON-RPC quantity ("0x1a" or a bare number) into u64.
pub fn parse_quantity(value: &Value) -> Result<u64, RpcError> {
    parse_quantity_u128(value).and_then(|q| {
        u64::try_from(q).map_err(|_| RpcError::InvalidResponse(format!("quantity too large: {q}")))
    })
}

/// Parse a JSON-RPC quantity into u128.
pub fn parse_quantity_u128(value: &Value) -> Result<u128, RpcError> {
    if let Some(n) = value.as_u64() {
        return Ok(n as u128);
    }
    let s = value
        .as_str()
        .ok_or_else(|| RpcError::InvalidResponse(format!("not a quantity: {value}")))?;
    let hex = s.strip_prefix("0x").unwrap_or(s);
    u128::from_str_radix(hex, 16)
        .map_err(|e| RpcError::InvalidResponse(format!("bad quantity {s}: {e}")))
}

/// Normalize a chain-native receipt object into [`Receipt`].
pub fn parse_receipt(kind: ChainKind, value: &Value) -> Result<Receipt, RpcError> {
    let get_str = |key: &str| -> Result<&str, RpcError> {
        value
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::InvalidResponse(format!("receipt missing {key}")))
    };
    let hash = TxHash::new(get_str("transactionHash")?)
        .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;
    let block_hash = get_str("blockHash")?.to_string();
    let gas_used = parse_quantity_u128(
        value
            .get("gasUsed")
            .ok_or_else(|| RpcError::InvalidResponse("receipt missing gasUsed".into()))?,
    )?;

    let (height_key, outcome) = match kind {
        ChainKind::Evm => {
            // status 0x1 = success, 0x0 = revert.
            let status = parse_quantity(
                value
                    .get("status")
                    .ok_or_else(|| RpcError::InvalidResponse("receipt missing status".into()))?,
            )?;
            let outcome = if status == 1 {
                ExecutedStatus::Success
            } else {
                ExecutedStatus::Failed
            };
            ("blockNumber", outcome)
        }
        ChainKind::ConfluxCore => {
            // outcomeStatus 0x0 = success, anything else = failure.
            let status = parse_quantity(value.get("outcomeStatus").ok_or_else(|| {
                RpcError::InvalidResponse("receipt missing outcomeStatus".into())
            })?)?;
            let outcome = if status == 0 {
                ExecutedStatus::Success
            } else {
                ExecutedStatus::Failed
            };
            ("epochNumber", outcome)
        }
    };
    let inclusion_height = parse_quantity(
        value
            .get(height_key)
            .ok_or_else(|| RpcError::InvalidResponse(format!("receipt missing {height_key}")))?,
    )?;
    let contract_key = match kind {
        ChainKind::Evm => "contractAddress",
        ChainKind::ConfluxCore => "contractCreated",
    };
    let contract_created = value
        .get(contract_key)
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Receipt {
        transaction_hash: hash,
        inclusion_height,
        block_hash,
        gas_used: gas_used.to_string(),
        outcome,
        contract_created,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_hash() -> String {
        format!("0x{}", "ab".repeat(32))
    }

    #[test]
    fn quantity_parsing() {
        assert_eq!(parse_quantity(&json!("0x1a")).unwrap(), 26);
        assert_eq!(parse_quantity(&json!("0x0")).unwrap(), 0);
        assert_eq!(parse_quantity(&json!(7)).unwrap(), 7);
        assert!(parse_quantity(&json!("zz")).is_err());
        assert!(parse_quantity(&json!(null)).is_err());
    }

    fn ok_response(id: u64, result: Value) -> RpcResponse {
        RpcResponse {
            id,
            result: Some(result),
            error: None,
        }
    }

    #[test]
    fn batch_responses_match_by_id_not_position() {
        let responses = vec![
            ok_response(12, json!("0x2")),
            ok_response(10, json!("0x0")),
            RpcResponse {
                id: 11,
                result: None,
                error: Some(RpcErrorObject {
                    code: -32000,
                    message: "execution error".into(),
                    data: None,
                }),
            },
        ];
        let slots = match_batch_responses(10, 3, responses).unwrap();
        assert_eq!(slots[0].as_ref().unwrap(), &json!("0x0"));
        assert!(matches!(slots[1], Err(RpcError::Rpc { .. })));
        assert_eq!(slots[2].as_ref().unwrap(), &json!("0x2"));
    }

    #[test]
    fn batch_response_with_unknown_id_rejects_the_batch() {
        let responses = vec![ok_response(99, json!("0x0"))];
        assert!(match_batch_responses(10, 1, responses).is_err());
    }

    #[test]
    fn missing_batch_slot_surfaces_as_an_error() {
        let responses = vec![ok_response(10, json!("0x0"))];
        let slots = match_batch_responses(10, 2, responses).unwrap();
        assert!(slots[0].is_ok());
        assert!(slots[1].is_err());
    }

    #[test]
    fn evm_receipt_normalization() {
        let value = json!({
            "transactionHash": sample_hash(),
            "blockNumber": "0x10",
            "blockHash": "0xfeed",
            "gasUsed": "0x5208",
            "status": "0x1",
            "contractAddress": null,
        });
        let receipt = parse_receipt(ChainKind::Evm, &value).unwrap();
        assert_eq!(receipt.inclusion_height, 16);
        assert_eq!(receipt.gas_used, "21000");
        assert!(receipt.succeeded());
        assert!(receipt.contract_created.is_none());
    }

    #[test]
    fn conflux_receipt_normalization() {
        let value = json!({
            "transactionHash": sample_hash(),
            "epochNumber": "0x2a",
            "blockHash": "0xfeed",
            "gasUsed": "0x5208",
            "outcomeStatus": "0x1",
            "contractCreated": "cfx:acc7uawf5ubtnmezvhu9dhc6sghewk4rzy1wb81nwq",
        });
        let receipt = parse_receipt(ChainKind::ConfluxCore, &value).unwrap();
        assert_eq!(receipt.inclusion_height, 42);
        assert!(!receipt.succeeded());
        assert!(receipt.contract_created.is_some());
    }

    #[test]
    fn reverted_evm_receipt_is_failed() {
        let value = json!({
            "transactionHash": sample_hash(),
            "blockNumber": "0x10",
            "blockHash": "0xfeed",
            "gasUsed": "0x5208",
            "status": "0x0",
        });
        let receipt = parse_receipt(ChainKind::Evm, &value).unwrap();
        assert_eq!(receipt.outcome, ExecutedStatus::Failed);
    }
}
