//! JSON-RPC client for a single node endpoint.

use crate::transaction::{CodecError, Transaction, TxHash};
use num_bigint::BigInt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};
use url::Url;

pub const SEND_RAW_TRANSACTION: &str = "sendrawtransaction";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Invalid endpoint `{0}`")]
    InvalidEndpoint(String),
    #[error("Failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Transport error calling {method}: {source}")]
    Transport {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("Node answered {method} with http status {status}")]
    HttpStatus { method: &'static str, status: u16 },
    #[error("Node rejected {method} (code {code}): {desc}")]
    Node { method: &'static str, code: i64, desc: String },
    #[error("Malformed {method} response: {reason}")]
    MalformedResponse { method: &'static str, reason: String },
    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    error: i64,
    #[serde(default)]
    desc: String,
    #[serde(default)]
    result: Value,
}

/// Outcome of a dry-run (pre-executed) transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PreExecResult {
    pub state: u8,
    pub gas: u64,
    #[serde(default)]
    pub result: Value,
}

impl PreExecResult {
    /// Decodes the result as a little-endian signed integer encoded as hex.
    pub fn as_integer(&self) -> Result<BigInt, String> {
        let Some(encoded) = self.result.as_str() else {
            return Err(format!("expected a hex string, got {}", self.result));
        };
        if encoded.is_empty() {
            return Ok(BigInt::from(0));
        }
        let bytes = hex::decode(encoded).map_err(|err| err.to_string())?;
        Ok(BigInt::from_signed_bytes_le(&bytes))
    }
}

#[derive(Debug, Clone)]
pub struct RpcClient {
    endpoint: Url,
    http: reqwest::Client,
}

impl RpcClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, RpcError> {
        let endpoint = Url::parse(endpoint).map_err(|_| RpcError::InvalidEndpoint(endpoint.to_string()))?;
        let http = reqwest::Client::builder().timeout(timeout).build().map_err(RpcError::Client)?;
        Ok(Self { endpoint, http })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn call<T: DeserializeOwned>(&self, method: &'static str, params: Value) -> Result<T, RpcError> {
        let request = RpcRequest { jsonrpc: "2.0", method, params, id: 1 };
        trace!(method, endpoint = %self.endpoint, "Sending rpc request");
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|source| RpcError::Transport { method, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::HttpStatus { method, status: status.as_u16() });
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|err| RpcError::MalformedResponse { method, reason: err.to_string() })?;
        if body.error != 0 {
            debug!(method, code = body.error, desc = %body.desc, "Node returned an error");
            return Err(RpcError::Node { method, code: body.error, desc: body.desc });
        }
        serde_json::from_value(body.result).map_err(|err| RpcError::MalformedResponse { method, reason: err.to_string() })
    }

    /// Submits a signed transaction and returns the hash reported by the node.
    pub async fn send_transaction(&self, tx: &Transaction) -> Result<TxHash, RpcError> {
        let hash: String = self.call(SEND_RAW_TRANSACTION, json!([tx.to_hex()?, 0])).await?;
        hash.parse().map_err(|_| RpcError::MalformedResponse {
            method: SEND_RAW_TRANSACTION,
            reason: format!("invalid transaction hash `{hash}`"),
        })
    }

    /// Executes a signed transaction against the node's current state without committing it.
    pub async fn pre_execute(&self, tx: &Transaction) -> Result<PreExecResult, RpcError> {
        self.call(SEND_RAW_TRANSACTION, json!([tx.to_hex()?, 1])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use assert_matches::assert_matches;
    use httpmock::prelude::*;
    use rstest::rstest;

    fn tx() -> Transaction {
        Transaction::new_invoke(0, 20_000, Address::native(9), "balanceOf", vec![Address::native(1).into()])
    }

    fn client(server: &MockServer) -> RpcClient {
        RpcClient::new(&server.url("/"), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn send_returns_node_hash() {
        let server = MockServer::start_async().await;
        let hash = TxHash([7; 32]);
        let tx = tx();
        let request = json!({
            "jsonrpc": "2.0",
            "method": SEND_RAW_TRANSACTION,
            "params": [tx.to_hex().unwrap(), 0],
            "id": 1
        });
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).json_body(request);
                then.status(200).json_body(json!({ "error": 0, "desc": "SUCCESS", "result": hash.to_string() }));
            })
            .await;

        assert_eq!(client(&server).send_transaction(&tx).await.unwrap(), hash);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn node_error_code_is_surfaced() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(json!({ "error": 43001, "desc": "INVALID PARAMS", "result": "" }));
            })
            .await;

        let err = client(&server).send_transaction(&tx()).await.unwrap_err();
        assert_matches!(err, RpcError::Node { code: 43001, ref desc, .. } if desc == "INVALID PARAMS");
    }

    #[tokio::test]
    async fn http_failure_is_surfaced() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(503);
            })
            .await;

        let err = client(&server).send_transaction(&tx()).await.unwrap_err();
        assert_matches!(err, RpcError::HttpStatus { status: 503, .. });
    }

    #[tokio::test]
    async fn pre_execute_decodes_result() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).body_contains("\"params\":[");
                then.status(200).json_body(json!({
                    "error": 0,
                    "desc": "SUCCESS",
                    "result": { "State": 1, "Gas": 20000, "Result": "00e1f505" }
                }));
            })
            .await;

        let result = client(&server).pre_execute(&tx()).await.unwrap();
        assert_eq!(result.state, 1);
        assert_eq!(result.as_integer().unwrap(), BigInt::from(100_000_000));
    }

    #[rstest]
    #[case("", 0)]
    #[case("01", 1)]
    #[case("ff", -1)]
    #[case("0001", 256)]
    fn integer_results_are_little_endian(#[case] encoded: &str, #[case] expected: i64) {
        let result = PreExecResult { state: 1, gas: 0, result: Value::String(encoded.into()) };
        assert_eq!(result.as_integer().unwrap(), BigInt::from(expected));
    }

    #[test]
    fn rejects_relative_endpoint() {
        assert_matches!(RpcClient::new("localhost", DEFAULT_REQUEST_TIMEOUT), Err(RpcError::InvalidEndpoint(_)));
    }
}
