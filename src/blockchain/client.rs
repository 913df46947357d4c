use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::error::{BoxError, ClientError};
use crate::models::RawBlock;

// Fetches raw blocks from a node; `None` asks for the latest block
#[async_trait]
pub trait NodeClient: Send + Sync {
    async fn block(&self, height: Option<u64>) -> Result<RawBlock, BoxError>;
}

#[async_trait]
impl<T: NodeClient + ?Sized> NodeClient for Arc<T> {
    async fn block(&self, height: Option<u64>) -> Result<RawBlock, BoxError> {
        (**self).block(height).await
    }
}

// JSON-RPC request envelope
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

// Error object returned by the node; the interesting detail usually sits in `data`
#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<String>,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RPC error {}: {}", self.code, self.message)?;
        if let Some(data) = &self.data {
            write!(f, ": {}", data)?;
        }
        Ok(())
    }
}

impl std::error::Error for RpcError {}

#[derive(Debug, Deserialize)]
struct BlockResult {
    block: RpcBlock,
}

#[derive(Debug, Deserialize)]
struct RpcBlock {
    header: RpcHeader,
    #[serde(default)]
    data: RpcData,
}

#[derive(Debug, Deserialize)]
struct RpcHeader {
    height: String, // Decimal string on the wire
    #[serde(default)]
    time: String,
}

#[derive(Debug, Default, Deserialize)]
struct RpcData {
    // Null for blocks without transactions
    #[serde(default)]
    txs: Option<Vec<String>>,
}

// Parses a `block` JSON-RPC response body into a raw block
pub fn parse_block_response(body: &str) -> Result<RawBlock, BoxError> {
    let response: JsonRpcResponse<BlockResult> = serde_json::from_str(body)?;
    if let Some(err) = response.error {
        return Err(Box::new(err));
    }
    let block = response.result.ok_or("response has neither result nor error")?.block;

    let height = block
        .header
        .height
        .parse::<u64>()
        .map_err(|e| format!("invalid block height {:?}: {}", block.header.height, e))?;

    // Transactions are base64 encoded
    let txs = block
        .data
        .txs
        .unwrap_or_default()
        .iter()
        .map(|tx| STANDARD.decode(tx))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RawBlock { height, time: block.header.time, txs })
}

// Resolves a node address into an HTTP endpoint; tcp:// is served over plain HTTP
fn endpoint(address: &str) -> Result<Url, ClientError> {
    let invalid = |source| ClientError::InvalidAddress { address: address.to_string(), source };
    let url = match address.strip_prefix("tcp://") {
        Some(rest) => Url::parse(&format!("http://{}", rest)).map_err(invalid)?,
        None => Url::parse(address).map_err(invalid)?,
    };
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::UnsupportedScheme(other.to_string())),
    }
}

// Node client speaking Tendermint JSON-RPC over HTTP
#[derive(Debug)]
pub struct HttpNodeClient {
    client: reqwest::Client,
    url: Url,
    next_id: AtomicU64,
}

impl HttpNodeClient {
    // Binds a client to the node address; every request is bounded by `timeout`
    pub fn new(address: &str, timeout: Duration) -> Result<Self, ClientError> {
        let url = endpoint(address)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        info!("Using node RPC at {}", url);
        Ok(HttpNodeClient { client, url, next_id: AtomicU64::new(1) })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn block(&self, height: Option<u64>) -> Result<RawBlock, BoxError> {
        // Heights travel as strings; no params means latest
        let params = match height {
            Some(h) => serde_json::json!({ "height": h.to_string() }),
            None => serde_json::json!({}),
        };
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method: "block",
            params,
        };

        let response = self.client.post(self.url.clone()).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("block({:?}) answered with status {}", height, status);

        // Error bodies are JSON-RPC too, so only fail on status when the body is unusable
        parse_block_response(&body).map_err(|e| -> BoxError {
            if status.is_success() || e.is::<RpcError>() {
                e
            } else {
                format!("node responded with {}: {}", status, e).into()
            }
        })
    }
}
