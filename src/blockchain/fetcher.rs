use log::debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::client::{HttpNodeClient, NodeClient};
use super::decoder::{JsonTxDecoder, TxDecoder};
use crate::error::{ClientError, FetchError};
use crate::metrics::BLOCK_FETCH_TIME;
use crate::models::{Block, RawBlock};

// Phrase the node puts in its error when asked for a height above the chain tip
const TOO_HIGH_PHRASE: &str = "must be less than or equal";

// Tells whether a node error means "block not produced yet".
// The node exposes no error code for this, so the text is matched.
pub fn is_too_high_error(message: &str) -> bool {
    message.contains(TOO_HIGH_PHRASE)
}

// Fetches blocks from a node and decodes their transactions
pub struct BlockFetcher<C = HttpNodeClient, D = JsonTxDecoder> {
    node: Arc<C>,
    decoder: Arc<D>,
}

impl<C, D> Clone for BlockFetcher<C, D> {
    fn clone(&self) -> Self {
        BlockFetcher { node: self.node.clone(), decoder: self.decoder.clone() }
    }
}

impl BlockFetcher {
    // Connects to a Tendermint RPC endpoint and decodes amino-JSON transactions
    pub fn new(node_addr: &str, timeout: Duration) -> Result<Self, ClientError> {
        let node = HttpNodeClient::new(node_addr, timeout)?;
        Ok(BlockFetcher::with_parts(node, JsonTxDecoder))
    }
}

impl<C: NodeClient, D: TxDecoder> BlockFetcher<C, D> {
    pub fn with_parts(node: C, decoder: D) -> Self {
        BlockFetcher { node: Arc::new(node), decoder: Arc::new(decoder) }
    }

    pub fn node(&self) -> &C {
        &self.node
    }

    // Fetches the block at `height`, or the highest block when `height` is 0.
    // No retries here; see the stream methods for that.
    pub async fn fetch_block(&self, height: u64) -> Result<Block, FetchError> {
        let requested = if height > 0 { Some(height) } else { None };

        let start_time = Instant::now();
        let raw = match self.node.block(requested).await {
            Ok(raw) => raw,
            Err(e) if is_too_high_error(&e.to_string()) => return Err(FetchError::TooHighBlockRequested),
            Err(e) => return Err(FetchError::Fetch(e)),
        };
        BLOCK_FETCH_TIME.observe(start_time.elapsed().as_secs_f64());

        let block = self.decode_block(raw)?;
        debug!("Fetched block {} with {} transactions", block.height, block.txs.len());
        Ok(block)
    }

    // Decodes every transaction; a single failure discards the whole block
    fn decode_block(&self, raw: RawBlock) -> Result<Block, FetchError> {
        let txs = raw
            .txs
            .iter()
            .enumerate()
            .map(|(index, bytes)| {
                self.decoder
                    .decode(bytes)
                    .map_err(|source| FetchError::Decode { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Block { height: raw.height, time: raw.time, txs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::models::{Message, Tx};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    // Serves heights 1..=tip; records every request
    struct StaticNode {
        tip: u64,
        requests: Mutex<Vec<Option<u64>>>,
    }

    #[async_trait]
    impl NodeClient for StaticNode {
        async fn block(&self, height: Option<u64>) -> Result<RawBlock, BoxError> {
            self.requests.lock().unwrap().push(height);
            let h = height.unwrap_or(self.tip);
            if h > self.tip {
                return Err(format!(
                    "RPC error -32603: Internal error: height {} must be less than or equal to the current blockchain height {}",
                    h, self.tip
                )
                .into());
            }
            let tx = json!({ "msg": [{ "type": "bank/MsgSend", "value": { "h": h } }] });
            Ok(RawBlock { height: h, time: format!("t{}", h), txs: vec![tx.to_string().into_bytes()] })
        }
    }

    fn fetcher(tip: u64) -> BlockFetcher<StaticNode, JsonTxDecoder> {
        BlockFetcher::with_parts(StaticNode { tip, requests: Mutex::new(vec![]) }, JsonTxDecoder)
    }

    #[test]
    fn classification_matches_phrase_only() {
        assert!(is_too_high_error("height 9 must be less than or equal to the current blockchain height 8"));
        assert!(!is_too_high_error("connection refused"));
        assert!(!is_too_high_error("must be less than"));
    }

    #[tokio::test]
    async fn fetches_exact_height() {
        let f = fetcher(10);
        let block = f.fetch_block(3).await.unwrap();
        assert_eq!(block.height, 3);
        assert_eq!(block.time, "t3");
        assert_eq!(block.messages(), vec![Message::new("bank/MsgSend", json!({ "h": 3 }))]);
        assert_eq!(*f.node().requests.lock().unwrap(), vec![Some(3)]);
    }

    #[tokio::test]
    async fn zero_means_latest() {
        let f = fetcher(10);
        let latest = f.fetch_block(0).await.unwrap();
        assert!(latest.height > 0);
        assert_eq!(latest, f.fetch_block(latest.height).await.unwrap());
        assert_eq!(f.node().requests.lock().unwrap()[0], None);
    }

    #[tokio::test]
    async fn above_tip_is_too_high() {
        let err = fetcher(10).fetch_block(11).await.unwrap_err();
        assert!(err.is_too_high());
    }

    #[tokio::test]
    async fn other_errors_are_wrapped() {
        struct Down;
        #[async_trait]
        impl NodeClient for Down {
            async fn block(&self, _: Option<u64>) -> Result<RawBlock, BoxError> {
                Err("connection refused".into())
            }
        }
        let err = BlockFetcher::with_parts(Down, JsonTxDecoder).fetch_block(1).await.unwrap_err();
        assert!(matches!(err, FetchError::Fetch(_)));
        assert_eq!(err.to_string(), "failed to get block: connection refused");
    }

    #[tokio::test]
    async fn decode_failure_discards_block() {
        let decoder = |raw: &[u8]| -> Result<Tx, BoxError> {
            if raw.is_empty() {
                Err("empty tx".into())
            } else {
                Ok(Tx::default())
            }
        };
        struct TwoTxs;
        #[async_trait]
        impl NodeClient for TwoTxs {
            async fn block(&self, height: Option<u64>) -> Result<RawBlock, BoxError> {
                Ok(RawBlock { height: height.unwrap_or(1), time: String::new(), txs: vec![b"ok".to_vec(), vec![]] })
            }
        }
        let err = BlockFetcher::with_parts(TwoTxs, decoder).fetch_block(1).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { index: 1, .. }));
    }
}
