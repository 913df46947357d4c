#![allow(dead_code)]

use async_trait::async_trait;
use blockbus::{BlockFetcher, BoxError, JsonTxDecoder, NodeClient, RawBlock};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

// In-memory chain: heights 1..=tip exist; others answer like a Tendermint node does
#[derive(Default)]
pub struct MockChain {
    tip: AtomicU64,
    requests: Mutex<Vec<Option<u64>>>,
    // Remaining injected failures per height
    failures: Mutex<HashMap<u64, u32>>,
    // Heights whose first transaction is undecodable, with remaining count
    corrupt: Mutex<HashMap<u64, u32>>,
}

impl MockChain {
    pub fn with_tip(tip: u64) -> Arc<Self> {
        let chain = MockChain::default();
        chain.tip.store(tip, Ordering::SeqCst);
        Arc::new(chain)
    }

    pub fn set_tip(&self, tip: u64) {
        self.tip.store(tip, Ordering::SeqCst);
    }

    pub fn fail(&self, height: u64, times: u32) {
        self.failures.lock().unwrap().insert(height, times);
    }

    pub fn corrupt(&self, height: u64, times: u32) {
        self.corrupt.lock().unwrap().insert(height, times);
    }

    pub fn requests(&self) -> Vec<Option<u64>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested_heights(&self) -> Vec<u64> {
        self.requests().into_iter().flatten().collect()
    }

    fn take(map: &Mutex<HashMap<u64, u32>>, height: u64) -> bool {
        let mut map = map.lock().unwrap();
        match map.get_mut(&height) {
            Some(left) if *left > 0 => {
                *left -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl NodeClient for MockChain {
    async fn block(&self, height: Option<u64>) -> Result<RawBlock, BoxError> {
        self.requests.lock().unwrap().push(height);
        let tip = self.tip.load(Ordering::SeqCst);
        let h = height.unwrap_or(tip);

        if h > tip {
            return Err(format!(
                "RPC error -32603: Internal error: height {} must be less than or equal to the current blockchain height {}",
                h, tip
            )
            .into());
        }
        if Self::take(&self.failures, h) {
            return Err("connection reset by peer".into());
        }

        let mut txs = vec![
            json!({ "msg": [
                { "type": "bank/MsgSend", "value": { "height": h } },
                { "type": "pdv/MsgCreatePDV", "value": { "height": h } }
            ]})
            .to_string()
            .into_bytes(),
            json!({ "msg": [{ "type": "bank/MsgSend", "value": { "height": h } }] })
                .to_string()
                .into_bytes(),
        ];
        if Self::take(&self.corrupt, h) {
            txs[0] = b"\xffgarbage".to_vec();
        }

        Ok(RawBlock { height: h, time: format!("2021-02-21T17:43:{:02}Z", h % 60), txs })
    }
}

pub fn fetcher(chain: &Arc<MockChain>) -> BlockFetcher<Arc<MockChain>, JsonTxDecoder> {
    BlockFetcher::with_parts(chain.clone(), JsonTxDecoder)
}
