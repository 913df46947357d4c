mod common;

use blockbus::{FetchError, MessageKind};
use common::{fetcher, MockChain};

#[tokio::test]
async fn fetches_block_with_decoded_transactions() {
    let chain = MockChain::with_tip(3009);
    let block = fetcher(&chain).fetch_block(3009).await.unwrap();

    assert_eq!(block.height, 3009);
    assert!(!block.time.is_empty());
    assert_eq!(block.txs.len(), 2);
    assert_eq!(block.txs[0].messages().len(), 2);
    assert_eq!(block.messages().len(), 3);
    assert_eq!(block.messages()[1].kind, MessageKind::from("pdv/MsgCreatePDV"));
}

#[tokio::test]
async fn latest_block_matches_explicit_fetch() {
    let chain = MockChain::with_tip(42);
    let f = fetcher(&chain);

    let latest = f.fetch_block(0).await.unwrap();
    assert!(latest.height > 0);
    assert_eq!(f.fetch_block(latest.height).await.unwrap(), latest);
    assert_eq!(chain.requests(), vec![None, Some(42)]);
}

#[tokio::test]
async fn block_above_tip_is_too_high() {
    let chain = MockChain::with_tip(10);
    let err = fetcher(&chain).fetch_block(11).await.unwrap_err();
    assert!(matches!(err, FetchError::TooHighBlockRequested));
}

#[tokio::test]
async fn transport_failure_is_wrapped_without_retry() {
    let chain = MockChain::with_tip(10);
    chain.fail(5, 1);
    let err = fetcher(&chain).fetch_block(5).await.unwrap_err();
    assert!(matches!(err, FetchError::Fetch(_)));
    assert_eq!(chain.requests().len(), 1);
}

#[tokio::test]
async fn undecodable_transaction_fails_the_block() {
    let chain = MockChain::with_tip(10);
    chain.corrupt(4, 1);
    let err = fetcher(&chain).fetch_block(4).await.unwrap_err();
    assert!(matches!(err, FetchError::Decode { index: 0, .. }));
}

#[tokio::test]
async fn filtering_block_messages_by_kind() {
    let chain = MockChain::with_tip(10);
    let block = fetcher(&chain).fetch_block(7).await.unwrap();

    let sends = blockbus::filter_messages(&block.messages(), &["bank/MsgSend".into()]);
    assert_eq!(sends.len(), 2);
    assert!(blockbus::filter_messages(&block.messages(), &[]).is_empty());
}

#[test]
fn invalid_node_address_fails_construction() {
    assert!(blockbus::BlockFetcher::new("wrong", std::time::Duration::from_secs(1)).is_err());
    assert!(blockbus::BlockFetcher::new("http://127.0.0.1:26657", std::time::Duration::from_secs(1)).is_ok());
}
