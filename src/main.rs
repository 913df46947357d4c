use blockbus::{cancel_pair, Block, BlockFetcher, BoxError, Config};
use log::{error, info, warn};

// Follows the chain from the configured height and reports matching messages per block
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load .env if present, then set up logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    let fetcher = BlockFetcher::new(&config.node_addr, config.timeout)?;

    // Start at the current tip unless a height is configured
    let from = if config.start_height > 0 {
        config.start_height
    } else {
        let tip = fetcher.fetch_block(0).await?;
        info!("Latest block {} carries {} messages", tip.height, tip.messages().len());
        tip.height
    };

    // Ctrl+C stops the stream
    let (cancel, signal) = cancel_pair();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("Received Ctrl+C, stopping block stream");
        cancel.cancel();
    });

    let options = config
        .fetch_options()
        .with_cancel(signal)
        .with_error_handler(|height, err| warn!("Got an error on height {}: {}", height, err));

    info!("Start fetching blocks from {}", from);
    if config.skip_on_error {
        // Skipping rejected blocks only applies to callback delivery
        let reason = fetcher
            .stream_blocks_with(
                from,
                |block| {
                    let config = &config;
                    async move { report_block(&block, config) }
                },
                options,
            )
            .await;
        info!("Stream ended: {}", reason);
    } else {
        let mut blocks = fetcher.stream_blocks(from, options);
        while let Some(block) = blocks.recv().await {
            report_block(&block, &config)?;
        }
    }

    println!("{}", blockbus::metrics::render());
    Ok(())
}

// Logs a block and the number of messages matching the configured kinds
fn report_block(block: &Block, config: &Config) -> Result<(), BoxError> {
    let matching = block.messages_of(config.message_filter.kinds());
    info!(
        "Got block {} with {} transactions, {} matching messages",
        block.height,
        block.txs.len(),
        matching.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockbus::{Message, MessageFilter, Tx};
    use serde_json::json;

    #[test]
    fn report_block_accepts_every_block() {
        let config = Config { message_filter: MessageFilter::parse("bank/MsgSend"), ..Config::default() };
        let block = Block {
            height: 3,
            time: String::new(),
            txs: vec![Tx::new(vec![Message::new("bank/MsgSend", json!({}))])],
        };
        assert!(report_block(&block, &config).is_ok());
        assert_eq!(block.messages_of(config.message_filter.kinds()).len(), 1);
    }
}
