// Fetch loop shared by channel and callback block streams.
//
// One loop owns one cursor. Each iteration checks cancellation, waits for the consumer,
// fetches the cursor height and either delivers the block or backs off and retries the
// same height. "Too high" responses back off quietly; every other failure goes to the
// error handler first.

use futures::Stream;
use log::{debug, info, warn};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::client::NodeClient;
use super::decoder::TxDecoder;
use super::fetcher::BlockFetcher;
use super::options::FetchOptions;
use crate::error::{BoxError, FetchError};
use crate::metrics::{BLOCKS_FETCHED, FETCH_ERRORS, TIP_WAITS};
use crate::models::Block;
use crate::utils::sleep_or_cancelled;

// Outcome of handing a block to the consumer
enum Delivered {
    Accepted,
    Rejected(FetchError),
    Closed,
}

// How fetched blocks reach the consumer
trait Delivery {
    // Resolves when the consumer can take another block; false once it is gone
    async fn ready(&mut self) -> bool;
    async fn deliver(&mut self, block: Block) -> Delivered;
}

// Rendezvous handoff over a one-slot channel. A slot permit is taken before fetching,
// so block N+1 is only fetched after the consumer has received block N.
struct ChannelDelivery {
    tx: mpsc::Sender<Block>,
    permit: Option<mpsc::OwnedPermit<Block>>,
}

impl Delivery for ChannelDelivery {
    async fn ready(&mut self) -> bool {
        if self.permit.is_none() {
            match self.tx.clone().reserve_owned().await {
                Ok(permit) => self.permit = Some(permit),
                Err(_) => return false,
            }
        }
        true
    }

    async fn deliver(&mut self, block: Block) -> Delivered {
        match self.permit.take() {
            Some(permit) => {
                permit.send(block);
                Delivered::Accepted
            }
            // ready() reserves the slot before every delivery
            None => Delivered::Closed,
        }
    }
}

// Calls the consumer and reads its verdict
struct CallbackDelivery<F> {
    on_block: F,
}

impl<F, Fut> Delivery for CallbackDelivery<F>
where
    F: FnMut(Block) -> Fut,
    Fut: Future<Output = Result<(), BoxError>>,
{
    async fn ready(&mut self) -> bool {
        true
    }

    async fn deliver(&mut self, block: Block) -> Delivered {
        match (self.on_block)(block).await {
            Ok(()) => Delivered::Accepted,
            Err(e) => Delivered::Rejected(FetchError::Consumer(e)),
        }
    }
}

// Runs until cancelled (or the channel consumer is gone) and returns why it stopped
async fn run<C, D, S>(
    fetcher: &BlockFetcher<C, D>,
    from: u64,
    options: &FetchOptions,
    delivery: &mut S,
) -> FetchError
where
    C: NodeClient,
    D: TxDecoder,
    S: Delivery,
{
    let cancel = &options.cancel;
    // Cursor: next height to fetch, never below 1
    let mut height = from.max(1);
    info!("Streaming blocks from height {}", height);

    loop {
        // Stop before doing anything else once cancelled
        if cancel.is_cancelled() {
            return FetchError::Cancelled;
        }

        // Wait for the consumer to take the previous block
        let ready = tokio::select! {
            biased;
            _ = cancel.cancelled() => return FetchError::Cancelled,
            ready = delivery.ready() => ready,
        };
        if !ready {
            return FetchError::StreamClosed;
        }

        // Dropping the request future aborts the in-flight RPC call
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return FetchError::Cancelled,
            fetched = fetcher.fetch_block(height) => fetched,
        };

        // Deliver, or pick the pause before retrying the same height
        let pause = match fetched {
            Ok(block) => match delivery.deliver(block).await {
                Delivered::Accepted => {
                    // Move on to the next height
                    BLOCKS_FETCHED.inc();
                    height += 1;
                    continue;
                }
                Delivered::Closed => return FetchError::StreamClosed,
                Delivered::Rejected(err) => {
                    FETCH_ERRORS.inc();
                    warn!("Consumer rejected block {}: {}", height, err);
                    options.report(height, &err);
                    // Skipping leaves a gap in delivered heights
                    if options.skip_on_error {
                        BLOCKS_FETCHED.inc();
                        height += 1;
                        continue;
                    }
                    options.retry_interval
                }
            },
            Err(FetchError::TooHighBlockRequested) => {
                // Expected at the chain tip: no error handler, quiet poll
                TIP_WAITS.inc();
                debug!("Block {} not produced yet, waiting", height);
                options.retry_last_block_interval
            }
            Err(err) => {
                // Transport and decode failures are reported, then retried
                FETCH_ERRORS.inc();
                warn!("Error fetching block {}: {}. Retrying...", height, err);
                options.report(height, &err);
                options.retry_interval
            }
        };

        // Back off; cancellation cuts the pause short
        if !sleep_or_cancelled(pause, cancel).await {
            return FetchError::Cancelled;
        }
    }
}

// Receiving end of a channel block stream. Ends after cancellation; dropping it stops the producer.
#[derive(Debug)]
pub struct BlockStream {
    rx: mpsc::Receiver<Block>,
    task: JoinHandle<()>,
}

impl BlockStream {
    // Next block, or None once the stream has stopped
    pub async fn recv(&mut self) -> Option<Block> {
        self.rx.recv().await
    }
}

impl Stream for BlockStream {
    type Item = Block;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Block>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for BlockStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl<C, D> BlockFetcher<C, D>
where
    C: NodeClient + 'static,
    D: TxDecoder + 'static,
{
    // Streams blocks from `from` (1 when 0) on a background task, one block at a time.
    // Must be called within a Tokio runtime.
    pub fn stream_blocks(&self, from: u64, options: FetchOptions) -> BlockStream {
        let (tx, rx) = mpsc::channel(1);
        let fetcher = self.clone();
        let task = tokio::spawn(async move {
            let mut delivery = ChannelDelivery { tx, permit: None };
            let reason = run(&fetcher, from, &options, &mut delivery).await;
            info!("Block stream stopped: {}", reason);
        });
        BlockStream { rx, task }
    }

    // Streams blocks from `from` (1 when 0) into `on_block` until cancelled, then returns
    // the reason it stopped. A block the callback rejects is fetched and offered again
    // after `retry_interval`, unless `skip_on_error` is set.
    pub async fn stream_blocks_with<F, Fut>(&self, from: u64, on_block: F, options: FetchOptions) -> FetchError
    where
        F: FnMut(Block) -> Fut,
        Fut: Future<Output = Result<(), BoxError>>,
    {
        let mut delivery = CallbackDelivery { on_block };
        let reason = run(self, from, &options, &mut delivery).await;
        info!("Block stream stopped: {}", reason);
        reason
    }
}
