pub mod cancel;
pub mod client;
pub mod decoder;
pub mod fetcher;
pub mod filter;
pub mod options;
pub mod stream;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use client::{HttpNodeClient, NodeClient, RpcError};
pub use decoder::{JsonTxDecoder, TxDecoder};
pub use fetcher::{is_too_high_error, BlockFetcher};
pub use filter::{filter_messages, MessageFilter};
pub use options::{ErrorHandler, FetchOptions};
pub use stream::BlockStream;
