pub mod blockchain;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod utils;

pub use blockchain::{
    cancel_pair, filter_messages, BlockFetcher, BlockStream, CancelHandle, CancelSignal, FetchOptions,
    HttpNodeClient, JsonTxDecoder, MessageFilter, NodeClient, TxDecoder,
};
pub use config::Config;
pub use error::{BoxError, ClientError, ConfigError, FetchError};
pub use models::{Block, Message, MessageKind, RawBlock, Tx};
