use thiserror::Error;

// Boxed error type returned by node transports, decoders and block consumers
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// Errors produced while fetching or streaming blocks
#[derive(Debug, Error)]
pub enum FetchError {
    // The requested height is above the chain tip; expected while following the head
    #[error("too high block requested")]
    TooHighBlockRequested,

    // Any other failure reported by the node client
    #[error("failed to get block: {0}")]
    Fetch(#[source] BoxError),

    // A transaction of an otherwise fetched block could not be decoded
    #[error("failed to decode tx {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: BoxError,
    },

    // The block consumer rejected a delivered block
    #[error("block consumer failed: {0}")]
    Consumer(#[source] BoxError),

    // The cancellation signal fired
    #[error("block stream cancelled")]
    Cancelled,

    // The receiving side of a block stream went away
    #[error("block stream closed by consumer")]
    StreamClosed,
}

impl FetchError {
    // True for the transient "block not produced yet" condition
    pub fn is_too_high(&self) -> bool {
        matches!(self, FetchError::TooHighBlockRequested)
    }

    // True when the stream stopped because of cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

// Errors raised while building a client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid node address {address}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported node address scheme {0}, expected http or https")]
    UnsupportedScheme(String),

    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}

// Errors raised while loading configuration from the environment
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}
