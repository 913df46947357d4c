use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::cancel::CancelSignal;
use crate::error::FetchError;

// Called with the height and error of every non-transient failure
pub type ErrorHandler = Arc<dyn Fn(u64, &FetchError) + Send + Sync>;

// Default pause between attempts, for both tip waits and failures
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

// Tuning for block streams. Later `with_*` calls override earlier ones.
#[derive(Clone)]
pub struct FetchOptions {
    // Pause after asking for a block above the chain tip
    pub retry_last_block_interval: Duration,
    // Pause after any other failure
    pub retry_interval: Duration,
    // Receives failures; never sees "too high" responses
    pub error_handler: ErrorHandler,
    // Callback mode only: advance past a block the consumer rejected
    pub skip_on_error: bool,
    // Checked before every fetch attempt
    pub cancel: CancelSignal,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions {
            retry_last_block_interval: DEFAULT_RETRY_INTERVAL,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            error_handler: Arc::new(|_, _| {}),
            skip_on_error: false,
            cancel: CancelSignal::never(),
        }
    }
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("retry_last_block_interval", &self.retry_last_block_interval)
            .field("retry_interval", &self.retry_interval)
            .field("skip_on_error", &self.skip_on_error)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry_last_block_interval(mut self, interval: Duration) -> Self {
        self.retry_last_block_interval = interval;
        self
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(u64, &FetchError) + Send + Sync + 'static,
    {
        self.error_handler = Arc::new(handler);
        self
    }

    pub fn with_skip_on_error(mut self, skip: bool) -> Self {
        self.skip_on_error = skip;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    pub(crate) fn report(&self, height: u64, err: &FetchError) {
        (self.error_handler)(height, err)
    }
}
