use std::time::Duration;

use crate::blockchain::cancel::CancelSignal;

// Sleeps for `duration` unless cancelled first; returns false when cancelled
pub async fn sleep_or_cancelled(duration: Duration, cancel: &CancelSignal) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
