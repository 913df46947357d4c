use std::sync::Arc;
use tokio::sync::watch;

// Creates a linked cancel handle and signal
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx: Arc::new(tx) }, CancelSignal { rx: Some(rx) })
}

// Fires the cancellation; clones share the same signal
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    // A new signal observing this handle
    pub fn signal(&self) -> CancelSignal {
        CancelSignal { rx: Some(self.tx.subscribe()) }
    }
}

// Observed by fetch loops; the default signal never fires
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelSignal {
    pub fn never() -> Self {
        CancelSignal { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    // Resolves once cancelled. If every handle is dropped without cancelling, never resolves.
    pub async fn cancelled(&self) {
        if let Some(rx) = &self.rx {
            let mut rx = rx.clone();
            if rx.wait_for(|cancelled| *cancelled).await.is_ok() {
                return;
            }
        }
        std::future::pending::<()>().await
    }
}
