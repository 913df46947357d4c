use prometheus::{register_counter, register_histogram, Counter, Histogram};

// Prometheus metrics for block fetching
lazy_static::lazy_static! {
    // Blocks handed to a consumer
    pub static ref BLOCKS_FETCHED: Counter = register_counter!(
        "blockbus_blocks_fetched_total",
        "Total blocks delivered by block streams"
    ).unwrap();

    // Failures reported to error handlers (fetch, decode and consumer errors)
    pub static ref FETCH_ERRORS: Counter = register_counter!(
        "blockbus_fetch_errors_total",
        "Total block fetch failures"
    ).unwrap();

    // Polls that found the requested height not produced yet
    pub static ref TIP_WAITS: Counter = register_counter!(
        "blockbus_tip_waits_total",
        "Total requests for blocks above the chain tip"
    ).unwrap();

    // Node round-trip time for successful block requests
    pub static ref BLOCK_FETCH_TIME: Histogram = register_histogram!(
        "blockbus_block_fetch_seconds",
        "Block fetch time in seconds"
    ).unwrap();
}

// Renders all registered metrics in the Prometheus text format
pub fn render() -> String {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode_to_string(&metric_families).unwrap_or_default()
}
