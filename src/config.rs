use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::blockchain::{FetchOptions, MessageFilter};
use crate::error::ConfigError;

// Configuration for the block streamer
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub node_addr: String, // Node RPC address
    pub timeout: Duration, // Per-request timeout
    pub start_height: u64, // First height to stream; 0 starts at the current tip
    pub retry_interval: Duration, // Pause after a failed fetch
    pub retry_last_block_interval: Duration, // Pause after asking for a block not produced yet
    pub skip_on_error: bool, // Advance past blocks the consumer rejects
    pub message_filter: MessageFilter, // Message kinds to report
}

impl Default for Config {
    fn default() -> Self {
        Config {
            node_addr: "http://127.0.0.1:26657".to_string(),
            timeout: Duration::from_secs(60),
            start_height: 0,
            retry_interval: Duration::from_secs(1),
            retry_last_block_interval: Duration::from_secs(1),
            skip_on_error: false,
            message_filter: MessageFilter::default(),
        }
    }
}

impl Config {
    // Loads configuration from environment variables, with defaults for unset fields
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    // Same as `from_env` with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let config = Config {
            node_addr: lookup("NODE_ADDR").unwrap_or(defaults.node_addr),
            timeout: parse_var(&lookup, "NODE_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            start_height: parse_var(&lookup, "START_HEIGHT")?.unwrap_or(defaults.start_height),
            retry_interval: parse_var(&lookup, "RETRY_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_interval),
            retry_last_block_interval: parse_var(&lookup, "RETRY_LAST_BLOCK_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_last_block_interval),
            skip_on_error: parse_var(&lookup, "SKIP_ON_ERROR")?.unwrap_or(defaults.skip_on_error),
            message_filter: lookup("MESSAGE_KINDS")
                .map(|kinds| MessageFilter::parse(&kinds))
                .unwrap_or(defaults.message_filter),
        };

        if config.node_addr.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "NODE_ADDR",
                value: config.node_addr,
                reason: "must not be empty".to_string(),
            });
        }

        Ok(config)
    }

    // Stream options matching this configuration
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions::new()
            .with_retry_interval(self.retry_interval)
            .with_retry_last_block_interval(self.retry_last_block_interval)
            .with_skip_on_error(self.skip_on_error)
    }
}

// Parses an optional variable, rejecting values that do not parse
fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value.trim().parse().map(Some).map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}
