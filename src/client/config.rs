use crate::utils::env_parse;
use crate::Result;
use std::time::Duration;

const SOURCE: &str = "batched_function_config";

/// When the client flushes queued calls as one batch.
///
/// A batch is sent as soon as it holds `flush_on_max_items` calls, or once its
/// oldest call has waited `max_item_age`, whichever comes first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchedFunctionConfig {
    pub flush_on_max_items: usize,
    pub max_item_age: Duration,
}

impl Default for BatchedFunctionConfig {
    fn default() -> Self {
        Self {
            flush_on_max_items: 25,
            max_item_age: Duration::from_millis(10),
        }
    }
}

impl BatchedFunctionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flush_on_max_items(mut self, n: usize) -> Self {
        self.flush_on_max_items = n.max(1);
        self
    }

    pub fn with_max_item_age(mut self, age: Duration) -> Self {
        self.max_item_age = age;
        self
    }

    /// Defaults overridden by `BFETCH_FLUSH_ON_MAX_ITEMS` and
    /// `BFETCH_MAX_ITEM_AGE_MS`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(n) = env_parse::<usize>("BFETCH_FLUSH_ON_MAX_ITEMS", SOURCE)? {
            config = config.with_flush_on_max_items(n);
        }
        if let Some(ms) = env_parse::<u64>("BFETCH_MAX_ITEM_AGE_MS", SOURCE)? {
            config = config.with_max_item_age(Duration::from_millis(ms));
        }
        Ok(config)
    }
}
