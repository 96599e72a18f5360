/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Configuration as specified by the operator. This is split up into smaller, subsystem-specific
//! config structs before being passed to components.

use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Configuration {
    pub store: StoreConfig,
    pub mempool: MempoolConfig,
    /// Whether the default logging handlers are installed on the event bus.
    pub log_events: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            store: StoreConfig::default(),
            mempool: MempoolConfig::default(),
            log_events: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Hard cap on ancestor walks. Parent links form a forest, so a walk this deep can only mean
    /// a cycle in the stored links, which is treated as corruption.
    pub max_ancestor_depth: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            max_ancestor_depth: 10_000,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MempoolConfig {
    /// How long an unconfirmed referral may sit in the mempool before the expiry sweep evicts it.
    pub entry_expiry: Duration,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        MempoolConfig {
            entry_expiry: Duration::from_secs(14 * 24 * 60 * 60),
        }
    }
}
