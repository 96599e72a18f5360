/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Defines the [`KVStore`] trait, which specifies the required interface for the ordered
//! byte-string key-value store provided by the user, and the error type returned when stored
//! referral-subsystem values cannot be read or written.
//!
//! The store engine is deliberately pluggable: any engine offering point get/put/erase, atomic
//! batched writes, snapshots, and prefix-ordered iteration satisfies these traits. Production
//! nodes back them with an on-disk engine; tests use an in-memory ordered map.

use std::fmt::Display;

use crate::types::basic::{Address, CodeHash};

/// Read interface shared by stores and their snapshots.
pub trait KVGet {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Iterate, in key order, over every `(key, value)` pair whose key starts with `prefix`.
    fn iter_prefix(&self, prefix: &[u8]) -> Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + '_>;
}

pub trait KVStore: KVGet + Clone + Send + 'static {
    type WriteBatch: WriteBatch;
    type Snapshot<'a>: 'a + KVGet;

    /// Atomically apply every set and delete collected in `wb`.
    fn write(&mut self, wb: Self::WriteBatch);
    fn clear(&mut self);
    fn snapshot<'b>(&'b self) -> Self::Snapshot<'_>;
}

/// A collection of set and delete operations applied atomically by [`KVStore::write`].
pub trait WriteBatch {
    fn new() -> Self;
    fn set(&mut self, key: &[u8], value: &[u8]);
    fn delete(&mut self, key: &[u8]);
}

/// Error when reading or writing a referral-subsystem value in the [key-value store][KVStore].
/// The error may arise in the following circumstances:
/// 1. The value corresponding to a given key cannot be deserialized into its expected type,
/// 2. The value corresponding to a given key cannot be serialized,
/// 3. A value that must exist for the operation to proceed cannot be found.
#[derive(Debug)]
pub enum ReferralStoreError {
    DeserializeValueError { key: Key, source: std::io::Error },
    SerializeValueError { key: Key, source: std::io::Error },
    ValueNotFound { key: Key },
}

impl Display for ReferralStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferralStoreError::DeserializeValueError { key, source } => {
                write!(f, "failed to deserialize value of {}: {}", key, source)
            }
            ReferralStoreError::SerializeValueError { key, source } => {
                write!(f, "failed to serialize value of {}: {}", key, source)
            }
            ReferralStoreError::ValueNotFound { key } => {
                write!(f, "value not found for {}", key)
            }
        }
    }
}

impl std::error::Error for ReferralStoreError {}

/// Logical name of a stored value, used in [`ReferralStoreError`] diagnostics.
#[derive(Debug)]
pub enum Key {
    Referral { address: Address },
    ReferralByCode { code: CodeHash },
    Parent { address: Address },
    Children { address: Address },
    Anv { address: Address },
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Key::Referral { address } => write!(f, "Referral for address {}", address),
            Key::ReferralByCode { code } => write!(f, "Referral for code {}", code),
            Key::Parent { address } => write!(f, "Parent link for address {}", address),
            Key::Children { address } => write!(f, "Child list for address {}", address),
            Key::Anv { address } => write!(f, "ANV entry for address {}", address),
        }
    }
}
