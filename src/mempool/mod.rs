/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! In-memory pool of validated but not-yet-confirmed referrals.
//!
//! The pool keeps three indices over one underlying set - by referral hash, by entry time, and by
//! beaconed address - plus a link table mapping each entry to the set of its in-pool children.
//! The link table is what makes eviction dependency-aware: removing an entry recursively
//! ([`remove_recursive`](ReferralMempool::remove_recursive)) or expiring it
//! ([`expire`](ReferralMempool::expire)) sweeps every descendant with it, so the pool never holds
//! a referral whose ancestry has been evicted.
//!
//! Parent resolution happens once, at admission: an entry whose parent is not in the pool at that
//! moment stays at the top of the link graph, and a parent added later does not retroactively
//! adopt it.
//!
//! ## Locking and notifications
//!
//! A single mutex guards all four maps, so within one operation the indices are mutually
//! consistent. [Event](crate::events::Event) notifications are delivered outside the lock:
//! addition events before it is acquired, removal events after it has been released.

pub mod entry;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::mem;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use indexmap::IndexMap;

use crate::cache::ReferralsCache;
use crate::config::MempoolConfig;
use crate::events::{AddReferralEvent, Event, RemovalReason, RemoveReferralEvent};
use crate::store::kv_store::{KVStore, ReferralStoreError};
use crate::types::basic::{Address, CodeHash};
use crate::types::referral::{Referral, ReferralRef};
use crate::types::transaction::{extract_destination, TransactionRef};

use entry::RefMempoolEntry;

pub struct ReferralMempool<K: KVStore> {
    state: Mutex<MempoolState>,
    cache: Arc<ReferralsCache<K>>,
    config: MempoolConfig,
    event_publisher: Option<Sender<Event>>,
}

struct MempoolState {
    /// Primary index, keyed by referral hash, in admission order.
    entries: IndexMap<CodeHash, RefMempoolEntry>,
    /// Entry-time index for the expiry sweep.
    by_time: BTreeSet<(i64, CodeHash)>,
    /// Beaconed address -> referral hash.
    by_address: HashMap<Address, CodeHash>,
    /// Link table: referral hash -> hashes of its in-pool children.
    children: HashMap<CodeHash, HashSet<CodeHash>>,
}

impl<K: KVStore> ReferralMempool<K> {
    pub fn new(
        cache: Arc<ReferralsCache<K>>,
        config: MempoolConfig,
        event_publisher: Option<Sender<Event>>,
    ) -> ReferralMempool<K> {
        ReferralMempool {
            state: Mutex::new(MempoolState {
                entries: IndexMap::new(),
                by_time: BTreeSet::new(),
                by_address: HashMap::new(),
                children: HashMap::new(),
            }),
            cache,
            config,
            event_publisher,
        }
    }

    /* ↓↓↓ Admission ↓↓↓ */

    /// Admit a referral the caller has already validated. Links the entry under its parent if the
    /// parent is in the pool. Returns false (leaving the pool unchanged) if an entry with this
    /// hash is already present.
    pub fn add_unchecked(&self, hash: CodeHash, entry: RefMempoolEntry) -> bool {
        Event::AddReferral(AddReferralEvent {
            timestamp: SystemTime::now(),
            referral: entry.shared_referral(),
        })
        .publish(&self.event_publisher);

        let mut state = self.state.lock().unwrap();

        if state.entries.contains_key(&hash) {
            return false;
        }

        state.by_time.insert((entry.time(), hash));
        state
            .by_address
            .insert(entry.referral().address, hash);
        state.children.insert(hash, HashSet::new());

        // Link under the parent if the parent is already pooled. The reverse never happens: a
        // parent admitted later does not adopt entries already present.
        if let Some(parent_hash) = state
            .by_address
            .get(&entry.referral().parent_address)
            .copied()
        {
            if let Some(siblings) = state.children.get_mut(&parent_hash) {
                siblings.insert(hash);
            }
        }

        state.entries.insert(hash, entry);
        true
    }

    /* ↓↓↓ Removal ↓↓↓ */

    /// The hashes of `hash` and every transitive in-pool descendant of it.
    pub fn calculate_descendants(&self, hash: &CodeHash) -> HashSet<CodeHash> {
        let state = self.state.lock().unwrap();
        let mut descendants = HashSet::new();
        state.calculate_descendants(hash, &mut descendants);
        descendants
    }

    /// Remove a referral and every descendant that depends on it.
    pub fn remove_recursive(&self, referral: &Referral, reason: RemovalReason) {
        let removed = {
            let mut state = self.state.lock().unwrap();

            if !state.entries.contains_key(&referral.hash()) {
                Vec::new()
            } else {
                let mut to_remove = HashSet::new();
                state.calculate_descendants(&referral.hash(), &mut to_remove);
                state.remove_staged(&to_remove)
            }
        };

        self.notify_removed(removed, reason);
    }

    /// Remove the referrals of a connected block, without recursing: their descendants stay
    /// pending unless the block carries them too.
    pub fn remove_for_block(&self, refs: &[ReferralRef]) {
        let removed = {
            let mut state = self.state.lock().unwrap();
            refs.iter()
                .filter_map(|referral| state.remove_unchecked(&referral.hash()))
                .collect()
        };

        self.notify_removed(removed, RemovalReason::Block);
    }

    /// Evict every entry older than `time`, together with all of its descendants, even ones newer
    /// than the cutoff. Returns the number of entries evicted.
    pub fn expire(&self, time: i64) -> usize {
        let removed = {
            let mut state = self.state.lock().unwrap();

            let expired: Vec<CodeHash> = state
                .by_time
                .iter()
                .take_while(|(entry_time, _)| *entry_time < time)
                .map(|(_, hash)| *hash)
                .collect();

            let mut stage = HashSet::new();
            for hash in expired {
                state.calculate_descendants(&hash, &mut stage);
            }
            state.remove_staged(&stage)
        };

        let evicted = removed.len();
        self.notify_removed(removed, RemovalReason::Expiry);
        evicted
    }

    /// [`expire`](Self::expire) with the cutoff implied by the configured entry expiry.
    pub fn expire_stale(&self, now: i64) -> usize {
        self.expire(now - self.config.entry_expiry.as_secs() as i64)
    }

    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.entries.clear();
        state.by_time.clear();
        state.by_address.clear();
        state.children.clear();
    }

    /* ↓↓↓ Lookups ↓↓↓ */

    pub fn get(&self, hash: &CodeHash) -> Option<ReferralRef> {
        let state = self.state.lock().unwrap();
        state.entries.get(hash).map(|entry| entry.shared_referral())
    }

    pub fn get_with_address(&self, address: &Address) -> Option<ReferralRef> {
        let state = self.state.lock().unwrap();
        state
            .by_address
            .get(address)
            .and_then(|hash| state.entries.get(hash))
            .map(|entry| entry.shared_referral())
    }

    pub fn exists_with_address(&self, address: &Address) -> bool {
        self.get_with_address(address).is_some()
    }

    /// Every pooled referral, in admission order.
    pub fn get_referrals(&self) -> Vec<ReferralRef> {
        let state = self.state.lock().unwrap();
        state
            .entries
            .values()
            .map(|entry| entry.shared_referral())
            .collect()
    }

    /// The pooled referrals that must accompany `tx`: one for each output destination that is not
    /// yet beaconed in the cache but is beaconed by an entry in the pool.
    pub fn get_referrals_for_transaction(
        &self,
        tx: &TransactionRef,
    ) -> Result<Vec<ReferralRef>, ReferralStoreError> {
        let mut unbeaconed = Vec::new();
        for output in &tx.outputs {
            let address = match extract_destination(&output.script) {
                Some(address) => address,
                None => continue,
            };

            if !self.cache.wallet_id_exists(&address)? {
                unbeaconed.push(address);
            }
        }

        let state = self.state.lock().unwrap();
        let mut seen = HashSet::new();
        let mut referrals = Vec::new();
        for address in unbeaconed {
            if let Some(hash) = state.by_address.get(&address) {
                if seen.insert(*hash) {
                    if let Some(entry) = state.entries.get(hash) {
                        referrals.push(entry.shared_referral());
                    }
                }
            }
        }
        Ok(referrals)
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Approximation of the pool's heap footprint: per-entry overhead times the entry count, plus
    /// the link table.
    pub fn dynamic_memory_usage(&self) -> usize {
        let state = self.state.lock().unwrap();
        let per_entry = mem::size_of::<RefMempoolEntry>() + 15 * mem::size_of::<usize>();
        let link_table: usize = state
            .children
            .values()
            .map(|children| {
                mem::size_of::<HashSet<CodeHash>>() + children.len() * mem::size_of::<CodeHash>()
            })
            .sum();
        per_entry * state.entries.len() + link_table
    }

    fn notify_removed(&self, removed: Vec<ReferralRef>, reason: RemovalReason) {
        for referral in removed {
            Event::RemoveReferral(RemoveReferralEvent {
                timestamp: SystemTime::now(),
                referral,
                reason,
            })
            .publish(&self.event_publisher);
        }
    }
}

impl MempoolState {
    /// Breadth-first walk down the link table, accumulating `hash` and its transitive children
    /// into `descendants`. Terminates because the link graph is a finite forest.
    fn calculate_descendants(&self, hash: &CodeHash, descendants: &mut HashSet<CodeHash>) {
        let mut stage = Vec::new();
        if !descendants.contains(hash) && self.entries.contains_key(hash) {
            stage.push(*hash);
        }

        // Only walk children not accounted for in `descendants` already: those have either
        // already been walked, or are staged to be.
        while let Some(current) = stage.pop() {
            descendants.insert(current);

            if let Some(children) = self.children.get(&current) {
                for child in children {
                    if !descendants.contains(child) {
                        stage.push(*child);
                    }
                }
            }
        }
    }

    /// Remove every staged entry from all indices. Returns the removed referrals for
    /// notification by the caller, after the lock is released.
    fn remove_staged(&mut self, stage: &HashSet<CodeHash>) -> Vec<ReferralRef> {
        stage
            .iter()
            .filter_map(|hash| self.remove_unchecked(hash))
            .collect()
    }

    fn remove_unchecked(&mut self, hash: &CodeHash) -> Option<ReferralRef> {
        let entry = self.entries.shift_remove(hash)?;

        self.by_time.remove(&(entry.time(), *hash));
        self.by_address.remove(&entry.referral().address);
        self.children.remove(hash);

        // Unlink from the parent's child set, if the parent is still pooled.
        if let Some(parent_hash) = self
            .by_address
            .get(&entry.referral().parent_address)
            .copied()
        {
            if let Some(siblings) = self.children.get_mut(&parent_hash) {
                siblings.remove(hash);
            }
        }

        Some(entry.shared_referral())
    }
}
