/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Write-through cache fronting the [referral store](crate::store::ReferralStore).
//!
//! The cache memoizes two per-address lookups: address → referral and address → referrer. Both
//! maps are populated by read-through: a miss consults the store and, on a hit there, inserts the
//! value into the cache on the way out.
//!
//! Entries arrive in the cache in two ways, and the difference matters to
//! [`flush`](ReferralsCache::flush):
//! - **Clean** entries were populated by read-through. They already live in the store and are
//!   simply dropped when the cache is flushed.
//! - **Dirty** entries were inserted through [`insert_referral`](ReferralsCache::insert_referral)
//!   and are queued, in insertion order and together with their `allow_no_parent` flag, until
//!   `flush` writes them into the store.
//!
//! ## Locking
//!
//! One mutex guards the maps. It is never held across a store dispatch: reads release it before
//! consulting the store and re-acquire it to populate. Two concurrent read-throughs of the same
//! key may both populate; the second insert writes the same value, so this is harmless.

use std::collections::HashMap;
use std::sync::Mutex;

use indexmap::IndexMap;

use crate::store::kv_store::{KVStore, ReferralStoreError};
use crate::store::ReferralStore;
use crate::types::basic::Address;
use crate::types::referral::Referral;

pub struct ReferralsCache<K: KVStore> {
    state: Mutex<CacheState>,
    store: Mutex<ReferralStore<K>>,
}

struct CacheState {
    referrals: HashMap<Address, Referral>,
    wallet_to_referrer: HashMap<Address, Address>,
    /// Addresses of dirty referrals awaiting flush, in insertion order, with the
    /// `allow_no_parent` flag each was inserted with. Every key here also keys `referrals`.
    pending: IndexMap<Address, bool>,
}

impl<K: KVStore> ReferralsCache<K> {
    pub fn new(store: ReferralStore<K>) -> ReferralsCache<K> {
        ReferralsCache {
            state: Mutex::new(CacheState {
                referrals: HashMap::new(),
                wallet_to_referrer: HashMap::new(),
                pending: IndexMap::new(),
            }),
            store: Mutex::new(store),
        }
    }

    /* ↓↓↓ Referral lookups ↓↓↓ */

    pub fn get_referral(
        &self,
        address: &Address,
    ) -> Result<Option<Referral>, ReferralStoreError> {
        {
            let state = self.state.lock().unwrap();
            if let Some(referral) = state.referrals.get(address) {
                return Ok(Some(referral.clone()));
            }
        }

        if let Some(referral) = self.store.lock().unwrap().get_referral(address)? {
            self.insert_referral_into_cache(referral.clone());
            return Ok(Some(referral));
        }
        Ok(None)
    }

    pub fn referral_address_exists(&self, address: &Address) -> Result<bool, ReferralStoreError> {
        Ok(self.get_referral(address)?.is_some())
    }

    /* ↓↓↓ Referrer lookups ↓↓↓ */

    pub fn get_referrer(&self, address: &Address) -> Result<Option<Address>, ReferralStoreError> {
        {
            let state = self.state.lock().unwrap();
            if let Some(parent) = state.wallet_to_referrer.get(address) {
                return Ok(Some(*parent));
            }
        }

        if let Some(parent) = self.store.lock().unwrap().get_referrer(address)? {
            self.insert_wallet_relationship(*address, parent);
            return Ok(Some(parent));
        }
        Ok(None)
    }

    /// Whether `address` has been beaconed under some referrer.
    pub fn wallet_id_exists(&self, address: &Address) -> Result<bool, ReferralStoreError> {
        Ok(self.get_referrer(address)?.is_some())
    }

    /* ↓↓↓ Population helpers ↓↓↓ */

    pub(crate) fn insert_referral_into_cache(&self, referral: Referral) {
        let mut state = self.state.lock().unwrap();
        state.referrals.insert(referral.address, referral);
    }

    pub(crate) fn insert_wallet_relationship(&self, child: Address, parent: Address) {
        let mut state = self.state.lock().unwrap();
        state.wallet_to_referrer.insert(child, parent);
    }

    /* ↓↓↓ Mutations ↓↓↓ */

    /// Queue a referral for insertion into the store at the next [`flush`](Self::flush). The
    /// referral is immediately visible to cache reads.
    pub fn insert_referral(&self, referral: Referral, allow_no_parent: bool) {
        let mut state = self.state.lock().unwrap();
        state.pending.insert(referral.address, allow_no_parent);
        state.referrals.insert(referral.address, referral);
    }

    /// Evict a referral from the cache and delete it from the store.
    pub fn remove_referral(&self, referral: &Referral) -> Result<(), ReferralStoreError> {
        {
            let mut state = self.state.lock().unwrap();
            state.referrals.remove(&referral.address);
            state.wallet_to_referrer.remove(&referral.address);
            state.pending.shift_remove(&referral.address);
        }

        self.store.lock().unwrap().remove_referral(referral)
    }

    /// Write every dirty referral into the store, in insertion order, then drop the flushed and
    /// clean entries.
    ///
    /// On a mid-flush store failure the unflushed tail stays queued, so a later `flush` retries
    /// it.
    pub fn flush(&self) -> Result<(), ReferralStoreError> {
        let to_flush: Vec<(Referral, bool)> = {
            let state = self.state.lock().unwrap();
            state
                .pending
                .iter()
                .map(|(address, allow_no_parent)| {
                    let referral = state
                        .referrals
                        .get(address)
                        .expect("every pending address keys a cached referral")
                        .clone();
                    (referral, *allow_no_parent)
                })
                .collect()
        };

        {
            let mut store = self.store.lock().unwrap();
            for (i, (referral, allow_no_parent)) in to_flush.iter().enumerate() {
                if let Err(err) = store.insert_referral(referral, *allow_no_parent) {
                    log::error!(
                        "Flush failed after writing {} of {} pending referrals: {}",
                        i,
                        to_flush.len(),
                        err
                    );
                    let mut state = self.state.lock().unwrap();
                    for (flushed, _) in &to_flush[..i] {
                        state.pending.shift_remove(&flushed.address);
                    }
                    return Err(err);
                }
            }
        }

        let mut state = self.state.lock().unwrap();
        for (referral, _) in &to_flush {
            state.pending.shift_remove(&referral.address);
        }
        // Entries inserted while the store writes were in flight stay queued; everything else is
        // dropped and will be repopulated by read-through.
        let still_pending: Vec<Address> = state.pending.keys().copied().collect();
        state
            .referrals
            .retain(|address, _| still_pending.contains(address));
        state.wallet_to_referrer.clear();
        Ok(())
    }

    /// Number of referrals currently held in the cache, dirty and clean.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().referrals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
