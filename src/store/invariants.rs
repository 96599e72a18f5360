/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Predicates over the invariant properties of a stored referral tree.
//!
//! A healthy store satisfies all of:
//! 1. Linkage symmetry: an address appears in a parent's child list if and only if its parent
//!    link names that parent.
//! 2. ANV well-formedness: every stored ANV entry has a nonzero address type, a non-null address,
//!    and a non-negative amount.
//! 3. ANV coverage: an address has a referral if and only if it has an ANV entry.
//!
//! The store's operations preserve these properties; the predicates here let tests (and recovery
//! tooling) check them wholesale against a live store.

use borsh::BorshDeserialize;

use crate::types::basic::Address;

use super::kv_store::{KVGet, KVStore, ReferralStoreError};
use super::paths;
use super::ReferralStore;

/// Width of an address-keyed key under the referral prefix; code-hash-keyed rows are wider.
const ADDRESS_KEY_LEN: usize = 1 + 20;

fn address_of_key(key: &[u8]) -> Option<Address> {
    Address::deserialize(&mut &key[1..]).ok()
}

/// The addresses keying rows under `prefix`. The snapshot is dropped before returning, so callers
/// are free to dispatch reads against the live store afterwards.
fn addresses_under<K: KVStore>(store: &ReferralStore<K>, prefix: &[u8]) -> Option<Vec<Address>> {
    store
        .kv()
        .snapshot()
        .iter_prefix(prefix)
        .filter(|(key, _)| key.len() == ADDRESS_KEY_LEN)
        .map(|(key, _)| address_of_key(&key))
        .collect()
}

/// Checks linkage symmetry: `c ∈ children(p)` ⇔ `parent-of(c) = p`.
pub fn parent_child_links_consistent<K: KVStore>(
    store: &ReferralStore<K>,
) -> Result<bool, ReferralStoreError> {
    let children_of = match addresses_under(store, &paths::PARENTS) {
        Some(children) => children,
        None => return Ok(false),
    };
    for child in children_of {
        let parent = match store.get_referrer(&child)? {
            Some(address) => address,
            None => return Ok(false),
        };
        if !store.get_children(&parent)?.contains(&child) {
            return Ok(false);
        }
    }

    let parents = match addresses_under(store, &paths::CHILDREN) {
        Some(parents) => parents,
        None => return Ok(false),
    };
    for parent in parents {
        for child in store.get_children(&parent)?.iter() {
            if store.get_referrer(child)? != Some(parent) {
                return Ok(false);
            }
        }
    }

    Ok(true)
}

/// Checks that every stored ANV entry is well-formed.
pub fn anv_entries_well_formed<K: KVStore>(store: &ReferralStore<K>) -> bool {
    store.get_all_anvs().iter().all(|anv| {
        !anv.address_type.is_zero() && !anv.address.is_null() && !anv.amount.is_negative()
    })
}

/// Checks that referrals and ANV entries cover exactly the same addresses.
pub fn every_referral_has_anv<K: KVStore>(
    store: &ReferralStore<K>,
) -> Result<bool, ReferralStoreError> {
    let beaconed = match addresses_under(store, &paths::REFERRALS) {
        Some(addresses) => addresses,
        None => return Ok(false),
    };
    for address in beaconed {
        if store.get_anv(&address)?.is_none() {
            return Ok(false);
        }
    }

    for anv in store.get_all_anvs() {
        if !store.referral_address_exists(&anv.address) {
            return Ok(false);
        }
    }

    Ok(true)
}
