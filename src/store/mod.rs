/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Persistent store of the referral tree: referrals, parent links, child lists, and per-address
//! ANV entries, all durably kept in a user-provided [key-value store](kv_store::KVStore) under the
//! prefixes defined in [`paths`].
//!
//! # Atomicity
//!
//! Individual key-value writes are atomic, and every multi-key operation on [`ReferralStore`]
//! ([`insert_referral`](ReferralStore::insert_referral),
//! [`remove_referral`](ReferralStore::remove_referral),
//! [`update_anv`](ReferralStore::update_anv)) collects its writes into one
//! [`ReferralWriteBatch`](write_batch::ReferralWriteBatch) and commits them in a single
//! [`KVStore::write`](kv_store::KVStore::write), so a crash mid-operation never leaves a
//! half-linked referral or a partially propagated ANV update.
//!
//! # Corruption
//!
//! Conditions that can only arise from a corrupted database or a caller bug (a missing parent
//! when one is required, an ANV amount going negative, a stored ANV entry with a zero address
//! type or null address, an ancestor walk exceeding the configured depth cap) abort the process
//! with a diagnostic rather than being reported as recoverable errors.

pub mod invariants;

pub mod kv_store;

pub mod paths;

pub mod write_batch;

use borsh::BorshDeserialize;

use crate::config::StoreConfig;
use crate::types::basic::{Address, AddressType, Amount, AnvEntry, ChildAddresses, CodeHash};
use crate::types::referral::Referral;

use kv_store::{KVGet, KVStore, Key, ReferralStoreError};
use paths::combine;
use write_batch::ReferralWriteBatch;

/// Durable view of the referral tree over a pluggable key-value store.
#[derive(Clone)]
pub struct ReferralStore<K: KVStore> {
    kv: K,
    max_ancestor_depth: usize,
}

impl<K: KVStore> ReferralStore<K> {
    pub fn new(kv_store: K, config: StoreConfig) -> ReferralStore<K> {
        ReferralStore {
            kv: kv_store,
            max_ancestor_depth: config.max_ancestor_depth,
        }
    }

    /* ↓↓↓ Referrals ↓↓↓ */

    pub fn get_referral(&self, address: &Address) -> Result<Option<Referral>, ReferralStoreError> {
        if let Some(bytes) = self.kv.get(&combine(&paths::REFERRALS, &address.bytes())) {
            Ok(Some(Referral::deserialize(&mut &*bytes).map_err(|err| {
                ReferralStoreError::DeserializeValueError {
                    key: Key::Referral { address: *address },
                    source: err,
                }
            })?))
        } else {
            Ok(None)
        }
    }

    pub fn get_referral_by_code(
        &self,
        code: &CodeHash,
    ) -> Result<Option<Referral>, ReferralStoreError> {
        if let Some(bytes) = self.kv.get(&combine(&paths::REFERRALS, &code.bytes())) {
            Ok(Some(Referral::deserialize(&mut &*bytes).map_err(|err| {
                ReferralStoreError::DeserializeValueError {
                    key: Key::ReferralByCode { code: *code },
                    source: err,
                }
            })?))
        } else {
            Ok(None)
        }
    }

    pub fn referral_code_exists(&self, code: &CodeHash) -> bool {
        self.kv
            .get(&combine(&paths::REFERRALS, &code.bytes()))
            .is_some()
    }

    pub fn referral_address_exists(&self, address: &Address) -> bool {
        self.kv
            .get(&combine(&paths::REFERRALS, &address.bytes()))
            .is_some()
    }

    /// Insert a referral: its rows under the referral prefix, a zeroed ANV entry, and, when the
    /// parent referral resolves, the child's parent link and its slot in the parent's child list.
    ///
    /// Referrals in a block are inserted parents-before-children (the ordering pass guarantees
    /// this), so a missing parent with `allow_no_parent == false` is a caller bug and aborts.
    /// With `allow_no_parent == true` the referral is admitted as a root: no linkage is written.
    pub fn insert_referral(
        &mut self,
        referral: &Referral,
        allow_no_parent: bool,
    ) -> Result<(), ReferralStoreError> {
        log::debug!(
            "Inserting referral {} code {} parent {}",
            referral.address,
            referral.code_hash,
            referral.previous_referral
        );

        let mut wb = ReferralWriteBatch::new();

        wb.set_referral(referral)?;
        wb.set_anv(&AnvEntry::new(
            referral.address_type,
            referral.address,
            Amount::ZERO,
        ))?;

        // Referrals are written in order, so the parent referral should already be present. We
        // can then write the child->parent mapping and extend the parent's child list.
        if let Some(parent_referral) = self.get_referral(&referral.parent_address)? {
            wb.set_parent(&referral.address, &parent_referral.address)?;

            let mut children = self.get_children(&parent_referral.address)?;
            children.push(referral.address);
            wb.set_children(&parent_referral.address, &children)?;
        } else if !allow_no_parent {
            panic!(
                "parent referral missing: referral {} names parent {} which is not in the store",
                referral.address, referral.parent_address
            );
        } else {
            log::warn!(
                "Parent missing for code {}, admitting {} as a root",
                referral.previous_referral,
                referral.address
            );
        }

        self.write(wb);
        Ok(())
    }

    /// Roll a referral back out of the store: its rows, its parent link, and its slot in the
    /// parent's child list. The referral's ANV entry is left in place; rolling back propagated
    /// amounts is the caller's responsibility via [`update_anv`](Self::update_anv) with negated
    /// deltas.
    pub fn remove_referral(&mut self, referral: &Referral) -> Result<(), ReferralStoreError> {
        log::debug!("Removing referral {}", referral.address);

        let mut wb = ReferralWriteBatch::new();

        wb.delete_referral(&referral.address, &referral.code_hash);
        wb.delete_parent(&referral.address);

        if let Some(parent_referral) = self.get_referral(&referral.parent_address)? {
            let mut children = self.get_children(&parent_referral.address)?;
            children.remove(&referral.address);
            wb.set_children(&parent_referral.address, &children)?;
        }

        self.write(wb);
        Ok(())
    }

    /* ↓↓↓ Parent links and child lists ↓↓↓ */

    pub fn get_referrer(&self, address: &Address) -> Result<Option<Address>, ReferralStoreError> {
        if let Some(bytes) = self.kv.get(&combine(&paths::PARENTS, &address.bytes())) {
            Ok(Some(Address::deserialize(&mut &*bytes).map_err(|err| {
                ReferralStoreError::DeserializeValueError {
                    key: Key::Parent { address: *address },
                    source: err,
                }
            })?))
        } else {
            Ok(None)
        }
    }

    pub fn wallet_id_exists(&self, address: &Address) -> bool {
        self.kv
            .get(&combine(&paths::PARENTS, &address.bytes()))
            .is_some()
    }

    /// The addresses beaconed under `address`, in insertion order. Empty when none have been.
    pub fn get_children(&self, address: &Address) -> Result<ChildAddresses, ReferralStoreError> {
        if let Some(bytes) = self.kv.get(&combine(&paths::CHILDREN, &address.bytes())) {
            Ok(
                ChildAddresses::deserialize(&mut &*bytes).map_err(|err| {
                    ReferralStoreError::DeserializeValueError {
                        key: Key::Children { address: *address },
                        source: err,
                    }
                })?,
            )
        } else {
            Ok(ChildAddresses::new())
        }
    }

    /* ↓↓↓ ANV ↓↓↓ */

    pub fn get_anv(&self, address: &Address) -> Result<Option<AnvEntry>, ReferralStoreError> {
        if let Some(bytes) = self.kv.get(&combine(&paths::ANVS, &address.bytes())) {
            Ok(Some(AnvEntry::deserialize(&mut &*bytes).map_err(|err| {
                ReferralStoreError::DeserializeValueError {
                    key: Key::Anv { address: *address },
                    source: err,
                }
            })?))
        } else {
            Ok(None)
        }
    }

    /// Add `delta` (which is negative for a debit) to the ANV of `start_address` and of every
    /// ancestor up to the tree root.
    ///
    /// All hop writes are collected into one batch and committed atomically, so a failed read
    /// partway up the chain leaves every ANV entry untouched.
    pub fn update_anv(
        &mut self,
        address_type: AddressType,
        start_address: &Address,
        delta: Amount,
    ) -> Result<(), ReferralStoreError> {
        log::debug!("UpdateANV: {} {} + {}", address_type, start_address, delta);

        let mut wb = ReferralWriteBatch::new();
        let mut address = Some(*start_address);
        let mut level: usize = 0;

        // The level cap guards against cycles in the stored parent links.
        while let Some(current) = address {
            if level >= self.max_ancestor_depth {
                break;
            }

            let mut anv = self
                .get_anv(&current)?
                .ok_or(ReferralStoreError::ValueNotFound {
                    key: Key::Anv { address: current },
                })?;

            if anv.address_type.is_zero() || anv.address.is_null() {
                panic!(
                    "referral store corrupt: malformed ANV entry for address {}",
                    current
                );
            }

            log::debug!("\t{} {} {} + {}", level, anv.address, anv.amount, delta);

            anv.amount += delta;
            if anv.amount.is_negative() {
                panic!(
                    "referral store corrupt: ANV of address {} went negative",
                    current
                );
            }

            wb.set_anv(&anv)?;

            address = self.get_referrer(&current)?;
            level += 1;
        }

        // Parent links must form a forest. A walk this deep means a cycle.
        if level >= self.max_ancestor_depth {
            panic!("referral store corrupt: ancestor walk exceeded {} levels, cycle in parent links", self.max_ancestor_depth);
        }

        self.write(wb);
        Ok(())
    }

    /// Every ANV entry in the store, in address order.
    ///
    /// Scans a snapshot, so a concurrent writer cannot tear the view. Rows that fail to decode
    /// are skipped.
    pub fn get_all_anvs(&self) -> Vec<AnvEntry> {
        let snapshot = self.kv.snapshot();
        snapshot
            .iter_prefix(&paths::ANVS)
            .filter_map(|(_, value)| AnvEntry::deserialize(&mut &*value).ok())
            .collect()
    }

    /// Like [`get_all_anvs`](Self::get_all_anvs), keeping only entries whose address type is
    /// rewardable.
    pub fn get_all_rewardable_anvs(&self) -> Vec<AnvEntry> {
        let snapshot = self.kv.snapshot();
        snapshot
            .iter_prefix(&paths::ANVS)
            .filter_map(|(_, value)| AnvEntry::deserialize(&mut &*value).ok())
            .filter(|anv| anv.address_type.is_rewardable())
            .collect()
    }

    fn write(&mut self, wb: ReferralWriteBatch<K::WriteBatch>) {
        self.kv.write(wb.0)
    }

    pub(crate) fn kv(&self) -> &K {
        &self.kv
    }
}
