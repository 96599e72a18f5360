/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Typed write batch over the referral keyspace.
//!
//! [`ReferralWriteBatch`] abstracts the forming of prefixed keys away from
//! [`ReferralStore`](crate::store::ReferralStore): store operations collect their sets and
//! deletes here and commit them with a single atomic [`KVStore::write`](super::kv_store::KVStore),
//! so a multi-key operation (referral row + ANV row + parent link + child list) either lands
//! entirely or not at all.

use borsh::BorshSerialize;

use crate::types::basic::{Address, AnvEntry, ChildAddresses, CodeHash};
use crate::types::referral::Referral;

use super::kv_store::{Key, ReferralStoreError, WriteBatch};
use super::paths::{self, combine};

pub struct ReferralWriteBatch<W: WriteBatch>(pub(super) W);

impl<W: WriteBatch> ReferralWriteBatch<W> {
    pub(crate) fn new() -> ReferralWriteBatch<W> {
        ReferralWriteBatch(W::new())
    }

    /* ↓↓↓ Referral rows ↓↓↓ */

    pub fn set_referral(&mut self, referral: &Referral) -> Result<(), ReferralStoreError> {
        let value =
            referral
                .try_to_vec()
                .map_err(|err| ReferralStoreError::SerializeValueError {
                    key: Key::Referral {
                        address: referral.address,
                    },
                    source: err,
                })?;
        self.0.set(
            &combine(&paths::REFERRALS, &referral.address.bytes()),
            &value,
        );
        self.0.set(
            &combine(&paths::REFERRALS, &referral.code_hash.bytes()),
            &value,
        );
        Ok(())
    }

    pub fn delete_referral(&mut self, address: &Address, code_hash: &CodeHash) {
        self.0.delete(&combine(&paths::REFERRALS, &address.bytes()));
        self.0
            .delete(&combine(&paths::REFERRALS, &code_hash.bytes()));
    }

    /* ↓↓↓ Parent links ↓↓↓ */

    pub fn set_parent(
        &mut self,
        child: &Address,
        parent: &Address,
    ) -> Result<(), ReferralStoreError> {
        Ok(self.0.set(
            &combine(&paths::PARENTS, &child.bytes()),
            &parent
                .try_to_vec()
                .map_err(|err| ReferralStoreError::SerializeValueError {
                    key: Key::Parent { address: *child },
                    source: err,
                })?,
        ))
    }

    pub fn delete_parent(&mut self, child: &Address) {
        self.0.delete(&combine(&paths::PARENTS, &child.bytes()));
    }

    /* ↓↓↓ Child lists ↓↓↓ */

    pub fn set_children(
        &mut self,
        parent: &Address,
        children: &ChildAddresses,
    ) -> Result<(), ReferralStoreError> {
        Ok(self.0.set(
            &combine(&paths::CHILDREN, &parent.bytes()),
            &children
                .try_to_vec()
                .map_err(|err| ReferralStoreError::SerializeValueError {
                    key: Key::Children { address: *parent },
                    source: err,
                })?,
        ))
    }

    /* ↓↓↓ ANV entries ↓↓↓ */

    pub fn set_anv(&mut self, entry: &AnvEntry) -> Result<(), ReferralStoreError> {
        Ok(self.0.set(
            &combine(&paths::ANVS, &entry.address.bytes()),
            &entry
                .try_to_vec()
                .map_err(|err| ReferralStoreError::SerializeValueError {
                    key: Key::Anv {
                        address: entry.address,
                    },
                    source: err,
                })?,
        ))
    }
}
