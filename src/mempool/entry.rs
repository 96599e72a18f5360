/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! A referral as it sits in the mempool: the record itself plus the admission metadata the pool's
//! indices and eviction policies key on.

use std::mem;

use crate::types::basic::BlockHeight;
use crate::types::referral::{referral_weight, virtual_referral_size, ReferralRef};

#[derive(Clone, Debug)]
pub struct RefMempoolEntry {
    referral: ReferralRef,
    /// Local time at which the referral entered the pool. Drives the expiry sweep.
    time: i64,
    /// Chain height at admission.
    entry_height: BlockHeight,
    weight: u64,
    usage_size: usize,
}

impl RefMempoolEntry {
    pub fn new(referral: ReferralRef, time: i64, entry_height: BlockHeight) -> RefMempoolEntry {
        let weight = referral_weight(&referral);
        let usage_size = mem::size_of::<RefMempoolEntry>() + referral.serialized_size() as usize;
        RefMempoolEntry {
            referral,
            time,
            entry_height,
            weight,
            usage_size,
        }
    }

    pub fn referral(&self) -> &ReferralRef {
        &self.referral
    }

    pub fn shared_referral(&self) -> ReferralRef {
        self.referral.clone()
    }

    pub fn time(&self) -> i64 {
        self.time
    }

    pub fn entry_height(&self) -> BlockHeight {
        self.entry_height
    }

    pub fn weight(&self) -> u64 {
        self.weight
    }

    /// Virtual size in bytes implied by the entry's weight.
    pub fn size(&self) -> u64 {
        virtual_referral_size(self.weight)
    }

    /// Approximate heap footprint of this entry.
    pub fn usage_size(&self) -> usize {
        self.usage_size
    }
}
