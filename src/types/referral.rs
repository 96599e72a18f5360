/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Definitions for the 'referral' type and its methods.
//!
//! A [`Referral`] is the signed record that beacons a new [`Address`] into the network, naming its
//! referrer twice: by the referrer's code hash (`previous_referral`) and by the referrer's address
//! (`parent_address`). Referrals are immutable after creation; their identity is the
//! [`CodeHash`] of their content.

use borsh::{BorshDeserialize, BorshSerialize};
pub use sha2::Sha256 as CryptoHasher;
use sha2::Digest;
use std::sync::Arc;

use crate::types::basic::{Address, AddressType, CodeHash, SignatureBytes};

/// Weight units per virtual byte.
pub const WITNESS_SCALE_FACTOR: u64 = 4;

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Referral {
    pub address: Address,
    pub address_type: AddressType,
    pub code_hash: CodeHash,
    pub previous_referral: CodeHash,
    pub parent_address: Address,
    pub signature: SignatureBytes,
}

impl Referral {
    pub fn new(
        address_type: AddressType,
        address: Address,
        previous_referral: CodeHash,
        parent_address: Address,
        signature: SignatureBytes,
    ) -> Referral {
        Referral {
            address,
            address_type,
            code_hash: Referral::compute_code_hash(
                address_type,
                &address,
                &previous_referral,
                &parent_address,
            ),
            previous_referral,
            parent_address,
            signature,
        }
    }

    /// The content hash of a referral: the Sha256 of the Borsh serialization of its identity
    /// fields. The signature payload is not part of the identity.
    pub fn compute_code_hash(
        address_type: AddressType,
        address: &Address,
        previous_referral: &CodeHash,
        parent_address: &Address,
    ) -> CodeHash {
        let mut hasher = CryptoHasher::new();
        hasher.update(&address_type.try_to_vec().unwrap());
        hasher.update(&address.try_to_vec().unwrap());
        hasher.update(&previous_referral.try_to_vec().unwrap());
        hasher.update(&parent_address.try_to_vec().unwrap());
        CodeHash::new(hasher.finalize().into())
    }

    /// The hash a referral is keyed by in the mempool and in block ordering.
    pub fn hash(&self) -> CodeHash {
        self.code_hash
    }

    /// Checks that `code_hash` is the content hash of the other identity fields.
    pub fn is_well_formed(&self) -> bool {
        !self.address_type.is_zero()
            && !self.address.is_null()
            && self.code_hash
                == Referral::compute_code_hash(
                    self.address_type,
                    &self.address,
                    &self.previous_referral,
                    &self.parent_address,
                )
    }

    pub fn serialized_size(&self) -> u64 {
        self.try_to_vec().unwrap().len() as u64
    }
}

/// Shared pointer to an immutable referral. Mempool indices, the ordering algorithm, and event
/// payloads all hold these.
pub type ReferralRef = Arc<Referral>;

/// Weight of a referral under the block-weight accounting policy.
pub fn referral_weight(referral: &Referral) -> u64 {
    referral.serialized_size() * WITNESS_SCALE_FACTOR
}

/// Virtual size in bytes implied by `weight`, rounding up.
pub fn virtual_referral_size(weight: u64) -> u64 {
    (weight + WITNESS_SCALE_FACTOR - 1) / WITNESS_SCALE_FACTOR
}
