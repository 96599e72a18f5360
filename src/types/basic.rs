/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! "Inert" types of the referral subsystem, i.e., those that are stored, sent around, and
//! inspected, but have no active behavior. These types follow the newtype pattern, and the API for
//! using them is defined in this module.
//!
//! All of the types here are Borsh-serializable. Fixed-width byte newtypes ([`Address`],
//! [`CodeHash`], [`SignatureBytes`]) serialize as raw arrays, so keys formed from them occupy
//! contiguous ranges in the backing key-value store.

use borsh::{BorshDeserialize, BorshSerialize};
use std::{
    fmt::{self, Debug, Display, Formatter},
    ops::{Add, AddAssign, Neg},
};

/// 160-bit identifier of a beaconed wallet.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, BorshDeserialize, BorshSerialize)]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zero sentinel. Never a valid beaconed wallet.
    pub const NULL: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 20] {
        self.0
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl Debug for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// 256-bit content hash identifying a referral. Given a
/// [referral][crate::types::referral::Referral], the hash is obtained
/// [like this][crate::types::referral::Referral::compute_code_hash].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, BorshDeserialize, BorshSerialize)]
pub struct CodeHash([u8; 32]);

impl CodeHash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 32] {
        self.0
    }
}

impl Display for CodeHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl Debug for CodeHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// Small integer tag describing the form of a beaconed address. Never zero in a valid referral or
/// stored ANV entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, BorshDeserialize, BorshSerialize)]
pub struct AddressType(u8);

impl AddressType {
    pub const fn new(tag: u8) -> Self {
        Self(tag)
    }

    pub const fn int(&self) -> u8 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Whether entries of this type participate in reward computation. Tags 1 and 2 denote the
    /// rewardable forms.
    pub fn is_rewardable(&self) -> bool {
        self.0 == 1 || self.0 == 2
    }
}

impl Display for AddressType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Signed monetary amount. ANV amounts may be credited or debited, but must never become negative
/// after an update.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize,
)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn new(int: i64) -> Self {
        Self(int)
    }

    pub const fn int(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Add<Amount> for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign<Amount> for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        self.0 += rhs.0
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Self::Output {
        Amount(-self.0)
    }
}

/// Height of the block at which a mempool entry was admitted.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, BorshDeserialize, BorshSerialize,
)]
pub struct BlockHeight(u64);

impl BlockHeight {
    pub const fn new(int: u64) -> Self {
        Self(int)
    }

    pub const fn int(&self) -> u64 {
        self.0
    }
}

impl Display for BlockHeight {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Opaque signature payload carried by a referral. The subsystem stores and round-trips it but
/// never verifies it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, BorshDeserialize, BorshSerialize)]
pub struct SignatureBytes([u8; 64]);

impl SignatureBytes {
    pub const fn new(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub const fn bytes(&self) -> [u8; 64] {
        self.0
    }
}

impl Debug for SignatureBytes {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureBytes(..)")
    }
}

/// Ordered sequence of the child addresses beaconed under a parent address, in insertion order.
///
/// Insertion order is semantic: the stored list replays the order in which referrals were
/// inserted, so this is a sequence, not a set.
#[derive(Clone, Debug, PartialEq, Eq, BorshDeserialize, BorshSerialize, Default)]
pub struct ChildAddresses(Vec<Address>);

impl ChildAddresses {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub const fn vec(&self) -> &Vec<Address> {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Address> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.0.contains(address)
    }

    pub(crate) fn push(&mut self, address: Address) {
        self.0.push(address)
    }

    /// Remove every occurrence of `address`, preserving the relative order of the remaining
    /// children.
    pub(crate) fn remove(&mut self, address: &Address) {
        self.0.retain(|child| child != address)
    }
}

impl From<Vec<Address>> for ChildAddresses {
    fn from(addresses: Vec<Address>) -> Self {
        Self(addresses)
    }
}

/// The stored ANV triple: `(addressType, address, amount)`.
///
/// A well-formed entry has a nonzero `address_type` and a non-null `address`; its `amount` starts
/// at zero when the owning referral is inserted and is only changed by
/// [`update_anv`](crate::store::ReferralStore::update_anv).
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshDeserialize, BorshSerialize)]
pub struct AnvEntry {
    pub address_type: AddressType,
    pub address: Address,
    pub amount: Amount,
}

impl AnvEntry {
    pub fn new(address_type: AddressType, address: Address, amount: Amount) -> Self {
        Self {
            address_type,
            address,
            amount,
        }
    }
}
