/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Byte-prefixes that specify where each referral-subsystem variable is stored in the
//! user-provided key-value store.
//!
//! # Storage of state variables
//!
//! Every key is the concatenation of a single-byte prefix and the Borsh serialization of the key
//! body. Because the key bodies are fixed-width byte arrays, every logical namespace occupies one
//! contiguous key range, which is what makes the prefix scans in
//! [`get_all_anvs`](crate::store::ReferralStore::get_all_anvs) work.
//!
//! | Prefix | Key body | Value |
//! |---|---|---|
//! | [`REFERRALS`] | `Address` (20 bytes) or `CodeHash` (32 bytes) | `Referral` |
//! | [`PARENTS`] | child `Address` | parent `Address` |
//! | [`CHILDREN`] | parent `Address` | `ChildAddresses` |
//! | [`REFERRALS_BY_KEY_ID`] | key id (`Address`) | reserved |
//! | [`ANVS`] | `Address` | `AnvEntry` |
//!
//! Referrals are stored under [`REFERRALS`] twice: keyed by the beaconed address, and keyed by the
//! referral's code hash. The two key bodies differ in width, so the rows never collide, and block
//! ordering can resolve a root's `previous_referral` without scanning.
//!
//! This layout is an on-disk compatibility surface: any implementation sharing a database with
//! this one must preserve these prefixes and encodings.

/// Referrals, keyed by beaconed address and by code hash.
pub const REFERRALS: [u8; 1] = *b"r";
/// Child address → parent address.
pub const PARENTS: [u8; 1] = *b"p";
/// Parent address → insertion-ordered child addresses.
pub const CHILDREN: [u8; 1] = *b"c";
/// Reserved: index of referrals by key id.
pub const REFERRALS_BY_KEY_ID: [u8; 1] = *b"k";
/// ANV entries, keyed by address.
pub const ANVS: [u8; 1] = *b"a";

/// Concatenate two byteslices into one vector.
pub fn combine(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut res = Vec::with_capacity(a.len() + b.len());
    res.extend_from_slice(a);
    res.extend_from_slice(b);
    res
}
