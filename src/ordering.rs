/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Topological ordering of a block's referrals.
//!
//! A block carries its referrals in arbitrary order, but the [store](crate::store::ReferralStore)
//! requires parents before children. [`order_referrals`] rewrites the sequence into a valid
//! insertion order by building a dependency forest and walking it breadth-first, and rejects the
//! block when no such order exists.

use std::collections::{HashMap, VecDeque};
use std::fmt::Display;

use crate::store::kv_store::KVStore;
use crate::store::ReferralStore;
use crate::types::basic::CodeHash;
use crate::types::referral::ReferralRef;

/// Why a block's referral set admits no parents-before-children order.
#[derive(Debug, PartialEq, Eq)]
pub enum OrderReferralsError {
    /// No referral's `previous_referral` resolves in the store: the whole set dangles off
    /// unknown ancestry.
    NoRoots,
    /// The breadth-first walk from the roots did not cover the input exactly: a disconnected
    /// subtree, a cycle among the block's referrals, or an orphaned child.
    IncompleteCover,
}

impl Display for OrderReferralsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderReferralsError::NoRoots => {
                write!(f, "no referral in the block resolves to stored ancestry")
            }
            OrderReferralsError::IncompleteCover => {
                write!(f, "block referrals do not form a forest rooted in the store")
            }
        }
    }
}

impl std::error::Error for OrderReferralsError {}

/// Reorder `refs` in place so that every referral appears after its parent.
///
/// Roots are the referrals whose `previous_referral` already exists in the store; they keep their
/// original relative order, and each parent's children appear in first-seen order. Runs in time
/// linear in the input size. An empty input is trivially ordered.
pub fn order_referrals<K: KVStore>(
    store: &ReferralStore<K>,
    refs: &mut Vec<ReferralRef>,
) -> Result<(), OrderReferralsError> {
    if refs.is_empty() {
        return Ok(());
    }

    let (roots, non_roots): (Vec<ReferralRef>, Vec<ReferralRef>) = refs
        .iter()
        .cloned()
        .partition(|referral| store.referral_code_exists(&referral.previous_referral));

    // If we don't have any roots, we have an invalid block.
    if roots.is_empty() {
        return Err(OrderReferralsError::NoRoots);
    }

    let mut graph: HashMap<CodeHash, Vec<ReferralRef>> = HashMap::new();

    for root in &roots {
        graph.entry(root.code_hash).or_default();
    }

    for referral in non_roots {
        graph
            .entry(referral.previous_referral)
            .or_default()
            .push(referral);
    }

    let mut to_process: VecDeque<ReferralRef> = roots.into();

    // Breadth-first walk through the forest, writing the correct ordering back into `refs`.
    let mut replace = 0;
    while replace < refs.len() {
        let referral = match to_process.pop_front() {
            Some(referral) => referral,
            None => break,
        };

        if let Some(children) = graph.get(&referral.code_hash) {
            to_process.extend(children.iter().cloned());
        }

        refs[replace] = referral;
        replace += 1;
    }

    // If either of these conditions is not met, we have an invalid block.
    if replace != refs.len() || !to_process.is_empty() {
        return Err(OrderReferralsError::IncompleteCover);
    }

    Ok(())
}
