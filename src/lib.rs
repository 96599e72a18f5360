/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The referral subsystem of a cryptocurrency node: the persistent and in-memory machinery that
//! tracks the tree of referrals beaconing new addresses into the network, and maintains each
//! address's Aggregate Network Value (ANV).
//!
//! The crate's components, leaves first:
//! - [`store`] durably persists referrals, parent links, child lists, and ANV entries over a
//!   user-provided ordered key-value store, and propagates ANV deltas up ancestor chains.
//! - [`cache`] fronts the store with read-through per-address lookups and a deferred flush of
//!   pending inserts.
//! - [`mempool`] holds unconfirmed referrals with a dependency link table, so descendants are
//!   evicted atomically with their ancestors.
//! - [`ordering`] reorders a block's referrals into a parents-before-children insertion sequence
//!   and rejects blocks that admit none.
//!
//! [`events`], [`event_bus`], and [`logging`] deliver mempool lifecycle notifications to
//! subscriber handlers; [`config`] carries the operator knobs.

pub mod cache;

pub mod config;

pub mod event_bus;

pub mod events;

pub mod logging;

pub mod mempool;

pub mod ordering;

pub mod store;

pub mod types;

// Re-exports
pub use cache::ReferralsCache;
pub use config::Configuration;
pub use mempool::ReferralMempool;
pub use ordering::order_referrals;
pub use store::ReferralStore;
