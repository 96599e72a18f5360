/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Notifications that are emitted when referrals enter and leave the mempool.
//!
//! ## Event enum
//!
//! Each significant mempool occurrence corresponds to a variant of the [event enum](Event). Each
//! variant tuple contains an inner struct type storing information that summarizes the event,
//! always including a timestamp corresponding to the exact time when the event occurred.
//!
//! ## Registering event handlers
//!
//! Library users can register event handler closures, which are internally called by the
//! [event bus](crate::event_bus::start_event_bus) thread when the handler's particular event
//! variant happens. Default handlers that log out events can be enabled via
//! [`Configuration::log_events`](crate::config::Configuration).
//!
//! ## Timing
//!
//! Events are always delivered outside the mempool lock: an [`AddReferralEvent`] is published
//! before the lock is acquired for admission, and a [`RemoveReferralEvent`] after the lock has
//! been released by the evicting operation.

use std::sync::mpsc::Sender;
use std::time::SystemTime;

use crate::types::referral::ReferralRef;

/// Enumerates all events defined for the referral subsystem.
pub enum Event {
    AddReferral(AddReferralEvent),
    RemoveReferral(RemoveReferralEvent),
}

impl Event {
    /// Publishes a given instance of the [`Event`] enum on the event publisher channel (if the
    /// channel is defined).
    pub fn publish(self, event_publisher: &Option<Sender<Event>>) {
        if let Some(event_publisher) = event_publisher {
            let _ = event_publisher.send(self);
        }
    }
}

/// An unconfirmed referral was admitted into the mempool.
pub struct AddReferralEvent {
    pub timestamp: SystemTime,
    pub referral: ReferralRef,
}

/// A referral left the mempool, together with why.
pub struct RemoveReferralEvent {
    pub timestamp: SystemTime,
    pub referral: ReferralRef,
    pub reason: RemovalReason,
}

/// Why a referral left the mempool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemovalReason {
    /// Manually removed or reason not recorded.
    Unknown,
    /// Evicted by the expiry sweep.
    Expiry,
    /// Entered a block.
    Block,
    /// Conflicted with an accepted referral.
    Conflict,
    /// Removed during chain reorganization.
    Reorg,
}
