/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Functions that log out events.
//!
//! The referral subsystem logs using the [log](https://docs.rs/log/latest/log/) crate. To get
//! these messages printed onto a terminal or to a file, set up a
//! [logging implementation](https://docs.rs/log/latest/log/#available-logging-implementations).
//!
//! ## Log message format
//!
//! Log messages are CSVs (Comma Separated Values) with at least two values. The first two values
//! are always:
//! 1. The name of the [event](crate::events) in PascalCase (defined in this module as constants).
//! 2. The time the event was emitted (as number of seconds since the Unix Epoch).
//!
//! The rest of the values differ depending on the kind of event. For example, the following
//! snippet is how an [AddReferral](crate::events::AddReferralEvent) is printed:
//!
//! ```text
//! AddReferral, 1701329264, Id5u7f6, fNGCJyk
//! ```
//!
//! In the snippet:
//! - The third value is the first seven characters of the Base64 encoding of the beaconed
//!   address.
//! - The fourth value is the first seven characters of the Base64 encoding of the referral's
//!   code hash.

use crate::events::*;
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use log;
use std::time::SystemTime;

// Names of each event in PascalCase for printing:
pub const ADD_REFERRAL: &str = "AddReferral";
pub const REMOVE_REFERRAL: &str = "RemoveReferral";

/// Implemented by event types. Used to get a closure that logs the event.
pub(crate) trait Logger {
    /// Returns a pointer to the default logging handler for a given event type.
    fn get_logger() -> Box<dyn Fn(&Self) + Send>;
}

impl Logger for AddReferralEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |add_referral_event: &AddReferralEvent| {
            log::info!(
                "{}, {}, {}, {}",
                ADD_REFERRAL,
                secs_since_unix_epoch(add_referral_event.timestamp),
                first_seven_base64_chars(&add_referral_event.referral.address.bytes()),
                first_seven_base64_chars(&add_referral_event.referral.code_hash.bytes()),
            )
        };
        Box::new(logger)
    }
}

impl Logger for RemoveReferralEvent {
    fn get_logger() -> Box<dyn Fn(&Self) + Send> {
        let logger = |remove_referral_event: &RemoveReferralEvent| {
            log::info!(
                "{}, {}, {}, {}, {:?}",
                REMOVE_REFERRAL,
                secs_since_unix_epoch(remove_referral_event.timestamp),
                first_seven_base64_chars(&remove_referral_event.referral.address.bytes()),
                first_seven_base64_chars(&remove_referral_event.referral.code_hash.bytes()),
                remove_referral_event.reason,
            )
        };
        Box::new(logger)
    }
}

// Get a more readable representation of a bytesequence by base64-encoding it and taking the first 7 characters.
fn first_seven_base64_chars(bytes: &[u8]) -> String {
    let encoded = STANDARD_NO_PAD.encode(bytes);
    if encoded.len() > 7 {
        encoded[0..7].to_string()
    } else {
        encoded
    }
}

fn secs_since_unix_epoch(timestamp: SystemTime) -> u64 {
    timestamp
        .duration_since(SystemTime::UNIX_EPOCH)
        .expect("Event occured before the Unix Epoch.")
        .as_secs()
}
