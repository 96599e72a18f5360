/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! The thin slice of the transaction model the referral subsystem touches.
//!
//! The mempool needs exactly one question answered about a transaction: which addresses do its
//! outputs pay, so that the referrals beaconing those addresses can be attached to the
//! transaction's relay. Everything else about transactions (inputs, witnesses, fee logic) lives
//! outside this crate.

use borsh::{BorshDeserialize, BorshSerialize};
use std::sync::Arc;

use crate::types::basic::{Address, AddressType, Amount};

/// An output script, reduced to the forms the referral subsystem can distinguish.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Script {
    /// Pays a beaconable address.
    PayToAddress {
        address_type: AddressType,
        address: Address,
    },
    /// Provably unspendable data carrier. Has no destination.
    DataCarrier(Vec<u8>),
    /// Anything this crate cannot decode. Has no destination.
    NonStandard,
}

/// Extract the destination address of an output script. Returns `None` for unspendable and
/// non-standard scripts, which callers skip.
pub fn extract_destination(script: &Script) -> Option<Address> {
    match script {
        Script::PayToAddress { address, .. } => Some(*address),
        Script::DataCarrier(_) | Script::NonStandard => None,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct TxOutput {
    pub value: Amount,
    pub script: Script,
}

#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Transaction {
    pub outputs: Vec<TxOutput>,
}

pub type TransactionRef = Arc<Transaction>;
