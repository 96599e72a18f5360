/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Types common across the referral subsystem.
//!
//! [`basic`] holds the inert newtypes, [`referral`] the referral record itself and its weight
//! policy, and [`transaction`] the thin transaction surface the mempool inspects.

pub mod basic;

pub mod referral;

pub mod transaction;
