pub(crate) mod mem_db;

use std::{io, sync::Once, thread};

use log::LevelFilter;
use rand::Rng;

use referrals_rs::config::StoreConfig;
use referrals_rs::store::ReferralStore;
use referrals_rs::types::basic::{Address, AddressType, CodeHash, SignatureBytes};
use referrals_rs::types::referral::Referral;

use self::mem_db::MemDB;

static LOGGER_INIT: Once = Once::new();

// Set up a logger that logs all log messages with level `level` and above.
pub(crate) fn setup_logger(level: LevelFilter) {
    LOGGER_INIT.call_once(|| {
        fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "[{:?}][{}] {}",
                    thread::current().id(),
                    record.level(),
                    message
                ))
            })
            .level(level)
            .chain(io::stdout())
            .apply()
            .unwrap();
    })
}

/// A fresh store over a fresh in-memory engine, with the default depth cap.
pub(crate) fn new_store() -> ReferralStore<MemDB> {
    ReferralStore::new(MemDB::new(), StoreConfig::default())
}

/// Deterministic address: 20 copies of `n`.
pub(crate) fn test_address(n: u8) -> Address {
    Address::new([n; 20])
}

pub(crate) fn random_address() -> Address {
    Address::new(rand::thread_rng().gen())
}

pub(crate) fn signature() -> SignatureBytes {
    SignatureBytes::new([7u8; 64])
}

/// A genesis referral: its referrer fields point at nothing, so it must be inserted with
/// `allow_no_parent`.
pub(crate) fn make_root(address: Address) -> Referral {
    Referral::new(
        AddressType::new(1),
        address,
        CodeHash::new([0u8; 32]),
        Address::NULL,
        signature(),
    )
}

/// A referral beaconing `address` under `parent`.
pub(crate) fn make_referral(address: Address, parent: &Referral) -> Referral {
    make_referral_with_type(AddressType::new(1), address, parent)
}

pub(crate) fn make_referral_with_type(
    address_type: AddressType,
    address: Address,
    parent: &Referral,
) -> Referral {
    Referral::new(
        address_type,
        address,
        parent.code_hash,
        parent.address,
        signature(),
    )
}
