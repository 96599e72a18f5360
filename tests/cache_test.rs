//! Tests of the write-through cache: read-through population, the dirty/clean distinction in
//! flush, and eviction.

use log::LevelFilter;

mod common;

use referrals_rs::cache::ReferralsCache;
use referrals_rs::config::StoreConfig;
use referrals_rs::store::ReferralStore;
use referrals_rs::types::basic::{AddressType, Amount};

use crate::common::{make_referral, make_root, mem_db::MemDB, setup_logger, test_address};

fn new_cache() -> (ReferralsCache<MemDB>, ReferralStore<MemDB>) {
    // The store is Clone over a shared engine, so tests keep a handle onto the same data the
    // cache dispatches to.
    let store = ReferralStore::new(MemDB::new(), StoreConfig::default());
    (ReferralsCache::new(store.clone()), store)
}

#[test]
fn read_through_populates() {
    setup_logger(LevelFilter::Info);

    // 1. A referral that lives only in the store.
    let (cache, mut store) = new_cache();
    let a = make_root(test_address(1));
    store.insert_referral(&a, true).unwrap();

    // 2. First read misses the cache and populates it.
    assert_eq!(cache.get_referral(&a.address).unwrap(), Some(a.clone()));
    assert_eq!(cache.len(), 1);

    // 3. A subsequent read is served from the memo: deleting the row out from under the cache
    //    does not change the answer.
    store.remove_referral(&a).unwrap();
    assert_eq!(cache.get_referral(&a.address).unwrap(), Some(a));
}

#[test]
fn store_miss_is_empty_and_unmemoized() {
    let (cache, _) = new_cache();
    assert_eq!(cache.get_referral(&test_address(9)).unwrap(), None);
    assert!(!cache.referral_address_exists(&test_address(9)).unwrap());
    assert!(cache.is_empty());
}

#[test]
fn referrer_read_through() {
    let (cache, mut store) = new_cache();
    let a = make_root(test_address(1));
    let b = make_referral(test_address(2), &a);
    store.insert_referral(&a, true).unwrap();
    store.insert_referral(&b, false).unwrap();

    assert_eq!(cache.get_referrer(&b.address).unwrap(), Some(a.address));
    assert!(cache.wallet_id_exists(&b.address).unwrap());
    // A is a root: beaconed, but with no referrer.
    assert!(!cache.wallet_id_exists(&a.address).unwrap());
}

#[test]
fn flush_writes_pending_inserts() {
    // 1. Insert a root and a child through the cache. Nothing reaches the store yet.
    let (cache, store) = new_cache();
    let a = make_root(test_address(1));
    let b = make_referral(test_address(2), &a);
    cache.insert_referral(a.clone(), true);
    cache.insert_referral(b.clone(), false);

    assert_eq!(store.get_referral(&a.address).unwrap(), None);
    // The pending entries are still visible through the cache.
    assert_eq!(cache.get_referral(&b.address).unwrap(), Some(b.clone()));

    // 2. Flush. The dirty entries land in the store in insertion order, so B's parent resolves
    //    when B is inserted.
    cache.flush().unwrap();

    assert_eq!(store.get_referral(&a.address).unwrap(), Some(a.clone()));
    assert_eq!(store.get_referral(&b.address).unwrap(), Some(b.clone()));
    assert_eq!(store.get_children(&a.address).unwrap().vec(), &vec![b.address]);

    // 3. The cache was cleared by the flush; reads now come from the store again.
    assert!(cache.is_empty());
    assert_eq!(cache.get_referral(&a.address).unwrap(), Some(a));
}

#[test]
fn flush_does_not_rewrite_clean_entries() {
    // 1. A referral with propagated ANV sits in the store.
    let (cache, mut store) = new_cache();
    let a = make_root(test_address(1));
    store.insert_referral(&a, true).unwrap();
    store
        .update_anv(AddressType::new(1), &a.address, Amount::new(5))
        .unwrap();

    // 2. Populate the cache by read-through, then flush alongside a dirty insert.
    assert!(cache.referral_address_exists(&a.address).unwrap());
    let b = make_referral(test_address(2), &a);
    cache.insert_referral(b.clone(), false);
    cache.flush().unwrap();

    // 3. Had the clean entry been re-inserted, its ANV would have been reset to zero.
    assert_eq!(store.get_anv(&a.address).unwrap().unwrap().amount, Amount::new(5));
    assert_eq!(store.get_referral(&b.address).unwrap(), Some(b));
}

#[test]
fn remove_referral_evicts_and_deletes() {
    let (cache, mut store) = new_cache();
    let a = make_root(test_address(1));
    store.insert_referral(&a, true).unwrap();
    assert!(cache.referral_address_exists(&a.address).unwrap());

    cache.remove_referral(&a).unwrap();

    assert_eq!(store.get_referral(&a.address).unwrap(), None);
    assert_eq!(cache.get_referral(&a.address).unwrap(), None);
}

#[test]
fn removed_pending_insert_is_not_flushed() {
    let (cache, store) = new_cache();
    let a = make_root(test_address(1));
    cache.insert_referral(a.clone(), true);
    cache.remove_referral(&a).unwrap();

    cache.flush().unwrap();

    assert_eq!(store.get_referral(&a.address).unwrap(), None);
}
