//! Tests of the persistent referral store: linkage maintenance, ANV propagation up ancestor
//! chains, existence tests, and the stored-value round trips.

use borsh::{BorshDeserialize, BorshSerialize};
use log::LevelFilter;

mod common;

use referrals_rs::store::invariants::{
    anv_entries_well_formed, every_referral_has_anv, parent_child_links_consistent,
};
use referrals_rs::types::basic::{AddressType, Amount};
use referrals_rs::types::referral::Referral;

use crate::common::{
    make_referral, make_referral_with_type, make_root, new_store, setup_logger, test_address,
};

#[test]
fn linear_chain_insert() {
    setup_logger(LevelFilter::Info);

    // 1. Insert the chain A <- B <- C, with A admitted as a root.
    let mut store = new_store();
    let a = make_root(test_address(1));
    let b = make_referral(test_address(2), &a);
    let c = make_referral(test_address(3), &b);

    store.insert_referral(&a, true).unwrap();
    store.insert_referral(&b, false).unwrap();
    store.insert_referral(&c, false).unwrap();

    // 2. Check the linkage: children(A) = [B], children(B) = [C], parent(C) = B, and A, as a
    //    root, has no parent link.
    assert_eq!(store.get_children(&a.address).unwrap().vec(), &vec![b.address]);
    assert_eq!(store.get_children(&b.address).unwrap().vec(), &vec![c.address]);
    assert_eq!(store.get_referrer(&c.address).unwrap(), Some(b.address));
    assert_eq!(store.get_referrer(&a.address).unwrap(), None);

    // 3. Every inserted referral has an ANV entry with amount 0.
    let anvs = store.get_all_anvs();
    assert_eq!(anvs.len(), 3);
    assert!(anvs.iter().all(|anv| anv.amount == Amount::ZERO));

    // 4. The store-wide invariants hold.
    assert!(parent_child_links_consistent(&store).unwrap());
    assert!(anv_entries_well_formed(&store));
    assert!(every_referral_has_anv(&store).unwrap());
}

#[test]
fn anv_propagation() {
    // 1. Build the chain A <- B <- C. All ANVs start at 0.
    let mut store = new_store();
    let a = make_root(test_address(1));
    let b = make_referral(test_address(2), &a);
    let c = make_referral(test_address(3), &b);
    store.insert_referral(&a, true).unwrap();
    store.insert_referral(&b, false).unwrap();
    store.insert_referral(&c, false).unwrap();

    let t = AddressType::new(1);

    // 2. Credit 10 at C: the delta reaches C, B, and A.
    store.update_anv(t, &c.address, Amount::new(10)).unwrap();
    assert_eq!(store.get_anv(&a.address).unwrap().unwrap().amount, Amount::new(10));
    assert_eq!(store.get_anv(&b.address).unwrap().unwrap().amount, Amount::new(10));
    assert_eq!(store.get_anv(&c.address).unwrap().unwrap().amount, Amount::new(10));

    // 3. Debit 3 at B: B and A drop to 7, C keeps its 10.
    store.update_anv(t, &b.address, Amount::new(-3)).unwrap();
    assert_eq!(store.get_anv(&a.address).unwrap().unwrap().amount, Amount::new(7));
    assert_eq!(store.get_anv(&b.address).unwrap().unwrap().amount, Amount::new(7));
    assert_eq!(store.get_anv(&c.address).unwrap().unwrap().amount, Amount::new(10));
}

#[test]
fn anv_update_then_negated_update_restores() {
    let mut store = new_store();
    let a = make_root(test_address(1));
    let b = make_referral(test_address(2), &a);
    store.insert_referral(&a, true).unwrap();
    store.insert_referral(&b, false).unwrap();

    let t = AddressType::new(1);
    store.update_anv(t, &b.address, Amount::new(42)).unwrap();
    store.update_anv(t, &b.address, -Amount::new(42)).unwrap();

    assert_eq!(store.get_anv(&a.address).unwrap().unwrap().amount, Amount::ZERO);
    assert_eq!(store.get_anv(&b.address).unwrap().unwrap().amount, Amount::ZERO);
}

#[test]
fn anv_update_on_unknown_address_fails_without_side_effects() {
    let mut store = new_store();
    let a = make_root(test_address(1));
    store.insert_referral(&a, true).unwrap();
    store.update_anv(AddressType::new(1), &a.address, Amount::new(5)).unwrap();

    let result = store.update_anv(AddressType::new(1), &test_address(9), Amount::new(5));
    assert!(result.is_err());

    // The failed walk wrote nothing.
    assert_eq!(store.get_anv(&a.address).unwrap().unwrap().amount, Amount::new(5));
    assert_eq!(store.get_all_anvs().len(), 1);
}

#[test]
#[should_panic(expected = "negative")]
fn anv_underflow_is_fatal() {
    let mut store = new_store();
    let a = make_root(test_address(1));
    store.insert_referral(&a, true).unwrap();

    let _ = store.update_anv(AddressType::new(1), &a.address, Amount::new(-1));
}

#[test]
#[should_panic(expected = "parent referral missing")]
fn insert_without_parent_when_required_is_fatal() {
    let mut store = new_store();
    let orphan_parent = make_root(test_address(8));
    let orphan = make_referral(test_address(9), &orphan_parent);

    let _ = store.insert_referral(&orphan, false);
}

#[test]
fn insert_then_get_round_trip() {
    let mut store = new_store();
    let a = make_root(test_address(1));
    store.insert_referral(&a, true).unwrap();

    assert_eq!(store.get_referral(&a.address).unwrap(), Some(a.clone()));
    assert_eq!(store.get_referral_by_code(&a.code_hash).unwrap(), Some(a));
}

#[test]
fn referral_serialization_round_trip() {
    let a = make_root(test_address(1));
    let b = make_referral(test_address(2), &a);

    let bytes = b.try_to_vec().unwrap();
    let decoded = Referral::deserialize(&mut bytes.as_slice()).unwrap();

    assert_eq!(decoded, b);
    assert_eq!(decoded.try_to_vec().unwrap(), bytes);
    assert!(decoded.is_well_formed());
}

#[test]
fn existence_tests() {
    let mut store = new_store();
    let a = make_root(test_address(1));
    let b = make_referral(test_address(2), &a);
    store.insert_referral(&a, true).unwrap();
    store.insert_referral(&b, false).unwrap();

    assert!(store.referral_address_exists(&a.address));
    assert!(store.referral_code_exists(&b.code_hash));
    // B has a parent link, A (a root) does not.
    assert!(store.wallet_id_exists(&b.address));
    assert!(!store.wallet_id_exists(&a.address));

    assert!(!store.referral_address_exists(&test_address(9)));
    assert!(!store.referral_code_exists(&make_root(test_address(9)).code_hash));
}

#[test]
fn remove_referral_unlinks() {
    let mut store = new_store();
    let a = make_root(test_address(1));
    let b = make_referral(test_address(2), &a);
    let c = make_referral(test_address(3), &b);
    store.insert_referral(&a, true).unwrap();
    store.insert_referral(&b, false).unwrap();
    store.insert_referral(&c, false).unwrap();

    store.remove_referral(&c).unwrap();

    assert!(!store.referral_address_exists(&c.address));
    assert!(!store.referral_code_exists(&c.code_hash));
    assert_eq!(store.get_referrer(&c.address).unwrap(), None);
    assert!(store.get_children(&b.address).unwrap().is_empty());
    assert!(parent_child_links_consistent(&store).unwrap());
}

#[test]
fn remove_preserves_sibling_order() {
    let mut store = new_store();
    let a = make_root(test_address(1));
    store.insert_referral(&a, true).unwrap();

    let siblings: Vec<Referral> = (2u8..=5)
        .map(|n| make_referral(test_address(n), &a))
        .collect();
    for sibling in &siblings {
        store.insert_referral(sibling, false).unwrap();
    }

    store.remove_referral(&siblings[1]).unwrap();

    assert_eq!(
        store.get_children(&a.address).unwrap().vec(),
        &vec![siblings[0].address, siblings[2].address, siblings[3].address]
    );
}

#[test]
fn rewardable_anv_filter() {
    // Types 1 and 2 are rewardable; type 3 is not.
    let mut store = new_store();
    let a = make_root(test_address(1));
    let b = make_referral_with_type(AddressType::new(2), test_address(2), &a);
    let c = make_referral_with_type(AddressType::new(3), test_address(3), &b);
    store.insert_referral(&a, true).unwrap();
    store.insert_referral(&b, false).unwrap();
    store.insert_referral(&c, false).unwrap();

    assert_eq!(store.get_all_anvs().len(), 3);

    let rewardable = store.get_all_rewardable_anvs();
    assert_eq!(rewardable.len(), 2);
    assert!(rewardable.iter().all(|anv| anv.address_type.is_rewardable()));
}
