//! Duplicate add rejection
//!
//! GREEN when:
//! - First add of an identity returns true and grows the list by one.
//! - Second add of the same (code, market_name) returns false, leaves the list
//!   unchanged and does not rewrite the file.
//! - Same code on a different market is a distinct entry.
//! - The add / member / re-add / remove / member / list walkthrough holds.

use anyhow::Result;
use cwl_store::{CandidateListStore, Mutation, StockIdentity};
use std::fs;
use tempfile::tempdir;

#[test]
fn second_add_is_rejected_without_write() -> Result<()> {
    let tmp = tempdir()?;
    let path = tmp.path().join("data/cache/candidate_stocks.json");
    let mut store = CandidateListStore::open(&path);

    assert!(store.add(StockIdentity::new("600519", "SH")));
    assert_eq!(store.len(), 1);
    let after_first = fs::read_to_string(&path)?;

    // Extra fields do not participate in identity.
    let again = StockIdentity::new("600519", "SH").with_field("name", "贵州茅台");
    assert_eq!(store.add_checked(again), Mutation::AlreadyPresent);
    assert_eq!(store.len(), 1);
    assert_eq!(fs::read_to_string(&path)?, after_first, "no rewrite on duplicate");

    Ok(())
}

#[test]
fn same_code_other_market_is_distinct() -> Result<()> {
    let tmp = tempdir()?;
    let mut store = CandidateListStore::open(tmp.path().join("list.json"));

    assert!(store.add(StockIdentity::new("000001", "SH")));
    assert!(store.add(StockIdentity::new("000001", "SZ")));
    assert_eq!(store.len(), 2);
    assert!(store.is_member("000001", "SH"));
    assert!(store.is_member("000001", "SZ"));
    assert!(!store.is_member("000001", "HK"));

    Ok(())
}

#[test]
fn add_member_remove_walkthrough() -> Result<()> {
    let tmp = tempdir()?;
    let mut store = CandidateListStore::open(tmp.path().join("list.json"));
    assert!(store.is_empty());

    let moutai = StockIdentity::new("600519", "SH");
    assert!(store.add(moutai.clone()));
    assert!(store.is_member("600519", "SH"));
    assert!(!store.add(moutai));
    assert!(store.remove("600519", "SH"));
    assert!(!store.is_member("600519", "SH"));
    assert!(store.list().is_empty());

    Ok(())
}

#[test]
fn blank_key_fields_are_rejected() -> Result<()> {
    let tmp = tempdir()?;
    let path = tmp.path().join("list.json");
    let mut store = CandidateListStore::open(&path);

    assert!(!store.add(StockIdentity::new("", "SH")));
    match store.add_checked(StockIdentity::new("AAPL", "   ")) {
        Mutation::Invalid(reason) => assert!(reason.contains("market_name"), "got: {reason}"),
        other => panic!("expected Invalid, got {other:?}"),
    }
    assert!(store.is_empty());
    assert!(!path.exists(), "rejected adds must not create the file");

    Ok(())
}
