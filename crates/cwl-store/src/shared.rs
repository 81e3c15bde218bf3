//! Process-wide candidate store.
//!
//! Lazily opened at the default path on first use and kept for the life of
//! the process. Prefer constructing a [`CandidateListStore`] explicitly and
//! passing it down; this exists for callers that have nowhere to hold one.

use std::sync::{Mutex, MutexGuard, OnceLock};

use crate::identity::StockIdentity;
use crate::store::CandidateListStore;

static SHARED: OnceLock<Mutex<CandidateListStore>> = OnceLock::new();

fn cell() -> &'static Mutex<CandidateListStore> {
    SHARED.get_or_init(|| Mutex::new(CandidateListStore::load_default()))
}

/// Lock the shared store, opening it on first call.
///
/// The guard holds a non-reentrant lock: drop it before calling any of the
/// module-level functions below, or the calling thread deadlocks.
///
/// A poisoned lock is recovered: the store holds no invariant that a panicking
/// caller could have left half-applied.
pub fn store() -> MutexGuard<'static, CandidateListStore> {
    lock(cell())
}

pub fn add_candidate_stock(identity: StockIdentity) -> bool {
    add_in(cell(), identity)
}

pub fn remove_candidate_stock(code: &str, market_name: &str) -> bool {
    remove_in(cell(), code, market_name)
}

pub fn is_candidate_stock(code: &str, market_name: &str) -> bool {
    is_member_in(cell(), code, market_name)
}

pub fn get_candidate_stocks() -> Vec<StockIdentity> {
    list_in(cell())
}

pub fn clear_candidate_stocks() -> bool {
    clear_in(cell())
}

fn lock(cell: &Mutex<CandidateListStore>) -> MutexGuard<'_, CandidateListStore> {
    cell.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn add_in(cell: &Mutex<CandidateListStore>, identity: StockIdentity) -> bool {
    lock(cell).add(identity)
}

fn remove_in(cell: &Mutex<CandidateListStore>, code: &str, market_name: &str) -> bool {
    lock(cell).remove(code, market_name)
}

fn is_member_in(cell: &Mutex<CandidateListStore>, code: &str, market_name: &str) -> bool {
    lock(cell).is_member(code, market_name)
}

fn list_in(cell: &Mutex<CandidateListStore>) -> Vec<StockIdentity> {
    lock(cell).list()
}

fn clear_in(cell: &Mutex<CandidateListStore>) -> bool {
    lock(cell).clear()
}
