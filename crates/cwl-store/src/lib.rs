//! cwl-store
//!
//! Candidate watch-list persistence: a small, user-curated list of
//! instruments keyed by `(code, market_name)`, cached in memory and mirrored
//! to `<project_root>/data/cache/candidate_stocks.json`.
//!
//! Every mutation rewrites the whole file (temp file + rename). There is no
//! cross-process locking; two processes sharing the file are last-writer-wins.

pub mod config;
pub mod identity;
pub mod shared;
pub mod store;

pub use config::{project_root, StoreConfig, CANDIDATE_STOCKS_RELPATH};
pub use identity::StockIdentity;
pub use shared::{
    add_candidate_stock, clear_candidate_stocks, get_candidate_stocks, is_candidate_stock,
    remove_candidate_stock,
};
pub use store::{CandidateListStore, Mutation};
