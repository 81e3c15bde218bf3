use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

use crate::config::StoreConfig;
use crate::identity::StockIdentity;

/// Result of a mutating store call.
///
/// The boolean wrappers (`add`, `remove`, `clear`) collapse everything except
/// `Applied` to `false`; use the `*_checked` forms to tell a no-op apart from
/// a failed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// In-memory list changed and the file was rewritten.
    Applied,
    /// Add of a `(code, market_name)` already in the list. Nothing written.
    AlreadyPresent,
    /// Remove of a key not in the list. Nothing written.
    NotFound,
    /// Identity rejected before touching the list. Nothing written.
    Invalid(String),
    /// In-memory list changed but the rewrite failed; memory and disk differ.
    PersistFailed(String),
}

impl Mutation {
    pub fn is_applied(&self) -> bool {
        matches!(self, Mutation::Applied)
    }
}

/// One element of the backing array.
///
/// Elements that do not parse as a [`StockIdentity`] (hand edits, a numeric
/// `code`, a missing `market_name`) stay in place as `Raw` and are written
/// back unchanged. They are invisible to every query.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum Slot {
    Stock(StockIdentity),
    Raw(Value),
}

impl Slot {
    fn stock(&self) -> Option<&StockIdentity> {
        match self {
            Slot::Stock(s) => Some(s),
            Slot::Raw(_) => None,
        }
    }
}

/// Candidate (watch-list) store backed by a single JSON file.
///
/// Every successful mutation rewrites the whole file. Loading never fails: a
/// file that cannot be read as a JSON array is logged and treated as an empty
/// list, and is moved to `<file>.corrupt` before the first rewrite.
#[derive(Debug)]
pub struct CandidateListStore {
    file_path: PathBuf,
    items: Vec<Slot>,
    /// Set when the file on disk could not be loaded and has not been set aside yet.
    set_aside_pending: bool,
}

impl CandidateListStore {
    /// Open the store at `path`, loading whatever is there.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let file_path = path.as_ref().to_path_buf();
        let (items, set_aside_pending) = load_slots(&file_path);
        Self {
            file_path,
            items,
            set_aside_pending,
        }
    }

    pub fn from_config(cfg: &StoreConfig) -> Self {
        Self::open(&cfg.file_path)
    }

    /// Open the store at `<project_root>/data/cache/candidate_stocks.json`.
    pub fn load_default() -> Self {
        Self::from_config(&StoreConfig::default())
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Discard in-memory state and load the backing file again.
    pub fn reload(&mut self) {
        let (items, set_aside_pending) = load_slots(&self.file_path);
        self.items = items;
        self.set_aside_pending = set_aside_pending;
    }

    pub fn add(&mut self, identity: StockIdentity) -> bool {
        self.add_checked(identity).is_applied()
    }

    pub fn add_checked(&mut self, identity: StockIdentity) -> Mutation {
        if let Some(reason) = identity.validate() {
            warn!(path = %self.file_path.display(), %reason, "candidate add rejected");
            return Mutation::Invalid(reason);
        }
        if self.is_member(&identity.code, &identity.market_name) {
            return Mutation::AlreadyPresent;
        }

        self.items.push(Slot::Stock(identity));
        self.persist_outcome()
    }

    pub fn remove(&mut self, code: &str, market_name: &str) -> bool {
        self.remove_checked(code, market_name).is_applied()
    }

    /// Removes every entry keyed `(code, market_name)`, duplicates included.
    pub fn remove_checked(&mut self, code: &str, market_name: &str) -> Mutation {
        let before = self.items.len();
        self.items
            .retain(|slot| !matches!(slot, Slot::Stock(s) if s.matches(code, market_name)));

        if self.items.len() == before {
            return Mutation::NotFound;
        }
        self.persist_outcome()
    }

    pub fn is_member(&self, code: &str, market_name: &str) -> bool {
        self.stocks().any(|s| s.matches(code, market_name))
    }

    pub fn get(&self, code: &str, market_name: &str) -> Option<&StockIdentity> {
        self.stocks().find(|s| s.matches(code, market_name))
    }

    /// Snapshot of the list in insertion order.
    pub fn list(&self) -> Vec<StockIdentity> {
        self.stocks().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.stocks().count()
    }

    pub fn is_empty(&self) -> bool {
        self.stocks().next().is_none()
    }

    /// Empties the list, unparsed entries included. Always rewrites the file,
    /// even if already empty.
    pub fn clear(&mut self) -> bool {
        self.clear_checked().is_applied()
    }

    pub fn clear_checked(&mut self) -> Mutation {
        self.items.clear();
        self.persist_outcome()
    }

    fn stocks(&self) -> impl Iterator<Item = &StockIdentity> {
        self.items.iter().filter_map(Slot::stock)
    }

    fn persist_outcome(&mut self) -> Mutation {
        let result = self.set_aside_unloadable().and_then(|()| write_list(&self.file_path, &self.items));
        match result {
            Ok(()) => {
                debug!(path = %self.file_path.display(), count = self.items.len(), "candidate list saved");
                Mutation::Applied
            }
            Err(e) => {
                let cause = format!("{e:#}");
                error!(path = %self.file_path.display(), error = %cause, "save candidate list failed");
                Mutation::PersistFailed(cause)
            }
        }
    }

    /// Move a file that failed to load out of the way instead of overwriting it.
    fn set_aside_unloadable(&mut self) -> Result<()> {
        if !self.set_aside_pending {
            return Ok(());
        }
        if self.file_path.exists() {
            let aside = sibling_with_suffix(&self.file_path, ".corrupt");
            fs::rename(&self.file_path, &aside).with_context(|| {
                format!("set aside {} -> {}", self.file_path.display(), aside.display())
            })?;
            warn!(path = %self.file_path.display(), aside = %aside.display(), "unloadable candidate list set aside");
        }
        self.set_aside_pending = false;
        Ok(())
    }
}

/// Returns the loaded slots and whether the file exists but could not be loaded.
fn load_slots(path: &Path) -> (Vec<Slot>, bool) {
    if !path.exists() {
        debug!(path = %path.display(), "no candidate list file; starting empty");
        return (Vec::new(), false);
    }

    match read_slots(path) {
        Ok(items) => {
            debug!(path = %path.display(), count = items.len(), "candidate list loaded");
            (items, false)
        }
        Err(e) => {
            let cause = format!("{e:#}");
            warn!(path = %path.display(), error = %cause, "load candidate list failed; starting empty");
            (Vec::new(), true)
        }
    }
}

fn read_slots(path: &Path) -> Result<Vec<Slot>> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let values: Vec<Value> =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;

    let slots = values
        .into_iter()
        .enumerate()
        .map(|(index, v)| match StockIdentity::deserialize(&v) {
            Ok(s) => Slot::Stock(s),
            Err(e) => {
                warn!(path = %path.display(), index, error = %e, "malformed candidate entry kept as-is");
                Slot::Raw(v)
            }
        })
        .collect();
    Ok(slots)
}

/// Pretty JSON (2-space indent) to a sibling temp file, then rename over the target.
fn write_list<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create_dir_all {}", parent.display()))?;
        }
    }

    let json = serde_json::to_string_pretty(items).context("serialize candidate list failed")?;

    let tmp = sibling_with_suffix(path, ".tmp");
    let result = write_tmp(&tmp, &json).and_then(|()| {
        fs::rename(&tmp, path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))
    });
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn write_tmp(tmp: &Path, json: &str) -> Result<()> {
    let mut f =
        fs::File::create(tmp).with_context(|| format!("create temp file {}", tmp.display()))?;
    f.write_all(json.as_bytes())
        .and_then(|_| f.write_all(b"\n"))
        .with_context(|| format!("write temp file {}", tmp.display()))?;
    f.sync_all()
        .with_context(|| format!("sync temp file {}", tmp.display()))
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "candidate_stocks.json".into());
    name.push(suffix);
    path.with_file_name(name)
}
