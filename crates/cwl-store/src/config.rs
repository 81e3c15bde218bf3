//! Store configuration and backing-file path resolution.
//!
//! The backing file lives at a fixed location relative to the project root:
//! `<project_root>/data/cache/candidate_stocks.json`. The project root is
//! derived once per process from the running executable's location.

use anyhow::{bail, Context, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Location of the backing file relative to the project root.
pub const CANDIDATE_STOCKS_RELPATH: &str = "data/cache/candidate_stocks.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub file_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::for_project_root(project_root())
    }
}

impl StoreConfig {
    pub fn for_project_root(root: impl AsRef<Path>) -> Self {
        Self {
            file_path: root.as_ref().join(CANDIDATE_STOCKS_RELPATH),
        }
    }

    /// Read the `candidate_store` section of a YAML config document.
    ///
    /// ```yaml
    /// candidate_store:
    ///   file_path: data/cache/candidate_stocks.json
    /// ```
    ///
    /// A missing section (or an empty document) yields the default path.
    /// Relative paths are resolved against `project_root`.
    pub fn from_yaml_str(raw: &str, project_root: impl AsRef<Path>) -> Result<Self> {
        let root = project_root.as_ref();
        if raw.trim().is_empty() {
            return Ok(Self::for_project_root(root));
        }

        let v: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let Some(section) = v.get("candidate_store") else {
            return Ok(Self::for_project_root(root));
        };

        match section.get("file_path") {
            None => Ok(Self::for_project_root(root)),
            Some(serde_yaml::Value::String(p)) => {
                let p = Path::new(p);
                let file_path = if p.is_absolute() {
                    p.to_path_buf()
                } else {
                    root.join(p)
                };
                Ok(Self { file_path })
            }
            Some(other) => bail!("candidate_store.file_path must be a string, got {:?}", other),
        }
    }
}

/// Project root for this process, resolved on first call and cached.
pub fn project_root() -> &'static Path {
    static ROOT: OnceLock<PathBuf> = OnceLock::new();
    ROOT.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|exe| root_from_exe(&exe))
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Walk from an executable path up to the directory that owns `data/`.
///
/// Handles an installed `<root>/bin/<exe>` layout and cargo's
/// `<root>/target/<profile>[/deps]/<exe>` layout; anything else resolves to
/// the executable's own directory.
fn root_from_exe(exe: &Path) -> Option<PathBuf> {
    let mut dir = exe.parent()?.to_path_buf();

    if dir.file_name() == Some(OsStr::new("deps")) {
        dir.pop();
    }
    if dir.parent().and_then(Path::file_name) == Some(OsStr::new("target")) {
        dir.pop();
        dir.pop();
    } else if dir.file_name() == Some(OsStr::new("bin")) {
        dir.pop();
    }

    Some(dir)
}
