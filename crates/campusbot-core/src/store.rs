//! Local key/value state persisted between runs.
//!
//! Holds the signed-in session and the remembered query suggestions in a
//! single JSON file. Writes go to a sibling temp file and are renamed into
//! place so a crash never leaves a half-written store behind.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::Session;

/// Everything the client remembers locally.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredState {
    #[serde(default)]
    pub session: Option<Session>,
    /// Remembered queries, most recent first.
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// File-backed (or purely in-memory) local store.
#[derive(Debug)]
pub struct LocalStore {
    path: Option<PathBuf>,
    state: StoredState,
}

impl LocalStore {
    /// Open the store at `path`, starting empty if the file is missing or
    /// unreadable.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match Self::read(&path) {
            Ok(Some(state)) => state,
            Ok(None) => StoredState::default(),
            Err(e) => {
                warn!(
                    error = %e,
                    "Local store at {} is unreadable, starting empty",
                    path.display()
                );
                StoredState::default()
            }
        };
        Self {
            path: Some(path),
            state,
        }
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: StoredState::default(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn state(&self) -> &StoredState {
        &self.state
    }

    /// Apply `f` to the state and persist the result.
    pub fn update<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut StoredState),
    {
        f(&mut self.state);
        self.flush()
    }

    fn read(path: &Path) -> Result<Option<StoredState>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.state)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
        }
        debug!("Local store written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn session() -> Session {
        Session {
            user_key: "asha@example.com".into(),
            display_name: "Asha".into(),
            role: Role::Student,
            token: "tok-1".into(),
        }
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("state.json"));
        assert_eq!(store.state(), &StoredState::default());
    }

    #[test]
    fn test_update_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let mut store = LocalStore::open(&path);
        store
            .update(|s| {
                s.session = Some(session());
                s.suggestions = vec!["fees".into()];
            })
            .unwrap();

        let reopened = LocalStore::open(&path);
        assert_eq!(reopened.state().session, Some(session()));
        assert_eq!(reopened.state().suggestions, vec!["fees".to_string()]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = LocalStore::open(&path);
        assert!(store.state().session.is_none());
    }

    #[test]
    fn test_in_memory_store_updates() {
        let mut store = LocalStore::in_memory();
        store.update(|s| s.suggestions.push("x".into())).unwrap();
        assert_eq!(store.state().suggestions.len(), 1);
        assert!(store.path().is_none());
    }
}
