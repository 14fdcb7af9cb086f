//! Persistence of the single wizard state key.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result};
use shared::protocol::STATE_STORAGE_KEY;

/// Synchronous key/value slot for the encoded wizard state. A save must be
/// durable before it returns so later loads never observe an older draft.
pub trait DraftStore {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, contents: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileDraftStore {
    path: PathBuf,
}

impl FileDraftStore {
    pub fn in_dir(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir
                .as_ref()
                .join(format!("{STATE_STORAGE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DraftStore for FileDraftStore {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err)
                .with_context(|| format!("failed to read wizard state '{}'", self.path.display())),
        }
    }

    fn save(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("could not prepare state directory '{}'", parent.display())
            })?;
        }
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, contents)
            .with_context(|| format!("failed to write '{}'", staging.display()))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("failed to replace '{}'", self.path.display()))?;
        Ok(())
    }
}

/// Process-local store; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryDraftStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryDraftStore {
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(contents.into()))),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl DraftStore for MemoryDraftStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.contents())
    }

    fn save(&self, contents: &str) -> Result<()> {
        *self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(contents.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_no_prior_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileDraftStore::in_dir(dir.path().join("nested"));
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn save_creates_directories_and_replaces_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileDraftStore::in_dir(dir.path().join("nested"));

        store.save("{\"first\":1}").expect("first save");
        store.save("{\"second\":2}").expect("second save");

        assert_eq!(store.load().expect("load").as_deref(), Some("{\"second\":2}"));
        assert!(store.path().ends_with("builder_state.json"));
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn memory_store_clones_share_contents() {
        let store = MemoryDraftStore::default();
        let handle = store.clone();
        store.save("abc").expect("save");
        assert_eq!(handle.load().expect("load").as_deref(), Some("abc"));
    }
}
