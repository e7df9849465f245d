use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tillroll_core::Vocabulary;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("Failed to read vocabulary {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write vocabulary {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of a [`VocabularyStore::commit`].
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub vocabulary: Arc<Vocabulary>,
    /// Number of names that were not already known.
    pub added: usize,
}

/// File-backed vocabulary with snapshot reads and serialized writes.
///
/// Readers grab an `Arc<Vocabulary>` and keep using it for the rest of the
/// request, so a concurrent commit never changes a snapshot in flight.
/// Commits hold `writer` across the whole read-merge-rewrite cycle.
pub struct VocabularyStore {
    path: PathBuf,
    current: RwLock<Arc<Vocabulary>>,
    writer: Mutex<()>,
}

impl VocabularyStore {
    /// Load the vocabulary at `path`. A missing file is an empty vocabulary.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, VocabularyError> {
        let path = path.into();
        let vocabulary = load(&path).await?;
        tracing::info!(
            path = %path.display(),
            items = vocabulary.len(),
            "Vocabulary loaded"
        );
        Ok(Self {
            path,
            current: RwLock::new(Arc::new(vocabulary)),
            writer: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Arc<Vocabulary> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Merge `names` into the vocabulary and rewrite the file deduplicated.
    ///
    /// When every name is already known the file is left alone and the
    /// current snapshot is returned unchanged.
    pub async fn commit(
        &self,
        names: impl IntoIterator<Item = String>,
    ) -> Result<CommitOutcome, VocabularyError> {
        let _guard = self.writer.lock().await;

        let current = self.snapshot();
        let next = current.with_names(names);
        let added = next.len() - current.len();
        if added == 0 {
            return Ok(CommitOutcome { vocabulary: current, added });
        }

        write_atomically(&self.path, &next.to_lines()).await?;

        let next = Arc::new(next);
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = next.clone();

        tracing::info!(
            version = next.version,
            items = next.len(),
            added,
            "Vocabulary committed"
        );
        Ok(CommitOutcome { vocabulary: next, added })
    }
}

async fn load(path: &Path) -> Result<Vocabulary, VocabularyError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Vocabulary::from_lines(0, &text)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Vocabulary file missing, starting empty");
            Ok(Vocabulary::default())
        }
        Err(source) => Err(VocabularyError::Read { path: path.to_path_buf(), source }),
    }
}

/// Write to a sibling temp file and rename over the target.
async fn write_atomically(path: &Path, contents: &str) -> Result<(), VocabularyError> {
    let err = |source| VocabularyError::Write { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(err)?;
    }
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, contents).await.map_err(err)?;
    tokio::fs::rename(&tmp, path).await.map_err(err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_empty_vocabulary() {
        let dir = tempfile::tempdir().unwrap();
        let store = VocabularyStore::open(dir.path().join("items.txt")).await.unwrap();
        let v = store.snapshot();
        assert!(v.is_empty());
        assert_eq!(v.version, 0);
    }

    #[tokio::test]
    async fn commit_rewrites_file_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.txt");
        tokio::fs::write(&path, "MILK\nBREAD\n").await.unwrap();

        let store = VocabularyStore::open(&path).await.unwrap();
        let outcome = store
            .commit(vec!["MILK".to_string(), "EGGS".to_string()])
            .await
            .unwrap();

        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.vocabulary.version, 1);

        let on_disk = tokio::fs::read_to_string(&path).await.unwrap();
        let mut lines: Vec<&str> = on_disk.lines().collect();
        lines.sort_unstable();
        assert_eq!(lines, vec!["BREAD", "EGGS", "MILK"]);
    }

    #[tokio::test]
    async fn commit_without_new_names_keeps_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.txt");
        tokio::fs::write(&path, "MILK\n").await.unwrap();

        let store = VocabularyStore::open(&path).await.unwrap();
        let outcome = store.commit(vec!["MILK".to_string()]).await.unwrap();
        assert_eq!(outcome.added, 0);
        assert_eq!(outcome.vocabulary.version, 0);
    }

    #[tokio::test]
    async fn snapshot_taken_before_commit_is_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = VocabularyStore::open(dir.path().join("items.txt")).await.unwrap();
        let before = store.snapshot();
        store.commit(vec!["APPLES".to_string()]).await.unwrap();
        assert!(before.is_empty());
        assert!(store.snapshot().contains("APPLES"));
    }

    #[tokio::test]
    async fn concurrent_commits_lose_no_updates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.txt");
        let store = Arc::new(VocabularyStore::open(&path).await.unwrap());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.commit(vec![format!("ITEM {i}")]).await })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }

        assert_eq!(store.snapshot().len(), 16);
        assert_eq!(store.snapshot().version, 16);
        let reloaded = VocabularyStore::open(&path).await.unwrap();
        assert_eq!(reloaded.snapshot().len(), 16);
    }
}
