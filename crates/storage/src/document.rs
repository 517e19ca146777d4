use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::repository::StorageError;

/// Well-known document keys.
pub mod keys {
    pub const COURSES: &str = "admin:courses";
    pub const LISTINGS: &str = "browse:courses";
    pub const LEARNER_PROFILE: &str = "user:profile";
    pub const ADMIN_PROFILE: &str = "admin:profile";
    pub const SCHOOLS: &str = "admin:schools";
    pub const EDUCATORS: &str = "admin:educators";
    pub const SESSION: &str = "currentUserType";
}

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Written,
    Removed,
}

/// Notification that a document was written or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChange {
    pub key: String,
    pub kind: ChangeKind,
}

impl DocumentChange {
    pub(crate) fn written(key: &str) -> Self {
        Self {
            key: key.to_owned(),
            kind: ChangeKind::Written,
        }
    }

    pub(crate) fn removed(key: &str) -> Self {
        Self {
            key: key.to_owned(),
            kind: ChangeKind::Removed,
        }
    }
}

/// A string-keyed store of serialized documents.
///
/// Writes replace the whole document. Every write and removal is announced on
/// the change channel so other views of the same store can refresh.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document, or `None` when the key has never been written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the document stored under `key`. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<DocumentChange>;
}

pub(crate) fn change_channel() -> broadcast::Sender<DocumentChange> {
    let (tx, _rx) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
    tx
}

pub(crate) fn announce(changes: &broadcast::Sender<DocumentChange>, change: DocumentChange) {
    // No subscribers is fine.
    let _ = changes.send(change);
}

/// Process-local document store for tests and ephemeral sessions.
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    docs: Arc<Mutex<HashMap<String, String>>>,
    changes: broadcast::Sender<DocumentChange>,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            docs: Arc::new(Mutex::new(HashMap::new())),
            changes: change_channel(),
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .docs
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        {
            let mut guard = self
                .docs
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            guard.insert(key.to_owned(), value.to_owned());
        }
        announce(&self.changes, DocumentChange::written(key));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let existed = {
            let mut guard = self
                .docs
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            guard.remove(key).is_some()
        };
        if existed {
            announce(&self.changes, DocumentChange::removed(key));
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<DocumentChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let store = InMemoryDocumentStore::new();
        assert_eq!(store.get(keys::COURSES).await.unwrap(), None);
    }

    #[tokio::test]
    async fn writes_are_whole_document_replacements() {
        let store = InMemoryDocumentStore::new();
        store.set(keys::LISTINGS, "[1]").await.unwrap();
        store.set(keys::LISTINGS, "[2]").await.unwrap();
        assert_eq!(store.get(keys::LISTINGS).await.unwrap().as_deref(), Some("[2]"));
    }

    #[tokio::test]
    async fn clones_share_documents_and_notifications() {
        let store = InMemoryDocumentStore::new();
        let other_view = store.clone();
        let mut changes = other_view.subscribe();

        store.set(keys::SESSION, "admin").await.unwrap();
        assert_eq!(
            other_view.get(keys::SESSION).await.unwrap().as_deref(),
            Some("admin")
        );
        let change = changes.recv().await.unwrap();
        assert_eq!(change.key, keys::SESSION);
        assert_eq!(change.kind, ChangeKind::Written);

        store.remove(keys::SESSION).await.unwrap();
        assert_eq!(changes.recv().await.unwrap().kind, ChangeKind::Removed);
    }
}
