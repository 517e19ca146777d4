#![forbid(unsafe_code)]

pub mod document;
pub mod records;
pub mod repository;
pub mod sqlite;

pub use document::{ChangeKind, DocumentChange, DocumentStore, InMemoryDocumentStore, keys};
pub use repository::{Storage, StorageError};
