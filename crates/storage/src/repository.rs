use std::sync::Arc;

use async_trait::async_trait;
use portal_core::model::{
    AdminProfile, Course, Educator, LearnerProfile, PublicCourseListing, School, SessionRole,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::document::{DocumentStore, InMemoryDocumentStore, keys};
use crate::records::{
    AdminProfileRecord, CourseRecord, EducatorRecord, LearnerProfileRecord, ListingRecord,
    SchoolRecord,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the admin course catalog.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Load every course, newest first. A missing document reads as empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be read or decoded.
    async fn load_courses(&self) -> Result<Vec<Course>, StorageError>;

    /// Replace the stored catalog.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be written.
    async fn save_courses(&self, courses: &[Course]) -> Result<(), StorageError>;
}

/// Repository contract for the public browse listings.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be read or decoded.
    async fn load_listings(&self) -> Result<Vec<PublicCourseListing>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be written.
    async fn save_listings(&self, listings: &[PublicCourseListing]) -> Result<(), StorageError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be read or decoded.
    async fn load_learner(&self) -> Result<Option<LearnerProfile>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be written.
    async fn save_learner(&self, profile: &LearnerProfile) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be read or decoded.
    async fn load_admin(&self) -> Result<Option<AdminProfile>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be written.
    async fn save_admin(&self, profile: &AdminProfile) -> Result<(), StorageError>;
}

/// Persists which role, if any, is signed in.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Read the session marker. Unknown markers read as signed out.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn load_session(&self) -> Result<Option<SessionRole>, StorageError>;

    /// Store the marker, or clear it with `None`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn save_session(&self, role: Option<SessionRole>) -> Result<(), StorageError>;
}

#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be read or decoded.
    async fn load_schools(&self) -> Result<Vec<School>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be written.
    async fn save_schools(&self, schools: &[School]) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be read or decoded.
    async fn load_educators(&self) -> Result<Vec<Educator>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the document cannot be written.
    async fn save_educators(&self, educators: &[Educator]) -> Result<(), StorageError>;
}

/// Implements every typed repository as JSON documents in a `DocumentStore`.
#[derive(Clone)]
pub struct DocumentRepository {
    store: Arc<dyn DocumentStore>,
}

impl DocumentRepository {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn read<R: DeserializeOwned>(&self, key: &str) -> Result<Option<R>, StorageError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Serialization(format!("{key}: {e}")))
    }

    async fn write<R: Serialize + Sync>(&self, key: &str, value: &R) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| StorageError::Serialization(format!("{key}: {e}")))?;
        tracing::debug!(key, bytes = raw.len(), "writing document");
        self.store.set(key, &raw).await
    }
}

#[async_trait]
impl CourseRepository for DocumentRepository {
    async fn load_courses(&self) -> Result<Vec<Course>, StorageError> {
        let records: Vec<CourseRecord> = self.read(keys::COURSES).await?.unwrap_or_default();
        records.into_iter().map(CourseRecord::into_course).collect()
    }

    async fn save_courses(&self, courses: &[Course]) -> Result<(), StorageError> {
        let records: Vec<CourseRecord> = courses.iter().map(CourseRecord::from_course).collect();
        self.write(keys::COURSES, &records).await
    }
}

#[async_trait]
impl ListingRepository for DocumentRepository {
    async fn load_listings(&self) -> Result<Vec<PublicCourseListing>, StorageError> {
        let records: Vec<ListingRecord> = self.read(keys::LISTINGS).await?.unwrap_or_default();
        Ok(ListingRecord::into_listings(records))
    }

    async fn save_listings(&self, listings: &[PublicCourseListing]) -> Result<(), StorageError> {
        let records: Vec<ListingRecord> =
            listings.iter().map(ListingRecord::from_listing).collect();
        self.write(keys::LISTINGS, &records).await
    }
}

#[async_trait]
impl ProfileRepository for DocumentRepository {
    async fn load_learner(&self) -> Result<Option<LearnerProfile>, StorageError> {
        self.read::<LearnerProfileRecord>(keys::LEARNER_PROFILE)
            .await?
            .map(LearnerProfileRecord::into_profile)
            .transpose()
    }

    async fn save_learner(&self, profile: &LearnerProfile) -> Result<(), StorageError> {
        self.write(
            keys::LEARNER_PROFILE,
            &LearnerProfileRecord::from_profile(profile),
        )
        .await
    }

    async fn load_admin(&self) -> Result<Option<AdminProfile>, StorageError> {
        self.read::<AdminProfileRecord>(keys::ADMIN_PROFILE)
            .await?
            .map(AdminProfileRecord::into_profile)
            .transpose()
    }

    async fn save_admin(&self, profile: &AdminProfile) -> Result<(), StorageError> {
        self.write(keys::ADMIN_PROFILE, &AdminProfileRecord::from_profile(profile))
            .await
    }
}

#[async_trait]
impl SessionRepository for DocumentRepository {
    // The marker is stored as a bare string, not JSON.
    async fn load_session(&self) -> Result<Option<SessionRole>, StorageError> {
        let Some(raw) = self.store.get(keys::SESSION).await? else {
            return Ok(None);
        };
        match raw.parse::<SessionRole>() {
            Ok(role) => Ok(Some(role)),
            Err(err) => {
                tracing::warn!(%err, "ignoring unknown session marker");
                Ok(None)
            }
        }
    }

    async fn save_session(&self, role: Option<SessionRole>) -> Result<(), StorageError> {
        match role {
            Some(role) => self.store.set(keys::SESSION, role.as_str()).await,
            None => self.store.remove(keys::SESSION).await,
        }
    }
}

#[async_trait]
impl DirectoryRepository for DocumentRepository {
    async fn load_schools(&self) -> Result<Vec<School>, StorageError> {
        let records: Vec<SchoolRecord> = self.read(keys::SCHOOLS).await?.unwrap_or_default();
        Ok(records.into_iter().map(SchoolRecord::into_school).collect())
    }

    async fn save_schools(&self, schools: &[School]) -> Result<(), StorageError> {
        let records: Vec<SchoolRecord> = schools.iter().map(SchoolRecord::from_school).collect();
        self.write(keys::SCHOOLS, &records).await
    }

    async fn load_educators(&self) -> Result<Vec<Educator>, StorageError> {
        let records: Vec<EducatorRecord> = self.read(keys::EDUCATORS).await?.unwrap_or_default();
        Ok(records.into_iter().map(EducatorRecord::into_educator).collect())
    }

    async fn save_educators(&self, educators: &[Educator]) -> Result<(), StorageError> {
        let records: Vec<EducatorRecord> =
            educators.iter().map(EducatorRecord::from_educator).collect();
        self.write(keys::EDUCATORS, &records).await
    }
}

/// Aggregates the typed repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub documents: Arc<dyn DocumentStore>,
    pub courses: Arc<dyn CourseRepository>,
    pub listings: Arc<dyn ListingRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub directory: Arc<dyn DirectoryRepository>,
}

impl Storage {
    /// Build every repository over one shared document store.
    #[must_use]
    pub fn from_documents(documents: Arc<dyn DocumentStore>) -> Self {
        let repo = DocumentRepository::new(Arc::clone(&documents));
        let courses: Arc<dyn CourseRepository> = Arc::new(repo.clone());
        let listings: Arc<dyn ListingRepository> = Arc::new(repo.clone());
        let profiles: Arc<dyn ProfileRepository> = Arc::new(repo.clone());
        let sessions: Arc<dyn SessionRepository> = Arc::new(repo.clone());
        let directory: Arc<dyn DirectoryRepository> = Arc::new(repo);
        Self {
            documents,
            courses,
            listings,
            profiles,
            sessions,
            directory,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_documents(Arc::new(InMemoryDocumentStore::new()))
    }
}
