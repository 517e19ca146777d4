use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::catalog_service::CatalogService;
use crate::completion_counter::CompletionCounter;
use crate::defaults::{self, SeedReport};
use crate::directory_service::DirectoryService;
use crate::enrollment_service::EnrollmentService;
use crate::error::AppServicesError;
use crate::events::EventBus;
use crate::listing_projector::ListingProjector;
use crate::listing_service::ListingService;
use crate::profile_service::ProfileService;
use crate::session_service::SessionService;

/// Assembles app-facing services over one storage backend and wires the
/// event handlers that keep the documents consistent.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    seed_report: SeedReport,
    catalog: Arc<CatalogService>,
    listings: Arc<ListingService>,
    enrollments: Arc<EnrollmentService>,
    profiles: Arc<ProfileService>,
    sessions: Arc<SessionService>,
    directory: Arc<DirectoryService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or seeding fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        platform_name: &str,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::bootstrap(storage, clock, platform_name).await
    }

    /// Register event handlers, seed any missing documents and build the
    /// services.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if seeding fails.
    pub async fn bootstrap(
        storage: Storage,
        clock: Clock,
        platform_name: &str,
    ) -> Result<Self, AppServicesError> {
        let events = EventBus::new();
        events
            .register_handler(Arc::new(ListingProjector::new(Arc::clone(
                &storage.listings,
            ))))
            .await;
        events
            .register_handler(Arc::new(CompletionCounter::new(Arc::clone(
                &storage.courses,
            ))))
            .await;

        let seed_report = defaults::seed_missing(&storage).await?;

        let catalog = Arc::new(CatalogService::new(
            Arc::clone(&storage.courses),
            events.clone(),
        ));
        let listings = Arc::new(ListingService::new(Arc::clone(&storage.listings)));
        let enrollments = Arc::new(
            EnrollmentService::new(
                clock,
                Arc::clone(&storage.profiles),
                Arc::clone(&storage.courses),
                events,
            )
            .with_platform_name(platform_name),
        );
        let profiles = Arc::new(ProfileService::new(Arc::clone(&storage.profiles)));
        let sessions = Arc::new(SessionService::new(Arc::clone(&storage.sessions)));
        let directory = Arc::new(DirectoryService::new(
            Arc::clone(&storage.directory),
            Arc::clone(&storage.courses),
        ));

        Ok(Self {
            storage,
            seed_report,
            catalog,
            listings,
            enrollments,
            profiles,
            sessions,
            directory,
        })
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// What this bootstrap wrote on first use.
    #[must_use]
    pub fn seed_report(&self) -> SeedReport {
        self.seed_report
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn listings(&self) -> Arc<ListingService> {
        Arc::clone(&self.listings)
    }

    #[must_use]
    pub fn enrollments(&self) -> Arc<EnrollmentService> {
        Arc::clone(&self.enrollments)
    }

    #[must_use]
    pub fn profiles(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profiles)
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<SessionService> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn directory(&self) -> Arc<DirectoryService> {
        Arc::clone(&self.directory)
    }
}
