#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod completion_counter;
pub mod defaults;
pub mod directory_service;
pub mod enrollment_service;
pub mod error;
pub mod events;
pub mod listing_projector;
pub mod listing_service;
pub mod profile_service;
pub mod session_service;

pub use portal_core::Clock;

pub use app_services::AppServices;
pub use catalog_service::CatalogService;
pub use completion_counter::CompletionCounter;
pub use defaults::SeedReport;
pub use directory_service::{DashboardStats, DirectoryService};
pub use enrollment_service::{EnrollmentService, ToggleOutcome};
pub use error::{
    AppServicesError, CatalogServiceError, DirectoryServiceError, EnrollmentServiceError,
    ProfileServiceError, SessionServiceError,
};
pub use events::{EventBus, EventHandler};
pub use listing_projector::ListingProjector;
pub use listing_service::ListingService;
pub use profile_service::ProfileService;
pub use session_service::SessionService;
