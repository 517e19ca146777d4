use std::sync::Arc;

use portal_core::model::{ListingId, PublicCourseListing};
use storage::repository::{ListingRepository, StorageError};

/// Read side of the public browse page.
#[derive(Clone)]
pub struct ListingService {
    listings: Arc<dyn ListingRepository>,
}

impl ListingService {
    #[must_use]
    pub fn new(listings: Arc<dyn ListingRepository>) -> Self {
        Self { listings }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the listing document cannot be read.
    pub async fn list_listings(&self) -> Result<Vec<PublicCourseListing>, StorageError> {
        self.listings.load_listings().await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the listing document cannot be read.
    pub async fn get_listing(
        &self,
        id: ListingId,
    ) -> Result<Option<PublicCourseListing>, StorageError> {
        let listings = self.listings.load_listings().await?;
        Ok(listings.into_iter().find(|l| l.id() == id))
    }
}
