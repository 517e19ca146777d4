use std::sync::Arc;

use async_trait::async_trait;
use portal_core::DomainEvent;
use portal_core::model::{CourseId, PublicCourseListing, next_listing_id};
use storage::repository::{ListingRepository, StorageError};

use crate::events::EventHandler;

/// Keeps the public browse listing in step with the admin catalog.
///
/// Listings created here carry a back-reference to their course so later
/// edits and deletions find exactly the right entries.
#[derive(Clone)]
pub struct ListingProjector {
    listings: Arc<dyn ListingRepository>,
}

impl ListingProjector {
    #[must_use]
    pub fn new(listings: Arc<dyn ListingRepository>) -> Self {
        Self { listings }
    }

    /// A corrupt listing document is treated as empty and will be rewritten.
    async fn load(&self) -> Result<Vec<PublicCourseListing>, StorageError> {
        match self.listings.load_listings().await {
            Ok(listings) => Ok(listings),
            Err(StorageError::Serialization(err)) => {
                tracing::warn!(%err, "listing document unreadable, starting from empty");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    async fn project_created(
        &self,
        course_id: &CourseId,
        title: &str,
        description: Option<&str>,
        resource_count: usize,
    ) -> Result<(), StorageError> {
        let mut listings = self.load().await?;
        let id = next_listing_id(&listings);
        listings.push(PublicCourseListing::project(
            id,
            course_id.clone(),
            title,
            description,
            resource_count,
        ));
        self.listings.save_listings(&listings).await?;
        tracing::debug!(course = %course_id, listing = %id, "listing projected");
        Ok(())
    }

    async fn project_updated(
        &self,
        course_id: &CourseId,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<(), StorageError> {
        let mut listings = self.load().await?;
        let mut touched = 0_usize;
        for listing in listings.iter_mut().filter(|l| l.mirrors(course_id)) {
            listing.retitle(title, description);
            touched += 1;
        }
        if touched > 0 {
            self.listings.save_listings(&listings).await?;
        }
        Ok(())
    }

    async fn project_deleted(&self, course_id: &CourseId) -> Result<(), StorageError> {
        let mut listings = self.load().await?;
        let before = listings.len();
        listings.retain(|l| !l.mirrors(course_id));
        if listings.len() != before {
            self.listings.save_listings(&listings).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl EventHandler for ListingProjector {
    fn name(&self) -> &'static str {
        "listing_projector"
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), StorageError> {
        match event {
            DomainEvent::CourseCreated {
                course_id,
                title,
                description,
                resource_count,
            } => {
                self.project_created(course_id, title, description.as_deref(), *resource_count)
                    .await
            }
            DomainEvent::CourseUpdated {
                course_id,
                title,
                description,
            } => {
                self.project_updated(course_id, title.as_deref(), description.as_deref())
                    .await
            }
            DomainEvent::CourseDeleted { course_id } => self.project_deleted(course_id).await,
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::model::{FREE_PRICE_LABEL, ListingId, MISSING_DESCRIPTION};
    use storage::document::{DocumentStore, keys};
    use storage::repository::Storage;

    fn created(id: &str, title: &str, count: usize) -> DomainEvent {
        DomainEvent::CourseCreated {
            course_id: CourseId::new(id),
            title: title.into(),
            description: None,
            resource_count: count,
        }
    }

    #[tokio::test]
    async fn created_course_gets_a_free_listing() {
        let storage = Storage::in_memory();
        let projector = ListingProjector::new(Arc::clone(&storage.listings));
        projector.handle(&created("c1", "Safety", 3)).await.unwrap();

        let listings = storage.listings.load_listings().await.unwrap();
        assert_eq!(listings.len(), 1);
        let listing = &listings[0];
        assert_eq!(listing.id(), ListingId::new(1));
        assert_eq!(listing.duration(), "3 resources");
        assert_eq!(listing.price(), FREE_PRICE_LABEL);
        assert_eq!(listing.description(), MISSING_DESCRIPTION);
        assert!(listing.mirrors(&CourseId::new("c1")));
    }

    #[tokio::test]
    async fn ids_continue_past_the_current_maximum() {
        let storage = Storage::in_memory();
        let existing = PublicCourseListing::new(
            ListingId::new(6),
            "Emergency Care",
            "First aid",
            "2 Days",
            "$44.99",
            None,
        );
        storage.listings.save_listings(&[existing]).await.unwrap();

        let projector = ListingProjector::new(Arc::clone(&storage.listings));
        projector.handle(&created("c1", "Safety", 0)).await.unwrap();

        let listings = storage.listings.load_listings().await.unwrap();
        assert_eq!(listings[1].id(), ListingId::new(7));
    }

    #[tokio::test]
    async fn corrupt_document_is_replaced() {
        let storage = Storage::in_memory();
        storage
            .documents
            .set(keys::LISTINGS, "{\"broken\":")
            .await
            .unwrap();
        let projector = ListingProjector::new(Arc::clone(&storage.listings));
        projector.handle(&created("c1", "Safety", 1)).await.unwrap();

        let listings = storage.listings.load_listings().await.unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].id(), ListingId::new(1));
    }

    #[tokio::test]
    async fn odd_listing_id_does_not_drop_other_listings() {
        let storage = Storage::in_memory();
        storage
            .documents
            .set(
                keys::LISTINGS,
                r#"[
                    {"id": 5, "title": "Static", "description": "d", "duration": "2 Days", "price": "$800"},
                    {"id": "abc", "title": "Odd", "description": "d", "duration": "1 Day", "price": "Free"}
                ]"#,
            )
            .await
            .unwrap();
        let projector = ListingProjector::new(Arc::clone(&storage.listings));
        projector.handle(&created("c1", "New", 0)).await.unwrap();

        let listings = storage.listings.load_listings().await.unwrap();
        let titles: Vec<&str> = listings.iter().map(PublicCourseListing::title).collect();
        assert_eq!(titles, vec!["Static", "Odd", "New"]);
        assert_eq!(listings[0].id(), ListingId::new(5));
        assert_eq!(listings[0].price(), "$800");
        assert_eq!(listings[2].id(), ListingId::new(7));
        assert!(listings[2].mirrors(&CourseId::new("c1")));
    }

    #[tokio::test]
    async fn update_only_touches_mirrors_and_keeps_missing_fields() {
        let storage = Storage::in_memory();
        let projector = ListingProjector::new(Arc::clone(&storage.listings));
        projector.handle(&created("c1", "Safety", 1)).await.unwrap();
        projector.handle(&created("c2", "Nutrition", 1)).await.unwrap();

        projector
            .handle(&DomainEvent::CourseUpdated {
                course_id: CourseId::new("c1"),
                title: Some("Home Safety".into()),
                description: None,
            })
            .await
            .unwrap();

        let listings = storage.listings.load_listings().await.unwrap();
        assert_eq!(listings[0].title(), "Home Safety");
        assert_eq!(listings[0].description(), MISSING_DESCRIPTION);
        assert_eq!(listings[1].title(), "Nutrition");
    }

    #[tokio::test]
    async fn delete_removes_only_mirrors() {
        let storage = Storage::in_memory();
        let projector = ListingProjector::new(Arc::clone(&storage.listings));
        projector.handle(&created("c1", "Safety", 1)).await.unwrap();
        projector.handle(&created("c2", "Nutrition", 1)).await.unwrap();

        projector
            .handle(&DomainEvent::CourseDeleted {
                course_id: CourseId::new("c1"),
            })
            .await
            .unwrap();

        let listings = storage.listings.load_listings().await.unwrap();
        assert_eq!(listings.len(), 1);
        assert!(listings[0].mirrors(&CourseId::new("c2")));
    }

    #[tokio::test]
    async fn completion_events_are_ignored() {
        let storage = Storage::in_memory();
        let projector = ListingProjector::new(Arc::clone(&storage.listings));
        projector
            .handle(&DomainEvent::CourseCompleted {
                course_id: CourseId::new("c1"),
            })
            .await
            .unwrap();
        assert!(
            storage
                .documents
                .get(keys::LISTINGS)
                .await
                .unwrap()
                .is_none()
        );
    }
}
