use std::sync::Arc;

use portal_core::DomainEvent;
use portal_core::model::{
    Course, CourseId, CoursePatch, Resource, ResourceDraft, ResourceId, ResourcePatch,
};
use storage::repository::CourseRepository;

use crate::error::CatalogServiceError;
use crate::events::EventBus;

/// Admin-side course catalog.
///
/// Every mutation reads the whole catalog, applies the change and writes it
/// back. Changes other views care about are announced on the event bus.
#[derive(Clone)]
pub struct CatalogService {
    courses: Arc<dyn CourseRepository>,
    events: EventBus,
}

impl CatalogService {
    #[must_use]
    pub fn new(courses: Arc<dyn CourseRepository>, events: EventBus) -> Self {
        Self { courses, events }
    }

    /// List courses, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` if repository access fails.
    pub async fn list_courses(&self) -> Result<Vec<Course>, CatalogServiceError> {
        Ok(self.courses.load_courses().await?)
    }

    /// Fetch a course by id.
    ///
    /// Returns `Ok(None)` when the course does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` if repository access fails.
    pub async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, CatalogServiceError> {
        let courses = self.courses.load_courses().await?;
        Ok(courses.into_iter().find(|c| c.id() == id))
    }

    /// Create a course and put it at the front of the catalog.
    ///
    /// A blank title is ignored and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Resource` if any draft is invalid; nothing
    /// is written in that case.
    /// Returns `CatalogServiceError::Storage` if persistence fails.
    pub async fn create_course(
        &self,
        title: &str,
        description: Option<&str>,
        drafts: Vec<ResourceDraft>,
    ) -> Result<Option<Course>, CatalogServiceError> {
        if title.trim().is_empty() {
            tracing::debug!("ignoring course without a title");
            return Ok(None);
        }
        let resources = drafts
            .into_iter()
            .map(ResourceDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;
        let course = Course::new(
            CourseId::generate(),
            title,
            description.map(str::to_owned),
            resources,
        )?;

        let mut courses = self.courses.load_courses().await?;
        courses.insert(0, course.clone());
        self.courses.save_courses(&courses).await?;
        tracing::info!(course = %course.id(), title = course.title(), "course created");

        self.events
            .publish(DomainEvent::CourseCreated {
                course_id: course.id().clone(),
                title: course.title().to_owned(),
                description: course.description().map(str::to_owned),
                resource_count: course.resources().len(),
            })
            .await;
        Ok(Some(course))
    }

    /// Append a resource to an existing course.
    ///
    /// Returns `Ok(None)` when the course does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Resource` if the draft has no name or
    /// neither a URL nor a file.
    /// Returns `CatalogServiceError::Storage` if persistence fails.
    pub async fn add_resource(
        &self,
        course_id: &CourseId,
        draft: ResourceDraft,
    ) -> Result<Option<Resource>, CatalogServiceError> {
        let resource = draft.validate()?;
        let mut courses = self.courses.load_courses().await?;
        let Some(course) = courses.iter_mut().find(|c| c.id() == course_id) else {
            tracing::debug!(course = %course_id, "add_resource on unknown course");
            return Ok(None);
        };
        course.push_resource(resource.clone());
        self.courses.save_courses(&courses).await?;
        Ok(Some(resource))
    }

    /// Remove a resource. Unknown course or resource ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` if repository access fails.
    pub async fn remove_resource(
        &self,
        course_id: &CourseId,
        resource_id: &ResourceId,
    ) -> Result<bool, CatalogServiceError> {
        let mut courses = self.courses.load_courses().await?;
        let removed = courses
            .iter_mut()
            .find(|c| c.id() == course_id)
            .is_some_and(|course| course.remove_resource(resource_id));
        if removed {
            self.courses.save_courses(&courses).await?;
        }
        Ok(removed)
    }

    /// Patch a resource in place. Unknown course or resource ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Course` if a patched field is invalid.
    /// Returns `CatalogServiceError::Storage` if repository access fails.
    pub async fn update_resource(
        &self,
        course_id: &CourseId,
        resource_id: &ResourceId,
        patch: ResourcePatch,
    ) -> Result<bool, CatalogServiceError> {
        let mut courses = self.courses.load_courses().await?;
        let Some(course) = courses.iter_mut().find(|c| c.id() == course_id) else {
            return Ok(false);
        };
        let updated = course.update_resource(resource_id, patch)?;
        if updated {
            self.courses.save_courses(&courses).await?;
        }
        Ok(updated)
    }

    /// Delete a course. Unknown ids are a no-op and publish nothing.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` if repository access fails.
    pub async fn delete_course(&self, course_id: &CourseId) -> Result<bool, CatalogServiceError> {
        let mut courses = self.courses.load_courses().await?;
        let before = courses.len();
        courses.retain(|c| c.id() != course_id);
        if courses.len() == before {
            return Ok(false);
        }
        self.courses.save_courses(&courses).await?;
        tracing::info!(course = %course_id, "course deleted");

        self.events
            .publish(DomainEvent::CourseDeleted {
                course_id: course_id.clone(),
            })
            .await;
        Ok(true)
    }

    /// Apply an admin edit to a course.
    ///
    /// Returns `Ok(None)` when the course does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Course` if the patch carries a blank title.
    /// Returns `CatalogServiceError::Storage` if repository access fails.
    pub async fn update_course(
        &self,
        course_id: &CourseId,
        patch: CoursePatch,
    ) -> Result<Option<Course>, CatalogServiceError> {
        let mut courses = self.courses.load_courses().await?;
        let Some(course) = courses.iter_mut().find(|c| c.id() == course_id) else {
            return Ok(None);
        };
        course.apply(&patch)?;
        let updated = course.clone();
        self.courses.save_courses(&courses).await?;

        if patch.title.is_some() || patch.description.is_some() {
            self.events
                .publish(DomainEvent::CourseUpdated {
                    course_id: course_id.clone(),
                    title: patch.title.map(|_| updated.title().to_owned()),
                    description: patch
                        .description
                        .map(|_| updated.description().unwrap_or_default().to_owned()),
                })
                .await;
        }
        Ok(Some(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::model::{CourseError, ResourceError, ResourceKind};
    use storage::repository::Storage;

    fn service() -> CatalogService {
        CatalogService::new(Storage::in_memory().courses, EventBus::new())
    }

    fn video(name: &str) -> ResourceDraft {
        ResourceDraft::new(name, ResourceKind::Video).with_url("https://example.com/video")
    }

    #[tokio::test]
    async fn blank_title_is_ignored() {
        let service = service();
        assert!(service.create_course("   ", None, vec![]).await.unwrap().is_none());
        assert!(service.list_courses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn new_courses_go_first_with_zero_counts() {
        let service = service();
        service.create_course("First", None, vec![]).await.unwrap();
        let second = service
            .create_course("Second", Some("desc"), vec![video("Intro").milestone(true)])
            .await
            .unwrap()
            .unwrap();

        let courses = service.list_courses().await.unwrap();
        assert_eq!(courses[0].title(), "Second");
        assert_eq!(courses[1].title(), "First");
        assert_eq!(second.enrolled_count(), 0);
        assert_eq!(second.completed_count(), 0);
        assert_eq!(second.milestone_count(), 1);
    }

    #[tokio::test]
    async fn invalid_draft_aborts_creation() {
        let service = service();
        let err = service
            .create_course("Course", None, vec![ResourceDraft::new("No source", ResourceKind::File)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogServiceError::Resource(ResourceError::MissingSource)
        ));
        assert!(service.list_courses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_resource_to_missing_course_is_none() {
        let service = service();
        let added = service
            .add_resource(&CourseId::new("missing"), video("Intro"))
            .await
            .unwrap();
        assert!(added.is_none());
    }

    #[tokio::test]
    async fn add_resource_requires_a_name() {
        let service = service();
        let course = service.create_course("Course", None, vec![]).await.unwrap().unwrap();
        let err = service
            .add_resource(course.id(), video("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogServiceError::Resource(ResourceError::EmptyName)));
    }

    #[tokio::test]
    async fn resource_updates_and_removals_ignore_unknown_ids() {
        let service = service();
        let course = service
            .create_course("Course", None, vec![video("Intro")])
            .await
            .unwrap()
            .unwrap();
        let resource_id = course.resources()[0].id().clone();

        assert!(!service
            .remove_resource(course.id(), &ResourceId::new("nope"))
            .await
            .unwrap());
        assert!(!service
            .update_resource(&CourseId::new("nope"), &resource_id, ResourcePatch::milestone(true))
            .await
            .unwrap());

        assert!(service
            .update_resource(course.id(), &resource_id, ResourcePatch::milestone(true))
            .await
            .unwrap());
        let stored = service.get_course(course.id()).await.unwrap().unwrap();
        assert_eq!(stored.milestone_count(), 1);

        assert!(service.remove_resource(course.id(), &resource_id).await.unwrap());
        let stored = service.get_course(course.id()).await.unwrap().unwrap();
        assert!(stored.resources().is_empty());
    }

    #[tokio::test]
    async fn update_course_rejects_blank_title() {
        let service = service();
        let course = service.create_course("Course", None, vec![]).await.unwrap().unwrap();
        let err = service
            .update_course(course.id(), CoursePatch::title(""))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogServiceError::Course(CourseError::EmptyTitle)));

        let edited = service
            .update_course(
                course.id(),
                CoursePatch {
                    enrolled_count: Some(40),
                    ..CoursePatch::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(edited.enrolled_count(), 40);
        assert_eq!(edited.title(), "Course");
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let service = service();
        let course = service.create_course("Course", None, vec![]).await.unwrap().unwrap();
        assert!(service.delete_course(course.id()).await.unwrap());
        assert!(!service.delete_course(course.id()).await.unwrap());
    }
}
