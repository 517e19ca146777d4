use std::sync::Arc;

use async_trait::async_trait;
use portal_core::DomainEvent;
use portal_core::model::CourseId;
use storage::repository::{CourseRepository, StorageError};

use crate::events::EventHandler;

/// Maintains each course's completed-learner count from completion events.
#[derive(Clone)]
pub struct CompletionCounter {
    courses: Arc<dyn CourseRepository>,
}

impl CompletionCounter {
    #[must_use]
    pub fn new(courses: Arc<dyn CourseRepository>) -> Self {
        Self { courses }
    }

    async fn adjust(&self, course_id: &CourseId, completed: bool) -> Result<(), StorageError> {
        let mut courses = self.courses.load_courses().await?;
        let Some(course) = courses.iter_mut().find(|c| c.id() == course_id) else {
            tracing::debug!(course = %course_id, "completion for a course no longer in the catalog");
            return Ok(());
        };
        if completed {
            course.record_completion();
        } else {
            course.revoke_completion();
        }
        self.courses.save_courses(&courses).await
    }
}

#[async_trait]
impl EventHandler for CompletionCounter {
    fn name(&self) -> &'static str {
        "completion_counter"
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), StorageError> {
        match event {
            DomainEvent::CourseCompleted { course_id } => self.adjust(course_id, true).await,
            DomainEvent::CourseReopened { course_id } => self.adjust(course_id, false).await,
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::model::Course;
    use storage::repository::Storage;

    #[tokio::test]
    async fn completions_move_the_counter_and_never_underflow() {
        let storage = Storage::in_memory();
        let course = Course::from_persisted(CourseId::new("c1"), "Care".into(), None, 10, 0, vec![]);
        storage.courses.save_courses(&[course]).await.unwrap();
        let counter = CompletionCounter::new(Arc::clone(&storage.courses));

        let completed = DomainEvent::CourseCompleted {
            course_id: CourseId::new("c1"),
        };
        let reopened = DomainEvent::CourseReopened {
            course_id: CourseId::new("c1"),
        };
        counter.handle(&completed).await.unwrap();
        counter.handle(&completed).await.unwrap();
        counter.handle(&reopened).await.unwrap();
        let courses = storage.courses.load_courses().await.unwrap();
        assert_eq!(courses[0].completed_count(), 1);
        assert_eq!(courses[0].enrolled_count(), 10);

        counter.handle(&reopened).await.unwrap();
        counter.handle(&reopened).await.unwrap();
        let courses = storage.courses.load_courses().await.unwrap();
        assert_eq!(courses[0].completed_count(), 0);
    }

    #[tokio::test]
    async fn unknown_course_is_ignored() {
        let storage = Storage::in_memory();
        let counter = CompletionCounter::new(Arc::clone(&storage.courses));
        counter
            .handle(&DomainEvent::CourseCompleted {
                course_id: CourseId::new("gone"),
            })
            .await
            .unwrap();
        assert!(storage.courses.load_courses().await.unwrap().is_empty());
    }
}
