//! Domain events exchanged between the catalog, the public listing and
//! learner enrollments.

use crate::model::CourseId;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DomainEvent {
    /// An admin created a course.
    CourseCreated {
        course_id: CourseId,
        title: String,
        description: Option<String>,
        resource_count: usize,
    },
    /// An admin edited a course. Fields are `None` when the edit left them alone.
    CourseUpdated {
        course_id: CourseId,
        title: Option<String>,
        description: Option<String>,
    },
    CourseDeleted { course_id: CourseId },
    /// A learner's progress reached 100%.
    CourseCompleted { course_id: CourseId },
    /// A learner's progress dropped back below 100%.
    CourseReopened { course_id: CourseId },
}

impl DomainEvent {
    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        match self {
            DomainEvent::CourseCreated { course_id, .. }
            | DomainEvent::CourseUpdated { course_id, .. }
            | DomainEvent::CourseDeleted { course_id }
            | DomainEvent::CourseCompleted { course_id }
            | DomainEvent::CourseReopened { course_id } => course_id,
        }
    }

    /// Stable name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::CourseCreated { .. } => "course_created",
            DomainEvent::CourseUpdated { .. } => "course_updated",
            DomainEvent::CourseDeleted { .. } => "course_deleted",
            DomainEvent::CourseCompleted { .. } => "course_completed",
            DomainEvent::CourseReopened { .. } => "course_reopened",
        }
    }
}
