use thiserror::Error;

use crate::model::ids::{CourseId, ResourceId};
use crate::model::resource::{Resource, ResourceError, ResourcePatch};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// An admin-authored course and its ordered resources.
///
/// `enrolled_count` is curated by admins; `completed_count` moves as learners
/// reach or leave 100% progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    id: CourseId,
    title: String,
    description: Option<String>,
    enrolled_count: u32,
    completed_count: u32,
    resources: Vec<Resource>,
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_owned())
        .filter(|d| !d.is_empty())
}

impl Course {
    /// Creates a new course with zero enrollment and completion counts.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` if the title is empty or whitespace-only.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        description: Option<String>,
        resources: Vec<Resource>,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        Ok(Self {
            id,
            title: title.trim().to_owned(),
            description: normalize_description(description),
            enrolled_count: 0,
            completed_count: 0,
            resources,
        })
    }

    /// Rehydrate a persisted course without re-validating it.
    #[must_use]
    pub fn from_persisted(
        id: CourseId,
        title: String,
        description: Option<String>,
        enrolled_count: u32,
        completed_count: u32,
        resources: Vec<Resource>,
    ) -> Self {
        Self {
            id,
            title,
            description: normalize_description(description),
            enrolled_count,
            completed_count,
            resources,
        }
    }

    // Accessors

    #[must_use]
    pub fn id(&self) -> &CourseId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn enrolled_count(&self) -> u32 {
        self.enrolled_count
    }

    #[must_use]
    pub fn completed_count(&self) -> u32 {
        self.completed_count
    }

    #[must_use]
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    #[must_use]
    pub fn resource(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id() == id)
    }

    pub fn milestones(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(|r| r.is_milestone())
    }

    #[must_use]
    pub fn milestone_count(&self) -> usize {
        self.milestones().count()
    }

    /// Label used by the public listing, e.g. `"3 resources"`.
    #[must_use]
    pub fn resource_count_label(&self) -> String {
        resource_count_label(self.resources.len())
    }

    // Mutations

    /// Apply an admin edit.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` if the patch carries a blank title.
    pub fn apply(&mut self, patch: &CoursePatch) -> Result<(), CourseError> {
        if let Some(title) = patch.title.as_deref() {
            if title.trim().is_empty() {
                return Err(CourseError::EmptyTitle);
            }
            self.title = title.trim().to_owned();
        }
        if let Some(description) = patch.description.clone() {
            self.description = normalize_description(Some(description));
        }
        if let Some(enrolled) = patch.enrolled_count {
            self.enrolled_count = enrolled;
        }
        Ok(())
    }

    pub fn push_resource(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    /// Remove a resource; returns whether anything was removed.
    pub fn remove_resource(&mut self, id: &ResourceId) -> bool {
        let before = self.resources.len();
        self.resources.retain(|r| r.id() != id);
        self.resources.len() != before
    }

    /// Apply a patch to one resource; returns `Ok(false)` if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::Resource` if the patch is invalid.
    pub fn update_resource(
        &mut self,
        id: &ResourceId,
        patch: ResourcePatch,
    ) -> Result<bool, CourseError> {
        match self.resources.iter_mut().find(|r| r.id() == id) {
            Some(resource) => {
                resource.apply(patch)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn record_completion(&mut self) {
        self.completed_count = self.completed_count.saturating_add(1);
    }

    pub fn revoke_completion(&mut self) {
        self.completed_count = self.completed_count.saturating_sub(1);
    }
}

/// Human-readable resource count used as a listing duration placeholder.
#[must_use]
pub fn resource_count_label(count: usize) -> String {
    format!("{count} resources")
}

/// Partial admin edit of a course.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoursePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub enrolled_count: Option<u32>,
}

impl CoursePatch {
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
