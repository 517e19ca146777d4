use std::sync::Arc;

use portal_core::model::{
    Course, Educator, EducatorId, EducatorPatch, School, SchoolId, SchoolPatch,
};
use storage::repository::{CourseRepository, DirectoryRepository};

use crate::error::DirectoryServiceError;

/// Headline numbers for the admin dashboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_school_students: u64,
    pub total_completions: u64,
    pub total_enrollments: u64,
    pub course_count: usize,
}

impl DashboardStats {
    #[must_use]
    pub fn compute(schools: &[School], courses: &[Course]) -> Self {
        Self {
            total_school_students: schools.iter().map(|s| u64::from(s.student_count())).sum(),
            total_completions: courses.iter().map(|c| u64::from(c.completed_count())).sum(),
            total_enrollments: courses.iter().map(|c| u64::from(c.enrolled_count())).sum(),
            course_count: courses.len(),
        }
    }
}

/// Schools, educators and the dashboard summary.
#[derive(Clone)]
pub struct DirectoryService {
    directory: Arc<dyn DirectoryRepository>,
    courses: Arc<dyn CourseRepository>,
}

impl DirectoryService {
    #[must_use]
    pub fn new(
        directory: Arc<dyn DirectoryRepository>,
        courses: Arc<dyn CourseRepository>,
    ) -> Self {
        Self { directory, courses }
    }

    /// # Errors
    ///
    /// Returns `DirectoryServiceError::Storage` if repository access fails.
    pub async fn list_schools(&self) -> Result<Vec<School>, DirectoryServiceError> {
        Ok(self.directory.load_schools().await?)
    }

    /// Add a school. Returns `Ok(None)` without writing when the name or
    /// location is blank.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryServiceError::Storage` if repository access fails.
    pub async fn add_school(
        &self,
        name: &str,
        location: &str,
        student_count: u32,
    ) -> Result<Option<School>, DirectoryServiceError> {
        let Ok(school) = School::new(SchoolId::generate(), name, location, student_count) else {
            return Ok(None);
        };
        let mut schools = self.directory.load_schools().await?;
        schools.push(school.clone());
        self.directory.save_schools(&schools).await?;
        Ok(Some(school))
    }

    /// # Errors
    ///
    /// Returns `DirectoryServiceError::Directory` if a patched field is blank.
    /// Returns `DirectoryServiceError::Storage` if repository access fails.
    pub async fn update_school(
        &self,
        id: &SchoolId,
        patch: SchoolPatch,
    ) -> Result<Option<School>, DirectoryServiceError> {
        let mut schools = self.directory.load_schools().await?;
        let Some(school) = schools.iter_mut().find(|s| s.id() == id) else {
            return Ok(None);
        };
        school.apply(patch)?;
        let updated = school.clone();
        self.directory.save_schools(&schools).await?;
        Ok(Some(updated))
    }

    /// # Errors
    ///
    /// Returns `DirectoryServiceError::Storage` if repository access fails.
    pub async fn remove_school(&self, id: &SchoolId) -> Result<bool, DirectoryServiceError> {
        let mut schools = self.directory.load_schools().await?;
        let before = schools.len();
        schools.retain(|s| s.id() != id);
        let removed = schools.len() != before;
        if removed {
            self.directory.save_schools(&schools).await?;
        }
        Ok(removed)
    }

    /// # Errors
    ///
    /// Returns `DirectoryServiceError::Storage` if repository access fails.
    pub async fn list_educators(&self) -> Result<Vec<Educator>, DirectoryServiceError> {
        Ok(self.directory.load_educators().await?)
    }

    /// Add an educator. Returns `Ok(None)` without writing when the name or
    /// subject is blank.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryServiceError::Storage` if repository access fails.
    pub async fn add_educator(
        &self,
        name: &str,
        subject: &str,
        school: &str,
    ) -> Result<Option<Educator>, DirectoryServiceError> {
        let Ok(educator) = Educator::new(EducatorId::generate(), name, subject, school) else {
            return Ok(None);
        };
        let mut educators = self.directory.load_educators().await?;
        educators.push(educator.clone());
        self.directory.save_educators(&educators).await?;
        Ok(Some(educator))
    }

    /// # Errors
    ///
    /// Returns `DirectoryServiceError::Directory` if a patched field is blank.
    /// Returns `DirectoryServiceError::Storage` if repository access fails.
    pub async fn update_educator(
        &self,
        id: &EducatorId,
        patch: EducatorPatch,
    ) -> Result<Option<Educator>, DirectoryServiceError> {
        let mut educators = self.directory.load_educators().await?;
        let Some(educator) = educators.iter_mut().find(|e| e.id() == id) else {
            return Ok(None);
        };
        educator.apply(patch)?;
        let updated = educator.clone();
        self.directory.save_educators(&educators).await?;
        Ok(Some(updated))
    }

    /// # Errors
    ///
    /// Returns `DirectoryServiceError::Storage` if repository access fails.
    pub async fn remove_educator(&self, id: &EducatorId) -> Result<bool, DirectoryServiceError> {
        let mut educators = self.directory.load_educators().await?;
        let before = educators.len();
        educators.retain(|e| e.id() != id);
        let removed = educators.len() != before;
        if removed {
            self.directory.save_educators(&educators).await?;
        }
        Ok(removed)
    }

    /// # Errors
    ///
    /// Returns `DirectoryServiceError::Storage` if repository access fails.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, DirectoryServiceError> {
        let schools = self.directory.load_schools().await?;
        let courses = self.courses.load_courses().await?;
        Ok(DashboardStats::compute(&schools, &courses))
    }
}
