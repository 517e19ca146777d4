//! First-run content for an empty store.

use chrono::NaiveDate;
use portal_core::model::{
    AdminProfile, Course, CourseId, Educator, EducatorId, LearnerProfile, ProfileError, Resource,
    ResourceId, ResourceKind, School, SchoolId,
};
use storage::document::{DocumentStore, keys};
use storage::repository::{Storage, StorageError};

use crate::error::AppServicesError;

pub const LEARNER_NAME: &str = "Jane Doe";
pub const LEARNER_EMAIL: &str = "jane@example.com";
pub const ADMIN_NAME: &str = "Admin User";
pub const ADMIN_EMAIL: &str = "admin@mamaplus.com";
pub const ADMIN_ROLE: &str = "Super Administrator";

fn placeholder(name: &str, kind: ResourceKind, milestone: bool) -> Resource {
    Resource::from_persisted(
        ResourceId::generate(),
        name.to_owned(),
        kind,
        None,
        None,
        milestone,
    )
}

/// The starter catalog, with hand-entered learner counts.
#[must_use]
pub fn courses() -> Vec<Course> {
    vec![
        Course::from_persisted(
            CourseId::generate(),
            "Introduction to Caregiving".into(),
            Some("Basic caregiving skills".into()),
            125,
            89,
            vec![
                placeholder("Course Overview Video", ResourceKind::Video, true),
                placeholder("Module 1: Basics", ResourceKind::Video, false),
                placeholder("Assessment Quiz", ResourceKind::File, true),
            ],
        ),
        Course::from_persisted(
            CourseId::generate(),
            "Maternal Health Basics".into(),
            Some("Essential maternal health knowledge".into()),
            98,
            67,
            vec![placeholder("Introduction", ResourceKind::Video, true)],
        ),
        Course::from_persisted(
            CourseId::generate(),
            "Infant Nutrition".into(),
            Some("Nutrition for infants and toddlers".into()),
            84,
            84,
            Vec::new(),
        ),
    ]
}

#[must_use]
pub fn schools() -> Vec<School> {
    [
        ("Nairobi Central Campus", "Nairobi", 125),
        ("Mombasa Learning Center", "Mombasa", 87),
        ("Kisumu Training Hub", "Kisumu", 64),
        ("Eldoret Branch", "Eldoret", 71),
    ]
    .into_iter()
    .map(|(name, location, students)| {
        School::from_persisted(SchoolId::generate(), name.into(), location.into(), students)
    })
    .collect()
}

#[must_use]
pub fn educators() -> Vec<Educator> {
    [
        ("Dr. Sarah Kamau", "Maternal Health", "Nairobi Central Campus"),
        ("James Omondi", "Infant Nutrition", "Mombasa Learning Center"),
        ("Grace Wanjiku", "Caregiving Basics", "Kisumu Training Hub"),
        ("Peter Mutua", "Child Development", "Nairobi Central Campus"),
        ("Mary Achieng", "Emergency Care", "Eldoret Branch"),
    ]
    .into_iter()
    .map(|(name, subject, school)| {
        Educator::from_persisted(
            EducatorId::generate(),
            name.into(),
            subject.into(),
            school.into(),
        )
    })
    .collect()
}

/// # Errors
///
/// Returns `ProfileError` only if the built-in details are invalid.
pub fn learner_profile() -> Result<LearnerProfile, ProfileError> {
    LearnerProfile::new(LEARNER_NAME, LEARNER_EMAIL)
}

/// # Errors
///
/// Returns `ProfileError` only if the built-in details are invalid.
pub fn admin_profile() -> Result<AdminProfile, ProfileError> {
    let since = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or_default();
    AdminProfile::new(ADMIN_NAME, ADMIN_EMAIL, ADMIN_ROLE, since)
}

/// Which documents a seeding pass wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub courses: bool,
    pub schools: bool,
    pub educators: bool,
    pub learner_profile: bool,
    pub admin_profile: bool,
}

impl SeedReport {
    #[must_use]
    pub fn wrote_anything(&self) -> bool {
        self.courses || self.schools || self.educators || self.learner_profile || self.admin_profile
    }
}

async fn is_absent(documents: &dyn DocumentStore, key: &str) -> Result<bool, StorageError> {
    Ok(documents.get(key).await?.is_none())
}

/// Write the default content for every document that has never been written.
///
/// Existing documents, including empty ones, are left alone.
///
/// # Errors
///
/// Returns `AppServicesError` if the store cannot be read or written.
pub async fn seed_missing(storage: &Storage) -> Result<SeedReport, AppServicesError> {
    let documents = storage.documents.as_ref();
    let mut report = SeedReport::default();

    if is_absent(documents, keys::COURSES).await? {
        storage.courses.save_courses(&courses()).await?;
        report.courses = true;
    }
    if is_absent(documents, keys::SCHOOLS).await? {
        storage.directory.save_schools(&schools()).await?;
        report.schools = true;
    }
    if is_absent(documents, keys::EDUCATORS).await? {
        storage.directory.save_educators(&educators()).await?;
        report.educators = true;
    }
    if is_absent(documents, keys::LEARNER_PROFILE).await? {
        storage.profiles.save_learner(&learner_profile()?).await?;
        report.learner_profile = true;
    }
    if is_absent(documents, keys::ADMIN_PROFILE).await? {
        storage.profiles.save_admin(&admin_profile()?).await?;
        report.admin_profile = true;
    }

    if report.wrote_anything() {
        tracing::info!(?report, "seeded default documents");
    }
    Ok(report)
}
