use chrono::NaiveDate;
use thiserror::Error;

use crate::model::enrollment::{CourseRef, EnrolledCourse};
use crate::model::upload::FilePayload;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("name cannot be empty")]
    EmptyName,

    #[error("email cannot be empty")]
    EmptyEmail,

    #[error("email address is missing an '@': {0}")]
    InvalidEmail(String),
}

fn validate_details(name: &str, email: &str) -> Result<(String, String), ProfileError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ProfileError::EmptyName);
    }
    let email = email.trim();
    if email.is_empty() {
        return Err(ProfileError::EmptyEmail);
    }
    if !email.contains('@') {
        return Err(ProfileError::InvalidEmail(email.to_owned()));
    }
    Ok((name.to_owned(), email.to_owned()))
}

//
// ─── LEARNER ───────────────────────────────────────────────────────────────────
//

/// The learner using this portal and their enrollments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnerProfile {
    name: String,
    email: String,
    picture: Option<FilePayload>,
    enrolled_courses: Vec<EnrolledCourse>,
}

impl LearnerProfile {
    /// # Errors
    ///
    /// Returns `ProfileError` if the name or email is blank or malformed.
    pub fn new(name: &str, email: &str) -> Result<Self, ProfileError> {
        let (name, email) = validate_details(name, email)?;
        Ok(Self {
            name,
            email,
            picture: None,
            enrolled_courses: Vec::new(),
        })
    }

    #[must_use]
    pub fn from_persisted(
        name: String,
        email: String,
        picture: Option<FilePayload>,
        enrolled_courses: Vec<EnrolledCourse>,
    ) -> Self {
        Self {
            name,
            email,
            picture,
            enrolled_courses,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn picture(&self) -> Option<&FilePayload> {
        self.picture.as_ref()
    }

    #[must_use]
    pub fn enrolled_courses(&self) -> &[EnrolledCourse] {
        &self.enrolled_courses
    }

    #[must_use]
    pub fn enrollment(&self, source: &CourseRef) -> Option<&EnrolledCourse> {
        self.enrolled_courses.iter().find(|c| c.source() == source)
    }

    pub fn enrollment_mut(&mut self, source: &CourseRef) -> Option<&mut EnrolledCourse> {
        self.enrolled_courses
            .iter_mut()
            .find(|c| c.source() == source)
    }

    #[must_use]
    pub fn is_enrolled(&self, source: &CourseRef) -> bool {
        self.enrollment(source).is_some()
    }

    /// Append an enrollment. Callers check for duplicates first.
    pub fn push_enrollment(&mut self, enrolled: EnrolledCourse) {
        self.enrolled_courses.push(enrolled);
    }

    pub fn in_progress(&self) -> impl Iterator<Item = &EnrolledCourse> {
        self.enrolled_courses.iter().filter(|c| !c.is_complete())
    }

    pub fn completed(&self) -> impl Iterator<Item = &EnrolledCourse> {
        self.enrolled_courses.iter().filter(|c| c.is_complete())
    }

    /// # Errors
    ///
    /// Returns `ProfileError` if the name or email is blank or malformed.
    pub fn update_details(&mut self, name: &str, email: &str) -> Result<(), ProfileError> {
        let (name, email) = validate_details(name, email)?;
        self.name = name;
        self.email = email;
        Ok(())
    }

    pub fn set_picture(&mut self, picture: Option<FilePayload>) {
        self.picture = picture;
    }
}

//
// ─── ADMIN ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminProfile {
    name: String,
    email: String,
    role: String,
    admin_since: NaiveDate,
    picture: Option<FilePayload>,
}

impl AdminProfile {
    /// # Errors
    ///
    /// Returns `ProfileError` if the name or email is blank or malformed.
    pub fn new(
        name: &str,
        email: &str,
        role: impl Into<String>,
        admin_since: NaiveDate,
    ) -> Result<Self, ProfileError> {
        let (name, email) = validate_details(name, email)?;
        Ok(Self {
            name,
            email,
            role: role.into(),
            admin_since,
            picture: None,
        })
    }

    #[must_use]
    pub fn from_persisted(
        name: String,
        email: String,
        role: String,
        admin_since: NaiveDate,
        picture: Option<FilePayload>,
    ) -> Self {
        Self {
            name,
            email,
            role,
            admin_since,
            picture,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    #[must_use]
    pub fn admin_since(&self) -> NaiveDate {
        self.admin_since
    }

    #[must_use]
    pub fn picture(&self) -> Option<&FilePayload> {
        self.picture.as_ref()
    }

    /// # Errors
    ///
    /// Returns `ProfileError` if the name or email is blank or malformed.
    pub fn update_details(&mut self, name: &str, email: &str) -> Result<(), ProfileError> {
        let (name, email) = validate_details(name, email)?;
        self.name = name;
        self.email = email;
        Ok(())
    }

    pub fn set_picture(&mut self, picture: Option<FilePayload>) {
        self.picture = picture;
    }
}
