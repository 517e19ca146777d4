use thiserror::Error;

use crate::model::ids::{EducatorId, SchoolId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DirectoryError {
    #[error("name cannot be empty")]
    EmptyName,

    #[error("school location cannot be empty")]
    EmptyLocation,

    #[error("educator subject cannot be empty")]
    EmptySubject,
}

fn required(value: &str, err: DirectoryError) -> Result<String, DirectoryError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(err);
    }
    Ok(value.to_owned())
}

/// A campus or training centre tracked by admins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct School {
    id: SchoolId,
    name: String,
    location: String,
    student_count: u32,
}

impl School {
    /// # Errors
    ///
    /// Returns `DirectoryError` if the name or location is blank.
    pub fn new(
        id: SchoolId,
        name: &str,
        location: &str,
        student_count: u32,
    ) -> Result<Self, DirectoryError> {
        Ok(Self {
            id,
            name: required(name, DirectoryError::EmptyName)?,
            location: required(location, DirectoryError::EmptyLocation)?,
            student_count,
        })
    }

    #[must_use]
    pub fn from_persisted(id: SchoolId, name: String, location: String, student_count: u32) -> Self {
        Self {
            id,
            name,
            location,
            student_count,
        }
    }

    #[must_use]
    pub fn id(&self) -> &SchoolId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub fn student_count(&self) -> u32 {
        self.student_count
    }

    /// # Errors
    ///
    /// Returns `DirectoryError` if a supplied name or location is blank.
    pub fn apply(&mut self, patch: SchoolPatch) -> Result<(), DirectoryError> {
        let name = patch
            .name
            .map(|n| required(&n, DirectoryError::EmptyName))
            .transpose()?;
        let location = patch
            .location
            .map(|l| required(&l, DirectoryError::EmptyLocation))
            .transpose()?;
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(location) = location {
            self.location = location;
        }
        if let Some(count) = patch.student_count {
            self.student_count = count;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchoolPatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub student_count: Option<u32>,
}

/// An educator; `school` is free text and may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Educator {
    id: EducatorId,
    name: String,
    subject: String,
    school: String,
}

impl Educator {
    /// # Errors
    ///
    /// Returns `DirectoryError` if the name or subject is blank.
    pub fn new(
        id: EducatorId,
        name: &str,
        subject: &str,
        school: &str,
    ) -> Result<Self, DirectoryError> {
        Ok(Self {
            id,
            name: required(name, DirectoryError::EmptyName)?,
            subject: required(subject, DirectoryError::EmptySubject)?,
            school: school.trim().to_owned(),
        })
    }

    #[must_use]
    pub fn from_persisted(id: EducatorId, name: String, subject: String, school: String) -> Self {
        Self {
            id,
            name,
            subject,
            school,
        }
    }

    #[must_use]
    pub fn id(&self) -> &EducatorId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn school(&self) -> &str {
        &self.school
    }

    /// # Errors
    ///
    /// Returns `DirectoryError` if a supplied name or subject is blank.
    pub fn apply(&mut self, patch: EducatorPatch) -> Result<(), DirectoryError> {
        let name = patch
            .name
            .map(|n| required(&n, DirectoryError::EmptyName))
            .transpose()?;
        let subject = patch
            .subject
            .map(|s| required(&s, DirectoryError::EmptySubject))
            .transpose()?;
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(subject) = subject {
            self.subject = subject;
        }
        if let Some(school) = patch.school {
            self.school = school.trim().to_owned();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EducatorPatch {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub school: Option<String>,
}
