//! Persisted document shapes.
//!
//! These mirror the domain types field-for-field in the camelCase layout the
//! documents are stored in, so repositories can serialize without leaking
//! storage concerns into the domain layer.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use portal_core::Progress;
use portal_core::model::{
    AdminProfile, Course, CourseId, CourseRef, EducatorId, EnrolledCourse, Educator, FilePayload,
    LearnerProfile, ListingId, Price, PublicCourseListing, Resource, ResourceId, ResourceKind,
    School, SchoolId,
};
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

//
// ─── COURSES ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub is_milestone: bool,
}

fn default_kind() -> String {
    ResourceKind::default().as_str().to_owned()
}

impl ResourceRecord {
    #[must_use]
    pub fn from_resource(resource: &Resource) -> Self {
        let file = resource.file();
        Self {
            id: resource.id().as_str().to_owned(),
            name: resource.name().to_owned(),
            kind: resource.kind().as_str().to_owned(),
            url: resource.url().map(ToString::to_string),
            file_data: file.map(|f| f.data_uri().to_owned()),
            file_name: file.map(|f| f.file_name().to_owned()),
            file_size: file.map(FilePayload::size_bytes),
            is_milestone: resource.is_milestone(),
        }
    }

    /// Convert back into a domain `Resource`.
    ///
    /// An unparseable URL is dropped with a warning rather than failing the
    /// whole course document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the resource kind is unknown.
    pub fn into_resource(self) -> Result<Resource, StorageError> {
        let kind: ResourceKind = self.kind.parse().map_err(ser)?;
        let url = blank_to_none(self.url).and_then(|raw| match Url::parse(raw.trim()) {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::warn!(resource = %self.id, url = %raw, %err, "dropping unparseable resource url");
                None
            }
        });
        let file = blank_to_none(self.file_data).map(|data| {
            let file_name = self.file_name.unwrap_or_else(|| self.name.clone());
            FilePayload::from_persisted(data, file_name, self.file_size.unwrap_or(0))
        });
        Ok(Resource::from_persisted(
            ResourceId::new(self.id),
            self.name,
            kind,
            url,
            file,
            self.is_milestone,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub enrolled_students: u32,
    #[serde(default)]
    pub completed_students: u32,
    #[serde(default)]
    pub resources: Vec<ResourceRecord>,
}

impl CourseRecord {
    #[must_use]
    pub fn from_course(course: &Course) -> Self {
        Self {
            id: course.id().as_str().to_owned(),
            title: course.title().to_owned(),
            description: course.description().map(str::to_owned),
            enrolled_students: course.enrolled_count(),
            completed_students: course.completed_count(),
            resources: course
                .resources()
                .iter()
                .map(ResourceRecord::from_resource)
                .collect(),
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if any resource cannot be mapped.
    pub fn into_course(self) -> Result<Course, StorageError> {
        let resources = self
            .resources
            .into_iter()
            .map(ResourceRecord::into_resource)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Course::from_persisted(
            CourseId::new(self.id),
            self.title,
            blank_to_none(self.description),
            self.enrolled_students,
            self.completed_students,
            resources,
        ))
    }
}

//
// ─── LISTINGS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    /// `None` when the stored id carries no usable number.
    #[serde(default, deserialize_with = "lenient_listing_id")]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
}

/// Listing ids are numbers, but some older documents stored them as strings
/// such as `"12"` or `"course-12"`. Anything else reads as `None` so one odd
/// entry never makes the whole document unreadable.
fn lenient_listing_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Some(n),
        RawId::Text(text) => {
            let digits: String = text.chars().filter(char::is_ascii_digit).collect();
            digits.parse().ok()
        }
        RawId::Other(_) => None,
    })
}

impl ListingRecord {
    #[must_use]
    pub fn from_listing(listing: &PublicCourseListing) -> Self {
        Self {
            id: Some(listing.id().value()),
            title: listing.title().to_owned(),
            description: listing.description().to_owned(),
            duration: listing.duration().to_owned(),
            price: listing.price().to_owned(),
            course_id: listing.course_id().map(|id| id.as_str().to_owned()),
        }
    }

    /// Map a whole listing document. Entries without a usable id keep their
    /// place and are numbered after the highest readable id.
    #[must_use]
    pub fn into_listings(records: Vec<Self>) -> Vec<PublicCourseListing> {
        let mut next = records.iter().filter_map(|r| r.id).max().unwrap_or(0);
        records
            .into_iter()
            .map(|record| {
                let id = record.id.unwrap_or_else(|| {
                    next += 1;
                    tracing::warn!(
                        title = %record.title,
                        id = next,
                        "listing without a usable id renumbered"
                    );
                    next
                });
                PublicCourseListing::new(
                    ListingId::new(id),
                    record.title,
                    record.description,
                    record.duration,
                    record.price,
                    blank_to_none(record.course_id).map(CourseId::new),
                )
            })
            .collect()
    }
}

//
// ─── PROFILES ──────────────────────────────────────────────────────────────────
//

const DEFAULT_PICTURE_NAME: &str = "profile-picture";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Course,
    Listing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourseRecord {
    pub id: String,
    #[serde(default)]
    pub source_kind: SourceKind,
    pub title: String,
    /// Stored as a decimal amount; converted to cents at this boundary.
    #[serde(default)]
    pub amount_paid: f64,
    #[serde(default)]
    pub progress: u32,
    pub enrolled_date: String,
    #[serde(default)]
    pub completed_resources: Vec<String>,
}

#[allow(clippy::cast_precision_loss)]
fn cents_to_decimal(price: Price) -> f64 {
    price.cents() as f64 / 100.0
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn decimal_to_cents(amount: f64) -> Price {
    if amount.is_finite() && amount > 0.0 {
        Price::from_cents((amount * 100.0).round() as u64)
    } else {
        Price::FREE
    }
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (read as midnight UTC).
fn parse_enrolled_date(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| StorageError::Serialization(format!("invalid enrolled date: {raw}")))
}

impl EnrolledCourseRecord {
    #[must_use]
    pub fn from_enrolled(enrolled: &EnrolledCourse) -> Self {
        let (id, source_kind) = match enrolled.source() {
            CourseRef::Catalog(id) => (id.as_str().to_owned(), SourceKind::Course),
            CourseRef::Listing(id) => (id.value().to_string(), SourceKind::Listing),
        };
        Self {
            id,
            source_kind,
            title: enrolled.title().to_owned(),
            amount_paid: cents_to_decimal(enrolled.amount_paid()),
            progress: u32::from(enrolled.progress().value()),
            enrolled_date: enrolled.enrolled_at().format("%Y-%m-%d").to_string(),
            completed_resources: enrolled
                .completed_resources()
                .iter()
                .map(|id| id.as_str().to_owned())
                .collect(),
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the source id or enrollment
    /// date cannot be read.
    pub fn into_enrolled(self) -> Result<EnrolledCourse, StorageError> {
        let source = match self.source_kind {
            SourceKind::Course => CourseRef::Catalog(CourseId::new(self.id)),
            SourceKind::Listing => CourseRef::Listing(self.id.parse().map_err(ser)?),
        };
        let completed: BTreeSet<ResourceId> = self
            .completed_resources
            .into_iter()
            .map(ResourceId::new)
            .collect();
        Ok(EnrolledCourse::from_persisted(
            source,
            self.title,
            decimal_to_cents(self.amount_paid),
            Progress::from_persisted(self.progress),
            parse_enrolled_date(&self.enrolled_date)?,
            completed,
        ))
    }
}

fn picture_from_record(
    data: Option<String>,
    name: Option<String>,
    size: Option<u64>,
) -> Option<FilePayload> {
    blank_to_none(data).map(|data| {
        FilePayload::from_persisted(
            data,
            name.unwrap_or_else(|| DEFAULT_PICTURE_NAME.to_owned()),
            size.unwrap_or(0),
        )
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProfileRecord {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture_size: Option<u64>,
    #[serde(default)]
    pub enrolled_courses: Vec<EnrolledCourseRecord>,
}

impl LearnerProfileRecord {
    #[must_use]
    pub fn from_profile(profile: &LearnerProfile) -> Self {
        let picture = profile.picture();
        Self {
            name: profile.name().to_owned(),
            email: profile.email().to_owned(),
            profile_picture: picture.map(|p| p.data_uri().to_owned()),
            profile_picture_name: picture.map(|p| p.file_name().to_owned()),
            profile_picture_size: picture.map(FilePayload::size_bytes),
            enrolled_courses: profile
                .enrolled_courses()
                .iter()
                .map(EnrolledCourseRecord::from_enrolled)
                .collect(),
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if any enrollment cannot be mapped.
    pub fn into_profile(self) -> Result<LearnerProfile, StorageError> {
        let enrolled = self
            .enrolled_courses
            .into_iter()
            .map(EnrolledCourseRecord::into_enrolled)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LearnerProfile::from_persisted(
            self.name,
            self.email,
            picture_from_record(
                self.profile_picture,
                self.profile_picture_name,
                self.profile_picture_size,
            ),
            enrolled,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfileRecord {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: String,
    pub admin_since: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture_size: Option<u64>,
}

impl AdminProfileRecord {
    #[must_use]
    pub fn from_profile(profile: &AdminProfile) -> Self {
        let picture = profile.picture();
        Self {
            name: profile.name().to_owned(),
            email: profile.email().to_owned(),
            role: profile.role().to_owned(),
            admin_since: profile.admin_since().format("%Y-%m-%d").to_string(),
            profile_picture: picture.map(|p| p.data_uri().to_owned()),
            profile_picture_name: picture.map(|p| p.file_name().to_owned()),
            profile_picture_size: picture.map(FilePayload::size_bytes),
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if `admin_since` is not a
    /// `YYYY-MM-DD` date.
    pub fn into_profile(self) -> Result<AdminProfile, StorageError> {
        let admin_since = NaiveDate::parse_from_str(&self.admin_since, "%Y-%m-%d").map_err(|_| {
            StorageError::Serialization(format!("invalid admin since date: {}", self.admin_since))
        })?;
        Ok(AdminProfile::from_persisted(
            self.name,
            self.email,
            self.role,
            admin_since,
            picture_from_record(
                self.profile_picture,
                self.profile_picture_name,
                self.profile_picture_size,
            ),
        ))
    }
}

//
// ─── DIRECTORY ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub student_count: u32,
}

impl SchoolRecord {
    #[must_use]
    pub fn from_school(school: &School) -> Self {
        Self {
            id: school.id().as_str().to_owned(),
            name: school.name().to_owned(),
            location: school.location().to_owned(),
            student_count: school.student_count(),
        }
    }

    #[must_use]
    pub fn into_school(self) -> School {
        School::from_persisted(
            SchoolId::new(self.id),
            self.name,
            self.location,
            self.student_count,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducatorRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub school: String,
}

impl EducatorRecord {
    #[must_use]
    pub fn from_educator(educator: &Educator) -> Self {
        Self {
            id: educator.id().as_str().to_owned(),
            name: educator.name().to_owned(),
            subject: educator.subject().to_owned(),
            school: educator.school().to_owned(),
        }
    }

    #[must_use]
    pub fn into_educator(self) -> Educator {
        Educator::from_persisted(
            EducatorId::new(self.id),
            self.name,
            self.subject,
            self.school,
        )
    }
}
