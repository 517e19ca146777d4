use crate::model::course::resource_count_label;
use crate::model::ids::{CourseId, ListingId};

/// Price label given to listings projected from admin courses.
pub const FREE_PRICE_LABEL: &str = "Free";

/// Description shown when the source course has none.
pub const MISSING_DESCRIPTION: &str = "No description provided";

/// A public "browse courses" entry.
///
/// Listings projected from a course carry a back-reference to it; static
/// catalog entries do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicCourseListing {
    id: ListingId,
    title: String,
    description: String,
    duration: String,
    price: String,
    course_id: Option<CourseId>,
}

impl PublicCourseListing {
    #[must_use]
    pub fn new(
        id: ListingId,
        title: impl Into<String>,
        description: impl Into<String>,
        duration: impl Into<String>,
        price: impl Into<String>,
        course_id: Option<CourseId>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            duration: duration.into(),
            price: price.into(),
            course_id,
        }
    }

    /// Build the projection of a freshly created course.
    #[must_use]
    pub fn project(
        id: ListingId,
        course_id: CourseId,
        title: &str,
        description: Option<&str>,
        resource_count: usize,
    ) -> Self {
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(MISSING_DESCRIPTION);
        Self::new(
            id,
            title,
            description,
            resource_count_label(resource_count),
            FREE_PRICE_LABEL,
            Some(course_id),
        )
    }

    // Accessors

    #[must_use]
    pub fn id(&self) -> ListingId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn duration(&self) -> &str {
        &self.duration
    }

    #[must_use]
    pub fn price(&self) -> &str {
        &self.price
    }

    #[must_use]
    pub fn course_id(&self) -> Option<&CourseId> {
        self.course_id.as_ref()
    }

    #[must_use]
    pub fn mirrors(&self, course_id: &CourseId) -> bool {
        self.course_id.as_ref() == Some(course_id)
    }

    /// Overwrite title and description, keeping the current value for any
    /// field that is absent or blank.
    pub fn retitle(&mut self, title: Option<&str>, description: Option<&str>) {
        if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
            self.title = title.to_owned();
        }
        if let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) {
            self.description = description.to_owned();
        }
    }
}

/// The id a new listing should receive: one past the current maximum, or 1.
#[must_use]
pub fn next_listing_id(listings: &[PublicCourseListing]) -> ListingId {
    listings
        .iter()
        .map(PublicCourseListing::id)
        .max()
        .map_or_else(|| ListingId::new(1), |max| max.next())
}
