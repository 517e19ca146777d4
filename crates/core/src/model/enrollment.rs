use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::model::course::Course;
use crate::model::ids::{CourseId, ListingId, ResourceId};
use crate::model::listing::PublicCourseListing;
use crate::progress::{Progress, ProgressChange, compute_progress};

//
// ─── SOURCE REFERENCE ──────────────────────────────────────────────────────────
//

/// What a learner enrolled in: an admin course, or a static public listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CourseRef {
    Catalog(CourseId),
    Listing(ListingId),
}

impl CourseRef {
    #[must_use]
    pub fn catalog_id(&self) -> Option<&CourseId> {
        match self {
            CourseRef::Catalog(id) => Some(id),
            CourseRef::Listing(_) => None,
        }
    }
}

impl fmt::Display for CourseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CourseRef::Catalog(id) => write!(f, "course:{id}"),
            CourseRef::Listing(id) => write!(f, "listing:{id}"),
        }
    }
}

//
// ─── PRICE ─────────────────────────────────────────────────────────────────────
//

/// An amount in minor units (cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(u64);

impl Price {
    pub const FREE: Price = Price(0);

    #[must_use]
    pub fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub fn cents(&self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn is_free(&self) -> bool {
        self.0 == 0
    }

    /// Parse a plain decimal amount such as `29.99` or `800`.
    #[must_use]
    pub fn parse_decimal(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (whole, frac) = raw.split_once('.').unwrap_or((raw, ""));
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return None;
        }
        let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let cents: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().ok()? * 10,
            2 => frac.parse().ok()?,
            _ => return None,
        };
        whole.checked_mul(100)?.checked_add(cents).map(Self)
    }

    /// Read a price out of a display label such as `"Free"`, `"$800"` or
    /// `"KES 1,000 per day"`. Labels without a number yield `None`.
    #[must_use]
    pub fn parse_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("free") {
            return Some(Self::FREE);
        }
        let start = label.find(|c: char| c.is_ascii_digit())?;
        let number: String = label[start..]
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
            .filter(|c| *c != ',')
            .collect();
        Self::parse_decimal(number.trim_end_matches('.'))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_free() {
            f.write_str("Free")
        } else {
            write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
        }
    }
}

//
// ─── OFFER ─────────────────────────────────────────────────────────────────────
//

/// Something a learner can enroll in, resolved from a course or a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentOffer {
    source: CourseRef,
    title: String,
    price: Price,
}

impl EnrollmentOffer {
    /// Admin courses are offered for free.
    #[must_use]
    pub fn from_course(course: &Course) -> Self {
        Self {
            source: CourseRef::Catalog(course.id().clone()),
            title: course.title().to_owned(),
            price: Price::FREE,
        }
    }

    /// A listing mirroring an admin course enrolls against that course, so
    /// progress can be tracked; static listings enroll against themselves.
    #[must_use]
    pub fn from_listing(listing: &PublicCourseListing) -> Self {
        let source = listing.course_id().map_or_else(
            || CourseRef::Listing(listing.id()),
            |id| CourseRef::Catalog(id.clone()),
        );
        Self {
            source,
            title: listing.title().to_owned(),
            price: Price::parse_label(listing.price()).unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn with_price(mut self, price: Price) -> Self {
        self.price = price;
        self
    }

    #[must_use]
    pub fn source(&self) -> &CourseRef {
        &self.source
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn price(&self) -> Price {
        self.price
    }
}

//
// ─── ENROLLED COURSE ───────────────────────────────────────────────────────────
//

/// A learner's enrollment and their progress through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrolledCourse {
    source: CourseRef,
    title: String,
    amount_paid: Price,
    progress: Progress,
    enrolled_at: DateTime<Utc>,
    completed_resources: BTreeSet<ResourceId>,
}

impl EnrolledCourse {
    /// Start a fresh enrollment at 0% with nothing completed.
    #[must_use]
    pub fn new(offer: EnrollmentOffer, enrolled_at: DateTime<Utc>) -> Self {
        Self {
            source: offer.source,
            title: offer.title,
            amount_paid: offer.price,
            progress: Progress::ZERO,
            enrolled_at,
            completed_resources: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn from_persisted(
        source: CourseRef,
        title: String,
        amount_paid: Price,
        progress: Progress,
        enrolled_at: DateTime<Utc>,
        completed_resources: BTreeSet<ResourceId>,
    ) -> Self {
        Self {
            source,
            title,
            amount_paid,
            progress,
            enrolled_at,
            completed_resources,
        }
    }

    // Accessors

    #[must_use]
    pub fn source(&self) -> &CourseRef {
        &self.source
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn amount_paid(&self) -> Price {
        self.amount_paid
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        self.progress
    }

    #[must_use]
    pub fn enrolled_at(&self) -> DateTime<Utc> {
        self.enrolled_at
    }

    #[must_use]
    pub fn completed_resources(&self) -> &BTreeSet<ResourceId> {
        &self.completed_resources
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress.is_complete()
    }

    /// Flip completion of `resource_id` and recompute progress against `course`.
    pub fn toggle_resource(&mut self, course: &Course, resource_id: ResourceId) -> ProgressChange {
        if !self.completed_resources.remove(&resource_id) {
            self.completed_resources.insert(resource_id);
        }
        let before = self.progress;
        self.progress = compute_progress(course, &self.completed_resources);
        ProgressChange {
            before,
            after: self.progress,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::resource::{Resource, ResourceKind};
    use crate::time::fixed_now;

    fn course() -> Course {
        let resources = ["a", "b", "c"]
            .iter()
            .enumerate()
            .map(|(i, id)| {
                Resource::from_persisted(
                    ResourceId::new(*id),
                    format!("Resource {id}"),
                    ResourceKind::Video,
                    None,
                    None,
                    i < 2,
                )
            })
            .collect();
        Course::from_persisted(CourseId::new("c1"), "Caregiving".into(), None, 0, 0, resources)
    }

    #[test]
    fn price_parses_labels() {
        assert_eq!(Price::parse_label("Free"), Some(Price::FREE));
        assert_eq!(Price::parse_label("$800"), Some(Price::from_cents(80_000)));
        assert_eq!(
            Price::parse_label("KES 1,000 per day"),
            Some(Price::from_cents(100_000))
        );
        assert_eq!(Price::parse_label("Contact for pricing"), None);
        assert_eq!(Price::parse_decimal("29.99"), Some(Price::from_cents(2_999)));
        assert_eq!(Price::parse_decimal("1.5"), Some(Price::from_cents(150)));
        assert_eq!(Price::parse_decimal("1.505"), None);
    }

    #[test]
    fn price_display() {
        assert_eq!(Price::from_cents(2_999).to_string(), "29.99");
        assert_eq!(Price::FREE.to_string(), "Free");
    }

    #[test]
    fn listing_with_back_reference_enrolls_against_course() {
        let listing = PublicCourseListing::project(
            ListingId::new(2),
            CourseId::new("c1"),
            "Caregiving",
            None,
            3,
        );
        let offer = EnrollmentOffer::from_listing(&listing);
        assert_eq!(offer.source(), &CourseRef::Catalog(CourseId::new("c1")));
        assert!(offer.price().is_free());
    }

    #[test]
    fn static_listing_enrolls_against_itself() {
        let listing = PublicCourseListing::new(
            ListingId::new(9),
            "Emergency Care",
            "First aid",
            "2 Days",
            "$44.99",
            None,
        );
        let offer = EnrollmentOffer::from_listing(&listing);
        assert_eq!(offer.source(), &CourseRef::Listing(ListingId::new(9)));
        assert_eq!(offer.price(), Price::from_cents(4_499));
    }

    #[test]
    fn toggle_twice_restores_state() {
        let course = course();
        let mut enrolled = EnrolledCourse::new(EnrollmentOffer::from_course(&course), fixed_now());
        enrolled.toggle_resource(&course, ResourceId::new("a"));
        let snapshot = enrolled.clone();

        let first = enrolled.toggle_resource(&course, ResourceId::new("b"));
        assert!(first.reached_completion());
        let second = enrolled.toggle_resource(&course, ResourceId::new("b"));
        assert!(second.lost_completion());
        assert_eq!(enrolled, snapshot);
    }

    #[test]
    fn toggling_non_milestone_keeps_progress() {
        let course = course();
        let mut enrolled = EnrolledCourse::new(EnrollmentOffer::from_course(&course), fixed_now());
        let change = enrolled.toggle_resource(&course, ResourceId::new("c"));
        assert_eq!(change.before, change.after);
        assert!(enrolled.completed_resources().contains(&ResourceId::new("c")));
    }
}
