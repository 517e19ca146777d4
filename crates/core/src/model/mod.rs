mod course;
mod directory;
mod enrollment;
mod ids;
mod listing;
mod profile;
mod resource;
mod session;
pub mod upload;

pub use ids::{CourseId, EducatorId, ListingId, ParseIdError, ResourceId, SchoolId};

pub use course::{Course, CourseError, CoursePatch, resource_count_label};
pub use directory::{DirectoryError, Educator, EducatorPatch, School, SchoolPatch};
pub use enrollment::{CourseRef, EnrolledCourse, EnrollmentOffer, Price};
pub use listing::{
    FREE_PRICE_LABEL, MISSING_DESCRIPTION, PublicCourseListing, next_listing_id,
};
pub use profile::{AdminProfile, LearnerProfile, ProfileError};
pub use resource::{Resource, ResourceDraft, ResourceError, ResourceKind, ResourcePatch};
pub use session::{Access, LOGIN_PATH, SessionRole, UnknownRoleError};
pub use upload::{FilePayload, PICTURE_UPLOAD_LIMIT, RESOURCE_UPLOAD_LIMIT, UploadError};
