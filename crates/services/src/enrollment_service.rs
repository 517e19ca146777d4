use std::collections::BTreeSet;
use std::sync::Arc;

use portal_core::certificate::{Certificate, DEFAULT_PLATFORM_NAME};
use portal_core::model::{
    CourseId, CourseRef, EnrolledCourse, EnrollmentOffer, LearnerProfile, Price, ResourceId,
};
use portal_core::{DomainEvent, Progress};
use storage::repository::{CourseRepository, ProfileRepository};

use crate::Clock;
use crate::defaults;
use crate::error::EnrollmentServiceError;
use crate::events::EventBus;

/// Result of flipping one resource's completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub progress: Progress,
    pub completed_resources: BTreeSet<ResourceId>,
}

/// The learner's enrollments and their progress.
///
/// This service never writes the catalog: completion counts change through
/// `CourseCompleted` / `CourseReopened` events.
#[derive(Clone)]
pub struct EnrollmentService {
    clock: Clock,
    profiles: Arc<dyn ProfileRepository>,
    courses: Arc<dyn CourseRepository>,
    events: EventBus,
    platform_name: String,
}

impl EnrollmentService {
    #[must_use]
    pub fn new(
        clock: Clock,
        profiles: Arc<dyn ProfileRepository>,
        courses: Arc<dyn CourseRepository>,
        events: EventBus,
    ) -> Self {
        Self {
            clock,
            profiles,
            courses,
            events,
            platform_name: DEFAULT_PLATFORM_NAME.to_owned(),
        }
    }

    /// Name printed at the foot of certificates.
    #[must_use]
    pub fn with_platform_name(mut self, platform_name: impl Into<String>) -> Self {
        self.platform_name = platform_name.into();
        self
    }

    async fn learner(&self) -> Result<LearnerProfile, EnrollmentServiceError> {
        match self.profiles.load_learner().await? {
            Some(profile) => Ok(profile),
            None => Ok(defaults::learner_profile()?),
        }
    }

    /// Enroll the learner in a course or listing.
    ///
    /// `price_override` replaces the offer's price, for checkouts that charge
    /// a different amount.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::AlreadyEnrolled` if the learner already
    /// holds an enrollment for the same source.
    /// Returns `EnrollmentServiceError::Storage` if persistence fails.
    pub async fn enroll(
        &self,
        offer: EnrollmentOffer,
        price_override: Option<Price>,
    ) -> Result<EnrolledCourse, EnrollmentServiceError> {
        let mut profile = self.learner().await?;
        if profile.is_enrolled(offer.source()) {
            return Err(EnrollmentServiceError::AlreadyEnrolled(offer.source().clone()));
        }
        let offer = match price_override {
            Some(price) => offer.with_price(price),
            None => offer,
        };
        let enrolled = EnrolledCourse::new(offer, self.clock.now());
        profile.push_enrollment(enrolled.clone());
        self.profiles.save_learner(&profile).await?;
        tracing::info!(source = %enrolled.source(), title = enrolled.title(), "enrolled");
        Ok(enrolled)
    }

    /// Mark a resource done (or not done) and recompute progress.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::NotEnrolled` if the learner has no
    /// enrollment for the course, `EnrollmentServiceError::CourseNotFound` if
    /// the course is gone from the catalog, or `Storage` if persistence fails.
    pub async fn toggle_resource_completion(
        &self,
        course_id: &CourseId,
        resource_id: &ResourceId,
    ) -> Result<ToggleOutcome, EnrollmentServiceError> {
        let source = CourseRef::Catalog(course_id.clone());
        let mut profile = self.learner().await?;
        if !profile.is_enrolled(&source) {
            return Err(EnrollmentServiceError::NotEnrolled(course_id.clone()));
        }
        let course = self
            .courses
            .load_courses()
            .await?
            .into_iter()
            .find(|c| c.id() == course_id)
            .ok_or_else(|| EnrollmentServiceError::CourseNotFound(course_id.clone()))?;

        let Some(enrolled) = profile.enrollment_mut(&source) else {
            return Err(EnrollmentServiceError::NotEnrolled(course_id.clone()));
        };
        let change = enrolled.toggle_resource(&course, resource_id.clone());
        let outcome = ToggleOutcome {
            progress: enrolled.progress(),
            completed_resources: enrolled.completed_resources().clone(),
        };
        self.profiles.save_learner(&profile).await?;
        tracing::debug!(
            course = %course_id,
            resource = %resource_id,
            before = %change.before,
            after = %change.after,
            "resource completion toggled"
        );

        if change.reached_completion() {
            self.events
                .publish(DomainEvent::CourseCompleted {
                    course_id: course_id.clone(),
                })
                .await;
        } else if change.lost_completion() {
            self.events
                .publish(DomainEvent::CourseReopened {
                    course_id: course_id.clone(),
                })
                .await;
        }
        Ok(outcome)
    }

    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::Storage` if the profile cannot be read.
    pub async fn enrolled_courses(&self) -> Result<Vec<EnrolledCourse>, EnrollmentServiceError> {
        Ok(self.learner().await?.enrolled_courses().to_vec())
    }

    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::Storage` if the profile cannot be read.
    pub async fn in_progress(&self) -> Result<Vec<EnrolledCourse>, EnrollmentServiceError> {
        Ok(self.learner().await?.in_progress().cloned().collect())
    }

    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::Storage` if the profile cannot be read.
    pub async fn completed(&self) -> Result<Vec<EnrolledCourse>, EnrollmentServiceError> {
        Ok(self.learner().await?.completed().cloned().collect())
    }

    /// Issue a certificate for a finished course.
    ///
    /// The course title comes from the catalog when the course still exists,
    /// otherwise from the enrollment.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentServiceError::NotEnrolled` if there is no enrollment,
    /// or `EnrollmentServiceError::Certificate` if progress is below 100%.
    pub async fn certificate(
        &self,
        course_id: &CourseId,
    ) -> Result<Certificate, EnrollmentServiceError> {
        let profile = self.learner().await?;
        let enrolled = profile
            .enrollment(&CourseRef::Catalog(course_id.clone()))
            .ok_or_else(|| EnrollmentServiceError::NotEnrolled(course_id.clone()))?;
        let courses = self.courses.load_courses().await?;
        let title = courses
            .iter()
            .find(|c| c.id() == course_id)
            .map_or(enrolled.title(), |c| c.title());

        let certificate = Certificate::issue(
            profile.name(),
            title,
            enrolled.progress(),
            self.clock.today(),
            &self.platform_name,
        )?;
        tracing::info!(course = %course_id, file = certificate.file_name(), "certificate issued");
        Ok(certificate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::certificate::CertificateError;
    use portal_core::model::{Course, ListingId, PublicCourseListing, Resource, ResourceKind};
    use portal_core::time::fixed_clock;
    use storage::repository::Storage;

    fn course() -> Course {
        let resources = [("r1", true), ("r2", false), ("r3", true)]
            .into_iter()
            .map(|(id, milestone)| {
                Resource::from_persisted(
                    ResourceId::new(id),
                    format!("Resource {id}"),
                    ResourceKind::Video,
                    None,
                    None,
                    milestone,
                )
            })
            .collect();
        Course::from_persisted(CourseId::new("c1"), "Caregiving".into(), None, 0, 0, resources)
    }

    async fn service_with_course() -> (Storage, EnrollmentService) {
        let storage = Storage::in_memory();
        storage.courses.save_courses(&[course()]).await.unwrap();
        let service = EnrollmentService::new(
            fixed_clock(),
            Arc::clone(&storage.profiles),
            Arc::clone(&storage.courses),
            EventBus::new(),
        );
        (storage, service)
    }

    #[tokio::test]
    async fn double_enrollment_is_rejected() {
        let (_storage, service) = service_with_course().await;
        let offer = EnrollmentOffer::from_course(&course());
        service.enroll(offer.clone(), None).await.unwrap();

        let err = service.enroll(offer, None).await.unwrap_err();
        assert!(matches!(err, EnrollmentServiceError::AlreadyEnrolled(_)));
        assert_eq!(service.enrolled_courses().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn enrollment_uses_the_clock_and_price_override() {
        let (_storage, service) = service_with_course().await;
        let enrolled = service
            .enroll(
                EnrollmentOffer::from_course(&course()),
                Some(Price::from_cents(2_999)),
            )
            .await
            .unwrap();
        assert_eq!(enrolled.enrolled_at(), fixed_clock().now());
        assert_eq!(enrolled.amount_paid(), Price::from_cents(2_999));
        assert_eq!(enrolled.progress(), Progress::ZERO);
        assert!(enrolled.completed_resources().is_empty());
    }

    #[tokio::test]
    async fn static_listing_enrollments_are_tracked_separately() {
        let (_storage, service) = service_with_course().await;
        let listing = PublicCourseListing::new(
            ListingId::new(1),
            "Caregiving",
            "Same title, different source",
            "3 Days",
            "$800",
            None,
        );
        service
            .enroll(EnrollmentOffer::from_course(&course()), None)
            .await
            .unwrap();
        let enrolled = service
            .enroll(EnrollmentOffer::from_listing(&listing), None)
            .await
            .unwrap();
        assert_eq!(enrolled.amount_paid(), Price::from_cents(80_000));
        assert_eq!(service.in_progress().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn toggling_requires_an_enrollment_and_a_course() {
        let (storage, service) = service_with_course().await;
        let err = service
            .toggle_resource_completion(&CourseId::new("c1"), &ResourceId::new("r1"))
            .await
            .unwrap_err();
        assert!(matches!(err, EnrollmentServiceError::NotEnrolled(_)));

        service
            .enroll(EnrollmentOffer::from_course(&course()), None)
            .await
            .unwrap();
        storage.courses.save_courses(&[]).await.unwrap();
        let err = service
            .toggle_resource_completion(&CourseId::new("c1"), &ResourceId::new("r1"))
            .await
            .unwrap_err();
        assert!(matches!(err, EnrollmentServiceError::CourseNotFound(_)));
    }

    #[tokio::test]
    async fn certificate_needs_full_progress_and_uses_current_title() {
        let (storage, service) = service_with_course().await;
        let c1 = CourseId::new("c1");
        service
            .enroll(EnrollmentOffer::from_course(&course()), None)
            .await
            .unwrap();
        service
            .toggle_resource_completion(&c1, &ResourceId::new("r1"))
            .await
            .unwrap();

        let err = service.certificate(&c1).await.unwrap_err();
        assert!(matches!(
            err,
            EnrollmentServiceError::Certificate(CertificateError::Incomplete(_))
        ));

        service
            .toggle_resource_completion(&c1, &ResourceId::new("r3"))
            .await
            .unwrap();
        let mut renamed = course();
        renamed
            .apply(&portal_core::model::CoursePatch::title("Caregiving Essentials"))
            .unwrap();
        storage.courses.save_courses(&[renamed]).await.unwrap();

        let certificate = service.certificate(&c1).await.unwrap();
        assert_eq!(certificate.file_name(), "Caregiving_Essentials_Certificate.txt");
        assert!(certificate.body().contains("Jane Doe"));
        assert!(certificate.body().contains("\"Caregiving Essentials\""));
        assert!(certificate.body().contains("Date: 2026-01-01"));
        assert!(certificate.body().contains(DEFAULT_PLATFORM_NAME));
        assert_eq!(service.completed().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn platform_name_is_configurable() {
        let (_storage, service) = service_with_course().await;
        let service = service.with_platform_name("Childcare Academy");
        service
            .enroll(EnrollmentOffer::from_course(&course()), None)
            .await
            .unwrap();
        let c1 = CourseId::new("c1");
        for id in ["r1", "r3"] {
            service
                .toggle_resource_completion(&c1, &ResourceId::new(id))
                .await
                .unwrap();
        }
        let certificate = service.certificate(&c1).await.unwrap();
        assert!(certificate.body().contains("Childcare Academy"));
    }
}
