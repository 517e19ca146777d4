use portal_core::certificate::CertificateError;
use portal_core::model::{EnrollmentOffer, ResourceDraft, ResourceKind, SessionRole};
use portal_core::time::fixed_now;
use services::{AppServices, Clock, EnrollmentServiceError};
use storage::repository::Storage;

#[tokio::test]
async fn milestone_progress_drives_completion_and_certificates() {
    let storage = Storage::sqlite("sqlite:file:memdb_enrollment_flow?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");
    let app = AppServices::bootstrap(storage, Clock::fixed(fixed_now()), "MamaPlus Education Platform")
        .await
        .expect("bootstrap");

    app.sessions().sign_in(SessionRole::User).await.unwrap();
    assert!(app.sessions().authorize(SessionRole::User).await.unwrap().is_granted());

    let course = app
        .catalog()
        .create_course(
            "Newborn Care",
            None,
            vec![
                ResourceDraft::new("Bathing", ResourceKind::Video)
                    .with_url("https://example.com/bathing")
                    .milestone(true),
                ResourceDraft::new("Reading list", ResourceKind::File)
                    .with_url("https://example.com/reading.pdf"),
                ResourceDraft::new("Sleep", ResourceKind::Video)
                    .with_url("https://example.com/sleep")
                    .milestone(true),
            ],
        )
        .await
        .expect("create")
        .expect("course");
    let a = course.resources()[0].id().clone();
    let b = course.resources()[2].id().clone();

    // Enroll through the mirrored public listing.
    let listing = app.listings().list_listings().await.unwrap().remove(0);
    let enrollments = app.enrollments();
    enrollments
        .enroll(EnrollmentOffer::from_listing(&listing), None)
        .await
        .expect("enroll");
    let err = enrollments
        .enroll(EnrollmentOffer::from_course(&course), None)
        .await
        .unwrap_err();
    assert!(matches!(err, EnrollmentServiceError::AlreadyEnrolled(_)));

    let outcome = enrollments
        .toggle_resource_completion(course.id(), &a)
        .await
        .unwrap();
    assert_eq!(outcome.progress.value(), 50);
    assert!(matches!(
        enrollments.certificate(course.id()).await,
        Err(EnrollmentServiceError::Certificate(CertificateError::Incomplete(_)))
    ));

    let outcome = enrollments
        .toggle_resource_completion(course.id(), &b)
        .await
        .unwrap();
    assert_eq!(outcome.progress.value(), 100);
    let stored = app.catalog().get_course(course.id()).await.unwrap().unwrap();
    assert_eq!(stored.completed_count(), 1);

    let certificate = enrollments.certificate(course.id()).await.unwrap();
    assert_eq!(certificate.file_name(), "Newborn_Care_Certificate.txt");
    assert!(certificate.body().contains("Jane Doe"));
    assert!(certificate.body().contains("\"Newborn Care\""));

    // Un-completing the first milestone drops back to 50%.
    let outcome = enrollments
        .toggle_resource_completion(course.id(), &a)
        .await
        .unwrap();
    assert_eq!(outcome.progress.value(), 50);
    assert_eq!(outcome.completed_resources.len(), 1);
    assert!(outcome.completed_resources.contains(&b));
    let stored = app.catalog().get_course(course.id()).await.unwrap().unwrap();
    assert_eq!(stored.completed_count(), 0);

    assert_eq!(enrollments.in_progress().await.unwrap().len(), 1);
    assert!(enrollments.completed().await.unwrap().is_empty());
}
