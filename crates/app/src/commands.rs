use std::fmt;
use std::path::Path;

use portal_core::model::upload::mime_for_file_name;
use portal_core::model::{
    CourseId, CourseRef, CoursePatch, EnrollmentOffer, FilePayload, LOGIN_PATH, ListingId,
    PICTURE_UPLOAD_LIMIT, Price, RESOURCE_UPLOAD_LIMIT, ResourceDraft, ResourceId, ResourceKind,
    SessionRole,
};
use services::AppServices;

use crate::args::{Command, ProfileAction, ResourceSource};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug)]
pub enum CommandError {
    AccessDenied { required: SessionRole },
    SignedOut,
    NotFound { what: &'static str, id: String },
    Rejected(&'static str),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::AccessDenied { required } => write!(
                f,
                "redirecting to {LOGIN_PATH}: sign in with `portal login {required}` first"
            ),
            CommandError::SignedOut => write!(
                f,
                "redirecting to {LOGIN_PATH}: sign in with `portal login <admin|user>` first"
            ),
            CommandError::NotFound { what, id } => write!(f, "no {what} with id {id}"),
            CommandError::Rejected(reason) => f.write_str(reason),
        }
    }
}

impl std::error::Error for CommandError {}

/// Check the session marker, then run the command against the services.
pub async fn execute(app: &AppServices, command: Command) -> CommandResult {
    if let Some(required) = command.required_role() {
        let access = app.sessions().authorize(required).await?;
        if !access.is_granted() {
            return Err(CommandError::AccessDenied { required }.into());
        }
    }

    match command {
        Command::Seed => seed(app),
        Command::Login(role) => {
            app.sessions().sign_in(role).await?;
            println!("signed in as {role}; dashboard at {}", role.dashboard_path());
            Ok(())
        }
        Command::Logout => {
            app.sessions().sign_out().await?;
            println!("signed out");
            Ok(())
        }
        Command::Courses => courses(app).await,
        Command::CreateCourse { title, description } => {
            let created = app
                .catalog()
                .create_course(&title, description.as_deref(), Vec::new())
                .await?;
            let course = created.ok_or(CommandError::Rejected("course title must not be blank"))?;
            println!("created course {} ({})", course.id(), course.title());
            Ok(())
        }
        Command::AddResource {
            course_id,
            name,
            source,
            kind,
            milestone,
        } => {
            let draft = resource_draft(name, source, kind)?.milestone(milestone);
            let resource = app
                .catalog()
                .add_resource(&course_id, draft)
                .await?
                .ok_or_else(|| CommandError::NotFound {
                    what: "course",
                    id: course_id.to_string(),
                })?;
            println!("added {} resource {} to {course_id}", resource.kind(), resource.id());
            Ok(())
        }
        Command::RenameCourse { course_id, title } => {
            let updated = app
                .catalog()
                .update_course(&course_id, CoursePatch::title(title))
                .await?
                .ok_or_else(|| CommandError::NotFound {
                    what: "course",
                    id: course_id.to_string(),
                })?;
            println!("renamed {course_id} to {}", updated.title());
            Ok(())
        }
        Command::DeleteCourse(course_id) => {
            if !app.catalog().delete_course(&course_id).await? {
                return Err(CommandError::NotFound {
                    what: "course",
                    id: course_id.to_string(),
                }
                .into());
            }
            println!("deleted {course_id}");
            Ok(())
        }
        Command::Stats => {
            let stats = app.directory().dashboard_stats().await?;
            println!("courses:          {}", stats.course_count);
            println!("enrollments:      {}", stats.total_enrollments);
            println!("completions:      {}", stats.total_completions);
            println!("school students:  {}", stats.total_school_students);
            Ok(())
        }
        Command::Schools => {
            for school in app.directory().list_schools().await? {
                println!(
                    "{}  {}  ({}, {} students)",
                    school.id(),
                    school.name(),
                    school.location(),
                    school.student_count()
                );
            }
            Ok(())
        }
        Command::AddSchool {
            name,
            location,
            student_count,
        } => {
            let school = app
                .directory()
                .add_school(&name, &location, student_count)
                .await?
                .ok_or(CommandError::Rejected("school name and location are required"))?;
            println!("added school {} ({})", school.id(), school.name());
            Ok(())
        }
        Command::RemoveSchool(id) => {
            if !app.directory().remove_school(&id).await? {
                return Err(CommandError::NotFound {
                    what: "school",
                    id: id.to_string(),
                }
                .into());
            }
            println!("removed school {id}");
            Ok(())
        }
        Command::Educators => {
            for educator in app.directory().list_educators().await? {
                let school = if educator.school().is_empty() {
                    "no school"
                } else {
                    educator.school()
                };
                println!(
                    "{}  {}  {} ({school})",
                    educator.id(),
                    educator.name(),
                    educator.subject()
                );
            }
            Ok(())
        }
        Command::AddEducator {
            name,
            subject,
            school,
        } => {
            let educator = app
                .directory()
                .add_educator(&name, &subject, &school)
                .await?
                .ok_or(CommandError::Rejected("educator name and subject are required"))?;
            println!("added educator {} ({})", educator.id(), educator.name());
            Ok(())
        }
        Command::RemoveEducator(id) => {
            if !app.directory().remove_educator(&id).await? {
                return Err(CommandError::NotFound {
                    what: "educator",
                    id: id.to_string(),
                }
                .into());
            }
            println!("removed educator {id}");
            Ok(())
        }
        Command::Catalog => {
            for course in app.catalog().list_courses().await? {
                println!(
                    "{}  {}  ({})",
                    course.id(),
                    course.title(),
                    course.resource_count_label()
                );
                if let Some(description) = course.description() {
                    println!("      {description}");
                }
            }
            Ok(())
        }
        Command::Course(course_id) => course_view(app, &course_id).await,
        Command::Profile(action) => profile(app, action).await,
        Command::Listings => {
            for listing in app.listings().list_listings().await? {
                println!(
                    "{:>4}  {}  [{} | {}]",
                    listing.id().to_string(),
                    listing.title(),
                    listing.duration(),
                    listing.price()
                );
                println!("      {}", listing.description());
            }
            Ok(())
        }
        Command::Enroll { target, price } => enroll(app, &target, price).await,
        Command::Toggle {
            course_id,
            resource_id,
        } => {
            let outcome = app
                .enrollments()
                .toggle_resource_completion(&course_id, &resource_id)
                .await?;
            let state = if outcome.completed_resources.contains(&resource_id) {
                "done"
            } else {
                "not done"
            };
            println!("{resource_id} marked {state}; progress {}", outcome.progress);
            Ok(())
        }
        Command::Progress => progress(app).await,
        Command::Certificate { course_id, out_dir } => {
            let certificate = app.enrollments().certificate(&course_id).await?;
            std::fs::create_dir_all(&out_dir)?;
            let path = out_dir.join(certificate.file_name());
            std::fs::write(&path, certificate.body())?;
            println!("certificate written to {}", path.display());
            Ok(())
        }
        Command::ExportResource {
            course_id,
            resource_id,
            out_dir,
        } => export_resource(app, &course_id, &resource_id, &out_dir).await,
    }
}

/// Write an uploaded resource file to disk; link-only resources print their URL.
async fn export_resource(
    app: &AppServices,
    course_id: &CourseId,
    resource_id: &ResourceId,
    out_dir: &Path,
) -> CommandResult {
    let course = app
        .catalog()
        .get_course(course_id)
        .await?
        .ok_or_else(|| CommandError::NotFound {
            what: "course",
            id: course_id.to_string(),
        })?;
    let resource = course
        .resource(resource_id)
        .ok_or_else(|| CommandError::NotFound {
            what: "resource",
            id: resource_id.to_string(),
        })?;

    match (resource.file(), resource.url()) {
        (Some(file), _) => {
            let bytes = file.decode()?;
            std::fs::create_dir_all(out_dir)?;
            let path = out_dir.join(file.file_name());
            std::fs::write(&path, bytes)?;
            println!("{} written to {}", resource.name(), path.display());
        }
        (None, Some(url)) => println!("{} is a link: {url}", resource.name()),
        (None, None) => {
            return Err(CommandError::Rejected("resource has no file or link attached").into());
        }
    }
    Ok(())
}

/// Resources of one course with milestone flags and, once enrolled, the
/// learner's done marks.
async fn course_view(app: &AppServices, course_id: &CourseId) -> CommandResult {
    let course = app
        .catalog()
        .get_course(course_id)
        .await?
        .ok_or_else(|| CommandError::NotFound {
            what: "course",
            id: course_id.to_string(),
        })?;
    let source = CourseRef::Catalog(course_id.clone());
    let enrolled = app
        .enrollments()
        .enrolled_courses()
        .await?
        .into_iter()
        .find(|e| e.source() == &source);

    println!("{}  {}", course.id(), course.title());
    match &enrolled {
        Some(enrolled) => println!("progress {}", enrolled.progress()),
        None => println!("not enrolled; run `portal enroll {course_id}`"),
    }
    for resource in course.resources() {
        let done = enrolled
            .as_ref()
            .is_some_and(|e| e.completed_resources().contains(resource.id()));
        let check = if done { "[x]" } else { "[ ]" };
        let milestone = if resource.is_milestone() { " (milestone)" } else { "" };
        println!(
            "  {check} {}  {:<5}  {}{milestone}",
            resource.id(),
            resource.kind().as_str(),
            resource.name()
        );
    }
    Ok(())
}

fn picture_payload(path: &Path) -> Result<FilePayload, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    let file_name = file_name_of(path);
    let mime = mime_for_file_name(&file_name);
    Ok(FilePayload::encode(&bytes, file_name, mime, PICTURE_UPLOAD_LIMIT)?)
}

/// Profile commands act on the admin or learner profile, per the session.
async fn profile(app: &AppServices, action: ProfileAction) -> CommandResult {
    let role = app.sessions().current().await?.ok_or(CommandError::SignedOut)?;
    let profiles = app.profiles();

    let (name, email, picture) = match (role, action) {
        (SessionRole::Admin, ProfileAction::Show) => {
            let admin = profiles.admin().await?;
            println!("role:   {}", admin.role());
            println!("since:  {}", admin.admin_since());
            (admin.name().to_owned(), admin.email().to_owned(), admin.picture().cloned())
        }
        (SessionRole::User, ProfileAction::Show) => {
            let learner = profiles.learner().await?;
            println!("courses: {}", learner.enrolled_courses().len());
            (learner.name().to_owned(), learner.email().to_owned(), learner.picture().cloned())
        }
        (SessionRole::Admin, ProfileAction::Set { name, email }) => {
            let current = profiles.admin().await?;
            let name = name.unwrap_or_else(|| current.name().to_owned());
            let email = email.unwrap_or_else(|| current.email().to_owned());
            let admin = profiles.update_admin_details(&name, &email).await?;
            (admin.name().to_owned(), admin.email().to_owned(), admin.picture().cloned())
        }
        (SessionRole::User, ProfileAction::Set { name, email }) => {
            let current = profiles.learner().await?;
            let name = name.unwrap_or_else(|| current.name().to_owned());
            let email = email.unwrap_or_else(|| current.email().to_owned());
            let learner = profiles.update_learner_details(&name, &email).await?;
            (learner.name().to_owned(), learner.email().to_owned(), learner.picture().cloned())
        }
        (SessionRole::Admin, ProfileAction::Picture(path)) => {
            let admin = profiles.set_admin_picture(picture_payload(&path)?).await?;
            (admin.name().to_owned(), admin.email().to_owned(), admin.picture().cloned())
        }
        (SessionRole::User, ProfileAction::Picture(path)) => {
            let learner = profiles.set_learner_picture(picture_payload(&path)?).await?;
            (learner.name().to_owned(), learner.email().to_owned(), learner.picture().cloned())
        }
        (SessionRole::Admin, ProfileAction::RemovePicture) => {
            let admin = profiles.remove_admin_picture().await?;
            (admin.name().to_owned(), admin.email().to_owned(), admin.picture().cloned())
        }
        (SessionRole::User, ProfileAction::RemovePicture) => {
            let learner = profiles.remove_learner_picture().await?;
            (learner.name().to_owned(), learner.email().to_owned(), learner.picture().cloned())
        }
    };

    println!("name:    {name}");
    println!("email:   {email}");
    match picture {
        Some(picture) => println!(
            "picture: {} ({} bytes)",
            picture.file_name(),
            picture.size_bytes()
        ),
        None => println!("picture: none"),
    }
    Ok(())
}

fn seed(app: &AppServices) -> CommandResult {
    let report = app.seed_report();
    if !report.wrote_anything() {
        println!("nothing to seed; every document already exists");
        return Ok(());
    }
    let written = [
        ("courses", report.courses),
        ("schools", report.schools),
        ("educators", report.educators),
        ("learner profile", report.learner_profile),
        ("admin profile", report.admin_profile),
    ];
    for (name, _) in written.iter().filter(|(_, wrote)| *wrote) {
        println!("seeded {name}");
    }
    Ok(())
}

async fn courses(app: &AppServices) -> CommandResult {
    for course in app.catalog().list_courses().await? {
        println!(
            "{}  {}  ({}, {} enrolled, {} completed)",
            course.id(),
            course.title(),
            course.resource_count_label(),
            course.enrolled_count(),
            course.completed_count()
        );
        for resource in course.resources() {
            let marker = if resource.is_milestone() { "*" } else { " " };
            println!(
                "    {marker} {}  {:<5}  {}",
                resource.id(),
                resource.kind().as_str(),
                resource.name()
            );
        }
    }
    Ok(())
}

fn resource_draft(
    name: String,
    source: ResourceSource,
    kind: Option<ResourceKind>,
) -> Result<ResourceDraft, Box<dyn std::error::Error>> {
    match source {
        ResourceSource::Url(url) => {
            Ok(ResourceDraft::new(name, kind.unwrap_or_default()).with_url(url))
        }
        ResourceSource::File(path) => {
            let bytes = std::fs::read(&path)?;
            let file_name = file_name_of(&path);
            let mime = mime_for_file_name(&file_name);
            let payload = FilePayload::encode(&bytes, file_name, mime, RESOURCE_UPLOAD_LIMIT)?;
            let kind = kind.unwrap_or_else(|| ResourceKind::from_mime(mime));
            Ok(ResourceDraft::new(name, kind).with_file(payload))
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// A catalog course id wins over a listing id with the same text.
async fn enroll(
    app: &AppServices,
    target: &str,
    price: Option<Price>,
) -> CommandResult {
    let course_id = CourseId::new(target);
    let offer = match app.catalog().get_course(&course_id).await? {
        Some(course) => EnrollmentOffer::from_course(&course),
        None => {
            let listing = match target.parse::<ListingId>() {
                Ok(id) => app.listings().get_listing(id).await?,
                Err(_) => None,
            };
            let listing = listing.ok_or_else(|| CommandError::NotFound {
                what: "course or listing",
                id: target.to_owned(),
            })?;
            EnrollmentOffer::from_listing(&listing)
        }
    };
    let enrolled = app.enrollments().enroll(offer, price).await?;
    println!(
        "enrolled in {} ({}), paid {}",
        enrolled.title(),
        enrolled.source(),
        enrolled.amount_paid()
    );
    Ok(())
}

async fn progress(app: &AppServices) -> CommandResult {
    let enrollments = app.enrollments().enrolled_courses().await?;
    if enrollments.is_empty() {
        println!("not enrolled in any course; try `portal listings`");
        return Ok(());
    }
    for enrolled in enrollments {
        let status = if enrolled.is_complete() {
            "completed"
        } else {
            "in progress"
        };
        println!(
            "{:>4}  {}  {}  ({status}, enrolled {})",
            enrolled.progress().to_string(),
            enrolled.title(),
            enrolled.source(),
            enrolled.enrolled_at().date_naive()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::time::fixed_clock;
    use services::EnrollmentServiceError;
    use storage::Storage;

    async fn app() -> AppServices {
        AppServices::bootstrap(Storage::in_memory(), fixed_clock(), "Test Platform")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn commands_without_a_session_are_redirected() {
        let app = app().await;
        let err = execute(&app, Command::Stats).await.unwrap_err();
        assert!(err.to_string().contains(LOGIN_PATH));

        execute(&app, Command::Login(SessionRole::User)).await.unwrap();
        let err = execute(&app, Command::Courses).await.unwrap_err();
        assert!(err.to_string().contains("admin"));
        execute(&app, Command::Progress).await.unwrap();
    }

    #[tokio::test]
    async fn enroll_resolves_catalog_ids_before_listing_ids() {
        let app = app().await;
        execute(&app, Command::Login(SessionRole::User)).await.unwrap();
        let course = app.catalog().list_courses().await.unwrap().remove(0);

        let enroll = Command::Enroll {
            target: course.id().to_string(),
            price: None,
        };
        execute(&app, enroll.clone()).await.unwrap();
        let err = execute(&app, enroll).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EnrollmentServiceError>(),
            Some(EnrollmentServiceError::AlreadyEnrolled(_))
        ));

        let err = execute(
            &app,
            Command::Enroll {
                target: "999".into(),
                price: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CommandError>(),
            Some(CommandError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn url_resources_are_added_with_default_kind() {
        let app = app().await;
        execute(&app, Command::Login(SessionRole::Admin)).await.unwrap();
        let course = app.catalog().list_courses().await.unwrap().remove(0);

        execute(
            &app,
            Command::AddResource {
                course_id: course.id().clone(),
                name: "Handwashing".into(),
                source: ResourceSource::Url("https://example.com/wash.mp4".into()),
                kind: None,
                milestone: true,
            },
        )
        .await
        .unwrap();

        let course = app.catalog().get_course(course.id()).await.unwrap().unwrap();
        let added = course.resources().last().unwrap();
        assert_eq!(added.kind(), ResourceKind::Video);
        assert!(added.is_milestone());
    }

    #[tokio::test]
    async fn learner_browses_catalog_and_opens_a_course() {
        let app = app().await;
        execute(&app, Command::Login(SessionRole::User)).await.unwrap();
        execute(&app, Command::Catalog).await.unwrap();

        let course = app.catalog().list_courses().await.unwrap().remove(0);
        let first = course.resources()[0].id().clone();
        execute(&app, Command::Course(course.id().clone())).await.unwrap();

        execute(
            &app,
            Command::Enroll {
                target: course.id().to_string(),
                price: None,
            },
        )
        .await
        .unwrap();
        execute(
            &app,
            Command::Toggle {
                course_id: course.id().clone(),
                resource_id: first.clone(),
            },
        )
        .await
        .unwrap();
        execute(&app, Command::Course(course.id().clone())).await.unwrap();

        let enrolled = app.enrollments().enrolled_courses().await.unwrap();
        assert!(enrolled[0].completed_resources().contains(&first));

        let err = execute(&app, Command::Course(CourseId::new("missing")))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CommandError>(),
            Some(CommandError::NotFound { what: "course", .. })
        ));
    }

    #[tokio::test]
    async fn admin_manages_schools_and_educators() {
        let app = app().await;
        execute(&app, Command::Login(SessionRole::User)).await.unwrap();
        assert!(execute(&app, Command::Schools).await.is_err());

        execute(&app, Command::Login(SessionRole::Admin)).await.unwrap();
        execute(
            &app,
            Command::AddSchool {
                name: "Nakuru Annex".into(),
                location: "Nakuru".into(),
                student_count: 40,
            },
        )
        .await
        .unwrap();
        let schools = app.directory().list_schools().await.unwrap();
        assert_eq!(schools.len(), 5);
        let added = schools.last().unwrap().id().clone();
        execute(&app, Command::RemoveSchool(added.clone())).await.unwrap();
        assert!(execute(&app, Command::RemoveSchool(added)).await.is_err());

        let err = execute(
            &app,
            Command::AddEducator {
                name: "Ann Njeri".into(),
                subject: " ".into(),
                school: String::new(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CommandError>(),
            Some(CommandError::Rejected(_))
        ));
        execute(&app, Command::Educators).await.unwrap();
        assert_eq!(app.directory().list_educators().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn profile_commands_follow_the_session() {
        let app = app().await;
        let err = execute(&app, Command::Profile(ProfileAction::Show))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CommandError>(),
            Some(CommandError::SignedOut)
        ));

        execute(&app, Command::Login(SessionRole::User)).await.unwrap();
        execute(
            &app,
            Command::Profile(ProfileAction::Set {
                name: Some("Janet Doe".into()),
                email: None,
            }),
        )
        .await
        .unwrap();
        let learner = app.profiles().learner().await.unwrap();
        assert_eq!(learner.name(), "Janet Doe");
        assert_eq!(learner.email(), "jane@example.com");

        execute(&app, Command::Login(SessionRole::Admin)).await.unwrap();
        execute(
            &app,
            Command::Profile(ProfileAction::Set {
                name: None,
                email: Some("ops@mamaplus.com".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(app.profiles().admin().await.unwrap().email(), "ops@mamaplus.com");
        assert_eq!(app.profiles().learner().await.unwrap().name(), "Janet Doe");
    }

    #[tokio::test]
    async fn oversized_profile_picture_is_refused() {
        let app = app().await;
        execute(&app, Command::Login(SessionRole::User)).await.unwrap();

        let dir = std::env::temp_dir().join("portal-picture-limit");
        std::fs::create_dir_all(&dir).unwrap();
        let big = dir.join("big.png");
        let limit = usize::try_from(PICTURE_UPLOAD_LIMIT).unwrap();
        std::fs::write(&big, vec![0_u8; limit + 1]).unwrap();
        let small = dir.join("small.png");
        std::fs::write(&small, [0x89, 0x50, 0x4e, 0x47]).unwrap();

        assert!(execute(&app, Command::Profile(ProfileAction::Picture(big))).await.is_err());
        assert!(app.profiles().learner().await.unwrap().picture().is_none());

        execute(&app, Command::Profile(ProfileAction::Picture(small)))
            .await
            .unwrap();
        let picture = app.profiles().learner().await.unwrap().picture().cloned().unwrap();
        assert_eq!(picture.file_name(), "small.png");
        assert_eq!(picture.size_bytes(), 4);

        execute(&app, Command::Profile(ProfileAction::RemovePicture))
            .await
            .unwrap();
        assert!(app.profiles().learner().await.unwrap().picture().is_none());
    }
}
