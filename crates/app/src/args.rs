use std::fmt;
use std::path::PathBuf;

use portal_core::certificate::DEFAULT_PLATFORM_NAME;
use portal_core::model::{
    CourseId, EducatorId, Price, ResourceId, ResourceKind, SchoolId, SessionRole,
};

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { what: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidRole { raw: String },
    InvalidKind { raw: String },
    InvalidPrice { raw: String },
    InvalidCount { raw: String },
    ResourceSource,
    EmptyProfileEdit,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { what } => write!(f, "missing argument: <{what}>"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidRole { raw } => {
                write!(f, "invalid role: {raw} (expected admin or user)")
            }
            ArgsError::InvalidKind { raw } => {
                write!(f, "invalid --kind value: {raw} (expected video, file or image)")
            }
            ArgsError::InvalidPrice { raw } => write!(f, "invalid --price value: {raw}"),
            ArgsError::InvalidCount { raw } => write!(f, "invalid student count: {raw}"),
            ArgsError::ResourceSource => write!(f, "exactly one of --url or --file is required"),
            ArgsError::EmptyProfileEdit => write!(f, "profile set needs --name and/or --email"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn require_positional(
    args: &mut impl Iterator<Item = String>,
    what: &'static str,
) -> Result<String, ArgsError> {
    match args.next() {
        Some(value) if !value.starts_with("--") => Ok(value),
        Some(flag) => Err(ArgsError::UnknownArg(flag)),
        None => Err(ArgsError::MissingArgument { what }),
    }
}

fn no_more(args: &mut impl Iterator<Item = String>) -> Result<(), ArgsError> {
    match args.next() {
        Some(extra) => Err(ArgsError::UnknownArg(extra)),
        None => Ok(()),
    }
}

fn parse_out_dir(args: &mut impl Iterator<Item = String>) -> Result<PathBuf, ArgsError> {
    let mut out_dir = PathBuf::from(".");
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out" => out_dir = PathBuf::from(require_value(args, "--out")?),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }
    Ok(out_dir)
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  portal [--db <sqlite_url>] <command>");
    eprintln!();
    eprintln!("Session:");
    eprintln!("  seed                      write default content for missing documents");
    eprintln!("  login <admin|user>");
    eprintln!("  logout");
    eprintln!();
    eprintln!("Admin:");
    eprintln!("  courses");
    eprintln!("  create-course <title> [--description <text>]");
    eprintln!("  add-resource <course-id> <name> (--url <url> | --file <path>)");
    eprintln!("               [--kind video|file|image] [--milestone]");
    eprintln!("  rename-course <course-id> <title>");
    eprintln!("  delete-course <course-id>");
    eprintln!("  stats");
    eprintln!("  schools | educators");
    eprintln!("  add-school <name> <location> <student-count>");
    eprintln!("  remove-school <school-id>");
    eprintln!("  add-educator <name> <subject> [--school <name>]");
    eprintln!("  remove-educator <educator-id>");
    eprintln!();
    eprintln!("Learner:");
    eprintln!("  catalog");
    eprintln!("  course <course-id>");
    eprintln!("  listings");
    eprintln!("  enroll <course-or-listing-id> [--price <amount>]");
    eprintln!("  toggle <course-id> <resource-id>");
    eprintln!("  progress");
    eprintln!("  certificate <course-id> [--out <dir>]");
    eprintln!("  export-resource <course-id> <resource-id> [--out <dir>]");
    eprintln!();
    eprintln!("Either session:");
    eprintln!("  profile");
    eprintln!("  profile set [--name <name>] [--email <email>]");
    eprintln!("  profile picture (<path> | --remove)");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://portal.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PORTAL_DB_URL, PORTAL_PLATFORM_NAME, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSource {
    Url(String),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileAction {
    Show,
    Set {
        name: Option<String>,
        email: Option<String>,
    },
    Picture(PathBuf),
    RemovePicture,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Seed,
    Login(SessionRole),
    Logout,
    Courses,
    CreateCourse {
        title: String,
        description: Option<String>,
    },
    AddResource {
        course_id: CourseId,
        name: String,
        source: ResourceSource,
        kind: Option<ResourceKind>,
        milestone: bool,
    },
    RenameCourse {
        course_id: CourseId,
        title: String,
    },
    DeleteCourse(CourseId),
    Stats,
    Schools,
    AddSchool {
        name: String,
        location: String,
        student_count: u32,
    },
    RemoveSchool(SchoolId),
    Educators,
    AddEducator {
        name: String,
        subject: String,
        school: String,
    },
    RemoveEducator(EducatorId),
    Catalog,
    Course(CourseId),
    Listings,
    Enroll {
        target: String,
        price: Option<Price>,
    },
    Toggle {
        course_id: CourseId,
        resource_id: ResourceId,
    },
    Progress,
    Certificate {
        course_id: CourseId,
        out_dir: PathBuf,
    },
    ExportResource {
        course_id: CourseId,
        resource_id: ResourceId,
        out_dir: PathBuf,
    },
    Profile(ProfileAction),
}

impl Command {
    /// Which session the command runs under, if any. Profile commands act on
    /// whichever session is active.
    pub fn required_role(&self) -> Option<SessionRole> {
        match self {
            Command::Seed
            | Command::Login(_)
            | Command::Logout
            | Command::Listings
            | Command::Profile(_) => None,
            Command::Courses
            | Command::CreateCourse { .. }
            | Command::AddResource { .. }
            | Command::RenameCourse { .. }
            | Command::DeleteCourse(_)
            | Command::Stats
            | Command::Schools
            | Command::AddSchool { .. }
            | Command::RemoveSchool(_)
            | Command::Educators
            | Command::AddEducator { .. }
            | Command::RemoveEducator(_) => Some(SessionRole::Admin),
            Command::Catalog
            | Command::Course(_)
            | Command::Enroll { .. }
            | Command::Toggle { .. }
            | Command::Progress
            | Command::Certificate { .. }
            | Command::ExportResource { .. } => Some(SessionRole::User),
        }
    }

    fn parse(name: &str, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let cmd = match name {
            "seed" => Command::Seed,
            "logout" => Command::Logout,
            "courses" => Command::Courses,
            "stats" => Command::Stats,
            "listings" => Command::Listings,
            "progress" => Command::Progress,
            "schools" => Command::Schools,
            "educators" => Command::Educators,
            "catalog" => Command::Catalog,
            "course" => Command::Course(CourseId::new(require_positional(args, "course-id")?)),
            "add-school" => {
                let name = require_positional(args, "name")?;
                let location = require_positional(args, "location")?;
                let raw = require_positional(args, "student-count")?;
                let student_count = raw
                    .parse()
                    .map_err(|_| ArgsError::InvalidCount { raw: raw.clone() })?;
                Command::AddSchool {
                    name,
                    location,
                    student_count,
                }
            }
            "remove-school" => {
                Command::RemoveSchool(SchoolId::new(require_positional(args, "school-id")?))
            }
            "add-educator" => {
                let name = require_positional(args, "name")?;
                let subject = require_positional(args, "subject")?;
                let mut school = String::new();
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--school" => school = require_value(args, "--school")?,
                        _ => return Err(ArgsError::UnknownArg(arg)),
                    }
                }
                return Ok(Command::AddEducator {
                    name,
                    subject,
                    school,
                });
            }
            "remove-educator" => {
                let id = require_positional(args, "educator-id")?;
                Command::RemoveEducator(EducatorId::new(id))
            }
            "profile" => return Self::parse_profile(args).map(Command::Profile),
            "login" => {
                let raw = require_positional(args, "admin|user")?;
                let role = raw
                    .parse::<SessionRole>()
                    .map_err(|_| ArgsError::InvalidRole { raw: raw.clone() })?;
                Command::Login(role)
            }
            "create-course" => {
                let title = require_positional(args, "title")?;
                let mut description = None;
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--description" => {
                            description = Some(require_value(args, "--description")?);
                        }
                        _ => return Err(ArgsError::UnknownArg(arg)),
                    }
                }
                return Ok(Command::CreateCourse { title, description });
            }
            "add-resource" => return Self::parse_add_resource(args),
            "rename-course" => {
                let course_id = CourseId::new(require_positional(args, "course-id")?);
                let title = require_positional(args, "title")?;
                Command::RenameCourse { course_id, title }
            }
            "delete-course" => {
                Command::DeleteCourse(CourseId::new(require_positional(args, "course-id")?))
            }
            "enroll" => {
                let target = require_positional(args, "course-or-listing-id")?;
                let mut price = None;
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--price" => {
                            let raw = require_value(args, "--price")?;
                            price = Some(
                                Price::parse_decimal(&raw)
                                    .ok_or(ArgsError::InvalidPrice { raw })?,
                            );
                        }
                        _ => return Err(ArgsError::UnknownArg(arg)),
                    }
                }
                return Ok(Command::Enroll { target, price });
            }
            "toggle" => {
                let course_id = CourseId::new(require_positional(args, "course-id")?);
                let resource_id = ResourceId::new(require_positional(args, "resource-id")?);
                Command::Toggle {
                    course_id,
                    resource_id,
                }
            }
            "certificate" => {
                let course_id = CourseId::new(require_positional(args, "course-id")?);
                let out_dir = parse_out_dir(args)?;
                return Ok(Command::Certificate { course_id, out_dir });
            }
            "export-resource" => {
                let course_id = CourseId::new(require_positional(args, "course-id")?);
                let resource_id = ResourceId::new(require_positional(args, "resource-id")?);
                let out_dir = parse_out_dir(args)?;
                return Ok(Command::ExportResource {
                    course_id,
                    resource_id,
                    out_dir,
                });
            }
            other => return Err(ArgsError::UnknownCommand(other.to_owned())),
        };
        no_more(args)?;
        Ok(cmd)
    }

    fn parse_profile(args: &mut impl Iterator<Item = String>) -> Result<ProfileAction, ArgsError> {
        let action = match args.next().as_deref() {
            None => return Ok(ProfileAction::Show),
            Some("set") => {
                let (mut name, mut email) = (None, None);
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--name" => name = Some(require_value(args, "--name")?),
                        "--email" => email = Some(require_value(args, "--email")?),
                        _ => return Err(ArgsError::UnknownArg(arg)),
                    }
                }
                if name.is_none() && email.is_none() {
                    return Err(ArgsError::EmptyProfileEdit);
                }
                return Ok(ProfileAction::Set { name, email });
            }
            Some("picture") => match args.next() {
                Some(flag) if flag == "--remove" => ProfileAction::RemovePicture,
                Some(path) if !path.starts_with("--") => ProfileAction::Picture(PathBuf::from(path)),
                Some(other) => return Err(ArgsError::UnknownArg(other)),
                None => return Err(ArgsError::MissingArgument { what: "path" }),
            },
            Some(other) => return Err(ArgsError::UnknownArg(other.to_owned())),
        };
        no_more(args)?;
        Ok(action)
    }

    fn parse_add_resource(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let course_id = CourseId::new(require_positional(args, "course-id")?);
        let name = require_positional(args, "name")?;
        let mut source = None;
        let mut kind = None;
        let mut milestone = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--url" | "--file" if source.is_some() => return Err(ArgsError::ResourceSource),
                "--url" => source = Some(ResourceSource::Url(require_value(args, "--url")?)),
                "--file" => {
                    source = Some(ResourceSource::File(PathBuf::from(require_value(
                        args, "--file",
                    )?)));
                }
                "--kind" => {
                    let raw = require_value(args, "--kind")?;
                    kind = Some(
                        raw.parse::<ResourceKind>()
                            .map_err(|_| ArgsError::InvalidKind { raw: raw.clone() })?,
                    );
                }
                "--milestone" => milestone = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Command::AddResource {
            course_id,
            name,
            source: source.ok_or(ArgsError::ResourceSource)?,
            kind,
            milestone,
        })
    }
}

#[derive(Debug)]
pub enum Parsed {
    Help,
    Run(Args),
}

#[derive(Debug)]
pub struct Args {
    pub db_url: String,
    pub platform_name: String,
    pub command: Command,
}

impl Args {
    /// Parse global flags, then the command and its arguments.
    ///
    /// `PORTAL_DB_URL` and `PORTAL_PLATFORM_NAME` supply defaults that flags override.
    pub fn parse(argv: impl IntoIterator<Item = String>) -> Result<Parsed, ArgsError> {
        let mut db_url = std::env::var("PORTAL_DB_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| "sqlite://portal.sqlite3".into(), normalize_sqlite_url);
        let platform_name = std::env::var("PORTAL_PLATFORM_NAME")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PLATFORM_NAME.to_owned());

        let mut args = argv.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--help" | "-h" | "help" => return Ok(Parsed::Help),
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                name => {
                    let command = Command::parse(name, &mut args)?;
                    return Ok(Parsed::Run(Self {
                        db_url,
                        platform_name,
                        command,
                    }));
                }
            }
        }
        Ok(Parsed::Help)
    }
}

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}
