use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

use crate::model::ids::ResourceId;
use crate::model::upload::{FilePayload, UploadError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResourceError {
    #[error("resource name cannot be empty")]
    EmptyName,

    #[error("either upload a file or provide a URL")]
    MissingSource,

    #[error("invalid resource URL: {0}")]
    InvalidUrl(String),

    #[error("unknown resource kind: {0}")]
    UnknownKind(String),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

//
// ─── KIND ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceKind {
    #[default]
    Video,
    File,
    Image,
}

impl ResourceKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Video => "video",
            ResourceKind::File => "file",
            ResourceKind::Image => "image",
        }
    }

    /// Guess the kind from a MIME type, defaulting to `File`.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("video/") {
            ResourceKind::Video
        } else if mime.starts_with("image/") {
            ResourceKind::Image
        } else {
            ResourceKind::File
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(ResourceKind::Video),
            "file" => Ok(ResourceKind::File),
            "image" => Ok(ResourceKind::Image),
            other => Err(ResourceError::UnknownKind(other.to_owned())),
        }
    }
}

fn parse_url(raw: Option<String>) -> Result<Option<Url>, ResourceError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Url::parse(trimmed)
        .map(Some)
        .map_err(|_| ResourceError::InvalidUrl(trimmed.to_owned()))
}

//
// ─── RESOURCE ──────────────────────────────────────────────────────────────────
//

/// A piece of course material: a video, document, or image.
///
/// Only milestone resources count toward a learner's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    id: ResourceId,
    name: String,
    kind: ResourceKind,
    url: Option<Url>,
    file: Option<FilePayload>,
    milestone: bool,
}

impl Resource {
    /// Rehydrate a persisted resource.
    ///
    /// The URL-or-file rule is enforced when a resource is created, not on load,
    /// so older resources without either still load.
    #[must_use]
    pub fn from_persisted(
        id: ResourceId,
        name: String,
        kind: ResourceKind,
        url: Option<Url>,
        file: Option<FilePayload>,
        milestone: bool,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            url,
            file,
            milestone,
        }
    }

    // Accessors

    #[must_use]
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    #[must_use]
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    #[must_use]
    pub fn file(&self) -> Option<&FilePayload> {
        self.file.as_ref()
    }

    #[must_use]
    pub fn is_milestone(&self) -> bool {
        self.milestone
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::EmptyName` or `ResourceError::InvalidUrl` for bad
    /// patch values; the resource is left untouched in that case.
    pub fn apply(&mut self, patch: ResourcePatch) -> Result<(), ResourceError> {
        let name = match patch.name {
            Some(name) if name.trim().is_empty() => return Err(ResourceError::EmptyName),
            Some(name) => Some(name.trim().to_owned()),
            None => None,
        };
        let url = match patch.url {
            Some(raw) => Some(parse_url(Some(raw))?),
            None => None,
        };

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(url) = url {
            self.url = url;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(file) = patch.file {
            self.file = Some(file);
        }
        if let Some(milestone) = patch.milestone {
            self.milestone = milestone;
        }
        Ok(())
    }
}

/// Partial update for a resource. `url: Some("")` clears the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePatch {
    pub name: Option<String>,
    pub kind: Option<ResourceKind>,
    pub url: Option<String>,
    pub file: Option<FilePayload>,
    pub milestone: Option<bool>,
}

impl ResourcePatch {
    #[must_use]
    pub fn milestone(value: bool) -> Self {
        Self {
            milestone: Some(value),
            ..Self::default()
        }
    }
}

//
// ─── DRAFT (unvalidated input) ─────────────────────────────────────────────────
//

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceDraft {
    pub name: String,
    pub kind: ResourceKind,
    pub url: Option<String>,
    pub file: Option<FilePayload>,
    pub milestone: bool,
}

impl ResourceDraft {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_file(mut self, file: FilePayload) -> Self {
        self.file = Some(file);
        self
    }

    #[must_use]
    pub fn milestone(mut self, milestone: bool) -> Self {
        self.milestone = milestone;
        self
    }

    /// Validate the draft into a resource with a freshly allocated id.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError` if the name is empty, the URL does not parse,
    /// or neither a URL nor a file payload is present.
    pub fn validate(self) -> Result<Resource, ResourceError> {
        self.validate_with_id(ResourceId::generate())
    }

    /// Validate the draft using the supplied id.
    ///
    /// # Errors
    ///
    /// See [`ResourceDraft::validate`].
    pub fn validate_with_id(self, id: ResourceId) -> Result<Resource, ResourceError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ResourceError::EmptyName);
        }
        let url = parse_url(self.url)?;
        if url.is_none() && self.file.is_none() {
            return Err(ResourceError::MissingSource);
        }
        Ok(Resource {
            id,
            name: name.to_owned(),
            kind: self.kind,
            url,
            file: self.file,
            milestone: self.milestone,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::upload::RESOURCE_UPLOAD_LIMIT;

    #[test]
    fn draft_requires_name() {
        let err = ResourceDraft::new("  ", ResourceKind::Video)
            .with_url("https://example.com/v.mp4")
            .validate()
            .unwrap_err();
        assert_eq!(err, ResourceError::EmptyName);
    }

    #[test]
    fn draft_requires_url_or_file() {
        let err = ResourceDraft::new("Intro", ResourceKind::Video)
            .with_url("   ")
            .validate()
            .unwrap_err();
        assert_eq!(err, ResourceError::MissingSource);
    }

    #[test]
    fn draft_accepts_file_without_url() {
        let file = FilePayload::encode(b"%PDF", "guide.pdf", "application/pdf", RESOURCE_UPLOAD_LIMIT)
            .unwrap();
        let resource = ResourceDraft::new(" Guide ", ResourceKind::File)
            .with_file(file)
            .milestone(true)
            .validate()
            .unwrap();
        assert_eq!(resource.name(), "Guide");
        assert!(resource.url().is_none());
        assert!(resource.is_milestone());
    }

    #[test]
    fn draft_rejects_relative_url() {
        let err = ResourceDraft::new("Intro", ResourceKind::Video)
            .with_url("videos/intro.mp4")
            .validate()
            .unwrap_err();
        assert_eq!(err, ResourceError::InvalidUrl("videos/intro.mp4".into()));
    }

    #[test]
    fn patch_toggles_milestone_without_revalidating_source() {
        let mut resource = Resource::from_persisted(
            ResourceId::new("r1"),
            "Overview".into(),
            ResourceKind::Video,
            None,
            None,
            false,
        );
        resource.apply(ResourcePatch::milestone(true)).unwrap();
        assert!(resource.is_milestone());
    }

    #[test]
    fn patch_with_empty_name_leaves_resource_untouched() {
        let mut resource = ResourceDraft::new("Overview", ResourceKind::Video)
            .with_url("https://example.com/a")
            .validate_with_id(ResourceId::new("r1"))
            .unwrap();
        let before = resource.clone();
        let err = resource
            .apply(ResourcePatch {
                name: Some(" ".into()),
                milestone: Some(true),
                ..ResourcePatch::default()
            })
            .unwrap_err();
        assert_eq!(err, ResourceError::EmptyName);
        assert_eq!(resource, before);
    }

    #[test]
    fn patch_with_blank_url_clears_it() {
        let mut resource = ResourceDraft::new("Overview", ResourceKind::Video)
            .with_url("https://example.com/a")
            .validate()
            .unwrap();
        resource
            .apply(ResourcePatch {
                url: Some(String::new()),
                ..ResourcePatch::default()
            })
            .unwrap();
        assert!(resource.url().is_none());
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Image".parse::<ResourceKind>().unwrap(), ResourceKind::Image);
        assert!("audio".parse::<ResourceKind>().is_err());
        assert_eq!(ResourceKind::from_mime("video/mp4"), ResourceKind::Video);
        assert_eq!(ResourceKind::from_mime("application/pdf"), ResourceKind::File);
    }
}
