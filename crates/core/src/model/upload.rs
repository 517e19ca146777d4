use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Maximum size of a file attached to a course resource (10 MiB).
pub const RESOURCE_UPLOAD_LIMIT: u64 = 10 * 1024 * 1024;

/// Maximum size of a profile picture (2 MiB).
pub const PICTURE_UPLOAD_LIMIT: u64 = 2 * 1024 * 1024;

const FALLBACK_MIME: &str = "application/octet-stream";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UploadError {
    #[error("file is {size} bytes; uploads are limited to {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("file name cannot be empty")]
    EmptyFileName,

    #[error("payload is not a base64 data URI")]
    MalformedDataUri,
}

//
// ─── PAYLOAD ───────────────────────────────────────────────────────────────────
//

/// A file stored inline as a base64 data URI, alongside its original name and size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    data_uri: String,
    file_name: String,
    size_bytes: u64,
}

impl FilePayload {
    /// Encode raw file bytes as a data URI.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::TooLarge` when `bytes` exceeds `limit`, or
    /// `UploadError::EmptyFileName` when the name is blank.
    pub fn encode(
        bytes: &[u8],
        file_name: impl Into<String>,
        mime: &str,
        limit: u64,
    ) -> Result<Self, UploadError> {
        let file_name = file_name.into();
        if file_name.trim().is_empty() {
            return Err(UploadError::EmptyFileName);
        }
        let size = bytes.len() as u64;
        if size > limit {
            return Err(UploadError::TooLarge { size, limit });
        }
        let mime = if mime.trim().is_empty() {
            FALLBACK_MIME
        } else {
            mime.trim()
        };
        Ok(Self {
            data_uri: format!("data:{mime};base64,{}", STANDARD.encode(bytes)),
            file_name: file_name.trim().to_owned(),
            size_bytes: size,
        })
    }

    /// Rehydrate a payload that was already persisted. No limits are re-checked.
    #[must_use]
    pub fn from_persisted(data_uri: String, file_name: String, size_bytes: u64) -> Self {
        Self {
            data_uri,
            file_name,
            size_bytes,
        }
    }

    #[must_use]
    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// The MIME type declared in the data URI header, if any.
    #[must_use]
    pub fn mime_type(&self) -> Option<&str> {
        let header = self.data_uri.strip_prefix("data:")?.split(',').next()?;
        let mime = header.split(';').next()?;
        (!mime.is_empty()).then_some(mime)
    }

    /// Decode the payload back into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::MalformedDataUri` if the URI is not base64-encoded data.
    pub fn decode(&self) -> Result<Vec<u8>, UploadError> {
        let rest = self
            .data_uri
            .strip_prefix("data:")
            .ok_or(UploadError::MalformedDataUri)?;
        let (header, body) = rest.split_once(',').ok_or(UploadError::MalformedDataUri)?;
        if !header.ends_with(";base64") {
            return Err(UploadError::MalformedDataUri);
        }
        STANDARD
            .decode(body)
            .map_err(|_| UploadError::MalformedDataUri)
    }
}

/// Best-effort MIME type from a file name's extension.
#[must_use]
pub fn mime_for_file_name(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => FALLBACK_MIME,
    }
}
