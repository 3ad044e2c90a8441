use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::{Uuid, Version};

/// File extensions accepted on upload, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Maximum accepted upload size in bytes (10 MiB).
pub const MAX_PHOTO_SIZE: u64 = 10 * 1024 * 1024;

/// Server-assigned photo identifier.
///
/// Always a UUIDv7, so the creation time travels with the identifier itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhotoId(Uuid);

impl PhotoId {
    /// Generate a fresh identifier stamped with the current time.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Creation time embedded in the identifier (millisecond precision).
    pub fn created_at(&self) -> DateTime<Utc> {
        self.0
            .get_timestamp()
            .and_then(|ts| {
                let (secs, nanos) = ts.to_unix();
                DateTime::from_timestamp(secs as i64, nanos)
            })
            .unwrap_or(DateTime::UNIX_EPOCH)
    }
}

impl Default for PhotoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhotoId({})", self.0)
    }
}

/// Returned when a string is not a UUIDv7.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid photo id: {0}")]
pub struct InvalidPhotoId(String);

impl FromStr for PhotoId {
    type Err = InvalidPhotoId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::parse_str(s.trim()).map_err(|_| InvalidPhotoId(s.to_string()))?;
        if uuid.get_version() != Some(Version::SortRand) {
            return Err(InvalidPhotoId(s.to_string()));
        }
        Ok(Self(uuid))
    }
}

impl TryFrom<String> for PhotoId {
    type Error = InvalidPhotoId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PhotoId> for String {
    fn from(id: PhotoId) -> Self {
        id.to_string()
    }
}

/// A stored photo record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub id: PhotoId,
    /// Location of the stored bytes.
    pub path: PathBuf,
    /// Lower-cased file extension the photo was uploaded with.
    pub extension: String,
    /// Size of the stored content in bytes.
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

impl Photo {
    pub fn new(id: PhotoId, path: PathBuf, extension: String, size: u64) -> Self {
        Self {
            id,
            path,
            extension,
            size,
            created_at: id.created_at(),
        }
    }

    /// Name of the stored file: `{id}.{extension}`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.id, self.extension)
    }
}

/// Reasons an upload is rejected before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhotoValidationError {
    #[error("File type not supported. Allowed types: {}", ALLOWED_EXTENSIONS.join(", "))]
    UnsupportedType,

    #[error("File size too large. Maximum size is {}MB", .limit / (1024 * 1024))]
    TooLarge { actual: u64, limit: u64 },

    #[error(
        "Upload a valid image. The file you uploaded was either not an image or a corrupted image."
    )]
    NotAnImage,
}

/// Extract the lower-cased extension after the final dot, if it is accepted.
pub fn accepted_extension(file_name: &str) -> Result<String, PhotoValidationError> {
    let (_, ext) = file_name
        .trim()
        .rsplit_once('.')
        .ok_or(PhotoValidationError::UnsupportedType)?;
    let ext = ext.to_ascii_lowercase();

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(PhotoValidationError::UnsupportedType)
    }
}

/// Reject sizes above `limit`. Content is not inspected.
pub fn check_size(size: u64, limit: u64) -> Result<(), PhotoValidationError> {
    if size > limit {
        return Err(PhotoValidationError::TooLarge {
            actual: size,
            limit,
        });
    }
    Ok(())
}

/// Check that the payload carries a decodable image header.
pub fn check_image_content(data: &[u8]) -> Result<(), PhotoValidationError> {
    image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|_| PhotoValidationError::NotAnImage)?
        .into_dimensions()
        .map(|_| ())
        .map_err(|_| PhotoValidationError::NotAnImage)
}

/// Run every upload check in order: extension, size, content.
///
/// Returns the normalized extension on success.
pub fn validate_upload(
    file_name: &str,
    data: &[u8],
    limit: u64,
) -> Result<String, PhotoValidationError> {
    let ext = accepted_extension(file_name)?;
    check_size(data.len() as u64, limit)?;
    check_image_content(data)?;
    Ok(ext)
}
