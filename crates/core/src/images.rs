//! Image intake: validation, encoding, and the session's image set.
//!
//! Intake is split in two phases so callers can read and encode files
//! concurrently and still apply the batch atomically:
//!
//! 1. [`prepare_file`] checks one file's size and type and encodes it as a
//!    `data:` URI. It has no access to the session.
//! 2. [`admit`] takes every prepared result of a batch, enforces the image
//!    count limit against the current set, and returns a *new* set.
//!
//! [`ingest`] runs both phases synchronously.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::policy::ImageLimits;
use crate::types::ImageId;

/// Why a file was not attached. Messages are shown to the customer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    #[error("file is {size} bytes; the maximum is {max} bytes")]
    FileTooLarge { size: u64, max: u64 },

    #[error("`{content_type}` is not a supported image type")]
    UnsupportedType { content_type: String },

    #[error("file is empty")]
    EmptyFile,

    #[error("at most {max} images can be attached")]
    LimitReached { max: usize },
}

/// A file that was not attached, with the reason.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{filename}: {reason}")]
pub struct ImageRejection {
    pub filename: String,
    pub reason: RejectionReason,
}

/// Raw file handed over by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    pub filename: String,
    /// Declared MIME type. When absent it is guessed from the extension.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    /// Create an incoming file.
    #[must_use]
    pub fn new(filename: impl Into<String>, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.map(String::from),
            bytes,
        }
    }
}

/// An accepted, self-contained image attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub id: ImageId,
    /// Original filename as uploaded.
    pub filename: String,
    pub content_type: String,
    /// `data:<mime>;base64,<payload>` envelope.
    pub data_url: String,
    /// Size of the original file in bytes.
    pub byte_size: u64,
}

/// Ordered set of uploaded images keyed by [`ImageId`].
///
/// Lookup and removal by ID are O(1); iteration yields images in upload order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<UploadedImage>", into = "Vec<UploadedImage>")]
pub struct ImageSet {
    entries: HashMap<ImageId, Slot>,
    next_seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    seq: u64,
    image: UploadedImage,
}

impl ImageSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: ImageId) -> Option<&UploadedImage> {
        self.entries.get(&id).map(|slot| &slot.image)
    }

    #[must_use]
    pub fn contains(&self, id: ImageId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Remove an image by ID, returning it if it was present.
    pub fn remove(&mut self, id: ImageId) -> Option<UploadedImage> {
        self.entries.remove(&id).map(|slot| slot.image)
    }

    /// Images in upload order.
    #[must_use]
    pub fn ordered(&self) -> Vec<&UploadedImage> {
        let mut slots: Vec<&Slot> = self.entries.values().collect();
        slots.sort_by_key(|slot| slot.seq);
        slots.into_iter().map(|slot| &slot.image).collect()
    }

    fn push(&mut self, image: UploadedImage) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(image.id, Slot { seq, image });
    }
}

impl From<Vec<UploadedImage>> for ImageSet {
    fn from(images: Vec<UploadedImage>) -> Self {
        let mut set = Self::default();
        for image in images {
            set.push(image);
        }
        set
    }
}

impl From<ImageSet> for Vec<UploadedImage> {
    fn from(set: ImageSet) -> Self {
        set.ordered().into_iter().cloned().collect()
    }
}

/// Result of admitting a batch of files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    /// The image set after the batch; the input set is never modified.
    pub images: ImageSet,
    /// IDs of the images accepted from this batch, in submission order.
    pub accepted: Vec<ImageId>,
    /// One entry per file that was not attached.
    pub rejections: Vec<ImageRejection>,
}

/// Normalize a declared MIME type, or guess one from the filename.
fn resolve_content_type(file: &IncomingFile) -> Option<String> {
    if let Some(declared) = file.content_type.as_deref() {
        let essence = declared.split(';').next().unwrap_or("").trim();
        if !essence.is_empty() {
            return Some(essence.to_ascii_lowercase());
        }
    }

    let extension = file.filename.rsplit_once('.')?.1.to_ascii_lowercase();
    let guessed = match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => return None,
    };
    Some(guessed.to_string())
}

/// Encode bytes as a `data:` URI.
#[must_use]
pub fn encode_data_url(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{content_type};base64,{}", STANDARD.encode(bytes))
}

/// Validate and encode a single file.
///
/// Does not check the image count; see [`admit`].
///
/// # Errors
///
/// Returns an [`ImageRejection`] if the file is empty, too large, or not an
/// allowed image type.
pub fn prepare_file(file: IncomingFile, limits: &ImageLimits) -> Result<UploadedImage, ImageRejection> {
    let reject = |reason| ImageRejection {
        filename: file.filename.clone(),
        reason,
    };

    let size = file.bytes.len() as u64;
    if size == 0 {
        return Err(reject(RejectionReason::EmptyFile));
    }
    if size > limits.max_bytes {
        return Err(reject(RejectionReason::FileTooLarge {
            size,
            max: limits.max_bytes,
        }));
    }

    let content_type = match resolve_content_type(&file) {
        Some(ct) if limits.allows(&ct) => ct,
        other => {
            return Err(reject(RejectionReason::UnsupportedType {
                content_type: other.unwrap_or_else(|| "unknown".to_string()),
            }));
        }
    };

    let data_url = encode_data_url(&content_type, &file.bytes);
    Ok(UploadedImage {
        id: ImageId::generate(),
        filename: file.filename,
        content_type,
        data_url,
        byte_size: size,
    })
}

/// Apply a batch of prepared files to `current`, enforcing the count limit.
///
/// Files are considered in batch order: valid files are kept while there is
/// room, and every remaining valid file is rejected with
/// [`RejectionReason::LimitReached`].
#[must_use]
pub fn admit(
    prepared: Vec<Result<UploadedImage, ImageRejection>>,
    current: &ImageSet,
    limits: &ImageLimits,
) -> IngestOutcome {
    let mut images = current.clone();
    let mut accepted = Vec::new();
    let mut rejections = Vec::new();

    for result in prepared {
        match result {
            Ok(image) if images.len() < limits.max_count => {
                accepted.push(image.id);
                images.push(image);
            }
            Ok(image) => rejections.push(ImageRejection {
                filename: image.filename,
                reason: RejectionReason::LimitReached {
                    max: limits.max_count,
                },
            }),
            Err(rejection) => rejections.push(rejection),
        }
    }

    IngestOutcome {
        images,
        accepted,
        rejections,
    }
}

/// Validate, encode, and admit a batch of files in one step.
#[must_use]
pub fn ingest(files: Vec<IncomingFile>, current: &ImageSet, limits: &ImageLimits) -> IngestOutcome {
    let prepared = files
        .into_iter()
        .map(|file| prepare_file(file, limits))
        .collect();
    admit(prepared, current, limits)
}
