//! Shared data structures for the session state
//!
//! These structs represent the data model that flows between
//! the orchestrator, the gateways and whatever renders the session.

use chrono::{DateTime, Utc};
use image::DynamicImage;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use super::mode::ResolvedMode;

/// Opaque photo identifier, assigned at capture time and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhotoId(Uuid);

impl PhotoId {
    pub fn new() -> Self {
        PhotoId(Uuid::new_v4())
    }
}

impl Default for PhotoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decoded still image shared by reference
///
/// Cloning a frame is cheap: snapshots, gateway requests and the
/// session all point at the same pixels.
#[derive(Clone)]
pub struct Frame(Arc<DynamicImage>);

impl Frame {
    pub fn new(image: DynamicImage) -> Self {
        Frame(Arc::new(image))
    }

    /// Decode an encoded image (JPEG, PNG, ...) into a frame
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        Ok(Frame::new(image::load_from_memory(bytes)?))
    }

    pub fn image(&self) -> &DynamicImage {
        &self.0
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }
}

impl From<DynamicImage> for Frame {
    fn from(image: DynamicImage) -> Self {
        Frame::new(image)
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({}x{})", self.width(), self.height())
    }
}

/// The combined output of an assembly (e.g. an animated GIF)
#[derive(Clone, PartialEq)]
pub struct Artifact {
    /// Encoded bytes of the artifact
    pub data: Arc<Vec<u8>>,
    /// MIME type of `data` (e.g. "image/gif")
    pub media_type: String,
    /// Number of frames the artifact was built from
    pub frame_count: usize,
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("media_type", &self.media_type)
            .field("bytes", &self.data.len())
            .field("frame_count", &self.frame_count)
            .finish()
    }
}

/// Where a photo is in its capture → transform → ready lifecycle
///
/// The output image only exists in the `Ready` variant, so a pending or
/// failed record can never carry one.
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoStatus {
    /// Transformation in flight
    Pending,
    /// Transformation succeeded
    Ready { output: Frame },
    /// Transformation errored; `reason` is shown as the failure indicator
    Failed { reason: String },
}

impl PhotoStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, PhotoStatus::Pending)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PhotoStatus::Ready { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PhotoStatus::Failed { .. })
    }
}

/// A single captured photo
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    pub id: PhotoId,
    /// The raw captured frame
    pub source: Frame,
    /// Mode resolved at capture time; never re-resolved
    pub mode: ResolvedMode,
    pub captured_at: DateTime<Utc>,
    pub status: PhotoStatus,
}

impl PhotoRecord {
    /// Create a record for a freshly captured frame, transformation pending
    pub fn pending(source: Frame, mode: ResolvedMode) -> Self {
        Self {
            id: PhotoId::new(),
            source,
            mode,
            captured_at: Utc::now(),
            status: PhotoStatus::Pending,
        }
    }

    /// The transformed image, if the transformation succeeded
    pub fn output(&self) -> Option<&Frame> {
        match &self.status {
            PhotoStatus::Ready { output } => Some(output),
            _ => None,
        }
    }
}

/// Progress of the "make GIF" operation
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AssemblyState {
    #[default]
    Idle,
    /// `ticket` identifies this run; `frames` is the size of its snapshot
    InProgress { ticket: u64, frames: usize },
    Ready(Artifact),
}

impl AssemblyState {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, AssemblyState::InProgress { .. })
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            AssemblyState::Ready(artifact) => Some(artifact),
            _ => None,
        }
    }
}
