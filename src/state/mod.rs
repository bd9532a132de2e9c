//! Session state module
//!
//! This module holds everything the booth tracks during a session:
//! - Photo records, frames and artifacts (data.rs)
//! - Mode selection and per-photo mode resolution (mode.rs)
//! - The session itself and its invariants (session.rs)

pub mod data;
pub mod mode;
pub mod session;

pub use data::{Artifact, AssemblyState, Frame, PhotoId, PhotoRecord, PhotoStatus};
pub use mode::{ModeSelection, ResolvedMode, CUSTOM_MODE_ID, RANDOM_MODE_ID};
pub use session::{SessionState, MIN_ASSEMBLY_PHOTOS};
