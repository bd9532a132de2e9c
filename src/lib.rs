//! Photo booth session core
//!
//! Captures frames, restyles each one through an AI transformation
//! gateway and assembles the results into an animated GIF. The hard part
//! lives in [`Orchestrator`]: photos move through capture → transform →
//! ready independently and out of order, can be deleted mid-flight, and
//! assembly only runs when enough of them are ready.

pub mod capture;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod state;

pub use catalog::{ModeCatalog, ModeDescriptor};
pub use config::BoothConfig;
pub use error::{BoothError, CaptureError, ConfigError, GatewayError};
pub use orchestrator::{Intent, Orchestrator, Outcome, SessionWatcher};
pub use state::{
    Artifact, AssemblyState, Frame, ModeSelection, PhotoId, PhotoRecord, PhotoStatus,
    ResolvedMode, SessionState,
};
