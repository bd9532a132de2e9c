//! External gateways
//!
//! The core never transforms pixels or talks to the network itself. It
//! hands frames to these two traits and records whatever comes back:
//! - `gemini.rs` - image transformation through the Gemini API
//! - `gif.rs` - assembles frames into an animated GIF
//!
//! Both calls may take arbitrarily long or fail; neither is cancelled when
//! the caller loses interest in the result.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::state::{Artifact, Frame};

pub mod gemini;
pub mod gif;

pub use gemini::GeminiGateway;
pub use gif::GifAssembler;

/// Restyles one image according to a text instruction
#[async_trait]
pub trait TransformGateway: Send + Sync {
    async fn transform(&self, image: Frame, instruction: String) -> Result<Frame, GatewayError>;
}

/// Combines an ordered sequence of images into one artifact
#[async_trait]
pub trait AssemblyGateway: Send + Sync {
    async fn assemble(&self, frames: Vec<Frame>) -> Result<Artifact, GatewayError>;
}
