//! Scripted gateways for driving the orchestrator from tests.
//!
//! Every gateway call is handed to the test through a channel together
//! with a responder, so the test decides when (and in which order) calls
//! complete.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use tokio::sync::{mpsc, oneshot};

use photobooth::gateway::{AssemblyGateway, TransformGateway};
use photobooth::{Artifact, Frame, GatewayError, ModeCatalog, ModeSelection, Orchestrator};

/// A 2x2 frame filled with one gray level
pub fn frame(value: u8) -> Frame {
    Frame::new(DynamicImage::ImageRgb8(RgbImage::from_pixel(
        2,
        2,
        Rgb([value, value, value]),
    )))
}

pub struct TransformCall {
    pub image: Frame,
    pub instruction: String,
    respond: oneshot::Sender<Result<Frame, GatewayError>>,
}

impl TransformCall {
    pub fn succeed(self, output: Frame) {
        let _ = self.respond.send(Ok(output));
    }

    pub fn fail(self, message: &str) {
        let _ = self.respond.send(Err(GatewayError::Request(message.to_string())));
    }
}

pub struct ScriptedTransformer {
    calls: mpsc::UnboundedSender<TransformCall>,
}

#[async_trait]
impl TransformGateway for ScriptedTransformer {
    async fn transform(&self, image: Frame, instruction: String) -> Result<Frame, GatewayError> {
        let (respond, response) = oneshot::channel();
        self.calls
            .send(TransformCall {
                image,
                instruction,
                respond,
            })
            .map_err(|_| GatewayError::Request("test harness gone".into()))?;
        response
            .await
            .map_err(|_| GatewayError::Request("call dropped".into()))?
    }
}

pub struct AssemblyCall {
    pub frames: Vec<Frame>,
    respond: oneshot::Sender<Result<Artifact, GatewayError>>,
}

impl AssemblyCall {
    pub fn succeed(self) {
        let artifact = Artifact {
            data: Arc::new(vec![0x47, 0x49, 0x46]),
            media_type: "image/gif".into(),
            frame_count: self.frames.len(),
        };
        let _ = self.respond.send(Ok(artifact));
    }

    pub fn fail(self, message: &str) {
        let _ = self.respond.send(Err(GatewayError::Request(message.to_string())));
    }
}

pub struct ScriptedAssembler {
    calls: mpsc::UnboundedSender<AssemblyCall>,
}

#[async_trait]
impl AssemblyGateway for ScriptedAssembler {
    async fn assemble(&self, frames: Vec<Frame>) -> Result<Artifact, GatewayError> {
        let (respond, response) = oneshot::channel();
        self.calls
            .send(AssemblyCall { frames, respond })
            .map_err(|_| GatewayError::Request("test harness gone".into()))?;
        response
            .await
            .map_err(|_| GatewayError::Request("call dropped".into()))?
    }
}

/// An orchestrator wired to scripted gateways
pub struct Harness {
    pub booth: Orchestrator,
    pub transforms: mpsc::UnboundedReceiver<TransformCall>,
    pub assemblies: mpsc::UnboundedReceiver<AssemblyCall>,
}

impl Harness {
    pub fn new() -> Self {
        Self::starting_in(ModeSelection::Catalog("anime".into()))
    }

    pub fn starting_in(mode: ModeSelection) -> Self {
        let (transform_tx, transforms) = mpsc::unbounded_channel();
        let (assembly_tx, assemblies) = mpsc::unbounded_channel();
        let booth = Orchestrator::new(
            Arc::new(ModeCatalog::builtin()),
            mode,
            Arc::new(ScriptedTransformer {
                calls: transform_tx,
            }),
            Arc::new(ScriptedAssembler { calls: assembly_tx }),
        );
        Self {
            booth,
            transforms,
            assemblies,
        }
    }

    pub async fn next_transform(&mut self) -> TransformCall {
        self.transforms
            .recv()
            .await
            .expect("a transformation call")
    }

    pub async fn next_assembly(&mut self) -> AssemblyCall {
        self.assemblies.recv().await.expect("an assembly call")
    }

    /// Capture `values.len()` frames and let every transformation succeed,
    /// mapping input gray level `v` to output `v + 100`
    pub async fn capture_ready(&mut self, values: &[u8]) -> Vec<photobooth::PhotoId> {
        let mut ids = Vec::new();
        for &value in values {
            ids.push(self.booth.capture(frame(value)).expect("capture"));
            let call = self.next_transform().await;
            call.succeed(frame(value + 100));
        }
        self.booth.settled().await;
        ids
    }
}
