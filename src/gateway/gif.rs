//! Animated GIF assembly
//!
//! Scales every frame to a square tile and encodes them, in order, into an
//! infinitely looping GIF. Encoding is CPU-bound, so it runs on the
//! blocking thread pool.

use async_trait::async_trait;
use image::codecs::gif::{GifEncoder, Repeat};
use image::imageops::FilterType;
use image::Delay;
use std::sync::Arc;

use super::AssemblyGateway;
use crate::config::GifConfig;
use crate::error::GatewayError;
use crate::state::{Artifact, Frame};

pub const GIF_MEDIA_TYPE: &str = "image/gif";

/// Encoder speed (1 = best quality, 30 = fastest)
const ENCODER_SPEED: i32 = 10;

/// Assembly gateway producing an animated GIF
#[derive(Debug, Clone)]
pub struct GifAssembler {
    /// Edge length of the square output, in pixels
    size: u32,
    /// How long each frame is shown
    frame_delay_ms: u32,
}

impl GifAssembler {
    pub fn new(size: u32, frame_delay_ms: u32) -> Self {
        Self {
            size: size.max(1),
            frame_delay_ms,
        }
    }

    pub fn from_config(config: &GifConfig) -> Self {
        Self::new(config.size, config.frame_delay_ms)
    }
}

impl Default for GifAssembler {
    fn default() -> Self {
        Self::from_config(&GifConfig::default())
    }
}

#[async_trait]
impl AssemblyGateway for GifAssembler {
    async fn assemble(&self, frames: Vec<Frame>) -> Result<Artifact, GatewayError> {
        let size = self.size;
        let delay_ms = self.frame_delay_ms;

        // Spawn blocking task for CPU-bound work
        tokio::task::spawn_blocking(move || encode_gif(&frames, size, delay_ms))
            .await
            .map_err(|e| GatewayError::Join(e.to_string()))?
    }
}

/// Blocking version of the assembly
fn encode_gif(frames: &[Frame], size: u32, delay_ms: u32) -> Result<Artifact, GatewayError> {
    if frames.is_empty() {
        return Err(GatewayError::NoFrames);
    }

    let mut data = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut data, ENCODER_SPEED);
        encoder.set_repeat(Repeat::Infinite)?;

        // Fill the square and crop the overflow so mixed aspect ratios line up
        let tiles = frames.iter().map(|frame| {
            let tile = frame
                .image()
                .resize_to_fill(size, size, FilterType::Triangle)
                .to_rgba8();
            image::Frame::from_parts(tile, 0, 0, Delay::from_numer_denom_ms(delay_ms, 1))
        });
        encoder.encode_frames(tiles)?;
    }

    tracing::info!(
        frames = frames.len(),
        bytes = data.len(),
        "🎞️ Encoded GIF"
    );

    Ok(Artifact {
        data: Arc::new(data),
        media_type: GIF_MEDIA_TYPE.to_string(),
        frame_count: frames.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifDecoder;
    use image::{AnimationDecoder, DynamicImage, Rgb, RgbImage};
    use std::io::Cursor;

    fn frame(width: u32, height: u32, color: [u8; 3]) -> Frame {
        Frame::new(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            Rgb(color),
        )))
    }

    #[tokio::test]
    async fn test_assembles_frames_in_order() {
        let assembler = GifAssembler::new(16, 100);
        let artifact = assembler
            .assemble(vec![
                frame(40, 20, [255, 0, 0]),
                frame(20, 40, [0, 0, 255]),
                frame(16, 16, [0, 255, 0]),
            ])
            .await
            .unwrap();

        assert_eq!(artifact.media_type, "image/gif");
        assert_eq!(artifact.frame_count, 3);
        assert!(artifact.data.starts_with(b"GIF89a"));

        let decoder = GifDecoder::new(Cursor::new(artifact.data.to_vec())).unwrap();
        let decoded = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(decoded.len(), 3);
        for decoded_frame in &decoded {
            assert_eq!(decoded_frame.buffer().dimensions(), (16, 16));
        }

        // Red first, blue second
        let first = decoded[0].buffer().get_pixel(8, 8);
        let second = decoded[1].buffer().get_pixel(8, 8);
        assert!(first[0] > 200 && first[2] < 50);
        assert!(second[2] > 200 && second[0] < 50);
    }

    #[tokio::test]
    async fn test_empty_sequence_is_rejected() {
        let result = GifAssembler::new(16, 100).assemble(Vec::new()).await;
        assert!(matches!(result, Err(GatewayError::NoFrames)));
    }
}
