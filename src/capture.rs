//! Capture sources
//!
//! A capture source hands the orchestrator one still frame on demand. The
//! booth expects square, mirrored-if-selfie frames, so sources normalize
//! before handing them over.

use image::DynamicImage;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::config::CaptureConfig;
use crate::error::CaptureError;
use crate::state::Frame;

/// Supplies still frames
pub trait CaptureSource {
    fn grab(&mut self) -> Result<Frame, CaptureError>;
}

/// Largest centered square of an image
pub fn center_square(image: &DynamicImage) -> DynamicImage {
    let size = image.width().min(image.height());
    let x = (image.width() - size) / 2;
    let y = (image.height() - size) / 2;
    image.crop_imm(x, y, size, size)
}

/// Apply the capture policy to a raw frame
pub fn normalize(image: DynamicImage, config: &CaptureConfig) -> DynamicImage {
    let image = if config.square { center_square(&image) } else { image };
    if config.mirror {
        image.fliph()
    } else {
        image
    }
}

/// Reads frames from image files, one file per grab
#[derive(Debug)]
pub struct FileSource {
    queue: VecDeque<PathBuf>,
    config: CaptureConfig,
}

impl FileSource {
    pub fn new<I, P>(paths: I, config: CaptureConfig) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            queue: paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect(),
            config,
        }
    }

    /// Frames left to grab
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl CaptureSource for FileSource {
    fn grab(&mut self) -> Result<Frame, CaptureError> {
        let path = self.queue.pop_front().ok_or(CaptureError::Exhausted)?;
        let image = image::open(&path).map_err(|source| CaptureError::Load {
            path: path.display().to_string(),
            source,
        })?;

        tracing::debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "📷 Grabbed frame"
        );
        Ok(Frame::new(normalize(image, &self.config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// 4x2 image: left half black, right half white
    fn two_tone() -> DynamicImage {
        let mut img = RgbImage::new(4, 2);
        for y in 0..2 {
            for x in 2..4 {
                img.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_center_square_crops_longer_side() {
        let square = center_square(&two_tone());
        assert_eq!((square.width(), square.height()), (2, 2));

        let tall = DynamicImage::ImageRgb8(RgbImage::new(3, 7));
        let square = center_square(&tall);
        assert_eq!((square.width(), square.height()), (3, 3));
    }

    #[test]
    fn test_mirror_flips_horizontally() {
        let config = CaptureConfig {
            square: false,
            mirror: true,
        };
        let flipped = normalize(two_tone(), &config).to_rgb8();
        assert_eq!(flipped.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(flipped.get_pixel(3, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_file_source_reads_in_order_then_exhausts() {
        let dir = tempfile::tempdir().unwrap();
        let wide = dir.path().join("wide.png");
        let tall = dir.path().join("tall.png");
        RgbImage::new(8, 4).save(&wide).unwrap();
        RgbImage::new(4, 6).save(&tall).unwrap();

        let mut source = FileSource::new([&wide, &tall], CaptureConfig::default());
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.grab().unwrap().width(), 4);
        assert_eq!(source.grab().unwrap().height(), 4);
        assert!(matches!(source.grab(), Err(CaptureError::Exhausted)));
    }

    #[test]
    fn test_unreadable_file_reports_path() {
        let mut source = FileSource::new(["/nonexistent/frame.png"], CaptureConfig::default());
        match source.grab() {
            Err(CaptureError::Load { path, .. }) => assert!(path.contains("frame.png")),
            other => panic!("expected load error, got {other:?}"),
        }
    }
}
