//! Core data structures: frames, frame sequences and the retained source.

use std::{io::Cursor, path::Path, sync::Arc};

use image::codecs::gif::GifDecoder;
use image::{ImageDecoder, RgbaImage};

use crate::error::DecodeError;
use crate::SizeSpec;

/// One decoded, resized still image plus its display duration.
#[derive(Clone)]
pub struct Frame {
    /// RGBA pixels at the sequence size
    image: RgbaImage,
    /// How long this frame stays on screen, at least 1
    delay_ms: u32,
}

impl Frame {
    /// Create a frame. A zero delay is raised to 1ms.
    pub fn new(image: RgbaImage, delay_ms: u32) -> Self {
        Self {
            image,
            delay_ms: delay_ms.max(1),
        }
    }

    #[inline]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    #[inline]
    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    /// Frame dimensions in pixels.
    #[inline]
    pub fn size(&self) -> SizeSpec {
        SizeSpec::new(self.image.width(), self.image.height())
    }

    /// Consume the frame and return its pixel buffer.
    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("size", &self.size().to_string())
            .field("delay_ms", &self.delay_ms)
            .finish()
    }
}

/// The complete ordered set of frames derived from a source at one size.
///
/// Never empty.
#[derive(Clone, Debug)]
pub struct FrameSequence {
    frames: Vec<Frame>,
}

impl FrameSequence {
    /// Wrap decoded frames. Fails with [`DecodeError::NoFrames`] when empty.
    pub fn new(frames: Vec<Frame>) -> Result<Self, DecodeError> {
        if frames.is_empty() {
            return Err(DecodeError::NoFrames);
        }
        Ok(Self { frames })
    }

    /// Number of frames, always at least 1.
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false; kept for API symmetry with slices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    /// Display delays in frame order.
    pub fn delays_ms(&self) -> Vec<u32> {
        self.frames.iter().map(Frame::delay_ms).collect()
    }

    /// Duration of one full loop.
    pub fn total_duration_ms(&self) -> u64 {
        self.frames.iter().map(|f| f.delay_ms as u64).sum()
    }

    /// Size of the first frame; every frame of a decoded sequence shares it.
    pub fn size(&self) -> SizeSpec {
        self.frames[0].size()
    }
}

impl std::ops::Index<usize> for FrameSequence {
    type Output = Frame;

    fn index(&self, index: usize) -> &Frame {
        &self.frames[index]
    }
}

impl<'a> IntoIterator for &'a FrameSequence {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// The unscaled source image, kept for the lifetime of a document.
///
/// Holds the encoded bytes so every resize decodes from the original
/// rather than from a previously resized sequence. Cloning is cheap.
#[derive(Clone)]
pub struct SourceImage {
    bytes: Arc<[u8]>,
    width: u32,
    height: u32,
}

pub(crate) type SourceDecoder = GifDecoder<Cursor<Arc<[u8]>>>;

impl SourceImage {
    /// Read and validate a GIF file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(bytes)
    }

    /// Validate GIF bytes held in memory.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Result<Self, DecodeError> {
        let bytes: Arc<[u8]> = bytes.into();
        let decoder = GifDecoder::new(Cursor::new(bytes.clone()))?;
        let (width, height) = decoder.dimensions();
        Ok(Self {
            bytes,
            width,
            height,
        })
    }

    /// Logical screen width of the original.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Logical screen height of the original.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Encoded size in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Open a fresh decoder positioned at the first frame.
    pub(crate) fn decoder(&self) -> Result<SourceDecoder, DecodeError> {
        Ok(GifDecoder::new(Cursor::new(self.bytes.clone()))?)
    }
}

impl std::fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceImage")
            .field("dimensions", &format!("{}x{}", self.width, self.height))
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(size: u32, value: u8) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba([value, value, value, 255]))
    }

    #[test]
    fn test_empty_sequence_rejected() {
        assert!(matches!(FrameSequence::new(Vec::new()), Err(DecodeError::NoFrames)));
    }

    #[test]
    fn test_sequence_accessors() {
        let seq = FrameSequence::new(vec![
            Frame::new(solid(4, 0), 100),
            Frame::new(solid(4, 50), 200),
            Frame::new(solid(4, 100), 0),
        ])
        .unwrap();

        assert_eq!(seq.len(), 3);
        assert!(!seq.is_empty());
        assert_eq!(seq.delays_ms(), vec![100, 200, 1]);
        assert_eq!(seq.total_duration_ms(), 301);
        assert_eq!(seq.size(), SizeSpec::new(4, 4));
        assert_eq!(seq[1].image().get_pixel(0, 0), &Rgba([50, 50, 50, 255]));
        assert!(seq.get(3).is_none());
    }

    #[test]
    fn test_source_rejects_garbage() {
        let result = SourceImage::from_bytes(b"definitely not a gif".to_vec());
        assert!(matches!(result, Err(DecodeError::Format(_))));
    }

    #[test]
    fn test_source_missing_file() {
        let result = SourceImage::open("/nonexistent/dir/anim.gif");
        assert!(matches!(result, Err(DecodeError::Io(_))));
    }
}
