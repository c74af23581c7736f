//! Frame decoding: walk the source container and resample every frame.

use std::iter::FusedIterator;
use std::time::Duration;

use image::imageops::{self, FilterType};
use image::AnimationDecoder;

use crate::data::{Frame, FrameSequence, SourceImage};
use crate::error::DecodeError;
use crate::SizeSpec;

/// Produces frame sequences from a [`SourceImage`] at a target size.
///
/// Frames are resampled with nearest-neighbor filtering, which is fast
/// and never introduces colors absent from the palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameDecoder {
    default_delay_ms: u32,
    max_area: u64,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(100)
    }
}

impl FrameDecoder {
    /// Pixels per frame allowed by default (4096x4096).
    pub const DEFAULT_MAX_AREA: u64 = 4096 * 4096;

    /// Create a decoder that substitutes `default_delay_ms` for missing
    /// or zero frame durations.
    pub fn new(default_delay_ms: u32) -> Self {
        Self {
            default_delay_ms: default_delay_ms.max(1),
            max_area: Self::DEFAULT_MAX_AREA,
        }
    }

    /// Refuse target sizes covering more than `max_area` pixels.
    pub fn with_max_area(mut self, max_area: u64) -> Self {
        self.max_area = max_area.max(1);
        self
    }

    #[inline]
    pub fn default_delay_ms(&self) -> u32 {
        self.default_delay_ms
    }

    #[inline]
    pub fn max_area(&self) -> u64 {
        self.max_area
    }

    /// Whether frames at `size` stay within [`FrameDecoder::max_area`].
    #[inline]
    pub fn accepts(&self, size: SizeSpec) -> bool {
        size.area() <= self.max_area
    }

    /// Start a lazy pass over the source's frames.
    ///
    /// Each call opens a fresh cursor on the retained bytes, so a source
    /// can be decoded any number of times.
    pub fn frames(&self, source: &SourceImage, size: SizeSpec) -> Result<FrameIter, DecodeError> {
        if !self.accepts(size) {
            return Err(DecodeError::TooLarge {
                width: size.width,
                height: size.height,
                max_area: self.max_area,
            });
        }
        let frames = source.decoder()?.into_frames();
        Ok(FrameIter {
            state: IterState::Active(frames),
            size,
            default_delay_ms: self.default_delay_ms,
            decoded: 0,
        })
    }

    /// Decode every frame of `source` at `size`.
    ///
    /// Fails if any frame is corrupt or the source yields no frames.
    pub fn decode(&self, source: &SourceImage, size: SizeSpec) -> Result<FrameSequence, DecodeError> {
        let frames = self.frames(source, size)?.collect::<Result<Vec<_>, _>>()?;
        tracing::debug!("decoded {} frames at {}", frames.len(), size);
        FrameSequence::new(frames)
    }
}

enum IterState {
    Active(image::Frames<'static>),
    Exhausted,
}

/// Lazy, finite pass over a source's frames.
///
/// Reaching the end of the container moves the iterator into its
/// exhausted state for good; a decode error does the same after the
/// error is yielded. Start a new pass with [`FrameDecoder::frames`].
pub struct FrameIter {
    state: IterState,
    size: SizeSpec,
    default_delay_ms: u32,
    decoded: usize,
}

impl FrameIter {
    /// True once the container has signalled end of frames or failed.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, IterState::Exhausted)
    }

    /// Number of frames yielded so far.
    pub fn decoded(&self) -> usize {
        self.decoded
    }

    fn convert(&self, frame: image::Frame) -> Frame {
        let delay_ms = delay_to_ms(frame.delay(), self.default_delay_ms);
        let buffer = frame.into_buffer();
        let (w, h) = (self.size.width, self.size.height);
        let resized = if buffer.dimensions() == (w, h) {
            buffer
        } else {
            imageops::resize(&buffer, w, h, FilterType::Nearest)
        };
        Frame::new(resized, delay_ms)
    }
}

impl Iterator for FrameIter {
    type Item = Result<Frame, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = match &mut self.state {
            IterState::Active(frames) => frames.next(),
            IterState::Exhausted => return None,
        };

        match next {
            Some(Ok(frame)) => {
                self.decoded += 1;
                Some(Ok(self.convert(frame)))
            }
            Some(Err(err)) => {
                self.state = IterState::Exhausted;
                Some(Err(err.into()))
            }
            None => {
                tracing::trace!("frame container exhausted after {} frames", self.decoded);
                self.state = IterState::Exhausted;
                None
            }
        }
    }
}

impl FusedIterator for FrameIter {}

/// Convert a container delay to whole milliseconds, falling back to
/// `default_ms` when it is zero.
fn delay_to_ms(delay: image::Delay, default_ms: u32) -> u32 {
    let ms = Duration::from(delay).as_millis();
    if ms == 0 {
        default_ms
    } else {
        u32::try_from(ms).unwrap_or(u32::MAX)
    }
}
