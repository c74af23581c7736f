//! Helpers shared by unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use image::codecs::gif::GifEncoder;
use image::{Delay, Rgba, RgbaImage};

use crate::{Clock, DisplaySurface, Frame, FrameSequence};

pub(crate) struct TestFrame {
    pub image: RgbaImage,
    pub delay_ms: u32,
}

impl TestFrame {
    pub fn solid(width: u32, height: u32, rgba: [u8; 4], delay_ms: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba(rgba)),
            delay_ms,
        }
    }
}

/// Encode frames into an in-memory GIF.
pub(crate) fn encode_gif(frames: &[TestFrame]) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut bytes);
        let frames = frames.iter().map(|f| {
            image::Frame::from_parts(
                f.image.clone(),
                0,
                0,
                Delay::from_numer_denom_ms(f.delay_ms, 1),
            )
        });
        encoder.encode_frames(frames).unwrap();
    }
    bytes
}

/// A sequence whose frame `i` is a 1x1 image with red channel `i`.
pub(crate) fn numbered_sequence(delays: &[u32]) -> FrameSequence {
    let frames = delays
        .iter()
        .enumerate()
        .map(|(i, &delay)| {
            Frame::new(RgbaImage::from_pixel(1, 1, Rgba([i as u8, 0, 0, 255])), delay)
        })
        .collect();
    FrameSequence::new(frames).unwrap()
}

/// Surface that records the red channel of each shown frame.
#[derive(Clone, Default)]
pub(crate) struct RecordingSurface {
    pub shown: Rc<RefCell<Vec<u8>>>,
    pub reports: Rc<RefCell<Vec<String>>>,
}

impl RecordingSurface {
    pub fn shown(&self) -> Vec<u8> {
        self.shown.borrow().clone()
    }
}

impl DisplaySurface for RecordingSurface {
    fn show_frame(&mut self, frame: &Frame) {
        self.shown.borrow_mut().push(frame.image().get_pixel(0, 0)[0]);
    }

    fn show_report(&mut self, report: &str) {
        self.reports.borrow_mut().push(report.to_string());
    }
}

/// A structurally valid GIF with a logical screen but no frames.
pub(crate) fn empty_gif(width: u16, height: u16) -> Vec<u8> {
    let mut bytes = b"GIF89a".to_vec();
    bytes.extend_from_slice(&width.to_le_bytes());
    bytes.extend_from_slice(&height.to_le_bytes());
    bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x3B]);
    bytes
}

/// Clock a test moves by hand, shared with whatever reads it.
#[derive(Clone, Default)]
pub(crate) struct SharedClock(Rc<Cell<Duration>>);

impl SharedClock {
    pub fn set(&self, now: Duration) {
        self.0.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }
}

impl Clock for SharedClock {
    fn elapsed(&self) -> Duration {
        self.0.get()
    }
}
