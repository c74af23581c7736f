//! # gif-view-core
//!
//! Core animation and resize pipeline for animated GIF viewers.
//!
//! This crate provides toolkit-agnostic data structures and logic for:
//! - Decoding a GIF into frames resampled to a display size
//! - Choosing initial display sizes and grow/shrink steps
//! - Driving time-accurate looping playback (play, pause, resume)
//! - Resizing live without leaving stale timers behind
//! - Extracting header and per-frame information for an info panel
//!
//! ## Features
//!
//! - `serde` - Enable serialization/deserialization for settings and sizes
//! - `toml` - Load [`ViewerSettings`] from a TOML file
//!
//! ## Example
//!
//! ```rust,ignore
//! use gif_view_core::{SizePolicy, SourceImage, TimerQueue, Viewer};
//!
//! // Open a file chosen by the user
//! let mut viewer = Viewer::new(TimerQueue::new(), my_surface);
//! viewer.open(Some(path.as_ref()))?;
//!
//! // From your event loop
//! viewer.fire_due(elapsed);
//!
//! // Size buttons
//! viewer.grow();
//! viewer.set_size_fields("320", "240");
//! viewer.apply_size_fields();
//! ```

mod animation;
mod data;
mod decoder;
pub mod error;
mod parser;
pub mod report;
pub mod resize;
pub mod runtime;
mod scheduler;
mod settings;
mod sizing;
mod viewer;

#[cfg(test)]
mod testutil;

pub use animation::{AnimationController, AnimationState, DisplaySurface};
pub use data::{Frame, FrameSequence, SourceImage};
pub use decoder::{FrameDecoder, FrameIter};
pub use error::{DecodeError, Error, InvalidSizeInput, MetadataError};
pub use parser::{FrameAttributes, GifMetadata, GifParser, HeaderSection, MetadataExtractor};
pub use runtime::Command;
pub use scheduler::{Clock, ManualClock, Scheduler, SystemClock, TimerHandle, TimerQueue};
pub use settings::ViewerSettings;
pub use sizing::{SizePolicy, SizeSpec};
pub use viewer::{Document, Viewer};
