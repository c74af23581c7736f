//! Animation controller for frame playback.

use std::time::Duration;

use crate::data::{Frame, FrameSequence, SourceImage};
use crate::decoder::FrameDecoder;
use crate::error::DecodeError;
use crate::scheduler::{Scheduler, TimerHandle, TimerQueue};
use crate::SizeSpec;

/// Where frames and the info report end up.
///
/// Each call replaces whatever was shown before.
pub trait DisplaySurface {
    /// Show one frame.
    fn show_frame(&mut self, frame: &Frame);

    /// Show the read-only info report. Surfaces without a text panel
    /// can ignore it.
    fn show_report(&mut self, _report: &str) {}
}

impl<D: DisplaySurface + ?Sized> DisplaySurface for &mut D {
    fn show_frame(&mut self, frame: &Frame) {
        (**self).show_frame(frame)
    }

    fn show_report(&mut self, report: &str) {
        (**self).show_report(report)
    }
}

/// Current state of the animation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnimationState {
    /// Nothing loaded yet
    #[default]
    Stopped,
    /// A tick is scheduled
    Playing,
    /// Loaded, but no tick is scheduled until resumed
    Paused,
}

/// Owns the active frame sequence and drives it through a [`Scheduler`].
///
/// Exactly one timer is outstanding while playing. Every operation that
/// replaces frames or stops playback cancels it first, and
/// [`AnimationController::on_timer`] ignores any handle that is not the
/// outstanding one, so a stale tick never reaches a new sequence.
///
/// ## Example
///
/// ```rust
/// use gif_view_core::{AnimationController, AnimationState, DisplaySurface, Frame, FrameSequence, TimerQueue};
/// use image::RgbaImage;
/// use std::time::Duration;
///
/// struct Count(usize);
/// impl DisplaySurface for Count {
///     fn show_frame(&mut self, _frame: &Frame) {
///         self.0 += 1;
///     }
/// }
///
/// let frames = (0..3).map(|_| Frame::new(RgbaImage::new(2, 2), 100)).collect();
/// let mut controller = AnimationController::new(TimerQueue::new(), Count(0));
/// controller.install(FrameSequence::new(frames).unwrap(), 0);
/// assert_eq!(controller.state(), AnimationState::Playing);
/// assert_eq!(controller.surface().0, 1);
///
/// // Drive the loop (call this from your event loop)
/// controller.fire_due(Duration::from_millis(100));
/// controller.fire_due(Duration::from_millis(200));
/// assert_eq!(controller.current_index(), 2);
///
/// controller.pause();
/// controller.fire_due(Duration::from_secs(60));
/// assert_eq!(controller.surface().0, 3);
/// ```
pub struct AnimationController<S = TimerQueue, D = ()> {
    /// Active sequence, `None` until the first load
    frames: Option<FrameSequence>,
    /// Index of the frame on display
    current_index: usize,
    /// Index the next tick renders
    next_index: usize,
    /// Playback state
    state: AnimationState,
    /// The single outstanding tick
    pending: Option<TimerHandle>,
    decoder: FrameDecoder,
    scheduler: S,
    surface: D,
}

impl DisplaySurface for () {
    fn show_frame(&mut self, _frame: &Frame) {}
}

impl<S: Scheduler, D: DisplaySurface> AnimationController<S, D> {
    /// Create an empty controller in the `Stopped` state.
    pub fn new(scheduler: S, surface: D) -> Self {
        Self {
            frames: None,
            current_index: 0,
            next_index: 0,
            state: AnimationState::Stopped,
            pending: None,
            decoder: FrameDecoder::default(),
            scheduler,
            surface,
        }
    }

    /// Use `decoder` for subsequent loads.
    pub fn with_decoder(mut self, decoder: FrameDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Decode `source` at `size` and start playing from `start_index`.
    ///
    /// Decoding finishes before any state is touched, so on error the
    /// previous sequence keeps playing undisturbed.
    pub fn load(
        &mut self,
        source: &SourceImage,
        size: SizeSpec,
        start_index: usize,
    ) -> Result<(), DecodeError> {
        let sequence = self.decoder.decode(source, size).map_err(|err| {
            tracing::warn!("decode at {} failed: {}", size, err);
            err
        })?;
        tracing::info!("loaded {} frames at {}", sequence.len(), size);
        self.install(sequence, start_index);
        Ok(())
    }

    /// Replace the active sequence with an already decoded one.
    ///
    /// Cancels the outstanding tick, starts at `start_index` modulo the
    /// sequence length, switches to `Playing` and renders immediately.
    pub fn install(&mut self, sequence: FrameSequence, start_index: usize) {
        self.cancel_pending();
        self.next_index = start_index % sequence.len();
        self.current_index = self.next_index;
        self.frames = Some(sequence);
        self.state = AnimationState::Playing;
        self.tick();
    }

    /// Render the next frame and, while playing, schedule the one after.
    ///
    /// The delay scheduled is that of the frame just rendered.
    fn tick(&mut self) {
        let Some(frames) = &self.frames else {
            return;
        };

        let index = self.next_index;
        let frame = &frames[index];
        self.surface.show_frame(frame);
        self.current_index = index;
        self.next_index = (index + 1) % frames.len();
        tracing::trace!("tick: showed frame {} of {}", index, frames.len());

        if self.state == AnimationState::Playing {
            let delay = Duration::from_millis(frame.delay_ms() as u64);
            self.pending = Some(self.scheduler.schedule(delay));
        }
    }

    /// Deliver a fired timer.
    ///
    /// Returns true if it was the outstanding tick and a frame was shown.
    pub fn on_timer(&mut self, handle: TimerHandle) -> bool {
        if self.pending != Some(handle) {
            tracing::debug!("ignoring stale timer {}", handle.id());
            return false;
        }
        self.pending = None;
        self.tick();
        true
    }

    /// Fire every timer due at or before `now`, in deadline order.
    ///
    /// The next tick is measured from `now`, so a late wakeup shows one
    /// frame for its full delay instead of replaying the missed ones.
    /// Returns the number of frames shown.
    pub fn fire_due(&mut self, now: Duration) -> usize {
        self.scheduler.advance_to(now);
        let mut shown = 0;
        while let Some(handle) = self.scheduler.pop_due(now) {
            if self.on_timer(handle) {
                shown += 1;
            }
        }
        shown
    }

    /// Pause playback. Only has an effect while playing.
    pub fn pause(&mut self) {
        if self.state == AnimationState::Playing {
            self.cancel_pending();
            self.state = AnimationState::Paused;
        }
    }

    /// Resume playback. Only has an effect while paused.
    ///
    /// The next frame is shown right away instead of waiting out the
    /// remainder of the previous delay.
    pub fn resume(&mut self) {
        if self.state == AnimationState::Paused {
            self.state = AnimationState::Playing;
            self.tick();
        }
    }

    /// Toggle play/pause.
    pub fn toggle(&mut self) {
        match self.state {
            AnimationState::Playing => self.pause(),
            AnimationState::Paused => self.resume(),
            AnimationState::Stopped => {}
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }

    /// Get the current playback state.
    #[inline]
    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// Check if the animation is currently playing.
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state == AnimationState::Playing
    }

    /// Index of the frame on display; 0 when nothing is loaded.
    #[inline]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Index the next tick will render.
    #[inline]
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Number of frames in the active sequence.
    pub fn frame_count(&self) -> usize {
        self.frames.as_ref().map_or(0, FrameSequence::len)
    }

    #[inline]
    pub fn frames(&self) -> Option<&FrameSequence> {
        self.frames.as_ref()
    }

    /// Size of the active sequence.
    pub fn size(&self) -> Option<SizeSpec> {
        self.frames.as_ref().map(FrameSequence::size)
    }

    /// The outstanding tick, if any.
    #[inline]
    pub fn pending_timer(&self) -> Option<TimerHandle> {
        self.pending
    }

    #[inline]
    pub fn decoder(&self) -> FrameDecoder {
        self.decoder
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut D {
        &mut self.surface
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}
