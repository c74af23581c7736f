//! Resize pipeline: validate a new size and re-derive every frame.
//!
//! Frames are always decoded again from the retained [`SourceImage`],
//! never from the sequence currently on screen, so repeated grow and
//! shrink steps do not compound resampling error. A resize restarts
//! playback at frame 0.

use crate::animation::{AnimationController, DisplaySurface};
use crate::data::SourceImage;
use crate::error::{InvalidSizeInput, Result};
use crate::scheduler::Scheduler;
use crate::{SizePolicy, SizeSpec};

/// Re-decode `source` at `size` and restart playback from frame 0.
///
/// A size with a zero dimension, or one covering more pixels than the
/// controller's decoder allows, is rejected before anything changes.
pub fn request_resize<S, D>(
    controller: &mut AnimationController<S, D>,
    source: &SourceImage,
    size: SizeSpec,
) -> Result<()>
where
    S: Scheduler,
    D: DisplaySurface,
{
    if size.width == 0 || size.height == 0 {
        return Err(InvalidSizeInput::NonPositive(0).into());
    }
    let decoder = controller.decoder();
    if !decoder.accepts(size) {
        return Err(InvalidSizeInput::AreaTooLarge {
            width: size.width,
            height: size.height,
            max_area: decoder.max_area(),
        }
        .into());
    }
    tracing::debug!("resizing to {}", size);
    controller.load(source, size, 0)?;
    Ok(())
}

/// Resize to the size typed into the width and height fields.
///
/// Returns the size applied. Text that is not a positive integer leaves
/// the controller untouched.
pub fn request_resize_text<S, D>(
    controller: &mut AnimationController<S, D>,
    source: &SourceImage,
    width: &str,
    height: &str,
) -> Result<SizeSpec>
where
    S: Scheduler,
    D: DisplaySurface,
{
    let size = SizeSpec::parse(width, height)?;
    request_resize(controller, source, size)?;
    Ok(size)
}

/// Scale the size in the fields by `factor` and resize to the result.
///
/// Returns the new size so the caller can write it back to the fields.
pub fn scale_by<S, D>(
    controller: &mut AnimationController<S, D>,
    source: &SourceImage,
    width: &str,
    height: &str,
    factor: f64,
) -> Result<SizeSpec>
where
    S: Scheduler,
    D: DisplaySurface,
{
    let current = SizeSpec::parse(width, height)?;
    let size = SizePolicy::scale(current, factor);
    request_resize(controller, source, size)?;
    Ok(size)
}
