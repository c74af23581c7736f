//! A viewer session: the loaded document plus everything the user can
//! poke at (size fields, play/pause, grow/shrink).

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::animation::{AnimationController, DisplaySurface};
use crate::data::SourceImage;
use crate::error::{DecodeError, Error};
use crate::parser::{GifParser, MetadataExtractor};
use crate::report::build_report;
use crate::resize;
use crate::scheduler::{Scheduler, TimerQueue};
use crate::settings::ViewerSettings;
use crate::{SizePolicy, SizeSpec};

/// The file currently on screen.
#[derive(Clone, Debug)]
pub struct Document {
    pub path: PathBuf,
    pub source: SourceImage,
}

/// One open document and its playback.
///
/// Failures never escape as panics and never stop playback of the
/// current document: bad size text is dropped, decode failures leave the
/// previous document playing and replace the report with the error, and
/// metadata failures only affect the report.
pub struct Viewer<S = TimerQueue, D = (), M = GifParser> {
    controller: AnimationController<S, D>,
    settings: ViewerSettings,
    policy: SizePolicy,
    extractor: M,
    document: Option<Document>,
    width_field: String,
    height_field: String,
    report: String,
}

impl<S: Scheduler, D: DisplaySurface> Viewer<S, D, GifParser> {
    /// Create a viewer with default settings.
    pub fn new(scheduler: S, surface: D) -> Self {
        Self::with_settings(scheduler, surface, ViewerSettings::default())
    }

    pub fn with_settings(scheduler: S, surface: D, settings: ViewerSettings) -> Self {
        let controller =
            AnimationController::new(scheduler, surface).with_decoder(settings.frame_decoder());
        Self {
            controller,
            policy: settings.size_policy(),
            settings,
            extractor: GifParser,
            document: None,
            width_field: String::new(),
            height_field: String::new(),
            report: String::new(),
        }
    }
}

impl<S: Scheduler, D: DisplaySurface, M: MetadataExtractor> Viewer<S, D, M> {
    /// Replace the metadata extractor.
    pub fn with_extractor<M2: MetadataExtractor>(self, extractor: M2) -> Viewer<S, D, M2> {
        Viewer {
            controller: self.controller,
            settings: self.settings,
            policy: self.policy,
            extractor,
            document: self.document,
            width_field: self.width_field,
            height_field: self.height_field,
            report: self.report,
        }
    }

    /// Open the file chosen by the user; `None` (a cancelled dialog) does
    /// nothing and returns `Ok(false)`.
    ///
    /// The image starts at its initial size, which is also written to the
    /// size fields. On failure the previous document keeps playing and
    /// the report shows the error.
    pub fn open(&mut self, path: Option<&Path>) -> Result<bool, DecodeError> {
        let Some(path) = path else {
            return Ok(false);
        };

        let result = SourceImage::open(path).and_then(|source| {
            let size = self.policy.initial_size(source.width(), source.height());
            self.controller.load(&source, size, 0)?;
            Ok((source, size))
        });

        let (source, size) = match result {
            Ok(loaded) => loaded,
            Err(err) => {
                tracing::warn!("could not open {}: {}", path.display(), err);
                self.set_report(format!("Error loading GIF: {}", err));
                return Err(err);
            }
        };

        tracing::info!(
            "opened {} ({}x{}) at {}",
            path.display(),
            source.width(),
            source.height(),
            size
        );
        self.write_fields(size);
        self.document = Some(Document {
            path: path.to_path_buf(),
            source,
        });
        self.refresh_report();
        Ok(true)
    }

    /// Set the contents of the width and height fields.
    pub fn set_size_fields(&mut self, width: impl Into<String>, height: impl Into<String>) {
        self.width_field = width.into();
        self.height_field = height.into();
    }

    /// Resize to whatever the fields hold. Returns true if frames were
    /// re-derived.
    pub fn apply_size_fields(&mut self) -> bool {
        let Some(doc) = &self.document else {
            return false;
        };
        let result = resize::request_resize_text(
            &mut self.controller,
            &doc.source,
            &self.width_field,
            &self.height_field,
        );
        self.absorb(result).is_some()
    }

    /// Grow the size in the fields by the configured factor.
    pub fn grow(&mut self) -> bool {
        self.scale(self.settings.grow_factor)
    }

    /// Shrink the size in the fields by the configured factor.
    pub fn shrink(&mut self) -> bool {
        self.scale(self.settings.shrink_factor)
    }

    /// Write the scaled field size back to the fields, then resize to it.
    fn scale(&mut self, factor: f64) -> bool {
        if self.document.is_none() {
            return false;
        }
        let current = match SizeSpec::parse(&self.width_field, &self.height_field) {
            Ok(size) => size,
            Err(err) => {
                tracing::debug!("dropping scale request: {}", err);
                return false;
            }
        };
        self.write_fields(SizePolicy::scale(current, factor));
        self.apply_size_fields()
    }

    /// Swallow resize failures: bad input silently, decode errors into
    /// the report.
    fn absorb<T>(&mut self, result: Result<T, Error>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(Error::InvalidSize(err)) => {
                tracing::debug!("dropping resize request: {}", err);
                None
            }
            Err(err) => {
                tracing::warn!("resize failed: {}", err);
                self.set_report(format!("Error loading GIF: {}", err));
                None
            }
        }
    }

    pub fn pause(&mut self) {
        self.controller.pause();
    }

    pub fn resume(&mut self) {
        self.controller.resume();
    }

    pub fn toggle(&mut self) {
        self.controller.toggle();
    }

    /// Fire due animation timers. See [`AnimationController::fire_due`].
    pub fn fire_due(&mut self, now: Duration) -> usize {
        self.controller.fire_due(now)
    }

    fn write_fields(&mut self, size: SizeSpec) {
        self.width_field = size.width.to_string();
        self.height_field = size.height.to_string();
    }

    fn refresh_report(&mut self) {
        let Some(doc) = &self.document else {
            return;
        };
        let report = build_report(&self.extractor, &doc.path);
        self.set_report(report);
    }

    fn set_report(&mut self, report: String) {
        self.controller.surface_mut().show_report(&report);
        self.report = report;
    }

    /// The report text currently shown.
    pub fn report(&self) -> &str {
        &self.report
    }

    /// Contents of the width and height fields.
    pub fn size_fields(&self) -> (&str, &str) {
        (&self.width_field, &self.height_field)
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn controller(&self) -> &AnimationController<S, D> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut AnimationController<S, D> {
        &mut self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetadataError;
    use crate::parser::GifMetadata;
    use crate::testutil::{empty_gif, encode_gif, RecordingSurface, TestFrame};
    use crate::AnimationState;
    use std::io::Write;

    fn write_gif(dir: &tempfile::TempDir, name: &str, side: u32, count: u8) -> PathBuf {
        let frames: Vec<_> = (0..count)
            .map(|i| TestFrame::solid(side, side, [i, 0, 0, 255], 100))
            .collect();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&encode_gif(&frames)).unwrap();
        path
    }

    fn viewer() -> (Viewer<TimerQueue, RecordingSurface>, RecordingSurface) {
        let surface = RecordingSurface::default();
        (Viewer::new(TimerQueue::new(), surface.clone()), surface)
    }

    #[test]
    fn test_cancelled_dialog_is_noop() {
        let (mut viewer, surface) = viewer();
        assert!(!viewer.open(None).unwrap());
        assert!(viewer.document().is_none());
        assert!(surface.shown().is_empty());
        assert_eq!(viewer.controller().state(), AnimationState::Stopped);
    }

    #[test]
    fn test_open_sets_initial_size_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gif(&dir, "small.gif", 10, 3);
        let (mut viewer, surface) = viewer();

        assert!(viewer.open(Some(path.as_path())).unwrap());
        assert_eq!(viewer.size_fields(), ("200", "200"));
        assert_eq!(viewer.controller().size(), Some(SizeSpec::new(200, 200)));
        assert_eq!(viewer.controller().frame_count(), 3);
        assert_eq!(surface.shown(), vec![0]);

        assert!(viewer.report().starts_with("=== Parsed GIF Information ==="));
        assert!(viewer.report().contains("Frame 3:"));
        assert_eq!(surface.reports.borrow().last().map(String::as_str), Some(viewer.report()));
    }

    #[test]
    fn test_failed_open_keeps_document() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_gif(&dir, "good.gif", 10, 2);
        let bad = dir.path().join("empty.gif");
        std::fs::write(&bad, empty_gif(4, 4)).unwrap();

        let (mut viewer, _surface) = viewer();
        viewer.open(Some(good.as_path())).unwrap();

        assert!(matches!(viewer.open(Some(bad.as_path())), Err(DecodeError::NoFrames)));
        assert_eq!(viewer.document().unwrap().path, good);
        assert_eq!(viewer.controller().frame_count(), 2);
        assert!(viewer.controller().is_playing());
        assert!(viewer.report().starts_with("Error loading GIF:"));

        let missing = dir.path().join("missing.gif");
        assert!(matches!(viewer.open(Some(missing.as_path())), Err(DecodeError::Io(_))));
        assert_eq!(viewer.document().unwrap().path, good);
    }

    #[test]
    fn test_grow_and_shrink_update_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gif(&dir, "anim.gif", 300, 2);
        let (mut viewer, _surface) = viewer();
        viewer.open(Some(path.as_path())).unwrap();
        assert_eq!(viewer.size_fields(), ("300", "300"));

        assert!(viewer.grow());
        assert_eq!(viewer.size_fields(), ("330", "330"));
        assert_eq!(viewer.controller().size(), Some(SizeSpec::new(330, 330)));

        assert!(viewer.shrink());
        assert_eq!(viewer.size_fields(), ("297", "297"));
    }

    #[test]
    fn test_grow_writes_fields_before_resizing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gif(&dir, "anim.gif", 300, 2);
        let surface = RecordingSurface::default();
        let settings = ViewerSettings {
            max_area: 320 * 320,
            ..Default::default()
        };
        let mut viewer = Viewer::with_settings(TimerQueue::new(), surface, settings);
        viewer.open(Some(path.as_path())).unwrap();

        // 330x330 is over the limit: the fields move, the frames do not
        assert!(!viewer.grow());
        assert_eq!(viewer.size_fields(), ("330", "330"));
        assert_eq!(viewer.controller().size(), Some(SizeSpec::new(300, 300)));
        assert!(viewer.controller().is_playing());

        assert!(viewer.shrink());
        assert_eq!(viewer.size_fields(), ("297", "297"));
        assert_eq!(viewer.controller().size(), Some(SizeSpec::new(297, 297)));
    }

    #[test]
    fn test_bad_fields_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gif(&dir, "anim.gif", 10, 3);
        let (mut viewer, surface) = viewer();
        viewer.open(Some(path.as_path())).unwrap();
        viewer.fire_due(Duration::from_millis(100));
        let report = viewer.report().to_string();

        viewer.set_size_fields("abc", "200");
        assert!(!viewer.apply_size_fields());
        assert!(!viewer.grow());
        assert!(!viewer.shrink());

        assert_eq!(viewer.size_fields(), ("abc", "200"));
        assert_eq!(viewer.controller().size(), Some(SizeSpec::new(200, 200)));
        assert_eq!(viewer.controller().current_index(), 1);
        assert_eq!(viewer.report(), report);
        assert_eq!(surface.shown(), vec![0, 1]);
    }

    #[test]
    fn test_apply_fields_resets_to_first_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gif(&dir, "anim.gif", 10, 3);
        let (mut viewer, surface) = viewer();
        viewer.open(Some(path.as_path())).unwrap();
        viewer.fire_due(Duration::from_millis(100));
        viewer.fire_due(Duration::from_millis(200));
        assert_eq!(viewer.controller().current_index(), 2);

        viewer.set_size_fields("300", "300");
        assert!(viewer.apply_size_fields());
        assert_eq!(viewer.controller().current_index(), 0);
        assert_eq!(surface.shown(), vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_resize_without_document() {
        let (mut viewer, _surface) = viewer();
        viewer.set_size_fields("300", "300");
        assert!(!viewer.apply_size_fields());
        assert!(!viewer.grow());
    }

    #[test]
    fn test_metadata_failure_does_not_stop_playback() {
        struct Broken;
        impl MetadataExtractor for Broken {
            fn extract(&self, _path: &Path) -> Result<GifMetadata, MetadataError> {
                Err(MetadataError::UnexpectedEof { offset: 13 })
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let path = write_gif(&dir, "anim.gif", 10, 2);
        let (viewer, _surface) = viewer();
        let mut viewer = viewer.with_extractor(Broken);

        assert!(viewer.open(Some(path.as_path())).unwrap());
        assert_eq!(viewer.report(), "Error parsing GIF info: unexpected end of data at offset 13");
        assert!(viewer.controller().is_playing());
    }

    #[test]
    fn test_pause_resume() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gif(&dir, "anim.gif", 10, 2);
        let (mut viewer, surface) = viewer();
        viewer.open(Some(path.as_path())).unwrap();

        viewer.pause();
        assert_eq!(viewer.fire_due(Duration::from_secs(10)), 0);
        viewer.resume();
        assert_eq!(surface.shown(), vec![0, 1]);
        viewer.toggle();
        assert_eq!(viewer.controller().state(), AnimationState::Paused);
    }
}
