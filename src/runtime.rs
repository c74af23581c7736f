//! Wall-clock event loop.
//!
//! All playback happens on the thread running [`run`]. Other threads talk
//! to it only through [`Command`] messages, so the viewer never needs to
//! be shared.

use std::path::PathBuf;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::animation::DisplaySurface;
use crate::parser::MetadataExtractor;
use crate::scheduler::Scheduler;
use crate::viewer::Viewer;

/// User input delivered to the event loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// A file dialog result; `None` when cancelled
    Open(Option<PathBuf>),
    /// New contents of the size fields, applied immediately
    Resize { width: String, height: String },
    Grow,
    Shrink,
    Pause,
    Resume,
    Toggle,
    Quit,
}

/// Apply one command to the viewer.
///
/// Returns false for [`Command::Quit`].
pub fn apply<S, D, M>(viewer: &mut Viewer<S, D, M>, command: Command) -> bool
where
    S: Scheduler,
    D: DisplaySurface,
    M: MetadataExtractor,
{
    tracing::debug!("command: {:?}", command);
    match command {
        Command::Open(path) => {
            // Failures are already in the report
            let _ = viewer.open(path.as_deref());
        }
        Command::Resize { width, height } => {
            viewer.set_size_fields(width, height);
            viewer.apply_size_fields();
        }
        Command::Grow => {
            viewer.grow();
        }
        Command::Shrink => {
            viewer.shrink();
        }
        Command::Pause => viewer.pause(),
        Command::Resume => viewer.resume(),
        Command::Toggle => viewer.toggle(),
        Command::Quit => return false,
    }
    true
}

/// Drive `viewer` in real time until `Quit` arrives or every sender is
/// dropped.
///
/// The loop sleeps on the command channel until the next timer deadline,
/// so an idle or paused viewer uses no CPU. Give the viewer a
/// [`TimerQueue::realtime`](crate::TimerQueue::realtime) scheduler so a
/// tick scheduled after a blocking decode is measured from when the
/// decode finished.
pub fn run<S, D, M>(viewer: &mut Viewer<S, D, M>, commands: &Receiver<Command>)
where
    S: Scheduler,
    D: DisplaySurface,
    M: MetadataExtractor,
{
    let origin = Instant::now();

    loop {
        let now = wall_time(origin, viewer);
        viewer.fire_due(now);

        let received = match viewer.controller().scheduler().next_deadline() {
            Some(deadline) => {
                let now = wall_time(origin, viewer);
                commands.recv_timeout(deadline.saturating_sub(now))
            }
            None => commands.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(command) => {
                // Catch up first so the command sees the current frame
                let now = wall_time(origin, viewer);
                viewer.fire_due(now);
                if !apply(viewer, command) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    tracing::debug!("event loop finished");
}

fn wall_time<S, D, M>(origin: Instant, viewer: &Viewer<S, D, M>) -> Duration
where
    S: Scheduler,
    D: DisplaySurface,
    M: MetadataExtractor,
{
    origin.elapsed().max(viewer.controller().scheduler().now())
}

/// Run a viewer on its own thread.
///
/// The viewer is built on that thread by `make_viewer`, so neither it nor
/// its surface has to be `Send`; only the closure does.
pub fn spawn<S, D, M, F>(make_viewer: F) -> (Sender<Command>, JoinHandle<()>)
where
    S: Scheduler,
    D: DisplaySurface,
    M: MetadataExtractor,
    F: FnOnce() -> Viewer<S, D, M> + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::unbounded();
    let handle = std::thread::spawn(move || {
        let mut viewer = make_viewer();
        run(&mut viewer, &rx);
    });
    (tx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{encode_gif, SharedClock, TestFrame};
    use crate::{Frame, SizeSpec, TimerQueue};

    struct ChannelSurface(Sender<u8>);

    impl DisplaySurface for ChannelSurface {
        fn show_frame(&mut self, frame: &Frame) {
            let _ = self.0.send(frame.image().get_pixel(0, 0)[0]);
        }
    }

    fn gif_file(dir: &tempfile::TempDir, delay_ms: u32) -> PathBuf {
        let bytes = encode_gif(&[
            TestFrame::solid(8, 8, [0, 0, 0, 255], delay_ms),
            TestFrame::solid(8, 8, [1, 0, 0, 255], delay_ms),
        ]);
        let path = dir.path().join("anim.gif");
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_apply_quit() {
        let mut viewer = Viewer::new(TimerQueue::new(), ());
        assert!(apply(&mut viewer, Command::Pause));
        assert!(apply(&mut viewer, Command::Open(None)));
        assert!(!apply(&mut viewer, Command::Quit));
    }

    #[test]
    fn test_apply_resize() {
        let dir = tempfile::tempdir().unwrap();
        let path = gif_file(&dir, 100);
        let mut viewer = Viewer::new(TimerQueue::new(), ());
        apply(&mut viewer, Command::Open(Some(path)));
        apply(
            &mut viewer,
            Command::Resize {
                width: "40".into(),
                height: "30".into(),
            },
        );
        assert_eq!(viewer.size_fields(), ("40", "30"));
        assert_eq!(viewer.controller().size(), Some(SizeSpec::new(40, 30)));

        apply(&mut viewer, Command::Grow);
        assert_eq!(viewer.size_fields(), ("44", "33"));
    }

    /// Surface that takes `cost` of clock time to show each frame.
    struct SlowSurface {
        clock: SharedClock,
        cost: Duration,
    }

    impl DisplaySurface for SlowSurface {
        fn show_frame(&mut self, _frame: &Frame) {
            self.clock.advance(self.cost);
        }
    }

    #[test]
    fn test_first_tick_after_blocking_apply() {
        let dir = tempfile::tempdir().unwrap();
        let path = gif_file(&dir, 100);
        let clock = SharedClock::default();
        let surface = SlowSurface {
            clock: clock.clone(),
            cost: Duration::from_millis(250),
        };
        let mut viewer = Viewer::new(TimerQueue::with_clock(clock.clone()), surface);

        viewer.fire_due(Duration::ZERO);
        apply(&mut viewer, Command::Open(Some(path)));
        let scheduler = viewer.controller().scheduler();
        assert_eq!(scheduler.now(), Duration::from_millis(250));
        assert_eq!(scheduler.next_deadline(), Some(Duration::from_millis(350)));

        // A resize that blocks for a while still gives frame 0 its full delay
        clock.advance(Duration::from_millis(1_000));
        apply(&mut viewer, Command::Grow);
        let scheduler = viewer.controller().scheduler();
        assert_eq!(scheduler.next_deadline(), Some(Duration::from_millis(1_600)));
        assert_eq!(viewer.fire_due(Duration::from_millis(1_599)), 0);
        assert_eq!(viewer.fire_due(Duration::from_millis(1_600)), 1);
    }

    #[test]
    fn test_realtime_playback() {
        let dir = tempfile::tempdir().unwrap();
        let path = gif_file(&dir, 20);
        let (frame_tx, frame_rx) = crossbeam_channel::unbounded();
        let (tx, handle) = spawn(move || Viewer::new(TimerQueue::realtime(), ChannelSurface(frame_tx)));

        tx.send(Command::Open(Some(path))).unwrap();
        let timeout = Duration::from_secs(5);
        assert_eq!(frame_rx.recv_timeout(timeout).unwrap(), 0);
        assert_eq!(frame_rx.recv_timeout(timeout).unwrap(), 1);
        assert_eq!(frame_rx.recv_timeout(timeout).unwrap(), 0);

        tx.send(Command::Pause).unwrap();
        std::thread::sleep(Duration::from_millis(100));
        while frame_rx.try_recv().is_ok() {}
        std::thread::sleep(Duration::from_millis(200));
        assert!(frame_rx.try_recv().is_err());

        tx.send(Command::Quit).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_loop_ends_when_senders_drop() {
        let (tx, handle) = spawn(|| Viewer::new(TimerQueue::new(), ()));
        drop(tx);
        handle.join().unwrap();
    }
}
