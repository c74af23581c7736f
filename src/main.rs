//! Headless GIF viewer driven from stdin.
//!
//! Usage: `gif-view [FILE.gif]`, then type commands:
//! `open PATH`, `size W H`, `+`, `-`, `pause`, `play`, `toggle`, `quit`.

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::Result;
use crossbeam_channel::Sender;
use gif_view_core::{runtime, Command, DisplaySurface, Frame, TimerQueue, Viewer, ViewerSettings};

/// Logs frames instead of drawing them and prints the info report.
struct LogSurface {
    shown: u64,
}

impl DisplaySurface for LogSurface {
    fn show_frame(&mut self, frame: &Frame) {
        self.shown += 1;
        tracing::debug!(
            "frame #{}: {} for {}ms",
            self.shown,
            frame.size(),
            frame.delay_ms()
        );
    }

    fn show_report(&mut self, report: &str) {
        println!("{report}");
    }
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let cmd = match parts.next()? {
        "open" => {
            let rest = line.trim_start().strip_prefix("open")?.trim();
            Command::Open((!rest.is_empty()).then(|| PathBuf::from(rest)))
        }
        "size" => Command::Resize {
            width: parts.next().unwrap_or_default().to_string(),
            height: parts.next().unwrap_or_default().to_string(),
        },
        "+" | "grow" => Command::Grow,
        "-" | "shrink" => Command::Shrink,
        "pause" => Command::Pause,
        "play" | "resume" => Command::Resume,
        "toggle" => Command::Toggle,
        "quit" | "exit" => Command::Quit,
        _ => return None,
    };
    Some(cmd)
}

fn read_stdin(tx: Sender<Command>) {
    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Some(cmd) => {
                let quit = cmd == Command::Quit;
                if tx.send(cmd).is_err() || quit {
                    return;
                }
            }
            None => tracing::warn!("unknown command: {}", line.trim()),
        }
    }
    let _ = tx.send(Command::Quit);
}

#[cfg(feature = "toml")]
fn load_settings() -> Result<ViewerSettings> {
    match std::env::var_os("GIF_VIEW_SETTINGS") {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Ok(ViewerSettings::from_toml_str(&text)?)
        }
        None => Ok(ViewerSettings::default()),
    }
}

#[cfg(not(feature = "toml"))]
fn load_settings() -> Result<ViewerSettings> {
    Ok(ViewerSettings::default())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    let mut viewer = Viewer::with_settings(TimerQueue::realtime(), LogSurface { shown: 0 }, settings);

    let (tx, rx) = crossbeam_channel::unbounded();
    if let Some(path) = std::env::args_os().nth(1) {
        tx.send(Command::Open(Some(PathBuf::from(path))))?;
    }

    let reader = tx.clone();
    std::thread::spawn(move || read_stdin(reader));
    drop(tx);

    runtime::run(&mut viewer, &rx);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(
            parse_command("open /tmp/my anim.gif"),
            Some(Command::Open(Some(PathBuf::from("/tmp/my anim.gif"))))
        );
        assert_eq!(parse_command("open"), Some(Command::Open(None)));
        assert_eq!(
            parse_command("size 320 x"),
            Some(Command::Resize {
                width: "320".into(),
                height: "x".into()
            })
        );
        assert_eq!(parse_command("+"), Some(Command::Grow));
        assert_eq!(parse_command("  pause "), Some(Command::Pause));
        assert_eq!(parse_command("rewind"), None);
    }
}
