//! Step-by-step playback of a recorded history
//!
//! [`Replay`] walks log entries in order and yields one [`ReplayFrame`] per
//! entry that recorded an image. Before every step it checks a
//! [`CancelToken`] owned by whoever displays the playback, so dismissing
//! the viewport stops the replay at the next step.
//!
//! # Example
//! ```ignore
//! let token = CancelToken::new();
//! let mut player = ReplayPlayer::new(Replay::new(entries, token.clone()), step);
//! // on every tick of the event loop
//! player.tick(Instant::now());
//! // when the viewport is dismissed
//! token.cancel();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::history::LogEntry;
use crate::image::Image;

/// Default time between two frames
pub const DEFAULT_STEP: Duration = Duration::from_millis(100);

/// Step from a millisecond setting, zero means the default
pub fn step_from_millis(ms: u64) -> Duration {
    if ms == 0 {
        DEFAULT_STEP
    } else {
        Duration::from_millis(ms)
    }
}

/// Shared cancellation flag
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayFrame {
    pub sequence_id: u64,
    pub message: String,
    pub image: Image,
}

/// Iterator over the replayable entries of a history
pub struct Replay {
    entries: std::vec::IntoIter<LogEntry>,
    token: CancelToken,
}

impl Replay {
    pub fn new(entries: Vec<LogEntry>, token: CancelToken) -> Self {
        Self {
            entries: entries.into_iter(),
            token,
        }
    }
}

impl Iterator for Replay {
    type Item = ReplayFrame;

    fn next(&mut self) -> Option<ReplayFrame> {
        loop {
            if self.token.is_cancelled() {
                return None;
            }
            let entry = self.entries.next()?;
            if let Some(image) = entry.image() {
                return Some(ReplayFrame {
                    sequence_id: entry.sequence_id,
                    message: entry.message,
                    image,
                });
            }
        }
    }
}

/// Paces a replay at a fixed step
pub struct ReplayPlayer {
    replay: Replay,
    step: Duration,
    next_step: Option<Instant>,
    current: Option<ReplayFrame>,
    shown: usize,
    finished: bool,
}

impl ReplayPlayer {
    pub fn new(replay: Replay, step: Duration) -> Self {
        Self {
            replay,
            step,
            next_step: None,
            current: None,
            shown: 0,
            finished: false,
        }
    }

    /// Advance if a step is due. Returns true when the displayed frame changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.finished {
            return false;
        }
        if let Some(due) = self.next_step {
            if now < due {
                return false;
            }
        }
        match self.replay.next() {
            Some(frame) => {
                self.current = Some(frame);
                self.shown += 1;
                self.next_step = Some(now + self.step);
                true
            }
            None => {
                self.finished = true;
                false
            }
        }
    }

    pub fn current(&self) -> Option<&ReplayFrame> {
        self.current.as_ref()
    }

    pub fn shown(&self) -> usize {
        self.shown
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: u64, message: &str, color: Option<u8>) -> LogEntry {
        LogEntry {
            sequence_id: id,
            milliseconds_since_last_entry: 0,
            message: message.to_string(),
            context: color.map(|c| json!({"image": Image::color(2, 2, c).unwrap().to_json()})),
        }
    }

    fn entries() -> Vec<LogEntry> {
        vec![
            entry(0, "load task", Some(0)),
            entry(1, "pick tool", None),
            entry(2, "set pixel", Some(1)),
            entry(3, "flood fill", Some(2)),
        ]
    }

    #[test]
    fn yields_only_entries_with_images() {
        let frames: Vec<ReplayFrame> = Replay::new(entries(), CancelToken::new()).collect();
        let ids: Vec<u64> = frames.iter().map(|f| f.sequence_id).collect();
        assert_eq!(ids, vec![0, 2, 3]);
        assert_eq!(frames[1].message, "set pixel");
        assert_eq!(frames[2].image, Image::color(2, 2, 2).unwrap());
    }

    #[test]
    fn cancel_stops_at_next_step() {
        let token = CancelToken::new();
        let mut replay = Replay::new(entries(), token.clone());
        assert_eq!(replay.next().map(|f| f.sequence_id), Some(0));
        token.cancel();
        assert!(replay.next().is_none());
    }

    #[test]
    fn player_waits_for_step() {
        let step = Duration::from_millis(100);
        let mut player = ReplayPlayer::new(Replay::new(entries(), CancelToken::new()), step);
        let t0 = Instant::now();

        assert!(player.tick(t0));
        assert_eq!(player.current().map(|f| f.sequence_id), Some(0));
        assert!(!player.tick(t0 + Duration::from_millis(50)));
        assert!(player.tick(t0 + step));
        assert_eq!(player.current().map(|f| f.sequence_id), Some(2));
        assert!(player.tick(t0 + step * 2));
        assert!(!player.tick(t0 + step * 3));
        assert!(player.is_finished());
        assert_eq!(player.shown(), 3);
    }

    #[test]
    fn player_stops_when_cancelled() {
        let token = CancelToken::new();
        let mut player = ReplayPlayer::new(Replay::new(entries(), token.clone()), DEFAULT_STEP);
        let t0 = Instant::now();
        assert!(player.tick(t0));
        token.cancel();
        assert!(!player.tick(t0 + DEFAULT_STEP));
        assert!(player.is_finished());
        assert_eq!(player.current().map(|f| f.sequence_id), Some(0));
    }

    #[test]
    fn zero_step_uses_default() {
        assert_eq!(step_from_millis(0), DEFAULT_STEP);
        assert_eq!(step_from_millis(250), Duration::from_millis(250));
    }
}
