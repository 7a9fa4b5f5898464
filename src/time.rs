//! Frame timing for the render loop.
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//!
//! // Once per drawn frame:
//! if clock.tick() {
//!     window.set_title(&format!("particleflow - {:.0} fps", clock.fps()));
//! }
//! ```

use std::time::{Duration, Instant};

/// How often the FPS figure is recomputed.
const FPS_INTERVAL: Duration = Duration::from_millis(500);

/// Counts drawn frames and measures the frame rate.
///
/// The clock stops with the render loop: frames are not counted while it is
/// paused, and the time spent paused is excluded from [`elapsed`](Self::elapsed).
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    paused_at: Option<Instant>,
    pause_elapsed: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            start: now,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            paused_at: None,
            pause_elapsed: Duration::ZERO,
        }
    }

    /// Record a drawn frame. Returns `true` when the FPS figure was updated.
    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> bool {
        if self.paused_at.is_some() {
            return false;
        }
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed < FPS_INTERVAL {
            return false;
        }
        let frames_since = self.frame_count - self.fps_frame_count;
        self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
        self.fps_frame_count = self.frame_count;
        self.fps_update_time = now;
        true
    }

    /// Frames drawn since the clock started.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second over the last measurement window.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Running time, not counting pauses.
    pub fn elapsed(&self) -> Duration {
        let end = self.paused_at.unwrap_or_else(Instant::now);
        end.duration_since(self.start).saturating_sub(self.pause_elapsed)
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(Instant::now());
        }
    }

    /// Resume counting. The FPS window restarts so the pause does not drag
    /// the next figure down.
    pub fn resume(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            let now = Instant::now();
            self.pause_elapsed += now.duration_since(paused_at);
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
