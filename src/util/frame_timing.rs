//! Smoothed frame-rate tracking for the viewer loop.

use std::time::{Duration, Instant};

/// Smoothed frame-rate tracker with a periodic report interval.
///
/// The viewer calls [`end_frame`](Self::end_frame) once per redraw and logs
/// the smoothed rate whenever [`take_report`](Self::take_report) yields.
pub struct FrameTiming {
    last_frame: Instant,
    last_report: Instant,
    report_interval: Duration,
    /// Exponential moving average of the instantaneous rate.
    smoothed_fps: f32,
    /// Weight of the newest sample (0.0-1.0).
    smoothing: f32,
    frames: u64,
}

impl FrameTiming {
    /// Create a tracker that reports every `report_interval`.
    #[must_use]
    pub fn new(report_interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            last_report: now,
            report_interval,
            smoothed_fps: 60.0,
            smoothing: 0.05,
            frames: 0,
        }
    }

    /// Record the end of a frame.
    pub fn end_frame(&mut self) {
        let now = Instant::now();
        let frame_time = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frames += 1;

        if frame_time > 0.0 {
            let instant_fps = 1.0 / frame_time;
            self.smoothed_fps = self.smoothed_fps * (1.0 - self.smoothing)
                + instant_fps * self.smoothing;
        }
    }

    /// Smoothed frames per second.
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }

    /// Total frames recorded.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Returns the smoothed rate once per report interval.
    pub fn take_report(&mut self) -> Option<f32> {
        if self.last_report.elapsed() < self.report_interval {
            return None;
        }
        self.last_report = Instant::now();
        Some(self.smoothed_fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_frames() {
        let mut timing = FrameTiming::new(Duration::from_secs(3600));
        timing.end_frame();
        timing.end_frame();
        assert_eq!(timing.frames(), 2);
        assert!(timing.fps() > 0.0);
    }

    #[test]
    fn report_waits_for_interval() {
        let mut timing = FrameTiming::new(Duration::from_secs(3600));
        assert!(timing.take_report().is_none());

        let mut eager = FrameTiming::new(Duration::ZERO);
        assert!(eager.take_report().is_some());
    }
}
