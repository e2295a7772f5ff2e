use std::collections::VecDeque;
use std::time::Duration;

use tilespace_render::FrameStats;

/// Rolling frame-time statistics over the last `capacity` frames.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    samples: VecDeque<Duration>,
    capacity: usize,
    total_frames: u64,
}

/// Snapshot of the current window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTimings {
    pub frames: usize,
    pub last: Duration,
    pub min: Duration,
    pub max: Duration,
    pub average: Duration,
}

impl FrameTimings {
    /// Frames per second implied by the average, or 0 with no samples.
    pub fn fps(&self) -> f64 {
        let secs = self.average.as_secs_f64();
        if secs > 0.0 { 1.0 / secs } else { 0.0 }
    }
}

impl FrameTimer {
    pub const DEFAULT_CAPACITY: usize = 120;

    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            total_frames: 0,
        }
    }

    pub fn record(&mut self, duration: Duration) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(duration);
        self.total_frames += 1;
    }

    /// Record a rendered frame and trace its statistics.
    pub fn record_frame(&mut self, stats: &FrameStats) {
        self.record(stats.duration);
        tracing::trace!(
            frame = self.total_frames,
            duration = ?stats.duration,
            tiles = stats.tiles_drawn,
            triangles = stats.triangles_submitted,
            culled = stats.triangles_culled,
            pixels = stats.pixels_written,
            "frame recorded"
        );
    }

    pub fn timings(&self) -> FrameTimings {
        let Some(&last) = self.samples.back() else {
            return FrameTimings::default();
        };
        let mut min = Duration::MAX;
        let mut max = Duration::ZERO;
        let mut sum = Duration::ZERO;
        for &sample in &self.samples {
            min = min.min(sample);
            max = max.max(sample);
            sum += sample;
        }
        FrameTimings {
            frames: self.samples.len(),
            last,
            min,
            max,
            average: sum / self.samples.len() as u32,
        }
    }

    /// Frames recorded since creation, including those out of the window.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.total_frames = 0;
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
