//! Frame timing and delta time.
//!
//! The [`Time`] resource is advanced by the external frame loop before the
//! schedule runs. Systems read it to get the frame delta and total elapsed
//! time. Nothing here reads the wall clock, so a headless run can feed fixed
//! steps and stay deterministic.

use std::time::Duration;

/// Frame timing resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct Time {
    /// Duration of the most recent frame.
    delta: Duration,
    /// Sum of every delta so far.
    elapsed: Duration,
    frame_count: u64,
}

impl Time {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new frame that lasted `delta`.
    pub fn advance(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
    }

    /// Convenience for [`advance`](Self::advance) with seconds. Negative or
    /// non-finite values are treated as zero.
    pub fn advance_secs(&mut self, secs: f32) {
        let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
        self.advance(Duration::from_secs_f32(secs));
    }

    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Delta time in seconds (f32), the most common way to use it.
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Number of frames advanced so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_accumulates() {
        let mut time = Time::new();
        assert_eq!(time.frame_count(), 0);
        time.advance(Duration::from_millis(16));
        time.advance(Duration::from_millis(20));
        assert_eq!(time.delta(), Duration::from_millis(20));
        assert_eq!(time.elapsed(), Duration::from_millis(36));
        assert_eq!(time.frame_count(), 2);
        assert!((time.delta_secs() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn advance_secs_clamps_garbage() {
        let mut time = Time::new();
        time.advance_secs(-1.0);
        assert_eq!(time.delta(), Duration::ZERO);
        time.advance_secs(f32::NAN);
        assert_eq!(time.delta(), Duration::ZERO);
        time.advance_secs(0.5);
        assert!((time.elapsed_secs() - 0.5).abs() < 1e-6);
        assert_eq!(time.frame_count(), 3);
    }
}
