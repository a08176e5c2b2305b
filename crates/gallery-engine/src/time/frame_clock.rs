use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds.
    pub dt: f32,

    /// Time elapsed since the clock was created, in seconds.
    pub elapsed: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// The first tick measures from clock creation, so the first simulation step is
/// close to zero. Delta time is clamped so a stall (debugger, minimized window)
/// does not produce one huge integration step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a new clock with default clamps (100 µs .. 250 ms).
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Resets the delta baseline without touching the frame counter.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Advances the clock to the current instant.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to `now`.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);

        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start).as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_ticks_measure_elapsed_seconds() {
        let mut clock = FrameClock::new();
        let t0 = clock.start;

        let first = clock.tick_at(t0 + Duration::from_millis(16));
        let second = clock.tick_at(t0 + Duration::from_millis(48));

        assert!((first.dt - 0.016).abs() < 1e-6);
        assert!((second.dt - 0.032).abs() < 1e-6);
        assert!((second.elapsed - 0.048).abs() < 1e-6);
        assert_eq!(first.frame_index, 0);
        assert_eq!(second.frame_index, 1);
    }

    #[test]
    fn first_tick_at_creation_is_near_zero() {
        let mut clock = FrameClock::new();
        let t0 = clock.start;
        let ft = clock.tick_at(t0);
        assert!(ft.dt <= 0.0001 + f32::EPSILON);
    }

    #[test]
    fn stalls_are_clamped() {
        let mut clock = FrameClock::new();
        let t0 = clock.start;
        let ft = clock.tick_at(t0 + Duration::from_secs(5));
        assert!((ft.dt - 0.25).abs() < 1e-6);
    }
}
