use std::time::Instant;

/// Elapsed time of the current tick, in seconds.
pub trait TimeSource {
    fn elapsed(&self) -> f32;
}

/// Wall-clock frame timer. Call [`tick`](FrameTimer::tick) once per frame.
pub struct FrameTimer {
    last: Instant,
    pub dt: f32,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            dt: 0.0,
        }
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        self.dt = now.duration_since(self.last).as_secs_f32();
        self.last = now;
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for FrameTimer {
    fn elapsed(&self) -> f32 {
        self.dt
    }
}

/// Constant step, for headless runs and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedStep(pub f32);

impl FixedStep {
    pub const SIXTY_HZ: FixedStep = FixedStep(1.0 / 60.0);
}

impl TimeSource for FixedStep {
    fn elapsed(&self) -> f32 {
        self.0
    }
}
