//! Frame timing: the running/stopped state machine, the animation speed
//! factor, and FPS sampling.
//!
//! The loop does not schedule itself — the host's redraw cycle calls
//! [`RenderLoop::tick`] once per vsync and the loop decides whether to run
//! the frame. Elapsed time between ticks is normalized so a speed factor of
//! 1.0 corresponds to one 60 Hz frame; animations multiply by it to stay
//! rate-independent.

/// Reference frame rate the speed factor is normalized against.
const REFERENCE_HZ: f64 = 60.0;
/// Seconds between FPS samples.
const FPS_SAMPLE_INTERVAL: f64 = 0.25;

/// Running/stopped frame driver with normalized animation speed.
pub struct RenderLoop {
    running: bool,
    last_tick: Option<f64>,

    fps: f32,
    fps_window_start: f64,
    fps_window_frames: u32,
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderLoop {
    pub fn new() -> Self {
        Self {
            running: false,
            last_tick: None,
            fps: 0.0,
            fps_window_start: 0.0,
            fps_window_frames: 0,
        }
    }

    /// Enter the running state. A no-op when already running.
    pub fn start(&mut self) {
        self.start_with(|| {});
    }

    /// Enter the running state, invoking `before_render` exactly once,
    /// synchronously, before the first frame. A no-op (hook included) when
    /// already running.
    pub fn start_with(&mut self, before_render: impl FnOnce()) {
        if self.running {
            return;
        }
        log::info!("Starting render loop...");

        before_render();
        self.running = true;
        self.last_tick = None;
        self.fps_window_frames = 0;
    }

    /// Leave the running state. Subsequent ticks do nothing; a tick already
    /// in progress is never interrupted.
    pub fn stop(&mut self) {
        if self.running {
            log::info!("Stopping render loop.");
        }
        self.running = false;
    }

    pub fn running(&self) -> bool {
        self.running
    }

    /// Smoothed frame rate from the most recent sample window.
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Run one frame at time `now` (seconds, any monotonic origin).
    ///
    /// While running, computes the speed factor from the elapsed time since
    /// the previous tick and invokes `render` with it. The first tick after
    /// a start gets a factor of zero. Does nothing while stopped.
    pub fn tick(&mut self, now: f64, render: impl FnOnce(f32)) {
        if !self.running {
            return;
        }

        let speed_factor = match self.last_tick {
            Some(last) => {
                // The tick that opened the window is the fence, not a frame:
                // only complete intervals inside the window count.
                self.fps_window_frames += 1;
                ((now - last) * REFERENCE_HZ) as f32
            }
            None => {
                self.fps_window_start = now;
                self.fps_window_frames = 0;
                0.0
            }
        };
        self.last_tick = Some(now);

        let window = now - self.fps_window_start;
        if window >= FPS_SAMPLE_INTERVAL {
            self.fps = (self.fps_window_frames as f64 / window) as f32;
            log::trace!("{:.1} fps", self.fps);
            self.fps_window_start = now;
            self.fps_window_frames = 0;
        }

        render(speed_factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_do_nothing_while_stopped() {
        let mut render_loop = RenderLoop::new();
        let mut frames = 0;

        render_loop.tick(0.0, |_| frames += 1);
        assert_eq!(frames, 0);
    }

    #[test]
    fn start_is_idempotent() {
        let mut render_loop = RenderLoop::new();
        let mut hook_runs = 0;

        render_loop.start_with(|| hook_runs += 1);
        render_loop.start_with(|| hook_runs += 1);
        assert_eq!(hook_runs, 1);

        // One tick chain, not two: a tick still renders exactly once.
        let mut frames = 0;
        render_loop.tick(0.0, |_| frames += 1);
        assert_eq!(frames, 1);
    }

    #[test]
    fn hook_runs_again_after_a_restart() {
        let mut render_loop = RenderLoop::new();
        let mut hook_runs = 0;

        render_loop.start_with(|| hook_runs += 1);
        render_loop.stop();
        render_loop.start_with(|| hook_runs += 1);
        assert_eq!(hook_runs, 2);
    }

    #[test]
    fn stop_prevents_further_frames() {
        let mut render_loop = RenderLoop::new();
        let mut frames = 0;

        render_loop.start();
        render_loop.tick(0.0, |_| frames += 1);
        render_loop.stop();
        render_loop.tick(1.0, |_| frames += 1);
        assert_eq!(frames, 1);
    }

    #[test]
    fn speed_factor_normalizes_to_sixty_hz() {
        let mut render_loop = RenderLoop::new();
        render_loop.start();

        let mut factors = Vec::new();
        render_loop.tick(0.0, |f| factors.push(f));
        render_loop.tick(1.0 / 60.0, |f| factors.push(f));
        render_loop.tick(1.0 / 60.0 + 1.0 / 30.0, |f| factors.push(f));

        assert_eq!(factors[0], 0.0);
        assert!((factors[1] - 1.0).abs() < 1e-4);
        assert!((factors[2] - 2.0).abs() < 1e-4);
    }

    #[test]
    fn fps_samples_on_a_coarser_cadence() {
        let mut render_loop = RenderLoop::new();
        render_loop.start();

        // 60 Hz for half a second.
        for i in 0..30 {
            render_loop.tick(i as f64 / 60.0, |_| {});
        }
        assert!((render_loop.fps() - 60.0).abs() < 2.0);
    }

    #[test]
    fn fps_counts_intervals_not_ticks() {
        let mut render_loop = RenderLoop::new();
        render_loop.start();

        // Ticks at 0, 1/60, ..., 15/60 span exactly one sample window: the
        // opening tick is the fence, the remaining 15 are whole intervals.
        for i in 0..=15 {
            render_loop.tick(i as f64 / 60.0, |_| {});
        }
        assert_eq!(render_loop.fps(), 60.0);
    }
}
