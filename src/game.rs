//! A fixed-timestep game loop that runs the simulation at a steady tick rate
//! no matter how often frames are drawn.

use std::time::Duration;

use instant::Instant;

use crate::error::{ensure, Result};

// time snapping technique from Tyler Glaiel's blog post
// https://medium.com/@tglaiel/how-to-make-your-game-run-at-60fps-24c61210fe75
const NANOS_120FPS: u128 = 1_000_000_000 / 120;
const NANOS_60FPS: u128 = 1_000_000_000 / 60;
const NANOS_30FPS: u128 = 1_000_000_000 / 30;
const NANOS_20FPS: u128 = 1_000_000_000 / 20;
const NANOS_15FPS: u128 = 1_000_000_000 / 15;
const SNAP_TARGETS: [u128; 5] = [
    NANOS_120FPS,
    NANOS_60FPS,
    NANOS_30FPS,
    NANOS_20FPS,
    NANOS_15FPS,
];

fn should_snap(dt: u128, target: u128, threshold: u128) -> bool {
    if dt < target {
        target - dt < threshold
    } else {
        dt - target < threshold
    }
}

/// Timing parameters of the game loop.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct LoopParams {
    pub ticks_per_second: u32,
    /// Most time in seconds that will be caught up on in one frame.
    /// Anything beyond this is dropped to prevent a spiral of death.
    pub max_lag: f64,
    /// Frame durations this close (in seconds) to a common refresh interval
    /// are treated as exactly that interval.
    pub snap_threshold: f64,
}

impl Default for LoopParams {
    fn default() -> Self {
        Self {
            ticks_per_second: 120,
            max_lag: 0.125,
            snap_threshold: 0.0002,
        }
    }
}

impl LoopParams {
    pub fn validate(&self) -> Result<()> {
        ensure(self.ticks_per_second > 0, || {
            "ticks_per_second must be positive".to_string()
        })?;
        let tick = 1.0 / self.ticks_per_second as f64;
        ensure(self.max_lag.is_finite() && self.max_lag >= tick, || {
            format!(
                "max_lag must be at least one tick ({tick} s), got {}",
                self.max_lag
            )
        })?;
        ensure(
            self.snap_threshold.is_finite() && self.snap_threshold >= 0.0,
            || {
                format!(
                    "snap_threshold must be non-negative, got {}",
                    self.snap_threshold
                )
            },
        )
    }
}

/// Accumulates elapsed time and turns it into a whole number of fixed ticks.
#[derive(Clone, Debug)]
pub struct FixedTimestep {
    nanos_per_tick: u128,
    dt: f64,
    acc: u128,
    max_acc: u128,
    snap_threshold: u128,
}

impl FixedTimestep {
    pub fn new(params: &LoopParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            nanos_per_tick: 1_000_000_000 / u128::from(params.ticks_per_second),
            dt: 1.0 / params.ticks_per_second as f64,
            acc: 0,
            max_acc: (params.max_lag * 1e9) as u128,
            snap_threshold: (params.snap_threshold * 1e9) as u128,
        })
    }

    /// Length of one tick in seconds.
    #[inline]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Add the time a frame took and get the number of ticks to run.
    pub fn advance(&mut self, elapsed: Duration) -> usize {
        let mut dt_nanos = elapsed.as_nanos();
        // if vsynced, pretend frame timing is exact (see blog post mentioned above)
        if let Some(&target) = SNAP_TARGETS
            .iter()
            .find(|&&target| should_snap(dt_nanos, target, self.snap_threshold))
        {
            dt_nanos = target;
            self.acc = 0;
        }

        self.acc += dt_nanos;
        if self.acc > self.max_acc {
            log::warn!(
                "Running behind, dropping {:.3} s of simulation time",
                (self.acc - self.max_acc) as f64 / 1e9
            );
            self.acc = self.max_acc;
        }

        let ticks = self.acc / self.nanos_per_tick;
        self.acc -= ticks * self.nanos_per_tick;
        ticks as usize
    }

    /// How far into the next tick the accumulated time is, between 0 and 1.
    /// Used to extrapolate positions when drawing.
    #[inline]
    pub fn interpolation_fraction(&self) -> f64 {
        self.acc as f64 / self.nanos_per_tick as f64
    }

    /// Time left until the next tick is due.
    pub fn time_to_next_tick(&self) -> Duration {
        Duration::from_nanos((self.nanos_per_tick - self.acc) as u64)
    }
}

/// The state of a game.
pub trait GameState {
    /// Advance the game forward by a timestep. Return None to exit the game.
    ///
    /// `first_in_frame` is true for the first of the ticks run during one frame,
    /// which is when fresh input should be read.
    fn tick(&mut self, dt: f64, first_in_frame: bool) -> Option<()>;
    /// Draw the game, extrapolating motion by `interpolation` ticks.
    fn draw(&mut self, interpolation: f64);
}

/// Handles timing of the game loop.
#[derive(Clone, Debug)]
pub struct Game {
    pub timestep: FixedTimestep,
    frame_start_t: Option<Instant>,
}

impl Game {
    pub fn new(params: &LoopParams) -> Result<Self> {
        Ok(Self {
            timestep: FixedTimestep::new(params)?,
            frame_start_t: None,
        })
    }

    /// Run as many ticks as the time since the previous frame allows, then draw once.
    /// Returns None if the state asked to exit.
    pub fn frame(&mut self, state: &mut impl GameState) -> Option<()> {
        let now = Instant::now();
        let elapsed = match self.frame_start_t.replace(now) {
            Some(prev) => now.duration_since(prev),
            None => Duration::ZERO,
        };
        self.frame_with_elapsed(state, elapsed)
    }

    /// Like [`frame`][Self::frame], but with the elapsed time given explicitly.
    pub fn frame_with_elapsed(
        &mut self,
        state: &mut impl GameState,
        elapsed: Duration,
    ) -> Option<()> {
        let ticks = self.timestep.advance(elapsed);
        let dt = self.timestep.dt();
        for i in 0..ticks {
            #[cfg(feature = "tracy")]
            let _frame = tracy_client::Client::running()
                .map(|client| client.non_continuous_frame(tracy_client::frame_name!("tick")));

            state.tick(dt, i == 0)?;
        }

        {
            let _draw_span = crate::tracy_span!("draw", "frame");
            state.draw(self.timestep.interpolation_fraction());
        }

        #[cfg(feature = "tracy")]
        if let Some(client) = tracy_client::Client::running() {
            client.frame_mark();
        }

        Some(())
    }

    /// Run frames until the state asks to exit,
    /// sleeping whenever there's time to kill before the next tick.
    ///
    /// Not available on the web, where the browser drives frames;
    /// call [`frame`][Self::frame] from its animation callback instead.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn run(&mut self, state: &mut impl GameState) {
        loop {
            if self.frame(state).is_none() {
                return;
            }
            let spent = self
                .frame_start_t
                .map(|t| t.elapsed())
                .unwrap_or_default();
            let target = self.timestep.time_to_next_tick();
            if spent < target {
                std::thread::sleep(target - spent);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        ticks: Vec<bool>,
        draws: Vec<f64>,
        stop_after: Option<usize>,
    }

    impl GameState for Counter {
        fn tick(&mut self, _dt: f64, first_in_frame: bool) -> Option<()> {
            if self.stop_after == Some(self.ticks.len()) {
                return None;
            }
            self.ticks.push(first_in_frame);
            Some(())
        }

        fn draw(&mut self, interpolation: f64) {
            self.draws.push(interpolation);
        }
    }

    fn timestep() -> FixedTimestep {
        FixedTimestep::new(&LoopParams::default()).unwrap()
    }

    #[test]
    fn snapped_frames_run_whole_ticks() {
        let mut ts = timestep();
        assert_eq!(ts.advance(Duration::from_nanos(8_300_000)), 1);
        assert_eq!(ts.interpolation_fraction(), 0.0);
        assert_eq!(ts.advance(Duration::from_nanos(16_700_000)), 2);
        assert_eq!(ts.advance(Duration::from_nanos(33_333_333)), 4);
    }

    #[test]
    fn partial_ticks_accumulate() {
        let mut ts = timestep();
        assert_eq!(ts.advance(Duration::from_millis(4)), 0);
        assert!((ts.interpolation_fraction() - 0.48).abs() < 1e-3);
        assert_eq!(ts.advance(Duration::from_millis(4)), 0);
        assert_eq!(ts.advance(Duration::from_millis(4)), 1);
        assert!(ts.interpolation_fraction() > 0.0 && ts.interpolation_fraction() < 1.0);
    }

    #[test]
    fn lag_is_bounded() {
        let mut ts = timestep();
        assert_eq!(ts.advance(Duration::from_secs(1)), 15);
        assert_eq!(ts.advance(Duration::from_secs(10)), 15);
    }

    #[test]
    fn invalid_params() {
        for params in [
            LoopParams {
                ticks_per_second: 0,
                ..Default::default()
            },
            LoopParams {
                max_lag: 0.001,
                ..Default::default()
            },
            LoopParams {
                snap_threshold: f64::NAN,
                ..Default::default()
            },
        ] {
            assert!(FixedTimestep::new(&params).is_err());
        }
    }

    #[test]
    fn input_is_fresh_on_first_tick_only() {
        let mut game = Game::new(&LoopParams::default()).unwrap();
        let mut state = Counter::default();
        assert!(game
            .frame_with_elapsed(&mut state, Duration::from_nanos(NANOS_30FPS as u64))
            .is_some());
        assert_eq!(state.ticks, vec![true, false, false, false]);
        assert_eq!(state.draws.len(), 1);

        // no ticks but still a draw
        game.frame_with_elapsed(&mut state, Duration::from_millis(2));
        assert_eq!(state.ticks.len(), 4);
        assert_eq!(state.draws.len(), 2);
    }

    #[test]
    fn state_can_exit() {
        let mut game = Game::new(&LoopParams::default()).unwrap();
        let mut state = Counter {
            stop_after: Some(2),
            ..Default::default()
        };
        assert!(game
            .frame_with_elapsed(&mut state, Duration::from_nanos(NANOS_30FPS as u64))
            .is_none());
        assert_eq!(state.ticks.len(), 2);
        assert!(state.draws.is_empty());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn run_returns_when_state_exits() {
        let mut game = Game::new(&LoopParams::default()).unwrap();
        let mut state = Counter {
            stop_after: Some(3),
            ..Default::default()
        };
        game.run(&mut state);
        assert_eq!(state.ticks.len(), 3);
        assert!(state.ticks[0]);
    }
}
