//! Simulation, visualization and wall-clock time of a running scene.

use std::time::Instant;

use crate::{settings::SimulationSettings, Error};

/// Visualization time counts as finished within this distance of the end time.
pub const END_EPSILON: f64 = 1e-6;

/// Where the scene's values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    /// Stepping an FMU
    Live,
    /// Playing back a pre-computed result file
    ResultFile,
}

/// Advances a simulation by one step.
pub trait TimeStepper {
    /// Step from `t` and return the reached time. Returning `t` means no progress is possible.
    fn simulate_step(&mut self, t: f64) -> Result<f64, Error>;
}

#[derive(Debug, Clone)]
pub struct TimeManager {
    start_time: f64,
    end_time: f64,
    h_visual: f64,
    sim_time: f64,
    vis_time: f64,
    /// Wall-clock seconds spent in the last scene update
    real_time: f64,
    real_time_factor: f64,
    paused: bool,
    mode: PlaybackMode,
}

impl TimeManager {
    pub fn new(
        start_time: f64,
        end_time: f64,
        h_visual: f64,
        mode: PlaybackMode,
    ) -> Result<Self, Error> {
        if !(h_visual.is_finite() && h_visual > 0.0) {
            return Err(Error::InvalidSettings(format!(
                "visualization step {h_visual} must be positive"
            )));
        }
        if end_time < start_time {
            return Err(Error::InvalidSettings(format!(
                "end time {end_time} is before start time {start_time}"
            )));
        }
        Ok(Self {
            start_time,
            end_time,
            h_visual,
            sim_time: start_time,
            vis_time: start_time,
            real_time: 0.0,
            real_time_factor: 0.0,
            paused: true,
            mode,
        })
    }

    pub fn from_settings(
        settings: &SimulationSettings,
        h_visual: f64,
        mode: PlaybackMode,
    ) -> Result<Self, Error> {
        Self::new(settings.start_time, settings.stop_time, h_visual, mode)
    }

    /// Start running. Returns `false` and stays paused when there is nothing left to simulate.
    pub fn start_visualization(&mut self) -> bool {
        if self.vis_time < self.end_time - END_EPSILON {
            self.paused = false;
            true
        } else {
            log::info!("There is nothing left to simulate");
            self.paused = true;
            false
        }
    }

    pub fn pause_visualization(&mut self) {
        self.paused = true;
    }

    /// Advance the scene by one visualization step. In live mode `stepper` is called until the
    /// simulation reaches the new visualization time.
    pub fn scene_update<S: TimeStepper + ?Sized>(&mut self, stepper: &mut S) -> Result<(), Error> {
        if self.paused {
            return Ok(());
        }
        let wall = Instant::now();
        let target = (self.vis_time + self.h_visual).min(self.end_time);

        self.sim_time = self.vis_time;
        if self.mode == PlaybackMode::Live {
            while self.sim_time < target {
                let t = stepper.simulate_step(self.sim_time)?;
                if t <= self.sim_time {
                    log::debug!("Simulation stopped advancing at t = {t}");
                    break;
                }
                self.sim_time = t;
                if self.sim_time >= self.end_time {
                    break;
                }
            }
        }

        self.vis_time = target;
        self.real_time = wall.elapsed().as_secs_f64();
        self.real_time_factor = if self.real_time > 0.0 {
            self.h_visual / self.real_time
        } else {
            f64::INFINITY
        };

        if self.vis_time >= self.end_time - END_EPSILON {
            log::debug!("Reached end time {}", self.end_time);
            self.paused = true;
        }
        Ok(())
    }

    /// Position of the visualization time scaled onto `[min, max]`; `None` for a zero-length
    /// interval.
    pub fn time_progress(&self, min: i32, max: i32) -> Option<i32> {
        let span = self.end_time - self.start_time;
        if span == 0.0 {
            return None;
        }
        let range = f64::from(max) - f64::from(min);
        let progress = (self.vis_time - self.start_time) / span * range;
        Some(progress.round() as i32)
    }

    /// Seek during result-file playback. Out-of-range times clamp to the nearest bound.
    pub fn set_vis_time(&mut self, t: f64) -> Result<(), Error> {
        if self.mode == PlaybackMode::Live {
            return Err(Error::SeekInLiveMode);
        }
        let clamped = t.clamp(self.start_time, self.end_time);
        if clamped != t {
            log::warn!(
                "Visualization time {t} outside [{}, {}], using {clamped}",
                self.start_time,
                self.end_time
            );
        }
        self.vis_time = clamped;
        self.sim_time = clamped;
        Ok(())
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn vis_time(&self) -> f64 {
        self.vis_time
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn real_time(&self) -> f64 {
        self.real_time
    }

    pub fn real_time_factor(&self) -> f64 {
        self.real_time_factor
    }

    pub fn h_visual(&self) -> f64 {
        self.h_visual
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fixed step that never overshoots `end`.
    struct Clock {
        h: f64,
        end: f64,
        calls: usize,
    }

    impl TimeStepper for Clock {
        fn simulate_step(&mut self, t: f64) -> Result<f64, Error> {
            self.calls += 1;
            Ok((t + self.h).min(self.end))
        }
    }

    #[test]
    fn test_invalid_visual_step() {
        assert!(TimeManager::new(0.0, 1.0, 0.0, PlaybackMode::Live).is_err());
        assert!(TimeManager::new(0.0, 1.0, -0.1, PlaybackMode::Live).is_err());
        assert!(TimeManager::new(1.0, 0.0, 0.1, PlaybackMode::Live).is_err());
    }

    #[test]
    fn test_scene_update_steps_to_visual_time() {
        let mut tm = TimeManager::new(0.0, 1.0, 0.1, PlaybackMode::Live).unwrap();
        let mut clock = Clock {
            h: 0.025,
            end: 1.0,
            calls: 0,
        };

        // Paused: nothing happens
        tm.scene_update(&mut clock).unwrap();
        assert_eq!(clock.calls, 0);

        assert!(tm.start_visualization());
        tm.scene_update(&mut clock).unwrap();
        assert!(clock.calls >= 4);
        assert!(tm.sim_time() >= 0.1 - 1e-12);
        assert_eq!(tm.vis_time(), 0.1);
        assert!(!tm.is_paused());
    }

    #[test]
    fn test_stalled_stepper() {
        struct Stalled;
        impl TimeStepper for Stalled {
            fn simulate_step(&mut self, t: f64) -> Result<f64, Error> {
                Ok(t)
            }
        }

        let mut tm = TimeManager::new(0.0, 1.0, 0.5, PlaybackMode::Live).unwrap();
        tm.start_visualization();
        tm.scene_update(&mut Stalled).unwrap();
        assert_eq!(tm.sim_time(), 0.0);
        assert_eq!(tm.vis_time(), 0.5);
    }

    #[test]
    fn test_result_file_mode_does_not_step() {
        let mut tm = TimeManager::new(0.0, 1.0, 0.25, PlaybackMode::ResultFile).unwrap();
        let mut clock = Clock {
            h: 0.1,
            end: 1.0,
            calls: 0,
        };
        tm.start_visualization();
        tm.scene_update(&mut clock).unwrap();
        assert_eq!(clock.calls, 0);
        assert_eq!(tm.vis_time(), 0.25);
    }
}
