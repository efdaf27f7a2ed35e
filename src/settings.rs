//! Per-run simulation settings.

use std::{fmt::Display, str::FromStr};

use crate::{schema::traits::DefaultExperiment, Error};

/// Integration scheme used by the driver.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Solver {
    /// Explicit forward Euler with a fixed step size
    #[default]
    ForwardEuler,
}

impl FromStr for Solver {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euler" | "forward-euler" => Ok(Solver::ForwardEuler),
            _ => Err(Error::InvalidSettings(format!("Unknown solver {s}"))),
        }
    }
}

impl Display for Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Solver::ForwardEuler => f.write_str("euler"),
        }
    }
}

/// How the driver reacts to a `Discard`, `Error` or `Fatal` status while stepping.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Log and count the failure, then keep stepping
    #[default]
    Tolerant,
    /// Return the first failure from `simulate_step`
    Strict,
}

/// User-supplied overrides. Unset values fall back to the model's `<DefaultExperiment>`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SimOptions {
    pub start_time: Option<f64>,
    pub stop_time: Option<f64>,
    pub step_size: Option<f64>,
    pub tolerance: Option<f64>,
    pub solver: Solver,
    pub status_policy: StatusPolicy,
    /// Pass intermediate results to every FMI 1.0 event update
    pub intermediate_results: bool,
    /// Instantiate the FMU with its own debug logging switched on
    pub fmu_logging: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    pub start_time: f64,
    pub stop_time: f64,
    /// Fixed integration step `hdef`
    pub step_size: f64,
    pub relative_tolerance: f64,
    pub tolerance_controlled: bool,
    pub intermediate_results: bool,
    /// Set by the FMU on every completed integrator step; forces an event update on the next
    pub call_event_update: bool,
    pub solver: Solver,
    pub status_policy: StatusPolicy,
    pub fmu_logging: bool,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            start_time: Self::DEFAULT_START_TIME,
            stop_time: Self::DEFAULT_STOP_TIME,
            step_size: (Self::DEFAULT_STOP_TIME - Self::DEFAULT_START_TIME)
                / Self::DEFAULT_NUM_STEPS,
            relative_tolerance: Self::DEFAULT_TOLERANCE,
            tolerance_controlled: false,
            intermediate_results: false,
            call_event_update: false,
            solver: Solver::default(),
            status_policy: StatusPolicy::default(),
            fmu_logging: false,
        }
    }
}

impl SimulationSettings {
    pub const DEFAULT_START_TIME: f64 = 0.0;
    pub const DEFAULT_STOP_TIME: f64 = 1.0;
    pub const DEFAULT_TOLERANCE: f64 = 1e-4;
    /// The default step size divides the interval into this many steps
    pub const DEFAULT_NUM_STEPS: f64 = 500.0;

    /// Resolve each value from `options`, then the model's default experiment, then the
    /// built-in defaults.
    pub fn new_from_options(
        options: &SimOptions,
        md: &impl DefaultExperiment,
    ) -> Result<Self, Error> {
        let start_time = options
            .start_time
            .or(md.start_time())
            .unwrap_or(Self::DEFAULT_START_TIME);

        let stop_time = options
            .stop_time
            .or(md.stop_time())
            .unwrap_or(Self::DEFAULT_STOP_TIME);

        if stop_time < start_time {
            return Err(Error::InvalidSettings(format!(
                "`stop_time` ({stop_time}) is before `start_time` ({start_time})"
            )));
        }

        let step_size = options
            .step_size
            .or(md.step_size())
            .unwrap_or_else(|| (stop_time - start_time) / Self::DEFAULT_NUM_STEPS);

        if step_size <= 0.0 || !step_size.is_finite() {
            return Err(Error::InvalidSettings(format!(
                "`step_size` must be positive, got {step_size}"
            )));
        }

        let tolerance = options.tolerance.or(md.tolerance());

        let settings = Self {
            start_time,
            stop_time,
            step_size,
            relative_tolerance: tolerance.unwrap_or(Self::DEFAULT_TOLERANCE),
            tolerance_controlled: tolerance.is_some(),
            intermediate_results: options.intermediate_results,
            call_event_update: false,
            solver: options.solver,
            status_policy: options.status_policy,
            fmu_logging: options.fmu_logging,
        };
        log::debug!("{settings:?}");
        Ok(settings)
    }
}
