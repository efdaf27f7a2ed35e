//! Fixed-step Model-Exchange integration with time- and state-event handling.

use crate::{
    handle::FmuHandle,
    input::{InputConfig, InputData},
    settings::{SimulationSettings, StatusPolicy},
    time::TimeStepper,
    Error, EventInfo, FmiError, FmiRes, Status,
};

/// Lifecycle of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Unloaded,
    Loaded,
    Initialized,
    Stepping,
    EventHandling,
    Terminated,
}

/// Continuous state, derivatives and event indicators of the loaded model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateBuffers {
    pub states: Box<[f64]>,
    pub derivatives: Box<[f64]>,
    pub event_indicators: Box<[f64]>,
    /// Indicators of the previous completed step
    pub event_indicators_prev: Box<[f64]>,
}

impl StateBuffers {
    pub fn new(n_states: usize, n_event_indicators: usize) -> Self {
        Self {
            states: vec![0.0; n_states].into_boxed_slice(),
            derivatives: vec![0.0; n_states].into_boxed_slice(),
            event_indicators: vec![0.0; n_event_indicators].into_boxed_slice(),
            event_indicators_prev: vec![0.0; n_event_indicators].into_boxed_slice(),
        }
    }

    /// A zero-crossing happened if any indicator changed sign since the previous step.
    pub fn state_event_detected(&self) -> bool {
        self.event_indicators
            .iter()
            .zip(self.event_indicators_prev.iter())
            .any(|(z, pz)| z * pz < 0.0)
    }

    fn commit_event_indicators(&mut self) {
        self.event_indicators_prev
            .copy_from_slice(&self.event_indicators);
    }
}

#[derive(Default, Debug, Clone, PartialEq)]
pub struct SimStats {
    /// Time reached by the last step
    pub end_time: f64,
    /// Number of steps taken
    pub num_steps: usize,
    /// Events triggered by a time event
    pub num_time_events: usize,
    /// Events triggered by a zero-crossing
    pub num_state_events: usize,
    /// Events requested by the completed-step notification
    pub num_step_events: usize,
    /// FMI errors tolerated while stepping
    pub num_soft_errors: usize,
    pub last_error: Option<FmiError>,
}

/// A read-only view of the model state after a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FmuData<'a> {
    pub states: &'a [f64],
    pub derivatives: &'a [f64],
    pub n_states: usize,
    pub n_event_indicators: usize,
    pub status: Status,
}

/// Apply the status policy to the result of a native call made while stepping.
fn check(
    policy: StatusPolicy,
    stats: &mut SimStats,
    call: &'static str,
    res: Result<FmiRes, FmiError>,
) -> Result<(), Error> {
    match res {
        Ok(FmiRes::OK) => Ok(()),
        Ok(FmiRes::Warning) => {
            log::warn!("{call} returned a warning");
            Ok(())
        }
        Err(err) => match policy {
            StatusPolicy::Tolerant => {
                log::error!("{call} failed: {err}");
                stats.num_soft_errors += 1;
                stats.last_error = Some(err);
                Ok(())
            }
            StatusPolicy::Strict => Err(Error::Fmi { call, source: err }),
        },
    }
}

/// Owns the loaded FMU and advances it with the forward Euler method.
#[derive(Debug)]
pub struct IntegrationDriver<F: FmuHandle = Box<dyn FmuHandle>> {
    fmu: Option<F>,
    settings: SimulationSettings,
    input_config: InputConfig,
    inputs: InputData,
    buffers: StateBuffers,
    event_info: EventInfo,
    state: DriverState,
    stats: SimStats,
}

impl<F: FmuHandle> Default for IntegrationDriver<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FmuHandle> IntegrationDriver<F> {
    pub fn new() -> Self {
        let input_config = InputConfig::default();
        Self {
            fmu: None,
            settings: SimulationSettings::default(),
            inputs: InputData::new(&input_config),
            input_config,
            buffers: StateBuffers::default(),
            event_info: EventInfo::default(),
            state: DriverState::Unloaded,
            stats: SimStats::default(),
        }
    }

    /// Take ownership of `fmu`, releasing any previously loaded model.
    pub fn load(&mut self, fmu: F, settings: SimulationSettings) {
        self.unload();
        log::debug!(
            "Loaded {} (FMI {}) with {} states and {} event indicators",
            fmu.instance_name(),
            fmu.fmi_version(),
            fmu.num_states(),
            fmu.num_event_indicators()
        );
        self.fmu = Some(fmu);
        self.stats.end_time = settings.start_time;
        self.settings = settings;
        self.state = DriverState::Loaded;
    }

    /// Destroy the loaded model, if any.
    pub fn unload(&mut self) {
        if let Some(mut fmu) = self.fmu.take() {
            fmu.destroy();
        }
        self.buffers = StateBuffers::default();
        self.inputs = InputData::new(&self.input_config);
        self.event_info = EventInfo::default();
        self.stats = SimStats::default();
        self.state = DriverState::Unloaded;
    }

    /// Replace the input configuration. Takes effect at the next [`Self::initialize`].
    pub fn set_input_config(&mut self, config: InputConfig) {
        self.input_config = config;
    }

    /// Instantiate and initialize the loaded model, then allocate the state buffers and input
    /// bridge from its declared counts.
    pub fn initialize(&mut self) -> Result<(), Error> {
        if self.state != DriverState::Loaded {
            return Err(Error::InvalidState {
                operation: "initialize",
                state: self.state,
            });
        }
        let fmu = self.fmu.as_mut().ok_or(Error::InvalidState {
            operation: "initialize",
            state: self.state,
        })?;

        self.event_info = fmu.initialize(&self.settings)?;

        let mut buffers = StateBuffers::new(fmu.num_states(), fmu.num_event_indicators());
        if !buffers.states.is_empty() {
            fmu.get_continuous_states(&mut buffers.states)
                .map_err(Error::fmi("get continuous states"))?;
        }
        if !buffers.event_indicators.is_empty() {
            fmu.get_event_indicators(&mut buffers.event_indicators)
                .map_err(Error::fmi("get event indicators"))?;
            buffers.commit_event_indicators();
        }
        self.buffers = buffers;
        self.inputs = InputData::initialize_inputs(&*fmu, &self.input_config);
        self.stats = SimStats {
            end_time: self.settings.start_time,
            ..Default::default()
        };

        if self.event_info.terminate_simulation {
            log::info!("Termination requested by FMU during initialization");
            self.state = DriverState::Terminated;
        } else {
            self.state = DriverState::Initialized;
        }

        log::info!(
            "Initialized {} at t = {}, next time event: {:?}",
            fmu.instance_name(),
            self.settings.start_time,
            self.event_info.next_event_time
        );
        Ok(())
    }

    /// Perform one fixed-size advance starting at `t` and return the reached time.
    pub fn simulate_step(&mut self, t: f64) -> Result<f64, Error> {
        match self.state {
            DriverState::Terminated => return Ok(t),
            DriverState::Initialized | DriverState::Stepping | DriverState::EventHandling => {}
            state => {
                return Err(Error::InvalidState {
                    operation: "simulate a step",
                    state,
                })
            }
        }
        let Some(fmu) = self.fmu.as_mut() else {
            return Err(Error::InvalidState {
                operation: "simulate a step",
                state: self.state,
            });
        };

        let policy = self.settings.status_policy;
        let stop_time = self.settings.stop_time;
        if t >= stop_time {
            return Ok(t);
        }
        self.state = DriverState::Stepping;
        let stats = &mut self.stats;
        let buffers = &mut self.buffers;

        check(policy, stats, "set time", fmu.set_time(t))?;
        if !buffers.event_indicators.is_empty() {
            check(
                policy,
                stats,
                "get event indicators",
                fmu.get_event_indicators(&mut buffers.event_indicators),
            )?;
        }

        let state_event = buffers.state_event_detected();
        let time_event = self.event_info.next_event_time == Some(t);
        let step_event = self.settings.call_event_update;

        if step_event || state_event || time_event {
            log::trace!(
                "Event encountered at t = {t}. [Time: {time_event}, State: {state_event}, Step: {step_event}]"
            );
            self.state = DriverState::EventHandling;
            stats.num_time_events += usize::from(time_event);
            stats.num_state_events += usize::from(state_event);
            stats.num_step_events += usize::from(step_event);

            check(
                policy,
                stats,
                "event update",
                fmu.event_update(self.settings.intermediate_results, &mut self.event_info),
            )?;

            if self.event_info.terminate_simulation {
                log::info!("Termination requested by FMU at t = {t}");
                check(policy, stats, "terminate", fmu.terminate())?;
                self.state = DriverState::Terminated;
                stats.end_time = t;
                return Ok(t);
            }

            if !buffers.states.is_empty() {
                check(
                    policy,
                    stats,
                    "get continuous states",
                    fmu.get_continuous_states(&mut buffers.states),
                )?;
            }
            if !buffers.event_indicators.is_empty() {
                check(
                    policy,
                    stats,
                    "get event indicators",
                    fmu.get_event_indicators(&mut buffers.event_indicators),
                )?;
            }
            self.state = DriverState::Stepping;
        }
        buffers.commit_event_indicators();

        let mut h = self.settings.step_size;
        let mut t_new = t + h;
        if let Some(te) = self.event_info.next_event_time {
            if te > t && te < t + h {
                h = te - t;
                t_new = te;
            }
        }
        if t_new > stop_time - h / 1e16 {
            h = stop_time - t;
            t_new = stop_time;
        }

        check(
            policy,
            stats,
            "set inputs",
            self.inputs.set_inputs_in_fmu(fmu),
        )?;

        if !buffers.states.is_empty() {
            check(
                policy,
                stats,
                "get derivatives",
                fmu.get_derivatives(&mut buffers.derivatives),
            )?;
            for (x, dx) in buffers.states.iter_mut().zip(buffers.derivatives.iter()) {
                *x += h * dx;
            }
            check(
                policy,
                stats,
                "set continuous states",
                fmu.set_continuous_states(&buffers.states),
            )?;
        }

        let mut call_event_update = false;
        let mut terminate = false;
        check(
            policy,
            stats,
            "completed integrator step",
            fmu.completed_integrator_step(&mut call_event_update, &mut terminate),
        )?;
        self.settings.call_event_update = call_event_update;

        self.inputs.reset_discrete_input_values();
        stats.num_steps += 1;
        stats.end_time = t_new;

        if terminate {
            log::info!("Termination requested by FMU at t = {t_new}");
            check(policy, stats, "terminate", fmu.terminate())?;
            self.state = DriverState::Terminated;
        }

        Ok(t_new)
    }

    /// Terminate the simulation early.
    pub fn terminate(&mut self) -> Result<(), Error> {
        match (self.state, self.fmu.as_mut()) {
            (DriverState::Unloaded | DriverState::Loaded | DriverState::Terminated, _) | (_, None) => {
                Ok(())
            }
            (_, Some(fmu)) => {
                self.state = DriverState::Terminated;
                fmu.terminate().map(drop).map_err(Error::fmi("terminate"))
            }
        }
    }

    /// Zero all input values, analog and discrete.
    pub fn reset_inputs(&mut self) {
        self.inputs.reset_input_values();
    }

    pub fn fmu_data(&self) -> FmuData<'_> {
        FmuData {
            states: &self.buffers.states,
            derivatives: &self.buffers.derivatives,
            n_states: self.buffers.states.len(),
            n_event_indicators: self.buffers.event_indicators.len(),
            status: self
                .fmu
                .as_ref()
                .map(FmuHandle::last_status)
                .unwrap_or_default(),
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn event_info(&self) -> &EventInfo {
        &self.event_info
    }

    pub fn buffers(&self) -> &StateBuffers {
        &self.buffers
    }

    pub fn inputs(&self) -> &InputData {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut InputData {
        &mut self.inputs
    }

    pub fn fmu(&self) -> Option<&F> {
        self.fmu.as_ref()
    }

    pub fn fmu_mut(&mut self) -> Option<&mut F> {
        self.fmu.as_mut()
    }
}

impl<F: FmuHandle> TimeStepper for IntegrationDriver<F> {
    fn simulate_step(&mut self, t: f64) -> Result<f64, Error> {
        IntegrationDriver::simulate_step(self, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_event_detection() {
        let mut buffers = StateBuffers::new(1, 2);
        assert!(!buffers.state_event_detected());

        buffers.event_indicators_prev.copy_from_slice(&[1.0, -1.0]);
        buffers.event_indicators.copy_from_slice(&[0.5, -0.5]);
        assert!(!buffers.state_event_detected());

        // Touching zero is not a crossing
        buffers.event_indicators.copy_from_slice(&[0.0, -0.5]);
        assert!(!buffers.state_event_detected());

        buffers.event_indicators.copy_from_slice(&[0.5, 0.5]);
        assert!(buffers.state_event_detected());

        buffers.commit_event_indicators();
        assert_eq!(buffers.event_indicators, buffers.event_indicators_prev);
    }

    #[test]
    fn test_status_policy() {
        let mut stats = SimStats::default();
        assert!(check(StatusPolicy::Tolerant, &mut stats, "x", Ok(FmiRes::Warning)).is_ok());
        assert!(check(StatusPolicy::Tolerant, &mut stats, "x", Err(FmiError::Discard)).is_ok());
        assert_eq!(stats.num_soft_errors, 1);
        assert_eq!(stats.last_error, Some(FmiError::Discard));

        let err = check(StatusPolicy::Strict, &mut stats, "get derivatives", Err(FmiError::Error))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Fmi {
                call: "get derivatives",
                source: FmiError::Error
            }
        ));
        assert_eq!(stats.num_soft_errors, 1);
    }

    #[test]
    fn test_unloaded_driver() {
        let mut driver: IntegrationDriver = IntegrationDriver::new();
        assert_eq!(driver.state(), DriverState::Unloaded);
        assert!(matches!(
            driver.simulate_step(0.0),
            Err(Error::InvalidState {
                state: DriverState::Unloaded,
                ..
            })
        ));
        assert!(matches!(
            driver.initialize(),
            Err(Error::InvalidState { .. })
        ));
        assert!(driver.terminate().is_ok());
        let data = driver.fmu_data();
        assert_eq!(data.n_states, 0);
        assert_eq!(data.status, Status::OK);
    }
}
