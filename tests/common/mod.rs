//! A scripted Model-Exchange FMU for exercising the driver without a native library.

#![allow(dead_code)]

use std::collections::HashMap;

use fmivis::{
    handle::{BaseType, Causality, Experiment, FmuHandle, ValueRef, VariableInfo},
    settings::SimulationSettings,
    Error, EventInfo, FmiError, FmiRes, Status,
};

type StateFn = Box<dyn Fn(f64, &[f64]) -> Vec<f64>>;

pub struct MockFmu {
    pub name: String,
    pub variables: Vec<VariableInfo>,
    pub experiment: Experiment,
    pub time: f64,
    pub states: Vec<f64>,
    pub derivatives: StateFn,
    pub n_event_indicators: usize,
    pub event_indicators: StateFn,
    /// Pending time events; the first one is reported after initialization and each event update
    pub time_events: Vec<f64>,
    /// Reported by the completed-step call
    pub step_event: bool,
    /// Request termination once the model time reaches this value
    pub terminate_at: Option<f64>,
    /// Status returned by `get_derivatives`
    pub derivatives_status: Status,
    /// Status returned by `set_real`
    pub set_real_status: Status,
    pub reals: HashMap<ValueRef, f64>,
    pub integers: HashMap<ValueRef, i32>,
    pub booleans: HashMap<ValueRef, bool>,
    pub strings: HashMap<ValueRef, String>,
    /// Every FMU call in order, with the model time at which it happened
    pub calls: Vec<(&'static str, f64)>,
    pub instantiated: bool,
    pub destroyed: usize,
    pub last_status: Status,
}

impl MockFmu {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            variables: Vec::new(),
            experiment: Experiment::default(),
            time: 0.0,
            states: Vec::new(),
            derivatives: Box::new(|_, x| vec![0.0; x.len()]),
            n_event_indicators: 0,
            event_indicators: Box::new(|_, _| Vec::new()),
            time_events: Vec::new(),
            step_event: false,
            terminate_at: None,
            derivatives_status: Status::OK,
            set_real_status: Status::OK,
            reals: HashMap::new(),
            integers: HashMap::new(),
            booleans: HashMap::new(),
            strings: HashMap::new(),
            calls: Vec::new(),
            instantiated: false,
            destroyed: 0,
            last_status: Status::OK,
        }
    }

    /// Two states, the derivative of the first one is 1 and the second one oscillates.
    pub fn pendulum() -> Self {
        Self {
            states: vec![0.0, 1.0],
            derivatives: Box::new(|_, x| vec![1.0, -x[0]]),
            ..Self::new("pendulum")
        }
    }

    /// One event indicator `x - 2.5` on a state that grows with rate 1.
    pub fn crossing() -> Self {
        Self {
            states: vec![0.0],
            derivatives: Box::new(|_, _| vec![1.0]),
            n_event_indicators: 1,
            event_indicators: Box::new(|_, x| vec![x[0] - 2.5]),
            ..Self::new("crossing")
        }
    }

    /// A model with real, integer, boolean and string inputs plus a real output.
    pub fn with_inputs() -> Self {
        let var = |name: &str, vr, causality, base_type| VariableInfo {
            name: name.to_owned(),
            value_reference: vr,
            causality,
            base_type,
            description: None,
        };
        Self {
            variables: vec![
                var("throttle", 1, Causality::Input, BaseType::Real),
                var("steer", 2, Causality::Input, BaseType::Real),
                var("gear", 3, Causality::Input, BaseType::Enumeration),
                var("horn", 4, Causality::Input, BaseType::Boolean),
                var("lights", 5, Causality::Input, BaseType::Boolean),
                var("label", 6, Causality::Input, BaseType::String),
                var("speed", 7, Causality::Output, BaseType::Real),
                var("mass", 8, Causality::Parameter, BaseType::Real),
            ],
            ..Self::new("vehicle")
        }
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|(c, _)| *c == call).count()
    }

    pub fn call_names(&self) -> Vec<&'static str> {
        self.calls.iter().map(|(c, _)| *c).collect()
    }

    fn record(&mut self, call: &'static str, status: Status) -> Result<FmiRes, FmiError> {
        self.calls.push((call, self.time));
        self.last_status = status;
        status.ok()
    }

    fn event_info(&self) -> EventInfo {
        EventInfo {
            terminate_simulation: self.terminate_at.is_some_and(|t| self.time >= t),
            next_event_time: self.time_events.first().copied(),
            ..Default::default()
        }
    }
}

impl FmuHandle for MockFmu {
    fn instance_name(&self) -> &str {
        &self.name
    }

    fn fmi_version(&self) -> &str {
        "2.0"
    }

    fn num_states(&self) -> usize {
        self.states.len()
    }

    fn num_event_indicators(&self) -> usize {
        self.n_event_indicators
    }

    fn default_experiment(&self) -> Experiment {
        self.experiment
    }

    fn variables(&self) -> Vec<VariableInfo> {
        self.variables.clone()
    }

    fn initialize(&mut self, settings: &SimulationSettings) -> Result<EventInfo, Error> {
        if self.instantiated {
            return Err(Error::AlreadyInitialized);
        }
        self.instantiated = true;
        self.time = settings.start_time;
        self.record("initialize", Status::OK)
            .map_err(|source| Error::Fmi {
                call: "initialize",
                source,
            })?;
        Ok(self.event_info())
    }

    fn is_instantiated(&self) -> bool {
        self.instantiated
    }

    fn set_time(&mut self, time: f64) -> Result<FmiRes, FmiError> {
        self.time = time;
        self.record("set_time", Status::OK)
    }

    fn get_event_indicators(&mut self, event_indicators: &mut [f64]) -> Result<FmiRes, FmiError> {
        let z = (self.event_indicators)(self.time, &self.states);
        event_indicators.copy_from_slice(&z);
        self.record("get_event_indicators", Status::OK)
    }

    fn event_update(
        &mut self,
        _intermediate_results: bool,
        event_info: &mut EventInfo,
    ) -> Result<FmiRes, FmiError> {
        if self.time_events.first() == Some(&self.time) {
            self.time_events.remove(0);
        }
        *event_info = self.event_info();
        self.record("event_update", Status::OK)
    }

    fn get_continuous_states(&mut self, states: &mut [f64]) -> Result<FmiRes, FmiError> {
        states.copy_from_slice(&self.states);
        self.record("get_continuous_states", Status::OK)
    }

    fn set_continuous_states(&mut self, states: &[f64]) -> Result<FmiRes, FmiError> {
        self.states.copy_from_slice(states);
        self.record("set_continuous_states", Status::OK)
    }

    fn get_derivatives(&mut self, derivatives: &mut [f64]) -> Result<FmiRes, FmiError> {
        let dx = (self.derivatives)(self.time, &self.states);
        derivatives.copy_from_slice(&dx);
        self.record("get_derivatives", self.derivatives_status)
    }

    fn completed_integrator_step(
        &mut self,
        call_event_update: &mut bool,
        terminate_simulation: &mut bool,
    ) -> Result<FmiRes, FmiError> {
        *call_event_update = self.step_event;
        *terminate_simulation = self.terminate_at.is_some_and(|t| self.time >= t);
        self.record("completed_integrator_step", Status::OK)
    }

    fn get_real(&mut self, vrs: &[ValueRef], values: &mut [f64]) -> Result<FmiRes, FmiError> {
        FmiError::check_lengths(vrs.len(), values.len())?;
        for (vr, value) in vrs.iter().zip(values.iter_mut()) {
            *value = self.reals.get(vr).copied().unwrap_or_default();
        }
        self.record("get_real", Status::OK)
    }

    fn set_real(&mut self, vrs: &[ValueRef], values: &[f64]) -> Result<FmiRes, FmiError> {
        FmiError::check_lengths(vrs.len(), values.len())?;
        if self.set_real_status.ok().is_ok() {
            self.reals.extend(vrs.iter().copied().zip(values.iter().copied()));
        }
        self.record("set_real", self.set_real_status)
    }

    fn set_integer(&mut self, vrs: &[ValueRef], values: &[i32]) -> Result<FmiRes, FmiError> {
        self.integers
            .extend(vrs.iter().copied().zip(values.iter().copied()));
        self.record("set_integer", Status::OK)
    }

    fn set_boolean(&mut self, vrs: &[ValueRef], values: &[bool]) -> Result<FmiRes, FmiError> {
        self.booleans
            .extend(vrs.iter().copied().zip(values.iter().copied()));
        self.record("set_boolean", Status::OK)
    }

    fn set_string(&mut self, vrs: &[ValueRef], values: &[String]) -> Result<FmiRes, FmiError> {
        self.strings
            .extend(vrs.iter().copied().zip(values.iter().cloned()));
        self.record("set_string", Status::OK)
    }

    fn terminate(&mut self) -> Result<FmiRes, FmiError> {
        self.record("terminate", Status::OK)
    }

    fn destroy(&mut self) {
        if self.instantiated {
            self.instantiated = false;
            self.destroyed += 1;
        }
    }

    fn last_status(&self) -> Status {
        self.last_status
    }
}

pub fn settings(start_time: f64, stop_time: f64, step_size: f64) -> SimulationSettings {
    SimulationSettings {
        start_time,
        stop_time,
        step_size,
        ..Default::default()
    }
}
