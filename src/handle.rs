//! The version-independent surface of a loaded FMU.

use std::fmt::Display;

use crate::{
    schema::{traits::DefaultExperiment, variable_counts::Counts},
    settings::SimulationSettings,
    Error, EventInfo,
};
use crate::{FmiError, FmiRes, Status};

/// FMI value references are `unsigned int` in both FMI 1.0 and 2.0.
pub type ValueRef = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Real,
    Integer,
    Boolean,
    String,
    Enumeration,
}

impl BaseType {
    /// The buffer type used to exchange values of this type; enumerations travel as integers.
    pub fn storage(self) -> BaseType {
        match self {
            BaseType::Enumeration => BaseType::Integer,
            other => other,
        }
    }
}

impl Display for BaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BaseType::Real => "Real",
            BaseType::Integer => "Integer",
            BaseType::Boolean => "Boolean",
            BaseType::String => "String",
            BaseType::Enumeration => "Enumeration",
        };
        f.write_str(name)
    }
}

/// Causality of a variable, unified across FMI 1.0 (`internal`, `none`) and FMI 2.0.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Causality {
    Input,
    Output,
    Parameter,
    #[default]
    Local,
    Independent,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub name: String,
    pub value_reference: ValueRef,
    pub causality: Causality,
    pub base_type: BaseType,
    pub description: Option<String>,
}

/// Values of the model's `<DefaultExperiment>`, detached from the schema version.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Experiment {
    pub start_time: Option<f64>,
    pub stop_time: Option<f64>,
    pub tolerance: Option<f64>,
    pub step_size: Option<f64>,
}

impl Experiment {
    pub fn from_model(md: &impl DefaultExperiment) -> Self {
        Self {
            start_time: md.start_time(),
            stop_time: md.stop_time(),
            tolerance: md.tolerance(),
            step_size: md.step_size(),
        }
    }
}

impl DefaultExperiment for Experiment {
    fn start_time(&self) -> Option<f64> {
        self.start_time
    }

    fn stop_time(&self) -> Option<f64> {
        self.stop_time
    }

    fn tolerance(&self) -> Option<f64> {
        self.tolerance
    }

    fn step_size(&self) -> Option<f64> {
        self.step_size
    }
}

/// A loaded Model-Exchange FMU.
///
/// Every native call is normalized into a [`Result<FmiRes, FmiError>`], and its raw status is
/// remembered as [`FmuHandle::last_status`].
pub trait FmuHandle {
    /// Name used as the instance name and as the logging target of FMU messages.
    fn instance_name(&self) -> &str;

    /// The declared FMI version string, e.g. "1.0".
    fn fmi_version(&self) -> &str;

    fn num_states(&self) -> usize;

    fn num_event_indicators(&self) -> usize;

    fn default_experiment(&self) -> Experiment;

    /// All model variables in declaration order.
    fn variables(&self) -> Vec<VariableInfo>;

    /// Variable tallies. The default only knows causality and base type; the FMI handles
    /// report the model description's full counts.
    fn model_counts(&self) -> Counts {
        self.variables()
            .iter()
            .fold(Counts::default(), |mut counts, var| {
                match var.causality {
                    Causality::Input => counts.inputs += 1,
                    Causality::Output => counts.outputs += 1,
                    Causality::Parameter => counts.parameters += 1,
                    Causality::Local => counts.locals += 1,
                    Causality::Independent => counts.independent += 1,
                    Causality::Other => {}
                }
                match var.base_type {
                    BaseType::Real => counts.reals += 1,
                    BaseType::Integer => counts.integers += 1,
                    BaseType::Boolean => counts.booleans += 1,
                    BaseType::String => counts.strings += 1,
                    BaseType::Enumeration => counts.enumerations += 1,
                }
                counts
            })
    }

    /// Look up the value reference of a variable by its full name.
    fn value_reference(&self, name: &str) -> Result<ValueRef, Error> {
        self.variables()
            .into_iter()
            .find(|var| var.name == name)
            .map(|var| var.value_reference)
            .ok_or_else(|| Error::UnknownVariable {
                name: name.to_owned(),
            })
    }

    /// Instantiate the model, set the start time and run the version-specific initialization.
    ///
    /// Valid exactly once per loaded handle; a second call returns [`Error::AlreadyInitialized`].
    fn initialize(&mut self, settings: &SimulationSettings) -> Result<EventInfo, Error>;

    fn is_instantiated(&self) -> bool;

    fn set_time(&mut self, time: f64) -> Result<FmiRes, FmiError>;

    fn get_event_indicators(&mut self, event_indicators: &mut [f64]) -> Result<FmiRes, FmiError>;

    /// Run the discrete-update sequence until the event iteration converges or the FMU asks to
    /// terminate, updating `event_info` along the way.
    fn event_update(
        &mut self,
        intermediate_results: bool,
        event_info: &mut EventInfo,
    ) -> Result<FmiRes, FmiError>;

    fn get_continuous_states(&mut self, states: &mut [f64]) -> Result<FmiRes, FmiError>;

    fn set_continuous_states(&mut self, states: &[f64]) -> Result<FmiRes, FmiError>;

    fn get_derivatives(&mut self, derivatives: &mut [f64]) -> Result<FmiRes, FmiError>;

    /// Notify the FMU that an integrator step is complete. On return `call_event_update` tells
    /// whether an event update is required before the next step.
    fn completed_integrator_step(
        &mut self,
        call_event_update: &mut bool,
        terminate_simulation: &mut bool,
    ) -> Result<FmiRes, FmiError>;

    fn get_real(&mut self, vrs: &[ValueRef], values: &mut [f64]) -> Result<FmiRes, FmiError>;

    fn set_real(&mut self, vrs: &[ValueRef], values: &[f64]) -> Result<FmiRes, FmiError>;

    fn set_integer(&mut self, vrs: &[ValueRef], values: &[i32]) -> Result<FmiRes, FmiError>;

    fn set_boolean(&mut self, vrs: &[ValueRef], values: &[bool]) -> Result<FmiRes, FmiError>;

    fn set_string(&mut self, vrs: &[ValueRef], values: &[String]) -> Result<FmiRes, FmiError>;

    fn terminate(&mut self) -> Result<FmiRes, FmiError>;

    /// Release the native instance. Safe on a never-instantiated handle, and runs at most once.
    fn destroy(&mut self);

    /// Status of the most recent native call.
    fn last_status(&self) -> Status;
}

impl<F: FmuHandle + ?Sized> FmuHandle for Box<F> {
    fn instance_name(&self) -> &str {
        (**self).instance_name()
    }

    fn fmi_version(&self) -> &str {
        (**self).fmi_version()
    }

    fn num_states(&self) -> usize {
        (**self).num_states()
    }

    fn num_event_indicators(&self) -> usize {
        (**self).num_event_indicators()
    }

    fn default_experiment(&self) -> Experiment {
        (**self).default_experiment()
    }

    fn variables(&self) -> Vec<VariableInfo> {
        (**self).variables()
    }

    fn model_counts(&self) -> Counts {
        (**self).model_counts()
    }

    fn value_reference(&self, name: &str) -> Result<ValueRef, Error> {
        (**self).value_reference(name)
    }

    fn initialize(&mut self, settings: &SimulationSettings) -> Result<EventInfo, Error> {
        (**self).initialize(settings)
    }

    fn is_instantiated(&self) -> bool {
        (**self).is_instantiated()
    }

    fn set_time(&mut self, time: f64) -> Result<FmiRes, FmiError> {
        (**self).set_time(time)
    }

    fn get_event_indicators(&mut self, event_indicators: &mut [f64]) -> Result<FmiRes, FmiError> {
        (**self).get_event_indicators(event_indicators)
    }

    fn event_update(
        &mut self,
        intermediate_results: bool,
        event_info: &mut EventInfo,
    ) -> Result<FmiRes, FmiError> {
        (**self).event_update(intermediate_results, event_info)
    }

    fn get_continuous_states(&mut self, states: &mut [f64]) -> Result<FmiRes, FmiError> {
        (**self).get_continuous_states(states)
    }

    fn set_continuous_states(&mut self, states: &[f64]) -> Result<FmiRes, FmiError> {
        (**self).set_continuous_states(states)
    }

    fn get_derivatives(&mut self, derivatives: &mut [f64]) -> Result<FmiRes, FmiError> {
        (**self).get_derivatives(derivatives)
    }

    fn completed_integrator_step(
        &mut self,
        call_event_update: &mut bool,
        terminate_simulation: &mut bool,
    ) -> Result<FmiRes, FmiError> {
        (**self).completed_integrator_step(call_event_update, terminate_simulation)
    }

    fn get_real(&mut self, vrs: &[ValueRef], values: &mut [f64]) -> Result<FmiRes, FmiError> {
        (**self).get_real(vrs, values)
    }

    fn set_real(&mut self, vrs: &[ValueRef], values: &[f64]) -> Result<FmiRes, FmiError> {
        (**self).set_real(vrs, values)
    }

    fn set_integer(&mut self, vrs: &[ValueRef], values: &[i32]) -> Result<FmiRes, FmiError> {
        (**self).set_integer(vrs, values)
    }

    fn set_boolean(&mut self, vrs: &[ValueRef], values: &[bool]) -> Result<FmiRes, FmiError> {
        (**self).set_boolean(vrs, values)
    }

    fn set_string(&mut self, vrs: &[ValueRef], values: &[String]) -> Result<FmiRes, FmiError> {
        (**self).set_string(vrs, values)
    }

    fn terminate(&mut self) -> Result<FmiRes, FmiError> {
        (**self).terminate()
    }

    fn destroy(&mut self) {
        (**self).destroy()
    }

    fn last_status(&self) -> Status {
        (**self).last_status()
    }
}
