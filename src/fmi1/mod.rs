//! FMI 1.0 Model-Exchange handle

use std::{
    ffi::{CStr, CString},
    path::PathBuf,
};

use fmivis_schema::fmi1 as schema;

use crate::{
    handle::{BaseType, Causality, Experiment, FmuHandle, ValueRef, VariableInfo},
    import,
    schema::variable_counts::{Counts, VariableCounts},
    settings::SimulationSettings,
    Error, EventInfo, FmiError, FmiRes, Status,
};

pub use fmivis_sys::fmi1 as binding;

const TYPES_PLATFORM: &str = "standard32";

fn status_from(status: binding::fmiStatus) -> Status {
    match status {
        binding::fmiStatus_fmiOK => Status::OK,
        binding::fmiStatus_fmiWarning => Status::Warning,
        binding::fmiStatus_fmiDiscard => Status::Discard,
        binding::fmiStatus_fmiError => Status::Error,
        _ => Status::Fatal,
    }
}

fn callback_functions() -> binding::fmiCallbackFunctions {
    binding::fmiCallbackFunctions {
        logger: Some(binding::logger::fmi1_callback_logger_handler as _),
        allocateMemory: Some(libc::calloc),
        freeMemory: Some(libc::free),
    }
}

pub struct Fmi1Fmu {
    /// Instance name, the model identifier
    name: String,
    /// Path to the unzipped FMU on disk
    dir: PathBuf,
    model_description: schema::Fmi1ModelDescription,
    binding: binding::Fmi1Binding,
    /// Null until [`FmuHandle::initialize`]
    component: binding::fmiComponent,
    callbacks: binding::fmiCallbackFunctions,
    /// Kept alive for the lifetime of the instance
    c_name: CString,
    c_guid: CString,
    status: Status,
}

impl Fmi1Fmu {
    /// Parse the model description and load the shared library of an extracted FMU.
    pub fn new(dir: PathBuf, schema_xml: &str) -> Result<Self, Error> {
        let model_description: schema::Fmi1ModelDescription =
            fmivis_schema::deserialize(schema_xml)?;

        if model_description.is_co_simulation() {
            return Err(Error::UnsupportedFmuType("ModelExchange".to_owned()));
        }

        let model_identifier = model_description.model_identifier.clone();
        let lib_path = dir.join(import::shared_lib_path(&model_identifier)?);
        log::trace!("Loading shared library {lib_path:?}");
        let binding = unsafe { binding::Fmi1Binding::new(&lib_path, &model_identifier)? };

        let c_name = CString::new(model_identifier.as_str())
            .map_err(|_| Error::Instantiation(model_identifier.clone()))?;
        let c_guid = CString::new(model_description.guid.as_str())
            .map_err(|_| Error::Instantiation(model_identifier.clone()))?;

        let fmu = Self {
            name: model_identifier,
            dir,
            model_description,
            binding,
            component: std::ptr::null_mut(),
            callbacks: callback_functions(),
            c_name,
            c_guid,
            status: Status::OK,
        };
        fmu.check_consistency();
        Ok(fmu)
    }

    pub fn model_description(&self) -> &schema::Fmi1ModelDescription {
        &self.model_description
    }

    /// Path to the unzipped FMU on disk
    pub fn archive_path(&self) -> &std::path::Path {
        &self.dir
    }

    pub fn get_version(&self) -> &str {
        unsafe { CStr::from_ptr(self.binding.fmiGetVersion()) }
            .to_str()
            .unwrap_or_default()
    }

    pub fn get_types_platform(&self) -> &str {
        unsafe { CStr::from_ptr(self.binding.fmiGetModelTypesPlatform()) }
            .to_str()
            .unwrap_or_default()
    }

    /// Compare the version and types platform reported by the library with the model
    /// description, logging any mismatch.
    fn check_consistency(&self) {
        let types_platform = self.get_types_platform();
        if types_platform != TYPES_PLATFORM {
            log::warn!(
                "TypesPlatform of loaded API ({types_platform}) doesn't match expected ({TYPES_PLATFORM})"
            );
        }

        let fmi_version = self.get_version();
        if fmi_version != self.model_description.fmi_version {
            log::warn!(
                "FMI version of loaded API ({fmi_version}) doesn't match expected ({})",
                self.model_description.fmi_version
            );
        }
    }

    /// The native instance, or an error if it was never instantiated or already freed.
    fn component(&self) -> Result<binding::fmiComponent, FmiError> {
        if self.component.is_null() {
            log::error!("{} is not instantiated", self.name);
            Err(FmiError::Error)
        } else {
            Ok(self.component)
        }
    }

    /// Record the raw status of a native call and normalize it.
    fn record(&mut self, status: binding::fmiStatus) -> Result<FmiRes, FmiError> {
        self.status = status_from(status);
        self.status.ok()
    }

    fn instantiate(&mut self, logging_on: bool) -> Result<(), Error> {
        if !self.component.is_null() {
            return Err(Error::AlreadyInitialized);
        }

        let component = unsafe {
            self.binding.fmiInstantiateModel(
                self.c_name.as_ptr(),
                self.c_guid.as_ptr(),
                self.callbacks,
                logging_on as binding::fmiBoolean,
            )
        };
        if component.is_null() {
            return Err(Error::Instantiation(self.name.clone()));
        }
        log::trace!("Created FMI1.0 ME component {component:?}");
        self.component = component;
        Ok(())
    }
}

impl FmuHandle for Fmi1Fmu {
    fn instance_name(&self) -> &str {
        &self.name
    }

    fn fmi_version(&self) -> &str {
        &self.model_description.fmi_version
    }

    fn num_states(&self) -> usize {
        self.model_description.num_states()
    }

    fn num_event_indicators(&self) -> usize {
        self.model_description.num_event_indicators()
    }

    fn default_experiment(&self) -> Experiment {
        Experiment::from_model(&self.model_description)
    }

    fn variables(&self) -> Vec<VariableInfo> {
        self.model_description
            .get_model_variables()
            .map(|sv| VariableInfo {
                name: sv.name.clone(),
                value_reference: sv.value_reference,
                causality: match sv.causality {
                    schema::Causality::Input => Causality::Input,
                    schema::Causality::Output => Causality::Output,
                    schema::Causality::Internal => {
                        if sv.variability == schema::Variability::Parameter {
                            Causality::Parameter
                        } else {
                            Causality::Local
                        }
                    }
                    schema::Causality::None => Causality::Other,
                },
                base_type: match sv.elem {
                    schema::ScalarVariableElement::Real(_) => BaseType::Real,
                    schema::ScalarVariableElement::Integer(_) => BaseType::Integer,
                    schema::ScalarVariableElement::Boolean(_) => BaseType::Boolean,
                    schema::ScalarVariableElement::String(_) => BaseType::String,
                    schema::ScalarVariableElement::Enumeration(_) => BaseType::Enumeration,
                },
                description: sv.description.clone(),
            })
            .collect()
    }

    fn model_counts(&self) -> Counts {
        self.model_description.model_counts()
    }

    fn value_reference(&self, name: &str) -> Result<ValueRef, Error> {
        self.model_description
            .model_variable_by_name(name)
            .map(|sv| sv.value_reference)
            .map_err(|_| Error::UnknownVariable {
                name: name.to_owned(),
            })
    }

    fn initialize(&mut self, settings: &SimulationSettings) -> Result<EventInfo, Error> {
        self.instantiate(settings.fmu_logging)?;

        self.set_time(settings.start_time)
            .map_err(Error::fmi("fmiSetTime"))?;

        let c = self.component;
        let mut raw = binding::fmiEventInfo::default();
        let status = unsafe {
            self.binding.fmiInitialize(
                c,
                settings.tolerance_controlled as binding::fmiBoolean,
                settings.relative_tolerance,
                &mut raw,
            )
        };
        self.record(status).map_err(Error::fmi("fmiInitialize"))?;

        let mut event_info = EventInfo::default();
        event_info.update_from_fmi1(&raw);
        log::debug!("Initialized {} at t = {}", self.name, settings.start_time);
        Ok(event_info)
    }

    fn is_instantiated(&self) -> bool {
        !self.component.is_null()
    }

    fn set_time(&mut self, time: f64) -> Result<FmiRes, FmiError> {
        let c = self.component()?;
        let status = unsafe { self.binding.fmiSetTime(c, time) };
        self.record(status)
    }

    fn get_event_indicators(&mut self, event_indicators: &mut [f64]) -> Result<FmiRes, FmiError> {
        let c = self.component()?;
        if event_indicators.is_empty() {
            return Ok(FmiRes::OK);
        }
        let status = unsafe {
            self.binding.fmiGetEventIndicators(
                c,
                event_indicators.as_mut_ptr(),
                event_indicators.len(),
            )
        };
        self.record(status)
    }

    fn event_update(
        &mut self,
        intermediate_results: bool,
        event_info: &mut EventInfo,
    ) -> Result<FmiRes, FmiError> {
        let c = self.component()?;
        let mut raw = binding::fmiEventInfo::default();
        loop {
            let status = unsafe {
                self.binding.fmiEventUpdate(
                    c,
                    intermediate_results as binding::fmiBoolean,
                    &mut raw,
                )
            };
            let res = self.record(status)?;
            event_info.update_from_fmi1(&raw);
            if !event_info.discrete_states_need_update || event_info.terminate_simulation {
                break Ok(res);
            }
        }
    }

    fn get_continuous_states(&mut self, states: &mut [f64]) -> Result<FmiRes, FmiError> {
        let c = self.component()?;
        if states.is_empty() {
            return Ok(FmiRes::OK);
        }
        let status = unsafe {
            self.binding
                .fmiGetContinuousStates(c, states.as_mut_ptr(), states.len())
        };
        self.record(status)
    }

    fn set_continuous_states(&mut self, states: &[f64]) -> Result<FmiRes, FmiError> {
        let c = self.component()?;
        if states.is_empty() {
            return Ok(FmiRes::OK);
        }
        let status = unsafe {
            self.binding
                .fmiSetContinuousStates(c, states.as_ptr(), states.len())
        };
        self.record(status)
    }

    fn get_derivatives(&mut self, derivatives: &mut [f64]) -> Result<FmiRes, FmiError> {
        let c = self.component()?;
        if derivatives.is_empty() {
            return Ok(FmiRes::OK);
        }
        let status = unsafe {
            self.binding.fmiGetDerivatives(
                c,
                derivatives.as_mut_ptr(),
                derivatives.len(),
            )
        };
        self.record(status)
    }

    fn completed_integrator_step(
        &mut self,
        call_event_update: &mut bool,
        terminate_simulation: &mut bool,
    ) -> Result<FmiRes, FmiError> {
        let c = self.component()?;
        let mut raw_call_event_update = binding::fmiFalse;
        let status = unsafe {
            self.binding
                .fmiCompletedIntegratorStep(c, &mut raw_call_event_update)
        };
        *call_event_update = raw_call_event_update != binding::fmiFalse;
        *terminate_simulation = false;
        self.record(status)
    }

    fn get_real(&mut self, vrs: &[ValueRef], values: &mut [f64]) -> Result<FmiRes, FmiError> {
        FmiError::check_lengths(vrs.len(), values.len())?;
        let c = self.component()?;
        let status = unsafe {
            self.binding
                .fmiGetReal(c, vrs.as_ptr(), vrs.len(), values.as_mut_ptr())
        };
        self.record(status)
    }

    fn set_real(&mut self, vrs: &[ValueRef], values: &[f64]) -> Result<FmiRes, FmiError> {
        FmiError::check_lengths(vrs.len(), values.len())?;
        let c = self.component()?;
        let status = unsafe {
            self.binding
                .fmiSetReal(c, vrs.as_ptr(), vrs.len(), values.as_ptr())
        };
        self.record(status)
    }

    fn set_integer(&mut self, vrs: &[ValueRef], values: &[i32]) -> Result<FmiRes, FmiError> {
        FmiError::check_lengths(vrs.len(), values.len())?;
        let c = self.component()?;
        let status = unsafe {
            self.binding
                .fmiSetInteger(c, vrs.as_ptr(), vrs.len(), values.as_ptr())
        };
        self.record(status)
    }

    fn set_boolean(&mut self, vrs: &[ValueRef], values: &[bool]) -> Result<FmiRes, FmiError> {
        FmiError::check_lengths(vrs.len(), values.len())?;
        let c = self.component()?;
        let values: Vec<binding::fmiBoolean> = values
            .iter()
            .map(|&v| v as binding::fmiBoolean)
            .collect();
        let status = unsafe {
            self.binding
                .fmiSetBoolean(c, vrs.as_ptr(), vrs.len(), values.as_ptr())
        };
        self.record(status)
    }

    fn set_string(&mut self, vrs: &[ValueRef], values: &[String]) -> Result<FmiRes, FmiError> {
        FmiError::check_lengths(vrs.len(), values.len())?;
        let c = self.component()?;
        let values = values
            .iter()
            .map(|v| CString::new(v.as_str()).map_err(|_| FmiError::InvalidString))
            .collect::<Result<Vec<_>, _>>()?;
        let ptrs: Vec<binding::fmiString> = values.iter().map(|v| v.as_ptr()).collect();
        let status = unsafe {
            self.binding
                .fmiSetString(c, vrs.as_ptr(), vrs.len(), ptrs.as_ptr())
        };
        self.record(status)
    }

    fn terminate(&mut self) -> Result<FmiRes, FmiError> {
        let c = self.component()?;
        let status = unsafe { self.binding.fmiTerminate(c) };
        self.record(status)
    }

    fn destroy(&mut self) {
        if self.component.is_null() {
            return;
        }
        log::trace!("Freeing component {:?}", self.component);
        unsafe { self.binding.fmiFreeModelInstance(self.component) };
        self.component = std::ptr::null_mut();
    }

    fn last_status(&self) -> Status {
        self.status
    }
}

impl Drop for Fmi1Fmu {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for Fmi1Fmu {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Fmi1Fmu {} {{{:?}, {:?}}}",
            self.name, self.dir, self.component,
        )
    }
}
