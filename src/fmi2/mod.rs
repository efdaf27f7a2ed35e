//! FMI 2.0 Model-Exchange handle

use std::{
    ffi::{CStr, CString},
    path::PathBuf,
};

use fmivis_schema::fmi2 as schema;

use crate::{
    handle::{BaseType, Causality, Experiment, FmuHandle, ValueRef, VariableInfo},
    import,
    schema::variable_counts::{Counts, VariableCounts},
    settings::SimulationSettings,
    Error, EventInfo, FmiError, FmiRes, Status,
};

pub use fmivis_sys::fmi2 as binding;

const TYPES_PLATFORM: &str = "default";

fn status_from(status: binding::fmi2Status) -> Status {
    match status {
        binding::fmi2Status_fmi2OK => Status::OK,
        binding::fmi2Status_fmi2Warning => Status::Warning,
        binding::fmi2Status_fmi2Discard => Status::Discard,
        binding::fmi2Status_fmi2Error => Status::Error,
        binding::fmi2Status_fmi2Pending => Status::Pending,
        _ => Status::Fatal,
    }
}

fn callback_functions() -> binding::fmi2CallbackFunctions {
    binding::fmi2CallbackFunctions {
        logger: Some(binding::logger::fmi2_callback_logger_handler as _),
        allocateMemory: Some(libc::calloc),
        freeMemory: Some(libc::free),
        stepFinished: None,
        componentEnvironment: std::ptr::null_mut::<std::os::raw::c_void>(),
    }
}

pub struct Fmi2Fmu {
    /// Instance name, the model identifier
    name: String,
    /// Path to the unzipped FMU on disk
    dir: PathBuf,
    model_description: schema::Fmi2ModelDescription,
    binding: binding::Fmi2Binding,
    /// Null until [`FmuHandle::initialize`]
    component: binding::fmi2Component,
    /// The FMU keeps a pointer to the callbacks, so they live on the heap for its lifetime
    callbacks: Box<binding::fmi2CallbackFunctions>,
    status: Status,
}

impl Fmi2Fmu {
    /// Parse the model description and load the shared library of an extracted FMU.
    pub fn new(dir: PathBuf, schema_xml: &str) -> Result<Self, Error> {
        let model_description: schema::Fmi2ModelDescription =
            fmivis_schema::deserialize(schema_xml)?;

        let model_exchange = model_description
            .model_exchange
            .as_ref()
            .ok_or(Error::UnsupportedFmuType("ModelExchange".to_owned()))?;

        let model_identifier = model_exchange.model_identifier.clone();

        // Indices in the model structure must point at declared variables
        let derivatives = model_description.derivatives()?;
        log::trace!(
            "State derivatives: {}",
            derivatives
                .iter()
                .map(|sv| sv.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let lib_path = dir.join(import::shared_lib_path(&model_identifier)?);
        log::trace!("Loading shared library {lib_path:?}");
        let binding = unsafe { binding::Fmi2Binding::new(&lib_path)? };

        let fmu = Self {
            name: model_identifier,
            dir,
            model_description,
            binding,
            component: std::ptr::null_mut(),
            callbacks: Box::new(callback_functions()),
            status: Status::OK,
        };
        fmu.check_consistency();
        Ok(fmu)
    }

    pub fn model_description(&self) -> &schema::Fmi2ModelDescription {
        &self.model_description
    }

    /// Path to the unzipped FMU on disk
    pub fn archive_path(&self) -> &std::path::Path {
        &self.dir
    }

    pub fn get_version(&self) -> &str {
        unsafe { CStr::from_ptr(self.binding.fmi2GetVersion()) }
            .to_str()
            .unwrap_or_default()
    }

    pub fn get_types_platform(&self) -> &str {
        unsafe { CStr::from_ptr(self.binding.fmi2GetTypesPlatform()) }
            .to_str()
            .unwrap_or_default()
    }

    /// As per the FMI standard, the resource location is an IETF URI to the resources directory.
    fn resource_location(&self) -> Result<CString, Error> {
        let resource_path = std::path::absolute(self.dir.join("resources"))?;
        let url = url::Url::from_file_path(&resource_path).map_err(|_| {
            Error::ArchiveStructure(format!("Invalid resource path {resource_path:?}"))
        })?;
        CString::new(url.as_str())
            .map_err(|_| Error::ArchiveStructure(format!("Invalid resource path {url}")))
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
    fn component(&self) -> Result<binding::fmi2Component, FmiError> {
        if self.component.is_null() {
            log::error!("{} is not instantiated", self.name);
            Err(FmiError::Error)
        } else {
            Ok(self.component)
        }
    }

    /// Record the raw status of a native call and normalize it.
    fn record(&mut self, status: binding::fmi2Status) -> Result<FmiRes, FmiError> {
        self.status = status_from(status);
        self.status.ok()
    }

    fn instantiate(&mut self, logging_on: bool) -> Result<(), Error> {
        if !self.component.is_null() {
            return Err(Error::AlreadyInitialized);
        }

        let instance_name = CString::new(self.name.as_str())
            .map_err(|_| Error::Instantiation(self.name.clone()))?;
        let guid = CString::new(self.model_description.guid.as_bytes())
            .map_err(|_| Error::Instantiation(self.name.clone()))?;
        let resource_url = self.resource_location()?;

        let component = unsafe {
            let callback_functions = &*self.callbacks as *const binding::fmi2CallbackFunctions;
            self.binding.fmi2Instantiate(
                instance_name.as_ptr(),
                binding::fmi2Type_fmi2ModelExchange,
                guid.as_ptr(),
                resource_url.as_ptr(),
                callback_functions,
                binding::fmi2False,
                logging_on as binding::fmi2Boolean,
            )
        };
        if component.is_null() {
            return Err(Error::Instantiation(self.name.clone()));
        }
        log::trace!("Created FMI2.0 ME component {component:?}");
        self.component = component;
        Ok(())
    }

    /// Iterate `fmi2NewDiscreteStates` until no further update is needed.
    fn new_discrete_states(&mut self, event_info: &mut EventInfo) -> Result<FmiRes, FmiError> {
        let c = self.component()?;
        let mut raw = binding::fmi2EventInfo {
            newDiscreteStatesNeeded: binding::fmi2True,
            ..Default::default()
        };
        let mut res = FmiRes::OK;
        while raw.newDiscreteStatesNeeded != binding::fmi2False {
            let status = unsafe { self.binding.fmi2NewDiscreteStates(c, &mut raw) };
            res = self.record(status)?;
            event_info.update_from_fmi2(&raw);
            if event_info.terminate_simulation {
                break;
            }
        }
        Ok(res)
    }

    fn enter_continuous_time_mode(&mut self) -> Result<FmiRes, FmiError> {
        let c = self.component()?;
        let status = unsafe { self.binding.fmi2EnterContinuousTimeMode(c) };
        self.record(status)
    }
}

impl FmuHandle for Fmi2Fmu {
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
                    schema::Causality::Parameter | schema::Causality::CalculatedParameter => {
                        Causality::Parameter
                    }
                    schema::Causality::Local => Causality::Local,
                    schema::Causality::Independent => Causality::Independent,
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
        let c = self.component;

        let tolerance = settings
            .tolerance_controlled
            .then_some(settings.relative_tolerance);
        let status = unsafe {
            self.binding.fmi2SetupExperiment(
                c,
                tolerance.is_some() as binding::fmi2Boolean,
                tolerance.unwrap_or(0.0),
                settings.start_time,
                binding::fmi2True,
                settings.stop_time,
            )
        };
        self.record(status)
            .map_err(Error::fmi("fmi2SetupExperiment"))?;

        let status = unsafe { self.binding.fmi2EnterInitializationMode(c) };
        self.record(status)
            .map_err(Error::fmi("fmi2EnterInitializationMode"))?;
        let status = unsafe { self.binding.fmi2ExitInitializationMode(c) };
        self.record(status)
            .map_err(Error::fmi("fmi2ExitInitializationMode"))?;

        let mut event_info = EventInfo::default();
        self.new_discrete_states(&mut event_info)
            .map_err(Error::fmi("fmi2NewDiscreteStates"))?;

        if !event_info.terminate_simulation {
            self.enter_continuous_time_mode()
                .map_err(Error::fmi("fmi2EnterContinuousTimeMode"))?;
        }

        log::debug!("Initialized {} at t = {}", self.name, settings.start_time);
        Ok(event_info)
    }

    fn is_instantiated(&self) -> bool {
        !self.component.is_null()
    }

    fn set_time(&mut self, time: f64) -> Result<FmiRes, FmiError> {
        let c = self.component()?;
        let status = unsafe { self.binding.fmi2SetTime(c, time) };
        self.record(status)
    }

    fn get_event_indicators(&mut self, event_indicators: &mut [f64]) -> Result<FmiRes, FmiError> {
        let c = self.component()?;
        if event_indicators.is_empty() {
            return Ok(FmiRes::OK);
        }
        let status = unsafe {
            self.binding.fmi2GetEventIndicators(
                c,
                event_indicators.as_mut_ptr(),
                event_indicators.len(),
            )
        };
        self.record(status)
    }

    fn event_update(
        &mut self,
        _intermediate_results: bool,
        event_info: &mut EventInfo,
    ) -> Result<FmiRes, FmiError> {
        let c = self.component()?;
        let status = unsafe { self.binding.fmi2EnterEventMode(c) };
        self.record(status)?;

        event_info.reset();
        let res = self.new_discrete_states(event_info)?;
        if event_info.terminate_simulation {
            return Ok(res);
        }
        self.enter_continuous_time_mode()
    }

    fn get_continuous_states(&mut self, states: &mut [f64]) -> Result<FmiRes, FmiError> {
        let c = self.component()?;
        if states.is_empty() {
            return Ok(FmiRes::OK);
        }
        let status = unsafe {
            self.binding
                .fmi2GetContinuousStates(c, states.as_mut_ptr(), states.len())
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
                .fmi2SetContinuousStates(c, states.as_ptr(), states.len())
        };
        self.record(status)
    }

    fn get_derivatives(&mut self, derivatives: &mut [f64]) -> Result<FmiRes, FmiError> {
        let c = self.component()?;
        if derivatives.is_empty() {
            return Ok(FmiRes::OK);
        }
        let status = unsafe {
            self.binding
                .fmi2GetDerivatives(c, derivatives.as_mut_ptr(), derivatives.len())
        };
        self.record(status)
    }

    fn completed_integrator_step(
        &mut self,
        call_event_update: &mut bool,
        terminate_simulation: &mut bool,
    ) -> Result<FmiRes, FmiError> {
        let c = self.component()?;
        let mut enter_event_mode = binding::fmi2False;
        let mut terminate = binding::fmi2False;
        let status = unsafe {
            self.binding.fmi2CompletedIntegratorStep(
                c,
                binding::fmi2True,
                &mut enter_event_mode,
                &mut terminate,
            )
        };
        *call_event_update = enter_event_mode != binding::fmi2False;
        *terminate_simulation = terminate != binding::fmi2False;
        self.record(status)
    }

    fn get_real(&mut self, vrs: &[ValueRef], values: &mut [f64]) -> Result<FmiRes, FmiError> {
        FmiError::check_lengths(vrs.len(), values.len())?;
        let c = self.component()?;
        let status = unsafe {
            self.binding
                .fmi2GetReal(c, vrs.as_ptr(), vrs.len(), values.as_mut_ptr())
        };
        self.record(status)
    }

    fn set_real(&mut self, vrs: &[ValueRef], values: &[f64]) -> Result<FmiRes, FmiError> {
        FmiError::check_lengths(vrs.len(), values.len())?;
        let c = self.component()?;
        let status = unsafe {
            self.binding
                .fmi2SetReal(c, vrs.as_ptr(), vrs.len(), values.as_ptr())
        };
        self.record(status)
    }

    fn set_integer(&mut self, vrs: &[ValueRef], values: &[i32]) -> Result<FmiRes, FmiError> {
        FmiError::check_lengths(vrs.len(), values.len())?;
        let c = self.component()?;
        let status = unsafe {
            self.binding
                .fmi2SetInteger(c, vrs.as_ptr(), vrs.len(), values.as_ptr())
        };
        self.record(status)
    }

    fn set_boolean(&mut self, vrs: &[ValueRef], values: &[bool]) -> Result<FmiRes, FmiError> {
        FmiError::check_lengths(vrs.len(), values.len())?;
        let c = self.component()?;
        let values: Vec<binding::fmi2Boolean> = values
            .iter()
            .map(|&v| v as binding::fmi2Boolean)
            .collect();
        let status = unsafe {
            self.binding
                .fmi2SetBoolean(c, vrs.as_ptr(), vrs.len(), values.as_ptr())
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
        let ptrs: Vec<binding::fmi2String> = values.iter().map(|v| v.as_ptr()).collect();
        let status = unsafe {
            self.binding
                .fmi2SetString(c, vrs.as_ptr(), vrs.len(), ptrs.as_ptr())
        };
        self.record(status)
    }

    fn terminate(&mut self) -> Result<FmiRes, FmiError> {
        let c = self.component()?;
        let status = unsafe { self.binding.fmi2Terminate(c) };
        self.record(status)
    }

    fn destroy(&mut self) {
        if self.component.is_null() {
            return;
        }
        log::trace!("Freeing component {:?}", self.component);
        unsafe { self.binding.fmi2FreeInstance(self.component) };
        self.component = std::ptr::null_mut();
    }

    fn last_status(&self) -> Status {
        self.status
    }
}

impl Drop for Fmi2Fmu {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for Fmi2Fmu {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Fmi2Fmu {} {{{:?}, {:?}}}",
            self.name, self.dir, self.component,
        )
    }
}
