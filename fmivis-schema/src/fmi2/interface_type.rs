use hard_xml::XmlRead;

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "ModelExchange")]
pub struct ModelExchange {
    /// Short class name according to C-syntax, for example, "A_B_C". Used as prefix for FMI
    /// functions if the functions are provided in C source code or in static libraries, but not
    /// if the functions are provided by a DLL/SharedObject.
    #[xml(attr = "modelIdentifier")]
    pub model_identifier: String,

    #[xml(attr = "needsExecutionTool")]
    pub needs_execution_tool: Option<bool>,

    /// The FMU does not need `fmi2CompletedIntegratorStep` to be called.
    #[xml(attr = "completedIntegratorStepNotNeeded")]
    pub completed_integrator_step_not_needed: Option<bool>,

    #[xml(attr = "canBeInstantiatedOnlyOncePerProcess")]
    pub can_be_instantiated_only_once_per_process: Option<bool>,

    #[xml(attr = "canGetAndSetFMUstate")]
    pub can_get_and_set_fmu_state: Option<bool>,
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "CoSimulation")]
pub struct CoSimulation {
    #[xml(attr = "modelIdentifier")]
    pub model_identifier: String,

    #[xml(attr = "canHandleVariableCommunicationStepSize")]
    pub can_handle_variable_communication_step_size: Option<bool>,
}
