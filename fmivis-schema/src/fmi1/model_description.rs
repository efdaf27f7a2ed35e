use hard_xml::XmlRead;

use crate::{
    traits::FmiModelDescription,
    variable_counts::{Counts, VariableCounts},
};

use super::{Causality, ScalarVariable, ScalarVariableElement, Variability};

#[derive(Default, Debug, XmlRead)]
#[xml(tag = "fmiModelDescription")]
pub struct Fmi1ModelDescription {
    /// Version of FMI, "1.0" for this model description.
    #[xml(attr = "fmiVersion")]
    pub fmi_version: String,

    /// The name of the model as used in the modeling environment that generated the XML file.
    #[xml(attr = "modelName")]
    pub model_name: String,

    /// Short class name of the model; prefixes every C function name of the shared library.
    #[xml(attr = "modelIdentifier")]
    pub model_identifier: String,

    /// Fingerprint of xml-file content to verify that xml-file and C-functions are compatible
    #[xml(attr = "guid")]
    pub guid: String,

    #[xml(attr = "description")]
    pub description: Option<String>,

    #[xml(attr = "author")]
    pub author: Option<String>,

    #[xml(attr = "version")]
    pub version: Option<String>,

    #[xml(attr = "generationTool")]
    pub generation_tool: Option<String>,

    #[xml(attr = "generationDateAndTime")]
    pub generation_date_and_time: Option<String>,

    #[xml(attr = "variableNamingConvention")]
    pub variable_naming_convention: Option<String>,

    #[xml(attr = "numberOfContinuousStates", default)]
    pub number_of_continuous_states: u32,

    #[xml(attr = "numberOfEventIndicators", default)]
    pub number_of_event_indicators: u32,

    #[xml(child = "DefaultExperiment")]
    pub default_experiment: Option<DefaultExperiment>,

    #[xml(child = "ModelVariables")]
    pub model_variables: Option<ModelVariables>,

    /// Only present for FMI 1.0 Co-Simulation units.
    #[xml(child = "Implementation")]
    pub implementation: Option<Implementation>,
}

impl Fmi1ModelDescription {
    /// Get the number of continuous states (and derivatives)
    pub fn num_states(&self) -> usize {
        self.number_of_continuous_states as usize
    }

    pub fn num_event_indicators(&self) -> usize {
        self.number_of_event_indicators as usize
    }

    /// True if the description declares a Co-Simulation implementation.
    pub fn is_co_simulation(&self) -> bool {
        self.implementation.is_some()
    }

    /// Get an iterator over the ScalarVariables
    pub fn get_model_variables(&self) -> impl Iterator<Item = &ScalarVariable> {
        self.model_variables
            .iter()
            .flat_map(|mv| mv.variables.iter())
    }

    /// Look up a variable by its full name.
    pub fn model_variable_by_name(&self, name: &str) -> Result<&ScalarVariable, crate::Error> {
        self.get_model_variables()
            .find(|sv| sv.name == name)
            .ok_or_else(|| crate::Error::VariableNotFound(name.to_owned()))
    }
}

impl FmiModelDescription for Fmi1ModelDescription {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn version_string(&self) -> &str {
        &self.fmi_version
    }
}

impl crate::traits::DefaultExperiment for Fmi1ModelDescription {
    fn start_time(&self) -> Option<f64> {
        self.default_experiment.as_ref().and_then(|de| de.start_time)
    }

    fn stop_time(&self) -> Option<f64> {
        self.default_experiment.as_ref().and_then(|de| de.stop_time)
    }

    fn tolerance(&self) -> Option<f64> {
        self.default_experiment.as_ref().and_then(|de| de.tolerance)
    }

    fn step_size(&self) -> Option<f64> {
        None
    }
}

impl VariableCounts for Fmi1ModelDescription {
    fn model_counts(&self) -> Counts {
        self.get_model_variables()
            .fold(Counts::default(), |mut counts, sv| {
                match sv.variability {
                    Variability::Constant => counts.constants += 1,
                    Variability::Parameter => counts.parameters += 1,
                    Variability::Discrete => counts.discrete += 1,
                    Variability::Continuous => counts.continuous += 1,
                }
                match sv.causality {
                    Causality::Input => counts.inputs += 1,
                    Causality::Output => counts.outputs += 1,
                    Causality::Internal => counts.locals += 1,
                    Causality::None => {}
                }
                match sv.elem {
                    ScalarVariableElement::Real(_) => counts.reals += 1,
                    ScalarVariableElement::Integer(_) => counts.integers += 1,
                    ScalarVariableElement::Boolean(_) => counts.booleans += 1,
                    ScalarVariableElement::String(_) => counts.strings += 1,
                    ScalarVariableElement::Enumeration(_) => counts.enumerations += 1,
                }
                counts
            })
    }
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "DefaultExperiment")]
pub struct DefaultExperiment {
    #[xml(attr = "startTime")]
    pub start_time: Option<f64>,
    #[xml(attr = "stopTime")]
    pub stop_time: Option<f64>,
    #[xml(attr = "tolerance")]
    pub tolerance: Option<f64>,
}

impl crate::traits::DefaultExperiment for DefaultExperiment {
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
        None
    }
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "ModelVariables")]
pub struct ModelVariables {
    #[xml(child = "ScalarVariable")]
    pub variables: Vec<ScalarVariable>,
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "Implementation")]
pub struct Implementation {
    #[xml(child = "CoSimulation_StandAlone")]
    pub stand_alone: Option<CoSimulationStandAlone>,
    #[xml(child = "CoSimulation_Tool")]
    pub tool: Option<CoSimulationTool>,
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "CoSimulation_StandAlone")]
pub struct CoSimulationStandAlone {
    #[xml(child = "Capabilities")]
    pub capabilities: Option<Capabilities>,
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "CoSimulation_Tool")]
pub struct CoSimulationTool {
    #[xml(child = "Capabilities")]
    pub capabilities: Option<Capabilities>,
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "Capabilities")]
pub struct Capabilities {
    #[xml(attr = "canHandleVariableCommunicationStepSize")]
    pub can_handle_variable_communication_step_size: Option<bool>,
    #[xml(attr = "canInterpolateInputs")]
    pub can_interpolate_inputs: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::DefaultExperiment as _;

    const BOUNCING_BALL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<fmiModelDescription
  fmiVersion="1.0"
  modelName="bouncingBall"
  modelIdentifier="bouncingBall"
  guid="{8c4e810f-3df3-4a00-8276-176fa3c9f003}"
  numberOfContinuousStates="2"
  numberOfEventIndicators="1">
  <DefaultExperiment startTime="0.0" stopTime="3.0" tolerance="0.0001"/>
  <ModelVariables>
    <ScalarVariable name="h" valueReference="0" description="height of the ball"><Real start="1" fixed="true"/></ScalarVariable>
    <ScalarVariable name="der(h)" valueReference="1"><Real/></ScalarVariable>
    <ScalarVariable name="v" valueReference="2"><Real start="0" fixed="true"/></ScalarVariable>
    <ScalarVariable name="der(v)" valueReference="3"><Real/></ScalarVariable>
    <ScalarVariable name="g" valueReference="4" variability="parameter"><Real start="9.81"/></ScalarVariable>
    <ScalarVariable name="e" valueReference="5" variability="parameter"><Real start="0.7"/></ScalarVariable>
    <ScalarVariable name="kick" valueReference="0" causality="input" variability="discrete"><Boolean start="false"/></ScalarVariable>
  </ModelVariables>
</fmiModelDescription>"#;

    #[test_log::test]
    fn test_model_description() {
        let md: Fmi1ModelDescription = crate::deserialize(BOUNCING_BALL).unwrap();
        assert_eq!(md.fmi_version, "1.0");
        assert_eq!(md.model_identifier, "bouncingBall");
        assert_eq!(md.num_states(), 2);
        assert_eq!(md.num_event_indicators(), 1);
        assert!(!md.is_co_simulation());
        assert_eq!(md.start_time(), Some(0.0));
        assert_eq!(md.stop_time(), Some(3.0));
        assert_eq!(md.tolerance(), Some(0.0001));
        assert_eq!(md.get_model_variables().count(), 7);
        assert_eq!(md.model_variable_by_name("v").unwrap().value_reference, 2);
        assert_eq!(
            md.model_variable_by_name("w"),
            Err(crate::Error::VariableNotFound("w".to_owned()))
        );

        let counts = md.model_counts();
        assert_eq!(counts.parameters, 2);
        assert_eq!(counts.inputs, 1);
        assert_eq!(counts.booleans, 1);
        assert_eq!(counts.reals, 6);
    }

    #[test]
    fn test_co_simulation() {
        let xml = r#"<fmiModelDescription fmiVersion="1.0" modelName="cs" modelIdentifier="cs" guid="{0}">
  <ModelVariables/>
  <Implementation>
    <CoSimulation_StandAlone><Capabilities canHandleVariableCommunicationStepSize="true"/></CoSimulation_StandAlone>
  </Implementation>
</fmiModelDescription>"#;
        let md: Fmi1ModelDescription = crate::deserialize(xml).unwrap();
        assert!(md.is_co_simulation());
        assert_eq!(md.num_states(), 0);
    }
}
