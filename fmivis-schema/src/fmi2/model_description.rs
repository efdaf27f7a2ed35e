use hard_xml::XmlRead;

use crate::{
    traits::FmiModelDescription,
    variable_counts::{Counts, VariableCounts},
};

use super::{
    Causality, CoSimulation, ModelExchange, ScalarVariable, ScalarVariableElement, Variability,
};

#[derive(Default, Debug, XmlRead)]
#[xml(tag = "fmiModelDescription")]
pub struct Fmi2ModelDescription {
    /// Version of FMI (Clarification for FMI 2.0.2: for FMI 2.0.x revisions fmiVersion is defined
    /// as "2.0").
    #[xml(attr = "fmiVersion")]
    pub fmi_version: String,

    /// The name of the model as used in the modeling environment that generated the XML file, such
    /// as Modelica.Mechanics.Rotational.Examples.CoupledClutches.
    #[xml(attr = "modelName")]
    pub model_name: String,

    /// Fingerprint of xml-file content to verify that xml-file and C-functions are compatible to
    /// each other
    #[xml(attr = "guid")]
    pub guid: String,

    #[xml(attr = "description")]
    pub description: Option<String>,

    /// Version of FMU, e.g., "1.4.1"
    #[xml(attr = "version")]
    pub version: Option<String>,

    #[xml(attr = "author")]
    pub author: Option<String>,

    #[xml(attr = "copyright")]
    pub copyright: Option<String>,

    #[xml(attr = "license")]
    pub license: Option<String>,

    /// Name of the tool that generated the XML file.
    #[xml(attr = "generationTool")]
    pub generation_tool: Option<String>,

    #[xml(attr = "generationDateAndTime")]
    pub generation_date_and_time: Option<String>,

    #[xml(attr = "variableNamingConvention")]
    pub variable_naming_convention: Option<String>,

    #[xml(attr = "numberOfEventIndicators", default)]
    pub number_of_event_indicators: u32,

    /// If present, the FMU is based on FMI for Model Exchange
    #[xml(child = "ModelExchange")]
    pub model_exchange: Option<ModelExchange>,

    /// If present, the FMU is based on FMI for Co-Simulation
    #[xml(child = "CoSimulation")]
    pub co_simulation: Option<CoSimulation>,

    #[xml(child = "LogCategories")]
    pub log_categories: Option<LogCategories>,

    #[xml(child = "DefaultExperiment")]
    pub default_experiment: Option<DefaultExperiment>,

    #[xml(child = "ModelVariables")]
    pub model_variables: ModelVariables,

    #[xml(child = "ModelStructure")]
    pub model_structure: ModelStructure,
}

impl Fmi2ModelDescription {
    /// Total number of variables
    pub fn num_variables(&self) -> usize {
        self.model_variables.variables.len()
    }

    /// Get the number of continuous states (and derivatives)
    pub fn num_states(&self) -> usize {
        self.model_structure
            .derivatives
            .as_ref()
            .map_or(0, |d| d.unknowns.len())
    }

    pub fn num_event_indicators(&self) -> usize {
        self.number_of_event_indicators as usize
    }

    /// Get an iterator over the ScalarVariables
    pub fn get_model_variables(&self) -> impl Iterator<Item = &ScalarVariable> {
        self.model_variables.variables.iter()
    }

    /// Look up a variable by its full name.
    pub fn model_variable_by_name(&self, name: &str) -> Result<&ScalarVariable, crate::Error> {
        self.get_model_variables()
            .find(|sv| sv.name == name)
            .ok_or_else(|| crate::Error::VariableNotFound(name.to_owned()))
    }

    /// Variables listed as derivatives in the `<ModelStructure>`, in state order.
    ///
    /// Indices in `<Unknown>` are 1-based into `<ModelVariables>`.
    pub fn derivatives(&self) -> Result<Vec<&ScalarVariable>, crate::Error> {
        self.model_structure
            .derivatives
            .iter()
            .flat_map(|d| d.unknowns.iter())
            .map(|unknown| {
                (unknown.index as usize)
                    .checked_sub(1)
                    .and_then(|idx| self.model_variables.variables.get(idx))
                    .ok_or_else(|| {
                        crate::Error::Model(format!(
                            "Derivative index {} out of range in {}",
                            unknown.index, self.model_name
                        ))
                    })
            })
            .collect()
    }
}

impl FmiModelDescription for Fmi2ModelDescription {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn version_string(&self) -> &str {
        &self.fmi_version
    }
}

impl crate::traits::DefaultExperiment for Fmi2ModelDescription {
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
        self.default_experiment.as_ref().and_then(|de| de.step_size)
    }
}

impl VariableCounts for Fmi2ModelDescription {
    fn model_counts(&self) -> Counts {
        self.get_model_variables()
            .fold(Counts::default(), |mut counts, sv| {
                match sv.variability {
                    Variability::Constant => counts.constants += 1,
                    Variability::Fixed | Variability::Tunable => counts.parameters += 1,
                    Variability::Discrete => counts.discrete += 1,
                    Variability::Continuous => counts.continuous += 1,
                }
                match sv.causality {
                    Causality::Input => counts.inputs += 1,
                    Causality::Output => counts.outputs += 1,
                    Causality::Local => counts.locals += 1,
                    Causality::Independent => counts.independent += 1,
                    Causality::Parameter | Causality::CalculatedParameter => {}
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
#[xml(tag = "Category")]
pub struct Category {
    #[xml(attr = "name")]
    pub name: String,
    #[xml(attr = "description")]
    pub description: Option<String>,
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "LogCategories")]
pub struct LogCategories {
    #[xml(child = "Category")]
    pub categories: Vec<Category>,
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
    #[xml(attr = "stepSize")]
    pub step_size: Option<f64>,
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "ModelVariables")]
pub struct ModelVariables {
    #[xml(child = "ScalarVariable")]
    pub variables: Vec<ScalarVariable>,
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "Unknown")]
pub struct Unknown {
    /// 1-based index of the ScalarVariable in `<ModelVariables>`
    #[xml(attr = "index")]
    pub index: u32,
    #[xml(attr = "dependencies")]
    pub dependencies: Option<String>,
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "Outputs")]
pub struct Outputs {
    #[xml(child = "Unknown")]
    pub unknowns: Vec<Unknown>,
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "Derivatives")]
pub struct Derivatives {
    #[xml(child = "Unknown")]
    pub unknowns: Vec<Unknown>,
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "InitialUnknowns")]
pub struct InitialUnknowns {
    #[xml(child = "Unknown")]
    pub unknowns: Vec<Unknown>,
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "ModelStructure")]
pub struct ModelStructure {
    #[xml(child = "Outputs")]
    pub outputs: Option<Outputs>,
    #[xml(child = "Derivatives")]
    pub derivatives: Option<Derivatives>,
    #[xml(child = "InitialUnknowns")]
    pub initial_unknowns: Option<InitialUnknowns>,
}
