use std::{fmt::Display, str::FromStr};

use hard_xml::XmlRead;

/// FMI 1.0 causality. `internal` is the default.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum Causality {
    Input,
    Output,
    #[default]
    Internal,
    None,
}

impl FromStr for Causality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(Causality::Input),
            "output" => Ok(Causality::Output),
            "internal" => Ok(Causality::Internal),
            "none" => Ok(Causality::None),
            _ => Err(format!("Invalid Causality: {s}")),
        }
    }
}

impl Display for Causality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Causality::Input => "input",
            Causality::Output => "output",
            Causality::Internal => "internal",
            Causality::None => "none",
        };
        write!(f, "{s}")
    }
}

/// FMI 1.0 variability. `continuous` is the default.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum Variability {
    Constant,
    Parameter,
    Discrete,
    #[default]
    Continuous,
}

impl FromStr for Variability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "constant" => Ok(Variability::Constant),
            "parameter" => Ok(Variability::Parameter),
            "discrete" => Ok(Variability::Discrete),
            "continuous" => Ok(Variability::Continuous),
            _ => Err(format!("Invalid Variability: {s}")),
        }
    }
}

/// Alias relation of a variable to the variable that owns its value reference.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum Alias {
    #[default]
    NoAlias,
    Alias,
    NegatedAlias,
}

impl FromStr for Alias {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "noAlias" => Ok(Alias::NoAlias),
            "alias" => Ok(Alias::Alias),
            "negatedAlias" => Ok(Alias::NegatedAlias),
            _ => Err(format!("Invalid Alias: {s}")),
        }
    }
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "Real")]
pub struct Real {
    #[xml(attr = "declaredType")]
    pub declared_type: Option<String>,
    #[xml(attr = "unit")]
    pub unit: Option<String>,
    #[xml(attr = "start")]
    pub start: Option<f64>,
    /// If true, `start` is the initial value; otherwise a guess value.
    #[xml(attr = "fixed")]
    pub fixed: Option<bool>,
    #[xml(attr = "nominal")]
    pub nominal: Option<f64>,
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "Integer")]
pub struct Integer {
    #[xml(attr = "declaredType")]
    pub declared_type: Option<String>,
    #[xml(attr = "start")]
    pub start: Option<i32>,
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "Boolean")]
pub struct Boolean {
    #[xml(attr = "declaredType")]
    pub declared_type: Option<String>,
    #[xml(attr = "start")]
    pub start: Option<bool>,
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "String")]
pub struct StringElement {
    #[xml(attr = "declaredType")]
    pub declared_type: Option<String>,
    #[xml(attr = "start")]
    pub start: Option<String>,
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "Enumeration")]
pub struct Enumeration {
    #[xml(attr = "declaredType")]
    pub declared_type: Option<String>,
    #[xml(attr = "start")]
    pub start: Option<i32>,
}

#[derive(Clone, PartialEq, Debug, XmlRead)]
pub enum ScalarVariableElement {
    #[xml(tag = "Real")]
    Real(Real),
    #[xml(tag = "Integer")]
    Integer(Integer),
    #[xml(tag = "Boolean")]
    Boolean(Boolean),
    #[xml(tag = "String")]
    String(StringElement),
    #[xml(tag = "Enumeration")]
    Enumeration(Enumeration),
}

impl Default for ScalarVariableElement {
    fn default() -> Self {
        Self::Real(Real::default())
    }
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "ScalarVariable")]
pub struct ScalarVariable {
    /// The full, unique name of the variable.
    #[xml(attr = "name")]
    pub name: String,

    /// A handle of the variable to efficiently identify the variable value in the model
    /// interface. Aliases share the value reference of the variable they alias.
    #[xml(attr = "valueReference")]
    pub value_reference: u32,

    #[xml(attr = "description")]
    pub description: Option<String>,

    #[xml(attr = "causality", default)]
    pub causality: Causality,

    #[xml(attr = "variability", default)]
    pub variability: Variability,

    #[xml(attr = "alias", default)]
    pub alias: Alias,

    #[xml(
        child = "Real",
        child = "Integer",
        child = "Boolean",
        child = "String",
        child = "Enumeration"
    )]
    pub elem: ScalarVariableElement,
}

impl ScalarVariable {
    pub fn is_input(&self) -> bool {
        self.causality == Causality::Input
    }
}
