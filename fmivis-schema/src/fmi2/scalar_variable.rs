use std::str::FromStr;

use hard_xml::XmlRead;

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum Causality {
    Parameter,
    CalculatedParameter,
    Input,
    Output,
    #[default]
    Local,
    Independent,
}

impl FromStr for Causality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parameter" => Ok(Causality::Parameter),
            "calculatedParameter" => Ok(Causality::CalculatedParameter),
            "input" => Ok(Causality::Input),
            "output" => Ok(Causality::Output),
            "local" => Ok(Causality::Local),
            "independent" => Ok(Causality::Independent),
            _ => Err(format!("Invalid Causality: {s}")),
        }
    }
}

/// Enumeration that defines the time dependency of the variable, in other words it defines the
/// time instants when a variable can change its value.
///
/// The default is [`Variability::Continuous`].
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum Variability {
    /// The value of the variable never changes.
    Constant,
    /// The value of the variable is fixed after initialization.
    Fixed,
    /// The value of the variable is constant between external events.
    Tunable,
    /// The value of the variable is constant between external and internal events.
    Discrete,
    /// Only a variable of type = "Real" can be "continuous".
    #[default]
    Continuous,
}

impl FromStr for Variability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "constant" => Ok(Variability::Constant),
            "fixed" => Ok(Variability::Fixed),
            "tunable" => Ok(Variability::Tunable),
            "discrete" => Ok(Variability::Discrete),
            "continuous" => Ok(Variability::Continuous),
            _ => Err(format!("Invalid Variability: {s}")),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Initial {
    Exact,
    Approx,
    Calculated,
}

impl FromStr for Initial {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Initial::Exact),
            "approx" => Ok(Initial::Approx),
            "calculated" => Ok(Initial::Calculated),
            _ => Err(format!("Invalid Initial: {s}")),
        }
    }
}

#[derive(Clone, Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "Real")]
pub struct Real {
    /// If present, name of type defined with TypeDefinitions / SimpleType providing defaults.
    #[xml(attr = "declaredType")]
    pub declared_type: Option<String>,

    #[xml(attr = "unit")]
    pub unit: Option<String>,

    /// Value before initialization, if initial=exact or approx.
    #[xml(attr = "start")]
    pub start: Option<f64>,

    /// If present, this variable is the derivative of variable with ScalarVariable index
    /// "derivative".
    #[xml(attr = "derivative")]
    pub derivative: Option<u32>,

    /// Only for ModelExchange and if variable is a continuous-time state: if true, the state can
    /// be reinitialized at an event by the FMU.
    #[xml(attr = "reinit")]
    pub reinit: Option<bool>,
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
    pub declared_type: String,
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

    /// A handle of the variable to efficiently identify the variable value in the model interface.
    #[xml(attr = "valueReference")]
    pub value_reference: u32,

    /// An optional description string describing the meaning of the variable.
    #[xml(attr = "description")]
    pub description: Option<String>,

    /// Enumeration that defines the causality of the variable.
    #[xml(attr = "causality", default)]
    pub causality: Causality,

    /// Enumeration that defines the time dependency of the variable
    #[xml(attr = "variability", default)]
    pub variability: Variability,

    #[xml(attr = "initial")]
    pub initial: Option<Initial>,

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
