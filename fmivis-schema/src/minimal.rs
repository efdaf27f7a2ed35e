//! Minimal FMI definitions for determining FMI version.

use std::str::FromStr;

use hard_xml::XmlRead;

use crate::traits::FmiModelDescription;

/// A minimal model description that only contains the FMI version
/// This is used to determine the FMI version of the FMU
#[derive(Default, PartialEq, Debug, XmlRead)]
#[xml(tag = "fmiModelDescription")]
pub struct ModelDescription {
    #[xml(attr = "fmiVersion")]
    pub fmi_version: String,
    #[xml(attr = "modelName")]
    pub model_name: String,
}

impl FmiModelDescription for ModelDescription {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn version_string(&self) -> &str {
        &self.fmi_version
    }
}

impl FromStr for ModelDescription {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::deserialize(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MajorVersion;

    #[test]
    fn test_minimal_fmi1() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<fmiModelDescription fmiVersion="1.0" modelName="Pendulum" modelIdentifier="Pendulum"
    guid="{1234}" numberOfContinuousStates="2" numberOfEventIndicators="0">
  <ModelVariables>
    <ScalarVariable name="phi" valueReference="0"><Real start="1.0"/></ScalarVariable>
  </ModelVariables>
</fmiModelDescription>"#;
        let md = <ModelDescription as FromStr>::from_str(xml).unwrap();
        assert_eq!(md.model_name, "Pendulum");
        assert_eq!(md.major_version().unwrap(), MajorVersion::FMI1);
    }

    #[test]
    fn test_minimal_unknown_major() {
        let md = ModelDescription {
            fmi_version: "7.1".to_owned(),
            model_name: "Future".to_owned(),
        };
        assert_eq!(md.major_version(), Err(crate::Error::UnknownVersion(7)));
    }
}
