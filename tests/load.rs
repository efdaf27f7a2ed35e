//! Loading zipped FMUs that cannot yield a Model-Exchange instance.

use std::{io::Write, path::PathBuf};

use fmivis::{
    driver::{DriverState, IntegrationDriver},
    import::{self, ExtractCache},
    Error,
};

mod common;

const FMI2_CO_SIMULATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<fmiModelDescription fmiVersion="2.0" modelName="Dahlquist" guid="{221063D2-EF4A-45FE-B954-B5BFEEA9A59B}" numberOfEventIndicators="0">
  <CoSimulation modelIdentifier="Dahlquist" canHandleVariableCommunicationStepSize="true"/>
  <ModelVariables>
    <ScalarVariable name="x" valueReference="1" causality="output">
      <Real/>
    </ScalarVariable>
  </ModelVariables>
  <ModelStructure>
    <Outputs>
      <Unknown index="1"/>
    </Outputs>
  </ModelStructure>
</fmiModelDescription>
"#;

const FMI2_MODEL_EXCHANGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<fmiModelDescription fmiVersion="2.0" modelName="Dahlquist" guid="{221063D2-EF4A-45FE-B954-B5BFEEA9A59B}" numberOfEventIndicators="0">
  <ModelExchange modelIdentifier="Dahlquist"/>
  <ModelVariables>
    <ScalarVariable name="x" valueReference="1" causality="output">
      <Real/>
    </ScalarVariable>
  </ModelVariables>
  <ModelStructure>
    <Outputs>
      <Unknown index="1"/>
    </Outputs>
  </ModelStructure>
</fmiModelDescription>
"#;

const FMI1_CO_SIMULATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<fmiModelDescription fmiVersion="1.0" modelName="cs" modelIdentifier="cs" guid="{0}">
  <ModelVariables/>
  <Implementation>
    <CoSimulation_StandAlone><Capabilities canHandleVariableCommunicationStepSize="true"/></CoSimulation_StandAlone>
  </Implementation>
</fmiModelDescription>
"#;

const FMI3: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<fmiModelDescription fmiVersion="3.0" modelName="Feedthrough" instantiationToken="{0}">
  <ModelExchange modelIdentifier="Feedthrough"/>
</fmiModelDescription>
"#;

/// Write a zip archive with the given entries.
fn write_fmu(dir: &tempfile::TempDir, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    let path = dir.path().join(name);
    let mut zip = zip::ZipWriter::new(std::fs::File::create(&path).unwrap());
    for (fname, contents) in entries {
        zip.start_file(*fname, zip::write::FileOptions::default())
            .unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    path
}

#[test_log::test]
fn test_co_simulation_fmi2_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fmu(&dir, "cs2.fmu", &[("modelDescription.xml", FMI2_CO_SIMULATION)]);
    let mut cache = ExtractCache::new().unwrap();

    let err = import::load(&path, &mut cache).err().unwrap();
    assert!(
        matches!(err, Error::UnsupportedFmuType(ref kind) if kind == "ModelExchange"),
        "{err:?}"
    );
}

#[test_log::test]
fn test_co_simulation_fmi1_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fmu(&dir, "cs1.fmu", &[("modelDescription.xml", FMI1_CO_SIMULATION)]);
    let mut cache = ExtractCache::new().unwrap();

    let err = import::load(&path, &mut cache).err().unwrap();
    assert!(matches!(err, Error::UnsupportedFmuType(_)), "{err:?}");
}

#[test]
fn test_failed_load_keeps_previous_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fmu(&dir, "cs2.fmu", &[("modelDescription.xml", FMI2_CO_SIMULATION)]);
    let mut cache = ExtractCache::new().unwrap();

    let mut driver = IntegrationDriver::new();
    driver.load(common::MockFmu::pendulum(), common::settings(0.0, 1.0, 0.1));
    driver.initialize().unwrap();

    assert!(import::load(&path, &mut cache).is_err());
    assert_eq!(driver.state(), DriverState::Initialized);
    assert_eq!(driver.simulate_step(0.0).unwrap(), 0.1);
}

#[test]
fn test_unsupported_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fmu(&dir, "fmi3.fmu", &[("modelDescription.xml", FMI3)]);
    let mut cache = ExtractCache::new().unwrap();

    let err = import::load(&path, &mut cache).err().unwrap();
    assert!(
        matches!(err, Error::UnsupportedFmiVersion(ref v) if v == "3.0"),
        "{err:?}"
    );
}

#[test]
fn test_missing_model_description() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fmu(&dir, "empty.fmu", &[("documentation/index.html", "<html/>")]);
    let mut cache = ExtractCache::new().unwrap();

    assert!(matches!(
        import::load(&path, &mut cache),
        Err(Error::ArchiveStructure(_))
    ));
    assert!(matches!(
        import::peek_descr(&path),
        Err(Error::ArchiveStructure(_))
    ));
}

#[test]
fn test_missing_shared_library() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fmu(&dir, "me2.fmu", &[("modelDescription.xml", FMI2_MODEL_EXCHANGE)]);
    let mut cache = ExtractCache::new().unwrap();

    assert!(import::load(&path, &mut cache).is_err());
}

#[test]
fn test_peek_descr() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fmu(&dir, "me2.fmu", &[("modelDescription.xml", FMI2_MODEL_EXCHANGE)]);

    let descr = import::peek_descr(&path).unwrap();
    assert_eq!(descr.fmi_version, "2.0");
    assert_eq!(descr.model_name, "Dahlquist");
}

#[test]
fn test_extract_once_per_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fmu(&dir, "me2.fmu", &[("modelDescription.xml", FMI2_MODEL_EXCHANGE)]);
    let other = write_fmu(&dir, "other.fmu", &[("modelDescription.xml", FMI2_MODEL_EXCHANGE)]);
    let mut cache = ExtractCache::with_dir(dir.path().join("cache")).unwrap();

    assert!(!cache.is_extracted(&path));
    let first = cache.extract(&path).unwrap();
    assert!(cache.is_extracted(&path));
    assert!(first.join("modelDescription.xml").is_file());
    assert!(first.starts_with(cache.root()));

    // A second extraction must not touch the files in place
    std::fs::write(first.join("marker"), "kept").unwrap();
    let second = cache.extract(&path).unwrap();
    assert_eq!(first, second);
    assert_eq!(std::fs::read_to_string(second.join("marker")).unwrap(), "kept");

    let third = cache.extract(&other).unwrap();
    assert_ne!(first, third);
}
