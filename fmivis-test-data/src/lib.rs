#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(clippy::all)]

use std::io::Write;

use anyhow::Context;
use fmivis_schema::MajorVersion;
use tempfile::NamedTempFile;

/// Model description of the FMI 1.0 build
pub const BOUNCING_BALL_FMI1: &str = include_str!("../models/fmi1/modelDescription.xml");
/// Model description of the FMI 2.0 build
pub const BOUNCING_BALL_FMI2: &str = include_str!("../models/fmi2/modelDescription.xml");

const LIB_FMI1: Option<&str> = option_env!("FMIVIS_BOUNCING_BALL_FMI1");
const LIB_FMI2: Option<&str> = option_env!("FMIVIS_BOUNCING_BALL_FMI2");

/// Value references shared by both builds
pub mod vr {
    pub const H: u32 = 1;
    pub const V: u32 = 3;
    pub const G: u32 = 5;
    pub const E: u32 = 6;
    /// Counts the discrete-update calls made by the importer
    pub const UPDATES: u32 = 7;
}

/// Pack the BouncingBall model of `version` into a zipped FMU in a temporary file.
///
/// Every event takes exactly two discrete-update passes, so `UPDATES` tells how often the
/// importer iterated.
pub fn bouncing_ball(version: MajorVersion) -> anyhow::Result<NamedTempFile> {
    let (descr, lib) = match version {
        MajorVersion::FMI1 => (BOUNCING_BALL_FMI1, LIB_FMI1),
        MajorVersion::FMI2 => (BOUNCING_BALL_FMI2, LIB_FMI2),
        MajorVersion::FMI3 => anyhow::bail!("No FMI {version} build of BouncingBall"),
    };
    let lib = lib.context("BouncingBall is only built for x86_64 Linux")?;
    let binary = std::fs::read(lib).with_context(|| format!("Read {lib}"))?;

    let mut fout = tempfile::Builder::new()
        .prefix("BouncingBall")
        .suffix(".fmu")
        .tempfile()?;
    {
        let mut zip = zip::ZipWriter::new(fout.as_file_mut());
        let options = zip::write::FileOptions::default();
        zip.start_file("modelDescription.xml", options)?;
        zip.write_all(descr.as_bytes())?;
        zip.add_directory("resources/", options)?;
        zip.start_file("binaries/linux64/BouncingBall.so", options)?;
        zip.write_all(&binary)?;
        zip.finish()?;
    }
    Ok(fout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptions_parse() {
        let md: fmivis_schema::fmi1::Fmi1ModelDescription =
            fmivis_schema::deserialize(BOUNCING_BALL_FMI1).unwrap();
        assert_eq!(md.model_identifier, "BouncingBall");
        assert_eq!(md.num_states(), 2);

        let md: fmivis_schema::fmi2::Fmi2ModelDescription =
            fmivis_schema::deserialize(BOUNCING_BALL_FMI2).unwrap();
        assert_eq!(md.num_states(), 2);
        assert_eq!(md.num_event_indicators(), 1);
        assert_eq!(
            md.model_variable_by_name("updates").unwrap().value_reference,
            vr::UPDATES
        );
    }

    #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
    #[test]
    fn test_archive_layout() {
        let fmu = bouncing_ball(MajorVersion::FMI2).unwrap();
        let archive = zip::ZipArchive::new(std::fs::File::open(fmu.path()).unwrap()).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"modelDescription.xml"));
        assert!(names.contains(&"binaries/linux64/BouncingBall.so"));
    }

    #[test]
    fn test_no_fmi3_build() {
        assert!(bouncing_ball(MajorVersion::FMI3).is_err());
    }
}
