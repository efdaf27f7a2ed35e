//! Extraction of FMU archives and dispatch on the declared FMI version.

use std::{
    collections::HashMap,
    io::Read,
    path::{Path, PathBuf},
    str::FromStr,
};

use fmivis_schema::{
    minimal::ModelDescription as MinModel, traits::FmiModelDescription, MajorVersion,
};

use crate::{handle::FmuHandle, Error};

const MODEL_DESCRIPTION: &str = "modelDescription.xml";

#[derive(Debug)]
enum CacheRoot {
    Temp(tempfile::TempDir),
    Dir(PathBuf),
}

/// The unzip cache of one session.
///
/// A model file extracted once is never extracted again while the cache lives, so the shared
/// object of a running instance is never overwritten.
#[derive(Debug)]
pub struct ExtractCache {
    root: CacheRoot,
    /// Canonical model file path -> extraction directory
    extracted: HashMap<PathBuf, PathBuf>,
}

impl ExtractCache {
    /// A cache in a fresh temporary directory, removed when the cache is dropped.
    pub fn new() -> Result<Self, Error> {
        let temp_dir = tempfile::Builder::new().prefix("fmivis").tempdir()?;
        log::debug!("Using unzip cache {temp_dir:?}");
        Ok(Self {
            root: CacheRoot::Temp(temp_dir),
            extracted: HashMap::new(),
        })
    }

    /// A cache rooted at a user-supplied directory, which is created if missing and kept.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        log::debug!("Using unzip cache {dir:?}");
        Ok(Self {
            root: CacheRoot::Dir(dir),
            extracted: HashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        match &self.root {
            CacheRoot::Temp(dir) => dir.path(),
            CacheRoot::Dir(dir) => dir,
        }
    }

    pub fn is_extracted(&self, model_file: impl AsRef<Path>) -> bool {
        std::fs::canonicalize(model_file)
            .map(|path| self.extracted.contains_key(&path))
            .unwrap_or(false)
    }

    /// Extract `model_file` unless it was already extracted, returning the extraction directory.
    pub fn extract(&mut self, model_file: impl AsRef<Path>) -> Result<PathBuf, Error> {
        let key = std::fs::canonicalize(model_file.as_ref())?;
        if let Some(dir) = self.extracted.get(&key) {
            log::debug!("{key:?} already extracted into {dir:?}");
            return Ok(dir.clone());
        }

        let stem = key
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("model");
        let dir = self
            .root()
            .join(format!("{stem}-{}", self.extracted.len()));

        let file = std::fs::File::open(&key)?;
        let mut archive = zip::ZipArchive::new(file)?;
        log::debug!("Extracting {key:?} into {dir:?}");
        archive.extract(&dir)?;

        for fname in archive.file_names() {
            log::trace!("  - {}", fname);
        }

        self.extracted.insert(key, dir.clone());
        Ok(dir)
    }
}

/// Read the minimal model description straight from the archive, without extracting it.
pub fn peek_descr(model_file: impl AsRef<Path>) -> Result<MinModel, Error> {
    let file = std::fs::File::open(model_file.as_ref())?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut descr_xml = String::new();
    archive
        .by_name(MODEL_DESCRIPTION)
        .map_err(|_| Error::ArchiveStructure(format!("{MODEL_DESCRIPTION} not found")))?
        .read_to_string(&mut descr_xml)?;
    Ok(MinModel::from_str(&descr_xml)?)
}

/// Load a zipped Model-Exchange FMU.
///
/// The archive is extracted through `cache`, the model description parsed and the shared
/// library loaded. Co-Simulation-only units, unsupported versions and libraries that fail to
/// load are rejected; no instance exists until [`FmuHandle::initialize`].
pub fn load(
    model_file: impl AsRef<Path>,
    cache: &mut ExtractCache,
) -> Result<Box<dyn FmuHandle>, Error> {
    log::debug!("Opening FMU file {:?}", model_file.as_ref());
    let dir = cache.extract(model_file)?;

    let descr_file_path = dir.join(MODEL_DESCRIPTION);
    if !descr_file_path.is_file() {
        return Err(Error::ArchiveStructure(format!(
            "{MODEL_DESCRIPTION} not found"
        )));
    }
    let descr_xml = std::fs::read_to_string(descr_file_path)?;

    // Initial non-version-specific model description
    let descr = MinModel::from_str(&descr_xml)?;
    log::debug!(
        "Found FMI {} named '{}'",
        descr.fmi_version,
        descr.model_name
    );

    #[allow(unreachable_patterns)]
    match descr.major_version()? {
        #[cfg(feature = "fmi1")]
        MajorVersion::FMI1 => crate::fmi1::Fmi1Fmu::new(dir, &descr_xml)
            .map(|fmu| Box::new(fmu) as Box<dyn FmuHandle>),

        #[cfg(feature = "fmi2")]
        MajorVersion::FMI2 => crate::fmi2::Fmi2Fmu::new(dir, &descr_xml)
            .map(|fmu| Box::new(fmu) as Box<dyn FmuHandle>),

        _ => Err(Error::UnsupportedFmiVersion(descr.fmi_version)),
    }
}

/// Relative path of the shared library inside an extracted FMU.
pub(crate) fn shared_lib_path(model_identifier: &str) -> Result<PathBuf, Error> {
    let platform_folder = match (std::env::consts::OS, std::env::consts::ARCH) {
        ("windows", "x86_64") => "win64",
        ("windows", "x86") => "win32",
        ("linux", "x86_64") => "linux64",
        ("linux", "x86") => "linux32",
        ("macos", "x86_64") => "darwin64",
        ("macos", "x86") => "darwin32",
        _ => {
            return Err(Error::UnsupportedPlatform {
                os: std::env::consts::OS.to_string(),
                arch: std::env::consts::ARCH.to_string(),
            });
        }
    };
    let fname = format!("{model_identifier}{}", std::env::consts::DLL_SUFFIX);
    Ok(PathBuf::from("binaries").join(platform_folder).join(fname))
}
