//! The `fmivis` crate drives a live Model-Exchange simulation of an FMI 1.0 or 2.0 FMU for a
//! multibody visualizer.
//!
//! A periodic tick calls [`time::TimeManager::scene_update`], which steps the
//! [`driver::IntegrationDriver`] until simulated time reaches the next visualization time. The
//! driver advances the FMU with a fixed-step forward Euler integrator, handles time and state
//! events, and pushes the current values of the [`input`] bridge. Afterwards the cached value
//! references of the [`visual`] bindings are read back for rendering.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use fmivis::{
//!     driver::IntegrationDriver,
//!     handle::FmuHandle,
//!     import::{self, ExtractCache},
//!     settings::{SimOptions, SimulationSettings},
//!     time::{PlaybackMode, TimeManager},
//! };
//!
//! let mut cache = ExtractCache::new().unwrap();
//! let fmu = import::load("path/to/model.fmu", &mut cache).unwrap();
//! let settings =
//!     SimulationSettings::new_from_options(&SimOptions::default(), &fmu.default_experiment())
//!         .unwrap();
//!
//! let mut time = TimeManager::from_settings(&settings, 0.1, PlaybackMode::Live).unwrap();
//! let mut driver = IntegrationDriver::new();
//! driver.load(fmu, settings);
//! driver.initialize().unwrap();
//!
//! time.start_visualization();
//! while !time.is_paused() {
//!     time.scene_update(&mut driver).unwrap();
//! }
//! ```
//!
//! ## Feature flags
#![doc = document_features::document_features!()]
#![deny(clippy::all)]

// Re-export the schema crate
pub use fmivis_schema as schema;

mod event_info;
mod status;

pub mod driver;
#[cfg(feature = "fmi1")]
pub mod fmi1;
#[cfg(feature = "fmi2")]
pub mod fmi2;
pub mod handle;
pub mod import;
pub mod input;
pub mod logging;
pub mod settings;
pub mod time;
pub mod visual;

pub use event_info::EventInfo;
pub use status::{FmiError, FmiRes, Status};

pub mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Error instantiating model {0}")]
    Instantiation(String),

    #[error("Model is already instantiated")]
    AlreadyInitialized,

    #[error("Unknown variable: {}", name)]
    UnknownVariable { name: String },

    #[error("Model type {0} not supported by this FMU")]
    UnsupportedFmuType(String),

    #[error("Unsupported platform {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Unsupported FMI version: {0}")]
    UnsupportedFmiVersion(String),

    #[error("FMU archive structure is not as expected: {0}")]
    ArchiveStructure(String),

    #[error("Invalid simulation settings: {0}")]
    InvalidSettings(String),

    #[error("Cannot {operation} while the driver is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: driver::DriverState,
    },

    #[error("Visualization time can only be set when playing back a result file")]
    SeekInLiveMode,

    #[error("{call} failed")]
    Fmi {
        call: &'static str,
        #[source]
        source: FmiError,
    },

    #[error(transparent)]
    Input(#[from] input::InputError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Schema(#[from] fmivis_schema::Error),

    #[error(transparent)]
    LibLoading {
        #[from]
        source: libloading::Error,
    },
}

impl Error {
    /// Attach the name of the failing FMI call to a normalized status error.
    pub(crate) fn fmi(call: &'static str) -> impl FnOnce(FmiError) -> Self {
        move |source| Error::Fmi { call, source }
    }
}
