//! FMI 1.0 Model-Exchange types and functions.
//!
//! Every function exported by an FMI 1.0 shared library is prefixed with the model identifier,
//! see [`Fmi1Binding::new`].
#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(clippy::too_many_arguments)]

use std::os::raw::{c_char, c_int, c_uint, c_void};

pub mod logger;

pub type fmiComponent = *mut c_void;
pub type fmiValueReference = c_uint;
pub type fmiReal = f64;
pub type fmiInteger = c_int;
pub type fmiBoolean = c_char;
pub type fmiString = *const c_char;

pub const fmiTrue: fmiBoolean = 1;
pub const fmiFalse: fmiBoolean = 0;
pub const fmiUndefinedValueReference: fmiValueReference = fmiValueReference::MAX;

pub type fmiStatus = c_int;
pub const fmiStatus_fmiOK: fmiStatus = 0;
pub const fmiStatus_fmiWarning: fmiStatus = 1;
pub const fmiStatus_fmiDiscard: fmiStatus = 2;
pub const fmiStatus_fmiError: fmiStatus = 3;
pub const fmiStatus_fmiFatal: fmiStatus = 4;

pub type fmiCallbackLogger = Option<
    unsafe extern "C" fn(
        c: fmiComponent,
        instanceName: fmiString,
        status: fmiStatus,
        category: fmiString,
        message: fmiString,
        ...
    ),
>;
pub type fmiCallbackAllocateMemory =
    Option<unsafe extern "C" fn(nobj: usize, size: usize) -> *mut c_void>;
pub type fmiCallbackFreeMemory = Option<unsafe extern "C" fn(obj: *mut c_void)>;

/// Passed by value to `fmiInstantiateModel`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct fmiCallbackFunctions {
    pub logger: fmiCallbackLogger,
    pub allocateMemory: fmiCallbackAllocateMemory,
    pub freeMemory: fmiCallbackFreeMemory,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct fmiEventInfo {
    pub iterationConverged: fmiBoolean,
    pub stateValueReferencesChanged: fmiBoolean,
    pub stateValuesChanged: fmiBoolean,
    pub terminateSimulation: fmiBoolean,
    pub upcomingTimeEvent: fmiBoolean,
    pub nextEventTime: fmiReal,
}

dynamic_binding! {
    /// The FMI 1.0 Model-Exchange function table of one loaded shared library.
    pub struct Fmi1Binding {
        fn fmiGetModelTypesPlatform() -> *const c_char;
        fn fmiGetVersion() -> *const c_char;
        fn fmiInstantiateModel(
            instanceName: fmiString,
            GUID: fmiString,
            functions: fmiCallbackFunctions,
            loggingOn: fmiBoolean,
        ) -> fmiComponent;
        fn fmiFreeModelInstance(c: fmiComponent);
        fn fmiSetDebugLogging(c: fmiComponent, loggingOn: fmiBoolean) -> fmiStatus;
        fn fmiSetTime(c: fmiComponent, time: fmiReal) -> fmiStatus;
        fn fmiSetContinuousStates(c: fmiComponent, x: *const fmiReal, nx: usize) -> fmiStatus;
        fn fmiCompletedIntegratorStep(c: fmiComponent, callEventUpdate: *mut fmiBoolean) -> fmiStatus;
        fn fmiSetReal(c: fmiComponent, vr: *const fmiValueReference, nvr: usize, value: *const fmiReal) -> fmiStatus;
        fn fmiSetInteger(c: fmiComponent, vr: *const fmiValueReference, nvr: usize, value: *const fmiInteger) -> fmiStatus;
        fn fmiSetBoolean(c: fmiComponent, vr: *const fmiValueReference, nvr: usize, value: *const fmiBoolean) -> fmiStatus;
        fn fmiSetString(c: fmiComponent, vr: *const fmiValueReference, nvr: usize, value: *const fmiString) -> fmiStatus;
        fn fmiInitialize(
            c: fmiComponent,
            toleranceControlled: fmiBoolean,
            relativeTolerance: fmiReal,
            eventInfo: *mut fmiEventInfo,
        ) -> fmiStatus;
        fn fmiGetDerivatives(c: fmiComponent, derivatives: *mut fmiReal, nx: usize) -> fmiStatus;
        fn fmiGetEventIndicators(c: fmiComponent, eventIndicators: *mut fmiReal, ni: usize) -> fmiStatus;
        fn fmiGetReal(c: fmiComponent, vr: *const fmiValueReference, nvr: usize, value: *mut fmiReal) -> fmiStatus;
        fn fmiGetInteger(c: fmiComponent, vr: *const fmiValueReference, nvr: usize, value: *mut fmiInteger) -> fmiStatus;
        fn fmiGetBoolean(c: fmiComponent, vr: *const fmiValueReference, nvr: usize, value: *mut fmiBoolean) -> fmiStatus;
        fn fmiGetString(c: fmiComponent, vr: *const fmiValueReference, nvr: usize, value: *mut fmiString) -> fmiStatus;
        fn fmiEventUpdate(c: fmiComponent, intermediateResults: fmiBoolean, eventInfo: *mut fmiEventInfo) -> fmiStatus;
        fn fmiGetContinuousStates(c: fmiComponent, states: *mut fmiReal, nx: usize) -> fmiStatus;
        fn fmiGetNominalContinuousStates(c: fmiComponent, x_nominal: *mut fmiReal, nx: usize) -> fmiStatus;
        fn fmiGetStateValueReferences(c: fmiComponent, vrx: *mut fmiValueReference, nx: usize) -> fmiStatus;
        fn fmiTerminate(c: fmiComponent) -> fmiStatus;
    }
}

impl Fmi1Binding {
    /// Load an FMI 1.0 library whose symbols are named `{model_identifier}_fmi*`.
    ///
    /// # Safety
    /// See [`Fmi1Binding::with_prefix`].
    pub unsafe fn new<P: AsRef<std::ffi::OsStr>>(
        path: P,
        model_identifier: &str,
    ) -> Result<Self, libloading::Error> {
        Self::with_prefix(path, &format!("{model_identifier}_"))
    }
}
