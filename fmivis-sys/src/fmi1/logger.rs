use crate::fmi1 as binding;

/// Called from logger.c once the variadic message has been formatted.
#[no_mangle]
extern "C" fn fmi1_callback_log(
    _c: binding::fmiComponent,
    instance_name: binding::fmiString,
    status: binding::fmiStatus,
    category: binding::fmiString,
    message: binding::fmiString,
) {
    let instance_name = unsafe { c_str_or_null(instance_name) };

    let level = match status {
        binding::fmiStatus_fmiOK => log::Level::Info,
        binding::fmiStatus_fmiWarning => log::Level::Warn,
        binding::fmiStatus_fmiDiscard => log::Level::Trace,
        binding::fmiStatus_fmiError | binding::fmiStatus_fmiFatal => log::Level::Error,
        _ => log::Level::Debug,
    };

    let category = unsafe { c_str_or_null(category) };
    let message = unsafe { c_str_or_null(message) };

    log::logger().log(
        &log::Record::builder()
            .args(format_args!("[{category}] {message}"))
            .level(level)
            .module_path(Some("logger"))
            .target(instance_name)
            .build(),
    );
}

unsafe fn c_str_or_null<'a>(s: *const std::os::raw::c_char) -> &'a str {
    if s.is_null() {
        "NULL"
    } else {
        std::ffi::CStr::from_ptr(s).to_str().unwrap_or("NULL")
    }
}

#[link(name = "fmi1logger", kind = "static")]
extern "C" {
    /// Implemented in logger.c
    pub fn fmi1_callback_logger_handler(
        c: binding::fmiComponent,
        instanceName: binding::fmiString,
        status: binding::fmiStatus,
        category: binding::fmiString,
        message: binding::fmiString,
        ...
    );
}
