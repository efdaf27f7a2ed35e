use crate::fmi2 as binding;

/// This function gets called from logger.c
#[no_mangle]
extern "C" fn fmi2_callback_log(
    _component_environment: binding::fmi2ComponentEnvironment,
    instance_name: binding::fmi2String,
    status: binding::fmi2Status,
    category: binding::fmi2String,
    message: binding::fmi2String,
) {
    let instance_name = unsafe { c_str_or_null(instance_name) };

    let level = match status {
        binding::fmi2Status_fmi2OK => log::Level::Info,
        binding::fmi2Status_fmi2Warning => log::Level::Warn,
        binding::fmi2Status_fmi2Discard => log::Level::Trace,
        binding::fmi2Status_fmi2Error | binding::fmi2Status_fmi2Fatal => log::Level::Error,
        // Pending is not a valid logger status
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

#[link(name = "fmi2logger", kind = "static")]
extern "C" {
    /// This function is implemented in logger.c
    /// Note: This can be re-implemented in pure Rust once the `c_variadics` feature stabilizes.
    pub fn fmi2_callback_logger_handler(
        componentEnvironment: binding::fmi2ComponentEnvironment,
        instanceName: binding::fmi2String,
        status: binding::fmi2Status,
        category: binding::fmi2String,
        message: binding::fmi2String,
        ...
    );
}
