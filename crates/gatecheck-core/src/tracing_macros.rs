//! Conditional tracing macros
//!
//! These wrap `tracing` calls so the crate builds without the `tracing`
//! feature. All events are emitted under the `gatecheck` target.

/// Log at error level, only when tracing feature is enabled
#[cfg(feature = "tracing")]
macro_rules! log_error {
    ($($arg:tt)*) => {
        tracing::error!(target: "gatecheck", $($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! log_error {
    ($($arg:tt)*) => {};
}

/// Log at warn level, only when tracing feature is enabled
#[cfg(feature = "tracing")]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: "gatecheck", $($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

/// Log at debug level, only when tracing feature is enabled
#[cfg(feature = "tracing")]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "gatecheck", $($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}
