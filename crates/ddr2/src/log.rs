//! Logging shim.
//!
//! Routes to `defmt` on the target and `tracing` on the host. With neither
//! feature enabled the macros still evaluate (and discard) their arguments so
//! values computed only for logging do not trip `unused` lints.
//!
//! Format strings must stay within the common subset of both crates: plain
//! `{}` placeholders, arguments implementing both `Display` and
//! `defmt::Format`.

macro_rules! ddr_log {
    ($level:ident, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        ::defmt::$level!($fmt $(, $arg)*);
        #[cfg(feature = "tracing")]
        ::tracing::$level!($fmt $(, $arg)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        {
            let _ = ($(&$arg,)*);
        }
    }};
}

macro_rules! debug {
    ($($t:tt)*) => { $crate::log::ddr_log!(debug, $($t)*) };
}

macro_rules! info {
    ($($t:tt)*) => { $crate::log::ddr_log!(info, $($t)*) };
}

// `warn` would clash with the built-in lint attribute.
macro_rules! ddr_warn {
    ($($t:tt)*) => { $crate::log::ddr_log!(warn, $($t)*) };
}

pub(crate) use {ddr_log, ddr_warn, debug, info};
