// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Conditional logging shim: uses `tracing` when the `tracing` feature is
//! enabled, compiles to nothing otherwise.
//!
//! Import the macros from here rather than from `tracing` directly:
//!
//! ```
//! use diffmerge_core::logging::debug;
//!
//! let label = "inventory";
//! debug!("[{}] merge completed", label);
//! ```
//!
//! Only format-string arguments are supported so that the disabled variant
//! can still type-check its arguments.

#[cfg(feature = "tracing")]
pub use tracing::{debug, error, trace, warn};

#[cfg(not(feature = "tracing"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __diffmerge_log_disabled {
    ($($arg:tt)*) => {{
        if false {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}

#[cfg(not(feature = "tracing"))]
pub use crate::__diffmerge_log_disabled as debug;
#[cfg(not(feature = "tracing"))]
pub use crate::__diffmerge_log_disabled as error;
#[cfg(not(feature = "tracing"))]
pub use crate::__diffmerge_log_disabled as trace;
#[cfg(not(feature = "tracing"))]
pub use crate::__diffmerge_log_disabled as warn;
