#![forbid(unsafe_code)]

//! Logging and tracing support.
//!
//! All termgrid crates log through `tracing`. This module re-exports the
//! macros so downstream crates share one facade.
//! Install a subscriber (for example `tracing-subscriber`) in the host
//! application to see the output; without one every macro is a cheap no-op.

pub use tracing::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};

