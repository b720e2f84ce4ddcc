#![forbid(unsafe_code)]

//! Core: geometry and logging shared by the compositor and effect crates.

pub mod geometry;
pub mod logging;

// Re-export tracing macros at crate root for ergonomic use.
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};
