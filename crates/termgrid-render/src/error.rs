#![forbid(unsafe_code)]

//! Error types for buffers and render engines.

use core::fmt;

/// Failure reported by a [`RenderEngine`](crate::engine::RenderEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Requested grid exceeds the engine's cell limit.
    AllocationTooLarge {
        width: u32,
        height: u32,
        limit: u64,
    },
    /// Grid was never issued by this engine or has already been released.
    Released,
    /// The engine failed to present a frame.
    Flush(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationTooLarge {
                width,
                height,
                limit,
            } => write!(
                f,
                "grid {width}x{height} exceeds engine limit of {limit} cells"
            ),
            Self::Released => write!(f, "grid already released"),
            Self::Flush(msg) => write!(f, "flush failed: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Failure reported by an [`OptimizedBuffer`](crate::OptimizedBuffer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// The buffer was destroyed; its storage is gone.
    Destroyed { id: String },
    /// Width or height was zero.
    InvalidDimensions { width: u32, height: u32 },
    /// A color argument could not be parsed.
    InvalidColor(String),
    /// The render engine refused the request.
    Engine(EngineError),
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Destroyed { id } => write!(f, "buffer {id:?} used after destroy"),
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid buffer dimensions {width}x{height}")
            }
            Self::InvalidColor(msg) => write!(f, "invalid color: {msg}"),
            Self::Engine(err) => write!(f, "engine error: {err}"),
        }
    }
}

impl std::error::Error for BufferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EngineError> for BufferError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<crate::color::ColorParseError> for BufferError {
    fn from(value: crate::color::ColorParseError) -> Self {
        Self::InvalidColor(value.to_string())
    }
}

/// Result alias defaulting to [`BufferError`].
pub type Result<T, E = BufferError> = std::result::Result<T, E>;
