extern crate alloc;
use alloc::string::String;

use thiserror::Error;

/// Errors raised by the span-construction surface of the crate.
///
/// Misuse after a span has ended, duplicate `Tracer::shutdown` calls, and
/// bounded-collection eviction are not represented here: per the crate's
/// error taxonomy those are silent/logged, not typed failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
    #[error("invalid tracestate: {message}")]
    InvalidTraceState { message: String },
}

impl TraceError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        TraceError::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_tracestate(message: impl Into<String>) -> Self {
        TraceError::InvalidTraceState {
            message: message.into(),
        }
    }
}
