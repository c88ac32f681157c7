//! Span completion status: a canonical code plus an optional description.

/// Canonical status codes. `Ok` is the default for an unended or
/// unset-status span.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize)]
pub enum StatusCode {
    #[default]
    Ok,
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

#[derive(Clone, Debug, PartialEq, Default, serde::Serialize)]
pub struct Status {
    pub code: StatusCode,
    pub description: Option<String>,
}

impl Status {
    pub const OK: Status = Status {
        code: StatusCode::Ok,
        description: None,
    };

    pub fn new(code: StatusCode) -> Self {
        Status {
            code,
            description: None,
        }
    }

    pub fn with_description(code: StatusCode, description: impl Into<String>) -> Self {
        Status {
            code,
            description: Some(description.into()),
        }
    }
}
