//! Error classification for evaluation outcomes
//!
//! Every failure inside `evaluate` is converted, at the point it is detected,
//! into one [`Classification`] plus a message. Callers see `<prefix>: <detail>`.

use std::fmt;
use thiserror::Error;

/// Closed set of outcome classifications. The discriminants are the codes
/// returned across the C boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Classification {
    /// Evaluation completed and produced a result
    Success = 0,
    /// Reserved catch-all; not produced by a correct bridge
    Unspecified = 1,
    /// An allocation failed at some step
    OutOfMemory = 2,
    /// Reserved for input validation at this layer
    InvalidJson = 3,
    /// A bridge invariant was violated
    InternalError = 4,
    /// Required input was missing
    InvalidArguments = 5,
    /// The embedded engine threw while running library or program source
    EngineError = 6,
}

impl Classification {
    /// All classifications in code order.
    pub const ALL: [Classification; 7] = [
        Classification::Success,
        Classification::Unspecified,
        Classification::OutOfMemory,
        Classification::InvalidJson,
        Classification::InternalError,
        Classification::InvalidArguments,
        Classification::EngineError,
    ];

    /// Numeric code.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Look up a classification by numeric code.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.code() == code)
    }

    /// Fixed human-readable prefix used in error text.
    pub fn prefix(self) -> &'static str {
        match self {
            Classification::Success => "Success",
            Classification::Unspecified => "Unknown error",
            Classification::OutOfMemory => "Can't allocate memory",
            Classification::InvalidJson => "Invalid JSON",
            Classification::InternalError => "Internal error",
            Classification::InvalidArguments => "Invalid arguments",
            Classification::EngineError => "Engine error",
        }
    }

    /// Whether this classification signals a defect in the bridge itself.
    pub fn is_defect(self) -> bool {
        matches!(
            self,
            Classification::InternalError | Classification::Unspecified
        )
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A failed evaluation. The message text belongs to this value; callers
/// borrow it and never take ownership of it separately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {detail}", .kind.prefix())]
pub struct EvalError {
    kind: Classification,
    detail: String,
}

impl EvalError {
    /// Build an error of `kind` with the given detail text.
    pub fn new(kind: Classification, detail: impl Into<String>) -> Self {
        debug_assert_ne!(kind, Classification::Success);
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Missing or empty caller input.
    pub fn invalid_arguments(detail: impl Into<String>) -> Self {
        Self::new(Classification::InvalidArguments, detail)
    }

    /// Allocation failure.
    pub fn out_of_memory(detail: impl Into<String>) -> Self {
        Self::new(Classification::OutOfMemory, detail)
    }

    /// Bridge invariant violation.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(Classification::InternalError, detail)
    }

    /// Failure thrown by the embedded engine.
    pub fn engine(detail: impl Into<String>) -> Self {
        Self::new(Classification::EngineError, detail)
    }

    /// Classification of this failure.
    pub fn classification(&self) -> Classification {
        self.kind
    }

    /// Detail text without the classification prefix.
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Full message, `<prefix>: <detail>`.
    pub fn message(&self) -> String {
        self.to_string()
    }
}
