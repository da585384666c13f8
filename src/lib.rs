//! jsonata-bridge – evaluate JSONata expressions against JSON documents
//!
//! The query language lives in a bundled script library run by an embedded
//! engine. This crate is the bridge around it:
//! - Decoding the build-time encoded library payload
//! - Synthesizing the small program that invokes the library on caller input
//! - Owning one isolated interpreter heap per evaluation
//! - Returning a result or a classified error with clear ownership, also
//!   across a C ABI

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Evaluation orchestration, program synthesis, and the outcome protocol
pub mod bridge;
/// Embedded script engine capability and its `boa_engine` implementation
pub mod engine;
/// C ABI over the default bridge
pub mod ffi;
/// Fuzzing-mode harness
pub mod fuzz;
/// Build-time encoded library payload
pub mod library;

// Re-export key types for convenience
pub use bridge::{
    Bridge, BridgeConfig, Classification, EvalError, EvaluationOutcome, Interpolation,
    LibrarySource, SuccessText,
};

/// Current version of the bridge
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Evaluate `expression` against `json` with a default bridge.
pub fn evaluate(expression: &str, json: &str) -> EvaluationOutcome {
    Bridge::default().evaluate(expression, json)
}
