//! Embedded script engine capability
//!
//! The bridge only needs three things from an engine: a fresh heap per call,
//! a way to run source text inside it, and the thrown value's description
//! when something fails. Everything else about the interpreter stays behind
//! these traits.

use thiserror::Error;

pub mod boa;

pub use boa::{BoaEngine, BoaHeap, EngineLimits};

/// Last-resort hook invoked when the engine hits a condition it cannot
/// recover from. Implementations must not return.
pub type FatalHandler = fn(Option<&str>) -> !;

/// A failure thrown by script code while executing inside a heap.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineFault {
    /// The engine's own textual description of the thrown value
    pub message: String,
}

impl EngineFault {
    /// Wrap an engine-provided description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Heap creation failed.
#[derive(Debug, Error)]
pub enum HeapError {
    /// The engine could not allocate its heap
    #[error("cannot create interpreter heap: {0}")]
    Allocation(String),
}

/// One isolated interpreter instance. Dropping it destroys the instance.
pub trait InterpreterHeap {
    /// Run `source` as a program, discarding its completion value.
    fn execute(&mut self, source: &str) -> Result<(), EngineFault>;

    /// Run `source` as a program and convert its completion value to text.
    ///
    /// Conversion uses safe-to-string semantics: if the value's own string
    /// conversion throws, the engine's display form is returned instead.
    fn evaluate_to_string(&mut self, source: &str) -> Result<String, EngineFault>;

    /// Bind `value` as a global string named `name`.
    fn bind_string(&mut self, name: &str, value: &str) -> Result<(), EngineFault>;
}

/// Factory for interpreter heaps.
pub trait ScriptEngine {
    /// Heap type produced by this engine.
    type Heap: InterpreterHeap;

    /// Create a fresh heap wired to `fatal`.
    fn create_heap(&self, fatal: FatalHandler) -> Result<Self::Heap, HeapError>;
}

/// Default fatal handler: log, flush stderr, abort the process.
pub fn abort_on_fatal(message: Option<&str>) -> ! {
    let message = message.unwrap_or("no message");
    tracing::error!(message, "embedded engine reported an unrecoverable fault");
    eprintln!("*** FATAL ERROR: {message}");
    let _ = std::io::Write::flush(&mut std::io::stderr());
    std::process::abort()
}
