//! Runtime bridge
//!
//! One call to [`Bridge::evaluate`] owns one interpreter heap from start to
//! finish:
//!
//! 1. create the heap
//! 2. obtain the library source (decode, cached, or pre-decoded)
//! 3. clean the expression and synthesize the program
//! 4. run the library source
//! 5. run the program and copy its text result out
//!
//! Every buffer and the heap are scoped to the call, so they are released on
//! every exit path, early failures included.

use crate::engine::{
    BoaEngine, FatalHandler, InterpreterHeap, ScriptEngine, abort_on_fatal,
};
use crate::library;
use once_cell::sync::OnceCell;
use std::borrow::Cow;
use std::ops::Deref;
use std::sync::Arc;

pub mod config;
pub mod deadline;
pub mod decoder;
pub mod error;
pub mod outcome;
pub mod synth;

pub use config::BridgeConfig;
pub use deadline::DeadlineExceeded;
pub use decoder::DecodeError;
pub use error::{Classification, EvalError};
pub use outcome::{EvaluationOutcome, SuccessText};
pub use synth::{Interpolation, Program, SynthError};

/// Where the library source comes from.
#[derive(Debug, Clone)]
pub enum LibrarySource {
    /// Base64-encoded source, decoded per call (or once, if caching)
    Encoded(Cow<'static, [u8]>),
    /// Source that has already been decoded
    Predecoded(Arc<str>),
}

impl Default for LibrarySource {
    fn default() -> Self {
        LibrarySource::Encoded(Cow::Borrowed(library::ENCODED))
    }
}

/// Library text borrowed for the duration of one call.
enum LibraryText {
    Owned(String),
    Shared(Arc<str>),
}

impl Deref for LibraryText {
    type Target = str;

    fn deref(&self) -> &str {
        match self {
            LibraryText::Owned(text) => text,
            LibraryText::Shared(text) => text,
        }
    }
}

/// Evaluates expressions against JSON through an embedded engine.
#[derive(Clone)]
pub struct Bridge<E = BoaEngine> {
    config: BridgeConfig,
    engine: E,
    library: LibrarySource,
    cache: Arc<OnceCell<Arc<str>>>,
    fatal: FatalHandler,
}

impl Bridge<BoaEngine> {
    /// Create a bridge over `boa_engine` using the embedded library.
    pub fn new(config: BridgeConfig) -> Self {
        let engine = BoaEngine::new(config.limits);
        Self::with_engine(config, engine)
    }
}

impl Default for Bridge<BoaEngine> {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}

impl<E: ScriptEngine> Bridge<E> {
    /// Create a bridge over an arbitrary engine using the embedded library.
    pub fn with_engine(config: BridgeConfig, engine: E) -> Self {
        Self {
            config,
            engine,
            library: LibrarySource::default(),
            cache: Arc::new(OnceCell::new()),
            fatal: abort_on_fatal,
        }
    }

    /// Replace the library source.
    pub fn with_library(mut self, library: LibrarySource) -> Self {
        self.library = library;
        self.cache = Arc::new(OnceCell::new());
        self
    }

    /// Replace the fatal handler wired into each heap.
    pub fn with_fatal_handler(mut self, fatal: FatalHandler) -> Self {
        self.fatal = fatal;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Decode the library source now, for callers that want to pass it
    /// back in as [`LibrarySource::Predecoded`].
    pub fn predecode(&self) -> Result<Arc<str>, EvalError> {
        match self.library_text()? {
            LibraryText::Owned(text) => Ok(Arc::from(text)),
            LibraryText::Shared(text) => Ok(text),
        }
    }

    /// Evaluate `expression` against `json`.
    ///
    /// Blocks until the engine finishes. The returned outcome carries either
    /// a result or an error, never both.
    pub fn evaluate(&self, expression: &str, json: &str) -> EvaluationOutcome {
        let span = tracing::debug_span!(
            "evaluate",
            expression_len = expression.len(),
            json_len = json.len()
        );
        let _enter = span.enter();

        let outcome = EvaluationOutcome::settle(self.run(expression, json));
        match &outcome {
            EvaluationOutcome::Success(text) => {
                tracing::debug!(result_len = text.len(), "evaluation succeeded");
            }
            EvaluationOutcome::Failure(err) if err.classification().is_defect() => {
                tracing::error!(code = err.classification().code(), error = %err, "bridge invariant violated");
            }
            EvaluationOutcome::Failure(err) => {
                tracing::debug!(code = err.classification().code(), error = %err, "evaluation failed");
            }
        }
        outcome
    }

    fn run(&self, expression: &str, json: &str) -> Result<SuccessText, EvalError> {
        if expression.is_empty() || json.is_empty() {
            return Err(EvalError::invalid_arguments(
                "expression or input JSON is empty",
            ));
        }

        let mut heap = self
            .engine
            .create_heap(self.fatal)
            .map_err(|err| EvalError::out_of_memory(err.to_string()))?;

        let library = self.library_text()?;

        let expression = synth::clean_expression(expression).map_err(synth_error)?;
        let program = synth::build(
            &expression,
            json,
            self.config.interpolation,
            self.config.program_margin,
        )
        .map_err(synth_error)?;
        tracing::trace!(program = program.source(), "synthesized program");

        heap.execute(&library)
            .map_err(|fault| EvalError::engine(fault.message))?;
        tracing::debug!(library_len = library.len(), "library loaded");

        for (name, value) in program.bindings() {
            heap.bind_string(name, value)
                .map_err(|fault| EvalError::engine(fault.message))?;
        }

        let text = heap
            .evaluate_to_string(program.source())
            .map_err(|fault| EvalError::engine(fault.message))?;

        SuccessText::try_copy(&text).map_err(|_| EvalError::out_of_memory("cannot copy result"))
    }

    fn library_text(&self) -> Result<LibraryText, EvalError> {
        match &self.library {
            LibrarySource::Predecoded(text) => Ok(LibraryText::Shared(Arc::clone(text))),
            LibrarySource::Encoded(encoded) if self.config.cache_library => self
                .cache
                .get_or_try_init(|| decode_library(encoded).map(Arc::from))
                .map(|text| LibraryText::Shared(Arc::clone(text))),
            LibrarySource::Encoded(encoded) => decode_library(encoded).map(LibraryText::Owned),
        }
    }
}

fn decode_library(encoded: &[u8]) -> Result<String, EvalError> {
    let bytes = decoder::decode(encoded).map_err(|err| match err {
        DecodeError::OutOfMemory { .. } => EvalError::out_of_memory(err.to_string()),
        other => {
            tracing::error!(error = %other, "embedded library payload is malformed");
            EvalError::internal("cannot decode embedded library")
        }
    })?;
    String::from_utf8(bytes).map_err(|err| {
        tracing::error!(error = %err, "embedded library is not UTF-8");
        EvalError::internal("cannot decode embedded library")
    })
}

fn synth_error(err: SynthError) -> EvalError {
    match err {
        SynthError::OutOfMemory { .. } => EvalError::out_of_memory(err.to_string()),
        SynthError::BoundExceeded { .. } => EvalError::internal(err.to_string()),
    }
}
