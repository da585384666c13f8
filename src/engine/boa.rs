//! `boa_engine` backed interpreter heaps.

use super::{EngineFault, FatalHandler, HeapError, InterpreterHeap, ScriptEngine};
use boa_engine::property::Attribute;
use boa_engine::{Context, JsError, JsString, JsValue, Source};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Engine-side execution limits applied to every heap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineLimits {
    /// Maximum iterations of any single loop before the engine throws
    pub loop_iteration_limit: Option<u64>,

    /// Maximum call depth before the engine throws
    pub recursion_limit: Option<usize>,
}

/// Engine producing one `boa_engine::Context` per heap.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoaEngine {
    limits: EngineLimits,
}

impl BoaEngine {
    /// Create an engine applying `limits` to each heap it creates.
    pub fn new(limits: EngineLimits) -> Self {
        Self { limits }
    }

    /// Limits applied to new heaps.
    pub fn limits(&self) -> EngineLimits {
        self.limits
    }
}

impl ScriptEngine for BoaEngine {
    type Heap = BoaHeap;

    fn create_heap(&self, fatal: FatalHandler) -> Result<BoaHeap, HeapError> {
        let mut context = Context::builder()
            .build()
            .map_err(|err| HeapError::Allocation(err.to_string()))?;

        let limits = context.runtime_limits_mut();
        if let Some(limit) = self.limits.loop_iteration_limit {
            limits.set_loop_iteration_limit(limit);
        }
        if let Some(limit) = self.limits.recursion_limit {
            limits.set_recursion_limit(limit);
        }

        Ok(BoaHeap { context, fatal })
    }
}

/// A single `boa_engine` context.
pub struct BoaHeap {
    context: Context,
    fatal: FatalHandler,
}

impl BoaHeap {
    /// Run `f` against the context. A panic inside the engine is an
    /// unrecoverable fault and goes to the fatal handler.
    fn guarded<T>(&mut self, f: impl FnOnce(&mut Context) -> T) -> T {
        let context = &mut self.context;
        match panic::catch_unwind(AssertUnwindSafe(|| f(context))) {
            Ok(value) => value,
            Err(payload) => (self.fatal)(panic_message(payload.as_ref())),
        }
    }
}

impl InterpreterHeap for BoaHeap {
    fn execute(&mut self, source: &str) -> Result<(), EngineFault> {
        self.guarded(|context| match context.eval(Source::from_bytes(source)) {
            Ok(_) => Ok(()),
            Err(err) => Err(describe_error(&err, context)),
        })
    }

    fn evaluate_to_string(&mut self, source: &str) -> Result<String, EngineFault> {
        self.guarded(|context| match context.eval(Source::from_bytes(source)) {
            Ok(value) => Ok(safe_to_string(&value, context)),
            Err(err) => Err(describe_error(&err, context)),
        })
    }

    fn bind_string(&mut self, name: &str, value: &str) -> Result<(), EngineFault> {
        self.guarded(|context| {
            context
                .register_global_property(
                    JsString::from(name),
                    JsValue::from(JsString::from(value)),
                    Attribute::all(),
                )
                .map_err(|err| describe_error(&err, context))
        })
    }
}

/// String conversion that cannot itself fail.
fn safe_to_string(value: &JsValue, context: &mut Context) -> String {
    match value.to_string(context) {
        Ok(text) => text.to_std_string_escaped(),
        Err(_) => value.display().to_string(),
    }
}

/// Thrown script values use their own string form; engine-native errors
/// (syntax errors, runtime limits) use the engine's rendering.
fn describe_error(err: &JsError, context: &mut Context) -> EngineFault {
    match err.as_opaque() {
        Some(thrown) => EngineFault::new(safe_to_string(thrown, context)),
        None => EngineFault::new(err.to_string()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> Option<&str> {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
}
