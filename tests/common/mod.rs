//! Recording engine shared by the integration tests.

#![allow(dead_code)]

use jsonata_bridge::engine::{EngineFault, FatalHandler, HeapError, InterpreterHeap, ScriptEngine};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the mock heap responds.
#[derive(Debug, Clone)]
pub struct Behavior {
    pub heap_fails: bool,
    pub library_fault: Option<String>,
    pub program_result: Result<String, String>,
    pub program_delay: Option<Duration>,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            heap_fails: false,
            library_fault: None,
            program_result: Ok("42".to_string()),
            program_delay: None,
        }
    }
}

/// Everything the mock observed.
#[derive(Debug, Default)]
pub struct Record {
    pub heaps_created: usize,
    pub heaps_live: usize,
    pub executed: Vec<String>,
    pub evaluated: Vec<String>,
    pub bindings: Vec<(String, String)>,
}

#[derive(Clone, Default)]
pub struct MockEngine {
    pub behavior: Behavior,
    pub record: Arc<Mutex<Record>>,
}

impl MockEngine {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            record: Arc::default(),
        }
    }

    pub fn record(&self) -> std::sync::MutexGuard<'_, Record> {
        self.record.lock().expect("record mutex poisoned")
    }
}

impl ScriptEngine for MockEngine {
    type Heap = MockHeap;

    fn create_heap(&self, _fatal: FatalHandler) -> Result<MockHeap, HeapError> {
        if self.behavior.heap_fails {
            return Err(HeapError::Allocation("mock heap refused".into()));
        }
        let mut record = self.record();
        record.heaps_created += 1;
        record.heaps_live += 1;
        Ok(MockHeap {
            behavior: self.behavior.clone(),
            record: Arc::clone(&self.record),
        })
    }
}

pub struct MockHeap {
    behavior: Behavior,
    record: Arc<Mutex<Record>>,
}

impl MockHeap {
    fn record(&self) -> std::sync::MutexGuard<'_, Record> {
        self.record.lock().expect("record mutex poisoned")
    }
}

impl InterpreterHeap for MockHeap {
    fn execute(&mut self, source: &str) -> Result<(), EngineFault> {
        self.record().executed.push(source.to_string());
        match &self.behavior.library_fault {
            Some(message) => Err(EngineFault::new(message.clone())),
            None => Ok(()),
        }
    }

    fn evaluate_to_string(&mut self, source: &str) -> Result<String, EngineFault> {
        self.record().evaluated.push(source.to_string());
        if let Some(delay) = self.behavior.program_delay {
            std::thread::sleep(delay);
        }
        self.behavior.program_result.clone().map_err(EngineFault::new)
    }

    fn bind_string(&mut self, name: &str, value: &str) -> Result<(), EngineFault> {
        self.record()
            .bindings
            .push((name.to_string(), value.to_string()));
        Ok(())
    }
}

impl Drop for MockHeap {
    fn drop(&mut self) {
        if let Ok(mut record) = self.record.lock() {
            record.heaps_live -= 1;
        }
    }
}

/// Fatal handler for tests: turn the abort into a test failure.
pub fn panic_on_fatal(message: Option<&str>) -> ! {
    panic!("fatal handler invoked: {message:?}");
}
