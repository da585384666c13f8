//! Allocation accounting across many evaluations.
//!
//! A counting global allocator tracks live bytes per thread. After a warm-up
//! call, a thousand further calls on every outcome path must leave the live
//! byte count where it started, and no heap may outlive its call. The real
//! engine keeps some caches between calls, so its pass only checks that the
//! live byte count stays bounded.

use jsonata_bridge::engine::{EngineFault, FatalHandler, HeapError, InterpreterHeap, ScriptEngine};
use jsonata_bridge::{Bridge, BridgeConfig, Classification, Interpolation};
use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct CountingAllocator;

thread_local! {
    static LIVE_BYTES: Cell<isize> = const { Cell::new(0) };
}

fn adjust(delta: isize) {
    let _ = LIVE_BYTES.try_with(|live| live.set(live.get() + delta));
}

fn live_bytes() -> isize {
    LIVE_BYTES.with(Cell::get)
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            adjust(layout.size() as isize);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        adjust(-(layout.size() as isize));
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            adjust(new_size as isize - layout.size() as isize);
        }
        new_ptr
    }
}

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator;

/// Engine whose heaps allocate like a real one and answer from the program
/// text: programs mentioning `fail` throw, everything else echoes its length.
#[derive(Clone, Default)]
struct EchoEngine {
    live_heaps: Arc<AtomicUsize>,
}

struct EchoHeap {
    scratch: Vec<u8>,
    live_heaps: Arc<AtomicUsize>,
}

impl ScriptEngine for EchoEngine {
    type Heap = EchoHeap;

    fn create_heap(&self, _fatal: FatalHandler) -> Result<EchoHeap, HeapError> {
        self.live_heaps.fetch_add(1, Ordering::SeqCst);
        Ok(EchoHeap {
            scratch: vec![0; 4096],
            live_heaps: Arc::clone(&self.live_heaps),
        })
    }
}

impl InterpreterHeap for EchoHeap {
    fn execute(&mut self, source: &str) -> Result<(), EngineFault> {
        self.scratch.extend_from_slice(&source.as_bytes()[..source.len().min(64)]);
        Ok(())
    }

    fn evaluate_to_string(&mut self, source: &str) -> Result<String, EngineFault> {
        if source.contains("fail") {
            return Err(EngineFault::new(format!("Error: rejected {} bytes", source.len())));
        }
        Ok(source.len().to_string())
    }

    fn bind_string(&mut self, _name: &str, value: &str) -> Result<(), EngineFault> {
        self.scratch.extend_from_slice(value.as_bytes());
        Ok(())
    }
}

impl Drop for EchoHeap {
    fn drop(&mut self) {
        self.live_heaps.fetch_sub(1, Ordering::SeqCst);
    }
}

fn fatal(message: Option<&str>) -> ! {
    panic!("fatal handler invoked: {message:?}");
}

#[test]
fn thousand_calls_do_not_leak() {
    let engine = EchoEngine::default();
    let live_heaps = Arc::clone(&engine.live_heaps);
    let escaped = Bridge::with_engine(BridgeConfig::default(), engine.clone())
        .with_fatal_handler(fatal);
    let bound = Bridge::with_engine(
        BridgeConfig {
            interpolation: Interpolation::Bound,
            ..BridgeConfig::default()
        },
        engine.clone(),
    )
    .with_fatal_handler(fatal);
    let undersized = Bridge::with_engine(
        BridgeConfig {
            program_margin: 4,
            ..BridgeConfig::default()
        },
        engine,
    )
    .with_fatal_handler(fatal);

    let expressions: Vec<String> = (0..16).map(|n| format!("items[{n}].\nname")).collect();

    // Warm up lazily initialised state (tracing callsites, etc).
    let _ = escaped.evaluate("warm", "{}");
    let _ = bound.evaluate("warm", "{}");
    let _ = undersized.evaluate("warm", "{}");
    let _ = escaped.evaluate("fail", "{}");
    let _ = escaped.evaluate("", "{}");

    let baseline = live_bytes();
    let mut seen = [0usize; 7];

    for call in 0..1_000 {
        let expression = &expressions[call % expressions.len()];
        let outcome = match call % 5 {
            0 => escaped.evaluate(expression, r#"{"items":[]}"#),
            1 => bound.evaluate(expression, "[]"),
            2 => escaped.evaluate("fail", "{}"),
            3 => undersized.evaluate(expression, "{}"),
            _ => escaped.evaluate(expression, ""),
        };
        seen[outcome.classification().code() as usize] += 1;
        drop(outcome);
        assert_eq!(live_heaps.load(Ordering::SeqCst), 0, "heap outlived call {call}");
    }

    assert_eq!(live_bytes(), baseline, "per-call buffers leaked");
    assert_eq!(seen[Classification::Success.code() as usize], 400);
    assert_eq!(seen[Classification::EngineError.code() as usize], 200);
    assert_eq!(seen[Classification::InternalError.code() as usize], 200);
    assert_eq!(seen[Classification::InvalidArguments.code() as usize], 200);
}

#[test]
fn boa_calls_stay_bounded() {
    let bridge = Bridge::default();
    let json = r#"{"items":[{"n":1},{"n":2},{"n":3}]}"#;
    let expressions = [
        "items.n",
        "$sum(items.n)",
        "items[n > 1]",
        "items.(",
        "$map(items, function($v) { $v.n * 2 })",
    ];

    for expression in expressions {
        let _ = bridge.evaluate(expression, json);
    }

    let mut samples: Vec<isize> = Vec::with_capacity(8);
    let baseline = live_bytes();

    for call in 0..300 {
        let slot = call % expressions.len();
        let outcome = bridge.evaluate(expressions[slot], json);
        assert_eq!(outcome.is_success(), slot != 3, "{}", expressions[slot]);
        drop(outcome);
        if call % 50 == 49 {
            samples.push(live_bytes() - baseline);
        }
    }

    let worst = samples.iter().copied().max().unwrap_or(0);
    assert!(worst < 4 << 20, "live bytes grew across engine calls: {samples:?}");
}
