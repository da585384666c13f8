//! Fuzzing entry point
//!
//! Holds one side of `evaluate` fixed (loaded from a file) and feeds raw
//! fuzzer bytes into the other. The library is decoded once up front and
//! handed to the bridge pre-decoded so each input skips the decoder.

use crate::bridge::{Bridge, BridgeConfig, EvaluationOutcome, LibrarySource};
use crate::engine::{BoaEngine, ScriptEngine};
use anyhow::{Context as _, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which argument of `evaluate` receives the fuzzer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuzzSide {
    /// Fuzz the expression; the fixed file holds input JSON
    Expression,
    /// Fuzz the JSON; the fixed file holds the expression
    Json,
}

impl FuzzSide {
    /// What the fixed file must contain.
    pub fn fixed_description(self) -> &'static str {
        match self {
            FuzzSide::Expression => "input JSON",
            FuzzSide::Json => "JSONata expression",
        }
    }
}

/// Harness state shared across fuzz iterations.
pub struct FuzzHarness<E = BoaEngine> {
    bridge: Bridge<E>,
    side: FuzzSide,
    fixed: String,
}

impl FuzzHarness<BoaEngine> {
    /// Load the fixed counterpart from `path` and prepare a default bridge.
    pub fn load(side: FuzzSide, path: &Path) -> anyhow::Result<Self> {
        Self::load_with(Bridge::new(BridgeConfig::default()), side, path)
    }
}

impl<E: ScriptEngine> FuzzHarness<E> {
    /// Load the fixed counterpart from `path` and pre-decode `bridge`'s library.
    pub fn load_with(bridge: Bridge<E>, side: FuzzSide, path: &Path) -> anyhow::Result<Self> {
        if path.as_os_str().is_empty() {
            bail!("Need to provide file path to {}", side.fixed_description());
        }
        tracing::info!(path = %path.display(), "loading fixed fuzz argument");
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let fixed = String::from_utf8_lossy(&bytes).into_owned();
        Self::with_fixed(bridge, side, fixed)
    }

    /// Build a harness around an in-memory fixed counterpart.
    pub fn with_fixed(bridge: Bridge<E>, side: FuzzSide, fixed: String) -> anyhow::Result<Self> {
        let library = bridge
            .predecode()
            .context("Failed to pre-decode library")?;
        Ok(Self {
            bridge: bridge.with_library(LibrarySource::Predecoded(library)),
            side,
            fixed,
        })
    }

    /// Fuzzed side.
    pub fn side(&self) -> FuzzSide {
        self.side
    }

    /// Fixed counterpart text.
    pub fn fixed(&self) -> &str {
        &self.fixed
    }

    /// Run one fuzzer input.
    pub fn test_one_input(&self, data: &[u8]) -> EvaluationOutcome {
        let input = String::from_utf8_lossy(data);
        let outcome = match self.side {
            FuzzSide::Expression => self.bridge.evaluate(&input, &self.fixed),
            FuzzSide::Json => self.bridge.evaluate(&self.fixed, &input),
        };

        match &outcome {
            EvaluationOutcome::Success(text) => tracing::info!("Result: {text}"),
            EvaluationOutcome::Failure(err) => {
                tracing::info!("Error[{}]: {err}", err.classification().code())
            }
        }
        outcome
    }
}
