//! Program synthesis
//!
//! Builds the short script that calls into the loaded library:
//! `JSON.stringify(jsonata(<expression>).evaluate(<json>));`
//!
//! The output buffer is sized up front from the interpolated lengths plus a
//! fixed margin. Filling it to (or past) that bound means the margin was
//! wrong, and the build fails instead of producing a partial program.

use serde::{Deserialize, Serialize};
use std::collections::TryReserveError;
use std::fmt::Write as _;
use thiserror::Error;

/// Global name carrying the expression in [`Interpolation::Bound`] mode.
pub const EXPRESSION_GLOBAL: &str = "__jsonata_expression";
/// Global name carrying the JSON text in [`Interpolation::Bound`] mode.
pub const INPUT_GLOBAL: &str = "__jsonata_input";

/// Default slack added to the interpolated lengths when sizing the program.
pub const DEFAULT_PROGRAM_MARGIN: usize = 256;

/// How caller text reaches the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Expression spliced between single quotes after newline stripping
    /// only. A quote inside the expression changes the program's structure.
    Legacy,
    /// Expression spliced as a fully escaped string literal.
    #[default]
    Escaped,
    /// Expression and JSON bound as engine globals; the program text is
    /// fixed and parses the JSON with `JSON.parse`.
    Bound,
}

/// Synthesis failures.
#[derive(Debug, Error)]
pub enum SynthError {
    /// A buffer could not be allocated
    #[error("cannot allocate {what}")]
    OutOfMemory {
        /// Which buffer failed
        what: &'static str,
        /// Allocator error
        #[source]
        source: TryReserveError,
    },

    /// The formatted program reached the precomputed bound
    #[error("program buffer size insufficient for expression program ({written} bytes, bound {bound})")]
    BoundExceeded {
        /// Bytes actually formatted
        written: usize,
        /// Precomputed bound
        bound: usize,
    },
}

/// A synthesized program plus the globals it expects to be bound first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    source: String,
    bindings: Vec<(&'static str, String)>,
}

impl Program {
    /// Program source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Globals to bind before running the program.
    pub fn bindings(&self) -> &[(&'static str, String)] {
        &self.bindings
    }
}

/// Copy `expression` with every `\n` removed.
pub fn clean_expression(expression: &str) -> Result<String, SynthError> {
    let mut clean = String::new();
    clean
        .try_reserve_exact(expression.len())
        .map_err(|source| SynthError::OutOfMemory {
            what: "expression copy",
            source,
        })?;
    clean.extend(expression.chars().filter(|&ch| ch != '\n'));
    Ok(clean)
}

/// Build the program for an already cleaned expression.
pub fn build(
    expression: &str,
    json: &str,
    mode: Interpolation,
    margin: usize,
) -> Result<Program, SynthError> {
    match mode {
        Interpolation::Legacy => {
            let source = format_bounded(expression.len() + json.len(), margin, |out| {
                write!(out, "JSON.stringify(jsonata('{expression}').evaluate({json}));")
            })?;
            Ok(Program {
                source,
                bindings: Vec::new(),
            })
        }
        Interpolation::Escaped => {
            let literal = escape_literal(expression)?;
            let source = format_bounded(literal.len() + json.len(), margin, |out| {
                write!(out, "JSON.stringify(jsonata(\"{literal}\").evaluate({json}));")
            })?;
            Ok(Program {
                source,
                bindings: Vec::new(),
            })
        }
        Interpolation::Bound => {
            let source = format_bounded(0, margin, |out| {
                write!(
                    out,
                    "JSON.stringify(jsonata({EXPRESSION_GLOBAL}).evaluate(JSON.parse({INPUT_GLOBAL})));"
                )
            })?;
            Ok(Program {
                source,
                bindings: vec![
                    (EXPRESSION_GLOBAL, copy(expression, "expression binding")?),
                    (INPUT_GLOBAL, copy(json, "input binding")?),
                ],
            })
        }
    }
}

fn format_bounded(
    interpolated: usize,
    margin: usize,
    write: impl FnOnce(&mut String) -> std::fmt::Result,
) -> Result<String, SynthError> {
    let bound = interpolated.saturating_add(margin);
    let mut out = String::new();
    out.try_reserve_exact(bound)
        .map_err(|source| SynthError::OutOfMemory {
            what: "program buffer",
            source,
        })?;
    // Writing into a String cannot fail.
    let _ = write(&mut out);
    if out.len() >= bound {
        return Err(SynthError::BoundExceeded {
            written: out.len(),
            bound,
        });
    }
    Ok(out)
}

fn copy(text: &str, what: &'static str) -> Result<String, SynthError> {
    let mut out = String::new();
    out.try_reserve_exact(text.len())
        .map_err(|source| SynthError::OutOfMemory { what, source })?;
    out.push_str(text);
    Ok(out)
}

/// Escape `text` for use between double quotes in script source.
fn escape_literal(text: &str) -> Result<String, SynthError> {
    let mut out = String::new();
    out.try_reserve(text.len())
        .map_err(|source| SynthError::OutOfMemory {
            what: "escaped expression",
            source,
        })?;
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            ch if ch < ' ' || ch == '\u{7f}' => {
                let _ = write!(out, "\\u{:04x}", ch as u32);
            }
            ch => out.push(ch),
        }
    }
    Ok(out)
}
