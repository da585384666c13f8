//! Evaluation outcome and the caller-owned success text

use super::error::{Classification, EvalError};
use std::collections::TryReserveError;
use std::fmt;
use std::ops::Deref;

/// Result text handed to the caller, who owns it outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessText(String);

impl SuccessText {
    /// Copy `text` into a freshly allocated buffer, reporting allocation
    /// failure instead of aborting.
    pub fn try_copy(text: &str) -> Result<Self, TryReserveError> {
        let mut owned = String::new();
        owned.try_reserve_exact(text.len())?;
        owned.push_str(text);
        Ok(Self(owned))
    }

    /// Borrow the text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take ownership of the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for SuccessText {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SuccessText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of one evaluation: a result or an error, never both or neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationOutcome {
    /// Evaluation succeeded
    Success(SuccessText),
    /// Evaluation failed
    Failure(EvalError),
}

impl EvaluationOutcome {
    /// Settle the result of an evaluation. An empty success text carries
    /// neither a result nor an error and becomes an internal error.
    pub(crate) fn settle(result: Result<SuccessText, EvalError>) -> Self {
        match result {
            Ok(text) if text.is_empty() => {
                let err = EvalError::internal("no result or error produced");
                tracing::error!(error = %err, "evaluation produced an empty outcome");
                EvaluationOutcome::Failure(err)
            }
            Ok(text) => EvaluationOutcome::Success(text),
            Err(err) => EvaluationOutcome::Failure(err),
        }
    }

    /// Classification of this outcome.
    pub fn classification(&self) -> Classification {
        match self {
            EvaluationOutcome::Success(_) => Classification::Success,
            EvaluationOutcome::Failure(err) => err.classification(),
        }
    }

    /// Whether evaluation succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, EvaluationOutcome::Success(_))
    }

    /// Borrow the result text, if any.
    pub fn result(&self) -> Option<&str> {
        match self {
            EvaluationOutcome::Success(text) => Some(text.as_str()),
            EvaluationOutcome::Failure(_) => None,
        }
    }

    /// Borrow the error, if any.
    pub fn error(&self) -> Option<&EvalError> {
        match self {
            EvaluationOutcome::Success(_) => None,
            EvaluationOutcome::Failure(err) => Some(err),
        }
    }

    /// Convert into a standard `Result`.
    pub fn into_result(self) -> Result<SuccessText, EvalError> {
        match self {
            EvaluationOutcome::Success(text) => Ok(text),
            EvaluationOutcome::Failure(err) => Err(err),
        }
    }
}

impl From<EvaluationOutcome> for Result<SuccessText, EvalError> {
    fn from(outcome: EvaluationOutcome) -> Self {
        outcome.into_result()
    }
}
