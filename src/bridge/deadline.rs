//! Deadline wrapper around [`Bridge::evaluate`]
//!
//! The engine has no cooperative interrupt point, so a deadline can only stop
//! waiting: an evaluation that overruns keeps its blocking thread until the
//! engine returns, and its outcome is dropped.

use super::{Bridge, Classification, EvalError, EvaluationOutcome};
use crate::engine::ScriptEngine;
use std::time::Duration;
use thiserror::Error;

/// The evaluation did not finish in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("evaluation did not finish within {0:?}")]
pub struct DeadlineExceeded(pub Duration);

impl<E> Bridge<E>
where
    E: ScriptEngine + Clone + Send + Sync + 'static,
{
    /// Evaluate on tokio's blocking pool, giving up after `deadline`.
    pub async fn evaluate_with_deadline(
        &self,
        expression: String,
        json: String,
        deadline: Duration,
    ) -> Result<EvaluationOutcome, DeadlineExceeded> {
        let bridge = self.clone();
        let task = tokio::task::spawn_blocking(move || bridge.evaluate(&expression, &json));

        match tokio::time::timeout(deadline, task).await {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(join_err)) => Ok(EvaluationOutcome::Failure(EvalError::new(
                Classification::Unspecified,
                format!("evaluation task failed: {join_err}"),
            ))),
            Err(_) => {
                tracing::warn!(?deadline, "evaluation deadline exceeded");
                Err(DeadlineExceeded(deadline))
            }
        }
    }
}
