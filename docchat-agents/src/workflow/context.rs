//! Per-run execution context.
//!
//! A [`RunContext`] is created for every run and owned by the task driving it.
//! Handlers receive it mutably, one at a time, so run state is never touched
//! concurrently and never shared between runs.

use crate::{
    error::{AgentError, Result},
    workflow::events::WorkflowEvent,
};
use std::collections::VecDeque;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Mutable context handed to handlers of one run
#[derive(Debug)]
pub struct RunContext<E: WorkflowEvent, S> {
    run_id: Uuid,
    state: S,
    output: mpsc::UnboundedSender<Result<E>>,
    pending: VecDeque<E>,
    cancel: CancellationToken,
    emitted: usize,
}

impl<E: WorkflowEvent, S> RunContext<E, S> {
    pub(crate) fn new(
        state: S,
        output: mpsc::UnboundedSender<Result<E>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state,
            output,
            pending: VecDeque::new(),
            cancel,
            emitted: 0,
        }
    }

    /// Unique identifier of this run
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Shared view of the run state
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Mutable view of the run state
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Emit an event.
    ///
    /// The event is appended to the run's output sequence immediately, so readers
    /// see it before any handler reacts to it. Handlers registered for its kind are
    /// scheduled to run after the current handler returns.
    pub fn emit(&mut self, event: E) {
        tracing::trace!(run_id = %self.run_id, kind = ?event.kind(), "emit");
        if self.output.send(Ok(event.clone())).is_err() {
            tracing::trace!(run_id = %self.run_id, "output stream closed, event not observed");
        }
        self.pending.push_back(event);
        self.emitted += 1;
    }

    /// Whether the run has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancellation token of this run
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Number of events emitted so far, including the start event
    pub fn emitted_count(&self) -> usize {
        self.emitted
    }

    pub(crate) fn next_pending(&mut self) -> Option<E> {
        self.pending.pop_front()
    }

    pub(crate) fn fail(&self, error: AgentError) {
        let _ = self.output.send(Err(error));
    }
}
