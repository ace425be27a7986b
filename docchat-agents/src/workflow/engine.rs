//! Event-driven workflow engine.
//!
//! A [`Workflow`] maps event kinds to handlers. Running it spawns a driver task
//! that dispatches events in emission order, one handler at a time, until a stop
//! event has been handled, a handler fails, or the run is cancelled.

use crate::{
    error::{AgentError, Result},
    workflow::{
        context::RunContext,
        events::{EventStream, WorkflowEvent},
    },
};
use async_trait::async_trait;
use futures::{StreamExt, stream};
use std::{collections::HashMap, sync::Arc};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

/// Handler invoked for events of the kinds it is registered for
#[async_trait]
pub trait EventHandler<E, S>: Send + Sync
where
    E: WorkflowEvent,
    S: Send + 'static,
{
    /// Handler name, used in logs and failure reports
    fn name(&self) -> &str;

    /// Handle one event. Returning an error aborts the run.
    async fn handle(&self, event: E, ctx: &mut RunContext<E, S>) -> Result<()>;
}

type HandlerMap<E, S> =
    HashMap<<E as WorkflowEvent>::Kind, Vec<Arc<dyn EventHandler<E, S>>>>;

/// Builder for [`Workflow`]
pub struct WorkflowBuilder<E: WorkflowEvent, S: Send + 'static> {
    name: String,
    handlers: HandlerMap<E, S>,
}

impl<E, S> WorkflowBuilder<E, S>
where
    E: WorkflowEvent,
    S: Send + 'static,
{
    /// Register a handler for one or more event kinds.
    ///
    /// Handlers sharing a kind run in registration order.
    pub fn handler(mut self, kinds: &[E::Kind], handler: Arc<dyn EventHandler<E, S>>) -> Self {
        for kind in kinds {
            let entry = self.handlers.entry(*kind).or_default();
            if !entry.iter().any(|existing| Arc::ptr_eq(existing, &handler)) {
                entry.push(Arc::clone(&handler));
            }
        }
        self
    }

    /// Build the workflow
    pub fn build(self) -> Workflow<E, S> {
        Workflow {
            name: self.name,
            handlers: self.handlers,
        }
    }
}

/// A set of handlers keyed by event kind
pub struct Workflow<E: WorkflowEvent, S: Send + 'static> {
    name: String,
    handlers: HandlerMap<E, S>,
}

impl<E: WorkflowEvent, S: Send + 'static> std::fmt::Debug for Workflow<E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("name", &self.name)
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<E, S> Workflow<E, S>
where
    E: WorkflowEvent,
    S: Send + 'static,
{
    /// Start building a workflow
    pub fn builder(name: impl Into<String>) -> WorkflowBuilder<E, S> {
        WorkflowBuilder {
            name: name.into(),
            handlers: HashMap::new(),
        }
    }

    /// Workflow name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of handlers registered for a kind
    pub fn handler_count(&self, kind: E::Kind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Start a run with a fresh cancellation token
    pub fn run(self: &Arc<Self>, state: S, start: E) -> WorkflowRun<E> {
        self.run_with_cancellation(state, start, CancellationToken::new())
    }

    /// Start a run that stops dispatching once `cancel` fires.
    ///
    /// The start event is the first item of the run's output.
    pub fn run_with_cancellation(
        self: &Arc<Self>,
        state: S,
        start: E,
        cancel: CancellationToken,
    ) -> WorkflowRun<E> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut ctx = RunContext::new(state, tx, cancel.clone());
        let run_id = ctx.run_id();
        ctx.emit(start);

        let span = info_span!("workflow_run", workflow = %self.name, %run_id);
        let handle = tokio::spawn(Arc::clone(self).drive(ctx).instrument(span));

        WorkflowRun {
            run_id,
            events: Some(rx),
            cancel,
            handle,
        }
    }

    async fn drive(self: Arc<Self>, mut ctx: RunContext<E, S>) {
        let cancel = ctx.cancellation_token().clone();
        info!("Run started");

        while let Some(event) = ctx.next_pending() {
            if cancel.is_cancelled() {
                info!(events = ctx.emitted_count(), "Run cancelled");
                return;
            }

            let is_stop = event.is_stop();
            match self.handlers.get(&event.kind()) {
                Some(handlers) => {
                    for handler in handlers {
                        debug!(handler = handler.name(), kind = ?event.kind(), "Dispatching event");
                        let outcome = tokio::select! {
                            biased;
                            () = cancel.cancelled() => {
                                info!(handler = handler.name(), "Run cancelled during handler");
                                return;
                            }
                            outcome = handler.handle(event.clone(), &mut ctx) => outcome,
                        };

                        if let Err(err) = outcome {
                            error!(
                                handler = handler.name(),
                                category = err.category(),
                                "Handler failed: {err}"
                            );
                            ctx.fail(AgentError::handler_failed(handler.name(), err.to_string()));
                            return;
                        }
                    }
                }
                None => debug!(kind = ?event.kind(), "No handler registered"),
            }

            if is_stop {
                info!(events = ctx.emitted_count(), "Run stopped");
                return;
            }
        }

        warn!("Run ended without a stop event");
        ctx.fail(AgentError::workflow(
            &self.name,
            "no pending events left and no stop event was emitted",
        ));
    }
}

/// Handle to a running workflow
#[derive(Debug)]
pub struct WorkflowRun<E: WorkflowEvent> {
    run_id: Uuid,
    events: Option<mpsc::UnboundedReceiver<Result<E>>>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl<E: WorkflowEvent> WorkflowRun<E> {
    /// Identifier of this run
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Cancellation token of this run
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the run. Pending events are dropped and no further handlers start.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the driver task has exited
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stream all events up to and including the stop event.
    ///
    /// The event sequence can be taken once; later calls return an empty stream.
    pub fn stream(&mut self) -> EventStream<E> {
        self.stream_until(|_| false)
    }

    /// Stream events up to and including the first one matching `predicate`,
    /// or the stop event, whichever comes first.
    pub fn stream_until<P>(&mut self, predicate: P) -> EventStream<E>
    where
        P: Fn(&E) -> bool + Send + 'static,
    {
        let Some(rx) = self.events.take() else {
            return Box::pin(stream::empty());
        };

        let reader = RunReader {
            rx,
            cancel: self.cancel.clone(),
            predicate,
            done: false,
        };

        Box::pin(stream::unfold(reader, |mut reader| async move {
            if reader.done {
                return None;
            }
            let item = tokio::select! {
                biased;
                () = reader.cancel.cancelled() => None,
                item = reader.rx.recv() => item,
            }?;
            reader.done = match &item {
                Ok(event) => event.is_stop() || (reader.predicate)(event),
                Err(_) => true,
            };
            Some((item, reader))
        }))
    }

    /// Drain the run and collect its events.
    ///
    /// Fails on the first error item, or with [`AgentError::Cancelled`] when
    /// the run was cancelled before its stop event.
    pub async fn collect(mut self) -> Result<Vec<E>> {
        let mut events = Vec::new();
        let mut stream = self.stream();
        while let Some(item) = stream.next().await {
            events.push(item?);
        }

        let stopped = events.last().is_some_and(E::is_stop);
        if !stopped && self.cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }
        Ok(events)
    }
}

struct RunReader<E, P> {
    rx: mpsc::UnboundedReceiver<Result<E>>,
    cancel: CancellationToken,
    predicate: P,
    done: bool,
}
