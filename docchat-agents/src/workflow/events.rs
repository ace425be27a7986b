//! Event contract for the workflow engine.
//!
//! Workflows are generic over a closed event type. Each event exposes a
//! statically known kind used to route it to the handlers registered for that
//! kind, and declares whether it terminates the run.

use crate::error::Result;
use futures::Stream;
use std::{fmt::Debug, hash::Hash, pin::Pin};

/// Base trait for all workflow events
pub trait WorkflowEvent: Clone + Send + Sync + Debug + 'static {
    /// Discriminant used to route events to handlers
    type Kind: Copy + Eq + Hash + Send + Sync + Debug + 'static;

    /// Get the event kind
    fn kind(&self) -> Self::Kind;

    /// Whether this event terminates the run
    fn is_stop(&self) -> bool;
}

/// Ordered stream of events emitted by one run.
///
/// An `Err` item reports a failure that aborted the run and is always the last item.
pub type EventStream<E> = Pin<Box<dyn Stream<Item = Result<E>> + Send>>;
