//! Generic event-driven workflow engine.
//!
//! Handlers react to typed events and emit new ones through a per-run
//! [`RunContext`]. Every emitted event is both delivered to the caller's
//! [`EventStream`] and dispatched to the handlers registered for its kind.

pub mod context;
pub mod engine;
pub mod events;

pub use context::RunContext;
pub use engine::{EventHandler, Workflow, WorkflowBuilder, WorkflowRun};
pub use events::{EventStream, WorkflowEvent};
