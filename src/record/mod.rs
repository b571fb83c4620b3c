//! # Record Module
//!
//! Per-request instrumentation.
//!
//! A request runs inside a record region: phase [`Timings`] wrapped by a
//! global timer, a [`LogRecording`] that buffers the thread's log events, and
//! in debug mode with the `call_stack` hint a [`CallStackRecording`] fed by
//! [`trace`] scopes. Everything is thread-local and released when the region
//! ends, so requests never share buffers.

mod call_stack;
mod logs;
mod timings;

pub use call_stack::{trace, CallStackRecording, Frame, TraceGuard, CALL_STACK_CAPACITY};
pub use logs::{LogRecording, RecordLayer};
pub use timings::{Phase, Timings};
