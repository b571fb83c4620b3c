use std::cell::RefCell;
use std::fmt::{self, Write as _};

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context as LayerContext;
use tracing_subscriber::Layer;

thread_local! {
    static BUFFER: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

/// Collects every event emitted on the current thread while a record region
/// is open.
///
/// Installed by [`crate::logging::init_logging_with_config`]; without it the
/// debug block's `logs` stays empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordLayer;

impl RecordLayer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

impl<S: Subscriber> Layer<S> for RecordLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        let recording = BUFFER.with(|buffer| buffer.borrow().is_some());
        if !recording {
            return;
        }
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        let metadata = event.metadata();
        let line = format!(
            "[{}] {}: {}{}",
            metadata.level(),
            metadata.target(),
            visitor.message,
            visitor.fields
        );
        BUFFER.with(|buffer| {
            if let Some(lines) = buffer.borrow_mut().as_mut() {
                lines.push(line);
            }
        });
    }
}

/// An open log buffer. Closing (dropping) it restores the enclosing one.
#[derive(Debug)]
pub struct LogRecording {
    previous: Option<Vec<String>>,
}

impl LogRecording {
    /// Start buffering the current thread's events.
    #[must_use]
    pub fn start() -> Self {
        let previous = BUFFER.with(|buffer| buffer.borrow_mut().replace(Vec::new()));
        Self { previous }
    }

    /// Lines recorded so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        BUFFER.with(|buffer| buffer.borrow().clone().unwrap_or_default())
    }
}

impl Drop for LogRecording {
    fn drop(&mut self) {
        let previous = self.previous.take();
        BUFFER.with(|buffer| *buffer.borrow_mut() = previous);
    }
}
