use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::Location;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Frames kept per request; older ones are dropped first.
pub const CALL_STACK_CAPACITY: usize = 512;

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub name: String,
    pub filename: String,
    #[serde(rename = "lineNumber")]
    pub line_number: u32,
    #[serde(rename = "calledBy")]
    pub called_by: Option<String>,
}

struct Recorder {
    base_dir: PathBuf,
    frames: VecDeque<Frame>,
    active: Vec<String>,
}

thread_local! {
    static RECORDER: RefCell<Option<Recorder>> = const { RefCell::new(None) };
}

/// Relative paths are compiled from the application's own sources; absolute
/// ones must sit beneath the base directory.
fn under_base_dir(base_dir: &Path, file: &str) -> bool {
    let path = Path::new(file);
    path.is_relative() || path.starts_with(base_dir)
}

/// Call-stack recording bound to the current thread. Dropping it uninstalls
/// the recorder.
#[derive(Debug)]
pub struct CallStackRecording {
    _private: (),
}

impl CallStackRecording {
    #[must_use]
    pub fn start(base_dir: impl Into<PathBuf>) -> Self {
        RECORDER.with(|recorder| {
            *recorder.borrow_mut() = Some(Recorder {
                base_dir: base_dir.into(),
                frames: VecDeque::new(),
                active: Vec::new(),
            });
        });
        Self { _private: () }
    }

    /// Frames recorded so far, oldest first.
    #[must_use]
    pub fn frames(&self) -> Vec<Frame> {
        RECORDER.with(|recorder| {
            recorder
                .borrow()
                .as_ref()
                .map(|r| r.frames.iter().cloned().collect())
                .unwrap_or_default()
        })
    }
}

impl Drop for CallStackRecording {
    fn drop(&mut self) {
        RECORDER.with(|recorder| *recorder.borrow_mut() = None);
    }
}

/// Marks a traced scope; leaving it pops the frame from the active stack.
#[derive(Debug)]
#[must_use = "the scope ends when the guard is dropped"]
pub struct TraceGuard {
    recorded: bool,
}

impl Drop for TraceGuard {
    fn drop(&mut self) {
        if !self.recorded {
            return;
        }
        RECORDER.with(|recorder| {
            if let Some(r) = recorder.borrow_mut().as_mut() {
                r.active.pop();
            }
        });
    }
}

/// Record entry into `name` at the caller's location.
///
/// A no-op unless a recording is active on this thread.
///
/// ```rust
/// fn load_user() {
///     let _scope = nasse::record::trace("load_user");
///     // ...
/// }
/// # load_user();
/// ```
#[track_caller]
pub fn trace(name: &str) -> TraceGuard {
    let location = Location::caller();
    let recorded = RECORDER.with(|recorder| {
        let mut borrowed = recorder.borrow_mut();
        let Some(r) = borrowed.as_mut() else {
            return false;
        };
        if !under_base_dir(&r.base_dir, location.file()) {
            return false;
        }
        if r.frames.len() == CALL_STACK_CAPACITY {
            r.frames.pop_front();
        }
        r.frames.push_back(Frame {
            name: name.to_string(),
            filename: location.file().to_string(),
            line_number: location.line(),
            called_by: r.active.last().cloned(),
        });
        r.active.push(name.to_string());
        true
    });
    TraceGuard { recorded }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_records_nothing() {
        let _scope = trace("nothing");
        let recording = CallStackRecording::start(".");
        assert!(recording.frames().is_empty());
    }

    #[test]
    fn test_nested_frames() {
        let recording = CallStackRecording::start(std::env::current_dir().unwrap());
        {
            let _outer = trace("outer");
            let _inner = trace("inner");
        }
        let _again = trace("again");
        let frames = recording.frames();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].called_by, None);
        assert_eq!(frames[1].called_by.as_deref(), Some("outer"));
        assert_eq!(frames[2].called_by, None);
        assert!(frames[0].filename.ends_with("call_stack.rs"));
    }

    #[test]
    fn test_ring_buffer() {
        let recording = CallStackRecording::start(".");
        for _ in 0..CALL_STACK_CAPACITY + 10 {
            let _scope = trace("loop");
        }
        assert_eq!(recording.frames().len(), CALL_STACK_CAPACITY);
    }

    #[test]
    fn test_base_dir_filter() {
        assert!(under_base_dir(Path::new("/srv/app"), "src/main.rs"));
        assert!(under_base_dir(Path::new("/srv/app"), "/srv/app/src/main.rs"));
        assert!(!under_base_dir(Path::new("/srv/app"), "/home/me/.cargo/registry/x.rs"));
    }
}
