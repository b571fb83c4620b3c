use std::time::{Duration, Instant};

use serde_json::{json, Value};

/// Request phases, each with its own timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Global,
    Verification,
    Authentication,
    Processing,
    Formatting,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Global,
        Phase::Verification,
        Phase::Authentication,
        Phase::Processing,
        Phase::Formatting,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Global => "global",
            Phase::Verification => "verification",
            Phase::Authentication => "authentication",
            Phase::Processing => "processing",
            Phase::Formatting => "formatting",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Timer {
    started: Option<Instant>,
    elapsed: Option<Duration>,
}

/// Per-phase timers of one request.
///
/// A timer that never started reads as `None` (`null` in the debug block);
/// one still running reads as the time elapsed so far.
#[derive(Debug, Clone, Default)]
pub struct Timings {
    timers: [Timer; 5],
}

impl Timings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn index(phase: Phase) -> usize {
        match phase {
            Phase::Global => 0,
            Phase::Verification => 1,
            Phase::Authentication => 2,
            Phase::Processing => 3,
            Phase::Formatting => 4,
        }
    }

    pub fn start(&mut self, phase: Phase) {
        self.timers[Self::index(phase)] = Timer {
            started: Some(Instant::now()),
            elapsed: None,
        };
    }

    /// Stop a running timer. Stopping an idle one does nothing.
    pub fn stop(&mut self, phase: Phase) {
        let timer = &mut self.timers[Self::index(phase)];
        if let (Some(started), None) = (timer.started, timer.elapsed) {
            timer.elapsed = Some(started.elapsed());
        }
    }

    /// Time `f` under `phase`. The timer stops on every exit path.
    pub fn measure<T>(&mut self, phase: Phase, f: impl FnOnce() -> T) -> T {
        self.start(phase);
        let out = f();
        self.stop(phase);
        out
    }

    #[must_use]
    pub fn get(&self, phase: Phase) -> Option<Duration> {
        let timer = self.timers[Self::index(phase)];
        match (timer.started, timer.elapsed) {
            (_, Some(elapsed)) => Some(elapsed),
            (Some(started), None) => Some(started.elapsed()),
            (None, None) => None,
        }
    }

    /// `{global, verification, authentication, processing, formatting}` in
    /// seconds.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        for phase in Phase::ALL {
            let seconds = self
                .get(phase)
                .map_or(Value::Null, |d| json!(d.as_secs_f64()));
            map.insert(phase.as_str().to_string(), seconds);
        }
        Value::Object(map)
    }
}
