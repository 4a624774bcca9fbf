//! Edge-triggered pothole event detection.
//!
//! A pothole event begins when severity rises from zero to a nonzero value.
//! Sustained nonzero readings belong to the same event; a return to zero
//! re-arms detection.
//!
//! The detector is a plain `&mut self` state machine. Callers sharing one
//! detector between tasks must serialize access (the ingestion pipeline
//! holds it behind a mutex).

/// Detector memory carried from one reading to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectorState {
    /// Severity of the previously processed reading.
    pub last_severity: u64,
    /// Number of pothole events detected so far.
    pub event_count: u64,
}

/// Outcome of processing one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// True iff this reading starts a new pothole event.
    pub pothole_event: bool,
    /// Event count after processing this reading.
    pub pothole_count: u64,
}

/// Stateful rising-edge detector over reading severities.
#[derive(Debug, Default)]
pub struct EventDetector {
    state: DetectorState,
}

impl EventDetector {
    /// Create a detector in the initial state `(last_severity = 0, event_count = 0)`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one severity value.
    ///
    /// Checks against the previous severity before remembering the new one.
    pub fn process(&mut self, severity: u64) -> Detection {
        let pothole_event = severity > 0 && self.state.last_severity == 0;
        if pothole_event {
            self.state.event_count += 1;
        }
        self.state.last_severity = severity;

        Detection {
            pothole_event,
            pothole_count: self.state.event_count,
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> DetectorState {
        self.state
    }
}
