//! Phase-weighted progress reporting.
//!
//! Each phase owns a fixed slice of `[0, 100]`, so progress moves forward
//! even when a phase finishes instantly or takes minutes.

use serde::{Deserialize, Serialize};

/// Orchestration phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Input validation and setup.
    Ingest,
    /// Segmentation or transform compilation.
    Compile,
    /// Calls into the media-processing capability.
    Process,
    /// Optional enrichment of results.
    Enrich,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Ingest, Phase::Compile, Phase::Process, Phase::Enrich];
}

/// Relative weight of each phase. Weights are normalized to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSchedule {
    pub ingest: f64,
    pub compile: f64,
    pub process: f64,
    pub enrich: f64,
}

impl Default for ProgressSchedule {
    fn default() -> Self {
        Self {
            ingest: 10.0,
            compile: 20.0,
            process: 60.0,
            enrich: 10.0,
        }
    }
}

impl ProgressSchedule {
    fn weight(&self, phase: Phase) -> f64 {
        let w = match phase {
            Phase::Ingest => self.ingest,
            Phase::Compile => self.compile,
            Phase::Process => self.process,
            Phase::Enrich => self.enrich,
        };
        if w.is_finite() && w > 0.0 {
            w
        } else {
            0.0
        }
    }

    /// `(start, end)` percentages covered by `phase`.
    pub fn range(&self, phase: Phase) -> (f64, f64) {
        let total: f64 = Phase::ALL.iter().map(|p| self.weight(*p)).sum();
        if total <= 0.0 {
            return (0.0, 100.0);
        }

        let mut start = 0.0;
        for p in Phase::ALL {
            let span = self.weight(p) * 100.0 / total;
            if p == phase {
                return (start, (start + span).min(100.0));
            }
            start += span;
        }
        (start, 100.0)
    }

    /// Overall percentage for `fraction` of `phase` done.
    pub fn percent(&self, phase: Phase, fraction: f64) -> f64 {
        let (start, end) = self.range(phase);
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        start + (end - start) * fraction
    }
}

/// Progress report delivered to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Overall progress in `[0, 100]`.
    pub percent: f64,
    pub phase: Phase,
}

/// Progress callback for orchestrated runs.
pub type ProgressCallback = Box<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Emits non-decreasing progress and goes silent once closed.
pub struct ProgressReporter {
    schedule: ProgressSchedule,
    callback: Option<ProgressCallback>,
    last: f64,
    emitted: bool,
    closed: bool,
}

impl ProgressReporter {
    pub fn new(schedule: ProgressSchedule, callback: Option<ProgressCallback>) -> Self {
        Self {
            schedule,
            callback,
            last: 0.0,
            emitted: false,
            closed: false,
        }
    }

    /// Report `fraction` of `phase` done. Backward moves are dropped.
    pub fn report(&mut self, phase: Phase, fraction: f64) {
        let percent = self.schedule.percent(phase, fraction);
        self.emit(phase, percent);
    }

    /// Emit 100% and close.
    pub fn finish(&mut self) {
        self.emit(Phase::Enrich, 100.0);
        self.close();
    }

    /// Stop emitting without a final report.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Highest percentage reported so far.
    pub fn last_percent(&self) -> f64 {
        self.last
    }

    fn emit(&mut self, phase: Phase, percent: f64) {
        if self.closed {
            return;
        }
        if self.emitted && percent <= self.last {
            return;
        }
        self.last = percent;
        self.emitted = true;
        if let Some(callback) = &self.callback {
            callback(ProgressUpdate { percent, phase });
        }
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("schedule", &self.schedule)
            .field("last", &self.last)
            .field("closed", &self.closed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn recorder() -> (ProgressCallback, Arc<Mutex<Vec<f64>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: ProgressCallback = Box::new(move |update| {
            sink.lock().unwrap().push(update.percent);
        });
        (callback, seen)
    }

    #[test]
    fn test_default_ranges() {
        let schedule = ProgressSchedule::default();
        assert_eq!(schedule.range(Phase::Ingest), (0.0, 10.0));
        assert_eq!(schedule.range(Phase::Compile), (10.0, 30.0));
        assert_eq!(schedule.range(Phase::Process), (30.0, 90.0));
        assert_eq!(schedule.range(Phase::Enrich), (90.0, 100.0));
        assert!((schedule.percent(Phase::Process, 0.5) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_weights_are_normalized() {
        let schedule = ProgressSchedule {
            ingest: 1.0,
            compile: 1.0,
            process: 1.0,
            enrich: 1.0,
        };
        assert_eq!(schedule.range(Phase::Compile), (25.0, 50.0));
        assert!((schedule.percent(Phase::Enrich, 1.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_reporter_is_monotonic() {
        let (callback, seen) = recorder();
        let mut reporter = ProgressReporter::new(ProgressSchedule::default(), Some(callback));
        reporter.report(Phase::Compile, 0.5);
        reporter.report(Phase::Ingest, 1.0);
        reporter.report(Phase::Compile, 0.5);
        reporter.report(Phase::Process, 0.0);
        assert_eq!(*seen.lock().unwrap(), vec![20.0, 30.0]);
    }

    #[test]
    fn test_reporter_silent_after_close() {
        let (callback, seen) = recorder();
        let mut reporter = ProgressReporter::new(ProgressSchedule::default(), Some(callback));
        reporter.report(Phase::Ingest, 0.0);
        reporter.finish();
        reporter.report(Phase::Enrich, 1.0);
        reporter.finish();
        assert_eq!(*seen.lock().unwrap(), vec![0.0, 100.0]);
        assert!(reporter.is_closed());
    }
}
