use std::collections::HashMap;
use std::time::Instant;

/// Observer for live-loop and one-shot events.
///
/// Keeps the use cases free of any particular output mechanism; the CLI
/// logs a timing summary, the desktop app and tests discard everything.
pub trait CycleLogger: Send {
    /// Record how long a named stage took in one cycle.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record the number of faces found in one cycle.
    fn faces(&mut self, count: usize);

    /// A cycle that could not complete normally.
    fn cycle_failed(&mut self, stage: &str, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

pub struct NullCycleLogger;

impl CycleLogger for NullCycleLogger {
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn faces(&mut self, _count: usize) {}
    fn cycle_failed(&mut self, _stage: &str, _message: &str) {}
}

/// Running totals for one named stage.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageStats {
    pub count: u64,
    pub total_ms: f64,
    pub max_ms: f64,
}

impl StageStats {
    fn record(&mut self, duration_ms: f64) {
        self.count += 1;
        self.total_ms += duration_ms;
        self.max_ms = self.max_ms.max(duration_ms);
    }

    pub fn avg_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms / self.count as f64
        }
    }
}

/// `log`-backed logger that aggregates per-stage timings for a summary
/// report. Only running totals are kept, so a loop can run indefinitely.
pub struct TimingCycleLogger {
    stages: HashMap<String, StageStats>,
    cycles: u64,
    total_faces: u64,
    failures: u64,
    start_time: Instant,
}

impl TimingCycleLogger {
    pub fn new() -> Self {
        Self {
            stages: HashMap::new(),
            cycles: 0,
            total_faces: 0,
            failures: 0,
            start_time: Instant::now(),
        }
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn stage(&self, stage: &str) -> Option<StageStats> {
        self.stages.get(stage).copied()
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns the formatted summary string, or `None` if nothing ran.
    pub fn summary_string(&self) -> Option<String> {
        if self.stages.is_empty() && self.cycles == 0 && self.failures == 0 {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Live summary ({} cycles, {} failed, {elapsed_s:.1}s total):",
            self.cycles, self.failures
        )];

        let mut stages: Vec<_> = self.stages.iter().collect();
        stages.sort_by(|a, b| a.0.cmp(b.0));
        for (stage, stats) in stages {
            lines.push(format!(
                "  {stage:10}: avg {:6.1}ms  max {:6.1}ms  total {:7.0}ms",
                stats.avg_ms(),
                stats.max_ms,
                stats.total_ms
            ));
        }

        if self.cycles > 0 {
            let avg_faces = self.total_faces as f64 / self.cycles as f64;
            lines.push(format!("  faces: avg {avg_faces:.1}"));
        }

        Some(lines.join("\n"))
    }
}

impl Default for TimingCycleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleLogger for TimingCycleLogger {
    fn timing(&mut self, stage: &str, duration_ms: f64) {
        log::trace!("{stage} took {duration_ms:.1}ms");
        match self.stages.get_mut(stage) {
            Some(stats) => stats.record(duration_ms),
            None => {
                let mut stats = StageStats::default();
                stats.record(duration_ms);
                self.stages.insert(stage.to_string(), stats);
            }
        }
    }

    fn faces(&mut self, count: usize) {
        log::debug!("Cycle found {count} face(s)");
        self.cycles += 1;
        self.total_faces += count as u64;
    }

    fn cycle_failed(&mut self, stage: &str, message: &str) {
        self.failures += 1;
        log::warn!("{stage} failed: {message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
