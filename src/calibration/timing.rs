use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct StageTiming {
    pub name: String,
    pub duration: Duration,
}

/// Wall-clock duration of each calibration stage, in execution order.
#[derive(Debug, Clone, Default)]
pub struct StageTimings {
    stages: Vec<StageTiming>,
    by_name: HashMap<String, Duration>,
}

impl StageTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stage(&mut self, name: impl Into<String>, duration: Duration) {
        let name = name.into();
        *self.by_name.entry(name.clone()).or_insert(Duration::ZERO) += duration;
        self.stages.push(StageTiming { name, duration });
    }

    /// Runs `f` and records how long it took under `name`.
    pub fn measure<T>(&mut self, name: &str, f: impl FnOnce() -> T) -> T {
        let timer = StageTimer::start(name);
        let value = f();
        let (name, duration) = timer.stop();
        self.add_stage(name, duration);
        value
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    /// Summed duration of every stage recorded under `name`.
    pub fn get_stage(&self, name: &str) -> Option<Duration> {
        self.by_name.get(name).copied()
    }

    pub fn stages(&self) -> &[StageTiming] {
        &self.stages
    }

    pub fn log_summary(&self) {
        let total = self.total_duration();
        for stage in &self.stages {
            let percentage = if total.as_secs_f64() > 0.0 {
                stage.duration.as_secs_f64() / total.as_secs_f64() * 100.0
            } else {
                0.0
            };
            info!(
                "{:<24} {:>10.3}ms ({:>5.1}%)",
                stage.name,
                stage.duration.as_secs_f64() * 1000.0,
                percentage
            );
        }
        info!("{:<24} {:>10.3}ms", "total", total.as_secs_f64() * 1000.0);
    }
}

struct StageTimer {
    start: Instant,
    name: String,
}

impl StageTimer {
    fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    fn stop(self) -> (String, Duration) {
        (self.name, self.start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_stage_names_accumulate() {
        let mut timings = StageTimings::new();
        timings.add_stage("solve", Duration::from_millis(5));
        timings.add_stage("average", Duration::from_millis(1));
        timings.add_stage("solve", Duration::from_millis(2));

        assert_eq!(timings.get_stage("solve"), Some(Duration::from_millis(7)));
        assert_eq!(timings.get_stage("preview"), None);
        assert_eq!(timings.total_duration(), Duration::from_millis(8));
        assert_eq!(timings.stages().len(), 3);
        assert_eq!(timings.stages()[1].name, "average");
    }

    #[test]
    fn test_measure_returns_closure_value() {
        let mut timings = StageTimings::new();

        let value = timings.measure("compute", || 6 * 7);

        assert_eq!(value, 42);
        assert!(timings.get_stage("compute").is_some());
    }
}
