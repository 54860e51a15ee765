//! Percentage metrics derived from counter samples.
//!
//! CPU usage needs two samples and therefore keeps the previous one as a
//! baseline. Memory usage and relative process CPU share are pure
//! functions of a single sample or ranking pass.

use crate::system::{CpuSample, MemorySample};

/// Result of feeding one sample into [`CpuUsageEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CpuUsage {
    /// First sample of the process lifetime; no rate can be derived yet.
    Initializing,
    /// Busy share of the ticks elapsed since the baseline, in [0, 100].
    Percent(f64),
}

impl CpuUsage {
    pub fn percent(&self) -> Option<f64> {
        match self {
            CpuUsage::Initializing => None,
            CpuUsage::Percent(p) => Some(*p),
        }
    }
}

/// Delta engine for aggregate CPU usage.
///
/// Holds the most recent sample as the baseline. The baseline is set on the
/// first call and replaced on every later call; it is never cleared.
#[derive(Debug, Default)]
pub struct CpuUsageEngine {
    baseline: Option<CpuSample>,
}

impl CpuUsageEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.baseline.is_some()
    }

    /// Computes usage against the stored baseline and stores `sample` as
    /// the new baseline.
    ///
    /// A counter that went backwards (reset) contributes a zero delta. When
    /// no ticks elapsed at all the result is 0%.
    pub fn compute(&mut self, sample: CpuSample) -> CpuUsage {
        let previous = match self.baseline.replace(sample) {
            Some(prev) => prev,
            None => return CpuUsage::Initializing,
        };

        let current = sample.fields();
        let before = previous.fields();

        let mut total_delta: u64 = 0;
        for (now, then) in current.iter().zip(before.iter()) {
            total_delta = total_delta.saturating_add(now.saturating_sub(*then));
        }
        let idle_delta = sample.idle.saturating_sub(previous.idle);

        if total_delta == 0 {
            return CpuUsage::Percent(0.0);
        }

        let usage = 100.0 * (1.0 - (idle_delta as f64 / total_delta as f64));
        CpuUsage::Percent(usage.clamp(0.0, 100.0))
    }
}

/// Memory figures in whole MB, derived from one [`MemorySample`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryUsage {
    pub total_mb: u64,
    pub used_mb: u64,
    pub free_mb: u64,
    pub usage_percent: f64,
}

/// Converts kB totals to truncated MB and derives used memory and usage.
///
/// `used_mb` is `total_mb - free_mb` (saturating), so the three MB figures
/// always add up. A zero total reports 0%.
pub fn memory_usage(sample: &MemorySample) -> MemoryUsage {
    let total_mb = sample.total_kb / 1024;
    let free_mb = sample.free_kb / 1024;
    let used_mb = total_mb.saturating_sub(free_mb);

    let usage_percent = if total_mb > 0 {
        (used_mb as f64 / total_mb as f64) * 100.0
    } else {
        0.0
    };

    MemoryUsage {
        total_mb,
        used_mb,
        free_mb,
        usage_percent,
    }
}

/// CPU time of one process relative to the busiest process of the pass.
pub fn relative_cpu_percent(total_time: u64, max_total_time: u64) -> f64 {
    if max_total_time == 0 {
        return 0.0;
    }
    (100.0 * total_time as f64) / max_total_time as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(fields: [u64; 7]) -> CpuSample {
        CpuSample::from_fields(fields)
    }

    #[test]
    fn test_first_sample_initializes() {
        let mut engine = CpuUsageEngine::new();
        assert!(!engine.is_initialized());
        assert_eq!(engine.compute(sample([1, 2, 3, 4, 5, 6, 7])), CpuUsage::Initializing);
        assert!(engine.is_initialized());
        assert_ne!(engine.compute(sample([1, 2, 3, 4, 5, 6, 7])), CpuUsage::Initializing);
    }

    #[test]
    fn test_usage_from_two_samples() {
        let mut engine = CpuUsageEngine::new();
        engine.compute(sample([100, 0, 100, 800, 0, 0, 0]));
        // 100 busy ticks + 100 idle ticks elapsed
        let usage = engine.compute(sample([150, 0, 150, 900, 0, 0, 0]));
        assert_eq!(usage, CpuUsage::Percent(50.0));
    }

    #[test]
    fn test_usage_counts_iowait_as_busy() {
        let mut engine = CpuUsageEngine::new();
        engine.compute(sample([0; 7]));
        let usage = engine.compute(sample([0, 0, 0, 75, 25, 0, 0]));
        assert_eq!(usage.percent(), Some(25.0));
    }

    #[test]
    fn test_zero_elapsed_ticks_is_zero_percent() {
        let mut engine = CpuUsageEngine::new();
        let s = sample([10, 20, 30, 40, 50, 60, 70]);
        engine.compute(s);
        assert_eq!(engine.compute(s), CpuUsage::Percent(0.0));
    }

    #[test]
    fn test_counter_reset_is_clamped() {
        let mut engine = CpuUsageEngine::new();
        engine.compute(sample([1000, 10, 500, 9000, 40, 5, 5]));
        // user and idle went backwards
        let usage = engine.compute(sample([10, 20, 600, 100, 40, 5, 5]));
        let pct = usage.percent().unwrap();
        assert!(!pct.is_nan());
        assert!((0.0..=100.0).contains(&pct));
        // only nice (+10) and system (+100) advanced, idle delta clamps to 0
        assert_eq!(pct, 100.0);
    }

    #[test]
    fn test_baseline_replaced_every_call() {
        let mut engine = CpuUsageEngine::new();
        engine.compute(sample([0; 7]));
        engine.compute(sample([0, 0, 0, 0, 0, 0, 0]));
        engine.compute(sample([0, 0, 0, 100, 0, 0, 0]));
        // delta against the previous call, not the first one
        let usage = engine.compute(sample([100, 0, 0, 100, 0, 0, 0]));
        assert_eq!(usage, CpuUsage::Percent(100.0));
    }

    #[test]
    fn test_monotonic_samples_stay_in_range() {
        let mut engine = CpuUsageEngine::new();
        let mut fields = [0u64; 7];
        engine.compute(sample(fields));
        for step in 1..50u64 {
            for (i, f) in fields.iter_mut().enumerate() {
                *f += (step * (i as u64 + 3)) % 17;
            }
            let pct = engine.compute(sample(fields)).percent().unwrap();
            assert!((0.0..=100.0).contains(&pct), "step {step}: {pct}");
        }
    }

    #[test]
    fn test_memory_usage() {
        let usage = memory_usage(&MemorySample {
            total_kb: 10240,
            free_kb: 2048,
        });
        assert_eq!(usage.total_mb, 10);
        assert_eq!(usage.free_mb, 2);
        assert_eq!(usage.used_mb, 8);
        assert_eq!(usage.usage_percent, 80.0);
    }

    #[test]
    fn test_memory_usage_truncates_to_mb() {
        let usage = memory_usage(&MemorySample {
            total_kb: 16_000_500,
            free_kb: 1_000_900,
        });
        assert_eq!(usage.total_mb, 15625);
        assert_eq!(usage.free_mb, 977);
        assert_eq!(usage.used_mb, usage.total_mb - usage.free_mb);
    }

    #[test]
    fn test_memory_usage_zero_total() {
        let usage = memory_usage(&MemorySample {
            total_kb: 0,
            free_kb: 2048,
        });
        assert_eq!(usage.usage_percent, 0.0);
        assert_eq!(usage.used_mb, 0);
    }

    #[test]
    fn test_relative_cpu_percent() {
        assert_eq!(relative_cpu_percent(200, 200), 100.0);
        assert_eq!(relative_cpu_percent(10, 200), 5.0);
        assert_eq!(relative_cpu_percent(0, 0), 0.0);
    }
}
