/// Latency samples collected during one reporting period.
///
/// Owned exclusively by the aggregator loop: appends and resets happen
/// from a single task, so there is no interior locking.
#[derive(Debug, Default)]
pub struct Window {
    samples: Vec<i64>,
}

/// Derived statistics over one window, all in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowStats {
    pub max: i64,
    pub p99: i64,
    pub p95: i64,
    pub avg: i64,
}

impl Window {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one sample in nanoseconds. O(1) amortized.
    pub fn append(&mut self, sample_ns: i64) {
        self.samples.push(sample_ns);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Clears the window for the next reporting period.
    pub fn reset(&mut self) {
        self.samples.clear();
    }

    /// Computes max, p99, p95 and average over the collected samples.
    ///
    /// The percentiles are exact rank statistics: the value at 1-indexed
    /// rank `ceil(q * len)` of the ascending sort, so a fixed multiset of
    /// samples yields the same result whatever their arrival order. The
    /// average truncates like any `i64` division.
    ///
    /// # Panics
    ///
    /// Panics on an empty window; callers check `is_empty` first.
    pub fn stats(&self) -> WindowStats {
        assert!(!self.samples.is_empty(), "stats on an empty window");

        let mut sorted = self.samples.clone();
        sorted.sort_unstable();

        let sum: i64 = sorted.iter().sum();

        WindowStats {
            max: sorted[sorted.len() - 1],
            p99: rank(&sorted, 99),
            p95: rank(&sorted, 95),
            avg: sum / sorted.len() as i64,
        }
    }
}

/// Value at 1-indexed rank `ceil(pct/100 * len)`, clamped into the slice.
fn rank(sorted: &[i64], pct: usize) -> i64 {
    let n = sorted.len();
    let rank = (n * pct).div_ceil(100).clamp(1, n);
    sorted[rank - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats_of(samples: &[i64]) -> WindowStats {
        let mut window = Window::new();
        for &sample in samples {
            window.append(sample);
        }
        window.stats()
    }

    #[test]
    fn five_sample_reference_vector() {
        let stats = stats_of(&[10, 20, 30, 40, 50]);

        // rank ceil(0.95 * 5) = 5 and ceil(0.99 * 5) = 5, both the last
        // element
        assert_eq!(stats.max, 50);
        assert_eq!(stats.p99, 50);
        assert_eq!(stats.p95, 50);
        assert_eq!(stats.avg, 30);
    }

    #[test]
    fn percentile_ranks_on_a_hundred_samples() {
        let samples: Vec<i64> = (1..=100).collect();
        let stats = stats_of(&samples);

        assert_eq!(stats.max, 100);
        assert_eq!(stats.p99, 99);
        assert_eq!(stats.p95, 95);
        assert_eq!(stats.avg, 50); // 5050 / 100 truncates the .5
    }

    #[test]
    fn arrival_order_is_irrelevant() {
        assert_eq!(
            stats_of(&[50, 10, 40, 20, 30]),
            stats_of(&[10, 20, 30, 40, 50])
        );
    }

    #[test]
    fn average_truncates() {
        assert_eq!(stats_of(&[1, 2]).avg, 1);
    }

    #[test]
    fn single_sample_window() {
        let stats = stats_of(&[7]);

        assert_eq!(stats.max, 7);
        assert_eq!(stats.p99, 7);
        assert_eq!(stats.p95, 7);
        assert_eq!(stats.avg, 7);
    }

    #[test]
    fn max_dominates_percentiles_and_avg_stays_in_range() {
        let samples = [3, 141, 59, 26, 535, 89, 79, 323];
        let stats = stats_of(&samples);

        assert!(stats.max >= stats.p99);
        assert!(stats.p99 >= stats.p95);
        assert!(stats.avg >= *samples.iter().min().unwrap());
        assert!(stats.avg <= stats.max);
    }

    #[test]
    fn reset_empties_the_window() {
        let mut window = Window::new();
        window.append(42);
        assert_eq!(window.len(), 1);

        window.reset();
        assert!(window.is_empty());
    }

    #[test]
    #[should_panic(expected = "empty window")]
    fn stats_on_empty_window_panics() {
        Window::new().stats();
    }
}
