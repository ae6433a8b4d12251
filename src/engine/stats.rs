// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Mutex;
use std::time::Duration;

/// Cumulative cost of one update across all units and workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateTotals {
    pub iterations: u64,
    pub elapsed: Duration,
}

/// Per-update totals, indexed like the update catalog.
#[derive(Debug)]
pub struct UpdateStatistics {
    totals: Mutex<Vec<UpdateTotals>>,
}

impl UpdateStatistics {
    pub fn new(update_count: usize) -> Self {
        Self {
            totals: Mutex::new(vec![UpdateTotals::default(); update_count]),
        }
    }

    pub fn record(&self, index: usize, iterations: u32, elapsed: Duration) {
        let mut totals = self.totals.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(entry) = totals.get_mut(index) {
            entry.iterations += u64::from(iterations);
            entry.elapsed += elapsed;
        }
    }

    pub fn snapshot(&self) -> Vec<UpdateTotals> {
        self.totals
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_records_from_many_threads() {
        let stats = Arc::new(UpdateStatistics::new(2));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..10 {
                        stats.record(1, 3, Duration::from_millis(1));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let totals = stats.snapshot();
        assert_eq!(totals[0], UpdateTotals::default());
        assert_eq!(totals[1].iterations, 120);
        assert_eq!(totals[1].elapsed, Duration::from_millis(40));
    }

    #[test]
    fn test_out_of_range_index_is_ignored() {
        let stats = UpdateStatistics::new(1);
        stats.record(5, 1, Duration::ZERO);
        assert_eq!(stats.snapshot().len(), 1);
    }
}
