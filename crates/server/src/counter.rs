//! Request ordinals for log output

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared, monotonically increasing count of admitted index requests
///
/// Only used to label log lines. Clones share the same count.
#[derive(Debug, Clone, Default)]
pub struct RequestCounter {
    count: Arc<AtomicU64>,
}

impl RequestCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request and return its 1-based ordinal
    pub fn increment(&self) -> u64 {
        self.count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Requests counted so far
    #[must_use]
    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_concurrent_increments_are_unique() {
        let counter = RequestCounter::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = counter.clone();
                std::thread::spawn(move || (0..100).map(|_| counter.increment()).collect::<Vec<_>>())
            })
            .collect();

        let ordinals: HashSet<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();

        assert_eq!(ordinals.len(), 800);
        assert_eq!(ordinals.iter().min(), Some(&1));
        assert_eq!(ordinals.iter().max(), Some(&800));
        assert_eq!(counter.get(), 800);
    }
}
