//! # Threading Configuration
//!
//! Worker-count defaults and rayon thread pool setup. The pipeline installs
//! a sized pool around the randomized partition search; the clustering stage
//! spawns its own scoped workers.

use crate::error::{QuasihapError, Result};

/// Default worker count: every available core but one, at least one.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
        .saturating_sub(1)
        .max(1)
}

/// Create a configured (non-global) thread pool.
pub fn build_thread_pool(n_threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .thread_name(|i| format!("quasihap-worker-{}", i))
        .build()
        .map_err(|e| QuasihapError::config(format!("failed to create thread pool: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_worker_count_positive() {
        assert!(default_worker_count() >= 1);
    }

    #[test]
    fn test_build_thread_pool() {
        let pool = build_thread_pool(2).unwrap();
        let sum = pool.install(|| (1..=10).sum::<i32>());
        assert_eq!(sum, 55);
    }
}
