//! Runtime setup: thread pool sizing.

use crate::config::ParallelConfig;

/// Configure rayon global thread pool once at startup
pub fn configure_thread_pool(jobs: usize) {
    let mut builder = rayon::ThreadPoolBuilder::new();

    if jobs > 0 {
        builder = builder.num_threads(jobs);
    }

    if let Err(e) = builder.build_global() {
        // Already configured by an earlier call in this process
        tracing::debug!("Thread pool already configured: {}", e);
    }
}

/// Worker count from `--jobs`, falling back to the `[parallel]` table.
pub fn resolve_jobs(jobs: usize, parallel: &ParallelConfig) -> usize {
    if parallel.enabled && jobs > 0 {
        return jobs;
    }
    parallel.effective_concurrency()
}
