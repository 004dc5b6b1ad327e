//! Memory-aware batch scheduler.
//!
//! Scanned trees can hold tens of thousands of files; pushing every per-file
//! future into one unbounded join would retain all file contents and match
//! buffers at once. Work is split into macro-chunks and micro-batches with a
//! strict settlement barrier between micro-batches: batch N+1 never starts
//! before batch N has fully settled, so peak memory tracks a single
//! micro-batch. Heap pressure is sampled between completions and handled with
//! bounded cooperative relief pauses.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Samples process memory use as a ratio of a configured budget.
/// Injectable so tests can simulate pressure deterministically.
pub trait MemoryMonitor: Send + Sync {
    /// Current usage in [0.0, ..), where 1.0 means the budget is spent.
    /// Implementations that cannot measure report 0.0.
    fn usage_ratio(&self) -> f64;
}

/// Reads resident set size from `/proc/self/statm` against a byte budget.
pub struct ProcessMemoryMonitor {
    budget_bytes: u64,
}

impl ProcessMemoryMonitor {
    pub fn new(budget_bytes: u64) -> Self {
        Self {
            budget_bytes: budget_bytes.max(1),
        }
    }

    fn resident_bytes() -> Option<u64> {
        let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
        let resident_pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
        Some(resident_pages * 4096)
    }
}

impl MemoryMonitor for ProcessMemoryMonitor {
    fn usage_ratio(&self) -> f64 {
        match Self::resident_bytes() {
            Some(rss) => rss as f64 / self.budget_bytes as f64,
            None => 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Files per macro-chunk; pressure is always checked at chunk boundaries
    pub macro_chunk_size: usize,
    /// Files per micro-batch; also the concurrency bound within a batch
    pub micro_batch_size: usize,
    /// Additional pressure check after this many processed files
    pub check_interval: usize,
    /// Usage ratio above which relief pauses run
    pub pressure_threshold: f64,
    /// Upper bound on relief pauses per pressure episode
    pub max_relief_cycles: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            macro_chunk_size: 500,
            micro_batch_size: 20,
            check_interval: 25,
            pressure_threshold: 0.65,
            max_relief_cycles: 3,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchStats {
    pub processed: usize,
    pub failed: usize,
    pub relief_cycles: usize,
}

pub struct BatchScheduler {
    config: BatchConfig,
    monitor: Arc<dyn MemoryMonitor>,
}

impl BatchScheduler {
    pub fn new(config: BatchConfig, monitor: Arc<dyn MemoryMonitor>) -> Self {
        Self { config, monitor }
    }

    /// Runs `op` over every file, micro-batch by micro-batch, feeding each
    /// successful output to `sink` as it settles. `sink` runs on the driving
    /// task only, so a category's spool keeps a single writer without locks.
    ///
    /// A per-file failure (error or panic) is logged and contributes nothing;
    /// it never aborts the batch.
    pub async fn run_batched<T, F, Fut>(
        &self,
        files: &[PathBuf],
        op: F,
        mut sink: impl FnMut(T),
        label: &str,
    ) -> BatchStats
    where
        T: Send + 'static,
        F: Fn(PathBuf) -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let mut stats = BatchStats::default();

        for macro_chunk in files.chunks(self.config.macro_chunk_size.max(1)) {
            self.relieve_pressure(&mut stats, label).await;

            for micro_batch in macro_chunk.chunks(self.config.micro_batch_size.max(1)) {
                let mut tasks = JoinSet::new();
                for file in micro_batch {
                    tasks.spawn(op(file.clone()));
                }

                // Strict barrier: the next micro-batch starts only after
                // every task here has settled.
                while let Some(joined) = tasks.join_next().await {
                    match joined {
                        Ok(Ok(output)) => {
                            stats.processed += 1;
                            sink(output);
                        }
                        Ok(Err(e)) => {
                            stats.processed += 1;
                            stats.failed += 1;
                            log::warn!("{label}: file skipped: {e}");
                        }
                        Err(join_err) => {
                            stats.processed += 1;
                            stats.failed += 1;
                            log::warn!("{label}: task failed: {join_err}");
                        }
                    }

                    if stats.processed % self.config.check_interval.max(1) == 0 {
                        self.relieve_pressure(&mut stats, label).await;
                    }
                }
            }
        }

        stats
    }

    /// Bounded cooperative relief: yield and briefly sleep until the monitor
    /// drops below threshold or the cycle budget is spent. Never affects
    /// findings, only pacing.
    async fn relieve_pressure(&self, stats: &mut BatchStats, label: &str) {
        for _ in 0..self.config.max_relief_cycles {
            let ratio = self.monitor.usage_ratio();
            if ratio <= self.config.pressure_threshold {
                return;
            }
            log::debug!(
                "{label}: memory pressure {:.0}% above threshold, pausing",
                ratio * 100.0
            );
            stats.relief_cycles += 1;
            tokio::task::yield_now().await;
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}
