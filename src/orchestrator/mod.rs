//! Fault-isolated orchestration of the audit categories.
//!
//! Every enabled category runs concurrently; a category that errors or
//! panics is degraded, never retried, and never fails the run. Degradation
//! is a tagged variant internally so tests can tell "clean" from "checker
//! failed", while the persisted artifacts keep the canonical zero-issue
//! shape operators already rely on (the logs are the distinguishing
//! channel).

use crate::categories::{self, ScanContext};
use crate::core::{Category, CategoryResult, RunSummary};
use crate::errors::{AuditError, AuditResult};
use crate::io::output::write_json_report;
use chrono::Utc;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

type RunnerFuture = Pin<Box<dyn Future<Output = CategoryResult> + Send>>;
type Runner = Arc<dyn Fn(Arc<ScanContext>) -> RunnerFuture + Send + Sync>;

/// Outcome of one category, pre-merge. `Degraded` serializes as the
/// canonical all-zero result.
#[derive(Debug)]
pub enum CategoryOutcome {
    Completed(CategoryResult),
    Degraded { category: Category, reason: String },
}

impl CategoryOutcome {
    pub fn category(&self) -> Category {
        match self {
            CategoryOutcome::Completed(result) => result.category,
            CategoryOutcome::Degraded { category, .. } => *category,
        }
    }

    /// The externally observable result: degraded categories report zero
    pub fn into_result(self) -> CategoryResult {
        match self {
            CategoryOutcome::Completed(result) => result,
            CategoryOutcome::Degraded { category, reason } => {
                let err = AuditError::CategoryFatal { category, reason };
                log::warn!("{err}; reporting zero issues");
                CategoryResult::empty(category)
            }
        }
    }
}

pub struct Orchestrator {
    ctx: Arc<ScanContext>,
    runners: Vec<(Category, Runner)>,
}

impl Orchestrator {
    /// All five built-in categories, filtered by `selection` when non-empty.
    pub fn new(ctx: ScanContext, selection: &[Category]) -> Self {
        let runner = |category: Category| -> Runner {
            Arc::new(move |ctx: Arc<ScanContext>| -> RunnerFuture {
                Box::pin(async move {
                    match category {
                        Category::Security => categories::security::run(&ctx).await,
                        Category::Performance => categories::performance::run(&ctx).await,
                        Category::Accessibility => categories::accessibility::run(&ctx).await,
                        Category::Dependency => categories::dependency::run(&ctx).await,
                        Category::LivePage => categories::live_page::run(&ctx).await,
                    }
                })
            })
        };

        let runners = Category::all()
            .iter()
            .copied()
            .filter(|c| selection.is_empty() || selection.contains(c))
            .map(|c| (c, runner(c)))
            .collect();

        Self {
            ctx: Arc::new(ctx),
            runners,
        }
    }

    /// Test seam: a custom runner set over the same machinery
    pub fn with_runners(ctx: ScanContext, runners: Vec<(Category, Runner)>) -> Self {
        Self {
            ctx: Arc::new(ctx),
            runners,
        }
    }

    /// Launches every category concurrently and resolves once all settle.
    /// Never fails for category-level reasons; the only errors out of here
    /// are report-persistence ones.
    pub async fn run_all(&self) -> AuditResult<RunSummary> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let outcomes = self.run_all_outcomes().await;
        self.merge_and_persist(outcomes, started_at, clock.elapsed().as_millis() as u64)
    }

    /// Same as [`run_all`](Self::run_all) but exposes the tagged outcomes
    /// before they collapse into canonical results.
    pub async fn run_all_outcomes(&self) -> Vec<CategoryOutcome> {
        log::debug!("orchestrator: running {} categories", self.runners.len());

        // All categories are in flight before any is awaited; completion
        // order among them is unconstrained.
        let handles: Vec<_> = self
            .runners
            .iter()
            .map(|(category, runner)| (*category, tokio::spawn(runner(Arc::clone(&self.ctx)))))
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (category, handle) in handles {
            match handle.await {
                Ok(result) => outcomes.push(CategoryOutcome::Completed(result)),
                // A panicking category is the one failure its own module
                // cannot absorb; degrade it here.
                Err(join_err) => outcomes.push(CategoryOutcome::Degraded {
                    category,
                    reason: join_err.to_string(),
                }),
            }
        }
        outcomes
    }

    fn merge_and_persist(
        &self,
        outcomes: Vec<CategoryOutcome>,
        started_at: chrono::DateTime<Utc>,
        duration_ms: u64,
    ) -> AuditResult<RunSummary> {
        log::debug!("orchestrator: merging {} category outcomes", outcomes.len());

        let results: Vec<CategoryResult> =
            outcomes.into_iter().map(CategoryOutcome::into_result).collect();

        for result in &results {
            let path = self
                .ctx
                .output_dir
                .join(format!("{}-audit-report.json", result.category.as_str()));
            write_json_report(&path, result)?;
        }

        let summary = RunSummary::from_results(started_at, duration_ms, results);
        write_json_report(&self.ctx.output_dir.join("audit-summary.json"), &summary)?;
        Ok(summary)
    }
}
