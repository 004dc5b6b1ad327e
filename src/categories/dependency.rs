//! Dependency health audit.
//!
//! No file-tree batching here: the inputs are one manifest plus two opaque
//! checkers (vulnerability audit, unused-dependency detection), whose records
//! are normalized into findings and pushed through the same spool/dedup path
//! as every other category.

use super::{spool_and_finish, ScanContext};
use crate::core::{Category, CategoryResult, Finding};
use crate::external::{normalize_unused_deps, normalize_vuln_records};

pub async fn run(ctx: &ScanContext) -> CategoryResult {
    match try_run(ctx).await {
        Ok(result) => result,
        Err(e) => {
            log::warn!("dependency audit degraded to empty result: {e}");
            CategoryResult::empty(Category::Dependency)
        }
    }
}

async fn try_run(ctx: &ScanContext) -> anyhow::Result<CategoryResult> {
    let manifest = ctx.root.join("package.json");
    if !manifest.exists() {
        log::debug!("no package.json under {}; dependency audit is empty", ctx.root.display());
        return spool_and_finish(&ctx.output_dir, Category::Dependency, Vec::new());
    }

    let mut findings: Vec<Finding> = Vec::new();

    if let Some(checker) = &ctx.vulnerabilities {
        match checker.check(&ctx.root).await {
            Ok(records) => findings.extend(normalize_vuln_records(records, &manifest)),
            // One failed checker leaves the category with whatever it has
            Err(e) => log::warn!("vulnerability checker failed: {e}"),
        }
    }

    if let Some(checker) = &ctx.unused_deps {
        match checker.check(&ctx.root).await {
            Ok(unused) => findings.extend(normalize_unused_deps(&unused, &manifest)),
            Err(e) => log::warn!("unused-dependency checker failed: {e}"),
        }
    }

    spool_and_finish(&ctx.output_dir, Category::Dependency, findings)
}
