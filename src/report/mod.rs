//! Report standardization and scoring.
//!
//! Pure derivation over a completed [`RunSummary`]: 0-100 per-category
//! scores from fixed severity weight tables, a fixed-weight overall score
//! with security weighted highest, bounded top-issue lists, and short
//! threshold-driven recommendation strings. Reading is all this module does;
//! nothing upstream is mutated.

use crate::core::{Category, CategoryResult, Finding, RunSummary, Severity};
use crate::errors::AuditResult;
use crate::io::output::write_json_report;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_TOP_ISSUES: usize = 10;

/// (high, medium, low) weights and the category multiplier. Info findings
/// carry zero weight everywhere: positive or informational results never
/// reduce a score.
#[derive(Debug, Clone, Copy)]
struct ScoreWeights {
    high: f64,
    medium: f64,
    low: f64,
    multiplier: f64,
}

static SEVERITY_WEIGHTS: Lazy<HashMap<Category, ScoreWeights>> = Lazy::new(|| {
    HashMap::from([
        (
            Category::Security,
            ScoreWeights { high: 15.0, medium: 5.0, low: 1.0, multiplier: 1.25 },
        ),
        (
            Category::Performance,
            ScoreWeights { high: 10.0, medium: 4.0, low: 1.0, multiplier: 1.0 },
        ),
        (
            Category::Accessibility,
            ScoreWeights { high: 10.0, medium: 3.0, low: 1.0, multiplier: 1.0 },
        ),
        (
            Category::Dependency,
            ScoreWeights { high: 12.0, medium: 4.0, low: 1.0, multiplier: 1.0 },
        ),
        (
            Category::LivePage,
            ScoreWeights { high: 8.0, medium: 3.0, low: 1.0, multiplier: 1.0 },
        ),
    ])
});

/// Fixed weights for the overall average; security dominates
static OVERALL_WEIGHTS: Lazy<HashMap<Category, f64>> = Lazy::new(|| {
    HashMap::from([
        (Category::Security, 0.30),
        (Category::Performance, 0.20),
        (Category::Accessibility, 0.20),
        (Category::Dependency, 0.15),
        (Category::LivePage, 0.15),
    ])
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStandard {
    pub category: Category,
    pub score: f64,
    pub total_issues: usize,
    pub high_severity: usize,
    pub medium_severity: usize,
    pub low_severity: usize,
    /// Bounded list, sorted severity-descending
    pub top_issues: Vec<Finding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardizedReport {
    pub tool: String,
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub overall_score: f64,
    pub total_issues: usize,
    pub categories: Vec<CategoryStandard>,
    pub recommendations: Vec<String>,
}

/// Severity used for weighting and ordering; the standardizer is the one
/// place an unclassified finding defaults to Medium.
fn effective_severity(finding: &Finding) -> Severity {
    finding.severity.unwrap_or(Severity::Medium)
}

/// `clamp(100 - Σ(weight × count) × multiplier, 0, 100)`. A category with
/// zero issues scores exactly 100; tiers absent from a category contribute
/// zero, never NaN.
pub fn category_score(result: &CategoryResult) -> f64 {
    let weights = SEVERITY_WEIGHTS[&result.category];
    // Counted from the issues themselves; the public count fields may have
    // been deserialized and are not trusted to reconcile with total_issues.
    let unclassified = result.issues.iter().filter(|i| i.severity.is_none()).count();
    let penalty = weights.high * result.high_severity as f64
        + weights.medium * (result.medium_severity + unclassified) as f64
        + weights.low * result.low_severity as f64;
    (100.0 - penalty * weights.multiplier).clamp(0.0, 100.0)
}

fn top_issues(result: &CategoryResult, limit: usize) -> Vec<Finding> {
    let mut issues = result.issues.clone();
    issues.sort_by(|a, b| effective_severity(b).rank().cmp(&effective_severity(a).rank()));
    issues.truncate(limit);
    issues
}

fn recommendations(summary: &RunSummary, standards: &[CategoryStandard]) -> Vec<String> {
    let mut notes = Vec::new();
    let by_category = |c: Category| summary.categories.iter().find(|r| r.category == c);

    if let Some(sec) = by_category(Category::Security) {
        if sec.high_severity >= 1 {
            notes.push(format!(
                "{} high-severity security issue(s) found: remediate immediately before release",
                sec.high_severity
            ));
        }
    }
    if let Some(dep) = by_category(Category::Dependency) {
        let vulnerable = dep
            .issues
            .iter()
            .filter(|i| i.finding_type == "vulnerable-dependency")
            .count();
        if vulnerable > 0 {
            notes.push(format!(
                "{vulnerable} vulnerable dependenc{} detected: upgrade or replace the affected packages",
                if vulnerable == 1 { "y" } else { "ies" }
            ));
        }
    }
    if let Some(a11y) = by_category(Category::Accessibility) {
        if a11y.total_issues > 10 {
            notes.push(
                "Accessibility issues are widespread: schedule a dedicated audit pass".to_string(),
            );
        }
    }
    for standard in standards {
        if standard.score < 50.0 {
            notes.push(format!(
                "{} score is {:.0}/100: treat this category as a release blocker",
                standard.category.display_name(),
                standard.score
            ));
        }
    }
    if summary.total_issues == 0 {
        notes.push("No issues detected: keep the audit in your CI gate".to_string());
    }
    notes
}

/// Derives the standardized view of a finished run
pub fn standardize(summary: &RunSummary, top_n: usize) -> StandardizedReport {
    let categories: Vec<CategoryStandard> = summary
        .categories
        .iter()
        .map(|result| CategoryStandard {
            category: result.category,
            score: category_score(result),
            total_issues: result.total_issues,
            high_severity: result.high_severity,
            medium_severity: result.medium_severity,
            low_severity: result.low_severity,
            top_issues: top_issues(result, top_n),
        })
        .collect();

    // Fixed-weight average over the categories that actually ran
    let weight_sum: f64 = categories
        .iter()
        .map(|c| OVERALL_WEIGHTS[&c.category])
        .sum();
    let overall_score = if weight_sum > 0.0 {
        categories
            .iter()
            .map(|c| c.score * OVERALL_WEIGHTS[&c.category])
            .sum::<f64>()
            / weight_sum
    } else {
        100.0
    };

    let recommendations = recommendations(summary, &categories);

    StandardizedReport {
        tool: "frontaudit".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        generated_at: Utc::now(),
        duration_ms: summary.duration_ms,
        overall_score,
        total_issues: summary.total_issues,
        categories,
        recommendations,
    }
}

pub fn persist(report: &StandardizedReport, output_dir: &Path) -> AuditResult<()> {
    write_json_report(&output_dir.join("standardized-report.json"), report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FindingSource;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn finding(sev: Option<Severity>, n: usize) -> Finding {
        Finding {
            finding_type: format!("t{n}"),
            file: PathBuf::from("a.js"),
            line: n,
            column: None,
            severity: sev,
            message: format!("m{n}"),
            snippet: None,
            context: None,
            tags: vec![],
            source: FindingSource::Custom,
        }
    }

    fn result(category: Category, severities: &[Option<Severity>]) -> CategoryResult {
        CategoryResult::new(
            category,
            severities
                .iter()
                .enumerate()
                .map(|(i, s)| finding(*s, i + 1))
                .collect(),
        )
    }

    #[test]
    fn zero_issue_category_scores_exactly_100() {
        let clean = result(Category::Security, &[]);
        assert_eq!(category_score(&clean), 100.0);
    }

    #[test]
    fn info_findings_never_reduce_score() {
        let info_only = result(
            Category::Performance,
            &[Some(Severity::Info), Some(Severity::Info)],
        );
        assert_eq!(category_score(&info_only), 100.0);
    }

    #[test]
    fn low_info_only_category_stays_above_weighted_floor() {
        let mild = result(
            Category::Accessibility,
            &[Some(Severity::Low), Some(Severity::Low), Some(Severity::Info)],
        );
        // two low findings at weight 1.0, multiplier 1.0
        assert_eq!(category_score(&mild), 98.0);
    }

    #[test]
    fn score_clamps_at_zero_not_below() {
        let severities: Vec<_> = std::iter::repeat(Some(Severity::High)).take(40).collect();
        let bad = result(Category::Security, &severities);
        assert_eq!(category_score(&bad), 0.0);
    }

    #[test]
    fn inconsistent_count_fields_never_underflow_the_score() {
        // A hand-built (or deserialized) result whose counts disagree with
        // its issues must still score, not panic
        let inconsistent = CategoryResult {
            category: Category::Performance,
            timestamp: Utc::now(),
            total_issues: 0,
            high_severity: 1,
            medium_severity: 0,
            low_severity: 0,
            issues: vec![],
        };
        let score = category_score(&inconsistent);
        assert!((0.0..=100.0).contains(&score));
        assert_eq!(score, 90.0);
    }

    #[test]
    fn unclassified_severity_weighs_as_medium_here_only() {
        let with_none = result(Category::Performance, &[None]);
        let with_medium = result(Category::Performance, &[Some(Severity::Medium)]);
        assert_eq!(category_score(&with_none), category_score(&with_medium));
    }

    #[test]
    fn top_issues_bounded_and_severity_sorted() {
        let mixed = result(
            Category::Security,
            &[
                Some(Severity::Low),
                Some(Severity::High),
                Some(Severity::Info),
                Some(Severity::Medium),
                Some(Severity::High),
            ],
        );
        let summary = RunSummary::from_results(Utc::now(), 5, vec![mixed]);
        let report = standardize(&summary, 3);
        let top = &report.categories[0].top_issues;

        assert_eq!(top.len(), 3);
        assert_eq!(top[0].severity, Some(Severity::High));
        assert_eq!(top[1].severity, Some(Severity::High));
        assert_eq!(top[2].severity, Some(Severity::Medium));
    }

    #[test]
    fn security_weighs_heaviest_in_overall_score() {
        let severities: Vec<_> = std::iter::repeat(Some(Severity::High)).take(40).collect();
        let sec_bad = RunSummary::from_results(
            Utc::now(),
            1,
            vec![
                result(Category::Security, &severities),
                result(Category::Performance, &[]),
            ],
        );
        let perf_bad = RunSummary::from_results(
            Utc::now(),
            1,
            vec![
                result(Category::Security, &[]),
                result(Category::Performance, &severities),
            ],
        );
        let sec_report = standardize(&sec_bad, DEFAULT_TOP_ISSUES);
        let perf_report = standardize(&perf_bad, DEFAULT_TOP_ISSUES);
        assert!(sec_report.overall_score < perf_report.overall_score);
    }

    #[test]
    fn high_security_issue_triggers_remediation_note() {
        let summary = RunSummary::from_results(
            Utc::now(),
            1,
            vec![result(Category::Security, &[Some(Severity::High)])],
        );
        let report = standardize(&summary, DEFAULT_TOP_ISSUES);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("remediate immediately")));
    }

    #[test]
    fn clean_run_recommends_keeping_the_gate() {
        let summary = RunSummary::from_results(
            Utc::now(),
            1,
            vec![result(Category::Security, &[])],
        );
        let report = standardize(&summary, DEFAULT_TOP_ISSUES);
        assert_eq!(report.overall_score, 100.0);
        assert!(report.recommendations.iter().any(|r| r.contains("CI gate")));
    }
}
