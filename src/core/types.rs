//! Common type definitions used across the audit pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Severity levels for findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Rank used for severity-descending sorts (higher is more severe)
    pub fn rank(&self) -> u8 {
        match self {
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Info => 0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        };
        write!(f, "{s}")
    }
}

/// Where a finding came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FindingSource {
    #[default]
    #[serde(rename = "custom")]
    Custom,
    #[serde(rename = "external-tool")]
    ExternalTool,
}

/// Audit dimensions. Device/URL-specific live-page issues carry tags on the
/// finding rather than spawning extra categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Security,
    Performance,
    Accessibility,
    Dependency,
    LivePage,
}

impl Category {
    /// Slug used in artifact file names (`<slug>-issues.jsonl`, `<slug>-audit-report.json`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Security => "security",
            Category::Performance => "performance",
            Category::Accessibility => "accessibility",
            Category::Dependency => "dependency",
            Category::LivePage => "live-page",
        }
    }

    pub fn all() -> &'static [Category] {
        &[
            Category::Security,
            Category::Performance,
            Category::Accessibility,
            Category::Dependency,
            Category::LivePage,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Security => "Security",
            Category::Performance => "Performance",
            Category::Accessibility => "Accessibility",
            Category::Dependency => "Dependency Health",
            Category::LivePage => "Live Page",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One detected problem. Immutable once created.
///
/// `severity` stays `None` when the producing tool did not classify the
/// finding; only the standardizer substitutes a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub finding_type: String,
    pub file: PathBuf,
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub column: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub severity: Option<Severity>,
    pub message: String,
    /// Trimmed, truncated copy of the matched line
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub snippet: Option<String>,
    /// Surrounding lines with the matched line marked
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source: FindingSource,
}

impl Finding {
    /// Identity tuple for deduplication within one category run
    pub fn dedup_key(&self) -> (String, usize, String, String) {
        (
            self.file.display().to_string(),
            self.line,
            self.finding_type.clone(),
            self.message.clone(),
        )
    }
}

/// Completed output of one category run. Counts are derived from `issues`
/// at construction and never drift from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResult {
    pub category: Category,
    pub timestamp: DateTime<Utc>,
    pub total_issues: usize,
    pub high_severity: usize,
    pub medium_severity: usize,
    pub low_severity: usize,
    pub issues: Vec<Finding>,
}

impl CategoryResult {
    pub fn new(category: Category, issues: Vec<Finding>) -> Self {
        let count = |sev: Severity| issues.iter().filter(|i| i.severity == Some(sev)).count();
        Self {
            category,
            timestamp: Utc::now(),
            total_issues: issues.len(),
            high_severity: count(Severity::High),
            medium_severity: count(Severity::Medium),
            low_severity: count(Severity::Low),
            issues,
        }
    }

    /// Canonical all-zero result used when a category degrades
    pub fn empty(category: Category) -> Self {
        Self::new(category, Vec::new())
    }
}

/// Aggregate of all category results plus wall-clock duration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub total_issues: usize,
    pub high_severity: usize,
    pub medium_severity: usize,
    pub low_severity: usize,
    pub categories: Vec<CategoryResult>,
}

impl RunSummary {
    pub fn from_results(
        started_at: DateTime<Utc>,
        duration_ms: u64,
        categories: Vec<CategoryResult>,
    ) -> Self {
        let sum = |f: fn(&CategoryResult) -> usize| categories.iter().map(f).sum();
        Self {
            started_at,
            duration_ms,
            total_issues: sum(|c| c.total_issues),
            high_severity: sum(|c| c.high_severity),
            medium_severity: sum(|c| c.medium_severity),
            low_severity: sum(|c| c.low_severity),
            categories,
        }
    }
}
