//! Performance audit: render-blocking calls, runaway timers, heavyweight
//! inline assets.

use super::{CategoryScan, ScanContext};
use crate::core::{Category, CategoryResult, Severity};
use crate::detection::{DetectorBank, DetectorSpec, MatchPolicy};

const EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "mjs", "cjs", "vue", "svelte", "html", "htm", "css", "scss",
];

const LINT_RULE_PREFIXES: &[&str] = &["react-perf/", "perf/", "sonarjs/no-"];

pub const DETECTORS: &[DetectorSpec] = &[
    DetectorSpec {
        id: "sync-xhr",
        pattern: r#"\.open\s*\(\s*["'](GET|POST|PUT|DELETE)["']\s*,[^)]*,\s*false\s*\)"#,
        message: "Synchronous XMLHttpRequest blocks the main thread",
        severity: Severity::High,
        exclude_if: &[],
    },
    DetectorSpec {
        id: "blocking-document-write",
        pattern: r"document\.write(ln)?\s*\(",
        message: "document.write blocks HTML parsing",
        severity: Severity::Medium,
        exclude_if: &[],
    },
    DetectorSpec {
        id: "uncleared-interval",
        pattern: r"\bsetInterval\s*\(",
        message: "setInterval without a stored handle cannot be cleared",
        severity: Severity::Low,
        exclude_if: &[r"=\s*(window\.)?setInterval", r"clearInterval"],
    },
    DetectorSpec {
        id: "oversized-inline-handler",
        pattern: r#"\bon(click|change|input|mouseover|scroll|load)\s*=\s*["'][^"']{80,}["']"#,
        message: "Oversized inline event handler; move logic into a script",
        severity: Severity::Medium,
        exclude_if: &[],
    },
    DetectorSpec {
        id: "inline-base64-asset",
        pattern: r"data:(image|font|application)/[a-zA-Z0-9.+-]+;base64,[A-Za-z0-9+/=]{512,}",
        message: "Large base64 asset inlined in source; serve it as a file",
        severity: Severity::Medium,
        exclude_if: &[],
    },
    DetectorSpec {
        id: "nested-same-line-loop",
        pattern: r"\bfor\s*\([^)]*\)[^;{]*\bfor\s*\(",
        message: "Nested loop on one line; check the complexity of this hot path",
        severity: Severity::Low,
        exclude_if: &[],
    },
    DetectorSpec {
        id: "console-logging",
        pattern: r"\bconsole\.(log|debug|trace)\s*\(",
        message: "Console logging left in shipped code",
        severity: Severity::Info,
        exclude_if: &[],
    },
];

pub const BANKS: &[DetectorBank] = &[DetectorBank {
    specs: DETECTORS,
    policy: MatchPolicy::AllMatches,
}];

pub fn scan() -> CategoryScan {
    CategoryScan::new(Category::Performance, BANKS, EXTENSIONS, LINT_RULE_PREFIXES)
}

pub async fn run(ctx: &ScanContext) -> CategoryResult {
    scan().run(ctx).await
}
