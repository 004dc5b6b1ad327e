//! End-to-end pipeline tests over a real temporary source tree.

use frontaudit::categories::{security, ScanContext};
use frontaudit::orchestrator::Orchestrator;
use frontaudit::report;
use frontaudit::{Category, Severity};
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn scan_context(dir: &TempDir) -> ScanContext {
    let out = dir.path().join("audit-reports");
    fs::create_dir_all(&out).unwrap();
    ScanContext::new(dir.path().to_path_buf(), out)
}

#[tokio::test]
async fn password_on_line_five_yields_one_high_finding_for_that_file_only() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "src/auth.js",
        "\n\n\n\nconst password = \"abc123456789012\"\n",
    );
    write_file(dir.path(), "src/clean_a.js", "const x = 1;\n");
    write_file(dir.path(), "src/clean_b.js", "export const y = 2;\n");

    let ctx = scan_context(&dir);
    let result = security::run(&ctx).await;

    assert_eq!(result.total_issues, 1);
    assert_eq!(result.high_severity, 1);
    let finding = &result.issues[0];
    assert_eq!(finding.line, 5);
    assert_eq!(finding.severity, Some(Severity::High));
    assert_eq!(finding.finding_type, "hardcoded-password");
    assert!(finding.file.ends_with("src/auth.js"));
}

#[tokio::test]
async fn repeated_runs_produce_identical_findings() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "src/app.js",
        "eval(userInput)\nel.innerHTML = data\n",
    );

    let ctx = scan_context(&dir);
    let first = security::run(&ctx).await;
    let second = security::run(&ctx).await;

    assert_eq!(first.issues, second.issues);
    assert_eq!(first.total_issues, 2);
}

#[tokio::test]
async fn unreadable_file_contributes_zero_and_the_rest_survive() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "src/a.js", "eval(x)\n");
    let bad = write_file(dir.path(), "src/bad.js", "eval(y)\n");
    // Non-UTF8 content makes read_to_string fail for this file
    fs::write(&bad, [0xff, 0xfe, 0x00, 0x9f]).unwrap();

    let ctx = scan_context(&dir);
    let result = security::run(&ctx).await;

    assert_eq!(result.total_issues, 1);
    assert!(result.issues[0].file.ends_with("src/a.js"));
}

#[tokio::test]
async fn full_run_persists_all_artifacts_and_standardizes() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "src/index.html",
        indoc! {r#"
            <html>
            <img src="a.png">
            </html>
        "#},
    );
    write_file(dir.path(), "src/app.js", "document.write(x)\n");

    let ctx = scan_context(&dir);
    let out = ctx.output_dir.clone();
    let orchestrator = Orchestrator::new(ctx, &[]);

    let summary = orchestrator.run_all().await.unwrap();
    assert_eq!(summary.categories.len(), 5);
    assert!(summary.total_issues >= 3);

    for category in Category::all() {
        assert!(
            out.join(format!("{}-audit-report.json", category.as_str())).exists(),
            "missing report for {category}"
        );
        assert!(out
            .join(format!("{}-issues.jsonl", category.as_str()))
            .exists());
    }
    assert!(out.join("audit-summary.json").exists());

    let standardized = report::standardize(&summary, 10);
    report::persist(&standardized, &out).unwrap();
    assert!(out.join("standardized-report.json").exists());

    // Zero-issue categories stay visible with a score of exactly 100
    let dependency = standardized
        .categories
        .iter()
        .find(|c| c.category == Category::Dependency)
        .unwrap();
    assert_eq!(dependency.total_issues, 0);
    assert_eq!(dependency.score, 100.0);
}

#[tokio::test]
async fn category_selection_limits_the_run() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "src/app.js", "console.log(1)\n");

    let ctx = scan_context(&dir);
    let out = ctx.output_dir.clone();
    let orchestrator = Orchestrator::new(ctx, &[Category::Performance]);

    let summary = orchestrator.run_all().await.unwrap();
    assert_eq!(summary.categories.len(), 1);
    assert_eq!(summary.categories[0].category, Category::Performance);
    assert!(!out.join("security-audit-report.json").exists());
}
