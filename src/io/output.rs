use crate::errors::AuditResult;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Creates the report directory. Failure here is the one condition that
/// terminates the whole run.
pub fn ensure_output_dir(dir: &Path) -> AuditResult<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Writes a report as pretty-printed JSON at a well-defined completion
/// point. Reports are written once and never mutated.
pub fn write_json_report<T: Serialize>(path: &Path, value: &T) -> AuditResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn report_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("security-audit-report.json");
        write_json_report(&path, &json!({"totalIssues": 3})).unwrap();

        let read: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read["totalIssues"], 3);
    }

    #[test]
    fn ensure_output_dir_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("reports/audit");
        ensure_output_dir(&nested).unwrap();
        ensure_output_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
