// Export modules for library usage
pub mod categories;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod detection;
pub mod errors;
pub mod external;
pub mod io;
pub mod orchestrator;
pub mod report;
pub mod scheduler;
pub mod spool;

// Re-export commonly used types
pub use crate::core::{Category, CategoryResult, Finding, FindingSource, RunSummary, Severity};

pub use crate::categories::{CategoryScan, ScanContext};
pub use crate::config::AuditConfig;
pub use crate::detection::{scan_content, DetectorBank, DetectorSet, DetectorSpec, MatchPolicy};
pub use crate::errors::{AuditError, AuditResult};
pub use crate::orchestrator::{CategoryOutcome, Orchestrator};
pub use crate::report::{standardize, StandardizedReport};
pub use crate::scheduler::{BatchConfig, BatchScheduler, MemoryMonitor, ProcessMemoryMonitor};
pub use crate::spool::{dedup_findings, IssueSpool};
