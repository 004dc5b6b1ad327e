pub mod types;

pub use types::{Category, CategoryResult, Finding, FindingSource, RunSummary, Severity};
