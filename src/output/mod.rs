//! Output module for run reports and catalog statistics
//!
//! This module handles:
//! - Formatting the end-of-run report
//! - Summarizing the on-disk catalog

mod report;
pub mod stats;

pub use report::{format_run_report, print_run_report};
pub use stats::{load_statistics, print_statistics, CatalogStatistics, KindStatistics};
