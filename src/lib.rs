//! CORD-19 research metadata pipeline.
//!
//! Stage one (`cord-analyze`) loads `metadata.csv` or synthesizes a sample,
//! cleans it, reports statistics, exports chart series and writes the
//! cleaned snapshot. Stage two (`cord-explorer`) re-loads that snapshot into
//! an interactive dashboard built on the filter and aggregate functions here.

pub mod cache;
pub mod charts;
pub mod config;
pub mod data;
pub mod error;
pub mod report;

pub use error::{ExplorerError, Result};
