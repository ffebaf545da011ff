//! Data layer: core types, loading, cleaning, aggregation and filtering.
//!
//! Architecture:
//! ```text
//!  metadata .csv / .json / .parquet        (missing or unreadable)
//!        │                                          │
//!        ▼                                          ▼
//!   ┌──────────┐                              ┌──────────┐
//!   │  loader   │ ◄──────── fallback ──────── │  synth    │
//!   └──────────┘                              └──────────┘
//!        │  PaperTable (schema declared once)
//!        ▼
//!   ┌──────────┐
//!   │  clean    │  typed dates, derived fields, dedup, missing report
//!   └──────────┘
//!        │  CleanedTable
//!        ├──────────────► snapshot (cleaned CSV) ──► dashboard re-load
//!        ▼
//!   ┌──────────┐     ┌───────────┐
//!   │  filter   │ ──► │ aggregate │  counts, statistics, word frequency
//!   └──────────┘     └───────────┘
//! ```

pub mod aggregate;
pub mod clean;
pub mod filter;
pub mod loader;
pub mod model;
pub mod snapshot;
pub mod synth;
