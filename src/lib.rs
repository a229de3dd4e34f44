//! activity-audit library
//!
//! This crate provides the core functionality for the `activity-audit` binary.
//! Keep the crate root minimal; implementation and tests live in their modules.
//!
//! ## Overview
//!
//! The library collects issue, wiki page and pull request activity over a local
//! calendar window and writes one report per source:
//!
//! - [`window`] - Resolves a local date range into each API's time expression
//! - [`filter`] - Department name/email and repository allow-lists
//! - [`collector`] - Page fetchers for three pagination styles and the collection driver
//! - [`sources`] - Jira, Confluence and Bitbucket audits built on the collector
//! - [`export`] - Report sinks (CSV / Parquet)
//! - [`cli`] - Command-line interface orchestrating a run
//! - [`config`] - TOML-loadable run configuration
//! - [`models`] - Source kinds and raw record schemas
//! - [`errors`] - Error types used throughout the application
//!
//! ## Example Usage
//!
//! ```no_run
//! use activity_audit::{config::ResolvedConfig, export::FileSink, sources, errors::AppResult};
//!
//! # async fn example() -> AppResult<()> {
//! let mut config = ResolvedConfig::new("2025-12-01", "2026-01-06");
//! config.atlassian.workspace = "acme".to_string();
//! config.department.names = vec!["Alice".to_string()];
//! config.validate()?;
//!
//! let mut sink = FileSink::new(&config.output.dir, config.output.format);
//! let summary = sources::run_audit(&config, &mut sink).await?;
//! println!("{} rows written", summary.total_rows());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod collector;
pub mod config;
pub mod constants;
pub mod errors;
pub mod export;
pub mod filter;
pub mod models;
pub mod sources;
pub mod window;
