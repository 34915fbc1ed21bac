//! # warriorplus-core
//!
//! Core library for the WarriorPlus admin exporter.
//!
//! This library provides:
//! - Record types for the platform's Firestore collections
//! - Record sources (Firestore REST, JSON snapshots)
//! - Time-window filtering
//! - Anonymization of user identifiers
//! - Medication, crisis and patient analytics
//! - Report assembly and JSON/CSV serialization
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Pipeline
//!
//! Data flows through five stages:
//! - **Fetch:** every collection is read concurrently from a [`fetch::RecordSource`]
//! - **Filter:** records outside the [`window::TimeWindow`] are dropped, and
//!   identifiers are stripped per [`anonymize::Anonymization`]
//! - **Aggregate:** pure functions in [`analytics`] compute per-drug and per-patient views
//! - **Assemble:** [`report::assemble`] packs them into a named report shape
//! - **Serialize:** [`export::serialize`] renders pretty JSON or the CSV table
//!
//! ## Example
//!
//! ```rust,no_run
//! use warriorplus_core::anonymize::Anonymization;
//! use warriorplus_core::export::{export, ExportFormat, ExportRequest};
//! use warriorplus_core::fetch::SnapshotSource;
//! use warriorplus_core::report::ReportType;
//! use warriorplus_core::window::TimeWindow;
//! use warriorplus_core::Config;
//!
//! # async fn run() -> warriorplus_core::Result<()> {
//! let config = Config::load()?;
//! let source = SnapshotSource::open(std::path::Path::new("snapshot.json"))?;
//! let request = ExportRequest {
//!     report_type: ReportType::Pharmaceutical,
//!     window: TimeWindow::Last30Days,
//!     format: ExportFormat::Csv,
//!     anonymization: Anonymization::Full,
//! };
//! let artifact = export(&source, &request, &config.thresholds, chrono::Utc::now()).await?;
//! println!("{}", artifact.filename);
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod anonymize;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod logging;
pub mod report;
pub mod types;
pub mod window;
