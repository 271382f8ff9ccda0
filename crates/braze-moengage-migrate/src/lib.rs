//! # braze-moengage-migrate
//!
//! Campaign migration orchestration library for moving Braze campaigns
//! (email, push, SMS) into MoEngage as drafts.
//!
//! The orchestrator drives a batch of selected campaigns through
//! fetch → dispatch against the boundary services, with support for:
//!
//! - **Per-campaign isolation** - one failing campaign never aborts the rest
//! - **Idempotent batches** - a completed batch signature is recorded in a
//!   ledger and never re-executed
//! - **Retry of failures only** - a completed run can re-drive exactly the
//!   campaigns that failed
//! - **Auditable runs** - every step is recorded in an append-only log
//!
//! ## Example
//!
//! ```rust,no_run
//! use braze_moengage_migrate::{
//!     BrazeClient, Config, FileLedger, MigrationBatch, MoEngageClient, Orchestrator,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let batch = MigrationBatch::from_json(&std::fs::read_to_string("batch.json")?)?;
//!
//!     let orchestrator = Orchestrator::new(
//!         batch,
//!         Arc::new(BrazeClient::from_config(&config)),
//!         Arc::new(MoEngageClient::from_config(&config)),
//!         Arc::new(FileLedger::new("migrations.json")),
//!     );
//!     let report = orchestrator.run().await?;
//!     println!("Migrated {}/{} campaigns", report.succeeded, report.total_count);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod classify;
pub mod config;
pub mod error;
pub mod ledger;
pub mod log;
pub mod orchestrator;
pub mod source;
pub mod target;

// Re-exports for convenient access
pub use batch::{
    CampaignRef, CampaignType, DestinationCredentials, MigrationBatch, SourceCredentials,
};
pub use classify::{classify, Classification};
pub use config::{Config, MigrationConfig, SourceServiceConfig, TargetServicesConfig};
pub use error::{MigrateError, Result};
pub use ledger::{CompletionLedger, FileLedger, LedgerEntry, MemoryLedger};
pub use log::{LogEntry, LogLevel, MigrationLog};
pub use orchestrator::{
    AttemptPhase, MigrationOutcome, MigrationPhase, MigrationReport, MigrationState, Orchestrator,
    OrchestratorOptions,
};
pub use source::{BrazeClient, BrazeFetcher, CampaignDetail, FetchError};
pub use target::{DispatchError, DispatchResponse, MoEngageClient, MoEngageDispatcher};
