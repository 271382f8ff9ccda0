//! Migration orchestrator - main workflow coordinator.
//!
//! Drives a batch of selected campaigns through fetch → dispatch, one
//! campaign at a time, recording a per-campaign outcome either way. A
//! completed batch is recorded in the completion ledger under the batch
//! signature so a re-submitted batch short-circuits instead of re-running
//! network calls; an in-memory run guard suppresses a second start on the
//! same instance while a run is in flight.

use crate::batch::{CampaignRef, MigrationBatch};
use crate::classify::classify;
use crate::error::{MigrateError, Result};
use crate::ledger::{CompletionLedger, LedgerEntry};
use crate::log::{LogEntry, LogLevel, MigrationLog};
use crate::source::BrazeFetcher;
use crate::target::{DispatchResponse, MoEngageDispatcher};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Phase of a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationPhase {
    /// Batch accepted, preconditions not yet checked.
    Preparing,
    /// The campaign loop is executing.
    Migrating,
    /// Every campaign has a recorded outcome.
    Completed,
}

/// Which adapter call a campaign attempt reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptPhase {
    /// Failed while fetching campaign detail from the source.
    Fetch,
    /// Reached the destination dispatch call.
    Dispatch,
}

/// Result of attempting one campaign.
///
/// Exactly one outcome exists per campaign id per attempt generation; a
/// retry round produces a fresh outcome that supersedes the prior failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationOutcome {
    /// The campaign this outcome belongs to.
    pub campaign: CampaignRef,

    /// Adapter call the attempt reached.
    pub phase_reached: AttemptPhase,

    /// Failure text; `None` means success.
    pub error: Option<String>,

    /// When the attempt settled.
    pub completed_at: DateTime<Utc>,

    /// Destination response, present on success.
    pub destination_response: Option<DispatchResponse>,
}

impl MigrationOutcome {
    fn success(campaign: CampaignRef, response: DispatchResponse) -> Self {
        Self {
            campaign,
            phase_reached: AttemptPhase::Dispatch,
            error: None,
            completed_at: Utc::now(),
            destination_response: Some(response),
        }
    }

    fn failure(campaign: CampaignRef, phase_reached: AttemptPhase, error: String) -> Self {
        Self {
            campaign,
            phase_reached,
            error: Some(error),
            completed_at: Utc::now(),
            destination_response: None,
        }
    }

    /// Whether the attempt succeeded.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate run state, owned by the orchestrator and exposed to callers
/// as a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationState {
    /// Current phase.
    pub phase: MigrationPhase,

    /// Outcomes of campaigns that migrated successfully.
    pub successful: Vec<MigrationOutcome>,

    /// Outcomes of campaigns that failed. Replaced, not appended, by a
    /// retry round.
    pub failed: Vec<MigrationOutcome>,

    /// Ids with a terminal success outcome; used to skip re-processing.
    pub processed_ids: HashSet<String>,

    /// Campaign count of the batch as selected, fixed at acceptance.
    pub total_count: usize,

    /// Campaigns with a recorded outcome. The sole progress signal.
    pub processed_count: usize,
}

impl MigrationState {
    fn new(total_count: usize) -> Self {
        Self {
            phase: MigrationPhase::Preparing,
            successful: Vec::new(),
            failed: Vec::new(),
            processed_ids: HashSet::new(),
            total_count,
            processed_count: 0,
        }
    }
}

/// Result of a migration run or retry round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Unique run identifier.
    pub run_id: String,

    /// Batch signature the run was keyed by.
    pub signature: String,

    /// Final status: `completed`, `already_completed`, or `in_progress`
    /// (mirror of a run still executing elsewhere).
    pub status: String,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Campaign count of the batch as selected.
    pub total_count: usize,

    /// Campaigns migrated successfully.
    pub succeeded: usize,

    /// Campaigns that failed.
    pub failed: usize,

    /// Names of failed campaigns.
    pub failed_campaigns: Vec<String>,

    /// True when the result came from the completion ledger without any
    /// network calls.
    pub from_ledger: bool,
}

/// Orchestrator tuning.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Pause inserted between campaigns. Keeps progress observable and
    /// spaces requests to the destination API; zero is allowed.
    pub pause_between_campaigns: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            pause_between_campaigns: Duration::from_secs(1),
        }
    }
}

impl OrchestratorOptions {
    /// Derive options from configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            pause_between_campaigns: Duration::from_millis(
                config.migration.get_pause_between_campaigns_ms(),
            ),
        }
    }
}

/// Migration orchestrator for one batch.
pub struct Orchestrator {
    batch: MigrationBatch,
    fetcher: Arc<dyn BrazeFetcher>,
    dispatcher: Arc<dyn MoEngageDispatcher>,
    ledger: Arc<dyn CompletionLedger>,
    options: OrchestratorOptions,
    started: AtomicBool,
    state: Mutex<MigrationState>,
    log: Mutex<MigrationLog>,
}

impl Orchestrator {
    /// Create an orchestrator for `batch`.
    pub fn new(
        batch: MigrationBatch,
        fetcher: Arc<dyn BrazeFetcher>,
        dispatcher: Arc<dyn MoEngageDispatcher>,
        ledger: Arc<dyn CompletionLedger>,
    ) -> Self {
        let total_count = batch.campaigns.len();
        Self {
            batch,
            fetcher,
            dispatcher,
            ledger,
            options: OrchestratorOptions::default(),
            started: AtomicBool::new(false),
            state: Mutex::new(MigrationState::new(total_count)),
            log: Mutex::new(MigrationLog::new()),
        }
    }

    /// Override the default options.
    pub fn with_options(mut self, options: OrchestratorOptions) -> Self {
        self.options = options;
        self
    }

    /// Snapshot of the current run state.
    pub fn state(&self) -> MigrationState {
        self.state_lock().clone()
    }

    /// Snapshot of the migration log.
    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.log_lock().entries().to_vec()
    }

    /// Run the migration.
    ///
    /// Fails only on precondition or ledger faults; per-campaign failures
    /// are recorded in the state's `failed` outcomes and never abort the
    /// batch. A batch whose signature is already in the ledger returns the
    /// stored result without any network calls.
    pub async fn run(&self) -> Result<MigrationReport> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        self.batch.validate()?;
        let signature = self.batch.signature();

        // Idempotency: a batch that already completed short-circuits to the
        // stored result.
        if let Some(entry) = self.ledger.get(&signature).await? {
            if entry.completed {
                info!(
                    "Batch {} already completed at {}; skipping",
                    signature, entry.completed_at
                );
                self.push_log(
                    LogLevel::Info,
                    "Migration already completed for these campaigns",
                );
                {
                    let mut state = self.state_lock();
                    state.phase = MigrationPhase::Completed;
                    state.processed_count = entry.success_count + entry.failure_count;
                }
                let completed_at = Utc::now();
                return Ok(MigrationReport {
                    run_id,
                    signature,
                    status: "already_completed".to_string(),
                    started_at,
                    completed_at,
                    duration_seconds: duration_seconds(started_at, completed_at),
                    total_count: self.batch.campaigns.len(),
                    succeeded: entry.success_count,
                    failed: entry.failure_count,
                    failed_campaigns: Vec::new(),
                    from_ledger: true,
                });
            }
        }

        // Run guard: a second invocation for the same batch performs no
        // network calls and mirrors the existing state.
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("Duplicate run suppressed for batch {}", signature);
            return Ok(self.mirror_report(run_id, &signature, started_at));
        }

        info!("Starting migration run: {}", run_id);
        self.push_log(
            LogLevel::Info,
            format!(
                "Found {} campaign(s) to migrate",
                self.batch.campaigns.len()
            ),
        );

        let classification = classify(&self.batch.campaigns);
        for (level, message) in &classification.events {
            self.push_log(*level, message.clone());
        }

        self.state_lock().phase = MigrationPhase::Migrating;

        if classification.ordered.is_empty() {
            self.push_log(
                LogLevel::Error,
                "No migratable campaigns found. Only Email, Push, and SMS campaigns can be migrated.",
            );
        } else {
            self.run_campaign_list(classification.ordered).await;
        }

        self.finish_round();

        // First completion for this signature is recorded; retries and
        // repeat runs leave the entry untouched.
        if self.ledger.get(&signature).await?.is_none() {
            let entry = {
                let state = self.state_lock();
                LedgerEntry {
                    completed: true,
                    completed_at: Utc::now(),
                    success_count: state.successful.len(),
                    failure_count: state.failed.len(),
                    campaign_ids: self.batch.campaign_ids(),
                }
            };
            self.ledger.record(&signature, &entry).await?;
            self.push_log(LogLevel::Info, "Migration marked as completed");
        }

        let report = self.build_report(run_id, &signature, "completed", started_at);
        info!(
            "Migration {}: {} succeeded, {} failed of {} selected in {:.1}s",
            report.status, report.succeeded, report.failed, report.total_count, report.duration_seconds
        );
        Ok(report)
    }

    /// Re-run only the campaigns that failed.
    ///
    /// Callable once the run has completed and `failed` is non-empty.
    /// Outcomes of retried campaigns replace their prior failures; the
    /// ledger entry written by the first completion is never updated.
    pub async fn retry_failed(&self) -> Result<MigrationReport> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let signature = self.batch.signature();

        let to_retry: Vec<CampaignRef> = {
            let mut state = self.state_lock();
            if state.phase != MigrationPhase::Completed {
                return Err(MigrateError::precondition(
                    "retry is only available after the migration has completed",
                ));
            }
            if state.failed.is_empty() {
                return Err(MigrateError::precondition(
                    "there are no failed campaigns to retry",
                ));
            }
            state.phase = MigrationPhase::Migrating;
            // Each retry round starts from the current failed set and
            // redistributes it into successful/failed.
            std::mem::take(&mut state.failed)
                .into_iter()
                .map(|outcome| outcome.campaign)
                .collect()
        };

        info!("Retrying {} failed campaign(s)", to_retry.len());
        self.push_log(
            LogLevel::Info,
            format!("Retrying {} failed migration(s)...", to_retry.len()),
        );

        self.run_campaign_list(to_retry).await;
        self.finish_round();

        let report = self.build_report(run_id, &signature, "completed", started_at);
        self.push_log(
            LogLevel::Info,
            format!(
                "Retry round completed: {} now successful, {} still failing",
                report.succeeded, report.failed
            ),
        );
        Ok(report)
    }

    /// Process each campaign in order: fetch, then dispatch, recording one
    /// outcome per campaign. Shared by the initial run and the retry path.
    async fn run_campaign_list(&self, campaigns: Vec<CampaignRef>) {
        let total = campaigns.len();
        for (index, campaign) in campaigns.into_iter().enumerate() {
            // Terminal successes are never re-processed, even if a retry
            // list somehow contains one.
            if self.state_lock().processed_ids.contains(&campaign.id) {
                self.push_log(
                    LogLevel::Warning,
                    format!("Skipping {}: already migrated", campaign.name),
                );
                continue;
            }

            self.push_log(
                LogLevel::Info,
                format!(
                    "Processing campaign {} of {}: {} ({})",
                    index + 1,
                    total,
                    campaign.name,
                    campaign.campaign_type.display_name()
                ),
            );

            let outcome = self.process_campaign(&campaign).await;
            {
                let mut state = self.state_lock();
                if outcome.succeeded() {
                    state.processed_ids.insert(campaign.id.clone());
                    state.successful.push(outcome);
                } else {
                    state.failed.push(outcome);
                }
                state.processed_count = state.successful.len() + state.failed.len();
            }

            // Spacing between campaigns; the destination API is shared and
            // rate-sensitive, so items must not overlap.
            if index + 1 < total && !self.options.pause_between_campaigns.is_zero() {
                tokio::time::sleep(self.options.pause_between_campaigns).await;
            }
        }
    }

    /// One campaign attempt: fetch detail from the source, dispatch it to
    /// the destination. Failures are captured into the outcome.
    async fn process_campaign(&self, campaign: &CampaignRef) -> MigrationOutcome {
        self.push_log(LogLevel::Info, "Fetching campaign details from Braze...");
        let detail = match self
            .fetcher
            .fetch(&campaign.id, &self.batch.source_credentials)
            .await
        {
            Ok(detail) => {
                self.push_log(LogLevel::Success, "Campaign details fetched successfully");
                detail
            }
            Err(e) => {
                warn!("Fetch failed for campaign {}: {}", campaign.id, e);
                self.push_log(
                    LogLevel::Error,
                    format!("Failed to fetch campaign details: {}", e),
                );
                return MigrationOutcome::failure(
                    campaign.clone(),
                    AttemptPhase::Fetch,
                    e.to_string(),
                );
            }
        };

        self.push_log(
            LogLevel::Info,
            format!(
                "Sending to {} migration service...",
                campaign.campaign_type.display_name()
            ),
        );
        match self
            .dispatcher
            .dispatch(
                &detail,
                campaign.campaign_type,
                &self.batch.destination_credentials,
            )
            .await
        {
            Ok(response) => {
                if let Some(draft_id) = response.draft_id() {
                    self.push_log(LogLevel::Info, format!("Draft ID: {}", draft_id));
                }
                if !response.draft_created() {
                    self.push_log(
                        LogLevel::Warning,
                        "Payload converted but draft creation may have failed",
                    );
                }
                self.push_log(
                    LogLevel::Success,
                    format!("Draft created in MoEngage for: {}", campaign.name),
                );
                MigrationOutcome::success(campaign.clone(), response)
            }
            Err(e) => {
                warn!("Dispatch failed for campaign {}: {}", campaign.id, e);
                self.push_log(
                    LogLevel::Error,
                    format!("Migration failed for {}: {}", campaign.name, e),
                );
                MigrationOutcome::failure(campaign.clone(), AttemptPhase::Dispatch, e.to_string())
            }
        }
    }

    /// Transition the round to `Completed`. Unconditional: a round with
    /// every campaign failed still completes.
    fn finish_round(&self) {
        self.state_lock().phase = MigrationPhase::Completed;
        self.push_log(LogLevel::Success, "Migration process completed");
    }

    /// Report mirroring the current state, for a suppressed duplicate run.
    fn mirror_report(
        &self,
        run_id: String,
        signature: &str,
        started_at: DateTime<Utc>,
    ) -> MigrationReport {
        let status = match self.state_lock().phase {
            MigrationPhase::Completed => "completed",
            _ => "in_progress",
        };
        self.build_report(run_id, signature, status, started_at)
    }

    fn build_report(
        &self,
        run_id: String,
        signature: &str,
        status: &str,
        started_at: DateTime<Utc>,
    ) -> MigrationReport {
        let state = self.state_lock();
        let completed_at = Utc::now();
        MigrationReport {
            run_id,
            signature: signature.to_string(),
            status: status.to_string(),
            started_at,
            completed_at,
            duration_seconds: duration_seconds(started_at, completed_at),
            total_count: state.total_count,
            succeeded: state.successful.len(),
            failed: state.failed.len(),
            failed_campaigns: state
                .failed
                .iter()
                .map(|outcome| outcome.campaign.name.clone())
                .collect(),
            from_ledger: false,
        }
    }

    fn state_lock(&self) -> MutexGuard<'_, MigrationState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn log_lock(&self) -> MutexGuard<'_, MigrationLog> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push_log(&self, level: LogLevel, message: impl Into<String>) {
        self.log_lock().push(level, message);
    }
}

fn duration_seconds(started_at: DateTime<Utc>, completed_at: DateTime<Utc>) -> f64 {
    (completed_at - started_at).num_milliseconds() as f64 / 1000.0
}
