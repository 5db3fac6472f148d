//! The poll loop: fetch unpaid records, charge each once, write back, pace.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use payment_processor::PaymentProcessor;
use record_store::{ListRecordsOptions, Record, RecordSource, StoreError, MAX_PAGE_SIZE};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::charge::{ChargeOutcome, Charger};
use crate::eligibility::{check, Eligibility};
use crate::fields::FieldMap;
use crate::normalize::{normalize, SkipReason};
use crate::writer::{patch_for, write};

/// Default pause between records and between cycles.
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(1);

/// Source of the current time, used by the not-before gate.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Configuration for the poll scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Table holding the invoice records.
    pub table: String,

    /// Column names.
    pub fields: FieldMap,

    /// Records requested per page.
    pub page_size: usize,

    /// Pause after each record that touched an external API, and between
    /// pages.
    pub record_pause: Duration,

    /// Pause between cycles.
    pub cycle_pause: Duration,
}

impl SchedulerConfig {
    /// Create a config with default paging and pacing.
    pub fn new(table: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            table: table.into(),
            fields,
            page_size: MAX_PAGE_SIZE,
            record_pause: DEFAULT_PAUSE,
            cycle_pause: DEFAULT_PAUSE,
        }
    }

    /// Override both pauses.
    pub fn with_pauses(mut self, record_pause: Duration, cycle_pause: Duration) -> Self {
        self.record_pause = record_pause;
        self.cycle_pause = cycle_pause;
        self
    }
}

/// Errors that end a cycle early.
#[derive(Debug, Error)]
pub enum CycleError {
    /// Listing records failed.
    #[error("failed to fetch records: {0}")]
    Fetch(#[source] StoreError),

    /// Writing an outcome back failed.
    #[error("failed to update record {record_id}: {source}")]
    Update {
        record_id: String,
        #[source]
        source: StoreError,
    },

    /// The processor is unreachable or refusing requests. The failure has
    /// already been noted on the record.
    #[error("payment processor unavailable while charging record {record_id}: {reason}")]
    ProcessorUnavailable { record_id: String, reason: String },
}

impl CycleError {
    /// Whether the record store rejected the credentials.
    pub fn is_auth(&self) -> bool {
        match self {
            CycleError::Fetch(source) | CycleError::Update { source, .. } => source.is_auth(),
            CycleError::ProcessorUnavailable { .. } => false,
        }
    }
}

/// Result of processing a single record.
#[derive(Debug)]
pub enum RecordOutcome {
    /// Charged and marked paid.
    Charged {
        record_id: String,
        confirmation_id: String,
    },
    /// Charge failed; the reason was written to the notes column.
    Declined { record_id: String, reason: String },
    /// Not charged this cycle; nothing was written.
    Skipped {
        record_id: String,
        reason: SkipReason,
    },
}

impl RecordOutcome {
    /// Whether processing made any external call.
    pub fn touched_external(&self) -> bool {
        !matches!(self, RecordOutcome::Skipped { .. })
    }
}

/// Counts for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub pages: usize,
    pub charged: usize,
    pub declined: usize,
    pub skipped: usize,
    /// Shutdown was requested before the cycle finished.
    pub interrupted: bool,
}

impl CycleReport {
    fn record(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Charged { .. } => self.charged += 1,
            RecordOutcome::Declined { .. } => self.declined += 1,
            RecordOutcome::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Polls the record store and charges eligible records one at a time.
pub struct PollScheduler<S, P> {
    store: S,
    charger: Charger<P>,
    config: SchedulerConfig,
    clock: Clock,
}

impl<S, P> PollScheduler<S, P>
where
    S: RecordSource,
    P: PaymentProcessor,
{
    /// Create a new scheduler.
    pub fn new(store: S, processor: P, config: SchedulerConfig) -> Self {
        Self {
            store,
            charger: Charger::new(processor),
            config,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Get a reference to the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get a reference to the charger.
    pub fn charger(&self) -> &Charger<P> {
        &self.charger
    }

    /// Get the configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Run cycles until `shutdown` is cancelled.
    ///
    /// Cancellation is honoured at the top of each cycle, between records
    /// and during pauses. A record whose charge has started is always
    /// written back before this returns.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            "Starting poll scheduler on table {} (store: {}, processor: {})",
            self.config.table,
            self.store.name(),
            self.charger.processor().name()
        );

        while !shutdown.is_cancelled() {
            match self.run_cycle(&shutdown).await {
                Ok(report) => info!(
                    "Cycle complete: {} charged, {} declined, {} skipped ({} pages)",
                    report.charged, report.declined, report.skipped, report.pages
                ),
                Err(e) if e.is_auth() => {
                    error!("Cycle aborted, record store rejected the credentials: {}", e)
                }
                Err(e) => error!("Cycle aborted: {}", e),
            }

            if !self.pause(self.config.cycle_pause, &shutdown).await {
                break;
            }
        }

        info!("Poll scheduler stopped");
    }

    /// Run one cycle over every unpaid record.
    pub async fn run_cycle(&self, shutdown: &CancellationToken) -> Result<CycleReport, CycleError> {
        let mut report = CycleReport::default();
        let mut offset = None;

        loop {
            let options = ListRecordsOptions::table(&self.config.table)
                .with_fields(self.config.fields.projection())
                .with_filter(self.config.fields.unpaid_formula())
                .with_page_size(self.config.page_size)
                .with_offset(offset.take());

            let page = self
                .store
                .list_records(&options)
                .await
                .map_err(CycleError::Fetch)?;
            report.pages += 1;
            debug!("Fetched {} unpaid records", page.records.len());

            // Set when the last record already paced the next request.
            let mut paused = false;
            for record in &page.records {
                if shutdown.is_cancelled() {
                    report.interrupted = true;
                    return Ok(report);
                }

                let outcome = self.process_record(record).await?;
                report.record(&outcome);

                paused = outcome.touched_external();
                if paused && !self.pause(self.config.record_pause, shutdown).await {
                    report.interrupted = true;
                    return Ok(report);
                }
            }

            match page.offset {
                Some(next) => {
                    if !paused && !self.pause(self.config.record_pause, shutdown).await {
                        report.interrupted = true;
                        return Ok(report);
                    }
                    offset = Some(next);
                }
                None => return Ok(report),
            }
        }
    }

    /// Normalize, gate, charge and write back a single record.
    pub async fn process_record(&self, record: &Record) -> Result<RecordOutcome, CycleError> {
        let fields = &self.config.fields;

        let intent = match normalize(record, fields) {
            Ok(intent) => intent,
            Err(reason) => {
                match &reason {
                    SkipReason::MalformedField { .. } => {
                        warn!("Skipping record {}: {}", record.id, reason)
                    }
                    _ => debug!("Skipping record {}: {}", record.id, reason),
                }
                return Ok(RecordOutcome::Skipped {
                    record_id: record.id.clone(),
                    reason,
                });
            }
        };

        if let Eligibility::NotYetDue(date) = check(intent.not_before, (self.clock)()) {
            let reason = SkipReason::NotYetDue(date);
            debug!("Skipping record {}: {}", record.id, reason);
            return Ok(RecordOutcome::Skipped {
                record_id: record.id.clone(),
                reason,
            });
        }

        let outcome = self
            .charger
            .charge(&intent.customer_id, &intent.currency, intent.amount)
            .await;

        let patch = patch_for(&record.id, &outcome, fields);
        if let Err(source) = write(&self.store, &self.config.table, patch).await {
            match &outcome {
                ChargeOutcome::Success { confirmation_id } => error!(
                    "Record {} was charged ({}) but could not be marked paid: {}",
                    record.id, confirmation_id, source
                ),
                ChargeOutcome::Failure { reason } => error!(
                    "Could not record charge failure for {} ({}): {}",
                    record.id, reason, source
                ),
            }
            return Err(CycleError::Update {
                record_id: record.id.clone(),
                source,
            });
        }

        match outcome {
            ChargeOutcome::Success { confirmation_id } => {
                info!("Record {} paid: {}", record.id, confirmation_id);
                Ok(RecordOutcome::Charged {
                    record_id: record.id.clone(),
                    confirmation_id,
                })
            }
            ChargeOutcome::Failure { reason } => {
                warn!("Record {} not charged: {}", record.id, reason);
                if reason.is_infrastructure() {
                    return Err(CycleError::ProcessorUnavailable {
                        record_id: record.id.clone(),
                        reason: reason.to_string(),
                    });
                }
                Ok(RecordOutcome::Declined {
                    record_id: record.id.clone(),
                    reason: reason.to_string(),
                })
            }
        }
    }

    /// Sleep for `duration` unless shutdown is requested first. Returns
    /// `false` on shutdown.
    async fn pause(&self, duration: Duration, shutdown: &CancellationToken) -> bool {
        if duration.is_zero() {
            return !shutdown.is_cancelled();
        }

        tokio::select! {
            biased;
            () = shutdown.cancelled() => false,
            () = tokio::time::sleep(duration) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_auth_classification() {
        let rejected = CycleError::Fetch(StoreError::Unauthorized {
            status: 401,
            message: "AUTHENTICATION_REQUIRED".to_string(),
        });
        assert!(rejected.is_auth());

        let forbidden_update = CycleError::Update {
            record_id: "rec1".to_string(),
            source: StoreError::Unauthorized {
                status: 403,
                message: "INVALID_PERMISSIONS".to_string(),
            },
        };
        assert!(forbidden_update.is_auth());

        let outage = CycleError::Fetch(StoreError::Api {
            status: 503,
            message: "service unavailable".to_string(),
        });
        assert!(!outage.is_auth());

        let processor = CycleError::ProcessorUnavailable {
            record_id: "rec1".to_string(),
            reason: "down".to_string(),
        };
        assert!(!processor.is_auth());
    }
}
