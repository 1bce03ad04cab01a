//! Convergence controller.
//!
//! Drives one quota at a time through
//! `Unmanaged/Managed -> Reading -> {Noop | Increasing | Error} -> Managed`.
//! Reads always precede writes. A pending increase request recorded by an
//! earlier pass, or one found open on the remote side, is resumed instead
//! of submitting a duplicate. When such a request is approved below the
//! desired value the remainder is requested in the same pass. Nothing is
//! submitted once the cancellation token has fired.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    DesiredQuota, ObservedQuota, PendingRequest, QuotaChangeRequest, QuotaIdentity,
    ReconcilePhase, ResourceRecord,
};
use crate::domain::ports::{ClientError, QuotaServiceClient, RecordRepository};
use crate::services::comparator::diff;
use crate::services::poller::{IncreasePoller, PollOutcome};

/// What a successful convergence did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ConvergeAction {
    /// Remote already met or exceeded the desired value
    Unchanged,
    /// An increase request was approved
    Increased { request_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Convergence {
    pub record: ResourceRecord,
    #[serde(flatten)]
    pub action: ConvergeAction,
}

/// A managed record next to the remote value it was refreshed against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshedQuota {
    pub record: ResourceRecord,
    pub observed: ObservedQuota,
}

impl RefreshedQuota {
    /// Remote value differs from the last value this engine applied.
    pub fn has_drifted(&self) -> bool {
        self.record.last_applied_value != self.observed.value
    }
}

pub struct ConvergenceController {
    client: Arc<dyn QuotaServiceClient>,
    records: Arc<dyn RecordRepository>,
    poller: IncreasePoller,
    allow_increase_requests: bool,
}

impl ConvergenceController {
    pub fn new(
        client: Arc<dyn QuotaServiceClient>,
        records: Arc<dyn RecordRepository>,
        poller: IncreasePoller,
    ) -> Self {
        Self {
            client,
            records,
            poller,
            allow_increase_requests: false,
        }
    }

    /// Permit submitting real increase requests.
    pub fn allow_increase_requests(mut self, allow: bool) -> Self {
        self.allow_increase_requests = allow;
        self
    }

    /// Read the effective remote value.
    ///
    /// Falls back to the service default when the account has no applied
    /// value. `Ok(None)` means the quota does not exist remotely; any other
    /// client failure is returned unmodified.
    #[instrument(skip(self), fields(identity = %identity))]
    pub async fn read(&self, identity: &QuotaIdentity) -> DomainResult<Option<ObservedQuota>> {
        match self.client.get_quota(identity).await {
            Ok(observed) => Ok(Some(observed)),
            Err(ClientError::NotFound(_)) => {
                debug!("no applied value, reading service default");
                match self.client.get_default_quota(identity).await {
                    Ok(observed) => Ok(Some(observed.as_default())),
                    Err(ClientError::NotFound(_)) => Ok(None),
                    Err(err) => Err(err.into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Converge a quota, adopting an existing record if there is one.
    #[instrument(skip(self, desired, cancel), fields(identity = %desired.identity, value = desired.value))]
    pub async fn create(
        &self,
        desired: &DesiredQuota,
        cancel: &CancellationToken,
    ) -> DomainResult<Convergence> {
        let existing = self.records.get(&desired.identity).await?;
        self.converge(desired, existing, cancel).await
    }

    /// Converge a quota that is already managed.
    #[instrument(skip(self, desired, cancel), fields(identity = %desired.identity, value = desired.value))]
    pub async fn update(
        &self,
        desired: &DesiredQuota,
        cancel: &CancellationToken,
    ) -> DomainResult<Convergence> {
        let existing = self
            .records
            .get(&desired.identity)
            .await?
            .ok_or_else(|| DomainError::NotManaged(desired.identity.encode()))?;
        self.converge(desired, Some(existing), cancel).await
    }

    /// Update when managed, create otherwise.
    pub async fn apply(
        &self,
        desired: &DesiredQuota,
        cancel: &CancellationToken,
    ) -> DomainResult<Convergence> {
        let existing = self.records.get(&desired.identity).await?;
        debug!(identity = %desired.identity, managed = existing.is_some(), "applying desired quota");
        self.converge(desired, existing, cancel).await
    }

    /// Stop managing a quota. The remote quota is left untouched.
    #[instrument(skip(self), fields(identity = %identity))]
    pub async fn delete(&self, identity: &QuotaIdentity) -> DomainResult<bool> {
        let removed = self.records.delete(identity).await?;
        info!(removed, "record forgotten");
        Ok(removed)
    }

    /// Start managing an existing remote quota from its import token.
    ///
    /// `Ok(None)` when the quota does not exist remotely.
    #[instrument(skip(self))]
    pub async fn import(&self, token: &str) -> DomainResult<Option<ResourceRecord>> {
        let identity = QuotaIdentity::decode(token)?;
        let Some(observed) = self.read(&identity).await? else {
            info!(identity = %identity, "nothing to import");
            return Ok(None);
        };

        let mut record = ResourceRecord::new(identity, observed.value);
        if let Some(pending) = self
            .records
            .get(&record.identity)
            .await?
            .and_then(|existing| existing.pending)
        {
            record.track(pending);
        }
        self.records.upsert(&record).await?;
        info!(identity = %record.identity, value = observed.value, "quota imported");
        Ok(Some(record))
    }

    /// Re-read a managed quota.
    ///
    /// A quota that disappeared remotely loses its local record and yields
    /// `Ok(None)`.
    #[instrument(skip(self), fields(identity = %identity))]
    pub async fn refresh(&self, identity: &QuotaIdentity) -> DomainResult<Option<RefreshedQuota>> {
        let record = self
            .records
            .get(identity)
            .await?
            .ok_or_else(|| DomainError::NotManaged(identity.encode()))?;

        match self.read(identity).await? {
            Some(observed) => Ok(Some(RefreshedQuota { record, observed })),
            None => {
                warn!("quota gone remotely, dropping record");
                self.records.delete(identity).await?;
                Ok(None)
            }
        }
    }

    pub async fn list(&self) -> DomainResult<Vec<ResourceRecord>> {
        Ok(self.records.list().await?)
    }

    async fn converge(
        &self,
        desired: &DesiredQuota,
        existing: Option<ResourceRecord>,
        cancel: &CancellationToken,
    ) -> DomainResult<Convergence> {
        let identity = &desired.identity;
        let mut phase = if existing.is_some() {
            ReconcilePhase::Managed
        } else {
            ReconcilePhase::Unmanaged
        };
        advance(&mut phase, ReconcilePhase::Reading);

        let observed = match self.read(identity).await {
            Ok(Some(observed)) => observed,
            Ok(None) => {
                advance(&mut phase, ReconcilePhase::Error);
                return Err(DomainError::NotFound(identity.encode()));
            }
            Err(err) => {
                advance(&mut phase, ReconcilePhase::Error);
                return Err(err);
            }
        };

        let change = diff(desired, &observed);
        debug!(
            observed = observed.value,
            delta = change.delta,
            direction = ?change.direction,
            "compared desired and observed"
        );

        let is_new = existing.is_none();
        let mut record =
            existing.unwrap_or_else(|| ResourceRecord::new(identity.clone(), observed.value));

        if let Some(pending) = record.pending.clone() {
            if change.is_noop() {
                info!(request_id = %pending.request_id, "observed value already satisfies pending request");
                record.clear_pending();
            } else {
                advance(&mut phase, ReconcilePhase::Increasing);
                info!(request_id = %pending.request_id, "resuming pending increase request");
                let request = pending.to_request(identity);
                let settled = self
                    .settle(record, request, is_new, &mut phase, true, cancel)
                    .await?;
                return self.top_up(desired, settled, &mut phase, cancel).await;
            }
        }

        if change.is_noop() {
            advance(&mut phase, ReconcilePhase::Noop);
            record.applied(observed.value);
            self.persist(&record, &mut phase).await?;
            advance(&mut phase, ReconcilePhase::Managed);
            return Ok(Convergence {
                record,
                action: ConvergeAction::Unchanged,
            });
        }

        advance(&mut phase, ReconcilePhase::Increasing);

        let open = match self.client.list_open_requests(identity).await {
            Ok(open) => open,
            Err(err) => {
                advance(&mut phase, ReconcilePhase::Error);
                return Err(err.into());
            }
        };
        if let Some(in_flight) = open.into_iter().find(QuotaChangeRequest::is_open) {
            info!(request_id = %in_flight.id, status = %in_flight.status, "adopting in-flight increase request");
            let settled = self
                .settle(record, in_flight, is_new, &mut phase, false, cancel)
                .await?;
            return self.top_up(desired, settled, &mut phase, cancel).await;
        }

        self.submit_and_settle(desired, record, is_new, &mut phase, cancel)
            .await
    }

    /// Submit a new increase to `desired.value` and wait for it.
    ///
    /// Nothing is submitted without the opt-in or once `cancel` has fired.
    async fn submit_and_settle(
        &self,
        desired: &DesiredQuota,
        record: ResourceRecord,
        is_new: bool,
        phase: &mut ReconcilePhase,
        cancel: &CancellationToken,
    ) -> DomainResult<Convergence> {
        let identity = &desired.identity;
        if !self.allow_increase_requests {
            advance(phase, ReconcilePhase::Error);
            return Err(DomainError::IncreaseNotPermitted {
                identity: identity.encode(),
                value: desired.value,
            });
        }
        if cancel.is_cancelled() {
            advance(phase, ReconcilePhase::Error);
            info!("cancelled before submitting increase request");
            return Err(DomainError::Cancelled {
                identity: identity.encode(),
            });
        }

        let request = match self.poller.submit(identity, desired.value).await {
            Ok(request) => request,
            Err(err) => {
                advance(phase, ReconcilePhase::Error);
                return Err(err);
            }
        };
        let converged = self
            .settle(record, request, is_new, phase, false, cancel)
            .await?;
        advance(phase, ReconcilePhase::Managed);
        Ok(converged)
    }

    /// An approved request that asked for less than `desired.value` leaves a
    /// remainder; request it in the same pass.
    async fn top_up(
        &self,
        desired: &DesiredQuota,
        settled: Convergence,
        phase: &mut ReconcilePhase,
        cancel: &CancellationToken,
    ) -> DomainResult<Convergence> {
        let applied = settled.record.last_applied_value;
        if applied >= desired.value {
            advance(phase, ReconcilePhase::Managed);
            return Ok(settled);
        }
        info!(
            applied,
            desired = desired.value,
            "approved request fell short of desired value"
        );
        self.submit_and_settle(desired, settled.record, false, phase, cancel)
            .await
    }

    /// Wait for `request` and record how it ended.
    async fn settle(
        &self,
        mut record: ResourceRecord,
        request: QuotaChangeRequest,
        is_new: bool,
        phase: &mut ReconcilePhase,
        resumed: bool,
        cancel: &CancellationToken,
    ) -> DomainResult<Convergence> {
        let identity = record.identity.encode();
        record.track(PendingRequest::from(&request));

        let outcome = match self.poller.wait_for_terminal(&request, cancel).await {
            Ok(outcome) => outcome,
            Err(DomainError::Client(ClientError::NotFound(reason))) if resumed => {
                // The remembered request no longer exists; the next pass submits afresh.
                warn!(request_id = %request.id, "pending request vanished remotely");
                advance(phase, ReconcilePhase::Error);
                if !is_new {
                    record.clear_pending();
                    self.records.upsert(&record).await?;
                }
                return Err(DomainError::Client(ClientError::NotFound(reason)));
            }
            Err(err) => {
                advance(phase, ReconcilePhase::Error);
                return Err(err);
            }
        };

        match outcome {
            PollOutcome::Approved {
                request_id,
                final_value,
            } => {
                record.applied(final_value);
                self.persist(&record, phase).await?;
                info!(request_id = %request_id, value = final_value, "increase approved");
                Ok(Convergence {
                    record,
                    action: ConvergeAction::Increased { request_id },
                })
            }
            PollOutcome::Rejected { request_id, status } => {
                advance(phase, ReconcilePhase::Error);
                if !is_new {
                    record.clear_pending();
                    self.records.upsert(&record).await?;
                }
                warn!(request_id = %request_id, status = %status, "increase request rejected");
                Err(DomainError::Rejected {
                    identity,
                    request_id,
                    status,
                })
            }
            PollOutcome::TimedOut {
                request_id,
                last_status,
            } => {
                record.track(PendingRequest {
                    request_id: request_id.clone(),
                    requested_value: request.desired_value,
                    last_status,
                });
                self.records.upsert(&record).await?;
                advance(phase, ReconcilePhase::Error);
                info!(request_id = %request_id, last_status = %last_status, "increase still pending");
                Err(DomainError::TimedOut {
                    identity,
                    request_id,
                    last_status,
                })
            }
        }
    }

    async fn persist(&self, record: &ResourceRecord, phase: &mut ReconcilePhase) -> DomainResult<()> {
        if let Err(err) = self.records.upsert(record).await {
            advance(phase, ReconcilePhase::Error);
            return Err(err.into());
        }
        Ok(())
    }
}

fn advance(phase: &mut ReconcilePhase, next: ReconcilePhase) {
    if !phase.can_transition_to(next) {
        warn!(from = %phase, to = %next, "unexpected reconcile phase transition");
    }
    debug!(from = %phase, to = %next, "reconcile phase");
    *phase = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryQuotaClient, InMemoryRecordRepository};
    use crate::domain::models::RequestStatus;
    use crate::services::poller::PollPolicy;
    use std::time::Duration;

    fn vpc() -> QuotaIdentity {
        QuotaIdentity::new("vpc", "L-F678F1CE").unwrap()
    }

    fn controller(
        client: &Arc<InMemoryQuotaClient>,
        records: &Arc<InMemoryRecordRepository>,
    ) -> ConvergenceController {
        let poller = IncreasePoller::new(
            client.clone(),
            PollPolicy {
                poll_interval: Duration::from_secs(5),
                max_wait: Duration::from_secs(60),
            },
        );
        ConvergenceController::new(client.clone(), records.clone(), poller)
            .allow_increase_requests(true)
    }

    #[tokio::test]
    async fn test_read_falls_back_to_default() {
        let client = Arc::new(InMemoryQuotaClient::new());
        client.insert_default(vpc(), 5.0).await;
        let records = Arc::new(InMemoryRecordRepository::new());

        let observed = controller(&client, &records).read(&vpc()).await.unwrap().unwrap();
        assert!(observed.is_default);
        assert!((observed.value - 5.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_read_missing_is_none() {
        let client = Arc::new(InMemoryQuotaClient::new());
        let records = Arc::new(InMemoryRecordRepository::new());

        assert!(controller(&client, &records).read(&vpc()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_surfaces_other_errors() {
        let client = Arc::new(InMemoryQuotaClient::new());
        client
            .fail_next_read(ClientError::AccessDenied("no".to_string()))
            .await;
        let records = Arc::new(InMemoryRecordRepository::new());

        let err = controller(&client, &records).read(&vpc()).await.unwrap_err();
        assert!(matches!(err, DomainError::Client(ClientError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn test_update_requires_record() {
        let client = Arc::new(InMemoryQuotaClient::new());
        client.insert_quota(vpc(), 70.0).await;
        let records = Arc::new(InMemoryRecordRepository::new());
        let desired = DesiredQuota::new(vpc(), 75.0).unwrap();

        let err = controller(&client, &records)
            .update(&desired, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotManaged(_)));
    }

    #[tokio::test]
    async fn test_create_missing_quota_is_not_found() {
        let client = Arc::new(InMemoryQuotaClient::new());
        let records = Arc::new(InMemoryRecordRepository::new());
        let desired = DesiredQuota::new(vpc(), 75.0).unwrap();

        let err = controller(&client, &records)
            .create(&desired, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        assert_eq!(client.submit_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_create_persists_nothing() {
        let client = Arc::new(InMemoryQuotaClient::new());
        client.insert_quota(vpc(), 70.0).await;
        client.set_status_script(vec![RequestStatus::NotApproved]).await;
        let records = Arc::new(InMemoryRecordRepository::new());
        let desired = DesiredQuota::new(vpc(), 75.0).unwrap();

        let err = controller(&client, &records)
            .create(&desired, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Rejected {
                status: RequestStatus::NotApproved,
                ..
            }
        ));
        assert!(records.get(&vpc()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_drops_record_for_missing_quota() {
        let client = Arc::new(InMemoryQuotaClient::new());
        let records = Arc::new(InMemoryRecordRepository::new());
        records.upsert(&ResourceRecord::new(vpc(), 70.0)).await.unwrap();

        let refreshed = controller(&client, &records).refresh(&vpc()).await.unwrap();
        assert!(refreshed.is_none());
        assert!(records.get(&vpc()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_reports_drift() {
        let client = Arc::new(InMemoryQuotaClient::new());
        client.insert_quota(vpc(), 90.0).await;
        let records = Arc::new(InMemoryRecordRepository::new());
        records.upsert(&ResourceRecord::new(vpc(), 70.0)).await.unwrap();

        let refreshed = controller(&client, &records)
            .refresh(&vpc())
            .await
            .unwrap()
            .unwrap();
        assert!(refreshed.has_drifted());
    }

    #[tokio::test]
    async fn test_cancelled_token_blocks_submit() {
        let client = Arc::new(InMemoryQuotaClient::new());
        client.insert_quota(vpc(), 70.0).await;
        let records = Arc::new(InMemoryRecordRepository::new());
        let desired = DesiredQuota::new(vpc(), 75.0).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = controller(&client, &records)
            .create(&desired, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Cancelled { .. }));
        assert_eq!(client.submit_count(), 0);
        assert!(records.get(&vpc()).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_adopted_request_is_topped_up() {
        let client = Arc::new(InMemoryQuotaClient::new());
        client.insert_quota(vpc(), 70.0).await;
        client
            .insert_open_request(vpc(), 75.0, vec![RequestStatus::Approved])
            .await;
        client.set_status_script(vec![RequestStatus::Approved]).await;
        let records = Arc::new(InMemoryRecordRepository::new());
        let desired = DesiredQuota::new(vpc(), 100.0).unwrap();

        let converged = controller(&client, &records)
            .create(&desired, &CancellationToken::new())
            .await
            .unwrap();
        assert!(matches!(converged.action, ConvergeAction::Increased { .. }));
        assert_eq!(converged.record.last_applied_value, 100.0);
        assert_eq!(client.submit_count(), 1);
        assert_eq!(client.current_value(&vpc()).await, Some(100.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_adopted_request_without_opt_in_is_not_converged() {
        let client = Arc::new(InMemoryQuotaClient::new());
        client.insert_quota(vpc(), 70.0).await;
        client
            .insert_open_request(vpc(), 75.0, vec![RequestStatus::Approved])
            .await;
        let records = Arc::new(InMemoryRecordRepository::new());
        let desired = DesiredQuota::new(vpc(), 100.0).unwrap();

        let err = controller(&client, &records)
            .allow_increase_requests(false)
            .create(&desired, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::IncreaseNotPermitted { value, .. } if value == 100.0
        ));
        assert_eq!(client.submit_count(), 0);
        let stored = records.get(&vpc()).await.unwrap().unwrap();
        assert_eq!(stored.last_applied_value, 75.0);
        assert!(stored.pending.is_none());
    }
}
