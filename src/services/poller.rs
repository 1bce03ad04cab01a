//! Quota-increase poller.
//!
//! Bridges a synchronous reconciliation to a remote workflow that completes
//! out-of-band. The poller submits an increase request and then checks its
//! status at a fixed interval until it reaches a terminal status, the wait
//! budget runs out, or the caller cancels. Running out of budget is not an
//! error: the request keeps progressing remotely and a later pass resumes
//! polling the same request id.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{PollerConfig, QuotaChangeRequest, QuotaIdentity, RequestStatus};
use crate::domain::ports::{ClientError, QuotaServiceClient};

/// Poll interval and wait budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&PollerConfig::default())
    }
}

impl From<&PollerConfig> for PollPolicy {
    fn from(config: &PollerConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_wait: Duration::from_secs(config.max_wait_secs),
        }
    }
}

/// How a wait ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The request was approved; `final_value` is the granted value
    Approved { request_id: String, final_value: f64 },
    /// The request reached a terminal failure status
    Rejected {
        request_id: String,
        status: RequestStatus,
    },
    /// Budget exhausted or cancelled before a terminal status
    TimedOut {
        request_id: String,
        last_status: RequestStatus,
    },
}

/// One status check.
enum PollAttempt {
    Observed(QuotaChangeRequest),
    /// Transient failure checking status; retried while budget remains
    PollingError(ClientError),
}

pub struct IncreasePoller {
    client: Arc<dyn QuotaServiceClient>,
    policy: PollPolicy,
}

impl IncreasePoller {
    pub fn new(client: Arc<dyn QuotaServiceClient>, policy: PollPolicy) -> Self {
        Self { client, policy }
    }

    /// Submit an increase request. A synchronous rejection by the remote
    /// system becomes [`DomainError::SubmitFailed`] and is never retried.
    #[instrument(skip(self), fields(identity = %identity))]
    pub async fn submit(
        &self,
        identity: &QuotaIdentity,
        value: f64,
    ) -> DomainResult<QuotaChangeRequest> {
        match self.client.request_increase(identity, value).await {
            Ok(request) => {
                info!(
                    request_id = %request.id,
                    status = %request.status,
                    desired_value = value,
                    "increase request submitted"
                );
                Ok(request)
            }
            Err(source) => {
                warn!(error = %source, "increase request rejected at submission");
                Err(DomainError::SubmitFailed {
                    identity: identity.encode(),
                    source,
                })
            }
        }
    }

    /// Wait using the configured policy.
    pub async fn wait_for_terminal(
        &self,
        request: &QuotaChangeRequest,
        cancel: &CancellationToken,
    ) -> DomainResult<PollOutcome> {
        self.wait_for_terminal_with(
            request,
            self.policy.max_wait,
            self.policy.poll_interval,
            cancel,
        )
        .await
    }

    /// Poll `request` every `poll_interval` until it is terminal or `max_wait`
    /// has elapsed.
    ///
    /// The last sleep is clipped to the deadline, so the wait ends at most
    /// one status check after `max_wait`. Cancellation returns
    /// [`PollOutcome::TimedOut`] immediately. Transient status-check failures
    /// are retried; permanent ones are returned as [`DomainError::Client`].
    #[instrument(
        skip(self, request, cancel),
        fields(request_id = %request.id, identity = %request.identity)
    )]
    pub async fn wait_for_terminal_with(
        &self,
        request: &QuotaChangeRequest,
        max_wait: Duration,
        poll_interval: Duration,
        cancel: &CancellationToken,
    ) -> DomainResult<PollOutcome> {
        if request.status.is_terminal() {
            return Ok(Self::settle(request));
        }

        let deadline = Instant::now() + max_wait;
        let mut last_status = request.status;
        let mut polls = 0u32;

        loop {
            if cancel.is_cancelled() {
                info!(polls, last_status = %last_status, "polling cancelled");
                return Ok(Self::timed_out(request, last_status));
            }

            polls += 1;
            match self.attempt(&request.id).await? {
                PollAttempt::Observed(current) => {
                    if current.status != last_status {
                        if last_status.can_transition_to(current.status) {
                            debug!(from = %last_status, to = %current.status, "request status changed");
                        } else {
                            warn!(from = %last_status, to = %current.status, "unexpected request status transition");
                        }
                        last_status = current.status;
                    }
                    if current.status.is_terminal() {
                        info!(polls, status = %current.status, "request reached terminal status");
                        return Ok(Self::settle(&current));
                    }
                }
                PollAttempt::PollingError(err) => {
                    warn!(error = %err, polls, "status check failed, retrying within wait budget");
                }
            }

            let now = Instant::now();
            if now >= deadline {
                info!(polls, last_status = %last_status, "wait budget exhausted");
                return Ok(Self::timed_out(request, last_status));
            }

            let pause = poll_interval.min(deadline - now);
            tokio::select! {
                () = cancel.cancelled() => {
                    info!(polls, last_status = %last_status, "polling cancelled");
                    return Ok(Self::timed_out(request, last_status));
                }
                () = tokio::time::sleep(pause) => {}
            }
        }
    }

    async fn attempt(&self, request_id: &str) -> DomainResult<PollAttempt> {
        match self.client.get_change_request(request_id).await {
            Ok(current) => Ok(PollAttempt::Observed(current)),
            Err(err) if err.is_transient() => Ok(PollAttempt::PollingError(err)),
            Err(err) => Err(DomainError::Client(err)),
        }
    }

    fn settle(request: &QuotaChangeRequest) -> PollOutcome {
        if request.status.is_success() {
            PollOutcome::Approved {
                request_id: request.id.clone(),
                final_value: request.desired_value,
            }
        } else {
            PollOutcome::Rejected {
                request_id: request.id.clone(),
                status: request.status,
            }
        }
    }

    fn timed_out(request: &QuotaChangeRequest, last_status: RequestStatus) -> PollOutcome {
        PollOutcome::TimedOut {
            request_id: request.id.clone(),
            last_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryQuotaClient;

    fn vpc() -> QuotaIdentity {
        QuotaIdentity::new("vpc", "L-F678F1CE").unwrap()
    }

    fn poller(client: &Arc<InMemoryQuotaClient>) -> IncreasePoller {
        IncreasePoller::new(
            client.clone(),
            PollPolicy {
                poll_interval: Duration::from_secs(5),
                max_wait: Duration::from_secs(60),
            },
        )
    }

    #[test]
    fn test_policy_from_config() {
        let policy = PollPolicy::from(&PollerConfig {
            poll_interval_secs: 2,
            max_wait_secs: 30,
        });
        assert_eq!(policy.poll_interval, Duration::from_secs(2));
        assert_eq!(policy.max_wait, Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_approved_after_case_opened() {
        let client = Arc::new(InMemoryQuotaClient::new());
        client.insert_quota(vpc(), 70.0).await;
        client
            .set_status_script(vec![RequestStatus::CaseOpened, RequestStatus::Approved])
            .await;

        let poller = poller(&client);
        let request = poller.submit(&vpc(), 75.0).await.unwrap();
        let outcome = poller
            .wait_for_terminal(&request, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            PollOutcome::Approved {
                request_id: request.id.clone(),
                final_value: 75.0
            }
        );
        assert_eq!(client.status_check_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_is_rejected() {
        let client = Arc::new(InMemoryQuotaClient::new());
        client.insert_quota(vpc(), 70.0).await;
        client.set_status_script(vec![RequestStatus::Denied]).await;

        let poller = poller(&client);
        let request = poller.submit(&vpc(), 75.0).await.unwrap();
        let outcome = poller
            .wait_for_terminal(&request, &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            PollOutcome::Rejected {
                status: RequestStatus::Denied,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_submit_failure_maps_to_submit_failed() {
        let client = Arc::new(InMemoryQuotaClient::new());
        client.insert_quota(vpc(), 70.0).await;
        client
            .fail_next_submit(ClientError::InvalidRequest("bad value".to_string()))
            .await;

        let err = poller(&client).submit(&vpc(), 75.0).await.unwrap_err();
        assert!(matches!(err, DomainError::SubmitFailed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_status_error_propagates() {
        let client = Arc::new(InMemoryQuotaClient::new());
        let request = QuotaChangeRequest::new("missing", vpc(), 75.0);

        let err = poller(&client)
            .wait_for_terminal(&request, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Client(ClientError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_terminal_request_settles_without_polling() {
        let client = Arc::new(InMemoryQuotaClient::new());
        let request =
            QuotaChangeRequest::new("done", vpc(), 90.0).with_status(RequestStatus::Approved);

        let outcome = poller(&client)
            .wait_for_terminal(&request, &CancellationToken::new())
            .await
            .unwrap();
        assert!(matches!(outcome, PollOutcome::Approved { final_value, .. } if final_value == 90.0));
        assert_eq!(client.status_check_count(), 0);
    }
}
