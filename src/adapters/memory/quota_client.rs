//! Scripted in-memory quota service.
//!
//! Increase requests move through a status script: every status check pops
//! the next status. An approved request raises the quota to the requested
//! value, as the real service does. Errors can be queued per operation and
//! every call is counted so tests can assert on mutate traffic.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::domain::models::{
    ObservedQuota, QuotaChangeRequest, QuotaIdentity, RequestStatus, ServiceDescriptor,
};
use crate::domain::ports::{ClientError, QuotaServiceClient};

struct ScriptedRequest {
    request: QuotaChangeRequest,
    script: VecDeque<RequestStatus>,
}

#[derive(Default)]
struct CallCounters {
    list_services: AtomicUsize,
    get_quota: AtomicUsize,
    get_default_quota: AtomicUsize,
    request_increase: AtomicUsize,
    get_change_request: AtomicUsize,
    list_open_requests: AtomicUsize,
}

#[derive(Default)]
struct InjectedErrors {
    list_services: Option<ClientError>,
    read: VecDeque<ClientError>,
    submit: Option<ClientError>,
    status: VecDeque<ClientError>,
}

/// In-memory [`QuotaServiceClient`] for tests.
pub struct InMemoryQuotaClient {
    services: Arc<RwLock<Vec<ServiceDescriptor>>>,
    quotas: Arc<RwLock<HashMap<QuotaIdentity, ObservedQuota>>>,
    defaults: Arc<RwLock<HashMap<QuotaIdentity, ObservedQuota>>>,
    requests: Arc<RwLock<HashMap<String, ScriptedRequest>>>,
    status_script: Arc<RwLock<Vec<RequestStatus>>>,
    errors: Arc<Mutex<InjectedErrors>>,
    calls: CallCounters,
}

impl InMemoryQuotaClient {
    pub fn new() -> Self {
        Self {
            services: Arc::new(RwLock::new(Vec::new())),
            quotas: Arc::new(RwLock::new(HashMap::new())),
            defaults: Arc::new(RwLock::new(HashMap::new())),
            requests: Arc::new(RwLock::new(HashMap::new())),
            status_script: Arc::new(RwLock::new(Vec::new())),
            errors: Arc::new(Mutex::new(InjectedErrors::default())),
            calls: CallCounters::default(),
        }
    }

    pub async fn insert_service(&self, service_code: &str, service_name: &str) {
        self.services.write().await.push(ServiceDescriptor {
            service_code: service_code.to_string(),
            service_name: service_name.to_string(),
        });
    }

    /// Set the account-applied value of a quota.
    pub async fn insert_quota(&self, identity: QuotaIdentity, value: f64) {
        self.quotas
            .write()
            .await
            .insert(identity.clone(), ObservedQuota::new(identity, value));
    }

    /// Set the service default of a quota.
    pub async fn insert_default(&self, identity: QuotaIdentity, value: f64) {
        self.defaults
            .write()
            .await
            .insert(identity.clone(), ObservedQuota::new(identity, value));
    }

    /// Statuses that newly submitted requests will report, one per check.
    /// Once the script runs out the request keeps its last status.
    pub async fn set_status_script(&self, script: Vec<RequestStatus>) {
        *self.status_script.write().await = script;
    }

    /// Register a request submitted outside this engine. Returns its id.
    pub async fn insert_open_request(
        &self,
        identity: QuotaIdentity,
        value: f64,
        script: Vec<RequestStatus>,
    ) -> String {
        let request = QuotaChangeRequest::new(Uuid::new_v4().to_string(), identity, value)
            .with_status(RequestStatus::CaseOpened);
        let id = request.id.clone();
        self.requests.write().await.insert(
            id.clone(),
            ScriptedRequest {
                request,
                script: script.into(),
            },
        );
        id
    }

    /// Replace the remaining status script of an existing request.
    pub async fn set_request_script(&self, request_id: &str, script: Vec<RequestStatus>) -> bool {
        match self.requests.write().await.get_mut(request_id) {
            Some(scripted) => {
                scripted.script = script.into();
                true
            }
            None => false,
        }
    }

    pub async fn fail_list_services(&self, error: ClientError) {
        self.errors.lock().await.list_services = Some(error);
    }

    /// Fail the next quota read.
    pub async fn fail_next_read(&self, error: ClientError) {
        self.errors.lock().await.read.push_back(error);
    }

    pub async fn fail_next_submit(&self, error: ClientError) {
        self.errors.lock().await.submit = Some(error);
    }

    /// Fail the next `count` status checks.
    pub async fn fail_next_status_checks(&self, count: usize, error: ClientError) {
        let mut errors = self.errors.lock().await;
        for _ in 0..count {
            errors.status.push_back(error.clone());
        }
    }

    /// Current state of a request without consuming its script.
    pub async fn request(&self, request_id: &str) -> Option<QuotaChangeRequest> {
        self.requests
            .read()
            .await
            .get(request_id)
            .map(|scripted| scripted.request.clone())
    }

    pub async fn current_value(&self, identity: &QuotaIdentity) -> Option<f64> {
        self.quotas.read().await.get(identity).map(|q| q.value)
    }

    pub fn probe_count(&self) -> usize {
        self.calls.list_services.load(Ordering::SeqCst)
    }

    pub fn read_count(&self) -> usize {
        self.calls.get_quota.load(Ordering::SeqCst)
    }

    pub fn default_read_count(&self) -> usize {
        self.calls.get_default_quota.load(Ordering::SeqCst)
    }

    /// Number of `request_increase` calls, the only mutating operation.
    pub fn submit_count(&self) -> usize {
        self.calls.request_increase.load(Ordering::SeqCst)
    }

    pub fn status_check_count(&self) -> usize {
        self.calls.get_change_request.load(Ordering::SeqCst)
    }

    pub fn open_request_lookup_count(&self) -> usize {
        self.calls.list_open_requests.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryQuotaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuotaServiceClient for InMemoryQuotaClient {
    async fn list_services(&self) -> Result<Vec<ServiceDescriptor>, ClientError> {
        self.calls.list_services.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.errors.lock().await.list_services.clone() {
            return Err(err);
        }
        Ok(self.services.read().await.clone())
    }

    async fn get_quota(&self, identity: &QuotaIdentity) -> Result<ObservedQuota, ClientError> {
        self.calls.get_quota.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.errors.lock().await.read.pop_front() {
            return Err(err);
        }
        self.quotas
            .read()
            .await
            .get(identity)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("no applied value for {identity}")))
    }

    async fn get_default_quota(
        &self,
        identity: &QuotaIdentity,
    ) -> Result<ObservedQuota, ClientError> {
        self.calls.get_default_quota.fetch_add(1, Ordering::SeqCst);
        self.defaults
            .read()
            .await
            .get(identity)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("no such quota {identity}")))
    }

    async fn request_increase(
        &self,
        identity: &QuotaIdentity,
        value: f64,
    ) -> Result<QuotaChangeRequest, ClientError> {
        self.calls.request_increase.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.errors.lock().await.submit.take() {
            return Err(err);
        }

        let current = match self.quotas.read().await.get(identity) {
            Some(quota) => quota.value,
            None => self
                .defaults
                .read()
                .await
                .get(identity)
                .map(|q| q.value)
                .ok_or_else(|| ClientError::NotFound(format!("no such quota {identity}")))?,
        };
        if value <= current {
            return Err(ClientError::InvalidRequest(format!(
                "requested value {value} must exceed current value {current}"
            )));
        }

        let request = QuotaChangeRequest::new(Uuid::new_v4().to_string(), identity.clone(), value);
        let script = self.status_script.read().await.clone();
        self.requests.write().await.insert(
            request.id.clone(),
            ScriptedRequest {
                request: request.clone(),
                script: script.into(),
            },
        );
        Ok(request)
    }

    async fn get_change_request(
        &self,
        request_id: &str,
    ) -> Result<QuotaChangeRequest, ClientError> {
        self.calls.get_change_request.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.errors.lock().await.status.pop_front() {
            return Err(err);
        }

        let mut requests = self.requests.write().await;
        let scripted = requests
            .get_mut(request_id)
            .ok_or_else(|| ClientError::NotFound(format!("no such request {request_id}")))?;

        if let Some(next) = scripted.script.pop_front() {
            scripted.request.status = next;
            if next.is_success() {
                let identity = scripted.request.identity.clone();
                let value = scripted.request.desired_value;
                self.quotas
                    .write()
                    .await
                    .entry(identity.clone())
                    .and_modify(|q| q.value = value)
                    .or_insert_with(|| ObservedQuota::new(identity, value));
            }
        }
        Ok(scripted.request.clone())
    }

    async fn list_open_requests(
        &self,
        identity: &QuotaIdentity,
    ) -> Result<Vec<QuotaChangeRequest>, ClientError> {
        self.calls.list_open_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .requests
            .read()
            .await
            .values()
            .filter(|scripted| &scripted.request.identity == identity && scripted.request.is_open())
            .map(|scripted| scripted.request.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vpc() -> QuotaIdentity {
        QuotaIdentity::new("vpc", "L-F678F1CE").unwrap()
    }

    #[tokio::test]
    async fn test_approval_raises_quota() {
        let client = InMemoryQuotaClient::new();
        client.insert_quota(vpc(), 70.0).await;
        client.set_status_script(vec![RequestStatus::Approved]).await;

        let request = client.request_increase(&vpc(), 75.0).await.unwrap();
        assert_eq!(request.status, RequestStatus::Pending);

        let polled = client.get_change_request(&request.id).await.unwrap();
        assert_eq!(polled.status, RequestStatus::Approved);
        assert_eq!(client.current_value(&vpc()).await, Some(75.0));
    }

    #[tokio::test]
    async fn test_status_holds_after_script_ends() {
        let client = InMemoryQuotaClient::new();
        client.insert_quota(vpc(), 70.0).await;
        client.set_status_script(vec![RequestStatus::CaseOpened]).await;

        let request = client.request_increase(&vpc(), 75.0).await.unwrap();
        client.get_change_request(&request.id).await.unwrap();
        let polled = client.get_change_request(&request.id).await.unwrap();
        assert_eq!(polled.status, RequestStatus::CaseOpened);
        assert_eq!(client.current_value(&vpc()).await, Some(70.0));
    }

    #[tokio::test]
    async fn test_submit_below_current_is_invalid() {
        let client = InMemoryQuotaClient::new();
        client.insert_quota(vpc(), 80.0).await;

        let err = client.request_increase(&vpc(), 75.0).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_open_requests_filtered_by_identity() {
        let client = InMemoryQuotaClient::new();
        let other = QuotaIdentity::new("ec2", "L-1216C47A").unwrap();
        client.insert_open_request(vpc(), 90.0, vec![]).await;
        client.insert_open_request(other, 10.0, vec![]).await;

        let open = client.list_open_requests(&vpc()).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].identity, vpc());
    }
}
