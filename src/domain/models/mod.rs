pub mod change_request;
pub mod config;
pub mod identity;
pub mod manifest;
pub mod phase;
pub mod quota;
pub mod record;

pub use change_request::{QuotaChangeRequest, RequestStatus};
pub use config::{
    ClientConfig, Config, DatabaseConfig, LoggingConfig, PollerConfig, ReconcileConfig,
};
pub use identity::{QuotaIdentity, IDENTITY_SEPARATOR};
pub use manifest::{Manifest, QuotaDeclaration};
pub use phase::ReconcilePhase;
pub use quota::{DesiredQuota, ObservedQuota, ServiceDescriptor};
pub use record::{PendingRequest, ResourceRecord};
