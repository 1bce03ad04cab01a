//! Reconciliation services.

pub mod comparator;
pub mod controller;
pub mod poller;
pub mod probe;
pub mod runner;

pub use comparator::{diff, ChangeDirection, ChangeSet};
pub use controller::{ConvergeAction, Convergence, ConvergenceController, RefreshedQuota};
pub use poller::{IncreasePoller, PollOutcome, PollPolicy};
pub use probe::CapabilityProbe;
pub use runner::{ReconcileRunner, ResourceResult, RunReport};
