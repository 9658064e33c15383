pub mod expiry;
pub mod notify;

pub use expiry::{finish_item, refresh_risk_flags, resolve_expiry, ExpiryResolution};
pub use notify::{GenerationReport, GeneratorConfig, NotificationGenerator};

use cosmet_core::contracts::StatusTransitionError;
use cosmet_storage::StorageError;
use cosmet_taxonomy::TaxonomyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("taxon {0} is not a leaf and cannot be assigned to an item")]
    NotALeaf(i64),
    #[error("item {0} is already finished")]
    AlreadyFinished(i64),
    #[error(transparent)]
    Status(#[from] StatusTransitionError),
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
