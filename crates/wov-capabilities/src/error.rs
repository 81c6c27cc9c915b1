use thiserror::Error;
use wov_core::EntityId;

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("capability denied: requires {required_type}")]
    Denied { required_type: String },

    #[error("capability {0} not found")]
    NotFound(wov_core::CapabilityId),

    #[error("capability {0} is owned by {1}, not {2}")]
    WrongOwner(wov_core::CapabilityId, EntityId, EntityId),

    #[error(transparent)]
    Repo(#[from] wov_repository::RepoError),

    #[error(transparent)]
    Storage(#[from] wov_storage::StorageError),
}

pub type CapabilityResult<T> = std::result::Result<T, CapabilityError>;

impl From<CapabilityError> for wov_core::WovError {
    fn from(e: CapabilityError) -> Self {
        match e {
            CapabilityError::Denied { required_type } => wov_core::WovError::CapabilityDenied { required_type },
            other => wov_core::WovError::Internal(other.to_string()),
        }
    }
}
