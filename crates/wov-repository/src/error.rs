use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("entity {0} not found")]
    EntityNotFound(wov_core::EntityId),

    #[error("prototype chain from entity {0} did not terminate within 64 hops")]
    PrototypeCycle(wov_core::EntityId),

    #[error("verb {name} already exists on entity {entity}")]
    VerbAlreadyExists { entity: wov_core::EntityId, name: String },

    #[error(transparent)]
    Storage(#[from] wov_storage::StorageError),

    #[error("database error: {0}")]
    Database(String),
}

pub type RepoResult<T> = std::result::Result<T, RepoError>;

impl From<surrealdb::Error> for RepoError {
    fn from(e: surrealdb::Error) -> Self {
        RepoError::Database(e.to_string())
    }
}

impl From<RepoError> for wov_core::WovError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::EntityNotFound(id) => {
                wov_core::WovError::InvalidRequest(format!("entity {id} not found"))
            },
            other => wov_core::WovError::Internal(other.to_string()),
        }
    }
}
