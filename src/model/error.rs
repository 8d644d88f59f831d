use thiserror::Error;
use uuid::Uuid;

use crate::model::ResourceType;

pub type DatabaseResult<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("sqlx migrate error: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),
    #[error("sqlx error: {0}")]
    SqlxError(#[from] sqlx::Error),
    #[error("json error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("access to this resource is forbidden")]
    Forbidden,
    #[error("{resource_type:?} {id} referenced by `{field}` does not exist")]
    MissingReference {
        resource_type: ResourceType,
        field: &'static str,
        id: Uuid,
    },
    #[error("{0:?} with this name already exists")]
    AlreadyExists(ResourceType),
    #[error("unknown username `{0}`")]
    UnknownUsername(String),
    #[error("assessment {0} may not be submitted more than once")]
    AlreadySubmitted(Uuid),
    #[error("student {student} is not enrolled in course {course}")]
    NotEnrolled { student: Uuid, course: Uuid },
}
