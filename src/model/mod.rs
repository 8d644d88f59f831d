mod access;
pub use access::{HasOwner, check_access, require_course_owner, scoped_page};

mod database;
pub use database::DbConnection;

pub mod entity;

mod error;
pub use error::{DatabaseError, DatabaseResult};

mod ordering;
pub use ordering::{OrderBy, OrderField};

mod repo;
pub use repo::{CrudRepository, NoFilter, Page, PaginatableRepository, ResourceType, ResourceTyped};

pub mod seed;

pub mod submission;

use sqlx::PgPool;

#[derive(Debug, Clone)]
pub struct ModelManager {
    database: DbConnection,
}

impl ModelManager {
    pub fn new(conn: DbConnection) -> Self {
        Self { database: conn }
    }

    pub fn executor(&self) -> &PgPool {
        self.database.pool()
    }
}
