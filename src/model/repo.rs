use serde::{Deserialize, Serialize};

use crate::{
    model::{ModelManager, error::DatabaseResult},
    web::AuthenticatedUser,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    User,
    Group,
    Course,
    Assessment,
    Result,
    Student,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, limit: i64, offset: i64) -> Self {
        Self {
            items,
            total,
            limit,
            offset,
        }
    }

    pub fn empty(limit: i64, offset: i64) -> Self {
        Self::new(Vec::new(), 0, limit, offset)
    }
}

pub trait ResourceTyped {
    fn get_resource_type() -> ResourceType;
}

/// Filter for resources that are listed without any query parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFilter;

/// Every read goes through `actor`: repositories of professor-owned resources
/// only ever return rows reachable from the actor's courses.
#[async_trait::async_trait]
pub trait CrudRepository<T, CreateUpdate, V, F = NoFilter>
where
    T: ResourceTyped,
    V: Clone + Copy,
    F: Send + Sync,
{
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CreateUpdate,
    ) -> DatabaseResult<T>;
    async fn update(
        self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CreateUpdate,
    ) -> DatabaseResult<T>
    where
        Self: Sized;

    async fn delete(self, mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<()>
    where
        Self: Sized;

    async fn find_by_id(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        id: V,
    ) -> DatabaseResult<Option<T>>;
    async fn list(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        filter: &F,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<T>>;
    async fn count(mm: &ModelManager, actor: &AuthenticatedUser, filter: &F)
    -> DatabaseResult<i64>;
}

#[async_trait::async_trait]
pub trait PaginatableRepository<T, CreateUpdate, V, F = NoFilter>
where
    T: ResourceTyped + CrudRepository<T, CreateUpdate, V, F>,
    V: Clone + Copy,
    F: Send + Sync,
{
    async fn page(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        filter: &F,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Page<T>>;
}

#[macro_export]
macro_rules! impl_paginatable_for {
    ($ent:ident, $ent_create:ident, $ent_id:ident) => {
        $crate::impl_paginatable_for!($ent, $ent_create, $ent_id, $crate::model::NoFilter);
    };
    ($ent:ident, $ent_create:ident, $ent_id:ident, $filter:ty) => {
        #[async_trait::async_trait]
        impl $crate::model::PaginatableRepository<$ent, $ent_create, $ent_id, $filter> for $ent {
            async fn page(
                mm: &$crate::model::ModelManager,
                actor: &$crate::web::AuthenticatedUser,
                filter: &$filter,
                limit: i64,
                offset: i64,
            ) -> $crate::model::DatabaseResult<$crate::model::Page<$ent>> {
                let items = <$ent as $crate::model::CrudRepository<
                    $ent,
                    $ent_create,
                    $ent_id,
                    $filter,
                >>::list(mm, actor, filter, limit, offset)
                .await?;
                let count = <$ent as $crate::model::CrudRepository<
                    $ent,
                    $ent_create,
                    $ent_id,
                    $filter,
                >>::count(mm, actor, filter)
                .await?;
                Ok($crate::model::Page::new(items, count, limit, offset))
            }
        }
    };
}
