use crate::impl_paginatable_for;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder, prelude::FromRow};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Student {
    id: Uuid,
    course_id: Uuid,
    name: String,
    email: String,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct StudentCreate {
    pub course_id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub email: Option<String>,
}

impl ResourceTyped for Student {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Student
    }
}

impl Student {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

fn push_scoped(
    builder: &mut QueryBuilder<'_, Postgres>,
    actor: &AuthenticatedUser,
    filter: &StudentFilter,
) {
    builder
        .push(" FROM students s JOIN course_professors cp ON cp.course_id = s.course_id AND cp.user_id = ")
        .push_bind(actor.user_id())
        .push(" WHERE TRUE");

    if let Some(email) = &filter.email {
        builder.push(" AND s.email = ").push_bind(email.clone());
    }
}

#[async_trait]
impl CrudRepository<Student, StudentCreate, uuid::Uuid, StudentFilter> for Student {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: StudentCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO students (id, course_id, name, email)
            VALUES ($1,$2,$3,$4)
            RETURNING id, course_id, name, email
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
        .bind(&data.name)
        .bind(&data.email)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: StudentCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE students SET course_id = $1, name = $2, email = $3 WHERE id = $4")
            .bind(data.course_id)
            .bind(&data.name)
            .bind(&data.email)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.course_id = data.course_id;
        self.name = data.name;
        self.email = data.email;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let mut builder = QueryBuilder::new("SELECT s.id, s.course_id, s.name, s.email");
        push_scoped(&mut builder, actor, &StudentFilter::default());
        builder.push(" AND s.id = ").push_bind(id);

        let result = builder
            .build_query_as::<Student>()
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        filter: &StudentFilter,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let mut builder = QueryBuilder::new("SELECT s.id, s.course_id, s.name, s.email");
        push_scoped(&mut builder, actor, filter);
        builder
            .push(" ORDER BY s.name, s.id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let result = builder
            .build_query_as::<Student>()
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        filter: &StudentFilter,
    ) -> DatabaseResult<i64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*)");
        push_scoped(&mut builder, actor, filter);

        let result = builder
            .build_query_scalar::<i64>()
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Student, StudentCreate, Uuid, StudentFilter);
