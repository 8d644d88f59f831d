use crate::impl_paginatable_for;
use crate::model::repo::ResourceTyped;
use crate::model::{
    ModelManager, OrderBy, OrderField, error::DatabaseResult, repo::CrudRepository,
};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder, prelude::FromRow};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Course {
    id: Uuid,
    name: String,
    professors: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CourseCreate {
    pub name: String,
    pub professors: Vec<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseOrder {
    Name,
}

impl OrderField for CourseOrder {
    const FIELDS: &'static [(&'static str, Self)] = &[("name", Self::Name)];

    fn column(self) -> &'static str {
        match self {
            Self::Name => "c.name",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CourseFilter {
    pub ordering: OrderBy<CourseOrder>,
}

impl Default for CourseFilter {
    fn default() -> Self {
        Self {
            ordering: OrderBy::asc(CourseOrder::Name),
        }
    }
}

impl ResourceTyped for Course {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Course
    }
}

impl Course {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn professors(&self) -> &[Uuid] {
        &self.professors
    }
}

const SELECT_COURSE: &str = r#"
    SELECT
        c.id,
        c.name,
        COALESCE(
            array_agg(cp.user_id ORDER BY cp.user_id) FILTER (WHERE cp.user_id IS NOT NULL),
            '{}'
        ) AS professors
    FROM courses c
    LEFT JOIN course_professors cp ON cp.course_id = c.id
"#;

/// Restricts `c` to courses the actor teaches.
fn push_scope(builder: &mut QueryBuilder<'_, Postgres>, actor: &AuthenticatedUser) {
    builder
        .push(" WHERE c.id IN (SELECT course_id FROM course_professors WHERE user_id = ")
        .push_bind(actor.user_id())
        .push(")");
}

async fn replace_professors(
    tx: &mut sqlx::PgConnection,
    course_id: Uuid,
    professors: &[Uuid],
) -> DatabaseResult<()> {
    sqlx::query("DELETE FROM course_professors WHERE course_id = $1")
        .bind(course_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO course_professors (course_id, user_id) SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
    )
    .bind(course_id)
    .bind(professors)
    .execute(&mut *tx)
    .await?;

    Ok(())
}

fn normalized(mut professors: Vec<Uuid>) -> Vec<Uuid> {
    professors.sort();
    professors.dedup();
    professors
}

#[async_trait]
impl CrudRepository<Course, CourseCreate, uuid::Uuid, CourseFilter> for Course {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        let mut tx = mm.executor().begin().await?;
        let id = Uuid::new_v4();

        sqlx::query("INSERT INTO courses (id, name) VALUES ($1, $2)")
            .bind(id)
            .bind(&data.name)
            .execute(&mut *tx)
            .await?;
        replace_professors(&mut *tx, id, &data.professors).await?;
        tx.commit().await?;

        Ok(Course {
            id,
            name: data.name,
            professors: normalized(data.professors),
        })
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        let mut tx = mm.executor().begin().await?;

        sqlx::query("UPDATE courses SET name = $1 WHERE id = $2")
            .bind(&data.name)
            .bind(self.id)
            .execute(&mut *tx)
            .await?;
        replace_professors(&mut *tx, self.id, &data.professors).await?;
        tx.commit().await?;

        self.name = data.name;
        self.professors = normalized(data.professors);
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM courses WHERE id = $1")
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
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_COURSE);
        push_scope(&mut builder, actor);
        builder.push(" AND c.id = ").push_bind(id).push(" GROUP BY c.id");

        let result = builder
            .build_query_as::<Course>()
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        filter: &CourseFilter,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_COURSE);
        push_scope(&mut builder, actor);
        builder
            .push(" GROUP BY c.id ORDER BY ")
            .push(filter.ordering.to_sql())
            .push(", c.id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let result = builder
            .build_query_as::<Course>()
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        _filter: &CourseFilter,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT course_id) FROM course_professors WHERE user_id = $1",
        )
        .bind(actor.user_id())
        .fetch_one(mm.executor())
        .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Course, CourseCreate, Uuid, CourseFilter);
