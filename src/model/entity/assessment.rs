use crate::impl_paginatable_for;
use crate::model::repo::ResourceTyped;
use crate::model::{
    ModelManager, OrderBy, OrderField, error::DatabaseResult, repo::CrudRepository,
};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder, prelude::FromRow};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Assessment {
    id: Uuid,
    course_id: Uuid,
    title: String,
    date: NaiveDate,
    submit_multiple: bool,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AssessmentCreate {
    pub course_id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub submit_multiple: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentOrder {
    Date,
}

impl OrderField for AssessmentOrder {
    const FIELDS: &'static [(&'static str, Self)] = &[("date", Self::Date)];

    fn column(self) -> &'static str {
        match self {
            Self::Date => "a.date",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssessmentFilter {
    pub course: Option<Uuid>,
    pub ordering: OrderBy<AssessmentOrder>,
}

impl Default for AssessmentFilter {
    fn default() -> Self {
        Self {
            course: None,
            ordering: OrderBy::asc(AssessmentOrder::Date),
        }
    }
}

impl ResourceTyped for Assessment {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Assessment
    }
}

impl Assessment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn submit_multiple(&self) -> bool {
        self.submit_multiple
    }
}

/// Joins `a` to the actor's courses.
fn push_scoped_select(builder: &mut QueryBuilder<'_, Postgres>, actor: &AuthenticatedUser) {
    builder
        .push(
            "SELECT a.id, a.course_id, a.title, a.date, a.submit_multiple \
             FROM assessments a \
             JOIN course_professors cp ON cp.course_id = a.course_id AND cp.user_id = ",
        )
        .push_bind(actor.user_id());
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &AssessmentFilter) {
    builder.push(" WHERE TRUE");
    if let Some(course) = filter.course {
        builder.push(" AND a.course_id = ").push_bind(course);
    }
}

#[async_trait]
impl CrudRepository<Assessment, AssessmentCreate, uuid::Uuid, AssessmentFilter> for Assessment {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AssessmentCreate,
    ) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            r#"
            INSERT INTO assessments (id, course_id, title, date, submit_multiple)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING id, course_id, title, date, submit_multiple
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
        .bind(&data.title)
        .bind(data.date)
        .bind(data.submit_multiple)
        .fetch_one(mm.executor())
        .await?;

        Ok(row)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AssessmentCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query(
            "UPDATE assessments SET course_id = $1, title = $2, date = $3, submit_multiple = $4 WHERE id = $5",
        )
        .bind(data.course_id)
        .bind(&data.title)
        .bind(data.date)
        .bind(data.submit_multiple)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.course_id = data.course_id;
        self.title = data.title;
        self.date = data.date;
        self.submit_multiple = data.submit_multiple;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM assessments WHERE id = $1")
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
        let mut builder = QueryBuilder::new("");
        push_scoped_select(&mut builder, actor);
        builder.push(" WHERE a.id = ").push_bind(id);

        let result = builder
            .build_query_as::<Assessment>()
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        filter: &AssessmentFilter,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let mut builder = QueryBuilder::new("");
        push_scoped_select(&mut builder, actor);
        push_filter(&mut builder, filter);
        builder
            .push(" ORDER BY ")
            .push(filter.ordering.to_sql())
            .push(", a.id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let result = builder
            .build_query_as::<Assessment>()
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        filter: &AssessmentFilter,
    ) -> DatabaseResult<i64> {
        let mut builder = QueryBuilder::new(
            "SELECT COUNT(*) FROM assessments a \
             JOIN course_professors cp ON cp.course_id = a.course_id AND cp.user_id = ",
        );
        builder.push_bind(actor.user_id());
        push_filter(&mut builder, filter);

        let result = builder
            .build_query_scalar::<i64>()
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Assessment, AssessmentCreate, Uuid, AssessmentFilter);
