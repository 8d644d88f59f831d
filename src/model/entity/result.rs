use crate::impl_paginatable_for;
use crate::model::repo::ResourceTyped;
use crate::model::submission::submission_allowed;
use crate::model::{
    DatabaseError, ModelManager, OrderBy, OrderField, ResourceType, error::DatabaseResult,
    repo::CrudRepository,
};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder, prelude::FromRow};
use uuid::Uuid;

/// A student's submission of an assessment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct AssessmentResult {
    id: Uuid,
    assessment_id: Uuid,
    student_id: Uuid,
    score: Option<f64>,
    submitted: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AssessmentResultCreate {
    pub assessment_id: Uuid,
    pub student_id: Uuid,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultOrder {
    AssessmentTitle,
    Submitted,
}

impl OrderField for ResultOrder {
    const FIELDS: &'static [(&'static str, Self)] = &[
        ("assessment__title", Self::AssessmentTitle),
        ("submitted", Self::Submitted),
    ];

    fn column(self) -> &'static str {
        match self {
            Self::AssessmentTitle => "a.title",
            Self::Submitted => "r.submitted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResultFilter {
    pub student: Option<Uuid>,
    pub course: Option<Uuid>,
    pub ordering: OrderBy<ResultOrder>,
}

impl Default for ResultFilter {
    fn default() -> Self {
        Self {
            student: None,
            course: None,
            ordering: OrderBy::desc(ResultOrder::Submitted),
        }
    }
}

impl ResourceTyped for AssessmentResult {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Result
    }
}

impl AssessmentResult {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn assessment_id(&self) -> Uuid {
        self.assessment_id
    }

    pub fn student_id(&self) -> Uuid {
        self.student_id
    }

    pub fn score(&self) -> Option<f64> {
        self.score
    }

    pub fn submitted(&self) -> DateTime<Utc> {
        self.submitted
    }
}

fn push_scoped(
    builder: &mut QueryBuilder<'_, Postgres>,
    actor: &AuthenticatedUser,
    filter: &ResultFilter,
) {
    builder
        .push(
            " FROM results r \
             JOIN assessments a ON a.id = r.assessment_id \
             JOIN course_professors cp ON cp.course_id = a.course_id AND cp.user_id = ",
        )
        .push_bind(actor.user_id())
        .push(" WHERE TRUE");

    if let Some(student) = filter.student {
        builder.push(" AND r.student_id = ").push_bind(student);
    }
    if let Some(course) = filter.course {
        builder.push(" AND a.course_id = ").push_bind(course);
    }
}

const RESULT_COLUMNS: &str = "SELECT r.id, r.assessment_id, r.student_id, r.score, r.submitted";

impl AssessmentResult {
    /// Records a submission, enforcing the one-submission rule.
    ///
    /// The assessment row is locked for the duration of the transaction so
    /// concurrent submissions for the same assessment are checked one at a
    /// time.
    #[tracing::instrument(skip(mm), fields(assessment = %data.assessment_id))]
    pub async fn submit(mm: &ModelManager, data: AssessmentResultCreate) -> DatabaseResult<Self> {
        let mut tx = mm.executor().begin().await?;

        let assessment: Option<(Uuid, bool)> = sqlx::query_as(
            "SELECT course_id, submit_multiple FROM assessments WHERE id = $1 FOR UPDATE",
        )
        .bind(data.assessment_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((course_id, submit_multiple)) = assessment else {
            return Err(DatabaseError::MissingReference {
                resource_type: ResourceType::Assessment,
                field: "assessment",
                id: data.assessment_id,
            });
        };

        let student_course: Option<Uuid> =
            sqlx::query_scalar("SELECT course_id FROM students WHERE id = $1")
                .bind(data.student_id)
                .fetch_optional(&mut *tx)
                .await?;

        match student_course {
            None => {
                return Err(DatabaseError::MissingReference {
                    resource_type: ResourceType::Student,
                    field: "student",
                    id: data.student_id,
                });
            }
            Some(enrolled) if enrolled != course_id => {
                return Err(DatabaseError::NotEnrolled {
                    student: data.student_id,
                    course: course_id,
                });
            }
            Some(_) => {}
        }

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM results WHERE assessment_id = $1")
            .bind(data.assessment_id)
            .fetch_one(&mut *tx)
            .await?;

        if !submission_allowed(submit_multiple, existing) {
            tracing::info!(existing, "rejecting repeated submission");
            return Err(DatabaseError::AlreadySubmitted(data.assessment_id));
        }

        let row = sqlx::query_as(
            r#"
            INSERT INTO results (id, assessment_id, student_id, score, submitted)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING id, assessment_id, student_id, score, submitted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.assessment_id)
        .bind(data.student_id)
        .bind(data.score)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }
}

#[async_trait]
impl CrudRepository<AssessmentResult, AssessmentResultCreate, uuid::Uuid, ResultFilter>
    for AssessmentResult
{
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AssessmentResultCreate,
    ) -> DatabaseResult<Self> {
        Self::submit(mm, data).await
    }

    /// Moves the result to another student or rescores it. The assessment is
    /// fixed once submitted.
    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: AssessmentResultCreate,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE results SET student_id = $1, score = $2 WHERE id = $3")
            .bind(data.student_id)
            .bind(data.score)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.student_id = data.student_id;
        self.score = data.score;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM results WHERE id = $1")
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
        let mut builder = QueryBuilder::new(RESULT_COLUMNS);
        push_scoped(&mut builder, actor, &ResultFilter::default());
        builder.push(" AND r.id = ").push_bind(id);

        let result = builder
            .build_query_as::<AssessmentResult>()
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        filter: &ResultFilter,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let mut builder = QueryBuilder::new(RESULT_COLUMNS);
        push_scoped(&mut builder, actor, filter);
        builder
            .push(" ORDER BY ")
            .push(filter.ordering.to_sql())
            .push(", r.id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let result = builder
            .build_query_as::<AssessmentResult>()
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        filter: &ResultFilter,
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

impl_paginatable_for!(AssessmentResult, AssessmentResultCreate, Uuid, ResultFilter);
