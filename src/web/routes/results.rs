use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, DatabaseError, PaginatableRepository, ResourceType, ResourceTyped,
        entity::{Assessment, AssessmentResult, AssessmentResultCreate, ResultFilter, Student},
        scoped_page,
    },
    web::{
        AppState, RequestContext, WebError, WebResult,
        error::ErrorResponse,
        middlewares,
        routes::{PaginationQuery, parse_ordering, require_found},
    },
};

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResultListQuery {
    /// Only results of this student
    pub student: Option<Uuid>,
    /// Only results of assessments in this course
    #[serde(rename = "assessment__course")]
    pub course: Option<Uuid>,
    /// `assessment__title` or `submitted`, prefixed with `-` for descending
    pub ordering: Option<String>,
}

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(results_list_handler).post(results_create_handler))
        .route(
            "/{id}",
            get(results_get_handler)
                .put(results_update_handler)
                .delete(results_delete_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn db_error(e: DatabaseError) -> WebError {
    WebError::database(AssessmentResult::get_resource_type(), e)
}

#[utoipa::path(
    get,
    path = "/api/v1/results",
    description = "Results for assessments in the caller's courses, newest first unless `ordering` says otherwise.",
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<AssessmentResult>),
        (status = 400, description = "Unknown ordering field", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "results"
)]
async fn results_list_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    Query(query): Query<ResultListQuery>,
) -> WebResult<impl IntoResponse> {
    let filter = ResultFilter {
        student: query.student,
        course: query.course,
        ordering: parse_ordering(query.ordering.as_deref(), ResultFilter::default().ordering)?,
    };
    let (limit, offset) = (page.limit(), page.offset());
    let mm = state.pool();

    let results = scoped_page(&ctx, limit, offset, |user| async move {
        AssessmentResult::page(mm, &user, &filter, limit, offset).await
    })
    .await
    .map_err(db_error)?;

    Ok((StatusCode::OK, Json(results)))
}

#[utoipa::path(
    post,
    path = "/api/v1/results",
    request_body = AssessmentResultCreate,
    description = "Submits a result. Open to anyone; an assessment without `submit_multiple` accepts a single result.",
    responses(
        (status = 201, description = "Result recorded", body = AssessmentResult),
        (status = 400, description = "Already submitted, assessment/student does not exist, or student not enrolled in the course", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "results"
)]
async fn results_create_handler(
    State(state): State<AppState>,
    Json(body): Json<AssessmentResultCreate>,
) -> WebResult<impl IntoResponse> {
    let result = AssessmentResult::submit(state.pool(), body)
        .await
        .map_err(db_error)?;

    tracing::info!(
        "result {} submitted for assessment {}",
        result.id(),
        result.assessment_id()
    );
    Ok((StatusCode::CREATED, Json(result)))
}

#[utoipa::path(
    get,
    path = "/api/v1/results/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the result to get")
    ),
    responses(
        (status = 200, description = "Result found", body = AssessmentResult),
        (status = 404, description = "Result not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "results"
)]
async fn results_get_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.viewer(AssessmentResult::get_resource_type())?;
    let result = AssessmentResult::find_by_id(state.pool(), user, id)
        .await
        .map_err(db_error)?;

    Ok((StatusCode::OK, Json(require_found(result)?)))
}

#[utoipa::path(
    put,
    path = "/api/v1/results/{id}",
    request_body = AssessmentResultCreate,
    description = "Changes the student or score of a result. `assessment_id` must stay the same.",
    params(
        ("id" = Uuid, Path, description = "ID of the result to update")
    ),
    responses(
        (status = 200, description = "Result updated", body = AssessmentResult),
        (status = 400, description = "Assessment changed, or student unknown or outside the assessment's course", body = ErrorResponse),
        (status = 404, description = "Result not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "results"
)]
async fn results_update_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(body): Json<AssessmentResultCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.viewer(AssessmentResult::get_resource_type())?;
    let found = AssessmentResult::find_by_id(state.pool(), user, id)
        .await
        .map_err(db_error)?;
    let found = require_found(found)?;

    if found.assessment_id() != body.assessment_id {
        return Err(WebError::immutable_field("assessment_id"));
    }

    if found.student_id() != body.student_id {
        let assessment = Assessment::find_by_id(state.pool(), user, found.assessment_id())
            .await
            .map_err(db_error)?;
        let assessment = require_found(assessment)?;

        // only the caller's own students, and only from the assessment's course
        let student = Student::find_by_id(state.pool(), user, body.student_id)
            .await
            .map_err(db_error)?
            .ok_or_else(|| {
                db_error(DatabaseError::MissingReference {
                    resource_type: ResourceType::Student,
                    field: "student",
                    id: body.student_id,
                })
            })?;
        if student.course_id() != assessment.course_id() {
            return Err(db_error(DatabaseError::NotEnrolled {
                student: student.id(),
                course: assessment.course_id(),
            }));
        }
    }

    let updated = found
        .update(state.pool(), user, body)
        .await
        .map_err(db_error)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/results/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the result to delete")
    ),
    responses(
        (status = 204, description = "Result deleted"),
        (status = 404, description = "Result not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "results"
)]
async fn results_delete_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.viewer(AssessmentResult::get_resource_type())?;
    let found = AssessmentResult::find_by_id(state.pool(), user, id)
        .await
        .map_err(db_error)?;

    require_found(found)?
        .delete(state.pool(), user)
        .await
        .map_err(db_error)?;

    Ok(StatusCode::NO_CONTENT)
}
