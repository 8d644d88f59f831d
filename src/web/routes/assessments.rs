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
        CrudRepository, PaginatableRepository, ResourceTyped,
        entity::{Assessment, AssessmentCreate, AssessmentFilter},
        require_course_owner, scoped_page,
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
pub struct AssessmentListQuery {
    /// Only assessments of this course
    pub course: Option<Uuid>,
    /// `date` or `-date`
    pub ordering: Option<String>,
}

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route(
            "/",
            get(assessments_list_handler).post(assessments_create_handler),
        )
        .route(
            "/{id}",
            get(assessments_get_handler)
                .put(assessments_update_handler)
                .delete(assessments_delete_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/assessments",
    description = "Assessments of the caller's courses. Anonymous callers get an empty page.",
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<Assessment>),
        (status = 400, description = "Unknown ordering field", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "assessments"
)]
async fn assessments_list_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    Query(query): Query<AssessmentListQuery>,
) -> WebResult<impl IntoResponse> {
    let filter = AssessmentFilter {
        course: query.course,
        ordering: parse_ordering(
            query.ordering.as_deref(),
            AssessmentFilter::default().ordering,
        )?,
    };
    let (limit, offset) = (page.limit(), page.offset());
    let mm = state.pool();

    let assessments = scoped_page(&ctx, limit, offset, |user| async move {
        Assessment::page(mm, &user, &filter, limit, offset).await
    })
    .await
    .map_err(|e| WebError::database(Assessment::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(assessments)))
}

#[utoipa::path(
    post,
    path = "/api/v1/assessments",
    request_body = AssessmentCreate,
    description = "Adds an assessment to one of the caller's courses",
    responses(
        (status = 201, description = "Assessment created", body = Assessment),
        (status = 400, description = "Course does not exist", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You don't teach this course", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "assessments"
)]
async fn assessments_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(body): Json<AssessmentCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    require_course_owner(state.pool(), user, body.course_id, "course_id")
        .await
        .map_err(|e| WebError::database(Assessment::get_resource_type(), e))?;

    let assessment = Assessment::create(state.pool(), user, body)
        .await
        .map_err(|e| WebError::database(Assessment::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(assessment)))
}

#[utoipa::path(
    get,
    path = "/api/v1/assessments/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the assessment to get")
    ),
    responses(
        (status = 200, description = "Assessment found", body = Assessment),
        (status = 404, description = "Assessment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "assessments"
)]
async fn assessments_get_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.viewer(Assessment::get_resource_type())?;
    let assessment = Assessment::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::database(Assessment::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(require_found(assessment)?)))
}

#[utoipa::path(
    put,
    path = "/api/v1/assessments/{id}",
    request_body = AssessmentCreate,
    params(
        ("id" = Uuid, Path, description = "ID of the assessment to update")
    ),
    responses(
        (status = 200, description = "Assessment updated", body = Assessment),
        (status = 400, description = "Course does not exist", body = ErrorResponse),
        (status = 403, description = "You don't teach the target course", body = ErrorResponse),
        (status = 404, description = "Assessment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "assessments"
)]
async fn assessments_update_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(body): Json<AssessmentCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.viewer(Assessment::get_resource_type())?;
    let found = Assessment::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::database(Assessment::get_resource_type(), e))?;
    let found = require_found(found)?;

    if found.course_id() != body.course_id {
        require_course_owner(state.pool(), user, body.course_id, "course_id")
            .await
            .map_err(|e| WebError::database(Assessment::get_resource_type(), e))?;
    }

    let updated = found
        .update(state.pool(), user, body)
        .await
        .map_err(|e| WebError::database(Assessment::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/assessments/{id}",
    description = "Deletes the assessment and every result submitted for it",
    params(
        ("id" = Uuid, Path, description = "ID of the assessment to delete")
    ),
    responses(
        (status = 204, description = "Assessment deleted"),
        (status = 404, description = "Assessment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "assessments"
)]
async fn assessments_delete_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.viewer(Assessment::get_resource_type())?;
    let found = Assessment::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::database(Assessment::get_resource_type(), e))?;

    require_found(found)?
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::database(Assessment::get_resource_type(), e))?;

    Ok(StatusCode::NO_CONTENT)
}
