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
        entity::{Student, StudentCreate, StudentFilter},
        require_course_owner, scoped_page,
    },
    web::{
        AppState, RequestContext, WebError, WebResult,
        error::ErrorResponse,
        middlewares,
        routes::{PaginationQuery, require_found},
    },
};

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentListQuery {
    /// Exact email match
    pub email: Option<String>,
}

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(students_list_handler).post(students_create_handler))
        .route(
            "/{id}",
            get(students_get_handler)
                .put(students_update_handler)
                .delete(students_delete_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/students",
    description = "Students enrolled in the caller's courses. Anonymous callers get an empty page.",
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<Student>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "students"
)]
async fn students_list_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    Query(query): Query<StudentListQuery>,
) -> WebResult<impl IntoResponse> {
    let filter = StudentFilter { email: query.email };
    let (limit, offset) = (page.limit(), page.offset());
    let mm = state.pool();

    let students = scoped_page(&ctx, limit, offset, |user| async move {
        Student::page(mm, &user, &filter, limit, offset).await
    })
    .await
    .map_err(|e| WebError::database(Student::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(students)))
}

#[utoipa::path(
    post,
    path = "/api/v1/students",
    request_body = StudentCreate,
    description = "Enrolls a student in one of the caller's courses",
    responses(
        (status = 201, description = "Student created", body = Student),
        (status = 400, description = "Course does not exist", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You don't teach this course", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "students"
)]
async fn students_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(body): Json<StudentCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    require_course_owner(state.pool(), user, body.course_id, "course_id")
        .await
        .map_err(|e| WebError::database(Student::get_resource_type(), e))?;

    let student = Student::create(state.pool(), user, body)
        .await
        .map_err(|e| WebError::database(Student::get_resource_type(), e))?;

    Ok((StatusCode::CREATED, Json(student)))
}

#[utoipa::path(
    get,
    path = "/api/v1/students/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the student to get")
    ),
    responses(
        (status = 200, description = "Student found", body = Student),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "students"
)]
async fn students_get_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.viewer(Student::get_resource_type())?;
    let student = Student::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::database(Student::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(require_found(student)?)))
}

#[utoipa::path(
    put,
    path = "/api/v1/students/{id}",
    request_body = StudentCreate,
    params(
        ("id" = Uuid, Path, description = "ID of the student to update")
    ),
    responses(
        (status = 200, description = "Student updated", body = Student),
        (status = 400, description = "Course does not exist", body = ErrorResponse),
        (status = 403, description = "You don't teach the target course", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "students"
)]
async fn students_update_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(body): Json<StudentCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.viewer(Student::get_resource_type())?;
    let found = Student::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::database(Student::get_resource_type(), e))?;
    let found = require_found(found)?;

    if found.course_id() != body.course_id {
        require_course_owner(state.pool(), user, body.course_id, "course_id")
            .await
            .map_err(|e| WebError::database(Student::get_resource_type(), e))?;
    }

    let updated = found
        .update(state.pool(), user, body)
        .await
        .map_err(|e| WebError::database(Student::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/students/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the student to delete")
    ),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "students"
)]
async fn students_delete_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.viewer(Student::get_resource_type())?;
    let found = Student::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::database(Student::get_resource_type(), e))?;

    require_found(found)?
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::database(Student::get_resource_type(), e))?;

    Ok(StatusCode::NO_CONTENT)
}
