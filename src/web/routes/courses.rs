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
        entity::{Course, CourseCreate, CourseFilter, UserEntity},
        scoped_page,
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        error::ErrorResponse,
        middlewares,
        routes::{PaginationQuery, parse_ordering, require_found},
    },
};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CourseBody {
    pub name: String,
    /// Usernames of the professors teaching the course. When empty, a new
    /// course is taught by the caller and an updated one keeps its professors.
    #[serde(default)]
    pub professor: Vec<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseListQuery {
    /// `name` or `-name`
    pub ordering: Option<String>,
}

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(courses_list_handler).post(courses_create_handler))
        .route(
            "/{id}",
            get(courses_get_handler)
                .put(courses_update_handler)
                .delete(courses_delete_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn resolve_professors(
    state: &AppState,
    user: &AuthenticatedUser,
    usernames: &[String],
) -> WebResult<Vec<Uuid>> {
    if usernames.is_empty() {
        return Ok(vec![user.user_id()]);
    }

    UserEntity::ids_by_usernames(state.pool(), usernames)
        .await
        .map_err(|e| WebError::database(Course::get_resource_type(), e))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses",
    description = "Courses taught by the caller. Anonymous callers get an empty page.",
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<Course>),
        (status = 400, description = "Unknown ordering field", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
async fn courses_list_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    Query(query): Query<CourseListQuery>,
) -> WebResult<impl IntoResponse> {
    let filter = CourseFilter {
        ordering: parse_ordering(query.ordering.as_deref(), CourseFilter::default().ordering)?,
    };
    let (limit, offset) = (page.limit(), page.offset());
    let mm = state.pool();

    let courses = scoped_page(&ctx, limit, offset, |user| async move {
        Course::page(mm, &user, &filter, limit, offset).await
    })
    .await
    .map_err(|e| WebError::database(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(courses)))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses",
    request_body = CourseBody,
    description = "Creates a course taught by the listed professors",
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 400, description = "Unknown professor username", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
async fn courses_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(body): Json<CourseBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let professors = resolve_professors(&state, user, &body.professor).await?;

    let course = Course::create(
        state.pool(),
        user,
        CourseCreate {
            name: body.name,
            professors,
        },
    )
    .await
    .map_err(|e| WebError::database(Course::get_resource_type(), e))?;

    tracing::info!("course {} created by {}", course.id(), user.user_id());
    Ok((StatusCode::CREATED, Json(course)))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the course to get")
    ),
    responses(
        (status = 200, description = "Course found", body = Course),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
async fn courses_get_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.viewer(Course::get_resource_type())?;
    let course = Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::database(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(require_found(course)?)))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    request_body = CourseBody,
    description = "Renames the course. Professors are replaced only when `professor` is given.",
    params(
        ("id" = Uuid, Path, description = "ID of the course to update")
    ),
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 400, description = "Unknown professor username", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
async fn courses_update_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(body): Json<CourseBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.viewer(Course::get_resource_type())?;
    let found = Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::database(Course::get_resource_type(), e))?;
    let found = require_found(found)?;

    let professors = if body.professor.is_empty() {
        found.professors().to_vec()
    } else {
        resolve_professors(&state, user, &body.professor).await?
    };
    let updated = found
        .update(
            state.pool(),
            user,
            CourseCreate {
                name: body.name,
                professors,
            },
        )
        .await
        .map_err(|e| WebError::database(Course::get_resource_type(), e))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    description = "Deletes the course together with its assessments, students and results",
    params(
        ("id" = Uuid, Path, description = "ID of the course to delete")
    ),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
async fn courses_delete_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.viewer(Course::get_resource_type())?;
    let found = Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::database(Course::get_resource_type(), e))?;

    require_found(found)?
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::database(Course::get_resource_type(), e))?;

    Ok(StatusCode::NO_CONTENT)
}
