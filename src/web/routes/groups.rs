use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, DatabaseError, NoFilter, PaginatableRepository, ResourceTyped,
        entity::{Group, GroupCreate},
    },
    web::{
        AppState, RequestContext, WebError, WebResult,
        error::ErrorResponse,
        middlewares,
        routes::{PaginationQuery, require_found},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(groups_list_handler).post(groups_create_handler))
        .route(
            "/{id}",
            get(groups_get_handler)
                .put(groups_update_handler)
                .delete(groups_delete_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn db_error(e: DatabaseError) -> WebError {
    WebError::database(Group::get_resource_type(), e)
}

#[utoipa::path(
    get,
    path = "/api/v1/groups",
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<Group>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "groups"
)]
async fn groups_list_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let groups = Group::page(state.pool(), user, &NoFilter, page.limit(), page.offset())
        .await
        .map_err(db_error)?;

    Ok((StatusCode::OK, Json(groups)))
}

#[utoipa::path(
    post,
    path = "/api/v1/groups",
    request_body = GroupCreate,
    description = "Creates an account group. Admin only.",
    responses(
        (status = 201, description = "Group created", body = Group),
        (status = 400, description = "Unknown member id", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 409, description = "Group name already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "groups"
)]
async fn groups_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(body): Json<GroupCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin(Group::get_resource_type())?;
    let group = Group::create(state.pool(), user, body)
        .await
        .map_err(db_error)?;

    Ok((StatusCode::CREATED, Json(group)))
}

#[utoipa::path(
    get,
    path = "/api/v1/groups/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the group to get")
    ),
    responses(
        (status = 200, description = "Group found", body = Group),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "groups"
)]
async fn groups_get_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let group = Group::find_by_id(state.pool(), user, id)
        .await
        .map_err(db_error)?;

    Ok((StatusCode::OK, Json(require_found(group)?)))
}

#[utoipa::path(
    put,
    path = "/api/v1/groups/{id}",
    request_body = GroupCreate,
    description = "Renames the group and replaces its members. Admin only.",
    params(
        ("id" = Uuid, Path, description = "ID of the group to update")
    ),
    responses(
        (status = 200, description = "Group updated", body = Group),
        (status = 400, description = "Unknown member id", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 409, description = "Group name already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "groups"
)]
async fn groups_update_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(body): Json<GroupCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin(Group::get_resource_type())?;
    let found = Group::find_by_id(state.pool(), user, id)
        .await
        .map_err(db_error)?;

    let updated = require_found(found)?
        .update(state.pool(), user, body)
        .await
        .map_err(db_error)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/groups/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the group to delete")
    ),
    responses(
        (status = 204, description = "Group deleted"),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "groups"
)]
async fn groups_delete_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin(Group::get_resource_type())?;
    let found = Group::find_by_id(state.pool(), user, id)
        .await
        .map_err(db_error)?;

    require_found(found)?
        .delete(state.pool(), user)
        .await
        .map_err(db_error)?;

    Ok(StatusCode::NO_CONTENT)
}
