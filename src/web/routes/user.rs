use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Duration;
use serde::Deserialize;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    auth::{self, UserClaims, hash_password, verify_password},
    model::{
        CrudRepository, NoFilter, PaginatableRepository, ResourceTyped, check_access,
        entity::{UserEntity, UserEntityCreateUpdate},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        error::ErrorResponse,
        middlewares::{self, session_cookie},
        routes::{PaginationQuery, require_found},
    },
};

const SESSION_TTL_DAYS: i64 = 1;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UserCreateUpdateBody {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route("/page", get(user_list_handler))
        .route("/verify", get(user_verify_handler))
        .route("/{id}", put(user_update_handler).delete(user_delete_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    Router::new()
        .route("/signup", post(user_signup_handler))
        .route("/signin", post(user_signin_handler))
        .merge(protected)
        .with_state(state)
}

fn db_error(e: crate::model::DatabaseError) -> WebError {
    WebError::database(UserEntity::get_resource_type(), e)
}

/// Signs a session token for `user` and hands it to the client as `SID`.
fn start_session(state: &AppState, cookies: &Cookies, user: &UserEntity) -> WebResult<()> {
    let claims = UserClaims::for_user(user.id(), Duration::days(SESSION_TTL_DAYS));
    let token = auth::generate_token(claims, state.config().app().jwt())
        .map_err(|e| WebError::server_crypt_error(e.into()))?;

    cookies.add(session_cookie(token));
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signup",
    request_body = UserCreateUpdateBody,
    description = "Creates new user in database",
    responses(
        (status = 200, description = "User created successfully", body = UserEntity),
        (status = 409, description = "User already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account"
)]
async fn user_signup_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<UserCreateUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let admin = AuthenticatedUser::admin();
    let found = UserEntity::find_by_username(state.pool(), &admin, &payload.username)
        .await
        .map_err(db_error)?;

    if found.is_some() {
        return Err(WebError::registration_conflict());
    }

    let hash = hash_password(&payload.password).map_err(WebError::server_crypt_error)?;
    let payload = UserEntityCreateUpdate {
        username: payload.username,
        email: payload.email,
        password_hash: hash,
        role: None,
    };

    let created = UserEntity::create(state.pool(), &admin, payload)
        .await
        .map_err(db_error)?;

    start_session(&state, &cookies, &created)?;
    tracing::info!("user {} signed up", created.username());

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signin",
    description = "Authorizes user in the system",
    request_body = UserCreateUpdateBody,
    responses(
        (status = 200, description = "User signed in", body = UserEntity),
        (status = 401, description = "Credentials invalid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
)]
async fn user_signin_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<UserCreateUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let admin = AuthenticatedUser::admin();
    let found = UserEntity::find_by_username(state.pool(), &admin, &payload.username)
        .await
        .map_err(db_error)?
        .ok_or_else(WebError::auth_invalid_credentials)?;

    let is_verified =
        verify_password(found.hash(), &payload.password).map_err(WebError::server_crypt_error)?;

    if !is_verified {
        return Err(WebError::auth_invalid_credentials());
    }

    start_session(&state, &cookies, &found)?;
    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/verify",
    description = "Checks whether the session cookie belongs to a live account",
    responses(
        (status = 200, description = "Session is valid"),
        (status = 401, description = "No valid session"),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn user_verify_handler(ctx: RequestContext) -> StatusCode {
    match ctx.maybe_user() {
        Some(_) => StatusCode::OK,
        None => StatusCode::UNAUTHORIZED,
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/account/page",
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<UserEntity>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You're not an admin", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn user_list_handler(
    ctx: RequestContext,
    Query(page): Query<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin(UserEntity::get_resource_type())?;

    let users = UserEntity::page(state.pool(), user, &NoFilter, page.limit(), page.offset())
        .await
        .map_err(db_error)?;

    Ok((StatusCode::OK, Json(users)))
}

#[utoipa::path(
    put,
    path = "/api/v1/account/{id}",
    request_body = UserCreateUpdateBody,
    description = "Changes username and email. Password is not updated here.",
    params(
        ("id" = Uuid, Path, description = "ID of the account to update")
    ),
    responses(
        (status = 200, description = "User updated successfully", body = UserEntity),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "You don't have enough permissions to do this", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Username already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn user_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserCreateUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = UserEntity::find_by_id(state.pool(), user, id)
        .await
        .map_err(db_error)?;
    let found = require_found(found)?;

    check_access(state.pool(), user, &found, user.user_id())
        .await
        .map_err(db_error)?;

    if found.username() != payload.username {
        let conflict = UserEntity::find_by_username(state.pool(), user, &payload.username)
            .await
            .map_err(db_error)?;

        if conflict.is_some() {
            return Err(WebError::registration_conflict());
        }
    }

    let payload = UserEntityCreateUpdate {
        username: payload.username,
        email: payload.email,
        password_hash: String::new(),
        role: None,
    };

    let updated = found
        .update(state.pool(), user, payload)
        .await
        .map_err(db_error)?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/account/{id}",
    description = "Deletes specified user",
    params(
        ("id" = Uuid, Path, description = "ID of the account to delete")
    ),
    responses(
        (status = 200, description = "User deleted successfully"),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "You're not allowed to do this", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn user_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let found = UserEntity::find_by_id(state.pool(), user, id)
        .await
        .map_err(db_error)?;
    let found = require_found(found)?;

    check_access(state.pool(), user, &found, user.user_id())
        .await
        .map_err(db_error)?;

    found.delete(state.pool(), user).await.map_err(db_error)?;

    Ok(StatusCode::OK)
}
