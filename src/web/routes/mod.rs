use crate::{
    model::{OrderBy, OrderField, ResourceTyped},
    web::{AppState, WebError, WebResult, doc::ApiDoc},
};
use axum::Router;
use serde::Deserialize;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod assessments;
pub mod courses;
pub mod groups;
pub mod results;
pub mod students;
pub mod user;

pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 500;

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

impl PaginationQuery {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self { limit, offset }
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// `None` keeps `default`; an unknown field is a 400.
pub fn parse_ordering<F: OrderField>(
    raw: Option<&str>,
    default: OrderBy<F>,
) -> WebResult<OrderBy<F>> {
    match raw {
        None => Ok(default),
        Some(value) => OrderBy::parse(value).ok_or_else(|| WebError::invalid_ordering(value)),
    }
}

/// Turns a scoped lookup into a 404 when nothing visible matched.
pub fn require_found<T: ResourceTyped>(found: Option<T>) -> WebResult<T> {
    found.ok_or_else(|| WebError::resource_not_found(T::get_resource_type()))
}

pub fn build_app<S: Send + Sync + Clone + 'static>(state: AppState) -> Router<S> {
    let docs = state.config().app().docs();

    let mut router = Router::new()
        .nest("/api/v1/account", user::routes(state.clone()))
        .nest("/api/v1/groups", groups::routes(state.clone()))
        .nest("/api/v1/courses", courses::routes(state.clone()))
        .nest("/api/v1/assessments", assessments::routes(state.clone()))
        .nest("/api/v1/results", results::routes(state.clone()))
        .nest("/api/v1/students", students::routes(state.clone()))
        .layer(CookieManagerLayer::default())
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    if docs {
        let openapi = ApiDoc::openapi();

        router = router.merge(SwaggerUi::new("/api/v1/docs").url("/api-doc/openapi.json", openapi));
    }

    router
}
