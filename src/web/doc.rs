use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::web::middlewares::AUTH_TOKEN;

pub struct CookieAuthModifier;

impl Modify for CookieAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    AUTH_TOKEN,
                    "JWT token for current user",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "gradebook", description = "Courses, assessments and submitted results"),
    paths(
        crate::web::routes::user::user_signup_handler,
        crate::web::routes::user::user_signin_handler,
        crate::web::routes::user::user_verify_handler,
        crate::web::routes::user::user_list_handler,
        crate::web::routes::user::user_update_handler,
        crate::web::routes::user::user_delete_handler,
        crate::web::routes::groups::groups_list_handler,
        crate::web::routes::groups::groups_create_handler,
        crate::web::routes::groups::groups_get_handler,
        crate::web::routes::groups::groups_update_handler,
        crate::web::routes::groups::groups_delete_handler,
        crate::web::routes::courses::courses_list_handler,
        crate::web::routes::courses::courses_create_handler,
        crate::web::routes::courses::courses_get_handler,
        crate::web::routes::courses::courses_update_handler,
        crate::web::routes::courses::courses_delete_handler,
        crate::web::routes::assessments::assessments_list_handler,
        crate::web::routes::assessments::assessments_create_handler,
        crate::web::routes::assessments::assessments_get_handler,
        crate::web::routes::assessments::assessments_update_handler,
        crate::web::routes::assessments::assessments_delete_handler,
        crate::web::routes::results::results_list_handler,
        crate::web::routes::results::results_create_handler,
        crate::web::routes::results::results_get_handler,
        crate::web::routes::results::results_update_handler,
        crate::web::routes::results::results_delete_handler,
        crate::web::routes::students::students_list_handler,
        crate::web::routes::students::students_create_handler,
        crate::web::routes::students::students_get_handler,
        crate::web::routes::students::students_update_handler,
        crate::web::routes::students::students_delete_handler,
    ),
    modifiers(&CookieAuthModifier),
)]
pub struct ApiDoc;
