mod common;
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, create_course_action, id_of, setup_server, setup_test_db, signin_action,
    signup_action,
};

#[tokio::test]
async fn route_course_anonymous_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            Action::new("course_list", "GET", "/api/v1/courses").assert_body(|body| {
                let page: Value = serde_json::from_str(body).unwrap();
                assert_eq!(page["total"], 0);
                assert_eq!(page["items"], json!([]));
            }),
        )
        .step(
            Action::new("course_create", "POST", "/api/v1/courses")
                .with_body(json!({ "name": "Algebra" }))
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_course_isolation_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("prof_a", "prof_a").with_save_as("prof_a"))
        .step(create_course_action("Algebra", "algebra").assert_body(|body| {
            assert!(body.contains("Algebra"));
        }))
        // the creator is the professor when none are listed
        .step(
            Action::new("course_get", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", id_of(ctx, "algebra")))
                .assert_body(|body| {
                    let course: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(course["professors"].as_array().unwrap().len(), 1);
                }),
        )
        .step(
            signup_action("prof_b", "prof_b")
                .with_clear_cookies(true)
                .with_save_as("prof_b"),
        )
        .step(create_course_action("Biology", "biology"))
        // prof_b only sees their own course
        .step(
            Action::new("course_list", "GET", "/api/v1/courses").assert_body(|body| {
                let page: Value = serde_json::from_str(body).unwrap();
                assert_eq!(page["total"], 1);
                assert_eq!(page["items"][0]["name"], "Biology");
            }),
        )
        .step(
            Action::new("course_get_foreign", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", id_of(ctx, "algebra")))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("course_delete_foreign", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", id_of(ctx, "algebra")))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("course_get_anonymous", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", id_of(ctx, "biology")))
                .with_clear_cookies(true)
                .with_save_cookies(false)
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_course_professors_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("colleague", "colleague").with_save_cookies(false))
        .step(signup_action("owner", "owner"))
        .step(
            Action::new("course_create_unknown_prof", "POST", "/api/v1/courses")
                .with_body(json!({ "name": "Chemistry", "professor": ["ghost"] }))
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert!(body.contains("ghost"))),
        )
        // a course taught only by someone else is invisible to its creator
        .step(
            Action::new("course_create_for_colleague", "POST", "/api/v1/courses")
                .with_body(json!({ "name": "Chemistry", "professor": ["colleague"] }))
                .with_expect(StatusCode::CREATED)
                .with_save_as("chemistry"),
        )
        .step(
            Action::new("course_list", "GET", "/api/v1/courses")
                .assert_body(|body| assert!(!body.contains("Chemistry"))),
        )
        .step(
            signin_action("colleague", "colleague")
                .with_clear_cookies(true),
        )
        .step(
            Action::new("course_list", "GET", "/api/v1/courses")
                .assert_body(|body| assert!(body.contains("Chemistry"))),
        )
        .step(
            Action::new("course_update", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", id_of(ctx, "chemistry")))
                .with_body(json!({ "name": "Organic Chemistry", "professor": ["colleague", "owner"] }))
                .assert_body(|body| {
                    let course: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(course["name"], "Organic Chemistry");
                    assert_eq!(course["professors"].as_array().unwrap().len(), 2);
                }),
        )
        .step(signin_action("owner", "owner").with_clear_cookies(true))
        .step(
            Action::new("course_list", "GET", "/api/v1/courses")
                .assert_body(|body| assert!(body.contains("Organic Chemistry"))),
        )
        // renaming without listing professors keeps the co-professor
        .step(
            Action::new("course_rename", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", id_of(ctx, "chemistry")))
                .with_body(json!({ "name": "Polymer Chemistry" }))
                .assert_body(|body| {
                    let course: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(course["name"], "Polymer Chemistry");
                    assert_eq!(course["professors"].as_array().unwrap().len(), 2);
                }),
        )
        .step(signin_action("colleague", "colleague").with_clear_cookies(true))
        .step(
            Action::new("course_get_colleague", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/courses/{}", id_of(ctx, "chemistry")))
                .assert_body(|body| assert!(body.contains("Polymer Chemistry"))),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_course_ordering_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("orderer", "orderer"))
        .step(create_course_action("Beta", "beta"))
        .step(create_course_action("Alpha", "alpha"))
        .step(create_course_action("Gamma", "gamma"))
        .step(
            Action::new("course_list", "GET", "/api/v1/courses").assert_body(|body| {
                let page: Value = serde_json::from_str(body).unwrap();
                let names: Vec<&str> = page["items"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|c| c["name"].as_str().unwrap())
                    .collect();
                assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
            }),
        )
        .step(
            Action::new("course_list_desc", "GET", "/api/v1/courses")
                .with_param("ordering", "-name")
                .with_param("limit", "2")
                .assert_body(|body| {
                    let page: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(page["total"], 3);
                    assert_eq!(page["limit"], 2);
                    assert_eq!(page["items"][0]["name"], "Gamma");
                    assert_eq!(page["items"][1]["name"], "Beta");
                }),
        )
        .step(
            Action::new("course_list_bad_order", "GET", "/api/v1/courses")
                .with_param("ordering", "id; DROP TABLE courses")
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .run(&mut server, pool)
        .await;
}
