mod common;
use axum::http::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use gradebook::model::{
    DatabaseError, DbConnection, ModelManager,
    entity::{AssessmentResult, AssessmentResultCreate},
};

use crate::common::{
    Action, Flow, create_assessment_action, create_course_action, create_student_action, id_of,
    setup_server, setup_test_db, signin_action, signup_action, submit_result_action,
};

#[tokio::test]
async fn route_result_single_submission_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("quizmaster", "quizmaster"))
        .step(create_course_action("Latin", "latin"))
        .step(create_assessment_action("latin", "Declensions", "2024-09-01", false, "quiz"))
        .step(create_student_action("latin", "Marcus", "marcus@example.com", "marcus"))
        .step(create_student_action("latin", "Julia", "julia@example.com", "julia"))
        // submissions do not need an account
        .step(
            submit_result_action("quiz", "marcus", 8.5)
                .with_clear_cookies(true)
                .with_save_cookies(false)
                .with_save_as("first")
                .assert_body(|body| {
                    let result: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(result["score"], 8.5);
                }),
        )
        .step(
            submit_result_action("quiz", "marcus", 9.0)
                .with_save_cookies(false)
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert!(body.contains("may not be submitted more than once"))),
        )
        // the limit is per assessment, whoever submits
        .step(
            submit_result_action("quiz", "julia", 7.0)
                .with_save_cookies(false)
                .with_expect(StatusCode::BAD_REQUEST),
        )
        // anonymous callers cannot read results back
        .step(
            Action::new("result_list_anonymous", "GET", "/api/v1/results")
                .with_save_cookies(false)
                .assert_body(|body| {
                    let page: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(page["total"], 0);
                }),
        )
        .step(signin_action("quizmaster", "quizmaster"))
        .step(
            Action::new("result_list", "GET", "/api/v1/results").assert_body(|body| {
                let page: Value = serde_json::from_str(body).unwrap();
                assert_eq!(page["total"], 1);
                assert_eq!(page["items"][0]["score"], 8.5);
            }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_result_multiple_submission_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("drillmaster", "drillmaster"))
        .step(create_course_action("Typing", "typing"))
        .step(create_assessment_action("typing", "Speed drill", "2024-10-01", true, "drill"))
        .step(create_student_action("typing", "Ada", "ada@example.com", "ada"))
        .step(submit_result_action("drill", "ada", 40.0))
        .step(submit_result_action("drill", "ada", 55.0))
        .step(submit_result_action("drill", "ada", 61.0))
        .step(
            Action::new("result_list", "GET", "/api/v1/results")
                .with_param("ordering", "-submitted")
                .assert_body(|body| {
                    let page: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(page["total"], 3);
                    // newest first
                    assert_eq!(page["items"][0]["score"], 61.0);
                    assert_eq!(page["items"][2]["score"], 40.0);
                }),
        )
        .step(
            Action::new("result_list_oldest_first", "GET", "/api/v1/results")
                .with_param("ordering", "submitted")
                .assert_body(|body| {
                    let page: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(page["items"][0]["score"], 40.0);
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_result_missing_references_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("checker", "checker"))
        .step(create_course_action("Logic", "logic"))
        .step(create_assessment_action("logic", "Syllogisms", "2024-11-01", false, "quiz"))
        .step(create_student_action("logic", "Kurt", "kurt@example.com", "kurt"))
        .step(
            Action::new("result_missing_assessment", "POST", "/api/v1/results")
                .with_dyn_body(|ctx| {
                    json!({
                        "assessment_id": Uuid::new_v4(),
                        "student_id": id_of(ctx, "kurt"),
                        "score": 1.0,
                    })
                })
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert!(body.contains("`assessment`"))),
        )
        .step(
            Action::new("result_missing_student", "POST", "/api/v1/results")
                .with_dyn_body(|ctx| {
                    json!({
                        "assessment_id": id_of(ctx, "quiz"),
                        "student_id": Uuid::new_v4(),
                        "score": 1.0,
                    })
                })
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert!(body.contains("`student`"))),
        )
        // rejected submissions do not use up the single attempt
        .step(submit_result_action("quiz", "kurt", 3.0))
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_result_update_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("outsider", "outsider"))
        .step(create_course_action("Prose", "prose"))
        .step(create_student_action("prose", "George", "george@example.com", "george"))
        .step(signup_action("grader", "grader").with_clear_cookies(true))
        .step(create_course_action("Drama", "drama"))
        .step(create_student_action("drama", "Sophocles", "sophocles@example.com", "sophocles"))
        .step(create_course_action("Poetry", "poetry"))
        .step(create_assessment_action("poetry", "Sonnets", "2024-12-01", false, "sonnets"))
        .step(create_assessment_action("poetry", "Haiku", "2024-12-02", false, "haiku"))
        .step(create_student_action("poetry", "Emily", "emily@example.com", "emily"))
        .step(create_student_action("poetry", "Walt", "walt@example.com", "walt"))
        .step(submit_result_action("sonnets", "emily", 6.0).with_save_as("result"))
        // rescoring and reassigning is fine
        .step(
            Action::new("result_update", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/results/{}", id_of(ctx, "result")))
                .with_dyn_body(|ctx| {
                    json!({
                        "assessment_id": id_of(ctx, "sonnets"),
                        "student_id": id_of(ctx, "walt"),
                        "score": 7.5,
                    })
                })
                .assert_body(|body| {
                    let result: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(result["score"], 7.5);
                }),
        )
        // another professor's student is invisible here
        .step(
            Action::new("result_update_foreign_student", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/results/{}", id_of(ctx, "result")))
                .with_dyn_body(|ctx| {
                    json!({
                        "assessment_id": id_of(ctx, "sonnets"),
                        "student_id": id_of(ctx, "george"),
                        "score": 7.5,
                    })
                })
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert!(body.contains("`student`"))),
        )
        // own student, but from a different course
        .step(
            Action::new("result_update_other_course_student", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/results/{}", id_of(ctx, "result")))
                .with_dyn_body(|ctx| {
                    json!({
                        "assessment_id": id_of(ctx, "sonnets"),
                        "student_id": id_of(ctx, "sophocles"),
                        "score": 7.5,
                    })
                })
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert!(body.contains("not enrolled"))),
        )
        .step(
            Action::new("result_still_assigned", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/results/{}", id_of(ctx, "result")))
                .assert_body(|body| {
                    let result: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(result["score"], 7.5);
                }),
        )
        // moving it to another assessment is not
        .step(
            Action::new("result_update_assessment", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/results/{}", id_of(ctx, "result")))
                .with_dyn_body(|ctx| {
                    json!({
                        "assessment_id": id_of(ctx, "haiku"),
                        "student_id": id_of(ctx, "walt"),
                        "score": 7.5,
                    })
                })
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert!(body.contains("assessment_id"))),
        )
        .step(
            Action::new("result_update_anonymous", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/results/{}", id_of(ctx, "result")))
                .with_dyn_body(|ctx| {
                    json!({
                        "assessment_id": id_of(ctx, "sonnets"),
                        "student_id": id_of(ctx, "emily"),
                        "score": 0.0,
                    })
                })
                .with_clear_cookies(true)
                .with_save_cookies(false)
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(signin_action("grader", "grader"))
        .step(
            Action::new("result_delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/results/{}", id_of(ctx, "result")))
                .with_expect(StatusCode::NO_CONTENT),
        )
        // with the result gone the assessment can be taken again
        .step(submit_result_action("sonnets", "emily", 9.0))
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_result_filters_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("filterer", "filterer"))
        .step(create_course_action("Rhetoric", "rhetoric"))
        .step(create_course_action("Ethics", "ethics"))
        .step(create_assessment_action("rhetoric", "Debate", "2025-01-10", true, "debate"))
        .step(create_assessment_action("ethics", "Trolley", "2025-01-11", true, "trolley"))
        .step(create_student_action("rhetoric", "Cicero", "cicero@example.com", "cicero"))
        .step(create_student_action("ethics", "Kant", "kant@example.com", "kant"))
        .step(submit_result_action("debate", "cicero", 10.0))
        .step(submit_result_action("trolley", "kant", 5.0))
        .step(submit_result_action("debate", "cicero", 4.0))
        // kant is not enrolled in rhetoric
        .step(
            submit_result_action("debate", "kant", 1.0)
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert!(body.contains("not enrolled"))),
        )
        .step(
            Action::new("result_by_student", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/results?student={}", id_of(ctx, "cicero")))
                .assert_body(|body| {
                    let page: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(page["total"], 2);
                }),
        )
        .step(
            Action::new("result_by_course", "GET", "dynamic")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/v1/results?assessment__course={}",
                        id_of(ctx, "rhetoric")
                    )
                })
                .assert_body(|body| {
                    let page: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(page["total"], 2);
                    assert_eq!(page["items"][0]["score"], 4.0);
                    assert_eq!(page["items"][1]["score"], 10.0);
                }),
        )
        .step(
            Action::new("result_by_title", "GET", "/api/v1/results")
                .with_param("ordering", "-assessment__title")
                .assert_body(|body| {
                    let page: Value = serde_json::from_str(body).unwrap();
                    assert_eq!(page["total"], 3);
                    assert_eq!(page["items"][0]["score"], 5.0);
                }),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn route_result_concurrent_submission_test() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let (course_id, assessment_id, student_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    sqlx::query("INSERT INTO courses (id, name) VALUES ($1, 'Chess')")
        .bind(course_id)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO assessments (id, course_id, title, date, submit_multiple) \
         VALUES ($1, $2, 'Endgames', '2025-02-01', FALSE)",
    )
    .bind(assessment_id)
    .bind(course_id)
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO students (id, course_id, name, email) VALUES ($1, $2, 'Magnus', 'magnus@example.com')")
        .bind(student_id)
        .bind(course_id)
        .execute(&pool)
        .await
        .unwrap();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let mm = ModelManager::new(DbConnection::from_pool(pool.clone()));
            tokio::spawn(async move {
                AssessmentResult::submit(
                    &mm,
                    AssessmentResultCreate {
                        assessment_id,
                        student_id,
                        score: Some(i as f64),
                    },
                )
                .await
            })
        })
        .collect();

    let (mut accepted, mut rejected) = (0, 0);
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(DatabaseError::AlreadySubmitted(_)) => rejected += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(rejected, 15);

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM results WHERE assessment_id = $1")
        .bind(assessment_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, 1);
}
