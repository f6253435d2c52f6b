use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::IntoResponse;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::access::{OrganizationId, Principal, Role, UserId, ViewAsRequest};
use crate::workflows::assessment::router::{
    assessment_router, submit_handler, AssessmentRouterState,
};
use crate::workflows::assessment::service::{AssessmentPolicy, AssessmentService};

fn answers_payload() -> Value {
    json!({
        "answers": [
            { "question_id": "q1", "gift_key": "TEACHING", "value": 5 },
            { "question_id": "q2", "gift_key": "TEACHING", "value": 4 },
            { "question_id": "q3", "gift_key": "TEACHING", "value": 5 },
            { "questionId": "q4", "giftKey": "FAITH", "value": 3 },
            { "question_id": "q5", "gift_key": "FAITH", "value": 3 },
            { "question_id": "q6", "gift_key": "FAITH", "value": 3 }
        ]
    })
}

#[tokio::test]
async fn start_answer_submit_flow_returns_created_result() {
    let (service, repository) = build_service();
    let router = assessment_router(service, build_access());
    let grace = participant(member());

    let started = router
        .clone()
        .oneshot(principal_request(
            "POST",
            "/api/v1/assessments/responses",
            &grace,
            Some(json!({ "version_id": "gifts-v2" })),
        ))
        .await
        .expect("start route");
    assert_eq!(started.status(), StatusCode::CREATED);
    let started = json_body(started).await;
    assert_eq!(started["organization_id"], "org-first-church");
    let response_id = started["id"].as_str().expect("response id").to_string();

    let recorded = router
        .clone()
        .oneshot(principal_request(
            "POST",
            &format!("/api/v1/assessments/responses/{response_id}/answers"),
            &grace,
            Some(answers_payload()),
        ))
        .await
        .expect("answers route");
    assert_eq!(recorded.status(), StatusCode::OK);
    assert_eq!(json_body(recorded).await["answers_recorded"], 6);

    let submitted = router
        .clone()
        .oneshot(principal_request(
            "POST",
            &format!("/api/v1/assessments/responses/{response_id}/submit"),
            &grace,
            None,
        ))
        .await
        .expect("submit route");
    assert_eq!(submitted.status(), StatusCode::CREATED);
    let body = json_body(submitted).await;
    assert_eq!(body["result"]["top3"], json!(["TEACHING", "FAITH", "LEADERSHIP_ORG"]));
    assert_eq!(body["result"]["scores"]["TEACHING"], 14);
    assert_eq!(body["result"]["shareable"], true);
    assert_eq!(body["score"]["is_valid"], false);
    assert_eq!(body["recovered"], false);
    assert_eq!(repository.result_count(), 1);

    let status = router
        .oneshot(principal_request(
            "GET",
            &format!("/api/v1/assessments/responses/{response_id}"),
            &grace,
            None,
        ))
        .await
        .expect("status route");
    assert_eq!(json_body(status).await["status"], "SCORED");
}

#[tokio::test]
async fn second_submit_is_a_conflict() {
    let (service, repository) = build_service();
    let response_id = open_response_with(&service, &member(), full_answer_sheet());
    let router = assessment_router(service, build_access());
    let uri = format!("/api/v1/assessments/responses/{response_id}/submit");
    let grace = participant(member());

    let first = router
        .clone()
        .oneshot(principal_request("POST", &uri, &grace, None))
        .await
        .expect("first submit");
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = router
        .oneshot(principal_request("POST", &uri, &grace, None))
        .await
        .expect("second submit");
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(second).await["code"], "invalid_state");
    assert_eq!(repository.result_count(), 1);
}

#[tokio::test]
async fn requests_without_principal_are_unauthenticated() {
    let (service, _) = build_service();
    let router = assessment_router(service, build_access());

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/assessments/results")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("results route");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], "unauthenticated");
}

#[tokio::test]
async fn unknown_role_header_is_a_bad_request() {
    let (service, _) = build_service();
    let router = assessment_router(service, build_access());

    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/assessments/results")
                .header("x-principal-id", "user-grace")
                .header("x-principal-role", "archbishop")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("results route");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn foreign_results_are_not_found() {
    let (service, _) = build_service();
    let response_id = open_response_with(&service, &member(), full_answer_sheet());
    let outcome = service
        .submit(&member(), &response_id, chrono::Utc::now())
        .expect("submit succeeds");
    let router = assessment_router(service, build_access());
    let uri = format!("/api/v1/assessments/results/{}", outcome.result.id);

    let owner = router
        .clone()
        .oneshot(principal_request("GET", &uri, &participant(member()), None))
        .await
        .expect("owner request");
    assert_eq!(owner.status(), StatusCode::OK);
    assert_eq!(json_body(owner).await["is_expired"], false);

    let stranger = router
        .oneshot(principal_request(
            "GET",
            &uri,
            &participant(other_member()),
            None,
        ))
        .await
        .expect("stranger request");
    assert_eq!(stranger.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn starting_in_another_organization_is_forbidden() {
    let (service, _) = build_service();
    let router = assessment_router(service, build_access());
    let outsider = Principal {
        id: other_member(),
        role: Role::Participant,
        organization_id: Some(OrganizationId("org-grace-chapel".to_string())),
    };

    let response = router
        .oneshot(principal_request(
            "POST",
            "/api/v1/assessments/responses",
            &outsider,
            Some(json!({ "version_id": "gifts-v2", "organization_id": "org-first-church" })),
        ))
        .await
        .expect("start route");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["code"], "organization_mismatch");
}

#[tokio::test]
async fn score_preview_ranks_without_persisting() {
    let (service, repository) = build_service();
    let router = assessment_router(service, build_access());

    let response = router
        .oneshot(principal_request(
            "POST",
            "/api/v1/assessments/score",
            &participant(member()),
            Some(json!({
                "answers": [
                    { "question_id": "q1", "gift_key": "MERCY", "value": 4 },
                    { "question_id": "q2", "gift_key": "juggling", "value": 5 }
                ],
                "recover": true
            })),
        ))
        .await
        .expect("score route");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["top3"][0], "MERCY");
    assert_eq!(body["totals"]["MERCY"], 4);
    assert_eq!(body["is_valid"], false);
    assert_eq!(repository.result_count(), 0);
}

#[tokio::test]
async fn submit_handler_surfaces_repository_outage() {
    let state = AssessmentRouterState {
        assessments: Arc::new(AssessmentService::new(
            Arc::new(UnavailableRepository),
            AssessmentPolicy::default(),
        )),
        access: build_access(),
    };
    let mut headers = HeaderMap::new();
    headers.insert("x-principal-id", "user-grace".parse().expect("header"));
    headers.insert("x-principal-role", "PARTICIPANT".parse().expect("header"));

    let response = submit_handler(
        State(state),
        headers,
        axum::extract::Path("resp-000001".to_string()),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn answers_follow_the_super_admin_view_context() {
    let (service, _) = build_service();
    let access = build_access();
    let router = assessment_router(service, Arc::clone(&access));
    let admin = Principal {
        id: UserId("user-admin".to_string()),
        role: Role::SuperAdmin,
        organization_id: None,
    };

    let started = router
        .clone()
        .oneshot(principal_request(
            "POST",
            "/api/v1/assessments/responses",
            &admin,
            Some(json!({ "version_id": "gifts-v2", "organization_id": "org-first-church" })),
        ))
        .await
        .expect("start route");
    assert_eq!(started.status(), StatusCode::CREATED);
    let response_id = json_body(started).await["id"]
        .as_str()
        .expect("response id")
        .to_string();
    let uri = format!("/api/v1/assessments/responses/{response_id}/answers");

    let before = router
        .clone()
        .oneshot(principal_request("POST", &uri, &admin, Some(answers_payload())))
        .await
        .expect("answers route");
    assert_eq!(before.status(), StatusCode::OK);

    access
        .set_view(
            &admin,
            ViewAsRequest {
                view_as_role: None,
                view_as_organization_id: Some(OrganizationId("org-grace-chapel".to_string())),
            },
            chrono::Utc::now(),
        )
        .expect("view context stored");

    let after = router
        .oneshot(principal_request("POST", &uri, &admin, Some(answers_payload())))
        .await
        .expect("answers route");
    assert_eq!(after.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(after).await["code"], "organization_mismatch");
}
