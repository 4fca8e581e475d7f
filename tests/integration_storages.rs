mod common;

use axum::body::Body;
use axum::http::StatusCode;
use chemstore::router::init_router;
use chemstore::state::AppState;
use chemstore_auth::XSRF_HEADER;
use chemstore_core::Role;
use chemstore_db::storages::{CreateStorage, GetStorage, Storage};
use chemstore_db::users::GetUserById;
use chemstore_db::{BatchCommand, ClassifiedError, OutOfLimits, classify};
use common::{
    create_test_user, fresh_token, json_body, read_json, request, test_state, unique_name,
    with_token,
};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

fn setup_test_app(pool: PgPool) -> (axum::Router, AppState) {
    let state = test_state(pool);
    (init_router(state.clone()), state)
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_and_view_storage(pool: PgPool) {
    let (app, state) = setup_test_app(pool);
    let assistant = create_test_user(&state, &unique_name("assistant"), Role::Assistant, true).await;
    let token = fresh_token(&state, assistant.id, Role::Assistant);

    let req = with_token(request("GET", "/storages/new"), &token.token)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    let post_xsrf = read_json(response).await["post_xsrf"]
        .as_str()
        .unwrap()
        .to_string();

    let req = with_token(request("POST", "/api/v1/storages"), &token.token)
        .header("content-type", "application/json")
        .header(XSRF_HEADER, &post_xsrf)
        .body(json_body(json!({ "name": "Cabinet A", "cells": 12 })))
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json(response).await;
    assert_eq!(created["name"], "Cabinet A");
    assert_eq!(created["cells"], 12);
    let storage_id = created["id"].as_str().unwrap().to_string();

    let req = with_token(
        request("GET", &format!("/api/v1/storages/{}", storage_id)),
        &token.token,
    )
    .body(Body::empty())
    .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["storage"]["id"], storage_id);
    assert_eq!(body["caller"]["id"], assistant.id.to_string());

    let req = with_token(request("POST", "/api/v1/storages"), &token.token)
        .header("content-type", "application/json")
        .header(XSRF_HEADER, &post_xsrf)
        .body(json_body(json!({ "name": "Cabinet A", "cells": 3 })))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(
        body,
        json!({
            "errors": { "NameErr": "Елемент з даним назва уже існує" },
            "input": { "name": "Cabinet A", "cells": 3 },
        })
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_storages(pool: PgPool) {
    let (app, state) = setup_test_app(pool);
    let lecturer = create_test_user(&state, &unique_name("lecturer"), Role::Lecturer, true).await;
    let token = fresh_token(&state, lecturer.id, Role::Lecturer);

    for name in ["Cabinet A", "Cabinet B", "Fume hood"] {
        state
            .batch
            .perform_one(&mut CreateStorage::new(name, 4))
            .await
            .unwrap();
    }

    let req = with_token(request("GET", "/api/v1/storages?src=cab"), &token.token)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let names: Vec<&str> = body["storages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Cabinet B", "Cabinet A"]);
    assert_eq!(body["next_offset"], serde_json::Value::Null);
    assert_eq!(body["caller"]["id"], lecturer.id.to_string());

    let req = with_token(request("GET", "/api/v1/storages?offset=10001"), &token.token)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(read_json(response).await["errors"]["OffsetErr"].is_string());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_storage_validation(pool: PgPool) {
    let (app, state) = setup_test_app(pool);
    let assistant = create_test_user(&state, &unique_name("assistant"), Role::Assistant, true).await;
    let token = fresh_token(&state, assistant.id, Role::Assistant);
    let xsrf = chemstore_auth::xsrf::generate(
        common::TEST_SECRET,
        &assistant.id.to_string(),
        "/api/v1/storages",
    );

    let req = with_token(request("POST", "/api/v1/storages"), &token.token)
        .header("content-type", "application/json")
        .header(XSRF_HEADER, xsrf)
        .body(json_body(json!({ "name": "<b>Sh</b>", "cells": 0 })))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(
        body["errors"],
        json!({
            "CellsErr": "Поле відділи невірне",
            "NameErr": "Поле назва надто коротке (2), мінімальна довжина - 3 символи(ів)",
        })
    );
    assert_eq!(body["input"]["name"], "Sh");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_lecturer_cannot_create_storage(pool: PgPool) {
    let (app, state) = setup_test_app(pool);
    let lecturer = create_test_user(&state, &unique_name("lecturer"), Role::Lecturer, true).await;
    let token = fresh_token(&state, lecturer.id, Role::Lecturer);
    let xsrf = chemstore_auth::xsrf::generate(
        common::TEST_SECRET,
        &lecturer.id.to_string(),
        "/api/v1/storages",
    );

    let req = with_token(request("POST", "/api/v1/storages"), &token.token)
        .header("content-type", "application/json")
        .header(XSRF_HEADER, xsrf)
        .body(json_body(json!({ "name": "Cabinet B", "cells": 5 })))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cells_out_of_limits(pool: PgPool) {
    let state = test_state(pool);

    let mut create = CreateStorage::new("Cabinet C", 5000);
    let err = state.batch.perform_one(&mut create).await.unwrap_err();

    let classified = classify(&err);
    assert_eq!(
        classified,
        ClassifiedError::OutOfLimits(OutOfLimits {
            table: "storage".to_string(),
            column: "cells".to_string(),
        })
    );
    if let ClassifiedError::OutOfLimits(limits) = classified {
        let localized = limits.localize::<Storage>();
        assert_eq!(localized.map()["CellsErr"], "Відділи поза межами");
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_batch_failure_is_isolated(pool: PgPool) {
    let state = test_state(pool);
    let user = create_test_user(&state, &unique_name("owner"), Role::Assistant, true).await;

    let mut existing = CreateStorage::new("Shelf", 4);
    state.batch.perform_one(&mut existing).await.unwrap();

    let mut duplicate = CreateStorage::new("Shelf", 4);
    let mut caller = GetUserById::new(user.id.to_string());
    let mut fresh = CreateStorage::new("Fume hood", 2);
    let mut commands: [&mut dyn BatchCommand; 3] = [&mut duplicate, &mut caller, &mut fresh];

    let results = state.batch.perform(&mut commands).await;

    assert_eq!(results.len(), 3);
    match &results[0] {
        Err(err) => assert!(matches!(
            classify(err),
            ClassifiedError::UniqueViolation(ref v) if v.table == "storage" && v.column == "name"
        )),
        Ok(()) => panic!("duplicate name was accepted"),
    }
    assert!(results[1].is_ok());
    assert!(results[2].is_ok());
    assert_eq!(caller.user.unwrap().id, user.id);

    // No transaction: the later insert stays committed.
    let created = fresh.storage.unwrap();
    let mut get = GetStorage::new(created.id.to_string());
    state.batch.perform_one(&mut get).await.unwrap();
    assert_eq!(get.storage.unwrap().name, "Fume hood");
}
