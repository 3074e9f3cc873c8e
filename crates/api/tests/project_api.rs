//! HTTP-level integration tests for project listing, detail, creation and
//! sharing, including the `currently_editing` projection.

mod common;

use assess_db::repositories::UserRepo;
use axum::http::StatusCode;
use common::{
    body_json, build_test_app, build_test_app_with_clock, create_project, create_user,
    delete_auth, get_auth, manual_clock, post_auth, post_json_auth, share, token_for,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_list_shows_owned_and_shared_projects_only(pool: PgPool) {
    let alice = create_user(&pool, "Alice").await;
    let bob = create_user(&pool, "Bob").await;
    let own = create_project(&pool, &bob, "Bob's plant").await;
    let shared = create_project(&pool, &alice, "Shared plant").await;
    let hidden = create_project(&pool, &alice, "Private plant").await;
    share(&pool, &shared, &bob).await;
    let app = build_test_app(pool);

    let response = get_auth(app, "/api/v1/projects", &token_for(bob.id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let ids: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert!(ids.contains(&own.id));
    assert!(ids.contains(&shared.id));
    assert!(!ids.contains(&hidden.id));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_list_embeds_currently_editing_while_active(pool: PgPool) {
    let alice = create_user(&pool, "Alice").await;
    let bob = create_user(&pool, "Bob").await;
    let project = create_project(&pool, &alice, "Plant A").await;
    share(&pool, &project, &bob).await;
    let clock = manual_clock();
    let app = build_test_app_with_clock(pool, clock.clone());

    let json = body_json(get_auth(app.clone(), "/api/v1/projects", &token_for(bob.id)).await).await;
    assert!(
        json["data"][0].get("currently_editing").is_none(),
        "vacant project has no currently_editing field"
    );

    post_auth(
        app.clone(),
        &format!("/api/v1/projects/{}/lock/acquire", project.id),
        &token_for(alice.id),
    )
    .await;

    clock.advance(chrono::Duration::seconds(30));
    let json = body_json(get_auth(app.clone(), "/api/v1/projects", &token_for(bob.id)).await).await;
    let editing = &json["data"][0]["currently_editing"];
    assert_eq!(editing["user_id"], alice.id);
    assert_eq!(editing["name"], "Alice");
    assert!(editing["since"].is_string());

    // Stale lease columns stay in the row but are not reported.
    clock.advance(chrono::Duration::seconds(31));
    let json = body_json(get_auth(app, "/api/v1/projects", &token_for(bob.id)).await).await;
    assert!(json["data"][0].get("currently_editing").is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_list_keeps_holder_name_after_deactivation(pool: PgPool) {
    let alice = create_user(&pool, "Alice").await;
    let bob = create_user(&pool, "Bob").await;
    let project = create_project(&pool, &alice, "Plant A").await;
    share(&pool, &project, &bob).await;
    let app = build_test_app(pool.clone());

    post_auth(
        app.clone(),
        &format!("/api/v1/projects/{}/lock/acquire", project.id),
        &token_for(bob.id),
    )
    .await;
    UserRepo::deactivate(&pool, bob.id).await.unwrap();

    // The holder row still exists, so its name is still joined.
    let json = body_json(get_auth(app, "/api/v1/projects", &token_for(alice.id)).await).await;
    assert_eq!(json["data"][0]["currently_editing"]["name"], "Bob");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_list_requires_auth(pool: PgPool) {
    let app = build_test_app(pool);

    let response = common::get(app, "/api/v1/projects").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_deactivated_user_token_rejected(pool: PgPool) {
    let alice = create_user(&pool, "Alice").await;
    UserRepo::deactivate(&pool, alice.id).await.unwrap();
    let app = build_test_app(pool);

    let response = get_auth(app, "/api/v1/projects", &token_for(alice.id)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_garbage_token_rejected(pool: PgPool) {
    let app = build_test_app(pool);

    let response = get_auth(app, "/api/v1/projects", "not-a-jwt").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Detail
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_get_project_for_member(pool: PgPool) {
    let alice = create_user(&pool, "Alice").await;
    let bob = create_user(&pool, "Bob").await;
    let project = create_project(&pool, &alice, "Plant A").await;
    share(&pool, &project, &bob).await;
    let app = build_test_app(pool);

    let response = get_auth(
        app,
        &format!("/api/v1/projects/{}", project.id),
        &token_for(bob.id),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], project.id);
    assert_eq!(json["data"]["name"], "Plant A");
    assert_eq!(json["data"]["owner_user_id"], alice.id);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_get_project_hidden_from_non_member(pool: PgPool) {
    let alice = create_user(&pool, "Alice").await;
    let mallory = create_user(&pool, "Mallory").await;
    let project = create_project(&pool, &alice, "Plant A").await;
    let app = build_test_app(pool);

    let response = get_auth(
        app,
        &format!("/api/v1/projects/{}", project.id),
        &token_for(mallory.id),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Create / delete / share
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_project_returns_201(pool: PgPool) {
    let alice = create_user(&pool, "Alice").await;
    let app = build_test_app(pool);

    let body = serde_json::json!({ "name": "  New plant  ", "description": "Line 2" });
    let response = post_json_auth(app, "/api/v1/projects", body, &token_for(alice.id)).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "New plant");
    assert_eq!(json["data"]["description"], "Line 2");
    assert_eq!(json["data"]["owner_user_id"], alice.id);
    assert!(json["data"].get("currently_editing").is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_project_rejects_blank_name(pool: PgPool) {
    let alice = create_user(&pool, "Alice").await;
    let app = build_test_app(pool);

    let body = serde_json::json!({ "name": "   " });
    let response = post_json_auth(app, "/api/v1/projects", body, &token_for(alice.id)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_owner_shares_project(pool: PgPool) {
    let alice = create_user(&pool, "Alice").await;
    let bob = create_user(&pool, "Bob").await;
    let project = create_project(&pool, &alice, "Plant A").await;
    let app = build_test_app(pool);

    let uri = format!("/api/v1/projects/{}/members", project.id);
    let body = serde_json::json!({ "user_id": bob.id });
    let response = post_json_auth(app.clone(), &uri, body.clone(), &token_for(alice.id)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Sharing twice is a no-op.
    let response = post_json_auth(app.clone(), &uri, body, &token_for(alice.id)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_auth(
        app,
        &format!("/api/v1/projects/{}/lock/acquire", project.id),
        &token_for(bob.id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_member_cannot_share(pool: PgPool) {
    let alice = create_user(&pool, "Alice").await;
    let bob = create_user(&pool, "Bob").await;
    let carol = create_user(&pool, "Carol").await;
    let project = create_project(&pool, &alice, "Plant A").await;
    share(&pool, &project, &bob).await;
    let app = build_test_app(pool);

    let response = post_json_auth(
        app,
        &format!("/api/v1/projects/{}/members", project.id),
        serde_json::json!({ "user_id": carol.id }),
        &token_for(bob.id),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_share_with_unknown_user_returns_404(pool: PgPool) {
    let alice = create_user(&pool, "Alice").await;
    let project = create_project(&pool, &alice, "Plant A").await;
    let app = build_test_app(pool);

    let response = post_json_auth(
        app,
        &format!("/api/v1/projects/{}/members", project.id),
        serde_json::json!({ "user_id": 999_999 }),
        &token_for(alice.id),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_delete_project_owner_only(pool: PgPool) {
    let alice = create_user(&pool, "Alice").await;
    let bob = create_user(&pool, "Bob").await;
    let project = create_project(&pool, &alice, "Plant A").await;
    share(&pool, &project, &bob).await;
    let app = build_test_app(pool);
    let uri = format!("/api/v1/projects/{}", project.id);

    let response = delete_auth(app.clone(), &uri, &token_for(bob.id)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete_auth(app.clone(), &uri, &token_for(alice.id)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(app.clone(), &uri, &token_for(alice.id)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = post_auth(app, &format!("{uri}/lock/acquire"), &token_for(alice.id)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
