use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

use setlog::{auth_middleware::Claims, build_app, config::Config, db::MIGRATOR, models::AppState};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};

const SECRET: &str = "test-secret";
const TEST_PASSWORD: &str = "testpassword123";

struct TestCtx {
    _tmp: tempfile::TempDir,
    pool: SqlitePool,
    app: Router,
}

fn test_config(tmp: &std::path::Path, password_hash: Option<String>) -> Config {
    Config {
        verbose: 0,
        quiet: 0,
        bind: "127.0.0.1:0".parse().unwrap(),
        database_path: tmp.join("test.sqlite").to_string_lossy().to_string(),
        log_file: tmp.join("test.log"),
        cors_origin: None,
        jwt_secret: Some(SECRET.to_string()),
        password_hash,
    }
}

async fn make_ctx_with(password_hash: Option<String>) -> anyhow::Result<TestCtx> {
    let tmp = tempfile::tempdir()?;
    let config = test_config(tmp.path(), password_hash);

    let opts = SqliteConnectOptions::new()
        .filename(&config.database_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Delete)
        .synchronous(SqliteSynchronous::Off);

    let pool = SqlitePool::connect_with(opts).await?;
    MIGRATOR.run(&pool).await?;

    let state = AppState {
        pool: pool.clone(),
        jwt_encoding: jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
        config,
    };
    Ok(TestCtx {
        _tmp: tmp,
        pool,
        app: build_app(state),
    })
}

async fn make_ctx() -> anyhow::Result<TestCtx> {
    make_ctx_with(None).await
}

fn token_for(sub: i64) -> String {
    let exp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
        + 3600;
    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &Claims { sub, exp },
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn json_req(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| json!({"_raw": String::from_utf8_lossy(&bytes)}))
    };
    (status, body)
}

fn post_json(uri: &str, token: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    let mut b = Request::post(uri).header("content-type", "application/json");
    if let Some(t) = token {
        b = b.header("authorization", format!("Bearer {t}"));
    }
    b.body(Body::from(body.to_string())).unwrap()
}

fn get_with(uri: &str, token: &str) -> Request<Body> {
    Request::get(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn delete_with(uri: &str, token: &str) -> Request<Body> {
    Request::delete(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn create_workout(app: &Router, token: &str, title: &str) -> serde_json::Value {
    let (st, body) = json_req(app, post_json("/workouts", Some(token), &json!({"title": title}))).await;
    assert_eq!(st, StatusCode::OK, "{body}");
    body
}

#[tokio::test]
async fn healthz_ok() -> anyhow::Result<()> {
    let ctx = make_ctx().await?;
    let (st, body) = json_req(
        &ctx.app,
        Request::get("/healthz").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(body, json!("ok"));
    Ok(())
}

#[tokio::test]
async fn login_issues_token_for_correct_password() -> anyhow::Result<()> {
    use argon2::Argon2;
    use password_hash::{PasswordHasher, SaltString};
    use rand::rngs::OsRng;

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(TEST_PASSWORD.as_bytes(), &salt)
        .unwrap()
        .to_string();
    let ctx = make_ctx_with(Some(hash)).await?;

    let (st, _) = json_req(
        &ctx.app,
        post_json("/auth/login", None, &json!({"password": "wrong-password"})),
    )
    .await;
    assert_eq!(st, StatusCode::UNAUTHORIZED);

    let (st, body) = json_req(
        &ctx.app,
        post_json("/auth/login", None, &json!({"password": TEST_PASSWORD})),
    )
    .await;
    assert_eq!(st, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (st, status) = json_req(&ctx.app, get_with("/auth/status", &token)).await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(status["authenticated"], json!(true));
    assert_eq!(status["user_id"], json!(1));
    Ok(())
}

#[tokio::test]
async fn login_without_configured_password_is_unavailable() -> anyhow::Result<()> {
    let ctx = make_ctx().await?;
    let (st, _) = json_req(
        &ctx.app,
        post_json("/auth/login", None, &json!({"password": TEST_PASSWORD})),
    )
    .await;
    assert_eq!(st, StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_token() -> anyhow::Result<()> {
    let ctx = make_ctx().await?;

    let (st, _) = json_req(
        &ctx.app,
        Request::get("/workouts").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(st, StatusCode::UNAUTHORIZED);

    let (st, _) = json_req(
        &ctx.app,
        post_json("/exercises/parse", None, &json!({"text": "10x4 pushup"})),
    )
    .await;
    assert_eq!(st, StatusCode::UNAUTHORIZED);

    let (st, _) = json_req(&ctx.app, get_with("/workouts", "not-a-jwt")).await;
    assert_eq!(st, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn preview_parses_without_writing() -> anyhow::Result<()> {
    let ctx = make_ctx().await?;
    let token = token_for(1);

    let (st, body) = json_req(
        &ctx.app,
        post_json(
            "/exercises/parse",
            Some(&token),
            &json!({"text": "10x4 pushup, 10,10,8,6 pull ups between"}),
        ),
    )
    .await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"name": "Pushup", "target_sets": 4, "target_reps": 10, "rest_seconds": 60},
            {"name": "Pull Ups", "target_sets": 4, "target_reps": 9, "completed_reps": [10, 10, 8, 6]}
        ])
    );

    let workout = create_workout(&ctx.app, &token, "Pull day").await;
    let id = workout["id"].as_i64().unwrap();
    let (st, list) = json_req(&ctx.app, get_with(&format!("/workouts/{id}/exercises"), &token)).await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(list, json!([]));
    Ok(())
}

#[tokio::test]
async fn preview_of_noise_is_empty_list() -> anyhow::Result<()> {
    let ctx = make_ctx().await?;
    let token = token_for(1);
    let (st, body) = json_req(
        &ctx.app,
        post_json("/exercises/parse", Some(&token), &json!({"text": "hello world and foo bar"})),
    )
    .await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
async fn text_length_is_bounded() -> anyhow::Result<()> {
    let ctx = make_ctx().await?;
    let token = token_for(1);

    let (st, _) = json_req(
        &ctx.app,
        post_json("/exercises/parse", Some(&token), &json!({"text": "ab"})),
    )
    .await;
    assert_eq!(st, StatusCode::BAD_REQUEST);

    let long = "3x10 squats, ".repeat(40);
    let (st, _) = json_req(
        &ctx.app,
        post_json("/exercises/parse", Some(&token), &json!({"text": long})),
    )
    .await;
    assert_eq!(st, StatusCode::BAD_REQUEST);

    let workout = create_workout(&ctx.app, &token, "Legs").await;
    let id = workout["id"].as_i64().unwrap();
    let (st, _) = json_req(
        &ctx.app,
        post_json(&format!("/workouts/{id}/exercises"), Some(&token), &json!({"text": "x"})),
    )
    .await;
    assert_eq!(st, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn workouts_crud_with_invite_code() -> anyhow::Result<()> {
    let ctx = make_ctx().await?;
    let token = token_for(1);

    let (st, _) = json_req(&ctx.app, post_json("/workouts", Some(&token), &json!({"title": "  "}))).await;
    assert_eq!(st, StatusCode::BAD_REQUEST);

    let created = create_workout(&ctx.app, &token, "Push day").await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["title"], json!("Push day"));
    assert_eq!(created["owner_id"], json!(1));

    let code = created["invite_code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);
    assert!(
        code.bytes().all(|b| setlog::invite::INVITE_ALPHABET.contains(&b)),
        "unexpected character in {code}"
    );

    let (st, list) = json_req(&ctx.app, get_with("/workouts", &token)).await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (st, got) = json_req(&ctx.app, get_with(&format!("/workouts/{id}"), &token)).await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(got, created);

    let (st, by_code) = json_req(
        &ctx.app,
        get_with(&format!("/workouts/by-code/{}", code.to_lowercase()), &token),
    )
    .await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(by_code["id"], json!(id));

    let (st, _) = json_req(&ctx.app, get_with("/workouts/by-code/ZZZZZZ", &token)).await;
    assert_eq!(st, StatusCode::NOT_FOUND);

    let (st, del) = json_req(&ctx.app, delete_with(&format!("/workouts/{id}"), &token)).await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(del["deleted"], json!(1));

    let (st, _) = json_req(&ctx.app, get_with(&format!("/workouts/{id}"), &token)).await;
    assert_eq!(st, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn persist_appends_then_replaces() -> anyhow::Result<()> {
    let ctx = make_ctx().await?;
    let token = token_for(1);
    let workout = create_workout(&ctx.app, &token, "Upper body").await;
    let id = workout["id"].as_i64().unwrap();
    let uri = format!("/workouts/{id}/exercises");

    let (st, first) = json_req(
        &ctx.app,
        post_json(&uri, Some(&token), &json!({"text": "10x4 pushup, 10,10,8,6 pull ups between"})),
    )
    .await;
    assert_eq!(st, StatusCode::OK, "{first}");
    let first = first.as_array().unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0]["order"], json!(0));
    assert_eq!(first[0]["name"], json!("Pushup"));
    assert_eq!(first[0]["rest_seconds"], json!(60));
    assert_eq!(first[1]["order"], json!(1));
    assert_eq!(first[1]["completed_reps"], json!([10, 10, 8, 6]));
    assert_eq!(first[1]["rest_seconds"], json!(null));
    assert_eq!(first[1]["workout_id"], json!(id));

    let (st, appended) = json_req(
        &ctx.app,
        post_json(&uri, Some(&token), &json!({"text": "5 sets of 10 dips at 20kg"})),
    )
    .await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(appended[0]["order"], json!(2));
    assert_eq!(appended[0]["weight"], json!(20.0));

    let (_, all) = json_req(&ctx.app, get_with(&uri, &token)).await;
    let orders: Vec<_> = all.as_array().unwrap().iter().map(|e| e["order"].clone()).collect();
    assert_eq!(orders, vec![json!(0), json!(1), json!(2)]);

    let (st, replaced) = json_req(
        &ctx.app,
        post_json(&uri, Some(&token), &json!({"text": "3x12 lunges", "replace": true})),
    )
    .await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(replaced[0]["order"], json!(0));

    let (_, all) = json_req(&ctx.app, get_with(&uri, &token)).await;
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["name"], json!("Lunges"));
    assert_eq!(all[0]["target_sets"], json!(3));
    assert_eq!(all[0]["target_reps"], json!(12));

    let (st, del) = json_req(&ctx.app, delete_with(&uri, &token)).await;
    assert_eq!(st, StatusCode::OK);
    assert_eq!(del["deleted"], json!(1));
    Ok(())
}

#[tokio::test]
async fn persist_unrecognized_text_is_unprocessable() -> anyhow::Result<()> {
    let ctx = make_ctx().await?;
    let token = token_for(1);
    let workout = create_workout(&ctx.app, &token, "Rest day").await;
    let id = workout["id"].as_i64().unwrap();
    let uri = format!("/workouts/{id}/exercises");

    json_req(&ctx.app, post_json(&uri, Some(&token), &json!({"text": "3x10 squats"}))).await;

    let (st, body) = json_req(
        &ctx.app,
        post_json(&uri, Some(&token), &json!({"text": "hello world", "replace": true})),
    )
    .await;
    assert_eq!(st, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], json!("could not parse any exercises"));
    assert_eq!(body["examples"].as_array().unwrap().len(), 3);

    // a rejected replace leaves the stored exercises alone
    let (_, all) = json_req(&ctx.app, get_with(&uri, &token)).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn persist_checks_workout_owner() -> anyhow::Result<()> {
    let ctx = make_ctx().await?;
    let owner = token_for(1);
    let stranger = token_for(2);
    let workout = create_workout(&ctx.app, &owner, "Mine").await;
    let id = workout["id"].as_i64().unwrap();
    let uri = format!("/workouts/{id}/exercises");

    let (st, _) = json_req(&ctx.app, post_json(&uri, Some(&stranger), &json!({"text": "3x10 squats"}))).await;
    assert_eq!(st, StatusCode::FORBIDDEN);

    let (st, _) = json_req(&ctx.app, get_with(&uri, &stranger)).await;
    assert_eq!(st, StatusCode::FORBIDDEN);

    let (st, _) = json_req(&ctx.app, delete_with(&format!("/workouts/{id}"), &stranger)).await;
    assert_eq!(st, StatusCode::FORBIDDEN);

    let (st, _) = json_req(
        &ctx.app,
        post_json("/workouts/9999/exercises", Some(&owner), &json!({"text": "3x10 squats"})),
    )
    .await;
    assert_eq!(st, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn deleting_workout_removes_its_exercises() -> anyhow::Result<()> {
    let ctx = make_ctx().await?;
    let token = token_for(1);
    let workout = create_workout(&ctx.app, &token, "Temp").await;
    let id = workout["id"].as_i64().unwrap();
    let uri = format!("/workouts/{id}/exercises");
    json_req(&ctx.app, post_json(&uri, Some(&token), &json!({"text": "3x10 squats, 4x8 rows"}))).await;

    let (before,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM workout_exercises WHERE workout_id = ?")
            .bind(id)
            .fetch_one(&ctx.pool)
            .await?;
    assert_eq!(before, 2);

    json_req(&ctx.app, delete_with(&format!("/workouts/{id}"), &token)).await;

    let (after,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM workout_exercises WHERE workout_id = ?")
            .bind(id)
            .fetch_one(&ctx.pool)
            .await?;
    assert_eq!(after, 0);

    let (st, _) = json_req(&ctx.app, get_with(&uri, &token)).await;
    assert_eq!(st, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn large_exercise_list_is_returned_whole_with_debug_logging() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let ctx = make_ctx().await?;
    let token = token_for(1);
    let workout = create_workout(&ctx.app, &token, "Volume").await;
    let id = workout["id"].as_i64().unwrap();
    let uri = format!("/workouts/{id}/exercises");

    let text = vec!["3x10 squats"; 35].join(", ");
    for _ in 0..20 {
        let (st, _) = json_req(&ctx.app, post_json(&uri, Some(&token), &json!({"text": text}))).await;
        assert_eq!(st, StatusCode::OK);
    }

    let (st, all) = json_req(&ctx.app, get_with(&uri, &token)).await;
    assert_eq!(st, StatusCode::OK);
    let all = all.as_array().expect("exercise list");
    assert_eq!(all.len(), 700);
    assert_eq!(all[699]["order"], json!(699));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_all_succeed_with_dense_order() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let db_path = tmp.path().join("concurrent.sqlite");
    let pool = setlog::db::make_pool(&db_path.to_string_lossy()).await?;

    sqlx::query(
        "INSERT INTO workouts (id, owner_id, title, invite_code, created_at)
         VALUES (1, 1, 'Race', 'RACE23', '2026-01-01T00:00:00Z')",
    )
    .execute(&pool)
    .await?;

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move {
                setlog::exercise_store::parse_and_persist(&pool, 1, 1, "3x10 squats, 4x8 rows", false)
                    .await
                    .map(|stored| stored.len())
            })
        })
        .collect();

    for h in handles {
        let stored = h.await?;
        assert!(stored.is_ok(), "append failed: {:?}", stored.as_ref().err());
        assert_eq!(stored.ok(), Some(2));
    }

    let all = setlog::exercise_store::list_exercises(&pool, 1)
        .await
        .map_err(|e| anyhow::anyhow!("{e:?}"))?;
    let orders: Vec<i64> = all.iter().map(|e| e.order).collect();
    assert_eq!(orders, (0..32).collect::<Vec<i64>>());
    Ok(())
}
