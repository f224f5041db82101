use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::auth_middleware::Claims;
use crate::error::AppResult;
use crate::exercise_store::owned_workout;
use crate::invite::{INVITE_CODE_ATTEMPTS, canonical_invite_code, generate_invite_code};
use crate::models::{AppState, NewWorkout, Workout};

/// GET /workouts
///
/// # Errors
/// Returns an error if the query fails.
pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<Workout>>> {
    let rows = sqlx::query_as::<_, Workout>(
        r"
        SELECT id, owner_id, title, invite_code, created_at
          FROM workouts
         WHERE owner_id = ?
         ORDER BY id DESC
        ",
    )
    .bind(claims.sub)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows))
}

/// POST /workouts { "title": "Push day" }
/// Creates a workout owned by the caller with a fresh invite code.
///
/// # Errors
/// Returns an error if:
/// - The title is empty (`400`).
/// - No unique invite code was found after a few attempts.
/// - The insert fails.
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(new): Json<NewWorkout>,
) -> AppResult<Json<Workout>> {
    let title = new.title.trim();
    if title.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "title must not be empty".to_string()).into());
    }

    let now = chrono::Utc::now().to_rfc3339();

    for attempt in 1..=INVITE_CODE_ATTEMPTS {
        let code = generate_invite_code();
        let res = sqlx::query_as::<_, Workout>(
            r"
            INSERT INTO workouts (owner_id, title, invite_code, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, owner_id, title, invite_code, created_at
            ",
        )
        .bind(claims.sub)
        .bind(title)
        .bind(&code)
        .bind(&now)
        .fetch_one(&state.pool)
        .await;

        match res {
            Ok(row) => {
                tracing::info!(workout_id = row.id, invite_code = %row.invite_code, "workout created");
                return Ok(Json(row));
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                tracing::debug!(attempt, code = %code, "invite code collision, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(anyhow::anyhow!("could not allocate a unique invite code").into())
}

/// GET /workouts/{id}
///
/// # Errors
/// Returns `404`/`403` for an unknown or foreign workout, or a database error.
pub async fn get(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> AppResult<Json<Workout>> {
    Ok(Json(owned_workout(&state.pool, claims.sub, id).await?))
}

/// GET /workouts/by-code/{code}
/// Resolve an invite code (case-insensitive) to its workout.
///
/// # Errors
/// Returns `404` if no workout has this code, or a database error.
pub async fn get_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<Workout>> {
    let row = sqlx::query_as::<_, Workout>(
        r"
        SELECT id, owner_id, title, invite_code, created_at
          FROM workouts
         WHERE invite_code = ?
        ",
    )
    .bind(canonical_invite_code(&code))
    .fetch_optional(&state.pool)
    .await?
    .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(row))
}

/// DELETE /workouts/{id}
/// Exercises go with it (`ON DELETE CASCADE`).
///
/// # Errors
/// Returns `404`/`403` for an unknown or foreign workout, or a database error.
pub async fn delete(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    owned_workout(&state.pool, claims.sub, id).await?;

    let affected = sqlx::query("DELETE FROM workouts WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?
        .rows_affected();

    Ok(Json(serde_json::json!({ "deleted": affected })))
}
