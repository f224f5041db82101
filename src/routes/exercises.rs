use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::auth_middleware::Claims;
use crate::error::AppResult;
use crate::exercise_parser::parse_exercises;
use crate::exercise_store::{clear_exercises, list_exercises, owned_workout, parse_and_persist};
use crate::models::{AppState, ParseExercisesReq, ParsedExercise, PersistExercisesReq, PersistedExercise};

pub const MIN_TEXT_CHARS: usize = 3;
pub const MAX_TEXT_CHARS: usize = 500;

fn check_text_len(text: &str) -> AppResult<()> {
    let len = text.trim().chars().count();
    if (MIN_TEXT_CHARS..=MAX_TEXT_CHARS).contains(&len) {
        Ok(())
    } else {
        Err((
            StatusCode::BAD_REQUEST,
            format!("text must be {MIN_TEXT_CHARS}-{MAX_TEXT_CHARS} characters, got {len}"),
        )
            .into())
    }
}

/// POST /exercises/parse { "text": "..." }
/// Preview what would be stored; writes nothing. An empty list means nothing
/// was recognized.
///
/// # Errors
/// Returns `400` if the text is shorter than 3 or longer than 500 characters.
pub async fn preview(Json(req): Json<ParseExercisesReq>) -> AppResult<Json<Vec<ParsedExercise>>> {
    check_text_len(&req.text)?;
    Ok(Json(parse_exercises(&req.text)))
}

/// GET /workouts/{id}/exercises
///
/// # Errors
/// Returns `404`/`403` for an unknown or foreign workout, or a database error.
pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(workout_id): Path<i64>,
) -> AppResult<Json<Vec<PersistedExercise>>> {
    owned_workout(&state.pool, claims.sub, workout_id).await?;
    Ok(Json(list_exercises(&state.pool, workout_id).await?))
}

/// POST /workouts/{id}/exercises { "text": "...", "replace": false }
///
/// # Errors
/// Returns an error if:
/// - The text length is out of bounds (`400`).
/// - The workout is unknown (`404`) or not owned by the caller (`403`).
/// - No exercise could be recognized (`422`).
/// - The database write fails.
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(workout_id): Path<i64>,
    Json(req): Json<PersistExercisesReq>,
) -> AppResult<Json<Vec<PersistedExercise>>> {
    check_text_len(&req.text)?;
    let stored =
        parse_and_persist(&state.pool, claims.sub, workout_id, &req.text, req.replace).await?;
    Ok(Json(stored))
}

/// DELETE /workouts/{id}/exercises
///
/// # Errors
/// Returns `404`/`403` for an unknown or foreign workout, or a database error.
pub async fn clear(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(workout_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    owned_workout(&state.pool, claims.sub, workout_id).await?;
    let deleted = clear_exercises(&state.pool, workout_id).await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}
