use axum::http::StatusCode;
use sqlx::SqlitePool;
use sqlx::types::Json;

use crate::error::{AppError, AppResult};
use crate::exercise_parser::{parse_exercises, to_db_records};
use crate::models::{PersistedExercise, Workout, WorkoutExerciseRow};

/// Look up a workout and make sure `owner_id` may write to it.
///
/// # Errors
/// - `404` if the workout does not exist.
/// - `403` if it belongs to someone else.
/// - Any database error.
pub async fn owned_workout(pool: &SqlitePool, owner_id: i64, workout_id: i64) -> AppResult<Workout> {
    let workout = sqlx::query_as::<_, Workout>(
        r"
        SELECT id, owner_id, title, invite_code, created_at
          FROM workouts
         WHERE id = ?
        ",
    )
    .bind(workout_id)
    .fetch_optional(pool)
    .await?
    .ok_or(StatusCode::NOT_FOUND)?;

    if workout.owner_id != owner_id {
        return Err(StatusCode::FORBIDDEN.into());
    }
    Ok(workout)
}

/// All exercises of a workout, in order.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn list_exercises(pool: &SqlitePool, workout_id: i64) -> AppResult<Vec<PersistedExercise>> {
    let rows = sqlx::query_as::<_, WorkoutExerciseRow>(
        r"
        SELECT id, workout_id, position, name, target_sets, target_reps,
               weight, rest_seconds, completed_reps, created_at
          FROM workout_exercises
         WHERE workout_id = ?
         ORDER BY position
        ",
    )
    .bind(workout_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Parse `text` and store the exercises on `workout_id`.
///
/// With `replace`, the workout's existing exercises are removed first;
/// otherwise the new ones are numbered after the existing ones. Everything
/// happens in one transaction.
///
/// # Errors
/// - `404` / `403` from [`owned_workout`].
/// - [`AppError::NoExercises`] if nothing in `text` could be parsed.
/// - Any database error.
pub async fn parse_and_persist(
    pool: &SqlitePool,
    owner_id: i64,
    workout_id: i64,
    text: &str,
    replace: bool,
) -> AppResult<Vec<PersistedExercise>> {
    owned_workout(pool, owner_id, workout_id).await?;

    let parsed = parse_exercises(text);
    if parsed.is_empty() {
        return Err(AppError::NoExercises);
    }

    // Take the write lock up front so concurrent appends wait on it instead
    // of failing when the read of MAX(position) upgrades to a write.
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

    if replace {
        let deleted = sqlx::query("DELETE FROM workout_exercises WHERE workout_id = ?")
            .bind(workout_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tracing::debug!(workout_id, deleted, "cleared existing exercises");
    }

    let (next_order,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM workout_exercises WHERE workout_id = ?",
    )
    .bind(workout_id)
    .fetch_one(&mut *tx)
    .await?;

    let now = chrono::Utc::now().to_rfc3339();
    let mut stored = Vec::with_capacity(parsed.len());

    for rec in to_db_records(parsed, next_order) {
        let ex = rec.exercise;
        let row = sqlx::query_as::<_, WorkoutExerciseRow>(
            r"
            INSERT INTO workout_exercises
                   (workout_id, position, name, target_sets, target_reps,
                    weight, rest_seconds, completed_reps, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, workout_id, position, name, target_sets, target_reps,
                      weight, rest_seconds, completed_reps, created_at
            ",
        )
        .bind(workout_id)
        .bind(rec.order)
        .bind(&ex.name)
        .bind(ex.target_sets)
        .bind(ex.target_reps)
        .bind(ex.weight)
        .bind(ex.rest_seconds)
        .bind(ex.completed_reps.map(Json))
        .bind(&now)
        .fetch_one(&mut *tx)
        .await?;
        stored.push(PersistedExercise::from(row));
    }

    tx.commit().await?;

    tracing::info!(workout_id, count = stored.len(), replace, "stored parsed exercises");
    Ok(stored)
}

/// Remove every exercise from a workout.
///
/// # Errors
/// Returns an error if the delete fails.
pub async fn clear_exercises(pool: &SqlitePool, workout_id: i64) -> AppResult<u64> {
    let res = sqlx::query("DELETE FROM workout_exercises WHERE workout_id = ?")
        .bind(workout_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
