use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};

use crate::config::Config;

/* ---------- App state ---------- */
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt_encoding: jsonwebtoken::EncodingKey,
    pub config: Config,
}

/* ---------- Parser output ---------- */

/// One exercise recognized in free text. Lives only as long as the request
/// that parsed it; persisted copies are [`PersistedExercise`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ParsedExercise {
    pub name: String, // "Pull Ups"
    pub target_sets: u32,
    pub target_reps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>, // lb or kg, whichever was typed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_seconds: Option<u32>,
    /// Per-set reps when the input listed them ("10,10,8,6").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_reps: Option<Vec<u32>>,
}

/// A parsed exercise with its position inside the workout.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct OrderedExercise {
    pub order: i64,
    #[serde(flatten)]
    pub exercise: ParsedExercise,
}

/* ---------- API models ---------- */

#[derive(Serialize, Deserialize, FromRow, Clone, Debug)]
pub struct Workout {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub invite_code: String,
    pub created_at: String,
}

#[derive(Deserialize, Debug)]
pub struct NewWorkout {
    pub title: String,
}

#[derive(Deserialize, Debug)]
pub struct ParseExercisesReq {
    pub text: String,
}

#[derive(Deserialize, Debug)]
pub struct PersistExercisesReq {
    pub text: String,
    /// Clear the workout's existing exercises first.
    #[serde(default)]
    pub replace: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PersistedExercise {
    pub id: i64,
    pub workout_id: i64,
    pub order: i64,
    pub name: String,
    pub target_sets: u32,
    pub target_reps: u32,
    pub weight: Option<f64>,
    pub rest_seconds: Option<u32>,
    pub completed_reps: Option<Vec<u32>>,
    pub created_at: String,
}

/* ---------- DB row model ---------- */

#[derive(FromRow)]
pub struct WorkoutExerciseRow {
    pub id: i64,
    pub workout_id: i64,
    pub position: i64,
    pub name: String,
    pub target_sets: u32,
    pub target_reps: u32,
    pub weight: Option<f64>,
    pub rest_seconds: Option<u32>,
    pub completed_reps: Option<Json<Vec<u32>>>,
    pub created_at: String,
}

impl From<WorkoutExerciseRow> for PersistedExercise {
    fn from(r: WorkoutExerciseRow) -> Self {
        Self {
            id: r.id,
            workout_id: r.workout_id,
            order: r.position,
            name: r.name,
            target_sets: r.target_sets,
            target_reps: r.target_reps,
            weight: r.weight,
            rest_seconds: r.rest_seconds,
            completed_reps: r.completed_reps.map(|j| j.0),
            created_at: r.created_at,
        }
    }
}
