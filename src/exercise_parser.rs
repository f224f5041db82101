use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{OrderedExercise, ParsedExercise};
use crate::normalize::normalize_exercise_name;
use crate::segmenter::{BETWEEN_RE, segment};
use crate::shapes::Shape;

static AND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\band\b").unwrap());

/// Rest assigned to every exercise but the last when "between" appears.
pub const BETWEEN_REST_SECONDS: u32 = 60;

/// Input formats shown to the user when nothing could be recognized.
pub const FORMAT_EXAMPLES: [&str; 3] = [
    "10x4 pushups",
    "10,10,8,6 pull ups",
    "5 sets of 10 squats at 135lbs",
];

/// Parse a free-typed workout description into exercises, in the order they
/// were written.
///
/// Examples: `"10x4 pushup"`, `"10,10,8,6 pull ups"`, `"5 sets of 10 pushups"`,
/// `"3x8 bench at 135lbs, 90s rest and 4x10 rows between"`.
///
/// Text that matches none of the known shapes is skipped, so the result may
/// be empty. This never fails.
#[must_use]
pub fn parse_exercises(text: &str) -> Vec<ParsedExercise> {
    let rest_between = BETWEEN_RE.is_match(text);

    let mut exercises: Vec<ParsedExercise> = AND_RE
        .split(text)
        .flat_map(segment)
        .filter_map(|clause| {
            let parsed = parse_clause(&clause);
            if parsed.is_none() {
                tracing::debug!(clause = %clause, "no exercise shape matched, dropping");
            }
            parsed
        })
        .collect();

    if rest_between && let Some((_, all_but_last)) = exercises.split_last_mut() {
        for ex in all_but_last {
            ex.rest_seconds = Some(BETWEEN_REST_SECONDS);
        }
    }

    tracing::debug!(count = exercises.len(), rest_between, "parsed exercises");
    exercises
}

/// Parse one isolated clause, trying each shape in priority order.
#[must_use]
pub fn parse_clause(clause: &str) -> Option<ParsedExercise> {
    Shape::PRIORITY.iter().find_map(|shape| {
        let m = shape.match_clause(clause)?;
        if m.target_sets == 0 || m.target_reps == 0 {
            return None;
        }
        let name = normalize_exercise_name(m.name);
        if name.is_empty() {
            return None;
        }
        Some(ParsedExercise {
            name,
            target_sets: m.target_sets,
            target_reps: m.target_reps,
            weight: m.weight,
            rest_seconds: m.rest_seconds,
            completed_reps: m.completed_reps,
        })
    })
}

/// Attach a dense persistence order, starting at `first_order`.
#[must_use]
pub fn to_db_records(exercises: Vec<ParsedExercise>, first_order: i64) -> Vec<OrderedExercise> {
    (first_order..)
        .zip(exercises)
        .map(|(order, exercise)| OrderedExercise { order, exercise })
        .collect()
}
