pub mod app;
pub mod auth_middleware;
pub mod config;
pub mod db;
pub mod error;
pub mod exercise_parser;
pub mod exercise_store;
pub mod invite;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod routes;
pub mod segmenter;
pub mod shapes;

pub use app::build_app;
pub use exercise_parser::parse_exercises;
