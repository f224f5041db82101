use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use std::path::PathBuf;

// Embedded migrations (compiled in)
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Open (creating if needed) the SQLite database at `database_path` and run
/// pending migrations.
///
/// # Errors
/// Returns an error if the parent directory cannot be created, the database
/// cannot be opened, or a migration fails.
pub async fn make_pool(database_path: &str) -> anyhow::Result<SqlitePool> {
    let db_path = PathBuf::from(database_path);

    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let opts = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    let pool = SqlitePool::connect_with(opts).await?;
    MIGRATOR.run(&pool).await?;
    tracing::info!(path = %db_path.display(), "database ready");
    Ok(pool)
}
