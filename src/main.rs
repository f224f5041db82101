#![deny(warnings, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::multiple_crate_versions)]

use clap::Parser;
use tokio::net::TcpListener;

use setlog::{
    build_app,
    config::{Cli, Commands},
    db::make_pool,
    logging::init_logging,
    models::AppState,
    parse_exercises,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(command) = cli.command {
        return handle_command(command);
    }

    let mut config = cli.config;

    // Keep guard alive so file logger flushes correctly
    let _log_guards = init_logging(&config);

    let jwt_secret = config.jwt_secret.clone().unwrap_or_else(|| {
        use rand::Rng;
        tracing::warn!(
            "No JWT secret provided, generated random secret (tokens will be invalid on restart)"
        );
        rand::thread_rng()
            .sample_iter(&rand::distributions::Alphanumeric)
            .take(32)
            .map(char::from)
            .collect()
    });
    config.jwt_secret = Some(jwt_secret.clone());

    tracing::info!("=== Configuration ===");
    tracing::info!("Bind address: {}", config.bind);
    tracing::info!("Database path: {}", config.database_path);
    tracing::info!("Log file: {}", config.log_file.display());
    tracing::info!(
        "CORS origin: {}",
        config.cors_origin.as_deref().unwrap_or("<allow all>")
    );
    tracing::info!(
        "Password hash: {}",
        if config.password_hash.is_some() {
            "<set>"
        } else {
            "<not set>"
        }
    );
    tracing::info!("====================");

    let pool = make_pool(&config.database_path).await?;

    let state = AppState {
        pool,
        jwt_encoding: jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_bytes()),
        config: config.clone(),
    };

    let app = build_app(state);

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!("listening on {}", config.bind);
    axum::serve(listener, app).await?;
    Ok(())
}

fn handle_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::HashPassword => hash_password_interactive(),
        Commands::Parse { text } => print_parsed(&text),
    }
}

fn print_parsed(text: &str) -> anyhow::Result<()> {
    let exercises = parse_exercises(text);
    if exercises.is_empty() {
        anyhow::bail!(
            "could not parse any exercises; try e.g. \"10x4 pushups\", \"10,10,8,6 pull ups\" or \"5 sets of 10 squats\""
        );
    }
    println!("{}", serde_json::to_string_pretty(&exercises)?);
    Ok(())
}

fn hash_password_interactive() -> anyhow::Result<()> {
    use argon2::Argon2;
    use password_hash::{PasswordHasher, SaltString};
    use rand::rngs::OsRng;

    println!("Enter password to hash:");
    let password = rpassword::read_password()?;

    if password.trim().is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    if password.len() < 8 {
        anyhow::bail!("Password must be at least 8 characters");
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?
        .to_string();

    println!("\nArgon2 password hash:");
    println!("{hash}");
    println!("\nAdd this to your .env file:");
    println!("SETLOG_PASSWORD_HASH=\"{hash}\"");

    Ok(())
}
