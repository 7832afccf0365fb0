//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all application data.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        // Project deletion cascades to applications, messages, and ratings.
        .foreign_keys(true)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            author_id TEXT NOT NULL,
            author_name TEXT NOT NULL,
            author_role TEXT NOT NULL DEFAULT 'Developer',
            skills TEXT,
            roles_needed TEXT,
            duration TEXT NOT NULL,
            team_size INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS applications (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            applicant_id TEXT NOT NULL,
            applicant_name TEXT NOT NULL,
            role TEXT NOT NULL,
            message TEXT NOT NULL,
            github_profile TEXT,
            portfolio_link TEXT,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'approved', 'rejected')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL,
            user_name TEXT NOT NULL,
            message TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS project_ratings (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            rater_id TEXT NOT NULL,
            rated_user_id TEXT NOT NULL,
            rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
            feedback TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Uniqueness invariants. The pending-application index is partial so a
    // rejected applicant may apply again; the ratings index backstops the
    // check-then-insert race on concurrent submissions.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_applications_one_pending
            ON applications(project_id, applicant_id) WHERE status = 'pending';
        CREATE UNIQUE INDEX IF NOT EXISTS idx_ratings_one_per_pair
            ON project_ratings(project_id, rater_id, rated_user_id);
        CREATE INDEX IF NOT EXISTS idx_applications_project_status
            ON applications(project_id, status);
        CREATE INDEX IF NOT EXISTS idx_applications_applicant
            ON applications(applicant_id);
        CREATE INDEX IF NOT EXISTS idx_messages_project_created
            ON messages(project_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_ratings_rated_user
            ON project_ratings(rated_user_id);
        CREATE INDEX IF NOT EXISTS idx_projects_author
            ON projects(author_id);
        "#,
    )
    .execute(pool)
    .await?;

    // Aggregate view over ratings, recomputed by the database on read.
    sqlx::query(
        r#"
        CREATE VIEW IF NOT EXISTS user_rating_stats AS
        SELECT
            rated_user_id AS user_id,
            AVG(rating) AS average_rating,
            COUNT(*) AS total_ratings,
            SUM(rating = 1) AS one_star_count,
            SUM(rating = 2) AS two_star_count,
            SUM(rating = 3) AS three_star_count,
            SUM(rating = 4) AS four_star_count,
            SUM(rating = 5) AS five_star_count
        FROM project_ratings
        GROUP BY rated_user_id;
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
