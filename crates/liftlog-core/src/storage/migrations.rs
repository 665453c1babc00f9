//! Schema migrations for the workout database
//!
//! Raw-SQL migrations applied in order at connection time. Applied versions
//! are tracked in a `_migrations` table; each migration commits atomically
//! together with its bookkeeping row.

use sqlx::SqlitePool;
use tracing::{debug, info};

/// Version an up-to-date database reports
pub const CURRENT_VERSION: i32 = 2;

/// A single schema change
struct Migration {
    version: i32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    // One record per completed workout, with one-to-many exercise and set
    // records. Muscle-group tags are JSON string arrays reinflated on read;
    // `position` columns preserve insertion order.
    Migration {
        version: 1,
        name: "workout tracking schema",
        sql: r#"
            CREATE TABLE IF NOT EXISTS tracked_workouts (
                id TEXT PRIMARY KEY NOT NULL,
                user_id TEXT,
                date TIMESTAMP NOT NULL,
                template_name TEXT NOT NULL,
                duration_secs INTEGER,
                is_completed INTEGER NOT NULL DEFAULT 0,
                start_time TIMESTAMP,
                end_time TIMESTAMP,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_tracked_workouts_date ON tracked_workouts(date);
            CREATE INDEX IF NOT EXISTS idx_tracked_workouts_user_id ON tracked_workouts(user_id);
            CREATE INDEX IF NOT EXISTS idx_tracked_workouts_is_completed ON tracked_workouts(is_completed);

            CREATE TABLE IF NOT EXISTS tracked_exercises (
                id TEXT PRIMARY KEY NOT NULL,
                workout_id TEXT NOT NULL REFERENCES tracked_workouts(id) ON DELETE CASCADE,
                exercise_name TEXT NOT NULL,
                muscle_groups TEXT NOT NULL DEFAULT '[]',
                position INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_tracked_exercises_workout_id ON tracked_exercises(workout_id);
            CREATE INDEX IF NOT EXISTS idx_tracked_exercises_exercise_name ON tracked_exercises(exercise_name);

            CREATE TABLE IF NOT EXISTS tracked_sets (
                id TEXT PRIMARY KEY NOT NULL,
                exercise_id TEXT NOT NULL REFERENCES tracked_exercises(id) ON DELETE CASCADE,
                reps INTEGER NOT NULL DEFAULT 0,
                weight REAL NOT NULL DEFAULT 0.0,
                set_type TEXT NOT NULL CHECK (set_type IN ('warmup', 'working')),
                exercise_type_name TEXT NOT NULL,
                exercise_type_muscle_groups TEXT NOT NULL DEFAULT '[]',
                position INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_tracked_sets_exercise_id ON tracked_sets(exercise_id);
        "#,
    },
    // NULL synced_at means the workout has never been uploaded and is
    // eligible for the next batch sync.
    Migration {
        version: 2,
        name: "sync tracking",
        sql: r#"
            ALTER TABLE tracked_workouts ADD COLUMN synced_at TIMESTAMP;

            CREATE INDEX IF NOT EXISTS idx_tracked_workouts_synced_at ON tracked_workouts(synced_at);
        "#,
    },
];

/// The schema version currently applied to the database
pub async fn schema_version(pool: &SqlitePool) -> anyhow::Result<i32> {
    sqlx::raw_sql(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY NOT NULL,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    let (version,): (Option<i32>,) = sqlx::query_as("SELECT MAX(version) FROM _migrations")
        .fetch_one(pool)
        .await?;
    Ok(version.unwrap_or(0))
}

/// Apply every migration newer than the database's current version
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    let applied = schema_version(pool).await?;
    if applied >= CURRENT_VERSION {
        debug!(version = applied, "Database schema is up to date");
        return Ok(());
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        let mut tx = pool.begin().await?;
        sqlx::raw_sql(migration.sql).execute(&mut *tx).await?;
        sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
            .bind(migration.version)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
    }

    info!(version = CURRENT_VERSION, "Database migrations completed");
    Ok(())
}
