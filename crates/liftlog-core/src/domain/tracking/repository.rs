//! Completed-workout repository
//!
//! Durable structured storage for finalized sessions: nested
//! workout/exercise/set records, date-sorted listing, aggregate statistics,
//! per-exercise progress, and sync bookkeeping.

use crate::domain::catalog::{ExerciseType, MuscleGroup};
use crate::domain::tracking::entity::{SetType, TrackedExercise, TrackedSet, TrackedWorkout};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

/// Aggregate statistics over a user's completed workouts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkoutStats {
    pub total_workouts: i64,
    pub total_sets: i64,
    pub total_reps: i64,
    /// Σ reps × weight over all sets
    pub total_volume: f64,
    pub count_by_template: HashMap<String, i64>,
}

/// One historical data point for an exercise: the best working set of an
/// occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressPoint {
    pub date: DateTime<Utc>,
    pub weight: f64,
    pub reps: u32,
}

/// Repository for completed-workout database operations
#[derive(Debug, Clone)]
pub struct WorkoutRepository {
    pool: SqlitePool,
}

impl WorkoutRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ========== CRUD ==========

    /// Persist a workout with all nested exercises and sets
    ///
    /// The whole write runs in one transaction; a partially stored workout is
    /// never observable.
    pub async fn insert(&self, workout: &TrackedWorkout) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO tracked_workouts (
                id, user_id, date, template_name, duration_secs,
                is_completed, start_time, end_time, synced_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL)
            "#,
        )
        .bind(workout.id.to_string())
        .bind(&workout.user_id)
        .bind(workout.date)
        .bind(&workout.template_name)
        .bind(workout.duration_secs)
        .bind(workout.is_completed)
        .bind(workout.start_time)
        .bind(workout.end_time)
        .execute(&mut *tx)
        .await?;

        for (position, exercise) in workout.tracked_exercises.iter().enumerate() {
            let muscle_groups = serde_json::to_string(&exercise.muscle_groups)
                .map_err(|e| Error::Parse(format!("Failed to encode muscle groups: {}", e)))?;

            sqlx::query(
                r#"
                INSERT INTO tracked_exercises (id, workout_id, exercise_name, muscle_groups, position)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(exercise.id.to_string())
            .bind(workout.id.to_string())
            .bind(&exercise.exercise_name)
            .bind(muscle_groups)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;

            for (set_position, set) in exercise.tracked_sets.iter().enumerate() {
                let type_groups = serde_json::to_string(&set.exercise_type.muscle_groups)
                    .map_err(|e| Error::Parse(format!("Failed to encode muscle groups: {}", e)))?;

                sqlx::query(
                    r#"
                    INSERT INTO tracked_sets (
                        id, exercise_id, reps, weight, set_type,
                        exercise_type_name, exercise_type_muscle_groups, position
                    )
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(set.id.to_string())
                .bind(exercise.id.to_string())
                .bind(i64::from(set.reps))
                .bind(set.weight)
                .bind(set.set_type.as_str())
                .bind(&set.exercise_type.name)
                .bind(type_groups)
                .bind(set_position as i64)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        info!(
            workout_id = %workout.id,
            template = %workout.template_name,
            sets = workout.total_sets(),
            "Workout saved"
        );
        Ok(())
    }

    /// Fetch all workouts for a user, most recent first
    ///
    /// `None` returns workouts regardless of user scope.
    pub async fn fetch_all(&self, user_id: Option<&str>) -> Result<Vec<TrackedWorkout>> {
        let rows: Vec<WorkoutRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, date, template_name, duration_secs,
                   is_completed, start_time, end_time
            FROM tracked_workouts
            WHERE (? IS NULL OR user_id = ?)
            ORDER BY date DESC
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut workouts = Vec::with_capacity(rows.len());
        for row in rows {
            workouts.push(self.load_nested(row).await?);
        }
        Ok(workouts)
    }

    /// Fetch a single workout by ID
    pub async fn fetch_by_id(&self, id: Uuid) -> Result<Option<TrackedWorkout>> {
        let row: Option<WorkoutRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, date, template_name, duration_secs,
                   is_completed, start_time, end_time
            FROM tracked_workouts
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_nested(row).await?)),
            None => Ok(None),
        }
    }

    /// Delete a workout by ID; nested records go with it via cascade
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tracked_workouts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ========== Statistics ==========

    /// Aggregate statistics over completed workouts
    pub async fn stats(&self, user_id: Option<&str>) -> Result<WorkoutStats> {
        let (total_workouts,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM tracked_workouts
            WHERE is_completed = 1 AND (? IS NULL OR user_id = ?)
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let (total_sets, total_reps, total_volume): (i64, i64, f64) = sqlx::query_as(
            r#"
            SELECT COUNT(s.id),
                   CAST(COALESCE(SUM(s.reps), 0) AS INTEGER),
                   CAST(COALESCE(SUM(s.reps * s.weight), 0) AS REAL)
            FROM tracked_sets s
            JOIN tracked_exercises e ON s.exercise_id = e.id
            JOIN tracked_workouts w ON e.workout_id = w.id
            WHERE w.is_completed = 1 AND (? IS NULL OR w.user_id = ?)
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let template_rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT template_name, COUNT(*)
            FROM tracked_workouts
            WHERE is_completed = 1 AND (? IS NULL OR user_id = ?)
            GROUP BY template_name
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(WorkoutStats {
            total_workouts,
            total_sets,
            total_reps,
            total_volume,
            count_by_template: template_rows.into_iter().collect(),
        })
    }

    /// Historical progress for an exercise, date ascending
    ///
    /// Each completed occurrence contributes its best working set by
    /// reps × weight; the comparison is strictly-greater, so equal volumes
    /// keep the first set seen. Occurrences with no working sets are omitted.
    pub async fn exercise_progress(&self, exercise_name: &str) -> Result<Vec<ProgressPoint>> {
        let occurrences: Vec<(String, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT e.id, w.date
            FROM tracked_exercises e
            JOIN tracked_workouts w ON e.workout_id = w.id
            WHERE e.exercise_name = ? AND w.is_completed = 1
            ORDER BY w.date ASC
            "#,
        )
        .bind(exercise_name)
        .fetch_all(&self.pool)
        .await?;

        let mut progress = Vec::new();
        for (exercise_id, date) in occurrences {
            let sets: Vec<(i64, f64)> = sqlx::query_as(
                r#"
                SELECT reps, weight
                FROM tracked_sets
                WHERE exercise_id = ? AND set_type = 'working'
                ORDER BY position ASC
                "#,
            )
            .bind(&exercise_id)
            .fetch_all(&self.pool)
            .await?;

            let mut best: Option<(f64, u32)> = None;
            for (reps, weight) in sets {
                let reps = reps.max(0) as u32;
                let volume = f64::from(reps) * weight;
                let beats = match best {
                    Some((best_weight, best_reps)) => volume > best_weight * f64::from(best_reps),
                    None => true,
                };
                if beats {
                    best = Some((weight, reps));
                }
            }

            if let Some((weight, reps)) = best {
                progress.push(ProgressPoint { date, weight, reps });
            }
        }

        Ok(progress)
    }

    // ========== Sync bookkeeping ==========

    /// Completed workouts never uploaded to the backend, oldest first
    pub async fn fetch_unsynced(&self, user_id: Option<&str>) -> Result<Vec<TrackedWorkout>> {
        let rows: Vec<WorkoutRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, date, template_name, duration_secs,
                   is_completed, start_time, end_time
            FROM tracked_workouts
            WHERE is_completed = 1 AND synced_at IS NULL AND (? IS NULL OR user_id = ?)
            ORDER BY date ASC
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut workouts = Vec::with_capacity(rows.len());
        for row in rows {
            workouts.push(self.load_nested(row).await?);
        }
        Ok(workouts)
    }

    /// Record the sync timestamp for the given workouts
    pub async fn mark_synced(&self, ids: &[Uuid], synced_at: DateTime<Utc>) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for id in ids {
            sqlx::query("UPDATE tracked_workouts SET synced_at = ? WHERE id = ?")
                .bind(synced_at)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// When a workout was last synced, if ever
    pub async fn synced_at(&self, id: Uuid) -> Result<Option<DateTime<Utc>>> {
        let row: Option<(Option<DateTime<Utc>>,)> =
            sqlx::query_as("SELECT synced_at FROM tracked_workouts WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.and_then(|(at,)| at))
    }

    // ========== Reconstruction ==========

    async fn load_nested(&self, row: WorkoutRow) -> Result<TrackedWorkout> {
        let exercise_rows: Vec<ExerciseRow> = sqlx::query_as(
            r#"
            SELECT id, exercise_name, muscle_groups
            FROM tracked_exercises
            WHERE workout_id = ?
            ORDER BY position ASC
            "#,
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let mut exercises = Vec::with_capacity(exercise_rows.len());
        for exercise_row in exercise_rows {
            let set_rows: Vec<SetRow> = sqlx::query_as(
                r#"
                SELECT id, reps, weight, set_type, exercise_type_name, exercise_type_muscle_groups
                FROM tracked_sets
                WHERE exercise_id = ?
                ORDER BY position ASC
                "#,
            )
            .bind(&exercise_row.id)
            .fetch_all(&self.pool)
            .await?;

            let sets = set_rows
                .into_iter()
                .map(SetRow::into_set)
                .collect::<Result<Vec<_>>>()?;
            exercises.push(exercise_row.into_exercise(sets)?);
        }

        row.into_workout(exercises)
    }
}

/// Decode a stored muscle-group list, silently dropping unrecognized tags
fn parse_muscle_tags(json: &str) -> Vec<MuscleGroup> {
    serde_json::from_str::<Vec<String>>(json)
        .unwrap_or_default()
        .iter()
        .filter_map(|tag| MuscleGroup::from_str(tag))
        .collect()
}

// ========== Database Row Types ==========

#[derive(sqlx::FromRow)]
struct WorkoutRow {
    id: String,
    user_id: Option<String>,
    date: DateTime<Utc>,
    template_name: String,
    duration_secs: Option<i64>,
    is_completed: bool,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
}

impl WorkoutRow {
    fn into_workout(self, tracked_exercises: Vec<TrackedExercise>) -> Result<TrackedWorkout> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Parse(format!("Invalid workout ID: {}", e)))?;

        Ok(TrackedWorkout {
            id,
            user_id: self.user_id,
            date: self.date,
            template_name: self.template_name,
            duration_secs: self.duration_secs,
            tracked_exercises,
            is_completed: self.is_completed,
            start_time: self.start_time,
            end_time: self.end_time,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ExerciseRow {
    id: String,
    exercise_name: String,
    muscle_groups: String,
}

impl ExerciseRow {
    fn into_exercise(self, tracked_sets: Vec<TrackedSet>) -> Result<TrackedExercise> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::Parse(format!("Invalid exercise ID: {}", e)))?;
        let muscle_groups = parse_muscle_tags(&self.muscle_groups)
            .iter()
            .map(|g| g.as_str().to_string())
            .collect();

        Ok(TrackedExercise {
            id,
            exercise_name: self.exercise_name,
            muscle_groups,
            tracked_sets,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SetRow {
    id: String,
    reps: i64,
    weight: f64,
    set_type: String,
    exercise_type_name: String,
    exercise_type_muscle_groups: String,
}

impl SetRow {
    fn into_set(self) -> Result<TrackedSet> {
        let id =
            Uuid::parse_str(&self.id).map_err(|e| Error::Parse(format!("Invalid set ID: {}", e)))?;
        let set_type = SetType::from_str(&self.set_type)
            .ok_or_else(|| Error::Parse(format!("Invalid set type: {}", self.set_type)))?;
        let muscle_groups = parse_muscle_tags(&self.exercise_type_muscle_groups);

        Ok(TrackedSet {
            id,
            reps: self.reps.max(0) as u32,
            weight: self.weight,
            set_type,
            exercise_type: ExerciseType::new(self.exercise_type_name, muscle_groups),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::builtin;
    use crate::storage::Database;
    use chrono::Duration;

    async fn create_test_repo() -> WorkoutRepository {
        let db = Database::in_memory()
            .await
            .expect("Failed to create test database");
        WorkoutRepository::new(db.pool().clone())
    }

    fn working_set(name: &str, reps: u32, weight: f64) -> TrackedSet {
        TrackedSet::new(
            reps,
            weight,
            SetType::Working,
            ExerciseType::new(name, vec![MuscleGroup::Chest]),
        )
    }

    fn warmup_set(name: &str, reps: u32, weight: f64) -> TrackedSet {
        TrackedSet::new(
            reps,
            weight,
            SetType::Warmup,
            ExerciseType::new(name, vec![MuscleGroup::Chest]),
        )
    }

    /// A completed push-day workout with the given sets on exercise 0
    fn completed_workout(sets: Vec<TrackedSet>) -> TrackedWorkout {
        let mut workout = TrackedWorkout::from_template(&builtin::push_day(), None);
        workout.tracked_exercises[0].tracked_sets = sets;
        workout.finish();
        workout
    }

    #[tokio::test]
    async fn test_insert_and_fetch_round_trip() {
        let repo = create_test_repo().await;

        let workout = completed_workout(vec![
            warmup_set("Barbell Bench Press", 10, 95.0),
            working_set("Barbell Bench Press", 8, 135.0),
        ]);
        repo.insert(&workout).await.expect("Failed to insert");

        let fetched = repo
            .fetch_by_id(workout.id)
            .await
            .expect("Failed to fetch")
            .expect("Workout not found");

        // Nested structure is reproduced exactly.
        assert_eq!(fetched, workout);
    }

    #[tokio::test]
    async fn test_fetch_all_sorted_by_date_descending() {
        let repo = create_test_repo().await;

        let mut old = completed_workout(vec![working_set("Barbell Bench Press", 8, 135.0)]);
        old.date = Utc::now() - Duration::days(7);
        let recent = completed_workout(vec![working_set("Barbell Bench Press", 8, 140.0)]);

        repo.insert(&old).await.unwrap();
        repo.insert(&recent).await.unwrap();

        let all = repo.fetch_all(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, recent.id);
        assert_eq!(all[1].id, old.id);
    }

    #[tokio::test]
    async fn test_fetch_all_scoped_by_user() {
        let repo = create_test_repo().await;

        let mut mine = completed_workout(vec![working_set("Barbell Bench Press", 8, 135.0)]);
        mine.user_id = Some("user-1".to_string());
        let mut theirs = completed_workout(vec![working_set("Barbell Bench Press", 8, 135.0)]);
        theirs.user_id = Some("user-2".to_string());

        repo.insert(&mine).await.unwrap();
        repo.insert(&theirs).await.unwrap();

        let scoped = repo.fetch_all(Some("user-1")).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].id, mine.id);

        let unscoped = repo.fetch_all(None).await.unwrap();
        assert_eq!(unscoped.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let repo = create_test_repo().await;

        let workout = completed_workout(vec![working_set("Barbell Bench Press", 8, 135.0)]);
        repo.insert(&workout).await.unwrap();

        assert!(repo.delete(workout.id).await.unwrap());
        assert!(repo.fetch_by_id(workout.id).await.unwrap().is_none());

        let (sets,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tracked_sets")
            .fetch_one(repo.pool())
            .await
            .unwrap();
        assert_eq!(sets, 0);

        // Deleting a missing workout reports false.
        assert!(!repo.delete(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_stats_volume_law() {
        let repo = create_test_repo().await;

        repo.insert(&completed_workout(vec![
            working_set("Barbell Bench Press", 8, 135.0),
            working_set("Barbell Bench Press", 6, 155.0),
        ]))
        .await
        .unwrap();
        repo.insert(&completed_workout(vec![warmup_set(
            "Barbell Bench Press",
            10,
            95.0,
        )]))
        .await
        .unwrap();

        let stats = repo.stats(None).await.unwrap();
        assert_eq!(stats.total_workouts, 2);
        assert_eq!(stats.total_sets, 3);
        assert_eq!(stats.total_reps, 8 + 6 + 10);
        // Volume counts every set, warm-ups included.
        assert_eq!(
            stats.total_volume,
            8.0 * 135.0 + 6.0 * 155.0 + 10.0 * 95.0
        );
        assert_eq!(
            stats.count_by_template.get("Push Day (Hypertrophy Focus)"),
            Some(&2)
        );
    }

    #[tokio::test]
    async fn test_stats_exclude_uncompleted() {
        let repo = create_test_repo().await;

        let mut unfinished = TrackedWorkout::from_template(&builtin::push_day(), None);
        unfinished.tracked_exercises[0]
            .tracked_sets
            .push(working_set("Barbell Bench Press", 8, 135.0));
        repo.insert(&unfinished).await.unwrap();

        let stats = repo.stats(None).await.unwrap();
        assert_eq!(stats.total_workouts, 0);
        assert_eq!(stats.total_volume, 0.0);
    }

    #[tokio::test]
    async fn test_exercise_progress_picks_best_working_set() {
        let repo = create_test_repo().await;

        // 8×100 = 800 beats 6×120 = 720.
        repo.insert(&completed_workout(vec![
            working_set("Barbell Bench Press", 8, 100.0),
            working_set("Barbell Bench Press", 6, 120.0),
        ]))
        .await
        .unwrap();

        let progress = repo.exercise_progress("Barbell Bench Press").await.unwrap();
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].weight, 100.0);
        assert_eq!(progress[0].reps, 8);
    }

    #[tokio::test]
    async fn test_exercise_progress_tie_keeps_first_seen() {
        let repo = create_test_repo().await;

        // Equal volumes: 10×100 = 8×125 = 1000. First seen wins.
        repo.insert(&completed_workout(vec![
            working_set("Barbell Bench Press", 10, 100.0),
            working_set("Barbell Bench Press", 8, 125.0),
        ]))
        .await
        .unwrap();

        let progress = repo.exercise_progress("Barbell Bench Press").await.unwrap();
        assert_eq!(progress.len(), 1);
        assert_eq!(progress[0].weight, 100.0);
        assert_eq!(progress[0].reps, 10);
    }

    #[tokio::test]
    async fn test_exercise_progress_ignores_warmups_and_sorts_ascending() {
        let repo = create_test_repo().await;

        let mut first = completed_workout(vec![
            warmup_set("Barbell Bench Press", 12, 45.0),
            working_set("Barbell Bench Press", 8, 135.0),
        ]);
        first.date = Utc::now() - Duration::days(14);
        let second = completed_workout(vec![working_set("Barbell Bench Press", 8, 145.0)]);
        // Warm-ups only: this occurrence is omitted entirely.
        let mut warmups_only = completed_workout(vec![warmup_set("Barbell Bench Press", 12, 45.0)]);
        warmups_only.date = Utc::now() - Duration::days(7);

        repo.insert(&second).await.unwrap();
        repo.insert(&first).await.unwrap();
        repo.insert(&warmups_only).await.unwrap();

        let progress = repo.exercise_progress("Barbell Bench Press").await.unwrap();
        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].weight, 135.0);
        assert_eq!(progress[1].weight, 145.0);
        assert!(progress[0].date < progress[1].date);
    }

    #[tokio::test]
    async fn test_unknown_muscle_tags_dropped_on_read() {
        let repo = create_test_repo().await;

        let workout = completed_workout(vec![working_set("Barbell Bench Press", 8, 135.0)]);
        repo.insert(&workout).await.unwrap();

        // Corrupt the stored tags with an unknown entry.
        sqlx::query("UPDATE tracked_exercises SET muscle_groups = ? WHERE workout_id = ?")
            .bind(r#"["chest", "wings"]"#)
            .bind(workout.id.to_string())
            .execute(repo.pool())
            .await
            .unwrap();

        let fetched = repo.fetch_by_id(workout.id).await.unwrap().unwrap();
        assert_eq!(
            fetched.tracked_exercises[0].muscle_groups,
            vec!["chest".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unsynced_tracking() {
        let repo = create_test_repo().await;

        let first = completed_workout(vec![working_set("Barbell Bench Press", 8, 135.0)]);
        let second = completed_workout(vec![working_set("Barbell Bench Press", 8, 140.0)]);
        repo.insert(&first).await.unwrap();
        repo.insert(&second).await.unwrap();

        let unsynced = repo.fetch_unsynced(None).await.unwrap();
        assert_eq!(unsynced.len(), 2);

        let now = Utc::now();
        repo.mark_synced(&[first.id], now).await.unwrap();

        let unsynced = repo.fetch_unsynced(None).await.unwrap();
        assert_eq!(unsynced.len(), 1);
        assert_eq!(unsynced[0].id, second.id);
        assert!(repo.synced_at(first.id).await.unwrap().is_some());
        assert!(repo.synced_at(second.id).await.unwrap().is_none());
    }
}
