//! Workout manager orchestrating the tracking lifecycle
//!
//! The sole entry point callers use. Composes the session store, the
//! completed-workout repository and the sync client, and maintains a derived
//! snapshot (active session, recent history, aggregate stats) for display.
//! All mutations route through the store; the snapshot is read-only state.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::catalog::Workout;
use crate::domain::tracking::entity::{SetType, TrackedExercise, TrackedSet, TrackedWorkout};
use crate::domain::tracking::event::{Subscribers, WorkoutEvent};
use crate::domain::tracking::repository::{ProgressPoint, WorkoutRepository, WorkoutStats};
use crate::domain::tracking::store::SessionStore;
use crate::error::{Error, Result};
use crate::sync::SyncClient;

/// Derived, observable state
#[derive(Debug, Clone, Default)]
struct Snapshot {
    active: Option<TrackedWorkout>,
    recent: Vec<TrackedWorkout>,
    stats: WorkoutStats,
}

/// Orchestrator for the active session, completed history, and sync
pub struct WorkoutManager {
    user_id: Option<String>,
    store: SessionStore,
    repository: WorkoutRepository,
    sync: Option<Arc<SyncClient>>,
    snapshot: RwLock<Snapshot>,
    subscribers: Subscribers,
}

impl WorkoutManager {
    /// Create a new manager and load its initial state
    ///
    /// Adopts any session the store recovered on startup and populates the
    /// completed-workout snapshot from the repository.
    pub async fn new(
        store: SessionStore,
        repository: WorkoutRepository,
        sync: Option<Arc<SyncClient>>,
        user_id: Option<String>,
    ) -> Result<Self> {
        let manager = Self {
            user_id,
            store,
            repository,
            sync,
            snapshot: RwLock::new(Snapshot::default()),
            subscribers: Subscribers::new(),
        };

        let active = manager.store.active().await;
        manager.snapshot.write().await.active = active;
        manager.refresh_completed().await?;

        Ok(manager)
    }

    /// Register an observer; events are delivered synchronously with the
    /// mutation that caused them
    pub fn subscribe(&self, subscriber: impl Fn(&WorkoutEvent) + Send + Sync + 'static) {
        self.subscribers.subscribe(subscriber);
    }

    // ========== Observable state ==========

    /// Whether a session is in progress
    pub async fn is_session_active(&self) -> bool {
        self.snapshot.read().await.active.is_some()
    }

    /// The active session, if any
    pub async fn active_session(&self) -> Option<TrackedWorkout> {
        self.snapshot.read().await.active.clone()
    }

    /// Completed sessions, most recent first
    pub async fn recent_sessions(&self) -> Vec<TrackedWorkout> {
        self.snapshot.read().await.recent.clone()
    }

    /// Aggregate statistics over completed sessions
    pub async fn stats(&self) -> WorkoutStats {
        self.snapshot.read().await.stats.clone()
    }

    // ========== Session lifecycle ==========

    /// Start a session from a template
    pub async fn start_workout(&self, template: &Workout) -> Result<TrackedWorkout> {
        let workout = self.store.start(template, self.user_id.clone()).await?;
        self.snapshot.write().await.active = Some(workout.clone());
        self.subscribers.notify(&WorkoutEvent::SessionStarted {
            workout_id: workout.id,
            template_name: workout.template_name.clone(),
        });
        Ok(workout)
    }

    /// Append a set to an exercise of the active session
    pub async fn log_set(&self, exercise_index: usize, set: TrackedSet) {
        self.store.append_set(exercise_index, set).await;
        if let (Some(workout_id), true) = self.refresh_active().await {
            self.subscribers.notify(&WorkoutEvent::SetLogged {
                workout_id,
                exercise_index,
            });
        }
    }

    /// Update a set in place
    pub async fn update_set(
        &self,
        exercise_index: usize,
        set_index: usize,
        reps: u32,
        weight: f64,
        set_type: SetType,
    ) {
        self.store
            .update_set(exercise_index, set_index, reps, weight, set_type)
            .await;
        if let (Some(workout_id), true) = self.refresh_active().await {
            self.subscribers.notify(&WorkoutEvent::SetUpdated {
                workout_id,
                exercise_index,
                set_index,
            });
        }
    }

    /// Remove a set
    pub async fn remove_set(&self, exercise_index: usize, set_index: usize) {
        self.store.remove_set(exercise_index, set_index).await;
        if let (Some(workout_id), true) = self.refresh_active().await {
            self.subscribers.notify(&WorkoutEvent::SetRemoved {
                workout_id,
                exercise_index,
                set_index,
            });
        }
    }

    /// Replace an exercise wholesale after a sub-editor commit
    pub async fn update_exercise(&self, index: usize, exercise: TrackedExercise) {
        self.store.replace_exercise(index, exercise).await;
        if let (Some(workout_id), true) = self.refresh_active().await {
            self.subscribers.notify(&WorkoutEvent::ExerciseReplaced {
                workout_id,
                exercise_index: index,
            });
        }
    }

    /// End the active session
    ///
    /// The finalized workout is written to the repository before the
    /// active-session state clears, so observers never see "no active
    /// workout" ahead of durable storage. Remote sync runs afterwards on its
    /// own task against an owned snapshot and cannot touch a later session.
    pub async fn end_workout(&self) -> Result<TrackedWorkout> {
        let finished = self.store.end().await.ok_or(Error::NoActiveWorkout)?;

        self.repository.insert(&finished).await?;
        self.snapshot.write().await.active = None;
        self.subscribers.notify(&WorkoutEvent::SessionEnded {
            workout_id: finished.id,
        });

        if let Some(sync) = &self.sync {
            let sync = Arc::clone(sync);
            let repository = self.repository.clone();
            let upload = finished.clone();
            tokio::spawn(async move {
                match sync.sync_workout(&upload).await {
                    Ok(outcome) => {
                        if let Err(error) =
                            repository.mark_synced(&[upload.id], outcome.synced_at).await
                        {
                            warn!(workout_id = %upload.id, %error, "Failed to record sync timestamp");
                        } else {
                            info!(workout_id = %upload.id, "Workout synced");
                        }
                    }
                    Err(error) => {
                        warn!(
                            workout_id = %upload.id,
                            code = error.code(),
                            retryable = error.is_retryable_sync(),
                            %error,
                            "Workout sync failed, eligible for next pending sync"
                        );
                    }
                }
            });
        }

        self.refresh_completed().await?;
        Ok(finished)
    }

    /// Discard the active session without storing it
    pub async fn abandon_workout(&self) -> Option<TrackedWorkout> {
        let abandoned = self.store.abandon().await?;
        self.snapshot.write().await.active = None;
        self.subscribers.notify(&WorkoutEvent::SessionAbandoned {
            workout_id: abandoned.id,
        });
        Some(abandoned)
    }

    // ========== Completed-workout operations ==========

    /// Delete a completed workout
    pub async fn delete_completed(&self, id: Uuid) -> Result<bool> {
        let deleted = self.repository.delete(id).await?;
        if deleted {
            self.subscribers
                .notify(&WorkoutEvent::WorkoutDeleted { workout_id: id });
            self.refresh_completed().await?;
        }
        Ok(deleted)
    }

    /// Fetch a completed workout by ID
    pub async fn completed_workout(&self, id: Uuid) -> Result<Option<TrackedWorkout>> {
        self.repository.fetch_by_id(id).await
    }

    /// Historical best-set progress for an exercise
    pub async fn exercise_progress(&self, exercise_name: &str) -> Result<Vec<ProgressPoint>> {
        self.repository.exercise_progress(exercise_name).await
    }

    /// Upload every completed workout not yet marked synced
    ///
    /// Returns the number of workouts uploaded. Typed sync errors propagate;
    /// local records are untouched on failure.
    pub async fn sync_pending(&self) -> Result<usize> {
        let Some(sync) = &self.sync else {
            return Err(Error::Config("No sync backend configured".to_string()));
        };

        let pending = self.repository.fetch_unsynced(self.user_id.as_deref()).await?;
        if pending.is_empty() {
            info!("No workouts pending sync");
            return Ok(0);
        }

        let outcome = sync.sync_batch(&pending).await?;
        let ids: Vec<Uuid> = pending.iter().map(|w| w.id).collect();
        self.repository.mark_synced(&ids, outcome.synced_at).await?;

        info!(count = pending.len(), "Pending workouts synced");
        Ok(pending.len())
    }

    // ========== Derived analytics ==========

    /// Completed-session volume bucketed by calendar day over the trailing
    /// window, ascending by date
    pub async fn volume_by_day(&self, window_days: i64) -> Vec<(NaiveDate, f64)> {
        let cutoff = Utc::now() - chrono::Duration::days(window_days);
        let snapshot = self.snapshot.read().await;

        let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for workout in snapshot.recent.iter().filter(|w| w.date >= cutoff) {
            *by_day.entry(workout.date.date_naive()).or_insert(0.0) += workout.volume();
        }
        by_day.into_iter().collect()
    }

    /// Exercise names ranked by total volume across completed sessions
    pub async fn top_exercises_by_volume(&self, limit: usize) -> Vec<(String, f64)> {
        let snapshot = self.snapshot.read().await;

        let mut volumes: HashMap<String, f64> = HashMap::new();
        for workout in &snapshot.recent {
            for exercise in &workout.tracked_exercises {
                *volumes.entry(exercise.exercise_name.clone()).or_insert(0.0) +=
                    exercise.volume();
            }
        }

        let mut ranked: Vec<(String, f64)> = volumes.into_iter().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked.truncate(limit);
        ranked
    }

    // ========== Internal state maintenance ==========

    /// Re-read the active session from the store
    ///
    /// Returns the active workout id and whether the snapshot changed, so
    /// no-op mutations (out-of-range indices) emit no events.
    async fn refresh_active(&self) -> (Option<Uuid>, bool) {
        let active = self.store.active().await;
        let id = active.as_ref().map(|w| w.id);
        let mut snapshot = self.snapshot.write().await;
        let changed = snapshot.active != active;
        snapshot.active = active;
        (id, changed)
    }

    /// Reload the completed list and aggregate stats from the repository
    async fn refresh_completed(&self) -> Result<()> {
        let user_id = self.user_id.as_deref();
        let recent: Vec<TrackedWorkout> = self
            .repository
            .fetch_all(user_id)
            .await?
            .into_iter()
            .filter(|w| w.is_completed)
            .collect();
        let stats = self.repository.stats(user_id).await?;

        let mut snapshot = self.snapshot.write().await;
        snapshot.recent = recent;
        snapshot.stats = stats;
        Ok(())
    }
}

impl std::fmt::Debug for WorkoutManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkoutManager")
            .field("user_id", &self.user_id)
            .field("sync", &self.sync.is_some())
            .finish()
    }
}
