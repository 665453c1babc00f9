//! Active-session store with crash recovery
//!
//! Holds zero-or-one active [`TrackedWorkout`] in memory and mirrors it to a
//! single durable slot on disk. Every mutation writes the full session state
//! synchronously; a periodic autosave task is a backstop against missed
//! writes, not the primary save path. On startup the slot is read back so a
//! force-quit loses at most the in-flight operation.

use crate::domain::catalog::Workout;
use crate::domain::tracking::entity::{SetType, TrackedExercise, TrackedSet, TrackedWorkout};
use crate::error::{Error, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default interval between periodic cache saves
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(10);

/// Durable single-slot storage for the active session
///
/// Absence of the file means "no active session". Writes go through a
/// temporary file and rename so a crash mid-write leaves the previous state
/// intact.
#[derive(Debug, Clone)]
pub struct SessionSlot {
    path: PathBuf,
}

impl SessionSlot {
    /// Create a slot backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the slot
    ///
    /// `Ok(None)` means the slot is empty; `Err` means the file exists but
    /// could not be read or decoded.
    pub fn load(&self) -> Result<Option<TrackedWorkout>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| Error::Parse(format!("Invalid workout cache: {}", e)))
    }

    /// Write the full session state to the slot
    pub fn save(&self, workout: &TrackedWorkout) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string(workout)
            .map_err(|e| Error::Parse(format!("Failed to encode workout: {}", e)))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Empty the slot; clearing an already-empty slot is not an error
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write the session to the slot, logging instead of propagating failures
///
/// The in-memory session stays authoritative; the next mutation or autosave
/// tick retries.
fn persist(slot: &SessionSlot, workout: &TrackedWorkout) {
    match slot.save(workout) {
        Ok(()) => debug!(workout_id = %workout.id, "Workout cached"),
        Err(error) => {
            warn!(workout_id = %workout.id, %error, "Failed to write workout cache")
        }
    }
}

/// Owner of the single active session
///
/// All mutations are serialized through one lock that is held across both the
/// in-memory change and its durable write, so the slot never lags behind
/// acknowledged state by more than the write in flight.
pub struct SessionStore {
    slot: SessionSlot,
    autosave_interval: Duration,
    state: Arc<Mutex<Option<TrackedWorkout>>>,
    autosave: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    /// Open the store, recovering any session left in the slot
    ///
    /// A non-completed cached session is adopted as the active session
    /// (backfilling its start time if absent). A completed session in the
    /// slot is a stale artifact and is cleared. Corrupt data is discarded and
    /// treated as "no active session". Must be called from within a Tokio
    /// runtime.
    pub fn open(path: impl Into<PathBuf>, autosave_interval: Duration) -> Self {
        let slot = SessionSlot::new(path);

        let recovered = match slot.load() {
            Ok(Some(mut workout)) if !workout.is_completed => {
                if workout.start_time.is_none() {
                    workout.start_time = Some(Utc::now());
                    persist(&slot, &workout);
                }
                info!(
                    workout_id = %workout.id,
                    template = %workout.template_name,
                    sets = workout.total_sets(),
                    "Recovered active workout from cache"
                );
                Some(workout)
            }
            Ok(Some(workout)) => {
                warn!(
                    workout_id = %workout.id,
                    "Completed workout found in cache, clearing stale entry"
                );
                if let Err(error) = slot.clear() {
                    warn!(%error, "Failed to clear stale workout cache");
                }
                None
            }
            Ok(None) => None,
            Err(error) => {
                warn!(%error, "Discarding corrupt workout cache");
                if let Err(error) = slot.clear() {
                    warn!(%error, "Failed to clear corrupt workout cache");
                }
                None
            }
        };

        let store = Self {
            slot,
            autosave_interval,
            state: Arc::new(Mutex::new(recovered)),
            autosave: std::sync::Mutex::new(None),
        };

        store.start_autosave_if_active();
        store
    }

    /// Whether a session is currently active
    pub async fn is_active(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// Snapshot of the active session, if any
    pub async fn active(&self) -> Option<TrackedWorkout> {
        self.state.lock().await.clone()
    }

    /// Start a new session from a template
    ///
    /// Rejected with [`Error::WorkoutInProgress`] while another session is
    /// active; callers wanting discard-and-restart go through [`Self::abandon`]
    /// first.
    pub async fn start(
        &self,
        template: &Workout,
        user_id: Option<String>,
    ) -> Result<TrackedWorkout> {
        let mut guard = self.state.lock().await;
        if guard.is_some() {
            return Err(Error::WorkoutInProgress);
        }

        let workout = TrackedWorkout::from_template(template, user_id);
        persist(&self.slot, &workout);
        *guard = Some(workout.clone());
        drop(guard);

        self.start_autosave();
        info!(
            workout_id = %workout.id,
            template = %workout.template_name,
            exercises = workout.tracked_exercises.len(),
            "Workout started"
        );
        Ok(workout)
    }

    /// Append a set to the exercise at `exercise_index`
    ///
    /// Out-of-range indices and negative weights are logged no-ops.
    pub async fn append_set(&self, exercise_index: usize, set: TrackedSet) {
        if set.weight.is_sign_negative() {
            warn!(exercise_index, weight = set.weight, "Ignoring set with negative weight");
            return;
        }

        let mut guard = self.state.lock().await;
        let Some(workout) = guard.as_mut() else {
            warn!("No active workout, ignoring appended set");
            return;
        };
        let Some(exercise) = workout.tracked_exercises.get_mut(exercise_index) else {
            warn!(exercise_index, "Exercise index out of range, ignoring appended set");
            return;
        };

        exercise.tracked_sets.push(set);
        persist(&self.slot, workout);
    }

    /// Replace the reps/weight/type of the set at the given position,
    /// preserving its identity
    pub async fn update_set(
        &self,
        exercise_index: usize,
        set_index: usize,
        reps: u32,
        weight: f64,
        set_type: SetType,
    ) {
        if weight.is_sign_negative() {
            warn!(exercise_index, set_index, weight, "Ignoring update with negative weight");
            return;
        }

        let mut guard = self.state.lock().await;
        let Some(workout) = guard.as_mut() else {
            warn!("No active workout, ignoring set update");
            return;
        };
        let Some(set) = workout
            .tracked_exercises
            .get_mut(exercise_index)
            .and_then(|e| e.tracked_sets.get_mut(set_index))
        else {
            warn!(exercise_index, set_index, "Set index out of range, ignoring update");
            return;
        };

        set.reps = reps;
        set.weight = weight;
        set.set_type = set_type;
        persist(&self.slot, workout);
    }

    /// Remove the set at the given position
    pub async fn remove_set(&self, exercise_index: usize, set_index: usize) {
        let mut guard = self.state.lock().await;
        let Some(workout) = guard.as_mut() else {
            warn!("No active workout, ignoring set removal");
            return;
        };
        let Some(exercise) = workout.tracked_exercises.get_mut(exercise_index) else {
            warn!(exercise_index, "Exercise index out of range, ignoring set removal");
            return;
        };
        if set_index >= exercise.tracked_sets.len() {
            warn!(exercise_index, set_index, "Set index out of range, ignoring set removal");
            return;
        }

        exercise.tracked_sets.remove(set_index);
        persist(&self.slot, workout);
    }

    /// Replace the exercise at `index` wholesale (sub-editor commit)
    pub async fn replace_exercise(&self, index: usize, exercise: TrackedExercise) {
        let mut guard = self.state.lock().await;
        let Some(workout) = guard.as_mut() else {
            warn!("No active workout, ignoring exercise replacement");
            return;
        };
        let Some(target) = workout.tracked_exercises.get_mut(index) else {
            warn!(index, "Exercise index out of range, ignoring replacement");
            return;
        };

        *target = exercise;
        persist(&self.slot, workout);
    }

    /// Finalize and hand back the active session
    ///
    /// Returns `None` when no session is active. The autosave task is stopped
    /// and the slot cleared; ownership of the finished workout transfers to
    /// the caller.
    pub async fn end(&self) -> Option<TrackedWorkout> {
        let mut guard = self.state.lock().await;
        let mut workout = guard.take()?;

        workout.finish();
        self.stop_autosave();
        // Clear while still holding the lock: a concurrent start() must not
        // persist before this session's slot is gone.
        if let Err(error) = self.slot.clear() {
            warn!(%error, "Failed to clear workout cache");
        }
        drop(guard);

        info!(
            workout_id = %workout.id,
            duration_secs = workout.duration_secs.unwrap_or(0),
            sets = workout.total_sets(),
            "Workout ended"
        );
        Some(workout)
    }

    /// Discard the active session without finalizing it
    pub async fn abandon(&self) -> Option<TrackedWorkout> {
        let mut guard = self.state.lock().await;
        let workout = guard.take()?;

        self.stop_autosave();
        if let Err(error) = self.slot.clear() {
            warn!(%error, "Failed to clear workout cache");
        }
        drop(guard);

        info!(workout_id = %workout.id, "Workout abandoned");
        Some(workout)
    }

    fn start_autosave_if_active(&self) {
        let active = self
            .state
            .try_lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false);
        if active {
            self.start_autosave();
        }
    }

    fn start_autosave(&self) {
        let slot = self.slot.clone();
        let state = Arc::clone(&self.state);
        let interval = self.autosave_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick of a tokio interval fires immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let guard = state.lock().await;
                if let Some(workout) = guard.as_ref() {
                    persist(&slot, workout);
                }
            }
        });

        let mut autosave = self.autosave.lock().expect("autosave lock poisoned");
        if let Some(old) = autosave.replace(handle) {
            old.abort();
        }
    }

    fn stop_autosave(&self) {
        if let Some(handle) = self
            .autosave
            .lock()
            .expect("autosave lock poisoned")
            .take()
        {
            handle.abort();
        }
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.stop_autosave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{builtin, ExerciseType, MuscleGroup};
    use tempfile::TempDir;

    fn slot_path(dir: &TempDir) -> PathBuf {
        dir.path().join("active_workout.json")
    }

    fn open_store(dir: &TempDir) -> SessionStore {
        SessionStore::open(slot_path(dir), DEFAULT_AUTOSAVE_INTERVAL)
    }

    fn working_set(reps: u32, weight: f64) -> TrackedSet {
        TrackedSet::new(
            reps,
            weight,
            SetType::Working,
            ExerciseType::new("Barbell Bench Press", vec![MuscleGroup::Chest]),
        )
    }

    #[tokio::test]
    async fn test_start_creates_session_and_persists() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let workout = store.start(&builtin::push_day(), None).await.unwrap();

        assert!(store.is_active().await);
        assert!(slot_path(&dir).exists());
        assert_eq!(store.active().await.unwrap().id, workout.id);
    }

    #[tokio::test]
    async fn test_start_rejects_while_active() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store.start(&builtin::push_day(), None).await.unwrap();
        let second = store.start(&builtin::pull_day(), None).await;

        assert!(matches!(second, Err(Error::WorkoutInProgress)));
        // The original session is untouched.
        assert_eq!(
            store.active().await.unwrap().template_name,
            "Push Day (Hypertrophy Focus)"
        );
    }

    #[tokio::test]
    async fn test_append_update_remove_set() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.start(&builtin::push_day(), None).await.unwrap();

        store.append_set(0, working_set(8, 135.0)).await;
        store.append_set(0, working_set(6, 155.0)).await;

        let active = store.active().await.unwrap();
        assert_eq!(active.tracked_exercises[0].tracked_sets.len(), 2);
        let original_id = active.tracked_exercises[0].tracked_sets[0].id;

        // Update preserves the set's identity
        store.update_set(0, 0, 10, 140.0, SetType::Working).await;
        let active = store.active().await.unwrap();
        let updated = &active.tracked_exercises[0].tracked_sets[0];
        assert_eq!(updated.id, original_id);
        assert_eq!(updated.reps, 10);
        assert_eq!(updated.weight, 140.0);

        store.remove_set(0, 1).await;
        let active = store.active().await.unwrap();
        assert_eq!(active.tracked_exercises[0].tracked_sets.len(), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_indices_are_noops() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.start(&builtin::push_day(), None).await.unwrap();
        store.append_set(0, working_set(8, 135.0)).await;

        let before = store.active().await.unwrap();

        store.append_set(99, working_set(5, 100.0)).await;
        store.update_set(0, 99, 5, 100.0, SetType::Working).await;
        store.update_set(99, 0, 5, 100.0, SetType::Working).await;
        store.remove_set(0, 99).await;
        store.remove_set(99, 0).await;
        store
            .replace_exercise(
                99,
                TrackedExercise {
                    id: uuid::Uuid::new_v4(),
                    exercise_name: "Nope".to_string(),
                    muscle_groups: vec![],
                    tracked_sets: vec![],
                },
            )
            .await;

        assert_eq!(store.active().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_negative_weight_is_noop() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.start(&builtin::push_day(), None).await.unwrap();

        store.append_set(0, working_set(8, -10.0)).await;
        assert_eq!(store.active().await.unwrap().total_sets(), 0);
    }

    #[tokio::test]
    async fn test_replace_exercise() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.start(&builtin::push_day(), None).await.unwrap();

        let mut replacement = store.active().await.unwrap().tracked_exercises[1].clone();
        replacement.tracked_sets.push(working_set(12, 40.0));
        replacement.tracked_sets.push(working_set(10, 45.0));

        store.replace_exercise(1, replacement.clone()).await;

        let active = store.active().await.unwrap();
        assert_eq!(active.tracked_exercises[1], replacement);
    }

    #[tokio::test]
    async fn test_end_clears_slot_and_finalizes() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.start(&builtin::push_day(), None).await.unwrap();
        store.append_set(0, working_set(8, 135.0)).await;

        let finished = store.end().await.unwrap();

        assert!(finished.is_completed);
        assert!(finished.end_time.is_some());
        assert!(finished.duration_secs.is_some());
        assert!(!store.is_active().await);
        assert!(!slot_path(&dir).exists());

        // Ending again returns None.
        assert!(store.end().await.is_none());
    }

    #[tokio::test]
    async fn test_recovery_after_simulated_crash() {
        let dir = TempDir::new().unwrap();
        let started = {
            let store = open_store(&dir);
            let workout = store.start(&builtin::push_day(), None).await.unwrap();
            store.append_set(0, working_set(8, 135.0)).await;
            store.append_set(0, working_set(6, 155.0)).await;
            // Store dropped without end(): simulates a force-quit.
            workout.id
        };

        let store = open_store(&dir);
        let recovered = store.active().await.expect("session should be recovered");

        assert_eq!(recovered.id, started);
        assert!(!recovered.is_completed);
        assert_eq!(recovered.tracked_exercises[0].tracked_sets.len(), 2);
        assert_eq!(recovered.tracked_exercises[0].tracked_sets[0].reps, 8);
        assert_eq!(recovered.tracked_exercises[0].tracked_sets[1].weight, 155.0);
    }

    #[tokio::test]
    async fn test_recovery_is_deep_equal() {
        let dir = TempDir::new().unwrap();
        let persisted = {
            let store = open_store(&dir);
            store.start(&builtin::pull_day(), Some("user-1".to_string())).await.unwrap();
            store.append_set(2, working_set(10, 120.0)).await;
            store.active().await.unwrap()
        };

        let store = open_store(&dir);
        let recovered = store.active().await.unwrap();

        // start_time was present, so nothing is backfilled: full deep equality.
        assert_eq!(recovered, persisted);
    }

    #[tokio::test]
    async fn test_recovery_backfills_missing_start_time() {
        let dir = TempDir::new().unwrap();
        let slot = SessionSlot::new(slot_path(&dir));

        let mut workout = TrackedWorkout::from_template(&builtin::push_day(), None);
        workout.start_time = None;
        slot.save(&workout).unwrap();

        let store = open_store(&dir);
        let recovered = store.active().await.unwrap();
        assert!(recovered.start_time.is_some());
    }

    #[tokio::test]
    async fn test_completed_workout_in_slot_is_cleared() {
        let dir = TempDir::new().unwrap();
        let slot = SessionSlot::new(slot_path(&dir));

        let mut workout = TrackedWorkout::from_template(&builtin::push_day(), None);
        workout.finish();
        slot.save(&workout).unwrap();

        let store = open_store(&dir);
        assert!(!store.is_active().await);
        assert!(!slot_path(&dir).exists());
    }

    #[tokio::test]
    async fn test_corrupt_slot_is_discarded() {
        let dir = TempDir::new().unwrap();
        std::fs::write(slot_path(&dir), "not json {{{").unwrap();

        let store = open_store(&dir);
        assert!(!store.is_active().await);
        assert!(!slot_path(&dir).exists());

        // A fresh session can be started afterwards.
        assert!(store.start(&builtin::push_day(), None).await.is_ok());
    }

    #[tokio::test]
    async fn test_abandon_discards_without_finalizing() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.start(&builtin::push_day(), None).await.unwrap();
        store.append_set(0, working_set(8, 135.0)).await;

        let abandoned = store.abandon().await.unwrap();

        assert!(!abandoned.is_completed);
        assert!(!store.is_active().await);
        assert!(!slot_path(&dir).exists());
    }

    #[tokio::test]
    async fn test_autosave_writes_on_tick() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::open(slot_path(&dir), Duration::from_millis(20));
        store.start(&builtin::push_day(), None).await.unwrap();

        // Remove the slot file behind the store's back; the autosave backstop
        // should restore it on a later tick.
        std::fs::remove_file(slot_path(&dir)).unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(slot_path(&dir).exists());
    }
}
