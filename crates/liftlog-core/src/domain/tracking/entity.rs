//! Tracked-session entities
//!
//! A `TrackedWorkout` is created from a template, mutated through the session
//! store while active, and becomes immutable once completed.

use crate::domain::catalog::{ExerciseType, Workout};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Whether a set counts toward effort or is preparatory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetType {
    Warmup,
    Working,
}

impl SetType {
    /// Create from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "warmup" => Some(Self::Warmup),
            "working" => Some(Self::Working),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warmup => "warmup",
            Self::Working => "working",
        }
    }
}

impl fmt::Display for SetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single logged set
///
/// Equality is full-field, including `set_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedSet {
    pub id: Uuid,
    pub reps: u32,
    pub weight: f64,
    pub set_type: SetType,
    pub exercise_type: ExerciseType,
}

impl TrackedSet {
    /// Create a new tracked set
    pub fn new(reps: u32, weight: f64, set_type: SetType, exercise_type: ExerciseType) -> Self {
        Self {
            id: Uuid::new_v4(),
            reps,
            weight,
            set_type,
            exercise_type,
        }
    }

    /// Effort volume of this set: reps × weight
    pub fn volume(&self) -> f64 {
        f64::from(self.reps) * self.weight
    }
}

/// One exercise within a tracked session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedExercise {
    pub id: Uuid,
    pub exercise_name: String,
    /// Muscle-group tags, kept as strings for storage round-trips
    pub muscle_groups: Vec<String>,
    pub tracked_sets: Vec<TrackedSet>,
}

impl TrackedExercise {
    /// An exercise counts as completed once any set is logged
    pub fn is_completed(&self) -> bool {
        !self.tracked_sets.is_empty()
    }

    /// Summed volume of all sets
    pub fn volume(&self) -> f64 {
        self.tracked_sets.iter().map(TrackedSet::volume).sum()
    }
}

/// A workout session, active or completed
///
/// The exercise list mirrors the template's order and never changes length
/// after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedWorkout {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub date: DateTime<Utc>,
    pub template_name: String,
    /// Duration in seconds, set when the session ends
    pub duration_secs: Option<i64>,
    pub tracked_exercises: Vec<TrackedExercise>,
    pub is_completed: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl TrackedWorkout {
    /// Seed a new session from a workout template
    ///
    /// One tracked exercise per template exercise, in template order, with no
    /// sets logged yet.
    pub fn from_template(template: &Workout, user_id: Option<String>) -> Self {
        let now = Utc::now();
        let tracked_exercises = template
            .exercises
            .iter()
            .map(|exercise| TrackedExercise {
                id: Uuid::new_v4(),
                exercise_name: exercise.exercise_type.name.clone(),
                muscle_groups: exercise
                    .exercise_type
                    .muscle_groups
                    .iter()
                    .map(|g| g.as_str().to_string())
                    .collect(),
                tracked_sets: Vec::new(),
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            user_id,
            date: now,
            template_name: template.name.clone(),
            duration_secs: None,
            tracked_exercises,
            is_completed: false,
            start_time: Some(now),
            end_time: None,
        }
    }

    /// Finalize the session: mark completed, stamp the end time, compute
    /// duration from the start time if one is present
    pub fn finish(&mut self) {
        let now = Utc::now();
        self.is_completed = true;
        self.end_time = Some(now);
        if let Some(start) = self.start_time {
            self.duration_secs = Some((now - start).num_seconds());
        }
    }

    /// Summed volume across all exercises
    pub fn volume(&self) -> f64 {
        self.tracked_exercises.iter().map(TrackedExercise::volume).sum()
    }

    /// Total number of logged sets
    pub fn total_sets(&self) -> usize {
        self.tracked_exercises
            .iter()
            .map(|e| e.tracked_sets.len())
            .sum()
    }

    /// Total reps across all sets
    pub fn total_reps(&self) -> u64 {
        self.tracked_exercises
            .iter()
            .flat_map(|e| e.tracked_sets.iter())
            .map(|s| u64::from(s.reps))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::builtin;
    use crate::domain::catalog::MuscleGroup;

    fn bench_press() -> ExerciseType {
        ExerciseType::new("Barbell Bench Press", vec![MuscleGroup::Chest])
    }

    #[test]
    fn test_set_type_round_trip() {
        assert_eq!(SetType::from_str("warmup"), Some(SetType::Warmup));
        assert_eq!(SetType::from_str("WORKING"), Some(SetType::Working));
        assert_eq!(SetType::from_str("dropset"), None);
        assert_eq!(SetType::Working.as_str(), "working");
    }

    #[test]
    fn test_set_equality_includes_set_type() {
        // Equality is full-field: two sets differing only in set_type are
        // distinct sets.
        let working = TrackedSet::new(8, 135.0, SetType::Working, bench_press());
        let mut warmup = working.clone();
        warmup.set_type = SetType::Warmup;

        assert_ne!(working, warmup);
        assert_eq!(working, working.clone());
    }

    #[test]
    fn test_set_volume() {
        let set = TrackedSet::new(8, 135.0, SetType::Working, bench_press());
        assert_eq!(set.volume(), 1080.0);
    }

    #[test]
    fn test_exercise_completion_is_derived() {
        let mut exercise = TrackedExercise {
            id: Uuid::new_v4(),
            exercise_name: "Barbell Bench Press".to_string(),
            muscle_groups: vec!["chest".to_string()],
            tracked_sets: Vec::new(),
        };
        assert!(!exercise.is_completed());

        exercise
            .tracked_sets
            .push(TrackedSet::new(8, 135.0, SetType::Working, bench_press()));
        assert!(exercise.is_completed());
    }

    #[test]
    fn test_from_template_mirrors_exercise_order() {
        let template = builtin::push_day();
        let workout = TrackedWorkout::from_template(&template, None);

        assert_eq!(workout.tracked_exercises.len(), template.exercises.len());
        for (tracked, exercise) in workout.tracked_exercises.iter().zip(&template.exercises) {
            assert_eq!(tracked.exercise_name, exercise.exercise_type.name);
            assert!(tracked.tracked_sets.is_empty());
        }
        assert!(!workout.is_completed);
        assert!(workout.start_time.is_some());
        assert!(workout.duration_secs.is_none());
    }

    #[test]
    fn test_finish_stamps_end_and_duration() {
        let template = builtin::push_day();
        let mut workout = TrackedWorkout::from_template(&template, None);

        workout.finish();

        assert!(workout.is_completed);
        assert!(workout.end_time.is_some());
        assert!(workout.duration_secs.is_some());
        assert!(workout.duration_secs.unwrap() >= 0);
    }

    #[test]
    fn test_workout_volume() {
        let template = builtin::push_day();
        let mut workout = TrackedWorkout::from_template(&template, None);
        workout.tracked_exercises[0]
            .tracked_sets
            .push(TrackedSet::new(8, 100.0, SetType::Working, bench_press()));
        workout.tracked_exercises[1]
            .tracked_sets
            .push(TrackedSet::new(10, 50.0, SetType::Working, bench_press()));

        assert_eq!(workout.volume(), 1300.0);
        assert_eq!(workout.total_sets(), 2);
        assert_eq!(workout.total_reps(), 18);
    }
}
