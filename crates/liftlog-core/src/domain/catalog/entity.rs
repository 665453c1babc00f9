//! Template entities: muscle groups, exercise types, exercises, workouts

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Muscle group targeted by an exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Biceps,
    Triceps,
    Quads,
    Hamstrings,
    Glutes,
    Calves,
    Abs,
}

impl MuscleGroup {
    /// All muscle groups
    pub const ALL: [MuscleGroup; 10] = [
        Self::Chest,
        Self::Back,
        Self::Shoulders,
        Self::Biceps,
        Self::Triceps,
        Self::Quads,
        Self::Hamstrings,
        Self::Glutes,
        Self::Calves,
        Self::Abs,
    ];

    /// Create from string representation
    ///
    /// Returns `None` for unrecognized tags; callers reading stored data drop
    /// those silently rather than failing the read.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "chest" => Some(Self::Chest),
            "back" => Some(Self::Back),
            "shoulders" => Some(Self::Shoulders),
            "biceps" => Some(Self::Biceps),
            "triceps" => Some(Self::Triceps),
            "quads" => Some(Self::Quads),
            "hamstrings" => Some(Self::Hamstrings),
            "glutes" => Some(Self::Glutes),
            "calves" => Some(Self::Calves),
            "abs" => Some(Self::Abs),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chest => "chest",
            Self::Back => "back",
            Self::Shoulders => "shoulders",
            Self::Biceps => "biceps",
            Self::Triceps => "triceps",
            Self::Quads => "quads",
            Self::Hamstrings => "hamstrings",
            Self::Glutes => "glutes",
            Self::Calves => "calves",
            Self::Abs => "abs",
        }
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An exercise type: a named movement and the muscle groups it targets
///
/// Value type; equality covers both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExerciseType {
    pub name: String,
    pub muscle_groups: Vec<MuscleGroup>,
}

impl ExerciseType {
    /// Create a new exercise type
    pub fn new(name: impl Into<String>, muscle_groups: Vec<MuscleGroup>) -> Self {
        Self {
            name: name.into(),
            muscle_groups,
        }
    }
}

/// An inclusive range used for rep and rest prescriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepRange {
    pub min: u32,
    pub max: u32,
}

impl RepRange {
    /// Create a new range; `min` must not exceed `max`
    pub fn new(min: u32, max: u32) -> Self {
        debug_assert!(min <= max, "range min must not exceed max");
        Self { min, max }
    }

    /// Check whether a value falls within the range
    pub fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }
}

impl fmt::Display for RepRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// A single exercise prescription within a workout template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    /// The movement being performed
    pub exercise_type: ExerciseType,
    /// URL of a demonstration video
    pub demo_url: String,
    /// Intensity technique applied on the last working set
    pub intensity_technique: String,
    /// Prescribed number of warm-up sets
    pub warmup_sets: u32,
    /// Prescribed number of working sets
    pub working_sets: u32,
    /// Target rep range per working set
    pub rep_range: RepRange,
    /// Rest between sets, in minutes
    pub rest_minutes: RepRange,
}

/// An immutable workout template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: Uuid,
    pub name: String,
    pub exercises: Vec<Exercise>,
}

impl Workout {
    /// Create a new workout template
    pub fn new(name: impl Into<String>, exercises: Vec<Exercise>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            exercises,
        }
    }
}

impl PartialEq for Workout {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muscle_group_round_trip() {
        for group in MuscleGroup::ALL {
            assert_eq!(MuscleGroup::from_str(group.as_str()), Some(group));
        }
        assert_eq!(MuscleGroup::from_str("QUADS"), Some(MuscleGroup::Quads));
        assert_eq!(MuscleGroup::from_str("forearms"), None);
    }

    #[test]
    fn test_exercise_type_equality() {
        let a = ExerciseType::new("Leg Press", vec![MuscleGroup::Quads, MuscleGroup::Hamstrings]);
        let b = ExerciseType::new("Leg Press", vec![MuscleGroup::Quads, MuscleGroup::Hamstrings]);
        let c = ExerciseType::new("Leg Press", vec![MuscleGroup::Quads]);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_rep_range() {
        let range = RepRange::new(8, 10);
        assert!(range.contains(8));
        assert!(range.contains(10));
        assert!(!range.contains(11));
        assert_eq!(range.to_string(), "8-10");
    }
}
