//! Built-in workout templates
//!
//! A three-day hypertrophy split. Template ids are freshly generated per
//! process; identity across runs is by name.

use super::entity::MuscleGroup::*;
use super::entity::{Exercise, ExerciseType, MuscleGroup, RepRange, Workout};

fn exercise(
    name: &str,
    muscle_groups: Vec<MuscleGroup>,
    demo_url: &str,
    intensity_technique: &str,
    warmup_sets: u32,
    working_sets: u32,
    rep_range: (u32, u32),
    rest_minutes: (u32, u32),
) -> Exercise {
    Exercise {
        exercise_type: ExerciseType::new(name, muscle_groups),
        demo_url: demo_url.to_string(),
        intensity_technique: intensity_technique.to_string(),
        warmup_sets,
        working_sets,
        rep_range: RepRange::new(rep_range.0, rep_range.1),
        rest_minutes: RepRange::new(rest_minutes.0, rest_minutes.1),
    }
}

/// Push day: chest, shoulders, triceps
pub fn push_day() -> Workout {
    Workout::new(
        "Push Day (Hypertrophy Focus)",
        vec![
            exercise(
                "Barbell Bench Press",
                vec![Chest],
                "https://www.youtube.com/embed/nQL5ieH39sw",
                "Failure",
                2,
                3,
                (8, 10),
                (3, 5),
            ),
            exercise(
                "Machine Shoulder Press",
                vec![Shoulders],
                "https://www.youtube.com/embed/SCQVmN1gYsk",
                "Failure",
                2,
                2,
                (8, 10),
                (2, 3),
            ),
            exercise(
                "Bottom-Half DB Flye",
                vec![Chest],
                "https://www.youtube.com/embed/qJzc-iHKGdg",
                "Failure",
                2,
                2,
                (10, 12),
                (1, 2),
            ),
            exercise(
                "High-Cable Lateral Raise",
                vec![Shoulders],
                "https://www.youtube.com/embed/MnMux3Wc0Ac",
                "Myo-Reps",
                1,
                2,
                (10, 12),
                (1, 2),
            ),
            exercise(
                "Overhead Cable Triceps Extension",
                vec![Triceps],
                "https://www.youtube.com/embed/9_I1PqZAjdA",
                "Failure",
                1,
                2,
                (10, 12),
                (1, 2),
            ),
            exercise(
                "Cable Triceps Kickback",
                vec![Triceps],
                "https://www.youtube.com/embed/oRxTKRtP8RE",
                "Myo-Reps",
                1,
                2,
                (12, 15),
                (1, 2),
            ),
            exercise(
                "Roman Chair Leg Raise",
                vec![Abs],
                "https://www.youtube.com/embed/irOzFVqJ0IE",
                "Failure",
                2,
                2,
                (10, 20),
                (1, 2),
            ),
        ],
    )
}

/// Pull day: back, rear delts, biceps
pub fn pull_day() -> Workout {
    Workout::new(
        "Pull Day (Hypertrophy Focus)",
        vec![
            exercise(
                "Neutral-Grip Lat Pulldown",
                vec![Back, Biceps],
                "https://www.youtube.com/embed/lA4_1F9EAFU",
                "Failure",
                2,
                2,
                (8, 10),
                (2, 3),
            ),
            exercise(
                "Chest-Supported Machine Row",
                vec![Back],
                "https://www.youtube.com/embed/ijsSiWSzYw0",
                "Failure",
                2,
                3,
                (8, 10),
                (2, 3),
            ),
            exercise(
                "Neutral-Grip Seated Cable Row",
                vec![Back],
                "https://www.youtube.com/embed/hM7XHxQgvLk",
                "Failure + LLPs (Extended set)",
                2,
                2,
                (10, 12),
                (2, 3),
            ),
            exercise(
                "1-Arm 45\u{b0} Cable Rear Delt Flye",
                vec![Shoulders],
                "https://www.youtube.com/embed/6G5DmVaocGM",
                "Myo-Reps",
                2,
                2,
                (10, 12),
                (1, 2),
            ),
            exercise(
                "Machine Shrug",
                vec![Shoulders],
                "https://www.youtube.com/embed/ua0XuKwKQ9M",
                "Failure",
                2,
                2,
                (10, 12),
                (1, 2),
            ),
            exercise(
                "EZ-Bar Cable Curl",
                vec![Biceps],
                "https://www.youtube.com/embed/ck1zjNTnFew",
                "Failure",
                1,
                2,
                (10, 12),
                (1, 2),
            ),
            exercise(
                "Machine Preacher Curl",
                vec![Biceps],
                "https://www.youtube.com/embed/R2iUnBxFtis",
                "Myo-Reps",
                1,
                2,
                (12, 15),
                (1, 2),
            ),
        ],
    )
}

/// Leg day: quads, hamstrings, glutes, calves
pub fn leg_day() -> Workout {
    Workout::new(
        "Legs (Hypertrophy Focus)",
        vec![
            exercise(
                "Leg Press",
                vec![Quads, Hamstrings],
                "https://www.youtube.com/embed/1yKAQLVV_XI",
                "Failure",
                3,
                3,
                (8, 10),
                (2, 3),
            ),
            exercise(
                "Seated Leg Curl",
                vec![Hamstrings],
                "https://www.youtube.com/embed/yv0aAY7M1mk",
                "Failure + LLPs (Extended set)",
                2,
                2,
                (10, 12),
                (1, 2),
            ),
            exercise(
                "DB Bulgarian Split Squat",
                vec![Glutes, Hamstrings, Quads],
                "https://www.youtube.com/embed/htDXu61MPio",
                "Failure",
                2,
                2,
                (8, 10),
                (2, 3),
            ),
            exercise(
                "Leg Extension",
                vec![Quads],
                "https://www.youtube.com/embed/uFbNtqP966A",
                "Myo-Reps",
                2,
                2,
                (10, 12),
                (1, 2),
            ),
            exercise(
                "Machine Hip-Adduction",
                vec![Glutes],
                "https://www.youtube.com/embed/FMSCZYu1JhE",
                "Failure",
                2,
                2,
                (10, 12),
                (1, 2),
            ),
            exercise(
                "Machine Hip Abduction",
                vec![Glutes],
                "https://www.youtube.com/embed/pozooPg6PBE",
                "Failure",
                2,
                2,
                (10, 12),
                (1, 2),
            ),
            exercise(
                "Standing Calf Raise",
                vec![Calves],
                "https://www.youtube.com/embed/6lR2JdxUh7w",
                "Static Stretch (30sec)",
                2,
                2,
                (10, 12),
                (1, 2),
            ),
        ],
    )
}

/// All built-in templates
pub fn all() -> Vec<Workout> {
    vec![push_day(), pull_day(), leg_day()]
}

/// Look up a built-in template by name (case-insensitive, prefix match)
pub fn find(name: &str) -> Option<Workout> {
    let needle = name.to_lowercase();
    all()
        .into_iter()
        .find(|w| w.name.to_lowercase().starts_with(&needle))
}
