//! Active-workout tracking
//!
//! The mutable core of the application: a tracked session seeded from a
//! template, mutated set-by-set while active, and finalized into durable
//! storage.
//!
//! # Architecture
//!
//! - **Entities**: `TrackedWorkout`, `TrackedExercise`, `TrackedSet`
//! - **Store**: `SessionStore` owns the single active session and mirrors it
//!   to a durable slot for crash recovery
//! - **Repository**: `WorkoutRepository` for completed-workout storage and
//!   aggregate statistics
//! - **Manager**: `WorkoutManager` composes store, repository and sync client
//!   as the sole caller-facing entry point

pub mod entity;
pub mod event;
pub mod manager;
pub mod repository;
pub mod store;

pub use entity::{SetType, TrackedExercise, TrackedSet, TrackedWorkout};
pub use event::WorkoutEvent;
pub use manager::WorkoutManager;
pub use repository::{ProgressPoint, WorkoutRepository, WorkoutStats};
pub use store::SessionStore;
