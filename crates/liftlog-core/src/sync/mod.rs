//! Remote synchronization of completed workouts
//!
//! Best-effort upload of finalized sessions to the backend. Local durability
//! never depends on sync: by the time anything here runs, the workout is
//! already stored. Failures surface as typed errors and leave the workout
//! eligible for a later batch sync.

pub mod client;
pub mod device;
pub mod payload;

pub use client::{StaticTokenProvider, SyncClient, SyncClientBuilder, SyncOutcome, TokenProvider};
pub use device::DeviceState;
pub use payload::{DeviceInfo, SyncPayload, SyncResponse, WorkoutSyncData};
