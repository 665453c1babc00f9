//! Sync wire format
//!
//! Flat transfer shapes matching the backend's expectations. Client-generated
//! ids ride along as correlation keys; all timestamps are RFC 3339 strings.

use crate::domain::tracking::TrackedWorkout;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Request body for `POST /api/sync`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    pub device_id: String,
    pub device_info: Option<DeviceInfo>,
    pub last_sync_timestamp: Option<String>,
    pub workouts: Vec<WorkoutSyncData>,
}

/// Device metadata attached to each sync
///
/// `name` is always `None`: personal device names are PII and never leave the
/// machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub device_type: String,
    pub app_version: String,
    pub os_version: Option<String>,
}

impl DeviceInfo {
    /// Metadata for the running process
    pub fn current() -> Self {
        Self {
            name: None,
            device_type: std::env::consts::OS.to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            os_version: None,
        }
    }
}

/// A workout flattened for transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSyncData {
    pub client_id: String,
    pub user_id: String,
    pub date: String,
    pub name: Option<String>,
    pub duration_seconds: Option<i64>,
    pub is_completed: bool,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub template_name: Option<String>,
    pub exercises: Vec<ExerciseSyncData>,
    pub updated_at: String,
}

/// An exercise flattened for transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSyncData {
    pub client_id: String,
    pub exercise_name: String,
    pub muscle_groups: Vec<String>,
    pub sets: Vec<SetSyncData>,
    pub updated_at: String,
}

/// A set flattened for transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSyncData {
    pub client_id: String,
    pub reps: u32,
    pub weight: f64,
    pub set_type: String,
    pub exercise_type_name: String,
    pub exercise_type_muscle_groups: Vec<String>,
    pub updated_at: String,
}

impl WorkoutSyncData {
    /// Transform a tracked workout into its transfer shape
    pub fn from_workout(workout: &TrackedWorkout, updated_at: DateTime<Utc>) -> Self {
        let stamp = rfc3339(updated_at);

        let exercises = workout
            .tracked_exercises
            .iter()
            .map(|exercise| ExerciseSyncData {
                client_id: exercise.id.to_string(),
                exercise_name: exercise.exercise_name.clone(),
                muscle_groups: exercise.muscle_groups.clone(),
                sets: exercise
                    .tracked_sets
                    .iter()
                    .map(|set| SetSyncData {
                        client_id: set.id.to_string(),
                        reps: set.reps,
                        weight: set.weight,
                        set_type: set.set_type.as_str().to_string(),
                        exercise_type_name: set.exercise_type.name.clone(),
                        exercise_type_muscle_groups: set
                            .exercise_type
                            .muscle_groups
                            .iter()
                            .map(|g| g.as_str().to_string())
                            .collect(),
                        updated_at: stamp.clone(),
                    })
                    .collect(),
                updated_at: stamp.clone(),
            })
            .collect();

        Self {
            client_id: workout.id.to_string(),
            user_id: workout.user_id.clone().unwrap_or_default(),
            date: rfc3339(workout.date),
            name: Some(workout.template_name.clone()),
            duration_seconds: workout.duration_secs,
            is_completed: workout.is_completed,
            start_time: workout.start_time.map(rfc3339),
            end_time: workout.end_time.map(rfc3339),
            template_name: Some(workout.template_name.clone()),
            exercises,
            updated_at: stamp,
        }
    }
}

// ========== Response Types ==========

/// Response body from `POST /api/sync`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<SyncResponseData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponseData {
    pub synced_at: String,
    pub conflicts: Option<Vec<ConflictData>>,
    pub server_data: Option<ServerData>,
    pub stats: Option<SyncStats>,
}

/// A server-declared conflict resolution; the policy is server-defined and
/// opaque to this client
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictData {
    pub entity_type: String,
    pub entity_id: String,
    pub resolution: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerData {
    pub workouts: Vec<WorkoutSyncData>,
    pub last_server_sync: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    pub uploaded: i64,
    pub downloaded: i64,
    pub conflicts: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{builtin, ExerciseType, MuscleGroup};
    use crate::domain::tracking::{SetType, TrackedSet};

    fn sample_workout() -> TrackedWorkout {
        let mut workout = TrackedWorkout::from_template(&builtin::push_day(), Some("user-1".into()));
        workout.tracked_exercises[0].tracked_sets.push(TrackedSet::new(
            8,
            135.0,
            SetType::Working,
            ExerciseType::new("Barbell Bench Press", vec![MuscleGroup::Chest]),
        ));
        workout.finish();
        workout
    }

    #[test]
    fn test_from_workout_flattens_structure() {
        let workout = sample_workout();
        let data = WorkoutSyncData::from_workout(&workout, Utc::now());

        assert_eq!(data.client_id, workout.id.to_string());
        assert_eq!(data.user_id, "user-1");
        assert!(data.is_completed);
        assert_eq!(data.exercises.len(), workout.tracked_exercises.len());
        assert_eq!(data.exercises[0].sets.len(), 1);
        assert_eq!(data.exercises[0].sets[0].set_type, "working");
        assert_eq!(
            data.exercises[0].sets[0].exercise_type_muscle_groups,
            vec!["chest"]
        );
        assert!(data.start_time.is_some());
        assert!(data.end_time.is_some());
    }

    #[test]
    fn test_payload_uses_camel_case_wire_names() {
        let payload = SyncPayload {
            device_id: "device-1".to_string(),
            device_info: Some(DeviceInfo::current()),
            last_sync_timestamp: None,
            workouts: vec![WorkoutSyncData::from_workout(&sample_workout(), Utc::now())],
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("deviceId").is_some());
        assert!(value.get("lastSyncTimestamp").is_some());
        let info = value.get("deviceInfo").unwrap();
        assert!(info.get("type").is_some());
        assert!(info.get("appVersion").is_some());
        // Device name is PII and must always be null.
        assert!(info.get("name").unwrap().is_null());
        let workout = &value.get("workouts").unwrap()[0];
        assert!(workout.get("clientId").is_some());
        assert!(workout.get("durationSeconds").is_some());
        assert!(workout.get("templateName").is_some());
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "success": true,
            "message": "ok",
            "data": {
                "syncedAt": "2025-07-10T12:00:00.000Z",
                "conflicts": [
                    {"entityType": "workout", "entityId": "abc", "resolution": "server_wins"}
                ],
                "stats": {"uploaded": 1, "downloaded": 0, "conflicts": 1}
            }
        }"#;

        let response: SyncResponse = serde_json::from_str(body).unwrap();
        assert!(response.success);
        let data = response.data.unwrap();
        assert_eq!(data.conflicts.unwrap().len(), 1);
        assert_eq!(data.stats.unwrap().uploaded, 1);
    }

    #[test]
    fn test_response_parsing_minimal() {
        let response: SyncResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!response.success);
        assert!(response.message.is_none());
        assert!(response.data.is_none());
    }
}
