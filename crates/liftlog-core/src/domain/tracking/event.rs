//! Workout events pushed to subscribers
//!
//! Events are delivered synchronously, in the same call that performed the
//! mutation, so a subscriber never observes state older than the event it was
//! handed.

use std::sync::Mutex;
use uuid::Uuid;

/// A state change in the tracking core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkoutEvent {
    /// A new session was started from a template
    SessionStarted { workout_id: Uuid, template_name: String },
    /// A set was appended to an exercise
    SetLogged { workout_id: Uuid, exercise_index: usize },
    /// A set was updated in place
    SetUpdated {
        workout_id: Uuid,
        exercise_index: usize,
        set_index: usize,
    },
    /// A set was removed
    SetRemoved {
        workout_id: Uuid,
        exercise_index: usize,
        set_index: usize,
    },
    /// A whole exercise was replaced by a sub-editor commit
    ExerciseReplaced { workout_id: Uuid, exercise_index: usize },
    /// The session was finalized and stored
    SessionEnded { workout_id: Uuid },
    /// The session was discarded without being stored
    SessionAbandoned { workout_id: Uuid },
    /// A completed workout was deleted from storage
    WorkoutDeleted { workout_id: Uuid },
}

type Subscriber = Box<dyn Fn(&WorkoutEvent) + Send + Sync>;

/// Registry of event subscribers
#[derive(Default)]
pub struct Subscribers {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl Subscribers {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber
    pub fn subscribe(&self, subscriber: impl Fn(&WorkoutEvent) + Send + Sync + 'static) {
        self.subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .push(Box::new(subscriber));
    }

    /// Deliver an event to all subscribers, synchronously
    pub fn notify(&self, event: &WorkoutEvent) {
        let subscribers = self.subscribers.lock().expect("subscriber lock poisoned");
        for subscriber in subscribers.iter() {
            subscriber(event);
        }
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.subscribers.lock().map(|s| s.len()).unwrap_or(0);
        f.debug_struct("Subscribers").field("count", &count).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_notify_reaches_all_subscribers() {
        let subscribers = Subscribers::new();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = counter.clone();
            subscribers.subscribe(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        subscribers.notify(&WorkoutEvent::SessionEnded {
            workout_id: Uuid::new_v4(),
        });
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_notify_with_no_subscribers_is_noop() {
        let subscribers = Subscribers::new();
        subscribers.notify(&WorkoutEvent::SessionAbandoned {
            workout_id: Uuid::new_v4(),
        });
    }

    #[test]
    fn test_delivery_is_synchronous() {
        let subscribers = Subscribers::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        subscribers.subscribe(move |event| {
            sink.lock().unwrap().push(event.clone());
        });

        let id = Uuid::new_v4();
        subscribers.notify(&WorkoutEvent::SetLogged {
            workout_id: id,
            exercise_index: 0,
        });

        // The event is observable immediately after notify returns.
        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            WorkoutEvent::SetLogged {
                workout_id: id,
                exercise_index: 0
            }
        );
    }
}
