//! Process-local record of accepted Slack deliveries.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Set of `event_id`s accepted since process start.
///
/// Slack redelivers an event when it does not see a quick `200`, always
/// with the same `event_id`. Only the first delivery may dispatch work.
/// The set is unbounded and lives only as long as the process.
#[derive(Debug, Default, Clone)]
pub struct SeenEvents {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl SeenEvents {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `event_id`, returning `true` only for its first delivery.
    ///
    /// Check and insert happen under one lock, so concurrent deliveries of
    /// the same event admit exactly one caller.
    #[must_use]
    pub fn first_delivery(&self, event_id: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(event_id.to_owned())
    }

    /// Whether `event_id` has been accepted before.
    #[must_use]
    pub fn contains(&self, event_id: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(event_id)
    }

    /// Number of distinct events seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no event has been seen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
