//! Keyed single-flight guard.
//!
//! Screens start network operations through [`SingleFlight::begin`]. While a
//! permit for a key is alive, further attempts with the same key are refused,
//! so a double submit never produces two in-flight requests. The permit is
//! moved into the task doing the work and releases its key when dropped.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

/// Operations that must not overlap with themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Login,
    Register,
    SendChat,
    LoadHistory,
    OpenConversation,
    SaveProfile,
}

#[derive(Clone, Default)]
pub struct SingleFlight {
    in_flight: Arc<Mutex<HashSet<Operation>>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<Operation>> {
        self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claim `op`. Returns `None` when the same operation is still running.
    pub fn begin(&self, op: Operation) -> Option<FlightPermit> {
        if !self.lock().insert(op) {
            debug!(?op, "Operation already in flight, ignoring");
            return None;
        }
        Some(FlightPermit {
            op,
            owner: self.clone(),
        })
    }

    pub fn is_busy(&self, op: Operation) -> bool {
        self.lock().contains(&op)
    }

    pub fn any_busy(&self) -> bool {
        !self.lock().is_empty()
    }
}

/// Proof that an operation is running; dropping it ends the flight.
#[must_use = "the operation is released as soon as the permit is dropped"]
pub struct FlightPermit {
    op: Operation,
    owner: SingleFlight,
}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        self.owner.lock().remove(&self.op);
    }
}

impl std::fmt::Debug for FlightPermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlightPermit").field("op", &self.op).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_begin_is_refused() {
        let flights = SingleFlight::new();
        let permit = flights.begin(Operation::SendChat);
        assert!(permit.is_some());
        assert!(flights.begin(Operation::SendChat).is_none());
        assert!(flights.is_busy(Operation::SendChat));
    }

    #[test]
    fn test_drop_releases_key() {
        let flights = SingleFlight::new();
        let permit = flights.begin(Operation::Login).expect("first begin");
        drop(permit);
        assert!(!flights.is_busy(Operation::Login));
        assert!(flights.begin(Operation::Login).is_some());
    }

    #[test]
    fn test_keys_are_independent() {
        let flights = SingleFlight::new();
        let _chat = flights.begin(Operation::SendChat).expect("chat");
        let history = flights.begin(Operation::LoadHistory);
        assert!(history.is_some());
        assert!(flights.any_busy());
    }

    #[tokio::test]
    async fn test_permit_released_when_task_finishes() {
        let flights = SingleFlight::new();
        let permit = flights.begin(Operation::SaveProfile).expect("begin");
        let handle = tokio::spawn(async move {
            let _permit = permit;
        });
        handle.await.expect("task");
        assert!(!flights.is_busy(Operation::SaveProfile));
    }
}
