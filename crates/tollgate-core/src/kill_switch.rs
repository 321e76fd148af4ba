//! The process-wide emergency stop.
//!
//! `KillSwitch` is an explicitly owned service object: the hosting
//! application creates one, wraps it in an `Arc`, and hands it to every
//! engine that must honour it. Tests build isolated switches freely.
//!
//! Execution admission goes through `try_admit()`, which checks the flag and
//! registers the execution as in flight under the same lock. An activation
//! therefore either happens before an admission (which is then refused) or
//! after it (the execution was decided before the stop). The lock is never
//! held while the executor runs.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{info, warn};

use tollgate_contracts::kill_switch::{KillSwitchEvent, KillSwitchEventKind, KillSwitchState};

/// Proof that an execution was admitted while the switch was inactive.
///
/// Dropping the permit marks the execution as finished.
#[derive(Debug)]
pub struct ExecutionPermit<'a> {
    in_flight: &'a AtomicUsize,
}

impl Drop for ExecutionPermit<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Emergency stop with reason / actor / timestamp metadata.
///
/// There is no automatic expiry: once activated, the switch stays active
/// until `deactivate()` is called.
#[derive(Debug, Default)]
pub struct KillSwitch {
    state: Mutex<KillSwitchState>,
    in_flight: AtomicUsize,
}

impl KillSwitch {
    /// Create an inactive switch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return true while all execution is suspended.
    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// A snapshot of the current state.
    pub fn status(&self) -> KillSwitchState {
        self.state.lock().clone()
    }

    /// Number of admitted executions that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Atomically check the switch and, if inactive, admit one execution.
    ///
    /// Returns the active state instead when the switch is thrown, so the
    /// caller can report exactly which activation blocked it.
    pub fn try_admit(&self) -> Result<ExecutionPermit<'_>, KillSwitchState> {
        let state = self.state.lock();
        if state.active {
            return Err(state.clone());
        }
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        Ok(ExecutionPermit { in_flight: &self.in_flight })
    }

    /// Throw the switch.
    ///
    /// Re-activating an active switch replaces the reason, actor and
    /// timestamp; it is not an error.
    pub fn activate(&self, reason: impl Into<String>, actor: impl Into<String>) -> KillSwitchEvent {
        let reason = reason.into();
        let actor = actor.into();
        let now = Utc::now();

        let mut state = self.state.lock();
        let was_active = state.active;
        *state = KillSwitchState {
            active: true,
            reason: Some(reason.clone()),
            activated_by: Some(actor.clone()),
            activated_at: Some(now),
        };
        let in_flight = self.in_flight();
        drop(state);

        warn!(
            actor = %actor,
            reason = %reason,
            was_active,
            in_flight,
            "KILL SWITCH ACTIVATED"
        );

        KillSwitchEvent {
            kind: KillSwitchEventKind::Activated,
            actor,
            reason: Some(reason),
            was_active,
            in_flight,
            at: now,
        }
    }

    /// Release the switch.
    ///
    /// Deactivating an inactive switch changes nothing but still produces an
    /// event, so the attempt is traceable.
    pub fn deactivate(&self, actor: impl Into<String>, notes: Option<String>) -> KillSwitchEvent {
        let actor = actor.into();
        let now = Utc::now();

        let mut state = self.state.lock();
        let was_active = state.active;
        *state = KillSwitchState::inactive();
        let in_flight = self.in_flight();
        drop(state);

        if was_active {
            info!(actor = %actor, notes = ?notes, "kill switch deactivated, execution resumed");
        } else {
            info!(actor = %actor, "kill switch deactivation requested while inactive");
        }

        KillSwitchEvent {
            kind: KillSwitchEventKind::Deactivated,
            actor,
            reason: notes,
            was_active,
            in_flight,
            at: now,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use tollgate_contracts::kill_switch::KillSwitchEventKind;

    use super::KillSwitch;

    #[test]
    fn test_new_switch_is_inactive() {
        let switch = KillSwitch::new();
        assert!(!switch.is_active());
        let status = switch.status();
        assert!(status.reason.is_none());
        assert!(status.activated_by.is_none());
        assert!(status.activated_at.is_none());
    }

    #[test]
    fn test_activate_sets_metadata() {
        let switch = KillSwitch::new();
        let event = switch.activate("vendor fraud suspected", "ops-lead");

        assert!(switch.is_active());
        assert_eq!(event.kind, KillSwitchEventKind::Activated);
        assert!(!event.was_active);

        let status = switch.status();
        assert_eq!(status.reason.as_deref(), Some("vendor fraud suspected"));
        assert_eq!(status.activated_by.as_deref(), Some("ops-lead"));
        assert!(status.activated_at.is_some());
    }

    /// Activating twice keeps the switch active and the latest reason wins.
    #[test]
    fn test_activate_twice_keeps_latest_reason() {
        let switch = KillSwitch::new();
        switch.activate("first incident", "alice");
        let second = switch.activate("second incident", "bob");

        assert!(switch.is_active());
        assert!(second.was_active, "second activation must report prior state");
        let status = switch.status();
        assert_eq!(status.reason.as_deref(), Some("second incident"));
        assert_eq!(status.activated_by.as_deref(), Some("bob"));
    }

    #[test]
    fn test_deactivate_inactive_is_noop_with_event() {
        let switch = KillSwitch::new();
        let event = switch.deactivate("alice", None);

        assert!(!switch.is_active());
        assert_eq!(event.kind, KillSwitchEventKind::Deactivated);
        assert!(!event.was_active);
    }

    #[test]
    fn test_deactivate_clears_metadata() {
        let switch = KillSwitch::new();
        switch.activate("drill", "alice");
        let event = switch.deactivate("bob", Some("drill complete".to_string()));

        assert!(event.was_active);
        assert_eq!(event.reason.as_deref(), Some("drill complete"));
        assert_eq!(switch.status(), tollgate_contracts::kill_switch::KillSwitchState::inactive());
    }

    #[test]
    fn test_admission_refused_while_active() {
        let switch = KillSwitch::new();
        switch.activate("incident", "alice");

        match switch.try_admit() {
            Err(state) => {
                assert!(state.active);
                assert_eq!(state.reason.as_deref(), Some("incident"));
            }
            Ok(_) => panic!("admission must be refused while the switch is active"),
        }
        assert_eq!(switch.in_flight(), 0);
    }

    #[test]
    fn test_permit_tracks_in_flight() {
        let switch = KillSwitch::new();
        {
            let _a = switch.try_admit().unwrap();
            let _b = switch.try_admit().unwrap();
            assert_eq!(switch.in_flight(), 2);

            // Activation while executions are in flight reports them.
            let event = switch.activate("incident", "alice");
            assert_eq!(event.in_flight, 2);
        }
        assert_eq!(switch.in_flight(), 0);
    }

    /// Every admission either completes before the activation is observed or
    /// is refused; none slip through once `activate` has returned.
    #[test]
    fn test_no_admission_after_activation_returns() {
        let switch = Arc::new(KillSwitch::new());
        let barrier = Arc::new(Barrier::new(9));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let switch = Arc::clone(&switch);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    (0..200).filter(|_| switch.try_admit().is_ok()).count()
                })
            })
            .collect();

        barrier.wait();
        switch.activate("race", "alice");
        assert!(switch.try_admit().is_err());

        for worker in workers {
            worker.join().unwrap();
        }
        assert!(switch.try_admit().is_err());
        assert_eq!(switch.in_flight(), 0);
    }
}
