//! Notifications for the presentation layer.
//!
//! Events describe results (hits, steps, state changes) after they have
//! been decided. Observers are fire-and-forget: an observer failure is
//! logged and dropped at the bus, and never reaches combat state.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::behavior::BehaviorChange;
use crate::components::{EntityId, Facing};
use crate::math::{TileCoord, Vec2Fixed};

/// Something the presentation layer may want to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// An agent changed behavior.
    StateChanged {
        /// Agent that changed.
        agent: EntityId,
        /// What changed.
        change: BehaviorChange,
    },
    /// Damage landed.
    Hit {
        /// Source of the damage.
        attacker: EntityId,
        /// Entity that took the damage.
        target: EntityId,
        /// Final damage after mitigation.
        damage: u32,
        /// Target position at the moment of the hit.
        position: Vec2Fixed,
        /// Whether the damage bypassed armor.
        is_magic: bool,
    },
    /// An agent started a one-tile step.
    Stepped {
        /// Agent that moves.
        agent: EntityId,
        /// Direction of travel.
        facing: Facing,
        /// Tile the step ends on.
        destination: TileCoord,
    },
    /// An agent turned in place.
    Faced {
        /// Agent that turned.
        agent: EntityId,
        /// New facing.
        facing: Facing,
    },
    /// An entity ran out of health and was removed.
    Died {
        /// Entity that died.
        entity: EntityId,
    },
}

/// Failure reported by an observer.
#[derive(Debug, Error)]
#[error("observer '{observer}' failed: {message}")]
pub struct ObserverError {
    /// Name of the failing observer.
    pub observer: String,
    /// What went wrong.
    pub message: String,
}

impl ObserverError {
    /// Create an observer error.
    #[must_use]
    pub fn new(observer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            observer: observer.into(),
            message: message.into(),
        }
    }
}

/// Subscriber to combat events.
pub trait CombatObserver {
    /// Handle one event.
    ///
    /// # Errors
    ///
    /// Any error is logged by the [`EventBus`] and otherwise ignored.
    fn on_event(&mut self, event: &CombatEvent) -> Result<(), ObserverError>;
}

/// Fan-out of events to observers, in subscription order.
#[derive(Default)]
pub struct EventBus {
    observers: Vec<Box<dyn CombatObserver>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl EventBus {
    /// Create a bus with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer.
    pub fn subscribe(&mut self, observer: Box<dyn CombatObserver>) {
        self.observers.push(observer);
    }

    /// Number of observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether nobody is listening.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Deliver `event` to every observer. Returns how many failed.
    pub fn publish(&mut self, event: &CombatEvent) -> usize {
        let mut failures = 0;
        for observer in &mut self.observers {
            if let Err(err) = observer.on_event(event) {
                failures += 1;
                warn!(%err, ?event, "combat observer failed; event dropped for it");
            }
        }
        failures
    }

    /// Deliver a batch of events in order.
    pub fn publish_all(&mut self, events: &[CombatEvent]) -> usize {
        events.iter().map(|event| self.publish(event)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder(Rc<RefCell<Vec<CombatEvent>>>);

    impl CombatObserver for Recorder {
        fn on_event(&mut self, event: &CombatEvent) -> Result<(), ObserverError> {
            self.0.borrow_mut().push(event.clone());
            Ok(())
        }
    }

    struct Broken;

    impl CombatObserver for Broken {
        fn on_event(&mut self, _: &CombatEvent) -> Result<(), ObserverError> {
            Err(ObserverError::new("broken", "sprite missing"))
        }
    }

    #[test]
    fn test_failures_do_not_stop_delivery() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.subscribe(Box::new(Broken));
        bus.subscribe(Box::new(Recorder(Rc::clone(&seen))));
        assert_eq!(bus.len(), 2);

        let events = [
            CombatEvent::Died { entity: 4 },
            CombatEvent::Faced {
                agent: 2,
                facing: Facing::Left,
            },
        ];
        assert_eq!(bus.publish_all(&events), 2);
        assert_eq!(seen.borrow().as_slice(), &events);
    }

    #[test]
    fn test_empty_bus() {
        let mut bus = EventBus::new();
        assert!(bus.is_empty());
        assert_eq!(bus.publish(&CombatEvent::Died { entity: 1 }), 0);
    }

    #[test]
    fn test_events_serialize_to_ron() {
        let event = CombatEvent::StateChanged {
            agent: 3,
            change: BehaviorChange::Retreating,
        };
        let text = ron::to_string(&event).unwrap();
        let back: CombatEvent = ron::from_str(&text).unwrap();
        assert_eq!(back, event);
    }
}
