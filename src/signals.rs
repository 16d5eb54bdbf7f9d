use std::hash::{Hash, Hasher};
use std::sync::mpsc::Sender;
use std::sync::{Mutex, PoisonError};

use hecs::Entity;

/// Two entities whose shapes began touching during a step.
///
/// The pair is unordered: `(a, b)` compares and hashes equal to `(b, a)`.
#[derive(Debug, Clone, Copy)]
pub struct CollisionSignal {
    pub entity_a: Entity,
    pub entity_b: Entity,
}

impl CollisionSignal {
    pub fn new(entity_a: Entity, entity_b: Entity) -> Self {
        Self { entity_a, entity_b }
    }

    pub fn involves(&self, entity: Entity) -> bool {
        self.entity_a == entity || self.entity_b == entity
    }

    /// The partner of `entity` in this pair, if `entity` is part of it.
    pub fn other(&self, entity: Entity) -> Option<Entity> {
        if self.entity_a == entity {
            Some(self.entity_b)
        } else if self.entity_b == entity {
            Some(self.entity_a)
        } else {
            None
        }
    }

    fn ordered_bits(&self) -> (u64, u64) {
        let a = self.entity_a.to_bits().get();
        let b = self.entity_b.to_bits().get();
        (a.min(b), a.max(b))
    }
}

impl PartialEq for CollisionSignal {
    fn eq(&self, other: &Self) -> bool {
        self.ordered_bits() == other.ordered_bits()
    }
}

impl Eq for CollisionSignal {}

impl Hash for CollisionSignal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ordered_bits().hash(state);
    }
}

/// Receiver of collision signals. Signals are delivered synchronously from
/// inside the simulation step.
pub trait CollisionSink: Send + Sync {
    fn queue_signal(&self, signal: CollisionSignal);
}

/// Collects signals until the owner drains them, typically once per frame.
#[derive(Default)]
pub struct CollisionQueue {
    pending: Mutex<Vec<CollisionSignal>>,
}

impl CollisionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<CollisionSignal> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CollisionSink for CollisionQueue {
    fn queue_signal(&self, signal: CollisionSignal) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(signal);
    }
}

/// Forward into a channel. A hung-up receiver drops the signal.
impl CollisionSink for Sender<CollisionSignal> {
    fn queue_signal(&self, signal: CollisionSignal) {
        let _ = self.send(signal);
    }
}
