// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recording receiver.

use std::sync::{Arc, Mutex, PoisonError};

use echo_signal::{
    DeliveryError, DeliveryResult, Handle, SignalContext, SignalReceiver, SignalTypeId, Vec3,
};

/// One observed delivery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Delivery {
    /// Receiver that saw the signal.
    pub receiver: Handle,
    /// Signal type.
    pub type_id: SignalTypeId,
    /// Signal priority.
    pub priority: i32,
    /// Scalar payload.
    pub value: f32,
}

/// Delivery log shared by every toy of a scene, in global delivery order.
#[derive(Debug, Clone, Default)]
pub struct DeliveryLog(Arc<Mutex<Vec<Delivery>>>);

impl DeliveryLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, d: Delivery) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(d);
    }

    /// Copy of every delivery so far.
    pub fn snapshot(&self) -> Vec<Delivery> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Deliveries received by `receiver`.
    pub fn for_receiver(&self, receiver: Handle) -> Vec<Delivery> {
        self.snapshot()
            .into_iter()
            .filter(|d| d.receiver == receiver)
            .collect()
    }

    /// Number of deliveries so far.
    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// `true` when nothing was delivered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every delivery.
    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Receiver that appends every delivery to a [`DeliveryLog`].
#[derive(Debug, Clone)]
pub struct RecordingToy {
    handle: Handle,
    /// World position reported to the dispatcher.
    pub position: Vec3,
    /// When set, deliveries are logged and then rejected.
    pub reject: bool,
    log: DeliveryLog,
}

impl RecordingToy {
    /// Creates a toy at `position` writing into `log`.
    pub fn new(handle: Handle, position: Vec3, log: &DeliveryLog) -> Self {
        Self {
            handle,
            position,
            reject: false,
            log: log.clone(),
        }
    }
}

impl SignalReceiver for RecordingToy {
    fn identifier(&self) -> Handle {
        self.handle
    }

    fn world_position(&self) -> Vec3 {
        self.position
    }

    fn deliver_signal(&mut self, ctx: &SignalContext) -> DeliveryResult {
        self.log.push(Delivery {
            receiver: self.handle,
            type_id: ctx.type_id(),
            priority: ctx.priority(),
            value: ctx.value(),
        });
        if self.reject {
            return Err(DeliveryError::Rejected(format!("{} rejects", self.handle)));
        }
        Ok(())
    }
}
