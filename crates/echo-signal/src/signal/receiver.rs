// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use thiserror::Error;

use super::desc::SignalContext;
use crate::ident::Handle;
use crate::math::Vec3;

/// Reason a receiver declined a signal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// Receiver does not handle this signal.
    #[error("signal rejected: {0}")]
    Rejected(String),
}

/// Outcome of a single delivery. The dispatcher only counts failures.
pub type DeliveryResult = Result<(), DeliveryError>;

/// Object that can be registered with a [`SignalDispatcher`](super::SignalDispatcher).
pub trait SignalReceiver {
    /// Stable, non-zero identity used for targeting and spatial placement.
    fn identifier(&self) -> Handle;

    /// Current world position; read when the object is placed in space.
    fn world_position(&self) -> Vec3;

    /// Handles one signal. Called on the dispatching thread, in priority order.
    fn deliver_signal(&mut self, ctx: &SignalContext) -> DeliveryResult;
}
