// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Signal bus: producer queues, receiver registry, and dispatch.

mod desc;
mod dispatcher;
mod queue;
mod receiver;
mod registry;

pub use desc::{SignalContext, SignalDesc};
pub use dispatcher::{DispatchReport, SignalDispatcher, SignalError};
pub use queue::{BroadcastBatch, PendingCounts};
pub use receiver::{DeliveryError, DeliveryResult, SignalReceiver};
