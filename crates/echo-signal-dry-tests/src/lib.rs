// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for echo-signal.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`toy`] - Recording receiver and the shared delivery log
//! - [`scene`] - Dispatcher builder that registers and places toys

pub mod scene;
pub mod toy;

pub use scene::{FixtureError, SceneBuilder};
pub use toy::{Delivery, DeliveryLog, RecordingToy};
