// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dispatcher builder for tests and benches.

use echo_signal::{ConfigError, DispatcherConfig, Handle, SignalDispatcher, SignalError, Vec3};
use thiserror::Error;

use crate::toy::{DeliveryLog, RecordingToy};

/// Reasons a fixture scene could not be built.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// Toy declared with the reserved handle value.
    #[error("handle 0 is reserved")]
    ZeroHandle,
    /// Dispatcher configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Registration or placement failed.
    #[error(transparent)]
    Signal(#[from] SignalError),
}

/// Collects toys, then registers them (and optionally places them) in a fresh
/// dispatcher.
///
/// ```
/// use echo_signal::Vec3;
/// use echo_signal_dry_tests::SceneBuilder;
///
/// let (bus, log) = SceneBuilder::new()
///     .placed(1, Vec3::ZERO)
///     .unplaced(2, Vec3::new(8.0, 0.0, 0.0))
///     .build()
///     .unwrap();
/// assert_eq!(bus.len(), 2);
/// assert!(log.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct SceneBuilder {
    config: DispatcherConfig,
    toys: Vec<(u64, Vec3, bool)>,
}

impl SceneBuilder {
    /// Starts an empty scene with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `config` for the dispatcher.
    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds a toy registered and placed at `position`.
    pub fn placed(mut self, raw: u64, position: Vec3) -> Self {
        self.toys.push((raw, position, true));
        self
    }

    /// Adds a toy registered but not placed in space.
    pub fn unplaced(mut self, raw: u64, position: Vec3) -> Self {
        self.toys.push((raw, position, false));
        self
    }

    /// Adds `count` placed toys on a line along +x, `spacing` apart,
    /// with handles `first..first + count`.
    pub fn line(mut self, first: u64, count: u64, spacing: f32) -> Self {
        for i in 0..count {
            #[allow(clippy::cast_precision_loss)]
            let x = i as f32 * spacing;
            self.toys.push((first + i, Vec3::new(x, 0.0, 0.0), true));
        }
        self
    }

    /// Builds the dispatcher and the log every toy writes into.
    pub fn build(self) -> Result<(SignalDispatcher<RecordingToy>, DeliveryLog), FixtureError> {
        let log = DeliveryLog::new();
        let mut bus = SignalDispatcher::with_config(self.config)?;
        for (raw, position, placed) in self.toys {
            let handle = Handle::new(raw).ok_or(FixtureError::ZeroHandle)?;
            bus.register_object(RecordingToy::new(handle, position, &log))?;
            if placed {
                bus.place_in_space(handle)?;
            }
        }
        Ok((bus, log))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use echo_signal::SignalReceiver;

    #[test]
    fn line_places_every_toy() {
        let (bus, log) = SceneBuilder::new().line(10, 3, 5.0).build().unwrap();
        assert_eq!(bus.len(), 3);
        assert!(log.is_empty());
        for raw in 10..13 {
            let handle = Handle::new(raw).unwrap();
            let pos = bus.object(handle).unwrap().world_position();
            let key = echo_signal::SpatialCellKey::from_position(pos);
            assert!(bus.space().contains(handle, key));
        }
    }

    #[test]
    fn zero_handle_is_reported() {
        let err = SceneBuilder::new().placed(0, Vec3::ZERO).build().err();
        assert!(matches!(err, Some(FixtureError::ZeroHandle)));
    }
}
