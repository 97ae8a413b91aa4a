// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Float32 value types carried by signals and used for placement.

mod quat;
mod vec3;

pub use quat::Quat;
pub use vec3::Vec3;
