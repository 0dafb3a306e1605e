//! Wave Survivor - real-time simulation core for a wave-based survival game
//!
//! Core modules:
//! - `sim`: Fixed-tick simulation (clock, pools, spawner, status effects, combat)
//! - `tuning`: Data-driven game balance
//! - `error`: Configuration and wiring errors
//!
//! Rendering, input, UI and weapon content live outside this crate and talk to
//! it through the traits in [`sim::damage`], [`sim::player`] and
//! [`sim::projectile`].

pub mod error;
pub mod sim;
pub mod tuning;

pub use error::{TuningError, WiringError};
pub use sim::{Simulation, SimulationBuilder};
pub use tuning::Tuning;

use glam::DVec2;

/// Simulation constants
pub mod consts {
    /// Fixed simulation timestep in milliseconds (60 Hz)
    pub const SIM_DT_MS: f64 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Distance from the player at which new enemies appear (just off-screen)
    pub const SPAWN_RADIUS: f64 = 600.0;
    /// Slots per enemy kind
    pub const POOL_SIZE_PER_KIND: usize = 100;

    /// Default collision radius of the player body
    pub const PLAYER_RADIUS: f64 = 16.0;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f64, theta: f64) -> DVec2 {
    DVec2::new(r * theta.cos(), r * theta.sin())
}

/// True when two circles overlap (touching counts)
#[inline]
pub fn circles_overlap(a: DVec2, ra: f64, b: DVec2, rb: f64) -> bool {
    let reach = ra + rb;
    a.distance_squared(b) <= reach * reach
}
