//! Simulation module
//!
//! All gameplay logic lives here:
//! - Single-threaded, fixed timestep
//! - Seeded RNG only
//! - Deferred work goes through the [`Clock`], never through callbacks
//! - No rendering, input or platform dependencies

pub mod clock;
pub mod collision;
pub mod damage;
pub mod enemy;
pub mod hazard;
pub mod player;
pub mod pool;
pub mod projectile;
pub mod spawner;
pub mod status;
mod tick;
pub mod world;

pub use clock::{Clock, Fired, TimerId};
pub use collision::{Body, CollisionDispatcher, Pairing, Resolution};
pub use damage::{
    Combat, CombatContext, CombatHooks, DamagePolicy, DamageRouter, DeathEvent, PoolScope,
    VisualCue,
};
pub use enemy::{
    DamageOutcome, EnemyHandle, EnemyKind, EnemyStats, EnemyTier, HostileEntity, MovementStyle,
    Tint,
};
pub use hazard::{Hazard, HazardId, HazardSet};
pub use player::{DamageFilter, PlayerCombat, PlayerHandle, PlayerId};
pub use pool::{EnemyPools, EntityPool};
pub use projectile::{
    HitHandler, HitLedger, OwnerHandle, ParalysisOnHit, Pierce, Projectile, ProjectileId,
    ProjectileSet,
};
pub use spawner::{WaveDefinition, WaveSpawner};
pub use status::StatusEffectController;
pub use world::{SimTimer, Simulation, SimulationBuilder};
