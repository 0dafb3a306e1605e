//! Simulation state
//!
//! [`Simulation`] owns every piece of per-run state: the clock, the spawner
//! (and through it the enemy pools), projectiles, hazards and the seeded RNG.
//! The player and the game-side hooks are injected through
//! [`SimulationBuilder`]; there is no global lookup.

use glam::DVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::clock::Clock;
use super::collision::{Body, CollisionDispatcher, Resolution};
use super::damage::{Combat, CombatHooks, DamageRouter};
use super::enemy::{EnemyHandle, EnemyKind, HostileEntity};
use super::hazard::{Hazard, HazardId, HazardSet};
use super::player::{PlayerCombat, PlayerHandle};
use super::pool::EnemyPools;
use super::projectile::{Projectile, ProjectileId, ProjectileSet};
use super::spawner::WaveSpawner;
use crate::error::WiringError;
use crate::tuning::Tuning;

/// Deferred work scheduled on the simulation clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimTimer {
    /// Spawner cadence
    Spawn,
    /// Cure paralysis if its latest expiry has passed
    ParalysisCheck { handle: EnemyHandle },
    /// Clear the hit-flash tint
    FlashEnd { handle: EnemyHandle },
    /// Return a dead entity's slot to its pool
    DeathFade { handle: EnemyHandle },
}

/// Wires a [`Simulation`] together; fails fast on missing collaborators
#[derive(Default)]
pub struct SimulationBuilder {
    seed: u64,
    tuning: Option<Tuning>,
    player: Option<Box<dyn PlayerHandle>>,
    hooks: Option<Box<dyn CombatHooks>>,
}

impl SimulationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Balance data; defaults to [`Tuning::default`]
    pub fn tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = Some(tuning);
        self
    }

    pub fn player(mut self, player: impl PlayerHandle + 'static) -> Self {
        self.player = Some(Box::new(player));
        self
    }

    pub fn hooks(mut self, hooks: impl CombatHooks + 'static) -> Self {
        self.hooks = Some(Box::new(hooks));
        self
    }

    pub fn build(self) -> Result<Simulation, WiringError> {
        let tuning = self.tuning.unwrap_or_default();
        tuning.validate()?;
        let player = self
            .player
            .ok_or(WiringError::MissingCollaborator("player"))?;
        let hooks = self
            .hooks
            .ok_or(WiringError::MissingCollaborator("combat hooks"))?;

        log::info!(
            "Simulation wired: seed {}, {} waves, {} slots per kind",
            self.seed,
            tuning.waves.len(),
            tuning.pool_capacity
        );

        Ok(Simulation {
            clock: Clock::new(),
            spawner: WaveSpawner::new(&tuning),
            projectiles: ProjectileSet::new(tuning.projectile_limit),
            hazards: HazardSet::new(),
            player,
            player_combat: PlayerCombat::default(),
            hooks,
            rng: Pcg32::seed_from_u64(self.seed),
            seed: self.seed,
            tuning,
            accumulator_ms: 0.0,
        })
    }
}

/// One run of the game simulation
pub struct Simulation {
    pub(crate) clock: Clock<SimTimer>,
    pub(crate) spawner: WaveSpawner,
    pub(crate) projectiles: ProjectileSet,
    pub(crate) hazards: HazardSet,
    pub(crate) player: Box<dyn PlayerHandle>,
    pub(crate) player_combat: PlayerCombat,
    pub(crate) hooks: Box<dyn CombatHooks>,
    pub(crate) rng: Pcg32,
    seed: u64,
    pub(crate) tuning: Tuning,
    /// Unsimulated time carried between frames
    pub(crate) accumulator_ms: f64,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("seed", &self.seed)
            .field("now_ms", &self.clock.now_ms())
            .field("wave", &self.spawner.wave_index())
            .field("enemies", &self.spawner.active_count())
            .field("projectiles", &self.projectiles.live_count())
            .finish_non_exhaustive()
    }
}

impl Simulation {
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::new()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    pub fn clock(&self) -> &Clock<SimTimer> {
        &self.clock
    }

    /// Begin spawning waves
    pub fn start(&mut self) {
        self.spawner.start(&mut self.clock);
    }

    /// Stop spawning; live entities keep running
    pub fn stop(&mut self) {
        self.spawner.stop(&mut self.clock);
    }

    /// Freeze time, timers and movement
    pub fn set_paused(&mut self, paused: bool) {
        self.clock.set_paused(paused);
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn set_player_level(&mut self, level: u32) {
        self.spawner.set_player_level(level);
    }

    pub fn spawner(&self) -> &WaveSpawner {
        &self.spawner
    }

    pub fn pools(&self) -> &EnemyPools {
        self.spawner.pools()
    }

    /// Live entity behind a handle, or `None` if the handle is stale
    pub fn enemy(&self, handle: EnemyHandle) -> Option<&HostileEntity> {
        self.spawner.pools().entity(handle)
    }

    pub fn enemy_mut(&mut self, handle: EnemyHandle) -> Option<&mut HostileEntity> {
        self.spawner.pools_mut().entity_mut(handle)
    }

    pub fn player(&self) -> &dyn PlayerHandle {
        &*self.player
    }

    pub fn player_mut(&mut self) -> &mut dyn PlayerHandle {
        &mut *self.player
    }

    pub fn player_combat(&self) -> &PlayerCombat {
        &self.player_combat
    }

    pub fn player_combat_mut(&mut self) -> &mut PlayerCombat {
        &mut self.player_combat
    }

    pub fn is_game_over(&self) -> bool {
        self.player_combat.is_game_over()
    }

    /// Link an entity to the player's reflect buff
    pub fn link_enemy(&mut self, handle: EnemyHandle) -> bool {
        if !self.spawner.pools().entity(handle).is_some_and(|e| e.is_alive()) {
            return false;
        }
        self.player_combat.link(handle);
        true
    }

    /// Place an entity directly (bosses, scripted encounters)
    pub fn spawn_enemy_at(&mut self, kind: EnemyKind, position: DVec2) -> Option<EnemyHandle> {
        let handle = self.spawner.spawn_at(kind, self.player.id(), position)?;
        self.hooks.on_spawn(handle, kind);
        Some(handle)
    }

    pub fn projectiles(&self) -> &ProjectileSet {
        &self.projectiles
    }

    pub fn projectile_mut(&mut self, id: ProjectileId) -> Option<&mut Projectile> {
        self.projectiles.get_mut(id)
    }

    /// Fire a projectile; `None` when the projectile cap is reached
    pub fn spawn_projectile(&mut self, projectile: Projectile) -> Option<ProjectileId> {
        self.projectiles.spawn(projectile)
    }

    pub fn hazards(&self) -> &HazardSet {
        &self.hazards
    }

    pub fn spawn_hazard(&mut self, hazard: Hazard) -> HazardId {
        self.hazards.spawn(hazard)
    }

    /// Burning ground at `position`
    pub fn spawn_burning_ground(&mut self, position: DVec2, radius: f64) -> HazardId {
        self.spawn_hazard(Hazard::burning_ground(position, radius))
    }

    /// The damage sink for host weapon and ability code
    pub fn combat(&mut self) -> Combat<'_> {
        Combat {
            pools: self.spawner.pools_mut(),
            clock: &mut self.clock,
            rng: &mut self.rng,
            policy: &self.tuning.damage,
            status: &self.tuning.status,
            hooks: &mut *self.hooks,
        }
    }

    /// Kill every live entity
    pub fn wipe_enemies(&mut self) -> usize {
        self.combat().wipe_enemies()
    }

    /// Resolve one overlap reported by a host that runs its own broad phase
    pub fn dispatch(&mut self, a: Body, b: Body) -> Resolution {
        self.dispatcher().dispatch(a, b)
    }

    pub(crate) fn dispatcher(&mut self) -> CollisionDispatcher<'_> {
        CollisionDispatcher {
            combat: Combat {
                pools: self.spawner.pools_mut(),
                clock: &mut self.clock,
                rng: &mut self.rng,
                policy: &self.tuning.damage,
                status: &self.tuning.status,
                hooks: &mut *self.hooks,
            },
            projectiles: &mut self.projectiles,
            hazards: &self.hazards,
            player: &mut *self.player,
            player_combat: &mut self.player_combat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TuningError;
    use crate::sim::damage::DeathEvent;

    struct Dummy;

    impl PlayerHandle for Dummy {
        fn position(&self) -> DVec2 {
            DVec2::ZERO
        }

        fn hp(&self) -> f64 {
            100.0
        }

        fn take_damage(&mut self, _amount: f64) {}
    }

    struct Silent;

    impl CombatHooks for Silent {
        fn on_death(&mut self, _event: &DeathEvent) {}
    }

    #[test]
    fn test_build_requires_collaborators() {
        let err = Simulation::builder().hooks(Silent).build().unwrap_err();
        assert!(matches!(err, WiringError::MissingCollaborator("player")));

        let err = Simulation::builder().player(Dummy).build().unwrap_err();
        assert!(matches!(err, WiringError::MissingCollaborator("combat hooks")));
    }

    #[test]
    fn test_build_validates_tuning() {
        let tuning = Tuning {
            waves: Vec::new(),
            ..Default::default()
        };
        let err = Simulation::builder()
            .player(Dummy)
            .hooks(Silent)
            .tuning(tuning)
            .build()
            .unwrap_err();
        assert!(matches!(err, WiringError::Tuning(TuningError::NoWaves)));
    }

    #[test]
    fn test_start_stop() {
        let mut sim = Simulation::builder()
            .seed(9)
            .player(Dummy)
            .hooks(Silent)
            .build()
            .unwrap();
        assert_eq!(sim.seed(), 9);
        sim.start();
        assert!(sim.spawner().is_running());
        sim.stop();
        assert!(!sim.spawner().is_running());
        assert_eq!(sim.clock().pending(), 0);
    }

    #[test]
    fn test_link_enemy_tracks_live_entities_only() {
        let mut sim = Simulation::builder()
            .player(Dummy)
            .hooks(Silent)
            .build()
            .unwrap();
        let live = sim
            .spawn_enemy_at(EnemyKind::Geodude, DVec2::new(300.0, 0.0))
            .unwrap();
        let dead = sim
            .spawn_enemy_at(EnemyKind::Rattata, DVec2::new(-300.0, 0.0))
            .unwrap();
        sim.combat().force_kill(dead);

        assert!(sim.link_enemy(live));
        assert!(sim.link_enemy(live));
        assert!(!sim.link_enemy(dead));
        assert_eq!(sim.player_combat().linked(), &[live]);
    }
}
