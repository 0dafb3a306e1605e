//! Fixed timestep simulation tick
//!
//! One tick runs, in order: clock advance, spawn timers, spawner update,
//! entity movement, projectile and hazard integration, the overlap pass, and
//! finally the remaining deferred callbacks that came due this step.

use super::collision::Body;
use super::damage::VisualCue;
use super::world::{SimTimer, Simulation};
use crate::circles_overlap;
use crate::consts::{MAX_SUBSTEPS, SIM_DT_MS};

impl Simulation {
    /// Feed wall-clock frame time; runs as many fixed ticks as fit
    ///
    /// Returns the number of ticks run. Time beyond `MAX_SUBSTEPS` ticks is
    /// discarded so a long stall cannot snowball.
    pub fn update(&mut self, frame_ms: f64) -> u32 {
        if self.clock.is_paused() {
            return 0;
        }
        self.accumulator_ms += frame_ms.max(0.0);

        let mut substeps = 0;
        while self.accumulator_ms >= SIM_DT_MS && substeps < MAX_SUBSTEPS {
            self.tick(SIM_DT_MS);
            self.accumulator_ms -= SIM_DT_MS;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            self.accumulator_ms = self.accumulator_ms.min(SIM_DT_MS);
        }
        substeps
    }

    /// Advance the simulation by one step of `dt_ms`
    pub fn tick(&mut self, dt_ms: f64) {
        if self.clock.is_paused() {
            return;
        }

        let fired = self.clock.advance(dt_ms);
        let mut deferred = Vec::with_capacity(fired.len());
        for timer in fired {
            match timer.event {
                SimTimer::Spawn => {
                    if self.spawner.owns_timer(timer.id) {
                        self.spawn_enemy();
                    }
                }
                other => deferred.push(other),
            }
        }

        self.spawner.update(dt_ms, &mut self.clock);
        self.move_enemies(dt_ms);

        self.projectiles.integrate(dt_ms);
        self.hazards.integrate(dt_ms);

        self.overlap_pass();

        for event in deferred {
            self.run_deferred(event);
        }

        let bounds = self.tuning.world_bounds;
        self.projectiles
            .sweep(|p| bounds.is_none_or(|b| b.contains(p)));
        self.hazards.sweep();
    }

    fn spawn_enemy(&mut self) {
        let player = self.player.id();
        let position = self.player.position();
        if let Some(handle) = self.spawner.spawn_one(&mut self.rng, player, position) {
            self.hooks.on_spawn(handle, handle.kind);
        }
    }

    fn move_enemies(&mut self, dt_ms: f64) {
        let now = self.clock.now_ms();
        let player = self.player.id();
        let player_pos = self.player.position();
        for enemy in self.spawner.pools_mut().iter_mut() {
            let target = (enemy.target() == Some(player)).then_some(player_pos);
            enemy.update(now, dt_ms, target);
        }
    }

    /// Circle-overlap broad phase feeding the dispatcher
    ///
    /// Positions are snapshotted first; entities killed earlier in the pass
    /// are skipped by the dispatcher's liveness checks.
    fn overlap_pass(&mut self) {
        let enemies: Vec<_> = self
            .spawner
            .pools()
            .iter()
            .filter(|e| e.is_alive())
            .map(|e| (e.handle(), e.position, e.radius))
            .collect();
        if enemies.is_empty() {
            return;
        }

        let mut pairs = Vec::new();
        for p in self.projectiles.iter().filter(|p| p.is_active()) {
            for &(handle, pos, radius) in &enemies {
                if circles_overlap(p.position, p.radius, pos, radius) {
                    pairs.push((Body::Projectile(p.id()), Body::Hostile(handle)));
                }
            }
        }

        let player_pos = self.player.position();
        let player_radius = self.player.radius();
        for &(handle, pos, radius) in &enemies {
            if circles_overlap(player_pos, player_radius, pos, radius) {
                pairs.push((Body::Hostile(handle), Body::Player));
            }
        }

        for h in self.hazards.iter().filter(|h| h.is_active()) {
            for &(handle, pos, radius) in &enemies {
                if circles_overlap(h.position, h.radius, pos, radius) {
                    pairs.push((Body::Hostile(handle), Body::Hazard(h.id())));
                }
            }
        }

        let mut dispatcher = self.dispatcher();
        for (a, b) in pairs {
            dispatcher.dispatch(a, b);
        }
    }

    fn run_deferred(&mut self, event: SimTimer) {
        let now = self.clock.now_ms();
        let pools = self.spawner.pools_mut();
        match event {
            SimTimer::Spawn => {}
            SimTimer::ParalysisCheck { handle } => {
                if pools
                    .entity_mut(handle)
                    .is_some_and(|e| e.paralysis_check(now))
                {
                    self.hooks.on_visual(VisualCue::Cured(handle));
                }
            }
            SimTimer::FlashEnd { handle } => {
                if let Some(enemy) = pools.entity_mut(handle).filter(|e| e.is_alive()) {
                    enemy.settle_tint();
                    self.hooks.on_visual(VisualCue::FlashEnded(handle));
                }
            }
            SimTimer::DeathFade { handle } => {
                if let Some(enemy) = pools.entity_mut(handle).filter(|e| e.is_dying()) {
                    enemy.return_to_pool();
                    log::trace!("{:?} returned to pool", handle);
                }
            }
        }
    }
}
