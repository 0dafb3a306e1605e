//! Damage routing
//!
//! [`Combat`] is the one place HP is reduced. The collision dispatcher, hit
//! handlers and host weapon code all go through the [`DamageRouter`] /
//! [`CombatContext`] traits it implements, so damage amplification, hit
//! flashes and the death sequence are applied the same way for every source.

use glam::DVec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::clock::Clock;
use super::enemy::{DamageOutcome, EnemyHandle, EnemyKind, EnemyTier, Tint};
use super::pool::EnemyPools;
use super::world::SimTimer;
use crate::tuning::StatusPolicy;

/// Combat constants shared by every damage source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamagePolicy {
    /// Applied to hits on marked entities; the result is floored
    pub marked_multiplier: f64,
    /// Chance for a crit-kill projectile to kill outright
    pub crit_kill_chance: f64,
    /// Damage dealt by a successful crit-kill
    pub instant_kill_amount: f64,
    /// Used when a projectile carries no damage of its own
    pub base_damage: f64,
    /// Fan-out radius of area-effect projectiles
    pub explode_radius: f64,
    /// Contact damage multiple sent back to linked entities while reflecting
    pub reflect_multiplier: f64,
    pub knockback_duration_ms: f64,
    /// Re-hit window for lingering effects
    pub default_immunity_ms: f64,
    pub hazard_tick_ms: f64,
    /// Owner heal when a cursed, heal-on-kill entity dies
    pub cursed_kill_heal: f64,
}

impl Default for DamagePolicy {
    fn default() -> Self {
        Self {
            marked_multiplier: 1.25,
            crit_kill_chance: 0.2,
            instant_kill_amount: 9999.0,
            base_damage: 10.0,
            explode_radius: 80.0,
            reflect_multiplier: 5.0,
            knockback_duration_ms: 200.0,
            default_immunity_ms: 500.0,
            hazard_tick_ms: 500.0,
            cursed_kill_heal: 1.0,
        }
    }
}

impl DamagePolicy {
    /// Incoming damage after status amplification
    pub fn amplify(&self, amount: f64, marked: bool) -> f64 {
        if marked {
            (amount * self.marked_multiplier).floor()
        } else {
            amount
        }
    }
}

/// Which pools an area effect reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolScope {
    All,
    Kind(EnemyKind),
}

impl PoolScope {
    pub fn includes(self, kind: EnemyKind) -> bool {
        match self {
            PoolScope::All => true,
            PoolScope::Kind(k) => k == kind,
        }
    }
}

/// Payload of the loot/XP notification, sent exactly once per death
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeathEvent {
    pub handle: EnemyHandle,
    pub position: DVec2,
    pub kind: EnemyKind,
    pub tier: EnemyTier,
    pub boss: bool,
}

/// Best-effort cosmetic triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualCue {
    HitFlash(EnemyHandle),
    FlashEnded(EnemyHandle),
    Paralyzed(EnemyHandle),
    Cured(EnemyHandle),
    /// Death fade started; the slot frees when it ends
    DeathFade(EnemyHandle),
}

/// Callbacks into the surrounding game
///
/// Only `on_death` is required; the rest default to no-ops.
pub trait CombatHooks {
    /// Loot and XP drop
    fn on_death(&mut self, event: &DeathEvent);

    fn on_owner_heal(&mut self, _amount: f64) {}

    /// Player HP reached zero; fires once per run
    fn on_game_over(&mut self) {}

    fn on_visual(&mut self, _cue: VisualCue) {}

    /// An entity entered play (dex marking and the like)
    fn on_spawn(&mut self, _handle: EnemyHandle, _kind: EnemyKind) {}
}

/// The damage sink weapon content calls into
pub trait DamageRouter {
    /// Damage one entity. Stale or dying handles are a no-op.
    fn apply_direct_damage(&mut self, target: EnemyHandle, amount: f64) -> DamageOutcome;

    /// Damage every live entity in `scope` whose center is within `radius`
    /// of `center`. Returns how many were hit.
    fn apply_aoe_damage(&mut self, center: DVec2, radius: f64, amount: f64, scope: PoolScope)
    -> usize;

    /// Kill every live entity. Returns how many died.
    fn wipe_enemies(&mut self) -> usize;
}

/// Everything a hit handler may touch
pub trait CombatContext: DamageRouter {
    fn now_ms(&self) -> f64;

    fn policy(&self) -> &DamagePolicy;

    /// Position of a live entity
    fn enemy_position(&self, target: EnemyHandle) -> Option<DVec2>;

    fn apply_knockback(&mut self, target: EnemyHandle, force: DVec2, duration_ms: f64) -> bool;

    /// Enter or extend paralysis and schedule its check
    fn paralyze(&mut self, target: EnemyHandle, duration_ms: f64) -> bool;

    /// Tag for amplified damage
    fn mark(&mut self, target: EnemyHandle) -> bool;

    /// True with probability `chance`
    fn roll(&mut self, chance: f64) -> bool;
}

/// Borrowed view of the simulation used for one batch of damage
pub struct Combat<'a> {
    pub(crate) pools: &'a mut EnemyPools,
    pub(crate) clock: &'a mut Clock<SimTimer>,
    pub(crate) rng: &'a mut Pcg32,
    pub(crate) policy: &'a DamagePolicy,
    pub(crate) status: &'a StatusPolicy,
    pub(crate) hooks: &'a mut dyn CombatHooks,
}

impl<'a> Combat<'a> {
    /// Apply damage with status amplification, hit flash and death
    pub fn damage_entity(&mut self, target: EnemyHandle, amount: f64) -> DamageOutcome {
        let Some(entity) = self.pools.entity_mut(target) else {
            log::debug!("Damage to stale handle {:?} ignored", target);
            return DamageOutcome::Ignored;
        };
        let amount = self.policy.amplify(amount, entity.status.marked);
        let outcome = entity.take_damage(amount);
        if outcome == DamageOutcome::Ignored {
            return outcome;
        }

        entity.tint = Some(Tint::HitFlash);
        self.clock
            .after(self.status.hit_flash_ms, SimTimer::FlashEnd { handle: target });
        self.hooks.on_visual(VisualCue::HitFlash(target));
        log::trace!("{:?} took {} -> {:?}", target, amount, outcome);

        if outcome == DamageOutcome::Killed {
            self.begin_death(target);
        }
        outcome
    }

    /// Kill regardless of HP or amplification
    pub fn force_kill(&mut self, target: EnemyHandle) -> bool {
        let Some(entity) = self.pools.entity_mut(target) else {
            return false;
        };
        if entity.take_damage(f64::INFINITY) != DamageOutcome::Killed {
            return false;
        }
        self.begin_death(target);
        true
    }

    /// Runs once per life, right after the `dying` latch is set
    fn begin_death(&mut self, target: EnemyHandle) {
        let Some(entity) = self.pools.entity_mut(target) else {
            return;
        };
        let event = DeathEvent {
            handle: target,
            position: entity.position,
            kind: entity.kind(),
            tier: entity.tier,
            boss: entity.is_boss,
        };
        let heal = entity.status.cursed && entity.status.heal_owner_on_kill;

        let fade_ms = self.status.death_fade_ms;
        if fade_ms <= 0.0 {
            entity.return_to_pool();
        }

        self.hooks.on_death(&event);
        if heal {
            self.hooks.on_owner_heal(self.policy.cursed_kill_heal);
        }
        if fade_ms > 0.0 {
            self.clock.after(fade_ms, SimTimer::DeathFade { handle: target });
            self.hooks.on_visual(VisualCue::DeathFade(target));
        }
    }

    fn live_in_range(&self, center: DVec2, radius: f64, scope: PoolScope) -> Vec<EnemyHandle> {
        let radius_sq = radius * radius;
        self.pools
            .iter()
            .filter(|e| e.is_alive() && scope.includes(e.kind()))
            .filter(|e| e.position.distance_squared(center) <= radius_sq)
            .map(|e| e.handle())
            .collect()
    }
}

impl DamageRouter for Combat<'_> {
    fn apply_direct_damage(&mut self, target: EnemyHandle, amount: f64) -> DamageOutcome {
        self.damage_entity(target, amount)
    }

    fn apply_aoe_damage(
        &mut self,
        center: DVec2,
        radius: f64,
        amount: f64,
        scope: PoolScope,
    ) -> usize {
        let targets = self.live_in_range(center, radius, scope);
        targets
            .into_iter()
            .filter(|&h| self.damage_entity(h, amount) != DamageOutcome::Ignored)
            .count()
    }

    fn wipe_enemies(&mut self) -> usize {
        let killed = self
            .pools
            .alive_handles()
            .into_iter()
            .filter(|&h| self.force_kill(h))
            .count();
        log::info!("Wiped {} enemies", killed);
        killed
    }
}

impl CombatContext for Combat<'_> {
    fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    fn policy(&self) -> &DamagePolicy {
        self.policy
    }

    fn enemy_position(&self, target: EnemyHandle) -> Option<DVec2> {
        self.pools
            .entity(target)
            .filter(|e| e.is_alive())
            .map(|e| e.position)
    }

    fn apply_knockback(&mut self, target: EnemyHandle, force: DVec2, duration_ms: f64) -> bool {
        let now = self.clock.now_ms();
        self.pools
            .entity_mut(target)
            .is_some_and(|e| e.apply_knockback(now, force, duration_ms))
    }

    fn paralyze(&mut self, target: EnemyHandle, duration_ms: f64) -> bool {
        let now = self.clock.now_ms();
        let Some(entered) = self
            .pools
            .entity_mut(target)
            .and_then(|e| e.paralyze(now, duration_ms))
        else {
            return false;
        };
        // Each call checks at its own expiry; only the latest one cures
        self.clock
            .after(duration_ms, SimTimer::ParalysisCheck { handle: target });
        if entered {
            self.hooks.on_visual(VisualCue::Paralyzed(target));
        }
        true
    }

    fn mark(&mut self, target: EnemyHandle) -> bool {
        match self.pools.entity_mut(target).filter(|e| e.is_alive()) {
            Some(entity) => {
                entity.status.marked = true;
                true
            }
            None => false,
        }
    }

    fn roll(&mut self, chance: f64) -> bool {
        chance > 0.0 && self.rng.random::<f64>() < chance
    }
}
