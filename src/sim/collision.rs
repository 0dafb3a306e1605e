//! Collision resolution
//!
//! Turns an unordered overlap between two bodies into exactly one damage
//! application. Roles are fixed by [`Body`] variant, so the only probing left
//! is whether a projectile actually carries hit data.

use glam::DVec2;

use super::damage::{Combat, CombatContext, DamageRouter, PoolScope};
use super::enemy::{DamageOutcome, EnemyHandle};
use super::hazard::{HazardId, HazardSet};
use super::player::{PlayerCombat, PlayerHandle};
use super::projectile::{ProjectileId, ProjectileSet};

/// One side of an overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Body {
    Projectile(ProjectileId),
    Hostile(EnemyHandle),
    Player,
    Hazard(HazardId),
}

/// Canonical role assignment for a pair of bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing {
    ProjectileHostile(ProjectileId, EnemyHandle),
    PlayerHostile(EnemyHandle),
    HostileHazard(EnemyHandle, HazardId),
    /// No rule covers this combination
    Unmatched,
}

impl Pairing {
    /// Order-independent: `of(a, b) == of(b, a)`
    pub fn of(a: Body, b: Body) -> Self {
        use Body::*;
        match (a, b) {
            (Projectile(p), Hostile(h)) | (Hostile(h), Projectile(p)) => {
                Pairing::ProjectileHostile(p, h)
            }
            (Player, Hostile(h)) | (Hostile(h), Player) => Pairing::PlayerHostile(h),
            (Hostile(h), Hazard(z)) | (Hazard(z), Hostile(h)) => Pairing::HostileHazard(h, z),
            _ => Pairing::Unmatched,
        }
    }
}

/// What a dispatched overlap did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// Inactive body, spent ledger entry, cooldown, or no matching rule
    Ignored,
    /// A custom hit handler resolved the hit
    Custom,
    Hit(DamageOutcome),
    Contact { damage: f64, game_over: bool },
    HazardTick(DamageOutcome),
}

/// Borrowed view of the simulation used for one overlap pass
pub struct CollisionDispatcher<'a> {
    pub(crate) combat: Combat<'a>,
    pub(crate) projectiles: &'a mut ProjectileSet,
    pub(crate) hazards: &'a HazardSet,
    pub(crate) player: &'a mut dyn PlayerHandle,
    pub(crate) player_combat: &'a mut PlayerCombat,
}

impl<'a> CollisionDispatcher<'a> {
    pub fn dispatch(&mut self, a: Body, b: Body) -> Resolution {
        match Pairing::of(a, b) {
            Pairing::ProjectileHostile(p, h) => self.projectile_hit(p, h),
            Pairing::PlayerHostile(h) => self.contact(h),
            Pairing::HostileHazard(h, z) => self.hazard_tick(h, z),
            Pairing::Unmatched => {
                log::debug!("No collision rule for {:?} / {:?}", a, b);
                Resolution::Ignored
            }
        }
    }

    fn projectile_hit(&mut self, id: ProjectileId, target: EnemyHandle) -> Resolution {
        let Some(projectile) = self.projectiles.get_mut(id).filter(|p| p.is_active()) else {
            return Resolution::Ignored;
        };
        let Some(enemy_pos) = self.combat.enemy_position(target) else {
            return Resolution::Ignored;
        };
        if !projectile.carries_hit_data() {
            log::debug!("Projectile {:?} carries no hit data; overlap ignored", id);
            return Resolution::Ignored;
        }

        if let Some(mut handler) = projectile.take_handler() {
            handler.on_hit(projectile, target, &mut self.combat);
            projectile.restore_handler(handler);
            return Resolution::Custom;
        }

        let policy = self.combat.policy;
        let now = self.combat.now_ms();
        // Same pass re-hits spend neither damage nor pierce
        if !projectile
            .ledger
            .try_register(target, now, policy.default_immunity_ms)
        {
            return Resolution::Ignored;
        }

        let damage = projectile.damage.unwrap_or(policy.base_damage);
        projectile.consume_pierce();

        if projectile.knockback > 0.0 {
            let dir = (enemy_pos - projectile.position)
                .try_normalize()
                .or_else(|| projectile.velocity.try_normalize())
                .unwrap_or(DVec2::X);
            self.combat.apply_knockback(
                target,
                dir * projectile.knockback,
                policy.knockback_duration_ms,
            );
        }

        let amount = if projectile.crit_kill && self.combat.roll(policy.crit_kill_chance) {
            log::trace!("Crit kill on {:?}", target);
            policy.instant_kill_amount
        } else {
            damage
        };
        let outcome = self.combat.damage_entity(target, amount);

        if projectile.area_effect {
            self.combat
                .apply_aoe_damage(enemy_pos, policy.explode_radius, damage, PoolScope::All);
        }
        if let Some(paralysis) = projectile.paralysis
            && self.combat.roll(paralysis.chance)
        {
            self.combat.paralyze(target, paralysis.duration_ms);
        }
        if projectile.marks {
            self.combat.mark(target);
        }

        Resolution::Hit(outcome)
    }

    fn contact(&mut self, target: EnemyHandle) -> Resolution {
        if self.player_combat.blocks_contact() || self.player.is_invulnerable() {
            return Resolution::Ignored;
        }
        let now = self.combat.now_ms();
        let Some(enemy) = self
            .combat
            .pools
            .entity_mut(target)
            .filter(|e| e.is_alive())
        else {
            return Resolution::Ignored;
        };
        if !enemy.can_attack(now) {
            return Resolution::Ignored;
        }
        enemy.record_attack(now);
        let damage = self.player_combat.filter_damage(enemy.contact_damage);

        if self.player_combat.reflect_active {
            let reflected = damage * self.combat.policy.reflect_multiplier;
            for linked in self.player_combat.linked().to_vec() {
                self.combat.damage_entity(linked, reflected);
            }
            let pools = &*self.combat.pools;
            self.player_combat
                .retain_links(|h| pools.entity(h).is_some_and(|e| e.is_alive()));
        }

        self.player.take_damage(damage);
        let game_over = self.player.hp() <= 0.0 && self.player_combat.latch_game_over();
        if game_over {
            log::info!("Player down at {:.1}s", now / 1000.0);
            self.combat.hooks.on_game_over();
        }
        Resolution::Contact { damage, game_over }
    }

    fn hazard_tick(&mut self, target: EnemyHandle, id: HazardId) -> Resolution {
        let Some(hazard) = self.hazards.get(id).filter(|h| h.is_active()) else {
            return Resolution::Ignored;
        };
        let now = self.combat.now_ms();
        let default_tick = self.combat.policy.hazard_tick_ms;
        let Some(enemy) = self
            .combat
            .pools
            .entity_mut(target)
            .filter(|e| e.is_alive())
        else {
            return Resolution::Ignored;
        };
        if !hazard.ready_for(enemy.status.last_hazard_hit_ms, now, default_tick) {
            return Resolution::Ignored;
        }
        enemy.status.last_hazard_hit_ms = Some(now);
        Resolution::HazardTick(self.combat.damage_entity(target, hazard.damage_per_tick))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::EnemyKind;

    fn enemy() -> EnemyHandle {
        EnemyHandle {
            kind: EnemyKind::Rattata,
            slot: 0,
            generation: 1,
        }
    }

    #[test]
    fn test_pairing_is_order_independent() {
        let p = Body::Projectile(ProjectileId(3));
        let h = Body::Hostile(enemy());
        let z = Body::Hazard(HazardId(1));

        assert_eq!(Pairing::of(p, h), Pairing::of(h, p));
        assert_eq!(Pairing::of(p, h), Pairing::ProjectileHostile(ProjectileId(3), enemy()));
        assert_eq!(Pairing::of(Body::Player, h), Pairing::of(h, Body::Player));
        assert_eq!(Pairing::of(z, h), Pairing::HostileHazard(enemy(), HazardId(1)));
    }

    #[test]
    fn test_unmatched_pairs() {
        let p = Body::Projectile(ProjectileId(1));
        assert_eq!(Pairing::of(p, p), Pairing::Unmatched);
        assert_eq!(Pairing::of(Body::Player, p), Pairing::Unmatched);
        assert_eq!(
            Pairing::of(Body::Hostile(enemy()), Body::Hostile(enemy())),
            Pairing::Unmatched
        );
    }
}
