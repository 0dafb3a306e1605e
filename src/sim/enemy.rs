//! Hostile entities
//!
//! Entities live in pool slots for the whole run. A slot cycles through
//! dormant -> active -> dying -> dormant; every spawn bumps the slot's
//! generation so handles taken during an earlier life go stale.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::player::PlayerId;
use super::status::StatusEffectController;

/// Hostile entity species
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Fast chaff that swarms the player
    Rattata,
    /// Evasive rusher with sine-wave movement
    Zubat,
    /// Slow, heavy tank
    Geodude,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Rattata, EnemyKind::Zubat, EnemyKind::Geodude];

    /// Dense index for per-kind tables
    pub fn index(self) -> usize {
        match self {
            EnemyKind::Rattata => 0,
            EnemyKind::Zubat => 1,
            EnemyKind::Geodude => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyKind::Rattata => "rattata",
            EnemyKind::Zubat => "zubat",
            EnemyKind::Geodude => "geodude",
        }
    }
}

/// Loot tier, forwarded to loot collaborators on death
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EnemyTier {
    #[default]
    Tier1,
    Tier2,
    Tier3,
    Tier4,
    Tier5,
    Boss,
}

/// How an entity steers toward its target
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum MovementStyle {
    /// Straight line at the target
    #[default]
    Direct,
    /// Aim at a point offset perpendicular to the target line by
    /// `sin(now / period) * amplitude`
    SineWave { amplitude: f64, period_ms: f64 },
}

/// Base stats for one kind, before level scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyStats {
    /// Units per second
    pub speed: f64,
    pub max_hp: f64,
    /// Damage dealt to the player on contact
    pub contact_damage: f64,
    /// Knockback resistance hint for the host physics
    pub mass: f64,
    pub tier: EnemyTier,
    /// Collision radius
    pub radius: f64,
    pub boss: bool,
    /// Minimum time between contact hits; `None` hits every overlap
    pub attack_cooldown_ms: Option<f64>,
    pub movement: MovementStyle,
}

impl Default for EnemyStats {
    fn default() -> Self {
        Self {
            speed: 100.0,
            max_hp: 10.0,
            contact_damage: 1.0,
            mass: 1.0,
            tier: EnemyTier::Tier1,
            radius: 12.0,
            boss: false,
            attack_cooldown_ms: None,
            movement: MovementStyle::Direct,
        }
    }
}

impl EnemyStats {
    /// Reference stats for each kind
    pub fn for_kind(kind: EnemyKind) -> Self {
        match kind {
            EnemyKind::Rattata => Self {
                speed: 100.0,
                max_hp: 10.0,
                radius: 12.0,
                ..Default::default()
            },
            EnemyKind::Zubat => Self {
                speed: 140.0,
                max_hp: 5.0,
                tier: EnemyTier::Tier2,
                radius: 10.0,
                movement: MovementStyle::SineWave {
                    amplitude: 50.0,
                    period_ms: 200.0,
                },
                ..Default::default()
            },
            EnemyKind::Geodude => Self {
                speed: 40.0,
                max_hp: 50.0,
                mass: 100.0,
                tier: EnemyTier::Tier2,
                radius: 14.0,
                ..Default::default()
            },
        }
    }

    /// Scale HP (+10%/level) and contact damage (+5%/level) for the player's level
    pub fn scaled_for_level(&self, level: u32) -> Self {
        let steps = level.saturating_sub(1) as f64;
        let hp_mult = 1.0 + steps * 0.1;
        let dmg_mult = 1.0 + steps * 0.05;
        Self {
            max_hp: (self.max_hp * hp_mult).round(),
            contact_damage: (self.contact_damage * dmg_mult).round(),
            ..self.clone()
        }
    }
}

/// Stable reference to one life of a pool slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyHandle {
    pub kind: EnemyKind,
    pub slot: u32,
    pub generation: u32,
}

/// Cosmetic tint requested by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tint {
    HitFlash,
    Paralyzed,
}

/// Result of applying damage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Entity was inactive, dying, or the handle was stale
    Ignored,
    /// HP reduced, entity survives
    Hurt { remaining_hp: f64 },
    /// This hit started the death sequence
    Killed,
}

/// A pooled hostile entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostileEntity {
    kind: EnemyKind,
    slot: u32,
    generation: u32,
    pub is_boss: bool,
    hp: f64,
    max_hp: f64,
    pub position: DVec2,
    pub velocity: DVec2,
    pub radius: f64,
    pub mass: f64,
    pub contact_damage: f64,
    pub tier: EnemyTier,
    pub movement: MovementStyle,
    attack_cooldown_ms: Option<f64>,
    last_attack_ms: Option<f64>,
    /// Non-owning back-reference to the movement target
    target: Option<PlayerId>,
    active: bool,
    dying: bool,
    pub visible: bool,
    pub tint: Option<Tint>,
    pub status: StatusEffectController,
}

impl HostileEntity {
    /// A dormant slot: inactive, invisible, zeroed
    pub fn dormant(kind: EnemyKind, slot: u32) -> Self {
        Self {
            kind,
            slot,
            generation: 0,
            is_boss: false,
            hp: 0.0,
            max_hp: 0.0,
            position: DVec2::ZERO,
            velocity: DVec2::ZERO,
            radius: 0.0,
            mass: 1.0,
            contact_damage: 0.0,
            tier: EnemyTier::Tier1,
            movement: MovementStyle::Direct,
            attack_cooldown_ms: None,
            last_attack_ms: None,
            target: None,
            active: false,
            dying: false,
            visible: false,
            tint: None,
            status: StatusEffectController::default(),
        }
    }

    /// Fully reset the slot for a new life and activate it
    pub fn init(
        &mut self,
        stats: &EnemyStats,
        target: PlayerId,
        kind: EnemyKind,
        position: DVec2,
    ) -> EnemyHandle {
        self.kind = kind;
        self.generation = self.generation.wrapping_add(1);
        self.is_boss = stats.boss;
        self.max_hp = stats.max_hp.max(0.0);
        self.hp = self.max_hp;
        self.position = position;
        self.velocity = DVec2::ZERO;
        self.radius = stats.radius;
        self.mass = stats.mass;
        self.contact_damage = stats.contact_damage;
        self.tier = stats.tier;
        self.movement = stats.movement;
        self.attack_cooldown_ms = stats.attack_cooldown_ms;
        self.last_attack_ms = None;
        self.target = Some(target);
        self.active = true;
        self.dying = false;
        self.visible = true;
        self.tint = None;
        self.status.reset(stats.speed);
        self.handle()
    }

    pub fn handle(&self) -> EnemyHandle {
        EnemyHandle {
            kind: self.kind,
            slot: self.slot,
            generation: self.generation,
        }
    }

    pub fn kind(&self) -> EnemyKind {
        self.kind
    }

    pub fn hp(&self) -> f64 {
        self.hp
    }

    pub fn max_hp(&self) -> f64 {
        self.max_hp
    }

    pub fn speed(&self) -> f64 {
        self.status.speed()
    }

    pub fn target(&self) -> Option<PlayerId> {
        self.target
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_dying(&self) -> bool {
        self.dying
    }

    /// Active and not dying: can be hit, can move, can attack
    pub fn is_alive(&self) -> bool {
        self.active && !self.dying
    }

    /// Slot may be handed out again
    pub fn is_reusable(&self) -> bool {
        !self.active && !self.dying
    }

    /// True if `handle` refers to this slot's current life
    pub fn matches(&self, handle: EnemyHandle) -> bool {
        self.kind == handle.kind && self.slot == handle.slot && self.generation == handle.generation
    }

    /// Contact-attack gate
    pub fn can_attack(&self, now_ms: f64) -> bool {
        match (self.attack_cooldown_ms, self.last_attack_ms) {
            (Some(cooldown), Some(last)) => now_ms >= last + cooldown,
            _ => true,
        }
    }

    pub fn record_attack(&mut self, now_ms: f64) {
        self.last_attack_ms = Some(now_ms);
    }

    /// Per-tick movement
    ///
    /// While knocked back the velocity set by the knockback is integrated
    /// as-is; otherwise the entity steers toward `target_pos` at its
    /// effective speed (zero while paralyzed).
    pub fn update(&mut self, now_ms: f64, dt_ms: f64, target_pos: Option<DVec2>) {
        if !self.is_alive() {
            return;
        }
        let dt = dt_ms / 1000.0;

        if self.status.is_knocked_back(now_ms) {
            self.position += self.velocity * dt;
            return;
        }

        let Some(target) = target_pos.filter(|_| self.target.is_some()) else {
            self.velocity = DVec2::ZERO;
            return;
        };

        let aim = match self.movement {
            MovementStyle::Direct => target,
            MovementStyle::SineWave {
                amplitude,
                period_ms,
            } => {
                let toward = (target - self.position).normalize_or_zero();
                let perp = toward.perp();
                let offset = if period_ms > 0.0 {
                    (now_ms / period_ms).sin() * amplitude
                } else {
                    0.0
                };
                target + perp * offset
            }
        };

        self.velocity = (aim - self.position).normalize_or_zero() * self.status.speed();
        self.position += self.velocity * dt;
    }

    /// Reduce HP. Starts the death sequence at most once.
    pub fn take_damage(&mut self, amount: f64) -> DamageOutcome {
        if !self.is_alive() {
            return DamageOutcome::Ignored;
        }
        self.hp = (self.hp - amount.max(0.0)).max(0.0);
        if self.hp <= 0.0 {
            self.dying = true;
            self.velocity = DVec2::ZERO;
            DamageOutcome::Killed
        } else {
            DamageOutcome::Hurt {
                remaining_hp: self.hp,
            }
        }
    }

    /// Set velocity directly and extend the knockback window. Bosses ignore it.
    pub fn apply_knockback(&mut self, now_ms: f64, force: DVec2, duration_ms: f64) -> bool {
        if !self.is_alive() || self.is_boss {
            return false;
        }
        self.velocity = force;
        self.status.extend_knockback(now_ms, duration_ms);
        true
    }

    /// Enter or extend paralysis. Returns true on first entry, `None` if the
    /// entity cannot be paralyzed right now.
    pub fn paralyze(&mut self, now_ms: f64, duration_ms: f64) -> Option<bool> {
        if !self.is_alive() {
            return None;
        }
        let entered = self.status.paralyze(now_ms, duration_ms);
        if entered {
            self.velocity = DVec2::ZERO;
            self.tint = Some(Tint::Paralyzed);
        }
        Some(entered)
    }

    /// Deferred check scheduled by [`Self::paralyze`]; true if cured
    pub fn paralysis_check(&mut self, now_ms: f64) -> bool {
        if !self.is_alive() {
            return false;
        }
        let cured = self.status.paralysis_check(now_ms);
        if cured && self.tint == Some(Tint::Paralyzed) {
            self.tint = None;
        }
        cured
    }

    /// Tint after a hit flash ends
    pub fn settle_tint(&mut self) {
        if self.is_alive() {
            self.tint = self.status.is_paralyzed().then_some(Tint::Paralyzed);
        }
    }

    /// Deactivate and hide; the slot becomes reusable
    pub fn return_to_pool(&mut self) {
        self.active = false;
        self.dying = false;
        self.visible = false;
        self.hp = 0.0;
        self.target = None;
        self.velocity = DVec2::ZERO;
        self.tint = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawned(kind: EnemyKind) -> HostileEntity {
        let mut e = HostileEntity::dormant(kind, 0);
        e.init(&EnemyStats::for_kind(kind), PlayerId(1), kind, DVec2::ZERO);
        e
    }

    #[test]
    fn test_dormant_slot() {
        let e = HostileEntity::dormant(EnemyKind::Rattata, 3);
        assert!(!e.is_active());
        assert!(!e.visible);
        assert!(e.is_reusable());
    }

    #[test]
    fn test_init_bumps_generation() {
        let mut e = HostileEntity::dormant(EnemyKind::Rattata, 0);
        let stats = EnemyStats::for_kind(EnemyKind::Rattata);
        let first = e.init(&stats, PlayerId(1), EnemyKind::Rattata, DVec2::ZERO);
        e.return_to_pool();
        let second = e.init(&stats, PlayerId(1), EnemyKind::Rattata, DVec2::ZERO);
        assert_ne!(first, second);
        assert!(!e.matches(first));
        assert!(e.matches(second));
        assert_eq!(e.hp(), 10.0);
    }

    #[test]
    fn test_lethal_damage_latches_dying() {
        let mut e = spawned(EnemyKind::Rattata);
        assert_eq!(e.take_damage(15.0), DamageOutcome::Killed);
        assert!(e.is_dying());
        assert_eq!(e.hp(), 0.0);
        assert_eq!(e.take_damage(15.0), DamageOutcome::Ignored);
        assert_eq!(e.hp(), 0.0);
    }

    #[test]
    fn test_moves_toward_target() {
        let mut e = spawned(EnemyKind::Rattata);
        e.update(0.0, 1000.0, Some(DVec2::new(500.0, 0.0)));
        assert!((e.position.x - 100.0).abs() < 1e-9);
        assert!(e.position.y.abs() < 1e-9);
    }

    #[test]
    fn test_knockback_suppresses_seeking() {
        let mut e = spawned(EnemyKind::Rattata);
        let force = DVec2::new(0.0, -300.0);
        assert!(e.apply_knockback(0.0, force, 200.0));

        e.update(100.0, 100.0, Some(DVec2::new(500.0, 0.0)));
        assert_eq!(e.velocity, force);

        e.update(200.0, 100.0, Some(DVec2::new(500.0, 0.0)));
        assert!(e.velocity.x > 0.0);
    }

    #[test]
    fn test_boss_ignores_knockback() {
        let mut e = HostileEntity::dormant(EnemyKind::Geodude, 0);
        let stats = EnemyStats {
            boss: true,
            ..EnemyStats::for_kind(EnemyKind::Geodude)
        };
        e.init(&stats, PlayerId(1), EnemyKind::Geodude, DVec2::ZERO);
        assert!(!e.apply_knockback(0.0, DVec2::X * 500.0, 300.0));
        assert_eq!(e.velocity, DVec2::ZERO);
        assert_eq!(e.paralyze(0.0, 100.0), Some(true));
    }

    #[test]
    fn test_paralysis_stops_movement() {
        let mut e = spawned(EnemyKind::Rattata);
        e.paralyze(0.0, 500.0);
        e.update(16.0, 16.0, Some(DVec2::new(500.0, 0.0)));
        assert_eq!(e.position, DVec2::ZERO);
        assert_eq!(e.tint, Some(Tint::Paralyzed));

        assert!(e.paralysis_check(500.0));
        assert_eq!(e.speed(), 100.0);
        assert_eq!(e.tint, None);
    }

    #[test]
    fn test_attack_cooldown() {
        let mut e = HostileEntity::dormant(EnemyKind::Rattata, 0);
        let stats = EnemyStats {
            attack_cooldown_ms: Some(500.0),
            ..Default::default()
        };
        e.init(&stats, PlayerId(1), EnemyKind::Rattata, DVec2::ZERO);
        assert!(e.can_attack(0.0));
        e.record_attack(0.0);
        assert!(!e.can_attack(499.0));
        assert!(e.can_attack(500.0));
    }

    #[test]
    fn test_level_scaling() {
        let base = EnemyStats::for_kind(EnemyKind::Geodude);
        let scaled = base.scaled_for_level(11);
        assert_eq!(scaled.max_hp, 100.0);
        assert_eq!(scaled.contact_damage, 2.0);
        assert_eq!(base.scaled_for_level(1), base);
    }
}
