//! Projectiles and their hit bookkeeping
//!
//! Projectiles are created by weapon code and are not pooled. A projectile
//! either carries plain hit metadata (damage, pierce, flags) that the
//! collision dispatcher resolves with the default rules, or a [`HitHandler`]
//! that owns its own rules.

use std::collections::HashMap;
use std::fmt;

use glam::DVec2;

use super::damage::CombatContext;
use super::enemy::{EnemyHandle, EnemyKind};

/// Identifier of a projectile inside a [`ProjectileSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(pub u64);

/// Who fired a projectile (weapon slot, ability id, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OwnerHandle(pub u32);

/// Additional entities a projectile may damage after its first hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pierce {
    Finite(i32),
    Infinite,
}

impl Pierce {
    /// Spend one unit; true while the projectile survives
    fn consume(&mut self) -> bool {
        match self {
            Pierce::Infinite => true,
            Pierce::Finite(n) => {
                *n -= 1;
                *n >= 0
            }
        }
    }
}

/// Pool slot an entity occupies, shared by every generation of that slot
pub type SlotKey = (EnemyKind, u32);

fn slot_key(handle: EnemyHandle) -> SlotKey {
    (handle.kind, handle.slot)
}

/// Which entities a projectile has already affected
///
/// Entries are kept per pool slot and remember the generation that was hit,
/// so a ledger never outgrows the pools no matter how often slots recycle.
/// A new occupant of a slot counts as never hit.
#[derive(Debug, Clone)]
pub enum HitLedger {
    /// Each entity at most once (a single pass of a piercing shot)
    Once(HashMap<SlotKey, u32>),
    /// Lingering effects: re-hit allowed once the window has passed
    Immunity {
        /// `None` uses the damage policy's default window
        window_ms: Option<f64>,
        last_hit: HashMap<SlotKey, (u32, f64)>,
    },
}

impl Default for HitLedger {
    fn default() -> Self {
        HitLedger::Once(HashMap::new())
    }
}

impl HitLedger {
    pub fn immunity(window_ms: f64) -> Self {
        HitLedger::Immunity {
            window_ms: Some(window_ms),
            last_hit: HashMap::new(),
        }
    }

    /// Immunity ledger that takes its window from the damage policy
    pub fn lingering() -> Self {
        HitLedger::Immunity {
            window_ms: None,
            last_hit: HashMap::new(),
        }
    }

    /// Record a hit on `target`. Returns false if the hit must be skipped.
    ///
    /// `default_window_ms` applies to immunity ledgers without their own
    /// window. A re-hit needs strictly more than the window to have passed.
    pub fn try_register(
        &mut self,
        target: EnemyHandle,
        now_ms: f64,
        default_window_ms: f64,
    ) -> bool {
        match self {
            HitLedger::Once(seen) => {
                seen.insert(slot_key(target), target.generation) != Some(target.generation)
            }
            HitLedger::Immunity {
                window_ms,
                last_hit,
            } => {
                let window = window_ms.unwrap_or(default_window_ms);
                match last_hit.get(&slot_key(target)) {
                    Some(&(generation, last))
                        if generation == target.generation && now_ms <= last + window =>
                    {
                        false
                    }
                    _ => {
                        last_hit.insert(slot_key(target), (target.generation, now_ms));
                        true
                    }
                }
            }
        }
    }

    pub fn has_hit(&self, target: EnemyHandle) -> bool {
        let key = slot_key(target);
        match self {
            HitLedger::Once(seen) => seen.get(&key) == Some(&target.generation),
            HitLedger::Immunity { last_hit, .. } => {
                last_hit.get(&key).is_some_and(|&(g, _)| g == target.generation)
            }
        }
    }

    /// Number of slots with a recorded hit
    pub fn len(&self) -> usize {
        match self {
            HitLedger::Once(seen) => seen.len(),
            HitLedger::Immunity { last_hit, .. } => last_hit.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Chance-based paralysis applied on hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParalysisOnHit {
    pub chance: f64,
    pub duration_ms: f64,
}

/// Custom on-hit behaviour for a projectile
///
/// Handlers own their pierce, immunity and knockback rules; the default
/// resolution is skipped entirely when one is present.
pub trait HitHandler {
    fn on_hit(
        &mut self,
        projectile: &mut Projectile,
        target: EnemyHandle,
        ctx: &mut dyn CombatContext,
    );
}

impl<F> HitHandler for F
where
    F: FnMut(&mut Projectile, EnemyHandle, &mut dyn CombatContext),
{
    fn on_hit(
        &mut self,
        projectile: &mut Projectile,
        target: EnemyHandle,
        ctx: &mut dyn CombatContext,
    ) {
        self(projectile, target, ctx)
    }
}

/// A damage source resolved by the collision dispatcher
pub struct Projectile {
    id: ProjectileId,
    pub owner: OwnerHandle,
    pub position: DVec2,
    pub velocity: DVec2,
    pub radius: f64,
    /// `None` falls back to the policy's base damage
    pub damage: Option<f64>,
    /// `None` means no pierce metadata; the first hit spends the projectile
    pub pierce: Option<Pierce>,
    /// Knockback speed pushed onto hit entities
    pub knockback: f64,
    /// Also damages everything around the hit point
    pub area_effect: bool,
    /// Rolls for an instant kill
    pub crit_kill: bool,
    pub paralysis: Option<ParalysisOnHit>,
    /// Marks hit entities for amplified damage
    pub marks: bool,
    pub ledger: HitLedger,
    /// Despawns after this long; `None` lives until spent
    pub lifetime_ms: Option<f64>,
    age_ms: f64,
    active: bool,
    pub visible: bool,
    pub scale: f64,
    pub tinted: bool,
    handler: Option<Box<dyn HitHandler>>,
}

impl fmt::Debug for Projectile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projectile")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("position", &self.position)
            .field("damage", &self.damage)
            .field("pierce", &self.pierce)
            .field("active", &self.active)
            .field("custom_handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Projectile {
    fn default() -> Self {
        Self {
            id: ProjectileId(0),
            owner: OwnerHandle::default(),
            position: DVec2::ZERO,
            velocity: DVec2::ZERO,
            radius: 4.0,
            damage: None,
            pierce: None,
            knockback: 0.0,
            area_effect: false,
            crit_kill: false,
            paralysis: None,
            marks: false,
            ledger: HitLedger::default(),
            lifetime_ms: None,
            age_ms: 0.0,
            active: true,
            visible: true,
            scale: 1.0,
            tinted: false,
            handler: None,
        }
    }
}

impl Projectile {
    pub fn new(owner: OwnerHandle, position: DVec2, velocity: DVec2) -> Self {
        Self {
            owner,
            position,
            velocity,
            ..Default::default()
        }
    }

    pub fn with_damage(mut self, damage: f64) -> Self {
        self.damage = Some(damage);
        self
    }

    pub fn with_pierce(mut self, pierce: Pierce) -> Self {
        self.pierce = Some(pierce);
        self
    }

    pub fn with_knockback(mut self, knockback: f64) -> Self {
        self.knockback = knockback;
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_lifetime(mut self, lifetime_ms: f64) -> Self {
        self.lifetime_ms = Some(lifetime_ms);
        self
    }

    pub fn exploding(mut self) -> Self {
        self.area_effect = true;
        self
    }

    pub fn crit_kill(mut self) -> Self {
        self.crit_kill = true;
        self
    }

    pub fn marking(mut self) -> Self {
        self.marks = true;
        self
    }

    pub fn with_paralysis(mut self, chance: f64, duration_ms: f64) -> Self {
        self.paralysis = Some(ParalysisOnHit {
            chance,
            duration_ms,
        });
        self
    }

    /// Re-hit the same entity after `window_ms` instead of never
    pub fn with_immunity(mut self, window_ms: f64) -> Self {
        self.ledger = HitLedger::immunity(window_ms);
        self
    }

    /// Re-hit the same entity after the policy's default immunity window
    pub fn lingering(mut self) -> Self {
        self.ledger = HitLedger::lingering();
        self
    }

    pub fn with_handler(mut self, handler: impl HitHandler + 'static) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn id(&self) -> ProjectileId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn age_ms(&self) -> f64 {
        self.age_ms
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Whether this body can act as the damaging side of a collision
    pub fn carries_hit_data(&self) -> bool {
        self.handler.is_some() || self.damage.is_some() || self.pierce.is_some()
    }

    pub(crate) fn take_handler(&mut self) -> Option<Box<dyn HitHandler>> {
        self.handler.take()
    }

    pub(crate) fn restore_handler(&mut self, handler: Box<dyn HitHandler>) {
        if self.handler.is_none() {
            self.handler = Some(handler);
        }
    }

    /// Spend pierce for one hit; deactivates once the budget runs out
    pub fn consume_pierce(&mut self) {
        let survives = match self.pierce.as_mut() {
            Some(pierce) => pierce.consume(),
            None => false,
        };
        if !survives {
            self.deactivate();
        }
    }

    /// Stop colliding, hide, and reset visual state
    pub fn deactivate(&mut self) {
        self.active = false;
        self.visible = false;
        self.tinted = false;
        self.scale = 1.0;
    }

    /// Move and age; expires at end of lifetime
    pub fn integrate(&mut self, dt_ms: f64) {
        if !self.active {
            return;
        }
        self.position += self.velocity * (dt_ms / 1000.0);
        self.age_ms += dt_ms;
        if self.lifetime_ms.is_some_and(|life| self.age_ms >= life) {
            self.deactivate();
        }
    }
}

/// Live projectiles with an optional population cap
#[derive(Debug)]
pub struct ProjectileSet {
    projectiles: Vec<Projectile>,
    next_id: u64,
    limit: Option<usize>,
}

impl Default for ProjectileSet {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ProjectileSet {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            projectiles: Vec::new(),
            next_id: 1,
            limit,
        }
    }

    /// Add a projectile; dropped (returns `None`) when the cap is reached
    pub fn spawn(&mut self, mut projectile: Projectile) -> Option<ProjectileId> {
        if self.limit.is_some_and(|limit| self.live_count() >= limit) {
            log::debug!("Projectile limit reached, spawn dropped");
            return None;
        }
        let id = ProjectileId(self.next_id);
        self.next_id += 1;
        projectile.id = id;
        self.projectiles.push(projectile);
        Some(id)
    }

    pub fn get(&self, id: ProjectileId) -> Option<&Projectile> {
        self.projectiles.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: ProjectileId) -> Option<&mut Projectile> {
        self.projectiles.iter_mut().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.iter()
    }

    pub fn live_count(&self) -> usize {
        self.projectiles.iter().filter(|p| p.active).count()
    }

    /// Ids of projectiles that can still collide, in spawn order
    pub fn active_ids(&self) -> Vec<ProjectileId> {
        self.projectiles
            .iter()
            .filter(|p| p.active)
            .map(|p| p.id)
            .collect()
    }

    pub fn integrate(&mut self, dt_ms: f64) {
        for p in &mut self.projectiles {
            p.integrate(dt_ms);
        }
    }

    /// Drop projectiles that are spent, expired, or outside `keep`
    pub fn sweep(&mut self, keep: impl Fn(DVec2) -> bool) {
        self.projectiles.retain(|p| p.active && keep(p.position));
    }
}
