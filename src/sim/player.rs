//! Player-side collaborators
//!
//! The simulation never owns the player. It reads position and HP through
//! [`PlayerHandle`] and keeps only the combat flags it needs to resolve
//! contact damage.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::enemy::EnemyHandle;
use crate::consts::PLAYER_RADIUS;

/// Non-owning reference enemies hold to their movement target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

/// The host's player object
pub trait PlayerHandle {
    fn id(&self) -> PlayerId {
        PlayerId(0)
    }

    fn position(&self) -> DVec2;

    /// Collision radius used by the overlap pass
    fn radius(&self) -> f64 {
        PLAYER_RADIUS
    }

    fn hp(&self) -> f64;

    fn take_damage(&mut self, amount: f64);

    /// Post-hit invulnerability frames and the like
    fn is_invulnerable(&self) -> bool {
        false
    }
}

/// Passive damage modifier, e.g. elemental resistance
pub type DamageFilter = Box<dyn Fn(f64) -> f64>;

/// Player flags consulted on contact
#[derive(Default)]
pub struct PlayerCombat {
    /// Debug or ability invincibility; contact is skipped entirely
    pub invincible: bool,
    /// Reflect contact damage onto linked entities
    pub reflect_active: bool,
    linked: Vec<EnemyHandle>,
    damage_filter: Option<DamageFilter>,
    game_over: bool,
}

impl std::fmt::Debug for PlayerCombat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerCombat")
            .field("invincible", &self.invincible)
            .field("reflect_active", &self.reflect_active)
            .field("linked", &self.linked)
            .field("damage_filter", &self.damage_filter.is_some())
            .field("game_over", &self.game_over)
            .finish()
    }
}

impl PlayerCombat {
    pub fn set_damage_filter(&mut self, filter: impl Fn(f64) -> f64 + 'static) {
        self.damage_filter = Some(Box::new(filter));
    }

    pub fn clear_damage_filter(&mut self) {
        self.damage_filter = None;
    }

    /// Incoming contact damage after the passive filter
    pub fn filter_damage(&self, amount: f64) -> f64 {
        match &self.damage_filter {
            Some(filter) => filter(amount).max(0.0),
            None => amount,
        }
    }

    pub fn link(&mut self, handle: EnemyHandle) {
        if !self.linked.contains(&handle) {
            self.linked.push(handle);
        }
    }

    pub fn linked(&self) -> &[EnemyHandle] {
        &self.linked
    }

    /// Forget links for which `keep` returns false
    pub fn retain_links(&mut self, keep: impl Fn(EnemyHandle) -> bool) {
        self.linked.retain(|&h| keep(h));
    }

    pub fn clear_links(&mut self) {
        self.linked.clear();
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Latch game over; true only the first time
    pub(crate) fn latch_game_over(&mut self) -> bool {
        !std::mem::replace(&mut self.game_over, true)
    }

    /// Contact resolution is skipped while this holds
    pub fn blocks_contact(&self) -> bool {
        self.game_over || self.invincible
    }
}
