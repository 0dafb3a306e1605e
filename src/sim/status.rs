//! Per-entity status effects
//!
//! Paralysis and knockback are independent axes; both windows only ever
//! extend. Paralysis owns the entity's effective speed: it stores the
//! pre-paralysis speed on first entry and restores it exactly once on cure.

use serde::{Deserialize, Serialize};

/// Timers, tags and effective speed for one hostile entity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusEffectController {
    /// Effective movement speed (units/sec); zero while paralyzed
    speed: f64,
    /// Speed to restore when paralysis is cured
    resting_speed: f64,
    paralyzed: bool,
    paralyzed_until_ms: f64,
    knocked_back_until_ms: f64,
    /// Takes amplified damage
    pub marked: bool,
    /// Cursed and heal-on-kill together heal the owner when this entity dies
    pub cursed: bool,
    pub heal_owner_on_kill: bool,
    /// Last time a hazard damaged this entity
    pub last_hazard_hit_ms: Option<f64>,
}

impl StatusEffectController {
    pub fn new(speed: f64) -> Self {
        Self {
            speed,
            resting_speed: speed,
            ..Default::default()
        }
    }

    /// Clear every status and set the base speed (used on spawn)
    pub fn reset(&mut self, speed: f64) {
        *self = Self::new(speed);
    }

    /// Effective speed after status effects
    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn is_paralyzed(&self) -> bool {
        self.paralyzed
    }

    pub fn paralyzed_until_ms(&self) -> f64 {
        self.paralyzed_until_ms
    }

    pub fn knocked_back_until_ms(&self) -> f64 {
        self.knocked_back_until_ms
    }

    pub fn is_knocked_back(&self, now_ms: f64) -> bool {
        now_ms < self.knocked_back_until_ms
    }

    /// Enter or extend paralysis. Returns true on first entry.
    ///
    /// The expiry becomes `max(current, now + duration)`; the caller schedules
    /// a check at `now + duration` that goes through [`Self::paralysis_check`].
    pub fn paralyze(&mut self, now_ms: f64, duration_ms: f64) -> bool {
        let entered = !self.paralyzed;
        if entered {
            self.resting_speed = self.speed;
            self.speed = 0.0;
            self.paralyzed = true;
        }
        self.paralyzed_until_ms = self.paralyzed_until_ms.max(now_ms + duration_ms.max(0.0));
        entered
    }

    /// Deferred paralysis check. Cures only once the latest expiry has passed;
    /// returns true if this call cured.
    pub fn paralysis_check(&mut self, now_ms: f64) -> bool {
        if !self.paralyzed || now_ms < self.paralyzed_until_ms {
            return false;
        }
        self.paralyzed = false;
        self.speed = self.resting_speed;
        true
    }

    /// Extend the knockback window; never shortens it
    pub fn extend_knockback(&mut self, now_ms: f64, duration_ms: f64) {
        self.knocked_back_until_ms = self.knocked_back_until_ms.max(now_ms + duration_ms.max(0.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_paralyze_zeroes_and_restores_speed() {
        let mut status = StatusEffectController::new(100.0);
        assert!(status.paralyze(0.0, 1000.0));
        assert_eq!(status.speed(), 0.0);

        assert!(!status.paralysis_check(999.0));
        assert!(status.paralysis_check(1000.0));
        assert_eq!(status.speed(), 100.0);
        // Second check is a no-op
        assert!(!status.paralysis_check(2000.0));
    }

    #[test]
    fn test_shorter_paralysis_does_not_cure_longer() {
        let mut status = StatusEffectController::new(80.0);
        status.paralyze(0.0, 1000.0);
        assert!(!status.paralyze(500.0, 200.0));
        assert_eq!(status.paralyzed_until_ms(), 1000.0);

        // The 200ms call's check fires at 700
        assert!(!status.paralysis_check(700.0));
        assert!(status.is_paralyzed());
        assert!(status.paralysis_check(1000.0));
    }

    #[test]
    fn test_re_paralyze_keeps_resting_speed() {
        let mut status = StatusEffectController::new(140.0);
        status.paralyze(0.0, 100.0);
        status.paralyze(50.0, 100.0);
        assert!(status.paralysis_check(150.0));
        assert_eq!(status.speed(), 140.0);
    }

    #[test]
    fn test_knockback_extends_only() {
        let mut status = StatusEffectController::new(100.0);
        status.extend_knockback(0.0, 500.0);
        status.extend_knockback(100.0, 100.0);
        assert_eq!(status.knocked_back_until_ms(), 500.0);
        assert!(status.is_knocked_back(499.0));
        assert!(!status.is_knocked_back(500.0));
    }

    proptest! {
        #[test]
        fn prop_paralysis_cures_after_latest_expiry(
            calls in proptest::collection::vec((0.0f64..500.0, 1.0f64..2000.0), 1..8)
        ) {
            let mut status = StatusEffectController::new(100.0);
            let mut now = 0.0;
            let mut checks = Vec::new();
            let mut latest: f64 = 0.0;
            for (gap, duration) in calls {
                now += gap;
                status.paralyze(now, duration);
                checks.push(now + duration);
                latest = latest.max(now + duration);
            }
            checks.sort_by(f64::total_cmp);

            let mut cures = 0;
            for at in checks {
                if status.paralysis_check(at) {
                    cures += 1;
                    prop_assert!(at >= latest);
                }
            }
            prop_assert_eq!(cures, 1);
            prop_assert_eq!(status.speed(), 100.0);
        }
    }
}
