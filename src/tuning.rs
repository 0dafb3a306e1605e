//! Data-driven game balance
//!
//! Loaded from JSON (or built in code via `Default`) and validated once
//! before the simulation is wired up.

use std::collections::BTreeMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::consts::{POOL_SIZE_PER_KIND, SPAWN_RADIUS};
use crate::error::TuningError;
use crate::sim::damage::DamagePolicy;
use crate::sim::enemy::{EnemyKind, EnemyStats};
use crate::sim::spawner::WaveDefinition;

/// Axis-aligned world rectangle used to clamp spawn positions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl WorldBounds {
    pub fn clamp(&self, p: DVec2) -> DVec2 {
        p.clamp(self.min, self.max)
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// Cosmetic timings that still gate simulation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusPolicy {
    /// How long the white hit flash lasts
    pub hit_flash_ms: f64,
    /// Fade-out after death before the slot is reusable
    pub death_fade_ms: f64,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            hit_flash_ms: 100.0,
            death_fade_ms: 200.0,
        }
    }
}

/// All balance knobs for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Ordered by start time ascending
    pub waves: Vec<WaveDefinition>,
    pub enemy_stats: BTreeMap<EnemyKind, EnemyStats>,
    /// Distance from the player at which enemies appear
    pub spawn_radius: f64,
    /// Slots per enemy kind
    pub pool_capacity: usize,
    /// Spawn positions are clamped into these bounds when set
    pub world_bounds: Option<WorldBounds>,
    /// Cap on live projectiles; `None` for unlimited
    pub projectile_limit: Option<usize>,
    pub damage: DamagePolicy,
    pub status: StatusPolicy,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            waves: WaveDefinition::default_schedule(),
            enemy_stats: EnemyKind::ALL
                .iter()
                .map(|&kind| (kind, EnemyStats::for_kind(kind)))
                .collect(),
            spawn_radius: SPAWN_RADIUS,
            pool_capacity: POOL_SIZE_PER_KIND,
            world_bounds: None,
            projectile_limit: None,
            damage: DamagePolicy::default(),
            status: StatusPolicy::default(),
        }
    }
}

impl Tuning {
    /// Parse and validate tuning JSON. Missing fields take default values.
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!(
            "Loaded tuning: {} waves, pool capacity {}",
            tuning.waves.len(),
            tuning.pool_capacity
        );
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Stats for a kind; falls back to the reference stats
    pub fn stats(&self, kind: EnemyKind) -> EnemyStats {
        self.enemy_stats
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| EnemyStats::for_kind(kind))
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if self.waves.is_empty() {
            return Err(TuningError::NoWaves);
        }
        if self.pool_capacity == 0 {
            return Err(TuningError::ZeroPoolCapacity);
        }
        if self.spawn_radius < 0.0 {
            return Err(TuningError::NegativeSpawnRadius(self.spawn_radius));
        }

        let mut previous_ms = f64::NEG_INFINITY;
        for (index, wave) in self.waves.iter().enumerate() {
            if wave.start_time_ms < previous_ms {
                return Err(TuningError::WavesOutOfOrder {
                    index,
                    start_ms: wave.start_time_ms,
                    previous_ms,
                });
            }
            previous_ms = wave.start_time_ms;

            if wave.allowed_kinds.is_empty() {
                return Err(TuningError::EmptyWave(index));
            }
            if wave.spawn_interval_ms <= 0.0 || !wave.spawn_interval_ms.is_finite() {
                return Err(TuningError::BadInterval {
                    index,
                    interval_ms: wave.spawn_interval_ms,
                });
            }
            if let Some(kind) = wave
                .allowed_kinds
                .iter()
                .find(|kind| !self.enemy_stats.contains_key(kind))
            {
                return Err(TuningError::MissingStats(*kind));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let tuning = Tuning::default();
        assert!(tuning.validate().is_ok());
        assert_eq!(tuning.waves.len(), 3);
        assert_eq!(tuning.spawn_radius, 600.0);
        assert_eq!(tuning.pool_capacity, 100);
    }

    #[test]
    fn test_json_round_trip_with_defaults() {
        let tuning = Tuning::from_json(r#"{ "pool_capacity": 4 }"#).unwrap();
        assert_eq!(tuning.pool_capacity, 4);
        assert_eq!(tuning.waves, WaveDefinition::default_schedule());

        let json = tuning.to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }

    #[test]
    fn test_rejects_unsorted_waves() {
        let mut tuning = Tuning::default();
        tuning.waves.swap(0, 2);
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::WavesOutOfOrder { index: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_bad_wave_contents() {
        let mut tuning = Tuning::default();
        tuning.waves[1].allowed_kinds.clear();
        assert!(matches!(tuning.validate(), Err(TuningError::EmptyWave(1))));

        let mut tuning = Tuning::default();
        tuning.waves[0].spawn_interval_ms = 0.0;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::BadInterval { index: 0, .. })
        ));

        let mut tuning = Tuning::default();
        tuning.enemy_stats.remove(&EnemyKind::Geodude);
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::MissingStats(EnemyKind::Geodude))
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(TuningError::Parse(_))
        ));
    }

    #[test]
    fn test_bounds_clamp() {
        let bounds = WorldBounds {
            min: DVec2::ZERO,
            max: DVec2::new(100.0, 100.0),
        };
        assert_eq!(bounds.clamp(DVec2::new(-5.0, 150.0)), DVec2::new(0.0, 100.0));
        assert!(bounds.contains(DVec2::new(100.0, 0.0)));
        assert!(!bounds.contains(DVec2::new(100.5, 0.0)));
    }
}
