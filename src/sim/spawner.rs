//! Wave-driven spawner
//!
//! Decides when, what and where hostile entities appear. Elapsed time selects
//! the active wave; the wave's interval drives a repeating clock timer that
//! is torn down and re-armed only when the wave index changes.

use std::f64::consts::TAU;

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::clock::{Clock, TimerId};
use super::enemy::{EnemyHandle, EnemyKind, EnemyStats};
use super::player::PlayerId;
use super::pool::EnemyPools;
use super::world::SimTimer;
use crate::polar_to_cartesian;
use crate::tuning::{Tuning, WorldBounds};

/// A time-gated spawn configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveDefinition {
    /// Elapsed time at which this wave becomes active
    pub start_time_ms: f64,
    pub allowed_kinds: Vec<EnemyKind>,
    pub spawn_interval_ms: f64,
}

impl WaveDefinition {
    pub fn new(start_time_ms: f64, allowed_kinds: Vec<EnemyKind>, spawn_interval_ms: f64) -> Self {
        Self {
            start_time_ms,
            allowed_kinds,
            spawn_interval_ms,
        }
    }

    /// Reference progression: rats, then bats, then rocks, each faster
    pub fn default_schedule() -> Vec<Self> {
        use EnemyKind::*;
        vec![
            Self::new(0.0, vec![Rattata], 1000.0),
            Self::new(60_000.0, vec![Rattata, Zubat], 500.0),
            Self::new(120_000.0, vec![Rattata, Zubat, Geodude], 200.0),
        ]
    }
}

/// Owns the enemy pools and the spawn cadence
#[derive(Debug)]
pub struct WaveSpawner {
    waves: Vec<WaveDefinition>,
    stats: Vec<EnemyStats>,
    pools: EnemyPools,
    spawn_radius: f64,
    bounds: Option<WorldBounds>,
    elapsed_ms: f64,
    wave_index: usize,
    timer: Option<TimerId>,
    running: bool,
    player_level: u32,
}

impl WaveSpawner {
    /// Build from validated tuning
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            waves: tuning.waves.clone(),
            stats: EnemyKind::ALL.iter().map(|&k| tuning.stats(k)).collect(),
            pools: EnemyPools::new(tuning.pool_capacity),
            spawn_radius: tuning.spawn_radius,
            bounds: tuning.world_bounds,
            elapsed_ms: 0.0,
            wave_index: 0,
            timer: None,
            running: false,
            player_level: 1,
        }
    }

    /// Reset progression and arm the first wave's timer. No-op while running.
    pub fn start(&mut self, clock: &mut Clock<SimTimer>) {
        if self.running {
            return;
        }
        self.running = true;
        self.elapsed_ms = 0.0;
        self.wave_index = 0;
        self.rearm(clock);
        log::info!("Spawner started");
    }

    /// Stop emitting new entities; live entities are unaffected. Idempotent.
    pub fn stop(&mut self, clock: &mut Clock<SimTimer>) {
        if let Some(id) = self.timer.take() {
            clock.cancel(id);
        }
        if self.running {
            log::info!("Spawner stopped at {:.1}s", self.elapsed_ms / 1000.0);
        }
        self.running = false;
    }

    /// Accumulate elapsed time and re-arm the spawn timer on wave change
    pub fn update(&mut self, dt_ms: f64, clock: &mut Clock<SimTimer>) {
        if !self.running {
            return;
        }
        self.elapsed_ms += dt_ms.max(0.0);

        let index = self.active_wave_index();
        if index != self.wave_index {
            self.wave_index = index;
            self.rearm(clock);
            log::info!(
                "Wave {} at {:.1}s: interval {}ms, kinds {:?}",
                index,
                self.elapsed_ms / 1000.0,
                self.waves[index].spawn_interval_ms,
                self.waves[index].allowed_kinds
            );
        }
    }

    /// Last wave whose start time has been reached (0 if none)
    fn active_wave_index(&self) -> usize {
        self.waves
            .iter()
            .rposition(|w| w.start_time_ms <= self.elapsed_ms)
            .unwrap_or(0)
    }

    fn rearm(&mut self, clock: &mut Clock<SimTimer>) {
        if let Some(id) = self.timer.take() {
            clock.cancel(id);
        }
        let interval = self.waves[self.wave_index].spawn_interval_ms;
        self.timer = Some(clock.every(interval, SimTimer::Spawn));
    }

    /// Spawn one entity around `player_pos`
    ///
    /// Returns `None` when stopped or when the chosen kind's pool is full; a
    /// full pool is backpressure, not an error.
    pub fn spawn_one<R: Rng>(
        &mut self,
        rng: &mut R,
        player: PlayerId,
        player_pos: DVec2,
    ) -> Option<EnemyHandle> {
        if !self.running {
            return None;
        }
        let wave = &self.waves[self.wave_index];
        if wave.allowed_kinds.is_empty() {
            return None;
        }
        let kind = wave.allowed_kinds[rng.random_range(0..wave.allowed_kinds.len())];

        let angle = rng.random_range(0.0..TAU);
        let mut position = player_pos + polar_to_cartesian(self.spawn_radius, angle);
        if let Some(bounds) = self.bounds {
            position = bounds.clamp(position);
        }

        self.spawn_at(kind, player, position)
    }

    /// Place one entity of `kind` at `position`, outside the wave cadence
    pub fn spawn_at(
        &mut self,
        kind: EnemyKind,
        player: PlayerId,
        position: DVec2,
    ) -> Option<EnemyHandle> {
        let stats = self.stats[kind.index()].scaled_for_level(self.player_level);
        let Some(slot) = self.pools.pool_mut(kind).get() else {
            log::debug!("{} pool exhausted, spawn dropped", kind.as_str());
            return None;
        };
        let handle = slot.init(&stats, player, kind, position);
        log::trace!(
            "Spawned {} at ({:.0}, {:.0}) hp {}",
            kind.as_str(),
            position.x,
            position.y,
            stats.max_hp
        );
        Some(handle)
    }

    /// Whether `id` is the live spawn timer (stale ones are ignored)
    pub fn owns_timer(&self, id: TimerId) -> bool {
        self.timer == Some(id)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn wave_index(&self) -> usize {
        self.wave_index
    }

    pub fn current_wave(&self) -> &WaveDefinition {
        &self.waves[self.wave_index]
    }

    pub fn timer(&self) -> Option<TimerId> {
        self.timer
    }

    /// Player level used for stat scaling on future spawns
    pub fn set_player_level(&mut self, level: u32) {
        self.player_level = level.max(1);
    }

    pub fn player_level(&self) -> u32 {
        self.player_level
    }

    pub fn pools(&self) -> &EnemyPools {
        &self.pools
    }

    pub fn pools_mut(&mut self) -> &mut EnemyPools {
        &mut self.pools
    }

    pub fn active_count(&self) -> usize {
        self.pools.active_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn tuning_with_capacity(capacity: usize) -> Tuning {
        Tuning {
            pool_capacity: capacity,
            ..Default::default()
        }
    }

    #[test]
    fn test_start_arms_first_wave() {
        let mut clock = Clock::new();
        let mut spawner = WaveSpawner::new(&Tuning::default());
        spawner.start(&mut clock);
        let first = spawner.timer();
        assert!(first.is_some());
        assert_eq!(clock.pending(), 1);

        // Idempotent
        spawner.start(&mut clock);
        assert_eq!(spawner.timer(), first);
        assert_eq!(clock.pending(), 1);

        let fired = clock.advance(1000.0);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].event, SimTimer::Spawn);
    }

    #[test]
    fn test_stop_cancels_timer() {
        let mut clock = Clock::new();
        let mut spawner = WaveSpawner::new(&Tuning::default());
        spawner.start(&mut clock);
        spawner.stop(&mut clock);
        spawner.stop(&mut clock);
        assert!(!spawner.is_running());
        assert!(clock.advance(5000.0).is_empty());

        let mut rng = Pcg32::seed_from_u64(1);
        assert!(spawner.spawn_one(&mut rng, PlayerId(1), DVec2::ZERO).is_none());
    }

    #[test]
    fn test_wave_change_rearms_at_new_interval() {
        let mut clock = Clock::new();
        let mut spawner = WaveSpawner::new(&Tuning::default());
        spawner.start(&mut clock);
        let first = spawner.timer().unwrap();

        clock.advance(60_000.0);
        spawner.update(60_000.0, &mut clock);
        assert_eq!(spawner.wave_index(), 1);
        let second = spawner.timer().unwrap();
        assert_ne!(first, second);
        assert!(!clock.is_scheduled(first));

        let fired = clock.advance(1000.0);
        assert_eq!(fired.len(), 2);
        assert!(fired.iter().all(|f| f.id == second));
        assert_eq!(fired[0].at_ms, 60_500.0);
    }

    #[test]
    fn test_spawn_position_on_radius() {
        let mut clock = Clock::new();
        let mut spawner = WaveSpawner::new(&Tuning::default());
        spawner.start(&mut clock);
        let mut rng = Pcg32::seed_from_u64(7);
        let player_pos = DVec2::new(250.0, -40.0);

        for _ in 0..20 {
            let handle = spawner.spawn_one(&mut rng, PlayerId(1), player_pos).unwrap();
            let e = spawner.pools().entity(handle).unwrap();
            assert!((e.position.distance(player_pos) - 600.0).abs() < 1e-6);
            assert_eq!(e.kind(), EnemyKind::Rattata);
            assert_eq!(e.target(), Some(PlayerId(1)));
        }
    }

    #[test]
    fn test_spawn_clamped_to_bounds() {
        let tuning = Tuning {
            world_bounds: Some(WorldBounds {
                min: DVec2::new(-100.0, -100.0),
                max: DVec2::new(100.0, 100.0),
            }),
            ..Default::default()
        };
        let mut clock = Clock::new();
        let mut spawner = WaveSpawner::new(&tuning);
        spawner.start(&mut clock);
        let mut rng = Pcg32::seed_from_u64(3);
        let handle = spawner.spawn_one(&mut rng, PlayerId(1), DVec2::ZERO).unwrap();
        let p = spawner.pools().entity(handle).unwrap().position;
        assert!(p.x.abs() <= 100.0 && p.y.abs() <= 100.0);
    }

    #[test]
    fn test_full_pool_drops_spawn() {
        let mut clock = Clock::new();
        let mut spawner = WaveSpawner::new(&tuning_with_capacity(2));
        spawner.start(&mut clock);
        let mut rng = Pcg32::seed_from_u64(11);

        let spawned: Vec<_> = (0..3)
            .map(|_| spawner.spawn_one(&mut rng, PlayerId(1), DVec2::ZERO))
            .collect();
        assert!(spawned[0].is_some());
        assert!(spawned[1].is_some());
        assert!(spawned[2].is_none());
        assert_eq!(spawner.active_count(), 2);
    }

    #[test]
    fn test_level_scaling_applies_on_spawn() {
        let mut clock = Clock::new();
        let mut spawner = WaveSpawner::new(&Tuning::default());
        spawner.set_player_level(11);
        spawner.start(&mut clock);
        let mut rng = Pcg32::seed_from_u64(5);
        let handle = spawner.spawn_one(&mut rng, PlayerId(1), DVec2::ZERO).unwrap();
        assert_eq!(spawner.pools().entity(handle).unwrap().max_hp(), 20.0);
    }

    proptest! {
        #[test]
        fn prop_pool_capacity_holds(
            capacity in 1usize..8,
            extra in 1usize..8,
            seed in any::<u64>(),
        ) {
            let mut clock = Clock::new();
            let mut spawner = WaveSpawner::new(&tuning_with_capacity(capacity));
            spawner.start(&mut clock);
            let mut rng = Pcg32::seed_from_u64(seed);
            for _ in 0..capacity + extra {
                spawner.spawn_one(&mut rng, PlayerId(1), DVec2::ZERO);
                prop_assert!(spawner.active_count() <= capacity);
            }
            prop_assert_eq!(spawner.active_count(), capacity);
        }

        #[test]
        fn prop_wave_index_monotonic(deltas in proptest::collection::vec(0.0f64..20_000.0, 1..40)) {
            let mut clock = Clock::new();
            let mut spawner = WaveSpawner::new(&Tuning::default());
            spawner.start(&mut clock);
            let waves = Tuning::default().waves;
            let mut last = spawner.wave_index();
            for dt in deltas {
                clock.advance(dt);
                spawner.update(dt, &mut clock);
                prop_assert!(spawner.wave_index() >= last);

                if spawner.wave_index() != last {
                    // Only the spawner's elapsed time drives waves, so the clock
                    // can run ahead to observe the re-armed cadence
                    let interval = waves[spawner.wave_index()].spawn_interval_ms;
                    let rearmed_at = clock.now_ms();
                    let fired: Vec<_> = clock
                        .advance(interval * 2.5)
                        .into_iter()
                        .filter(|f| spawner.owns_timer(f.id))
                        .map(|f| f.at_ms)
                        .collect();
                    prop_assert_eq!(fired.len(), 2);
                    prop_assert!((fired[0] - rearmed_at - interval).abs() < 1e-6);
                    prop_assert!((fired[1] - fired[0] - interval).abs() < 1e-6);
                }
                last = spawner.wave_index();
            }
        }
    }
}
