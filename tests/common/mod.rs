//! Integration test harness.
//!
//! Keep integration tests headless: the player and the game-side hooks are
//! shared-state doubles the test can inspect after driving the simulation.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use glam::DVec2;
use wave_survivor::sim::{
    CombatHooks, DeathEvent, EnemyHandle, EnemyKind, PlayerHandle, Simulation, VisualCue,
};
use wave_survivor::Tuning;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Everything the hooks observed
#[derive(Debug, Default)]
pub struct Journal {
    pub deaths: Vec<DeathEvent>,
    pub heals: Vec<f64>,
    pub game_overs: usize,
    pub cues: Vec<VisualCue>,
    pub spawns: Vec<(EnemyHandle, EnemyKind)>,
}

impl Journal {
    pub fn deaths_of(&self, handle: EnemyHandle) -> usize {
        self.deaths.iter().filter(|d| d.handle == handle).count()
    }
}

#[derive(Clone, Default)]
pub struct Recorder(pub Rc<RefCell<Journal>>);

impl CombatHooks for Recorder {
    fn on_death(&mut self, event: &DeathEvent) {
        self.0.borrow_mut().deaths.push(*event);
    }

    fn on_owner_heal(&mut self, amount: f64) {
        self.0.borrow_mut().heals.push(amount);
    }

    fn on_game_over(&mut self) {
        self.0.borrow_mut().game_overs += 1;
    }

    fn on_visual(&mut self, cue: VisualCue) {
        self.0.borrow_mut().cues.push(cue);
    }

    fn on_spawn(&mut self, handle: EnemyHandle, kind: EnemyKind) {
        self.0.borrow_mut().spawns.push((handle, kind));
    }
}

#[derive(Debug)]
pub struct PlayerState {
    pub position: DVec2,
    pub hp: f64,
    pub hits: Vec<f64>,
    pub invulnerable: bool,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            position: DVec2::ZERO,
            hp: 100.0,
            hits: Vec::new(),
            invulnerable: false,
        }
    }
}

#[derive(Clone, Default)]
pub struct TestPlayer(pub Rc<RefCell<PlayerState>>);

impl PlayerHandle for TestPlayer {
    fn position(&self) -> DVec2 {
        self.0.borrow().position
    }

    fn hp(&self) -> f64 {
        self.0.borrow().hp
    }

    fn take_damage(&mut self, amount: f64) {
        let mut state = self.0.borrow_mut();
        state.hp -= amount;
        state.hits.push(amount);
    }

    fn is_invulnerable(&self) -> bool {
        self.0.borrow().invulnerable
    }
}

pub struct Harness {
    pub sim: Simulation,
    pub journal: Rc<RefCell<Journal>>,
    pub player: Rc<RefCell<PlayerState>>,
}

pub fn harness_with(tuning: Tuning, seed: u64) -> Harness {
    init_logger();
    let recorder = Recorder::default();
    let player = TestPlayer::default();
    let journal = recorder.0.clone();
    let state = player.0.clone();
    let sim = Simulation::builder()
        .seed(seed)
        .tuning(tuning)
        .player(player)
        .hooks(recorder)
        .build()
        .expect("valid wiring");
    Harness {
        sim,
        journal,
        player: state,
    }
}

pub fn harness() -> Harness {
    harness_with(Tuning::default(), 1)
}

/// Fast-fade-free tuning so killed slots free immediately
pub fn instant_fade() -> Tuning {
    let mut tuning = Tuning::default();
    tuning.status.death_fade_ms = 0.0;
    tuning
}

impl Harness {
    /// Place an entity far from the player so contact never triggers
    pub fn spawn(&mut self, kind: EnemyKind, position: DVec2) -> EnemyHandle {
        self.sim
            .spawn_enemy_at(kind, position)
            .expect("pool has room")
    }

    pub fn hp(&self, handle: EnemyHandle) -> Option<f64> {
        self.sim.enemy(handle).map(|e| e.hp())
    }
}
