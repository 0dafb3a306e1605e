//! Lingering ground hazards (burning ground and the like)

use glam::DVec2;

/// Identifier of a hazard inside a [`HazardSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HazardId(pub u64);

/// A damage zone that ticks on every entity standing in it
#[derive(Debug, Clone)]
pub struct Hazard {
    id: HazardId,
    pub position: DVec2,
    pub radius: f64,
    pub damage_per_tick: f64,
    /// Minimum time between ticks on the same entity; `None` uses the
    /// policy default
    pub tick_rate_ms: Option<f64>,
    pub lifetime_ms: Option<f64>,
    age_ms: f64,
    active: bool,
}

impl Hazard {
    pub fn new(position: DVec2, radius: f64, damage_per_tick: f64) -> Self {
        Self {
            id: HazardId(0),
            position,
            radius,
            damage_per_tick,
            tick_rate_ms: None,
            lifetime_ms: None,
            age_ms: 0.0,
            active: true,
        }
    }

    /// 3 damage per tick for 3 seconds
    pub fn burning_ground(position: DVec2, radius: f64) -> Self {
        Self::new(position, radius, 3.0).with_lifetime(3000.0)
    }

    pub fn with_tick_rate(mut self, tick_rate_ms: f64) -> Self {
        self.tick_rate_ms = Some(tick_rate_ms);
        self
    }

    pub fn with_lifetime(mut self, lifetime_ms: f64) -> Self {
        self.lifetime_ms = Some(lifetime_ms);
        self
    }

    pub fn id(&self) -> HazardId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Whether an entity last hit at `last_hit_ms` may be damaged at `now_ms`
    pub fn ready_for(&self, last_hit_ms: Option<f64>, now_ms: f64, default_tick_ms: f64) -> bool {
        let tick = self.tick_rate_ms.unwrap_or(default_tick_ms);
        match last_hit_ms {
            None => true,
            Some(last) => now_ms > last + tick,
        }
    }

    pub fn integrate(&mut self, dt_ms: f64) {
        if !self.active {
            return;
        }
        self.age_ms += dt_ms;
        if self.lifetime_ms.is_some_and(|life| self.age_ms >= life) {
            self.active = false;
        }
    }
}

#[derive(Debug)]
pub struct HazardSet {
    hazards: Vec<Hazard>,
    next_id: u64,
}

impl Default for HazardSet {
    fn default() -> Self {
        Self::new()
    }
}

impl HazardSet {
    pub fn new() -> Self {
        Self {
            hazards: Vec::new(),
            next_id: 1,
        }
    }

    pub fn spawn(&mut self, mut hazard: Hazard) -> HazardId {
        let id = HazardId(self.next_id);
        self.next_id += 1;
        hazard.id = id;
        self.hazards.push(hazard);
        id
    }

    pub fn get(&self, id: HazardId) -> Option<&Hazard> {
        self.hazards.iter().find(|h| h.id == id)
    }

    pub fn get_mut(&mut self, id: HazardId) -> Option<&mut Hazard> {
        self.hazards.iter_mut().find(|h| h.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hazard> {
        self.hazards.iter()
    }

    pub fn active_ids(&self) -> Vec<HazardId> {
        self.hazards
            .iter()
            .filter(|h| h.active)
            .map(|h| h.id)
            .collect()
    }

    pub fn integrate(&mut self, dt_ms: f64) {
        for h in &mut self.hazards {
            h.integrate(dt_ms);
        }
    }

    pub fn sweep(&mut self) {
        self.hazards.retain(|h| h.active);
    }
}
