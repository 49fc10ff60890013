//! Airborne hazard pool: meteors, hail and locust swarms.
//!
//! The pool owns every hazard from spawn to removal. Ballistic kinds fall in
//! a straight line at their spawn velocity (no gravity integration) and are
//! resolved on ground impact; locusts wander toward the player inside an
//! altitude band and only disappear on a bulk clear at level end.

use engine_core::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::events::{AudioCue, EventQueue, SimEvent, WorldEntity};
use crate::levels::HazardRain;
use crate::tasks::{ms, Task, TaskId, TaskRegistry};

/// Ballistic hazards resolve once they drop to this height.
pub const IMPACT_HEIGHT: f32 = 2.0;
/// Locusts are kept inside this altitude band.
pub const LOCUST_MIN_ALTITUDE: f32 = 2.0;
pub const LOCUST_MAX_ALTITUDE: f32 = 20.0;

/// Random horizontal acceleration applied to locusts (units/s²).
const LOCUST_JITTER: f32 = 6.0;
/// Steering acceleration toward the player (units/s²).
const LOCUST_PURSUIT: f32 = 4.0;
const LOCUST_MAX_SPEED: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardKind {
    Meteor,
    NuclearMeteor,
    Hailstone,
    Locust,
}

/// Where and how fast a kind spawns.
#[derive(Debug, Clone, Copy)]
struct SpawnProfile {
    /// Half side of the square spawn region around the area center.
    half_extent: f32,
    height: (f32, f32),
    /// Max horizontal drift speed per axis.
    drift: f32,
    /// Downward speed range (units/s).
    fall: (f32, f32),
}

impl HazardKind {
    /// Direct impact damage. Locusts deal contact drain instead.
    pub fn damage(self) -> f32 {
        match self {
            HazardKind::Meteor => 25.0,
            HazardKind::NuclearMeteor => 35.0,
            HazardKind::Hailstone => 15.0,
            HazardKind::Locust => 0.0,
        }
    }

    /// Player within this distance of an impact takes the damage.
    pub fn blast_radius(self) -> f32 {
        match self {
            HazardKind::Meteor => 15.0,
            HazardKind::NuclearMeteor => 20.0,
            HazardKind::Hailstone => 8.0,
            HazardKind::Locust => 0.0,
        }
    }

    pub fn is_ballistic(self) -> bool {
        !matches!(self, HazardKind::Locust)
    }

    pub fn name(self) -> &'static str {
        match self {
            HazardKind::Meteor => "meteor",
            HazardKind::NuclearMeteor => "nuclear meteor",
            HazardKind::Hailstone => "hailstone",
            HazardKind::Locust => "locust",
        }
    }

    fn profile(self) -> SpawnProfile {
        match self {
            HazardKind::Meteor => SpawnProfile {
                half_extent: 300.0,
                height: (150.0, 250.0),
                drift: 1.5,
                fall: (15.0, 25.0),
            },
            HazardKind::NuclearMeteor => SpawnProfile {
                half_extent: 200.0,
                height: (100.0, 150.0),
                drift: 1.0,
                fall: (15.0, 25.0),
            },
            HazardKind::Hailstone => SpawnProfile {
                half_extent: 200.0,
                height: (100.0, 150.0),
                drift: 0.5,
                fall: (25.0, 40.0),
            },
            HazardKind::Locust => SpawnProfile {
                half_extent: 100.0,
                height: (5.0, 20.0),
                drift: 2.0,
                fall: (-0.5, 0.5),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HazardId(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hazard {
    pub id: HazardId,
    pub kind: HazardKind,
    pub position: Vec3,
    pub velocity: Vec3,
    pub damage: f32,
}

/// What the pool needs to know about the player this tick.
#[derive(Debug, Clone, Copy)]
pub struct PlayerProbe {
    pub position: Vec3,
    pub safe: bool,
}

/// A ballistic hazard that reached the ground this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    pub id: HazardId,
    pub kind: HazardKind,
    pub position: Vec3,
    pub damage: f32,
    /// Player was inside the blast radius and not sheltered.
    pub hits_player: bool,
}

/// Owns every live hazard and the generator timers feeding it.
#[derive(Debug, Default)]
pub struct HazardPool {
    hazards: Vec<Hazard>,
    generators: Vec<TaskId>,
    next_id: u64,
    /// Total spawned this session (stats).
    spawned: u64,
}

impl HazardPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin recurring spawns of `rain.kind` every `rain.interval_ms`.
    pub fn start_generator(&mut self, tasks: &mut TaskRegistry, rain: HazardRain) -> TaskId {
        let id = tasks.schedule_every(Task::SpawnHazards(rain), ms(rain.interval_ms));
        self.generators.push(id);
        log::debug!("{} generator started every {} ms", rain.kind.name(), rain.interval_ms);
        id
    }

    pub fn stop_generator(&mut self, tasks: &mut TaskRegistry, id: TaskId) -> bool {
        self.generators.retain(|g| *g != id);
        tasks.cancel(id)
    }

    /// Cancel every generator this pool started.
    pub fn stop_generators(&mut self, tasks: &mut TaskRegistry) -> usize {
        self.generators
            .drain(..)
            .filter(|id| tasks.cancel(*id))
            .count()
    }

    /// Generators still scheduled in `tasks`.
    pub fn active_generators(&self, tasks: &TaskRegistry) -> usize {
        self.generators
            .iter()
            .filter(|id| tasks.is_scheduled(**id))
            .count()
    }

    /// Handle one firing of a generator: spawn, and maybe queue a burst follow-up.
    pub fn on_generator_fired(
        &mut self,
        rain: HazardRain,
        tasks: &mut TaskRegistry,
        center: Vec3,
        rng: &mut impl Rng,
        events: &mut EventQueue,
    ) -> HazardId {
        let id = self.spawn_one(rain.kind, center, rng, events);
        if rain.burst_chance > 0.0 && rng.gen::<f32>() < rain.burst_chance {
            tasks.schedule_once(Task::SpawnHazard(rain.kind), ms(rain.burst_delay_ms));
        }
        id
    }

    /// Spawn one hazard at a random point of the kind's spawn region.
    pub fn spawn_one(
        &mut self,
        kind: HazardKind,
        center: Vec3,
        rng: &mut impl Rng,
        events: &mut EventQueue,
    ) -> HazardId {
        let p = kind.profile();
        let position = Vec3::new(
            center.x + rng.gen_range(-p.half_extent..p.half_extent),
            rng.gen_range(p.height.0..p.height.1),
            center.z + rng.gen_range(-p.half_extent..p.half_extent),
        );
        let velocity = Vec3::new(
            rng.gen_range(-p.drift..p.drift),
            -rng.gen_range(p.fall.0..p.fall.1),
            rng.gen_range(-p.drift..p.drift),
        );
        self.spawn_at(kind, position, velocity, events)
    }

    /// Spawn a hazard with an exact position and velocity.
    pub fn spawn_at(
        &mut self,
        kind: HazardKind,
        position: Vec3,
        velocity: Vec3,
        events: &mut EventQueue,
    ) -> HazardId {
        let id = HazardId(self.next_id);
        self.next_id += 1;
        self.spawned += 1;
        self.hazards.push(Hazard {
            id,
            kind,
            position,
            velocity,
            damage: kind.damage(),
        });
        events.push(SimEvent::AddToWorld(WorldEntity::Hazard { id, kind }));
        id
    }

    /// Release `count` locusts around `center`.
    pub fn spawn_swarm(
        &mut self,
        count: u32,
        center: Vec3,
        rng: &mut impl Rng,
        events: &mut EventQueue,
    ) {
        for _ in 0..count {
            self.spawn_one(HazardKind::Locust, center, rng, events);
        }
        log::debug!("Locust swarm of {} released", count);
    }

    /// Step every hazard by `dt` seconds and resolve ground impacts.
    pub fn advance(
        &mut self,
        dt: f32,
        player: PlayerProbe,
        rng: &mut impl Rng,
        events: &mut EventQueue,
    ) -> Vec<Impact> {
        let mut impacts = Vec::new();

        self.hazards.retain_mut(|hazard| {
            if !hazard.kind.is_ballistic() {
                steer_locust(hazard, player.position, dt, rng);
                return true;
            }

            hazard.position += hazard.velocity * dt;
            if hazard.position.y > IMPACT_HEIGHT {
                return true;
            }

            let point = impact_point(hazard);
            let distance = point.distance(player.position);
            let hits_player = distance < hazard.kind.blast_radius() && !player.safe;
            impacts.push(Impact {
                id: hazard.id,
                kind: hazard.kind,
                position: point,
                damage: hazard.damage,
                hits_player,
            });
            events.push(SimEvent::Explosion {
                position: point,
                kind: hazard.kind,
            });
            events.audio(AudioCue::Explosion);
            events.push(SimEvent::RemoveFromWorld(WorldEntity::Hazard {
                id: hazard.id,
                kind: hazard.kind,
            }));
            false
        });

        impacts
    }

    /// Remove every hazard immediately. Returns how many were removed.
    pub fn clear_all(&mut self, events: &mut EventQueue) -> usize {
        let n = self.hazards.len();
        for hazard in self.hazards.drain(..) {
            events.push(SimEvent::RemoveFromWorld(WorldEntity::Hazard {
                id: hazard.id,
                kind: hazard.kind,
            }));
        }
        n
    }

    /// Locusts within `radius` of `position`.
    pub fn locusts_near(&self, position: Vec3, radius: f32) -> usize {
        self.hazards
            .iter()
            .filter(|h| h.kind == HazardKind::Locust && h.position.distance(position) < radius)
            .count()
    }

    pub fn get(&self, id: HazardId) -> Option<&Hazard> {
        self.hazards.iter().find(|h| h.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hazard> {
        self.hazards.iter()
    }

    pub fn len(&self) -> usize {
        self.hazards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hazards.is_empty()
    }

    pub fn total_spawned(&self) -> u64 {
        self.spawned
    }
}

/// Random flutter plus proportional pursuit of the player, kept in the altitude band.
/// Where a hazard that overshot the ground crossed the impact height.
fn impact_point(hazard: &Hazard) -> Vec3 {
    let overshoot = IMPACT_HEIGHT - hazard.position.y;
    if hazard.velocity.y < 0.0 {
        hazard.position + hazard.velocity * (overshoot / -hazard.velocity.y)
    } else {
        Vec3::new(hazard.position.x, IMPACT_HEIGHT, hazard.position.z)
    }
}

fn steer_locust(hazard: &mut Hazard, target: Vec3, dt: f32, rng: &mut impl Rng) {
    let jitter = Vec3::new(
        rng.gen_range(-0.5..0.5) * LOCUST_JITTER,
        rng.gen_range(-0.5..0.5) * LOCUST_JITTER * 0.5,
        rng.gen_range(-0.5..0.5) * LOCUST_JITTER,
    );
    let pursuit = (target - hazard.position).normalize_or_zero() * LOCUST_PURSUIT;
    hazard.velocity = (hazard.velocity + (jitter + pursuit) * dt).clamp_length_max(LOCUST_MAX_SPEED);
    hazard.position += hazard.velocity * dt;
    hazard.position.y = hazard
        .position
        .y
        .clamp(LOCUST_MIN_ALTITUDE, LOCUST_MAX_ALTITUDE);
}
