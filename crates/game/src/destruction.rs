//! Structure destruction: earthquake shake, cracking, toppling and debris.

use engine_core::{Aabb, Lifetime, Quat, Transform, Velocity, Vec3};
use hecs::World;
use rand::Rng;

use crate::config::CollapseConfig;
use crate::events::{AudioCue, EventQueue, SimEvent, WorldEntity};
use crate::hazards::HazardKind;
use crate::tasks::{ms, Task, TaskRegistry};

/// Maximum debris particles alive in the world.
const MAX_DEBRIS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureKind {
    Pyramid,
    Building,
    Mansion,
}

/// Collapse lifecycle. Only ever moves forward; `Debris` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StructureState {
    Intact,
    Cracking,
    Falling,
    Debris,
}

/// Pre-rolled debris piece, released when its structure hits the floor.
#[derive(Debug, Clone, Copy)]
pub struct DebrisSeed {
    pub offset: Vec3,
    pub velocity: Vec3,
    pub angular: Vec3,
    pub size: f32,
}

/// Marker for structure debris entities.
#[derive(Debug, Clone, Copy)]
pub struct Debris;

/// Short-lived explosion effect left by a hazard impact.
#[derive(Debug, Clone, Copy)]
pub struct ExplosionEffect {
    pub kind: HazardKind,
}

#[derive(Debug, Clone)]
pub struct Structure {
    pub kind: StructureKind,
    pub transform: Transform,
    /// Placement at scene build time; shake is always relative to this.
    pub baseline: Transform,
    pub half_extents: Vec3,
    /// Whether the player may walk inside. Enterable structures never collapse.
    pub enterable: bool,
    state: StructureState,
    progress: f32,
    fall_speed: f32,
    bounds: Aabb,
    debris: Vec<DebrisSeed>,
}

impl Structure {
    pub fn new(
        kind: StructureKind,
        transform: Transform,
        half_extents: Vec3,
        enterable: bool,
        debris_count: u32,
        rng: &mut impl Rng,
    ) -> Self {
        let footprint = half_extents * 2.0;
        let debris = (0..debris_count)
            .map(|_| DebrisSeed {
                offset: Vec3::new(
                    rng.gen_range(-0.5..0.5) * footprint.x,
                    rng.gen_range(-0.5..0.5) * footprint.y,
                    rng.gen_range(-0.5..0.5) * footprint.z,
                ),
                velocity: Vec3::new(
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(5.0..15.0),
                    rng.gen_range(-10.0..10.0),
                ),
                angular: Vec3::new(
                    rng.gen_range(-3.0..3.0),
                    rng.gen_range(-3.0..3.0),
                    rng.gen_range(-3.0..3.0),
                ),
                size: rng.gen_range(1.0..2.5),
            })
            .collect();

        Self {
            kind,
            transform,
            baseline: transform,
            half_extents,
            enterable,
            state: StructureState::Intact,
            progress: 0.0,
            fall_speed: 0.0,
            bounds: Aabb::from_transform(&transform, half_extents),
            debris,
        }
    }

    pub fn state(&self) -> StructureState {
        self.state
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Blocks player movement.
    pub fn is_solid(&self) -> bool {
        !self.enterable && self.state != StructureState::Debris
    }

    pub fn debris_seeds(&self) -> &[DebrisSeed] {
        &self.debris
    }

    fn refresh_bounds(&mut self) {
        self.bounds = Aabb::from_transform(&self.transform, self.half_extents);
    }
}

/// Drives every structure through its collapse and owns the debris it leaves.
#[derive(Debug)]
pub struct DestructionTracker {
    structures: Vec<Structure>,
    config: CollapseConfig,
}

impl DestructionTracker {
    pub fn new(structures: Vec<Structure>, config: CollapseConfig) -> Self {
        Self { structures, config }
    }

    /// Roll each standing structure for collapse and queue a crack timer for the winners.
    pub fn schedule_collapse(
        &self,
        tasks: &mut TaskRegistry,
        rng: &mut impl Rng,
        eligibility: f32,
        max_delay_ms: u64,
    ) -> usize {
        let mut scheduled = 0;
        for (idx, s) in self.structures.iter().enumerate() {
            if s.enterable || s.state != StructureState::Intact {
                continue;
            }
            if rng.gen::<f32>() < eligibility {
                tasks.schedule_once(Task::Crack(idx), ms(rng.gen_range(0..=max_delay_ms)));
                scheduled += 1;
            }
        }
        log::debug!("{} structures scheduled to collapse", scheduled);
        scheduled
    }

    /// Start cracking. Returns false if the structure is not intact.
    pub fn begin_cracking(&mut self, idx: usize) -> bool {
        let pyramid_speed = self.config.pyramid_fall_speed;
        let Some(s) = self.structures.get_mut(idx) else {
            return false;
        };
        if s.enterable || s.state != StructureState::Intact {
            return false;
        }
        s.state = StructureState::Cracking;
        s.fall_speed = if s.kind == StructureKind::Pyramid {
            pyramid_speed
        } else {
            0.0
        };
        log::debug!("{:?} {} starts cracking", s.kind, idx);
        true
    }

    /// Step every structure by `dt` seconds under the current quake intensity.
    pub fn advance(
        &mut self,
        dt: f32,
        intensity: f32,
        rng: &mut impl Rng,
        world: &mut World,
        events: &mut EventQueue,
    ) {
        let cfg = &self.config;
        let mut collapsed = Vec::new();

        for (idx, s) in self.structures.iter_mut().enumerate() {
            match s.state {
                StructureState::Intact => {
                    if s.enterable {
                        continue;
                    }
                    if intensity > 0.0 {
                        let shake = intensity * cfg.shake_amplitude;
                        s.transform.position = s.baseline.position
                            + Vec3::new(
                                rng.gen_range(-0.5..0.5) * shake,
                                0.0,
                                rng.gen_range(-0.5..0.5) * shake,
                            );
                        s.transform.set_euler(
                            s.baseline.euler()
                                + Vec3::new(
                                    rng.gen_range(-0.5..0.5) * shake * 0.1,
                                    0.0,
                                    rng.gen_range(-0.5..0.5) * shake * 0.1,
                                ),
                        );
                    } else {
                        s.transform = s.baseline;
                    }
                }
                StructureState::Cracking => {
                    s.progress += cfg.crack_rate * dt;
                    if s.progress < 1.0 {
                        s.fall_speed += cfg.crack_accel * dt;
                        s.transform.rotate_euler(Vec3::new(
                            s.fall_speed * 0.05 * dt,
                            0.0,
                            s.fall_speed * 0.03 * dt,
                        ));
                        let noise = s.progress * 2.0;
                        s.transform.position.x =
                            s.baseline.position.x + rng.gen_range(-0.5..0.5) * noise;
                        s.transform.position.z =
                            s.baseline.position.z + rng.gen_range(-0.5..0.5) * noise;
                    } else {
                        s.state = StructureState::Falling;
                    }
                }
                StructureState::Falling => {
                    s.fall_speed += cfg.fall_accel * dt;
                    s.transform.rotate_euler(Vec3::new(
                        s.fall_speed * 0.1 * dt,
                        0.0,
                        s.fall_speed * 0.08 * dt,
                    ));
                    s.transform.translate(Vec3::new(0.0, -s.fall_speed * dt, 0.0));
                    if s.transform.position.y <= cfg.floor_y {
                        s.state = StructureState::Debris;
                        collapsed.push(idx);
                    }
                }
                StructureState::Debris => continue,
            }
            if s.state != StructureState::Debris {
                s.refresh_bounds();
            }
        }

        for idx in collapsed {
            log::debug!("Structure {} collapsed into debris", idx);
            events.push(SimEvent::StructureHidden(idx));
            events.audio(AudioCue::Explosion);
            self.release_debris(idx, world, events);
        }
    }

    /// Spawn the pre-rolled debris pieces of a structure into the world.
    fn release_debris(&self, idx: usize, world: &mut World, events: &mut EventQueue) {
        let Some(s) = self.structures.get(idx) else {
            return;
        };
        let current = world.query::<&Debris>().iter().count();
        let available = MAX_DEBRIS.saturating_sub(current);
        let origin = Vec3::new(s.baseline.position.x, s.transform.position.y, s.baseline.position.z);

        for seed in s.debris.iter().take(available) {
            let entity = world.spawn((
                Transform {
                    position: origin + seed.offset,
                    scale: Vec3::splat(seed.size),
                    ..Default::default()
                },
                Velocity::with_angular(seed.velocity, seed.angular),
                Debris,
                Lifetime::new(self.config.debris_lifetime),
            ));
            events.push(SimEvent::AddToWorld(WorldEntity::Debris(entity)));
        }
    }

    /// Leave a short-lived explosion effect at an impact point.
    pub fn spawn_explosion(
        &self,
        world: &mut World,
        position: Vec3,
        kind: HazardKind,
        events: &mut EventQueue,
    ) {
        let entity = world.spawn((
            Transform::from_position(position),
            ExplosionEffect { kind },
            Lifetime::new(self.config.explosion_lifetime),
        ));
        events.push(SimEvent::AddToWorld(WorldEntity::Explosion(entity)));
    }

    /// Debris free-fall with friction, plus lifetime expiry of debris and effects.
    pub fn update_effects(&self, world: &mut World, dt: f32, events: &mut EventQueue) {
        let gravity = Vec3::new(0.0, -self.config.debris_gravity, 0.0);
        let retention = self.config.debris_retention.clamp(0.0, 1.0).powf(dt);

        for (_, (transform, velocity, _)) in
            world.query_mut::<(&mut Transform, &mut Velocity, &Debris)>()
        {
            if transform.position.y <= self.config.debris_rest_y {
                continue;
            }
            velocity.linear += gravity * dt;
            transform.position += velocity.linear * dt;
            transform.rotation =
                Quat::from_scaled_axis(velocity.angular * dt) * transform.rotation;
            velocity.linear *= retention;
        }

        let mut expired = Vec::new();
        for (entity, (lifetime, debris)) in world.query_mut::<(&mut Lifetime, Option<&Debris>)>() {
            if lifetime.update(dt) {
                let tag = if debris.is_some() {
                    WorldEntity::Debris(entity)
                } else {
                    WorldEntity::Explosion(entity)
                };
                expired.push((entity, tag));
            }
        }
        for (entity, tag) in expired {
            let _ = world.despawn(entity);
            events.push(SimEvent::RemoveFromWorld(tag));
        }
    }

    /// Boxes the player may not enter.
    pub fn blocking_volumes(&self) -> impl Iterator<Item = Aabb> + '_ {
        self.structures
            .iter()
            .filter(|s| s.is_solid())
            .map(|s| s.bounds)
    }

    pub fn structures(&self) -> &[Structure] {
        &self.structures
    }

    pub fn get(&self, idx: usize) -> Option<&Structure> {
        self.structures.get(idx)
    }

    pub fn count_in(&self, state: StructureState) -> usize {
        self.structures.iter().filter(|s| s.state == state).count()
    }
}
