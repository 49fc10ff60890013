//! Player kinematics: intent-driven movement with quake jitter and collision.

use engine_core::{Aabb, Health, Quat, Vec3};
use input::MovementIntent;
use rand::Rng;

use crate::config::{PlayerConfig, WorldConfig};

#[derive(Debug, Clone)]
pub struct Player {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub health: Health,
    pub running: bool,
}

impl Player {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            position: config.start,
            yaw: 0.0,
            pitch: 0.0,
            health: Health::new(config.max_health),
            running: false,
        }
    }

    /// Collision box around a candidate position.
    pub fn bounds_at(position: Vec3, half_size: f32) -> Aabb {
        Aabb::from_center(position, Vec3::splat(half_size))
    }

    /// Apply one frame of movement.
    ///
    /// The intent is rotated by yaw (forward is -z at yaw 0) and scaled by
    /// walk or run speed; intensity adds a random sideways jitter. If the
    /// resulting box touches any blocker the whole move is dropped. The
    /// position is then clamped to the world's half extent on x and z and
    /// kept standing on the floor, moved or not. Returns whether the player
    /// moved.
    pub fn resolve_movement(
        &mut self,
        intent: &MovementIntent,
        dt: f32,
        intensity: f32,
        blockers: impl IntoIterator<Item = Aabb>,
        world: &WorldConfig,
        config: &PlayerConfig,
        rng: &mut impl Rng,
    ) -> bool {
        self.yaw = intent.yaw;
        self.pitch = intent.pitch;
        self.running = intent.running;

        let speed = if intent.running {
            config.walk_speed * config.run_multiplier
        } else {
            config.walk_speed
        };
        let local = Vec3::new(intent.direction.x, 0.0, -intent.direction.y);
        let mut delta = Quat::from_rotation_y(self.yaw) * local * speed * dt;

        if intensity > 0.0 {
            let jitter = config.shake_jitter * intensity * dt;
            delta.x += rng.gen_range(-0.5..0.5) * jitter;
            delta.z += rng.gen_range(-0.5..0.5) * jitter;
        }

        let mut moved = false;
        if delta != Vec3::ZERO {
            let candidate = self.position + delta;
            let moved_box = Self::bounds_at(candidate, config.half_size);
            if !blockers.into_iter().any(|b| b.intersects(&moved_box)) {
                self.position = candidate;
                moved = true;
            }
        }

        self.clamp_to_world(world, config);
        moved
    }

    /// Keep x/z inside the world bound and the player standing on the floor.
    fn clamp_to_world(&mut self, world: &WorldConfig, config: &PlayerConfig) {
        let bound = world.half_extent;
        self.position.x = self.position.x.clamp(-bound, bound);
        self.position.z = self.position.z.clamp(-bound, bound);
        self.position.y = self.position.y.max(world.floor_y + config.half_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::Vec2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DT_IDLE: f32 = 1.0 / 60.0;

    fn forward(running: bool, yaw: f32) -> MovementIntent {
        MovementIntent {
            direction: Vec2::new(0.0, 1.0),
            running,
            yaw,
            pitch: 0.0,
        }
    }

    #[test]
    fn walks_forward_along_negative_z() {
        let cfg = PlayerConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = Player::new(&cfg);
        assert!(p.resolve_movement(&forward(false, 0.0), 1.0, 0.0, [], &WorldConfig::default(), &cfg, &mut rng));
        assert!((p.position - Vec3::new(0.0, 2.0, -12.0)).length() < 1e-4);
    }

    #[test]
    fn running_and_yaw() {
        let cfg = PlayerConfig::default();
        let mut rng = StdRng::seed_from_u64(2);
        let mut p = Player::new(&cfg);
        let yaw = std::f32::consts::FRAC_PI_2;
        p.resolve_movement(&forward(true, yaw), 1.0, 0.0, [], &WorldConfig::default(), &cfg, &mut rng);
        // Turning left by 90° makes forward point along -x.
        assert!((p.position - Vec3::new(-30.0, 2.0, 0.0)).length() < 1e-3);
        assert!(p.running);
    }

    #[test]
    fn blocked_move_is_rejected_whole() {
        let cfg = PlayerConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut p = Player::new(&cfg);
        let wall = Aabb::from_center(Vec3::new(0.0, 2.0, -5.0), Vec3::new(10.0, 10.0, 1.0));
        let start = p.position;
        assert!(!p.resolve_movement(&forward(false, 0.0), 0.5, 0.0, [wall], &WorldConfig::default(), &cfg, &mut rng));
        assert_eq!(p.position, start);
    }

    #[test]
    fn clamped_to_world_bound() {
        let cfg = PlayerConfig::default();
        let mut rng = StdRng::seed_from_u64(4);
        let mut p = Player::new(&cfg);
        p.position = Vec3::new(0.0, 2.0, -235.0);
        p.resolve_movement(&forward(true, 0.0), 1.0, 0.0, [], &WorldConfig::default(), &cfg, &mut rng);
        assert_eq!(p.position.z, -240.0);
    }

    #[test]
    fn idle_player_outside_bound_is_pulled_back() {
        let cfg = PlayerConfig::default();
        let mut rng = StdRng::seed_from_u64(6);
        let mut p = Player::new(&cfg);
        p.position = Vec3::new(300.0, -4.0, -260.0);
        let idle = MovementIntent::default();
        assert!(!p.resolve_movement(&idle, DT_IDLE, 0.0, [], &WorldConfig::default(), &cfg, &mut rng));
        assert_eq!(p.position, Vec3::new(240.0, 1.0, -240.0));
    }

    #[test]
    fn quake_jitters_idle_player() {
        let cfg = PlayerConfig::default();
        let mut rng = StdRng::seed_from_u64(5);
        let mut p = Player::new(&cfg);
        let idle = MovementIntent::default();
        assert!(p.resolve_movement(&idle, 0.1, 1.0, [], &WorldConfig::default(), &cfg, &mut rng));
        let drift = p.position - cfg.start;
        assert!(drift.x.abs() <= 0.3 && drift.z.abs() <= 0.3);
    }
}
