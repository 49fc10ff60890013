//! Common ECS components used across the simulation.

use glam::Vec3;

/// Velocity component for moving entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct Velocity {
    pub linear: Vec3,
    pub angular: Vec3,
}

impl Velocity {
    pub fn with_angular(linear: Vec3, angular: Vec3) -> Self {
        Self { linear, angular }
    }
}

/// Health component for damageable entities. `current` never leaves `[0, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.current = (self.current - amount.max(0.0)).clamp(0.0, self.max);
    }

    pub fn heal(&mut self, amount: f32) {
        self.current = (self.current + amount.max(0.0)).clamp(0.0, self.max);
    }

    /// Overwrite the current value, clamped into range.
    pub fn set(&mut self, value: f32) {
        self.current = value.clamp(0.0, self.max);
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    pub fn percentage(&self) -> f32 {
        self.current / self.max
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// Lifetime component for temporary entities (debris, effects).
#[derive(Debug, Clone, Copy)]
pub struct Lifetime {
    pub remaining: f32,
}

impl Lifetime {
    pub fn new(seconds: f32) -> Self {
        Self { remaining: seconds }
    }

    /// Tick down; returns true once expired.
    pub fn update(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_stays_in_range() {
        let mut h = Health::new(100.0);
        h.take_damage(250.0);
        assert_eq!(h.current, 0.0);
        assert!(h.is_dead());
        h.heal(500.0);
        assert_eq!(h.current, 100.0);
        h.take_damage(-10.0);
        assert_eq!(h.current, 100.0);
        h.set(-3.0);
        assert_eq!(h.current, 0.0);
    }

    #[test]
    fn lifetime_expires() {
        let mut l = Lifetime::new(0.5);
        assert!(!l.update(0.25));
        assert!(l.update(0.25));
    }
}
