//! Refuges and the single path through which health changes.

use engine_core::Vec3;

use crate::config::SafetyConfig;
use crate::events::{EventQueue, SimEvent};
use crate::hazards::HazardPool;
use crate::player::Player;
use crate::scene::horizontal_distance;
use crate::state::GameState;

/// A shelter. The player is safe within `radius` (horizontal) of `position`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Refuge {
    pub position: Vec3,
    pub radius: f32,
}

impl Refuge {
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self { position, radius }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        horizontal_distance(self.position, point) < self.radius
    }
}

/// Locust contact drain parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwarmContact {
    pub radius: f32,
    /// Damage per resolver tick for each locust in contact.
    pub damage_per_tick: f32,
}

/// Continuous drains active for the current disaster.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DamagePolicy {
    /// Damage per resolver tick while outside a refuge.
    pub radiation: Option<f32>,
    pub swarm: Option<SwarmContact>,
    /// Refuges regenerate health.
    pub healing: bool,
}

impl DamagePolicy {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

pub fn is_player_safe(position: Vec3, refuges: &[Refuge]) -> bool {
    refuges.iter().any(|r| r.contains(position))
}

/// Remove health. Every damage source goes through here.
///
/// Emits the health and flash events and raises `state.game_over` once health
/// reaches zero. Returns the damage actually applied.
pub fn apply_damage(
    player: &mut Player,
    state: &mut GameState,
    amount: f32,
    events: &mut EventQueue,
) -> f32 {
    if amount <= 0.0 || state.game_over || state.is_terminal() {
        return 0.0;
    }
    let before = player.health.current;
    player.health.take_damage(amount);
    let applied = before - player.health.current;
    if applied > 0.0 {
        events.push(SimEvent::HealthChanged(player.health.current));
        events.push(SimEvent::DamageFlash);
    }
    if player.health.is_dead() {
        log::info!("Player died on level {}", state.level);
        state.game_over = true;
    }
    applied
}

fn heal(player: &mut Player, amount: f32, events: &mut EventQueue) {
    let before = player.health.current;
    player.health.heal(amount);
    if player.health.current != before {
        events.push(SimEvent::HealthChanged(player.health.current));
    }
}

/// One resolver step: drains outside refuges, healing inside them.
pub fn resolve_tick(
    player: &mut Player,
    state: &mut GameState,
    refuges: &[Refuge],
    hazards: &HazardPool,
    config: &SafetyConfig,
    events: &mut EventQueue,
) {
    if state.game_over || state.is_terminal() {
        return;
    }

    if is_player_safe(player.position, refuges) {
        if state.policy.healing {
            heal(player, config.heal_per_tick, events);
        }
        return;
    }

    let mut drain = state.policy.radiation.unwrap_or(0.0);
    if let Some(swarm) = state.policy.swarm {
        let touching = hazards.locusts_near(player.position, swarm.radius);
        drain += swarm.damage_per_tick * touching as f32;
    }
    apply_damage(player, state, drain, events);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::hazards::HazardKind;

    fn setup() -> (Player, GameState, Vec<Refuge>) {
        let player = Player::new(&PlayerConfig::default());
        let state = GameState::new(4);
        let refuges = vec![Refuge::new(Vec3::new(-60.0, 0.0, -60.0), 25.0)];
        (player, state, refuges)
    }

    #[test]
    fn refuge_uses_horizontal_distance() {
        let r = Refuge::new(Vec3::ZERO, 25.0);
        assert!(r.contains(Vec3::new(10.0, 30.0, 10.0)));
        assert!(!r.contains(Vec3::new(25.0, 0.0, 0.0)));
    }

    #[test]
    fn radiation_drains_strictly_outside() {
        let (mut player, mut state, refuges) = setup();
        state.policy.radiation = Some(2.0);
        let mut events = EventQueue::new();
        let hazards = HazardPool::new();
        let mut last = player.health.current;
        for _ in 0..10 {
            resolve_tick(&mut player, &mut state, &refuges, &hazards, &SafetyConfig::default(), &mut events);
            assert!(player.health.current < last);
            last = player.health.current;
        }
        assert_eq!(player.health.current, 80.0);
    }

    #[test]
    fn sheltered_player_loses_nothing_and_heals() {
        let (mut player, mut state, refuges) = setup();
        player.position = refuges[0].position;
        player.health.set(50.0);
        state.policy.radiation = Some(2.0);
        state.policy.healing = true;
        let mut events = EventQueue::new();
        let hazards = HazardPool::new();
        for _ in 0..4 {
            resolve_tick(&mut player, &mut state, &refuges, &hazards, &SafetyConfig::default(), &mut events);
        }
        assert_eq!(player.health.current, 52.0);
    }

    #[test]
    fn swarm_contact_scales_with_locusts() {
        let (mut player, mut state, refuges) = setup();
        state.policy.swarm = Some(SwarmContact {
            radius: 3.0,
            damage_per_tick: 0.5,
        });
        let mut events = EventQueue::new();
        let mut hazards = HazardPool::new();
        for _ in 0..4 {
            hazards.spawn_at(HazardKind::Locust, player.position, Vec3::ZERO, &mut events);
        }
        resolve_tick(&mut player, &mut state, &refuges, &hazards, &SafetyConfig::default(), &mut events);
        assert_eq!(player.health.current, 98.0);
    }

    #[test]
    fn lethal_damage_sets_game_over_once() {
        let (mut player, mut state, _) = setup();
        let mut events = EventQueue::new();
        assert_eq!(apply_damage(&mut player, &mut state, 500.0, &mut events), 100.0);
        assert_eq!(player.health.current, 0.0);
        assert!(state.game_over);
        assert_eq!(apply_damage(&mut player, &mut state, 5.0, &mut events), 0.0);
        assert!(events.iter().any(|e| *e == SimEvent::HealthChanged(0.0)));
    }
}
