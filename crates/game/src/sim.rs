//! Simulation context and the per-frame tick.

use std::time::Duration;

use engine_core::World;
use input::MovementIntent;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{ConfigError, SimConfig};
use crate::destruction::DestructionTracker;
use crate::events::{AmbientTone, EventQueue, SimEvent};
use crate::hazards::{HazardPool, PlayerProbe};
use crate::phase::PhaseController;
use crate::player::Player;
use crate::safety::{self, Refuge};
use crate::scene::WorldLayout;
use crate::state::{CameraShake, GameState};
use crate::tasks::TaskRegistry;

/// All mutable session state, passed explicitly to every subsystem.
pub struct SimContext {
    pub state: GameState,
    pub player: Player,
    pub hazards: HazardPool,
    pub structures: DestructionTracker,
    pub refuges: Vec<Refuge>,
    pub baseline_tone: AmbientTone,
    pub tasks: TaskRegistry,
    pub events: EventQueue,
    pub rng: StdRng,
    /// Debris and explosion effects.
    pub world: World,
    pub shake: CameraShake,
}

/// One game session: owns the context and steps it frame by frame.
pub struct Simulation {
    config: SimConfig,
    controller: PhaseController,
    ctx: SimContext,
}

impl Simulation {
    /// Build the themed scene and enter level 1 exploration.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let layout = WorldLayout::build(
            config.theme,
            config.safety.refuge_radius,
            &config.collapse,
            &mut rng,
        );
        let controller = PhaseController::new(
            config.levels.clone(),
            config.timing.clone(),
            config.safety.clone(),
        );

        let mut ctx = SimContext {
            state: GameState::new(controller.level_count()),
            player: Player::new(&config.player),
            hazards: HazardPool::new(),
            structures: DestructionTracker::new(layout.structures, config.collapse.clone()),
            refuges: layout.refuges,
            baseline_tone: layout.baseline_tone,
            tasks: TaskRegistry::new(),
            events: EventQueue::new(),
            rng,
            world: World::new(),
            shake: CameraShake::new(),
        };
        ctx.events
            .push(SimEvent::HealthChanged(ctx.player.health.current));
        controller.enter_exploration(&mut ctx);

        Ok(Self {
            config,
            controller,
            ctx,
        })
    }

    /// Advance the session by `dt` seconds.
    ///
    /// Timers due inside the frame fire first, in deadline order, then
    /// the player, hazards and structures move by the full `dt`. Does
    /// nothing once the session is over.
    pub fn tick(&mut self, dt: f32, intent: &MovementIntent) {
        if self.ctx.state.is_terminal() || !dt.is_finite() || dt <= 0.0 {
            return;
        }

        let Ok(budget) = Duration::try_from_secs_f32(dt) else {
            log::warn!("Dropping frame with unusable dt {}", dt);
            return;
        };
        self.run_timers(budget);
        if self.ctx.state.is_terminal() {
            return;
        }

        let ctx = &mut self.ctx;
        let intensity = ctx.state.intensity();

        ctx.player.resolve_movement(
            intent,
            dt,
            intensity,
            ctx.structures.blocking_volumes(),
            &self.config.world,
            &self.config.player,
            &mut ctx.rng,
        );

        let probe = PlayerProbe {
            position: ctx.player.position,
            safe: safety::is_player_safe(ctx.player.position, &ctx.refuges),
        };
        let impacts = ctx
            .hazards
            .advance(dt, probe, &mut ctx.rng, &mut ctx.events);
        for impact in impacts {
            ctx.structures
                .spawn_explosion(&mut ctx.world, impact.position, impact.kind, &mut ctx.events);
            if impact.hits_player {
                safety::apply_damage(&mut ctx.player, &mut ctx.state, impact.damage, &mut ctx.events);
            }
        }

        ctx.structures
            .advance(dt, intensity, &mut ctx.rng, &mut ctx.world, &mut ctx.events);
        ctx.structures
            .update_effects(&mut ctx.world, dt, &mut ctx.events);

        if ctx.state.game_over {
            self.controller.enter_game_over(ctx);
            return;
        }

        ctx.state.survival_time += dt;
        ctx.state.update_beacon(dt);
        ctx.shake.update(intensity, &mut ctx.rng);
    }

    /// Fire every timer due within `budget`, stopping early on game over.
    fn run_timers(&mut self, budget: Duration) {
        let mut remaining = budget;
        while let Some((step, task)) = self.ctx.tasks.next_due(remaining) {
            remaining = remaining.saturating_sub(step);
            self.controller.handle(task, &mut self.ctx);
            if self.ctx.state.game_over {
                self.controller.enter_game_over(&mut self.ctx);
                return;
            }
        }
        self.ctx.tasks.elapse(remaining);
    }

    /// Take every event emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.ctx.events.drain()
    }

    pub fn state(&self) -> &GameState {
        &self.ctx.state
    }

    pub fn player(&self) -> &Player {
        &self.ctx.player
    }

    pub fn hazards(&self) -> &HazardPool {
        &self.ctx.hazards
    }

    pub fn structures(&self) -> &DestructionTracker {
        &self.ctx.structures
    }

    pub fn refuges(&self) -> &[Refuge] {
        &self.ctx.refuges
    }

    pub fn pending_timers(&self) -> usize {
        self.ctx.tasks.len()
    }

    pub fn camera_shake(&self) -> &CameraShake {
        &self.ctx.shake
    }

    pub fn world(&self) -> &World {
        &self.ctx.world
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn is_over(&self) -> bool {
        self.ctx.state.is_terminal()
    }

    pub fn player_is_safe(&self) -> bool {
        safety::is_player_safe(self.ctx.player.position, &self.ctx.refuges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destruction::StructureState;
    use crate::events::{AudioCue, WorldEntity};
    use crate::hazards::HazardKind;
    use crate::levels::{default_levels, LevelConfig, StageTrigger};
    use crate::state::Phase;
    use engine_core::Vec3;

    const DT: f32 = 1.0 / 60.0;

    fn config(levels: Vec<LevelConfig>) -> SimConfig {
        SimConfig {
            seed: Some(42),
            levels,
            ..SimConfig::default()
        }
    }

    fn run(sim: &mut Simulation, seconds: f32) {
        let idle = MovementIntent::default();
        for _ in 0..(seconds / DT).round() as usize {
            sim.tick(DT, &idle);
        }
    }

    fn hazard_spawns(events: &[SimEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, SimEvent::AddToWorld(WorldEntity::Hazard { .. })))
            .count()
    }

    #[test]
    fn countdown_reaches_pre_disaster() {
        let mut sim = Simulation::new(config(default_levels())).unwrap();
        assert_eq!(sim.state().phase(), Phase::Exploration);
        assert_eq!(sim.state().countdown, 60);

        run(&mut sim, 59.5);
        assert_eq!(sim.state().phase(), Phase::Exploration);
        assert_eq!(sim.state().countdown, 1);

        run(&mut sim, 0.6);
        assert_eq!(sim.state().phase(), Phase::PreDisaster);
        let events = sim.drain_events();
        assert!(events.contains(&SimEvent::PhoneAlert));
        assert!(events.contains(&SimEvent::CountdownChanged(0)));
    }

    #[test]
    fn earthquake_escalates_then_completes() {
        let mut eq = LevelConfig::earthquake();
        eq.countdown_secs = 1;
        let mut sim = Simulation::new(config(vec![eq, LevelConfig::hailstorm()])).unwrap();

        // 1 s countdown + 3 s warning.
        run(&mut sim, 4.1);
        assert_eq!(sim.state().phase(), Phase::Escalation(0));
        assert!((sim.state().intensity() - 0.1).abs() < 1e-6);

        run(&mut sim, 8.0);
        assert_eq!(sim.state().phase(), Phase::Escalation(1));
        run(&mut sim, 6.0);
        assert_eq!(sim.state().phase(), Phase::Escalation(2));
        run(&mut sim, 5.0);
        assert_eq!(sim.state().phase(), Phase::PeakEvent);
        assert_eq!(sim.state().intensity(), 1.0);

        let events = sim.drain_events();
        assert!(events.contains(&SimEvent::GroundCracks { count: 20 }));

        // Peak 4 s + resolution 3 s + 2 s + completion 2 s.
        run(&mut sim, 11.2);
        assert_eq!(sim.state().phase(), Phase::LevelComplete);
        assert_eq!(sim.state().intensity(), 0.0);
        assert_eq!(sim.pending_timers(), 1);
        assert!(sim.hazards().is_empty());

        run(&mut sim, 3.0);
        assert_eq!(sim.state().phase(), Phase::Exploration);
        assert_eq!(sim.state().level, 2);
        assert_eq!(sim.state().countdown, 45);
    }

    #[test]
    fn completion_leaves_no_hazards_or_level_timers() {
        let mut hail = LevelConfig::hailstorm();
        hail.countdown_secs = 1;
        hail.stages[0].duration_ms = 5000;
        let mut sim = Simulation::new(config(vec![hail.clone(), hail])).unwrap();

        run(&mut sim, 1.0 + 2.0 + 4.0);
        assert_eq!(sim.state().phase(), Phase::PeakEvent);
        assert!(!sim.hazards().is_empty());

        run(&mut sim, 1.5);
        assert_eq!(sim.state().phase(), Phase::LevelComplete);
        assert!(sim.hazards().is_empty());
        // Only the next-level pause remains.
        assert_eq!(sim.pending_timers(), 1);
        sim.drain_events();

        run(&mut sim, 2.0);
        assert_eq!(hazard_spawns(&sim.drain_events()), 0);
    }

    #[test]
    fn sheltered_player_keeps_full_health_under_radiation() {
        let mut nuke = LevelConfig::nuclear_apocalypse();
        nuke.countdown_secs = 1;
        let mut sim = Simulation::new(config(vec![nuke])).unwrap();
        sim.ctx.player.position = sim.ctx.refuges[0].position + engine_core::Vec3::Y * 2.0;

        // 1 s countdown + 2 s warning, then ten resolver ticks in the peak.
        run(&mut sim, 3.5);
        assert_eq!(sim.state().phase(), Phase::PeakEvent);
        run(&mut sim, 10.0);
        assert!(sim.player_is_safe());
        assert_eq!(sim.player().health.current, 100.0);
        assert!(sim.state().beacon.is_some());
    }

    #[test]
    fn exposed_player_loses_health_every_resolver_tick() {
        let mut nuke = LevelConfig::nuclear_apocalypse();
        nuke.countdown_secs = 1;
        nuke.stages[0].triggers.retain(|t| matches!(t, crate::levels::StageTrigger::Radiation { .. }));
        let mut sim = Simulation::new(config(vec![nuke])).unwrap();

        run(&mut sim, 3.5);
        let mut last = sim.player().health.current;
        for _ in 0..5 {
            run(&mut sim, 1.0);
            let now = sim.player().health.current;
            assert!(now < last);
            last = now;
        }
    }

    #[test]
    fn death_ends_session_and_silences_generators() {
        let mut nuke = LevelConfig::nuclear_apocalypse();
        nuke.countdown_secs = 1;
        let mut sim = Simulation::new(config(vec![nuke])).unwrap();
        sim.ctx.player.health.set(1.0);

        run(&mut sim, 3.5);
        assert_eq!(sim.ctx.hazards.active_generators(&sim.ctx.tasks), 1);

        run(&mut sim, 1.0);
        assert_eq!(sim.state().phase(), Phase::GameOver);
        assert!(sim.is_over());
        assert_eq!(sim.player().health.current, 0.0);
        assert_eq!(sim.pending_timers(), 0);
        assert!(sim.hazards().is_empty());
        assert!(sim.state().beacon.is_none());
        sim.drain_events();

        let before = sim.state().survival_time;
        run(&mut sim, 5.0);
        assert!(sim.drain_events().is_empty());
        assert_eq!(sim.state().survival_time, before);
    }

    #[test]
    fn health_stays_in_range_through_a_meteor_level() {
        let mut meteor = LevelConfig::meteor_shower();
        meteor.countdown_secs = 1;
        let mut sim = Simulation::new(config(vec![meteor])).unwrap();
        let idle = MovementIntent::default();
        for _ in 0..(70.0 / DT) as usize {
            sim.tick(DT, &idle);
            let h = sim.player().health.current;
            assert!((0.0..=100.0).contains(&h));
            for e in sim.drain_events() {
                if let SimEvent::Explosion { kind, .. } = e {
                    assert_eq!(kind, HazardKind::Meteor);
                }
            }
        }
        assert!(sim.is_over());
    }

    #[test]
    fn last_level_ends_in_victory() {
        let mut calm = LevelConfig::hailstorm();
        calm.countdown_secs = 1;
        calm.stages[0].triggers.clear();
        calm.stages[0].duration_ms = 1000;
        let mut sim = Simulation::new(config(vec![calm])).unwrap();
        run(&mut sim, 4.5);
        assert_eq!(sim.state().phase(), Phase::Victory);
        assert_eq!(sim.pending_timers(), 0);
        assert_eq!(sim.player().health.current, 100.0);
    }

    #[test]
    fn rejects_invalid_config() {
        assert!(Simulation::new(config(Vec::new())).is_err());
        let mut strong = config(default_levels());
        strong.player.max_health = 150.0;
        assert!(Simulation::new(strong).is_err());
    }

    #[test]
    fn oversized_frame_is_dropped() {
        let mut sim = Simulation::new(config(default_levels())).unwrap();
        sim.drain_events();
        sim.tick(f32::MAX, &MovementIntent::default());
        sim.tick(1.0e20, &MovementIntent::default());
        assert_eq!(sim.state().phase(), Phase::Exploration);
        assert_eq!(sim.state().countdown, 60);
        assert_eq!(sim.state().survival_time, 0.0);
        assert!(sim.drain_events().is_empty());

        run(&mut sim, 1.05);
        assert_eq!(sim.state().countdown, 59);
    }

    fn sirens(events: &[SimEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, SimEvent::Audio(AudioCue::Siren)))
            .count()
    }

    #[test]
    fn siren_repeats_until_level_complete() {
        let mut eq = LevelConfig::earthquake();
        eq.countdown_secs = 1;
        let mut sim = Simulation::new(config(vec![eq, LevelConfig::hailstorm()])).unwrap();

        // Siren stage starts after 1 + 3 + 8 + 6 s.
        run(&mut sim, 17.9);
        assert_eq!(sirens(&sim.drain_events()), 0);

        // It sounds on entry and every 3 s until completion at 34 s.
        run(&mut sim, 16.3);
        assert_eq!(sim.state().phase(), Phase::LevelComplete);
        assert!(sirens(&sim.drain_events()) >= 5);

        run(&mut sim, 2.5);
        assert_eq!(sim.state().phase(), Phase::LevelComplete);
        assert_eq!(sirens(&sim.drain_events()), 0);
    }

    #[test]
    fn earthquake_peak_collapses_structures() {
        let mut eq = LevelConfig::earthquake();
        eq.countdown_secs = 1;
        for stage in &mut eq.stages {
            for trigger in &mut stage.triggers {
                if let StageTrigger::Collapse { eligibility, max_delay_ms } = trigger {
                    *eligibility = 1.0;
                    *max_delay_ms = 1000;
                }
            }
        }
        let mut sim = Simulation::new(config(vec![eq, LevelConfig::hailstorm()])).unwrap();
        let standing = sim.structures().count_in(StructureState::Intact);
        assert_eq!(standing, 9);

        run(&mut sim, 23.05);
        assert_eq!(sim.state().phase(), Phase::PeakEvent);
        assert_ne!(sim.camera_shake().offset, Vec3::ZERO);

        run(&mut sim, 1.1);
        // Only the enterable mansion is left standing.
        assert_eq!(sim.structures().count_in(StructureState::Intact), 1);
        assert!(sim
            .structures()
            .structures()
            .iter()
            .filter(|s| s.state() == StructureState::Cracking)
            .all(|s| s.progress() > 0.0));

        run(&mut sim, 2.9);
        assert!(sim.structures().count_in(StructureState::Debris) >= 1);
        assert!(sim.world().len() > 0);
        let hidden = sim
            .drain_events()
            .iter()
            .filter(|e| matches!(e, SimEvent::StructureHidden(_)))
            .count();
        assert_eq!(hidden, sim.structures().count_in(StructureState::Debris));
    }

    #[test]
    fn locust_contact_drains_per_resolver_tick() {
        let mut plague = LevelConfig::locust_plague();
        plague.countdown_secs = 1;
        plague.stages[0].duration_ms = 3000;
        let mut sim = Simulation::new(config(vec![plague, LevelConfig::hailstorm()])).unwrap();

        // 1 s countdown + 2 s warning releases the swarm.
        run(&mut sim, 3.05);
        assert_eq!(sim.state().phase(), Phase::PeakEvent);
        assert_eq!(sim.hazards().len(), 50);
        assert!(!sim.player_is_safe());

        let ctx = &mut sim.ctx;
        for _ in 0..4 {
            ctx.hazards
                .spawn_at(HazardKind::Locust, ctx.player.position, Vec3::ZERO, &mut ctx.events);
        }

        let idle = MovementIntent::default();
        let mut drained = 0.0;
        for _ in 0..(4.0 / DT) as usize {
            let touching = sim.hazards().locusts_near(sim.player().position, 3.0);
            let before = sim.player().health.current;
            sim.tick(DT, &idle);
            let lost = before - sim.player().health.current;
            if lost != 0.0 {
                assert!((lost - 0.5 * touching as f32).abs() < 1e-4);
                drained += lost;
            }
            if sim.state().phase() == Phase::LevelComplete {
                break;
            }
        }

        assert!(drained >= 2.0);
        assert_eq!(sim.state().phase(), Phase::LevelComplete);
        assert!(sim.hazards().is_empty());
        assert!(sim.player().health.current > 0.0);
    }
}
