//! Headless Disaster Simulator session runner.
//!
//! `disaster-sim [config.ron]` plays the campaign at a fixed rate with a
//! simple autopilot and logs every event the simulation emits.

use anyhow::{Context, Result};
use disaster_sim::config::CONFIG_FILE;
use disaster_sim::destruction::StructureState;
use disaster_sim::{SimConfig, SimEvent, Simulation};
use engine_core::{Time, Vec3};
use input::{Action, InputState, MovementIntent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seconds between wander heading changes.
const WANDER_INTERVAL: f32 = 3.0;
/// Frames without progress before sidestepping an obstacle.
const STUCK_FRAMES: u32 = 20;

/// Scripted driver: wanders while exploring, runs for the nearest refuge once
/// a disaster is underway.
struct Autopilot {
    input: InputState,
    rng: StdRng,
    wander_timer: f32,
    last_position: Vec3,
    stuck_frames: u32,
}

impl Autopilot {
    fn new(seed: u64) -> Self {
        Self {
            input: InputState::new(),
            rng: StdRng::seed_from_u64(seed),
            wander_timer: 0.0,
            last_position: Vec3::ZERO,
            stuck_frames: 0,
        }
    }

    fn drive(&mut self, sim: &Simulation, dt: f32) -> MovementIntent {
        self.input.begin_frame();
        let position = sim.player().position;

        if (position - self.last_position).length_squared() < 1e-6 {
            self.stuck_frames += 1;
        } else {
            self.stuck_frames = 0;
        }
        self.last_position = position;

        if sim.state().phase().is_disaster() {
            if sim.player_is_safe() {
                self.input.release_all();
                return self.input.movement_intent();
            }
            let nearest = sim.refuges().iter().min_by(|a, b| {
                a.position
                    .distance_squared(position)
                    .total_cmp(&b.position.distance_squared(position))
            });
            if let Some(refuge) = nearest {
                let to = refuge.position - position;
                self.input.set_look((-to.x).atan2(-to.z), 0.0);
                self.input.process_action(Action::MoveForward, true);
                self.input.process_action(Action::Run, true);
            }
        } else {
            self.input.process_action(Action::Run, false);
            self.wander_timer -= dt;
            if self.wander_timer <= 0.0 {
                self.wander_timer = WANDER_INTERVAL;
                // Mouse-style turn of up to ~90° either way.
                let turn = self.rng.gen_range(-800.0..800.0);
                self.input.process_look((turn, 0.0));
                self.input.process_action(Action::MoveForward, true);
            }
        }

        let sidestep = self.stuck_frames > STUCK_FRAMES;
        self.input.process_action(Action::StrafeLeft, sidestep);
        self.input.movement_intent()
    }
}

fn log_event(event: &SimEvent) {
    match event {
        SimEvent::StatusMessage { text, .. } => log::info!("[status] {}", text),
        SimEvent::LevelChanged { level, name } => log::info!("[level] {}: {}", level, name),
        SimEvent::HealthChanged(h) => log::debug!("[health] {:.1}", h),
        other => log::debug!("{:?}", other),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load(&path).with_context(|| format!("loading {}", path))?,
        None => SimConfig::load_or_default(CONFIG_FILE),
    };
    let max_seconds = config.session.max_seconds;
    let tick_hz = config.session.tick_hz;
    let realtime = config.session.realtime;
    let autopilot_seed = config.seed.unwrap_or_else(rand::random);

    let mut sim = Simulation::new(config).context("building simulation")?;
    let mut autopilot = Autopilot::new(autopilot_seed);
    let mut time = Time::new();
    time.set_fixed_rate(tick_hz);

    log::info!(
        "Starting Disaster Simulator: {} levels, {:.0} Hz, cap {:.0} s",
        sim.state().max_level,
        tick_hz,
        max_seconds
    );

    while !sim.is_over() && time.elapsed_seconds() < max_seconds {
        if realtime {
            std::thread::sleep(time.fixed_timestep());
            time.update();
        } else {
            time.advance(time.fixed_timestep());
        }
        while time.should_fixed_update() {
            let dt = time.fixed_timestep_seconds();
            let intent = autopilot.drive(&sim, dt);
            sim.tick(dt, &intent);
        }
        for event in sim.drain_events() {
            log_event(&event);
        }
    }

    let state = sim.state();
    let outcome = if sim.is_over() {
        state.phase().label()
    } else {
        "time limit"
    };
    println!(
        "Session ended ({}): level {}/{}, health {:.0}%, survived {:.1} s over {} frames, {} hazards spawned, {} structures collapsed",
        outcome,
        state.level,
        state.max_level,
        sim.player().health.percentage() * 100.0,
        state.survival_time,
        time.frame_count(),
        sim.hazards().total_spawned(),
        sim.structures().count_in(StructureState::Debris)
    );

    Ok(())
}
