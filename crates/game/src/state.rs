//! Session state types: phases, the published game state and camera shake.

use engine_core::Vec3;
use rand::Rng;

use crate::safety::DamagePolicy;

/// Alert beacon spin rate (radians per second).
const BEACON_SPIN: f32 = 1.2;

/// Disaster phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Free roaming while the countdown runs.
    Exploration,
    /// Warning issued; the first stage is imminent.
    PreDisaster,
    /// Escalation stage `n` (0-based).
    Escalation(u8),
    PeakEvent,
    Resolution,
    LevelComplete,
    GameOver,
    Victory,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::GameOver | Phase::Victory)
    }

    /// A disaster is underway (hazards, drains and shake may be active).
    pub fn is_disaster(self) -> bool {
        matches!(
            self,
            Phase::PreDisaster | Phase::Escalation(_) | Phase::PeakEvent | Phase::Resolution
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Exploration => "exploration",
            Phase::PreDisaster => "pre-disaster",
            Phase::Escalation(_) => "escalation",
            Phase::PeakEvent => "peak",
            Phase::Resolution => "resolution",
            Phase::LevelComplete => "level complete",
            Phase::GameOver => "game over",
            Phase::Victory => "victory",
        }
    }
}

/// Everything the host may read about the running session.
#[derive(Debug, Clone)]
pub struct GameState {
    /// 1-based level number.
    pub level: u32,
    pub max_level: u32,
    phase: Phase,
    /// Published disaster intensity, never negative.
    intensity: f32,
    /// Seconds left in the exploration countdown.
    pub countdown: u32,
    /// Seconds survived this session.
    pub survival_time: f32,
    /// Index of the active stage in the level table.
    pub stage_index: Option<usize>,
    pub policy: DamagePolicy,
    /// Beacon rotation when the alert beacon is raised.
    pub beacon: Option<f32>,
    /// Set by the first damage that drops health to zero.
    pub game_over: bool,
}

impl GameState {
    pub fn new(max_level: u32) -> Self {
        Self {
            level: 1,
            max_level,
            phase: Phase::Exploration,
            intensity: 0.0,
            countdown: 0,
            survival_time: 0.0,
            stage_index: None,
            policy: DamagePolicy::default(),
            beacon: None,
            game_over: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            log::info!("Level {}: {:?} -> {:?}", self.level, self.phase, phase);
            self.phase = phase;
        }
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.max(0.0);
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn is_last_level(&self) -> bool {
        self.level >= self.max_level
    }

    /// Spin the beacon if raised.
    pub fn update_beacon(&mut self, dt: f32) {
        if let Some(angle) = self.beacon.as_mut() {
            *angle = (*angle + BEACON_SPIN * dt) % std::f32::consts::TAU;
        }
    }
}

/// Camera offset driven by the published intensity.
#[derive(Debug, Clone, Copy, Default)]
pub struct CameraShake {
    pub offset: Vec3,
}

impl CameraShake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, intensity: f32, rng: &mut impl Rng) {
        if intensity > 0.0 {
            self.offset = Vec3::new(
                rng.gen_range(-0.5..0.5) * intensity,
                rng.gen_range(-0.5..0.5) * intensity * 0.5,
                rng.gen_range(-0.5..0.5) * intensity,
            );
        } else {
            self.offset = Vec3::ZERO;
        }
    }
}
