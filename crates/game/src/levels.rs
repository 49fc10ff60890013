//! Data-driven level table.
//!
//! Every level is the same state machine fed with different data: a countdown,
//! a warning, an ordered list of stages with fire-once triggers, and a
//! completion delay. The presets below reproduce the shipped campaign; a
//! `disaster.ron` file may replace any of it.

use serde::{Deserialize, Serialize};

use crate::events::AmbientTone;
use crate::hazards::HazardKind;

/// Parameters of a recurring hazard generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardRain {
    pub kind: HazardKind,
    pub interval_ms: u64,
    /// Chance that each spawn is followed by a second one.
    #[serde(default)]
    pub burst_chance: f32,
    #[serde(default)]
    pub burst_delay_ms: u64,
}

/// Which part of the disaster arc a stage belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageKind {
    Escalation,
    Peak,
    Resolution,
}

/// Side effects fired exactly once when a stage is entered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StageTrigger {
    GroundCracks { count: u32 },
    Siren { interval_ms: u64 },
    /// Roll each standing structure for collapse with a random delay.
    Collapse { eligibility: f32, max_delay_ms: u64 },
    HazardRain(HazardRain),
    /// Release a locust swarm that drains health on contact.
    Swarm { count: u32, contact_radius: f32, damage_per_tick: f32 },
    /// Unconditional drain each resolver tick unless sheltered.
    Radiation { damage_per_tick: f32 },
    AlertBeacon,
    Tone(AmbientTone),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub kind: StageKind,
    pub intensity: f32,
    pub duration_ms: u64,
    pub message: String,
    #[serde(default)]
    pub triggers: Vec<StageTrigger>,
}

impl StageConfig {
    fn new(kind: StageKind, intensity: f32, duration_ms: u64, message: &str) -> Self {
        Self {
            kind,
            intensity,
            duration_ms,
            message: message.to_string(),
            triggers: Vec::new(),
        }
    }

    fn with(mut self, trigger: StageTrigger) -> Self {
        self.triggers.push(trigger);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub name: String,
    /// Exploration countdown before the disaster starts.
    pub countdown_secs: u32,
    /// Status shown on entering the pre-disaster phase.
    pub warning: String,
    /// Time between the warning and the first stage.
    pub warning_ms: u64,
    #[serde(default)]
    pub phone_alert: bool,
    /// Sky/fog recolouring for the whole disaster, if any.
    #[serde(default)]
    pub tone: Option<AmbientTone>,
    pub stages: Vec<StageConfig>,
    /// Time spent in resolution after the last stage.
    #[serde(default)]
    pub completion_delay_ms: u64,
    /// Whether standing in a refuge regenerates health during this disaster.
    #[serde(default)]
    pub refuge_healing: bool,
}

impl LevelConfig {
    /// Level 1: gradual earthquake that ends in structural collapse.
    pub fn earthquake() -> Self {
        use StageKind::*;
        Self {
            name: "Earthquake".to_string(),
            countdown_secs: 60,
            warning: "Tremors detected... find shelter!".to_string(),
            warning_ms: 3000,
            phone_alert: true,
            tone: None,
            stages: vec![
                StageConfig::new(Escalation, 0.1, 8000, "Light tremors..."),
                StageConfig::new(Escalation, 0.3, 6000, "The earthquake is getting stronger...")
                    .with(StageTrigger::GroundCracks { count: 20 }),
                StageConfig::new(Escalation, 0.6, 5000, "STRONG EARTHQUAKE!")
                    .with(StageTrigger::Siren { interval_ms: 3000 }),
                StageConfig::new(Peak, 1.0, 4000, "DEVASTATING EARTHQUAKE!").with(
                    StageTrigger::Collapse {
                        eligibility: 0.4,
                        max_delay_ms: 15_000,
                    },
                ),
                StageConfig::new(Resolution, 0.8, 3000, "The earthquake is calming down..."),
                StageConfig::new(Resolution, 0.3, 2000, "Final tremors..."),
            ],
            completion_delay_ms: 2000,
            refuge_healing: true,
        }
    }

    /// Level 2: one minute of meteor rain with frequent double strikes.
    pub fn meteor_shower() -> Self {
        Self {
            name: "Meteor Shower".to_string(),
            countdown_secs: 50,
            warning: "Objects detected entering the atmosphere!".to_string(),
            warning_ms: 2000,
            phone_alert: false,
            tone: Some(AmbientTone::METEOR_SKY),
            stages: vec![StageConfig::new(
                StageKind::Peak,
                0.0,
                60_000,
                "METEOR SHOWER! Dodge them!",
            )
            .with(StageTrigger::HazardRain(HazardRain {
                kind: HazardKind::Meteor,
                interval_ms: 600,
                burst_chance: 0.7,
                burst_delay_ms: 200,
            }))],
            completion_delay_ms: 0,
            refuge_healing: false,
        }
    }

    /// Level 3: dense hail for 45 seconds.
    pub fn hailstorm() -> Self {
        Self {
            name: "Deadly Hailstorm".to_string(),
            countdown_secs: 45,
            warning: "Storm front approaching!".to_string(),
            warning_ms: 2000,
            phone_alert: false,
            tone: Some(AmbientTone::HAIL_SKY),
            stages: vec![StageConfig::new(
                StageKind::Peak,
                0.0,
                45_000,
                "DEADLY HAIL! Find shelter!",
            )
            .with(StageTrigger::HazardRain(HazardRain {
                kind: HazardKind::Hailstone,
                interval_ms: 300,
                burst_chance: 0.0,
                burst_delay_ms: 0,
            }))],
            completion_delay_ms: 0,
            refuge_healing: false,
        }
    }

    /// Level 4: nuclear meteors plus standing radiation.
    pub fn nuclear_apocalypse() -> Self {
        Self {
            name: "Nuclear Apocalypse".to_string(),
            countdown_secs: 40,
            warning: "Radiation alarm! Get ready to run!".to_string(),
            warning_ms: 2000,
            phone_alert: false,
            tone: Some(AmbientTone::NUCLEAR_SKY),
            stages: vec![StageConfig::new(
                StageKind::Peak,
                0.0,
                45_000,
                "NUCLEAR RADIATION! RUN TO THE BUNKER!",
            )
            .with(StageTrigger::AlertBeacon)
            .with(StageTrigger::HazardRain(HazardRain {
                kind: HazardKind::NuclearMeteor,
                interval_ms: 1500,
                burst_chance: 0.0,
                burst_delay_ms: 0,
            }))
            .with(StageTrigger::Radiation { damage_per_tick: 2.0 })],
            completion_delay_ms: 0,
            refuge_healing: true,
        }
    }

    /// Alternative level 4: a pursuing locust swarm.
    pub fn locust_plague() -> Self {
        Self {
            name: "Locust Plague".to_string(),
            countdown_secs: 40,
            warning: "A dark cloud is approaching...".to_string(),
            warning_ms: 2000,
            phone_alert: false,
            tone: Some(AmbientTone::LOCUST_SKY),
            stages: vec![StageConfig::new(
                StageKind::Peak,
                0.0,
                45_000,
                "LOCUST PLAGUE! Take cover!",
            )
            .with(StageTrigger::Swarm {
                count: 50,
                contact_radius: 3.0,
                damage_per_tick: 0.5,
            })],
            completion_delay_ms: 0,
            refuge_healing: true,
        }
    }

    /// Time from entering stage `from` until the level completes.
    pub fn remaining_ms(&self, from: usize) -> u64 {
        self.stages
            .iter()
            .skip(from)
            .map(|s| s.duration_ms)
            .sum::<u64>()
            + self.completion_delay_ms
    }

    /// Number of escalation stages before the peak.
    pub fn escalation_count(&self) -> usize {
        self.stages
            .iter()
            .filter(|s| s.kind == StageKind::Escalation)
            .count()
    }
}

/// The default four-level campaign.
pub fn default_levels() -> Vec<LevelConfig> {
    vec![
        LevelConfig::earthquake(),
        LevelConfig::meteor_shower(),
        LevelConfig::hailstorm(),
        LevelConfig::nuclear_apocalypse(),
    ]
}
