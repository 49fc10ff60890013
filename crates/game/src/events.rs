//! Outbound notifications from the simulation core.
//!
//! Rendering, UI and audio live outside the core. Everything they need is
//! published here as fire-and-forget [`SimEvent`]s which the host drains once
//! per frame.

use engine_core::{Entity, Vec3};
use serde::{Deserialize, Serialize};

use crate::hazards::{HazardId, HazardKind};

/// Something the render surface should add or remove.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldEntity {
    Hazard { id: HazardId, kind: HazardKind },
    Debris(Entity),
    Explosion(Entity),
    /// Rotating alert beacon raised during the nuclear phase.
    Beacon,
}

/// Discrete cues for the external synthesis layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioCue {
    Explosion,
    Siren,
    /// Rumble loudness follows the published intensity.
    AmbientLevel(f32),
    /// Start (`true`) or stop the disaster soundtrack.
    DisasterMusic(bool),
}

/// Sky and fog colours as 0xRRGGBB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbientTone {
    pub sky: u32,
    pub fog: u32,
}

impl AmbientTone {
    pub const DESERT: Self = Self { sky: 0xFDB813, fog: 0xFDB813 };
    pub const CITY: Self = Self { sky: 0x87CEEB, fog: 0xB0C4DE };
    pub const METEOR_SKY: Self = Self { sky: 0x4B0000, fog: 0xFF6600 };
    pub const HAIL_SKY: Self = Self { sky: 0x2F4F4F, fog: 0x708090 };
    pub const NUCLEAR_SKY: Self = Self { sky: 0x8B0000, fog: 0xFF4500 };
    pub const LOCUST_SKY: Self = Self { sky: 0x6B5B00, fog: 0x8B8000 };
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    AddToWorld(WorldEntity),
    RemoveFromWorld(WorldEntity),
    AmbientTone(AmbientTone),
    StatusMessage { text: String, duration_ms: u64 },
    HealthChanged(f32),
    CountdownChanged(u32),
    LevelChanged { level: u32, name: String },
    Audio(AudioCue),
    Explosion { position: Vec3, kind: HazardKind },
    /// The structure at this index reached debris and should be hidden.
    StructureHidden(usize),
    GroundCracks { count: u32 },
    PhoneAlert,
    DamageFlash,
}

/// Ordered buffer of events produced during a tick.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<SimEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn status(&mut self, text: impl Into<String>, duration_ms: u64) {
        self.push(SimEvent::StatusMessage {
            text: text.into(),
            duration_ms,
        });
    }

    pub fn audio(&mut self, cue: AudioCue) {
        self.push(SimEvent::Audio(cue));
    }

    /// Take everything queued so far.
    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
