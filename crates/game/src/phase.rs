//! Disaster phase controller.
//!
//! Drives each level through exploration, warning, its stage table and
//! completion. Every timer it starts goes into the context's
//! [`TaskRegistry`]; leaving a level or reaching a terminal phase tears the
//! registry down in one call.

use engine_core::Vec3;

use crate::config::{SafetyConfig, TimingConfig};
use crate::events::{AudioCue, SimEvent, WorldEntity};
use crate::levels::{LevelConfig, StageKind, StageTrigger};
use crate::safety::{self, SwarmContact};
use crate::sim::SimContext;
use crate::state::Phase;
use crate::tasks::{ms, Task};

/// Hazards spawn over an area centred on the world origin.
const HAZARD_CENTER: Vec3 = Vec3::ZERO;

#[derive(Debug, Clone)]
pub struct PhaseController {
    levels: Vec<LevelConfig>,
    timing: TimingConfig,
    safety: SafetyConfig,
}

impl PhaseController {
    pub fn new(levels: Vec<LevelConfig>, timing: TimingConfig, safety: SafetyConfig) -> Self {
        Self {
            levels,
            timing,
            safety,
        }
    }

    pub fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    /// Config of the current level (1-based, clamped to the table).
    pub fn level(&self, level: u32) -> &LevelConfig {
        let idx = (level.max(1) as usize - 1).min(self.levels.len().saturating_sub(1));
        &self.levels[idx]
    }

    /// Begin the current level's exploration countdown.
    pub fn enter_exploration(&self, ctx: &mut SimContext) {
        let level = self.level(ctx.state.level);
        ctx.state.set_phase(Phase::Exploration);
        ctx.state.stage_index = None;
        ctx.state.countdown = level.countdown_secs;
        log::info!("Level {} ({}) begins", ctx.state.level, level.name);

        ctx.events.push(SimEvent::LevelChanged {
            level: ctx.state.level,
            name: level.name.clone(),
        });
        ctx.events.push(SimEvent::CountdownChanged(level.countdown_secs));
        ctx.events.push(SimEvent::AmbientTone(ctx.baseline_tone));
        ctx.events.status(
            format!("Level {}: {}. Explore while you can!", ctx.state.level, level.name),
            self.timing.status_ms,
        );

        if level.countdown_secs == 0 {
            self.start_disaster(ctx);
        } else {
            ctx.tasks
                .schedule_every(Task::Countdown, ms(self.timing.countdown_tick_ms));
        }
    }

    /// React to a fired timer.
    pub fn handle(&self, task: Task, ctx: &mut SimContext) {
        if ctx.state.is_terminal() {
            return;
        }
        match task {
            Task::Countdown => self.tick_countdown(ctx),
            Task::AdvanceStage => self.advance_stage(ctx),
            Task::CompleteLevel => self.complete_level(ctx),
            Task::NextLevel => {
                ctx.state.level += 1;
                self.enter_exploration(ctx);
            }
            Task::Siren => ctx.events.audio(AudioCue::Siren),
            Task::ResolverTick => safety::resolve_tick(
                &mut ctx.player,
                &mut ctx.state,
                &ctx.refuges,
                &ctx.hazards,
                &self.safety,
                &mut ctx.events,
            ),
            Task::SpawnHazards(rain) => {
                ctx.hazards.on_generator_fired(
                    rain,
                    &mut ctx.tasks,
                    HAZARD_CENTER,
                    &mut ctx.rng,
                    &mut ctx.events,
                );
            }
            Task::SpawnHazard(kind) => {
                ctx.hazards
                    .spawn_one(kind, HAZARD_CENTER, &mut ctx.rng, &mut ctx.events);
            }
            Task::Crack(idx) => {
                ctx.structures.begin_cracking(idx);
            }
        }
    }

    fn tick_countdown(&self, ctx: &mut SimContext) {
        if ctx.state.phase() != Phase::Exploration {
            return;
        }
        ctx.state.countdown = ctx.state.countdown.saturating_sub(1);
        ctx.events.push(SimEvent::CountdownChanged(ctx.state.countdown));
        if ctx.state.countdown == 0 {
            ctx.tasks.cancel_where(|t| *t == Task::Countdown);
            self.start_disaster(ctx);
        }
    }

    /// Issue the warning and arm the first stage.
    fn start_disaster(&self, ctx: &mut SimContext) {
        let level = self.level(ctx.state.level);
        ctx.state.set_phase(Phase::PreDisaster);
        ctx.state.policy.healing = level.refuge_healing;

        ctx.events.audio(AudioCue::DisasterMusic(true));
        if level.phone_alert {
            ctx.events.push(SimEvent::PhoneAlert);
        }
        ctx.events.status(level.warning.clone(), self.timing.status_ms);
        if let Some(tone) = level.tone {
            ctx.events.push(SimEvent::AmbientTone(tone));
        }

        ctx.tasks
            .schedule_every(Task::ResolverTick, ms(self.safety.resolver_interval_ms));
        ctx.tasks
            .schedule_once(Task::AdvanceStage, ms(level.warning_ms));
    }

    /// Enter the next stage, or wind down once the table is exhausted.
    fn advance_stage(&self, ctx: &mut SimContext) {
        let level = self.level(ctx.state.level);
        let next = ctx.state.stage_index.map_or(0, |i| i + 1);

        let Some(stage) = level.stages.get(next) else {
            ctx.state.set_phase(Phase::Resolution);
            ctx.tasks
                .schedule_once(Task::CompleteLevel, ms(level.completion_delay_ms));
            return;
        };

        let phase = match stage.kind {
            StageKind::Escalation => {
                let n = level.stages[..next]
                    .iter()
                    .filter(|s| s.kind == StageKind::Escalation)
                    .count();
                Phase::Escalation(n.min(u8::MAX as usize) as u8)
            }
            StageKind::Peak => Phase::PeakEvent,
            StageKind::Resolution => Phase::Resolution,
        };
        ctx.state.stage_index = Some(next);
        ctx.state.set_phase(phase);
        ctx.state.set_intensity(stage.intensity);
        ctx.events.audio(AudioCue::AmbientLevel(ctx.state.intensity()));
        ctx.events.status(stage.message.clone(), self.timing.status_ms);

        let remaining_ms = level.remaining_ms(next);
        for trigger in &stage.triggers {
            self.fire_trigger(*trigger, remaining_ms, ctx);
        }

        ctx.tasks
            .schedule_once(Task::AdvanceStage, ms(stage.duration_ms));
    }

    /// `remaining_ms` is the time left before the level completes.
    fn fire_trigger(&self, trigger: StageTrigger, remaining_ms: u64, ctx: &mut SimContext) {
        match trigger {
            StageTrigger::GroundCracks { count } => {
                ctx.events.push(SimEvent::GroundCracks { count });
            }
            StageTrigger::Siren { interval_ms } => {
                ctx.events.audio(AudioCue::Siren);
                ctx.tasks.schedule_every(Task::Siren, ms(interval_ms));
            }
            StageTrigger::Collapse {
                eligibility,
                max_delay_ms,
            } => {
                // Cracks still pending at completion would be cancelled.
                let max_delay_ms = max_delay_ms.min(remaining_ms);
                ctx.structures
                    .schedule_collapse(&mut ctx.tasks, &mut ctx.rng, eligibility, max_delay_ms);
            }
            StageTrigger::HazardRain(rain) => {
                ctx.hazards.start_generator(&mut ctx.tasks, rain);
            }
            StageTrigger::Swarm {
                count,
                contact_radius,
                damage_per_tick,
            } => {
                ctx.hazards
                    .spawn_swarm(count, HAZARD_CENTER, &mut ctx.rng, &mut ctx.events);
                ctx.state.policy.swarm = Some(SwarmContact {
                    radius: contact_radius,
                    damage_per_tick,
                });
            }
            StageTrigger::Radiation { damage_per_tick } => {
                ctx.state.policy.radiation = Some(damage_per_tick);
            }
            StageTrigger::AlertBeacon => {
                if ctx.state.beacon.is_none() {
                    ctx.state.beacon = Some(0.0);
                    ctx.events.push(SimEvent::AddToWorld(WorldEntity::Beacon));
                }
            }
            StageTrigger::Tone(tone) => ctx.events.push(SimEvent::AmbientTone(tone)),
        }
    }

    /// Stop everything the level started and return the world to calm.
    fn teardown(&self, ctx: &mut SimContext) {
        ctx.hazards.stop_generators(&mut ctx.tasks);
        let cancelled = ctx.tasks.cancel_all();
        let cleared = ctx.hazards.clear_all(&mut ctx.events);
        log::debug!("Teardown: {} timers cancelled, {} hazards cleared", cancelled, cleared);

        ctx.state.set_intensity(0.0);
        ctx.state.stage_index = None;
        ctx.state.policy.clear();
        if ctx.state.beacon.take().is_some() {
            ctx.events.push(SimEvent::RemoveFromWorld(WorldEntity::Beacon));
        }
        ctx.events.audio(AudioCue::AmbientLevel(0.0));
        ctx.events.audio(AudioCue::DisasterMusic(false));
        ctx.events.push(SimEvent::AmbientTone(ctx.baseline_tone));
    }

    fn complete_level(&self, ctx: &mut SimContext) {
        self.teardown(ctx);
        if ctx.state.is_last_level() {
            self.enter_victory(ctx);
            return;
        }
        ctx.state.set_phase(Phase::LevelComplete);
        ctx.events.status(
            format!("Level {} survived!", ctx.state.level),
            self.timing.status_ms,
        );
        ctx.tasks
            .schedule_once(Task::NextLevel, ms(self.timing.next_level_pause_ms));
    }

    fn enter_victory(&self, ctx: &mut SimContext) {
        ctx.state.set_phase(Phase::Victory);
        ctx.events.status(
            format!("You survived every disaster in {:.0} s!", ctx.state.survival_time),
            self.timing.status_ms,
        );
    }

    /// Terminal loss. Safe to call from any non-terminal phase.
    pub fn enter_game_over(&self, ctx: &mut SimContext) {
        if ctx.state.is_terminal() {
            return;
        }
        self.teardown(ctx);
        ctx.state.set_phase(Phase::GameOver);
        ctx.events.status(
            format!("GAME OVER. You survived {:.0} s", ctx.state.survival_time),
            self.timing.status_ms,
        );
    }
}
