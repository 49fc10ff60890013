//! Device-agnostic input handling.
//!
//! Keyboards, touch joysticks and scripted drivers all feed the same
//! [`InputState`]; the simulation only ever sees the resulting
//! [`MovementIntent`].

use glam::Vec2;
use std::collections::HashSet;

/// Pitch is clamped just short of straight up/down.
const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Logical actions a device can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveForward,
    MoveBackward,
    StrafeLeft,
    StrafeRight,
    Run,
}

/// Per-frame movement request consumed by player kinematics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementIntent {
    /// x = strafe right, y = forward. Length is at most 1.
    pub direction: Vec2,
    pub running: bool,
    pub yaw: f32,
    pub pitch: f32,
}

/// Manages input state for the current frame.
#[derive(Debug)]
pub struct InputState {
    /// Actions currently held down.
    held: HashSet<Action>,
    /// Actions pressed this frame.
    pressed: HashSet<Action>,

    /// Analog stick (touch joystick), x = right, y = forward.
    joystick: Option<Vec2>,

    /// Accumulated look delta since the last frame.
    accumulated_look: Vec2,
    /// Look sensitivity (radians per unit of delta).
    sensitivity: f32,

    yaw: f32,
    pitch: f32,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            pressed: HashSet::new(),
            joystick: None,
            accumulated_look: Vec2::ZERO,
            sensitivity: 0.002,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Set look sensitivity (1.0 = default).
    pub fn set_sensitivity(&mut self, multiplier: f32) {
        self.sensitivity = 0.002 * multiplier.max(0.0);
    }

    /// Clear per-frame state and fold pending look deltas into yaw/pitch.
    /// Call at the start of each frame.
    pub fn begin_frame(&mut self) {
        self.pressed.clear();
        let delta = self.accumulated_look * self.sensitivity;
        self.accumulated_look = Vec2::ZERO;
        self.yaw -= delta.x;
        self.pitch = (self.pitch - delta.y).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Process a press or release of a logical action.
    pub fn process_action(&mut self, action: Action, pressed: bool) {
        if pressed {
            if self.held.insert(action) {
                self.pressed.insert(action);
            }
        } else {
            self.held.remove(&action);
        }
    }

    /// Release everything (focus lost, pointer unlocked).
    pub fn release_all(&mut self) {
        if !self.held.is_empty() {
            log::debug!("Releasing {} held actions", self.held.len());
        }
        self.held.clear();
        self.joystick = None;
    }

    /// Process relative look motion (mouse or touch drag).
    pub fn process_look(&mut self, delta: (f64, f64)) {
        self.accumulated_look.x += delta.0 as f32;
        self.accumulated_look.y += delta.1 as f32;
    }

    /// Set absolute look angles (scripted drivers).
    pub fn set_look(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Update or release the analog stick.
    pub fn set_joystick(&mut self, axis: Option<Vec2>) {
        self.joystick = axis.map(|a| a.clamp_length_max(1.0));
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    pub fn is_pressed(&self, action: Action) -> bool {
        self.pressed.contains(&action)
    }

    /// Movement direction: the joystick wins when engaged, else held actions.
    pub fn movement_input(&self) -> Vec2 {
        if let Some(axis) = self.joystick {
            return axis;
        }

        let mut movement = Vec2::ZERO;
        if self.is_held(Action::MoveForward) {
            movement.y += 1.0;
        }
        if self.is_held(Action::MoveBackward) {
            movement.y -= 1.0;
        }
        if self.is_held(Action::StrafeLeft) {
            movement.x -= 1.0;
        }
        if self.is_held(Action::StrafeRight) {
            movement.x += 1.0;
        }

        movement.normalize_or_zero()
    }

    /// Snapshot of everything the simulation needs this frame.
    pub fn movement_intent(&self) -> MovementIntent {
        MovementIntent {
            direction: self.movement_input(),
            running: self.is_held(Action::Run),
            yaw: self.yaw,
            pitch: self.pitch,
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_movement_is_normalized() {
        let mut input = InputState::new();
        input.process_action(Action::MoveForward, true);
        input.process_action(Action::StrafeRight, true);
        let m = input.movement_input();
        assert!((m.length() - 1.0).abs() < 1e-5);
        assert!(m.x > 0.0 && m.y > 0.0);
    }

    #[test]
    fn pressed_is_cleared_each_frame_but_held_persists() {
        let mut input = InputState::new();
        input.process_action(Action::Run, true);
        assert!(input.is_pressed(Action::Run));
        input.begin_frame();
        assert!(!input.is_pressed(Action::Run));
        assert!(input.movement_intent().running);
        input.process_action(Action::Run, false);
        assert!(!input.movement_intent().running);
    }

    #[test]
    fn joystick_overrides_keys() {
        let mut input = InputState::new();
        input.process_action(Action::MoveForward, true);
        input.set_joystick(Some(Vec2::new(3.0, 0.0)));
        assert_eq!(input.movement_input(), Vec2::new(1.0, 0.0));
        input.set_joystick(None);
        assert_eq!(input.movement_input(), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn look_accumulates_and_clamps_pitch() {
        let mut input = InputState::new();
        input.process_look((100.0, 0.0));
        input.begin_frame();
        assert!((input.yaw() + 0.2).abs() < 1e-5);
        input.process_look((0.0, -10_000.0));
        input.begin_frame();
        assert!(input.pitch() <= MAX_PITCH);
    }
}
