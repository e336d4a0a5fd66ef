//! Input handling for the roller: held actions, per-frame edges and an
//! analog horizontal axis, flattened into one snapshot per frame.

use std::collections::HashSet;

/// Axis values inside this band count as centred.
pub const AXIS_DEAD_ZONE: f32 = 0.1;

/// Logical game actions. Device decoding maps keys and buttons onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Jump,
}

/// Flat per-frame input, the only thing the simulation reads.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    pub move_left: bool,
    pub move_right: bool,
    pub jump_held: bool,
    pub jump_just_pressed: bool,
    pub jump_just_released: bool,
    /// Analog stick in [-1, 1]; 0 when no stick is present.
    pub horizontal_axis: f32,
}

impl InputSnapshot {
    /// Horizontal direction: -1, 1 or 0. Left (flag or axis past the dead
    /// zone) wins over right.
    pub fn direction(&self) -> f32 {
        if self.move_left || self.horizontal_axis < -AXIS_DEAD_ZONE {
            -1.0
        } else if self.move_right || self.horizontal_axis > AXIS_DEAD_ZONE {
            1.0
        } else {
            0.0
        }
    }
}

/// Manages input state across frames and derives press/release edges.
#[derive(Debug, Default)]
pub struct InputState {
    /// Actions currently held down.
    held: HashSet<Action>,
    /// Actions pressed this frame.
    pressed: HashSet<Action>,
    /// Actions released this frame.
    released: HashSet<Action>,
    horizontal_axis: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame state. Call at the start of each frame.
    pub fn begin_frame(&mut self) {
        self.pressed.clear();
        self.released.clear();
    }

    /// Record a press or release of `action`. Repeats while held are ignored.
    pub fn process_action(&mut self, action: Action, down: bool) {
        if down {
            if self.held.insert(action) {
                self.pressed.insert(action);
            }
        } else if self.held.remove(&action) {
            self.released.insert(action);
        }
    }

    /// Set the whole held set at once, deriving edges from the previous
    /// frame. For sources that poll state instead of sending events.
    pub fn set_held(&mut self, action: Action, down: bool) {
        if down != self.held.contains(&action) {
            self.process_action(action, down);
        }
    }

    pub fn set_horizontal_axis(&mut self, value: f32) {
        self.horizontal_axis = if value.is_finite() { value.clamp(-1.0, 1.0) } else { 0.0 };
    }

    /// Drop all held actions without generating release edges.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    pub fn is_pressed(&self, action: Action) -> bool {
        self.pressed.contains(&action)
    }

    pub fn is_released(&self, action: Action) -> bool {
        self.released.contains(&action)
    }

    pub fn snapshot(&self) -> InputSnapshot {
        InputSnapshot {
            move_left: self.is_held(Action::MoveLeft),
            move_right: self.is_held(Action::MoveRight),
            jump_held: self.is_held(Action::Jump),
            jump_just_pressed: self.is_pressed(Action::Jump),
            jump_just_released: self.is_released(Action::Jump),
            horizontal_axis: self.horizontal_axis,
        }
    }
}
