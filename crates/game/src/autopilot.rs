//! Scripted driver for headless runs: rolls right and hops when stuck.

use input::{Action, InputSnapshot, InputState};

/// Frames a jump is charged before release.
const CHARGE_FRAMES: u32 = 20;
/// Frames with almost no forward progress before hopping.
const STALL_FRAMES: u32 = 45;
/// Hop anyway this often to clear small bumps.
const JUMP_INTERVAL: u64 = 240;
/// Forward movement per frame below which the ball counts as stalled.
const STALL_DISTANCE: f32 = 0.005;

#[derive(Debug, Default)]
pub struct Autopilot {
    input: InputState,
    frame: u64,
    charge_left: u32,
    stalled: u32,
    last_x: Option<f32>,
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input for the next frame given where the ball is now.
    pub fn next_input(&mut self, ball_x: f32, grounded: bool) -> InputSnapshot {
        self.input.begin_frame();
        self.frame += 1;
        self.input.set_held(Action::MoveRight, true);

        let progress = self.last_x.map_or(f32::INFINITY, |last| ball_x - last);
        self.last_x = Some(ball_x);
        if progress < STALL_DISTANCE {
            self.stalled += 1;
        } else {
            self.stalled = 0;
        }

        if self.charge_left > 0 {
            self.charge_left -= 1;
            if self.charge_left == 0 {
                self.input.set_held(Action::Jump, false);
            }
        } else if grounded && (self.stalled >= STALL_FRAMES || self.frame % JUMP_INTERVAL == 0) {
            self.input.set_held(Action::Jump, true);
            self.charge_left = CHARGE_FRAMES;
            self.stalled = 0;
        }

        self.input.snapshot()
    }

    /// Forget held buttons, e.g. after a restart.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_rolls_right() {
        let mut pilot = Autopilot::new();
        for i in 0..10 {
            let snap = pilot.next_input(i as f32, true);
            assert!(snap.move_right);
            assert!(!snap.jump_held);
        }
    }

    #[test]
    fn stalling_on_ground_charges_a_jump() {
        let mut pilot = Autopilot::new();
        let mut pressed_at = None;
        for frame in 0..100 {
            let snap = pilot.next_input(0.0, true);
            if snap.jump_just_pressed {
                pressed_at = Some(frame);
                break;
            }
        }
        let pressed_at = pressed_at.expect("stalled ball never jumped");
        assert!(pressed_at >= STALL_FRAMES as usize - 1);

        for _ in 1..CHARGE_FRAMES {
            let snap = pilot.next_input(0.0, true);
            assert!(snap.jump_held && !snap.jump_just_released);
        }
        let snap = pilot.next_input(0.0, true);
        assert!(snap.jump_just_released);
    }

    #[test]
    fn no_jump_while_airborne() {
        let mut pilot = Autopilot::new();
        for _ in 0..200 {
            assert!(!pilot.next_input(0.0, false).jump_held);
        }
    }
}
