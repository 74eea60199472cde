//! Input components.
//!
//! Game code writes raw button/axis state into [`JumpInput`] every frame; the
//! controller turns it into press edges and buffered [`JumpRequest`]s.

use bevy::prelude::*;

use crate::classifier::SideFlags;

/// Raw player input for one character.
///
/// # Example
///
/// ```rust
/// use hitbox_controller::prelude::*;
///
/// let mut input = JumpInput::new();
/// input.set_horizontal(-0.8);
/// assert_eq!(input.horizontal(), -1);
///
/// input.set_jump_pressed(true);
/// assert!(input.is_jump_pressed());
/// ```
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct JumpInput {
    /// Horizontal axis, discretized to -1, 0 or 1.
    horizontal: i8,
    /// Current jump button level.
    jump_pressed: bool,
    /// Level seen by the last edge check.
    pub(crate) jump_pressed_prev: bool,
    /// A press edge waiting to be consumed by the next fixed tick.
    pub(crate) press_latched: bool,
}

impl JumpInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the horizontal axis value.
    ///
    /// Values with magnitude of at least 0.5 count as full input in that
    /// direction, smaller ones as no input.
    pub fn set_horizontal(&mut self, axis: f32) {
        self.horizontal = if axis >= 0.5 {
            1
        } else if axis <= -0.5 {
            -1
        } else {
            0
        };
    }

    /// Discretized horizontal input.
    pub fn horizontal(&self) -> i8 {
        self.horizontal
    }

    /// Set the jump button level. Call every frame with the current state.
    pub fn set_jump_pressed(&mut self, pressed: bool) {
        self.jump_pressed = pressed;
    }

    /// Whether the jump button is currently held.
    pub fn is_jump_pressed(&self) -> bool {
        self.jump_pressed
    }

    /// Detect a rising edge of the jump button since the last call.
    ///
    /// Runs on the variable-rate frame tick; a detected edge stays latched
    /// until a fixed tick consumes it.
    pub fn latch_press_edge(&mut self) -> bool {
        let edge = self.jump_pressed && !self.jump_pressed_prev;
        self.jump_pressed_prev = self.jump_pressed;
        if edge {
            self.press_latched = true;
        }
        edge
    }

    /// Consume a latched press edge.
    pub fn take_press(&mut self) -> bool {
        std::mem::take(&mut self.press_latched)
    }

    pub fn has_latched_press(&self) -> bool {
        self.press_latched
    }

    /// Clear axis and button state, including a latched press that no fixed
    /// tick has consumed yet.
    pub fn clear(&mut self) {
        self.horizontal = 0;
        self.jump_pressed = false;
        self.jump_pressed_prev = false;
        self.press_latched = false;
    }
}

/// Progress of a pending jump request.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// The jump should happen this tick.
    Jump,
    /// Still waiting for floor contact.
    Buffered,
    /// The buffer ran out without floor contact.
    Expired,
}

/// A jump press waiting to turn into a jump.
///
/// On its first tick the request jumps if the hitbox touches floor or a wall.
/// After that it waits up to `input_buffer` further ticks for floor contact
/// only; wall contact does not count while buffered.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JumpRequest {
    /// `None` before the first evaluation, then the number of buffered ticks
    /// already spent.
    buffered_ticks: Option<u32>,
}

impl JumpRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the request has not been evaluated yet.
    pub fn is_fresh(&self) -> bool {
        self.buffered_ticks.is_none()
    }

    /// Buffered ticks spent so far.
    pub fn buffered_ticks(&self) -> u32 {
        self.buffered_ticks.unwrap_or(0)
    }

    /// Evaluate the request for one fixed tick.
    pub fn advance(&mut self, flags: SideFlags, input_buffer: u32) -> RequestStatus {
        match self.buffered_ticks {
            None => {
                if flags.floor || flags.touching_wall() {
                    return RequestStatus::Jump;
                }
                self.buffered_ticks = Some(0);
                if input_buffer == 0 {
                    RequestStatus::Expired
                } else {
                    RequestStatus::Buffered
                }
            }
            Some(spent) => {
                if flags.floor {
                    return RequestStatus::Jump;
                }
                let spent = spent + 1;
                self.buffered_ticks = Some(spent);
                if spent >= input_buffer {
                    RequestStatus::Expired
                } else {
                    RequestStatus::Buffered
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AIRBORNE: SideFlags = SideFlags {
        ceiling: false,
        right: false,
        floor: false,
        left: false,
    };

    const GROUNDED: SideFlags = SideFlags {
        ceiling: false,
        right: false,
        floor: true,
        left: false,
    };

    const WALL: SideFlags = SideFlags {
        ceiling: false,
        right: true,
        floor: false,
        left: false,
    };

    // ==================== JumpInput Tests ====================

    #[test]
    fn horizontal_is_discretized() {
        let mut input = JumpInput::new();

        input.set_horizontal(1.0);
        assert_eq!(input.horizontal(), 1);

        input.set_horizontal(0.3);
        assert_eq!(input.horizontal(), 0);

        input.set_horizontal(-0.5);
        assert_eq!(input.horizontal(), -1);

        input.set_horizontal(-7.0);
        assert_eq!(input.horizontal(), -1);
    }

    #[test]
    fn press_edge_latched_once_per_press() {
        let mut input = JumpInput::new();

        input.set_jump_pressed(true);
        assert!(input.latch_press_edge());
        // Held: no new edge
        assert!(!input.latch_press_edge());

        assert!(input.take_press());
        assert!(!input.take_press());

        input.set_jump_pressed(false);
        assert!(!input.latch_press_edge());
        input.set_jump_pressed(true);
        assert!(input.latch_press_edge());
    }

    #[test]
    fn latched_press_survives_until_taken() {
        let mut input = JumpInput::new();
        input.set_jump_pressed(true);
        input.latch_press_edge();
        input.set_jump_pressed(false);
        input.latch_press_edge();

        // Button already released, press still pending
        assert!(input.has_latched_press());
        assert!(input.take_press());
    }

    #[test]
    fn clear_resets_levels() {
        let mut input = JumpInput::new();
        input.set_horizontal(1.0);
        input.set_jump_pressed(true);
        input.clear();
        assert_eq!(input.horizontal(), 0);
        assert!(!input.is_jump_pressed());
    }

    #[test]
    fn clear_drops_latched_press() {
        let mut input = JumpInput::new();
        input.set_jump_pressed(true);
        assert!(input.latch_press_edge());

        input.clear();
        assert!(!input.has_latched_press());
        assert!(!input.take_press());

        // A fresh press after clearing is a new edge
        input.set_jump_pressed(true);
        assert!(input.latch_press_edge());
    }

    // ==================== JumpRequest Tests ====================

    #[test]
    fn request_jumps_immediately_on_floor() {
        let mut request = JumpRequest::new();
        assert_eq!(request.advance(GROUNDED, 5), RequestStatus::Jump);
    }

    #[test]
    fn request_jumps_immediately_on_wall() {
        let mut request = JumpRequest::new();
        assert_eq!(request.advance(WALL, 5), RequestStatus::Jump);
    }

    #[test]
    fn buffered_request_ignores_wall() {
        let mut request = JumpRequest::new();
        assert_eq!(request.advance(AIRBORNE, 5), RequestStatus::Buffered);
        assert_eq!(request.advance(WALL, 5), RequestStatus::Buffered);
        assert_eq!(request.advance(GROUNDED, 5), RequestStatus::Jump);
    }

    #[test]
    fn buffered_request_jumps_on_last_buffered_tick() {
        let mut request = JumpRequest::new();
        assert_eq!(request.advance(AIRBORNE, 3), RequestStatus::Buffered);
        // Buffered ticks 0 and 1
        assert_eq!(request.advance(AIRBORNE, 3), RequestStatus::Buffered);
        assert_eq!(request.advance(AIRBORNE, 3), RequestStatus::Buffered);
        // Buffered tick 2 = input_buffer - 1
        assert_eq!(request.advance(GROUNDED, 3), RequestStatus::Jump);
    }

    #[test]
    fn buffered_request_expires() {
        let mut request = JumpRequest::new();
        assert_eq!(request.advance(AIRBORNE, 2), RequestStatus::Buffered);
        assert_eq!(request.advance(AIRBORNE, 2), RequestStatus::Buffered);
        assert_eq!(request.advance(AIRBORNE, 2), RequestStatus::Expired);
        assert_eq!(request.buffered_ticks(), 2);
    }

    #[test]
    fn zero_buffer_expires_on_first_miss() {
        let mut request = JumpRequest::new();
        assert!(request.is_fresh());
        assert_eq!(request.advance(AIRBORNE, 0), RequestStatus::Expired);
        assert!(!request.is_fresh());
    }
}
