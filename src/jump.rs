//! Jump state machine and horizontal movement.
//!
//! Everything here is pure tick logic: each function reads the side flags,
//! the input sample and the body's velocity, and records the velocity
//! overwrites and impulses it wants in a [`BodyCommands`] buffer. The systems
//! in [`crate::systems`] forward those commands to the physics backend.
//!
//! Two processes run side by side on the fixed tick:
//!
//! - the **jump attempt**, started by a press edge: jumps at once on floor
//!   or wall contact, otherwise waits up to `input_buffer` ticks for floor;
//! - the **cancel watch**, started by every jump: after a two-tick grace
//!   period it waits while the button is held and the body rises, then one
//!   tick later cancels whatever upward velocity is left.

use bevy::prelude::*;

use crate::classifier::SideFlags;
use crate::config::ControllerConfig;
use crate::intent::{JumpRequest, RequestStatus};

/// Fixed ticks between a jump and the first release check.
pub const CANCEL_GRACE_TICKS: u8 = 2;

/// A command for the rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyCommand {
    /// Overwrite the linear velocity.
    SetVelocity(Vec2),
    /// Add a one-tick impulse.
    ApplyImpulse(Vec2),
}

/// Ordered command buffer with a local view of the body's velocity.
///
/// Velocity overwrites are visible to later steps of the same tick; impulses
/// only take effect when the physics engine integrates them.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyCommands {
    velocity: Vec2,
    commands: Vec<BodyCommand>,
}

impl BodyCommands {
    /// Start a tick from the body's current velocity.
    pub fn new(velocity: Vec2) -> Self {
        Self {
            velocity,
            commands: Vec::new(),
        }
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
        self.commands.push(BodyCommand::SetVelocity(velocity));
    }

    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.commands.push(BodyCommand::ApplyImpulse(impulse));
    }

    pub fn commands(&self) -> &[BodyCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Sum of all impulses recorded this tick.
    pub fn total_impulse(&self) -> Vec2 {
        self.commands
            .iter()
            .filter_map(|c| match c {
                BodyCommand::ApplyImpulse(i) => Some(*i),
                BodyCommand::SetVelocity(_) => None,
            })
            .sum()
    }

    pub fn into_commands(self) -> Vec<BodyCommand> {
        self.commands
    }
}

/// Walk or wall-slide for one fixed tick.
///
/// Pushing into a touched wall while falling at least `wall_drop_speed`
/// pins the body to `(0, -wall_drop_speed)`. Pushing into a wall while
/// falling slower leaves velocity untouched. Otherwise horizontal velocity
/// becomes `horizontal * movement_speed` and vertical velocity is kept.
pub fn apply_horizontal(
    flags: SideFlags,
    horizontal: i8,
    config: &ControllerConfig,
    body: &mut BodyCommands,
) {
    let into_wall = (flags.right && horizontal > 0) || (flags.left && horizontal < 0);
    let velocity = body.velocity();

    if into_wall {
        if velocity.y <= -config.wall_drop_speed {
            body.set_velocity(Vec2::new(0.0, -config.wall_drop_speed));
        }
        return;
    }

    body.set_velocity(Vec2::new(
        f32::from(horizontal) * config.movement_speed,
        velocity.y,
    ));
}

/// Where a cancel watch currently waits.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelPhase {
    /// Waiting out the grace period.
    Grace { remaining: u8 },
    /// Waiting while the button is held and the body rises.
    Holding,
    /// Condition ended last tick; cancel this tick.
    Settling,
}

/// Result of advancing a cancel watch by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WatchStep {
    /// Still watching.
    Waiting,
    /// The grace period ended this tick.
    GraceEnded,
    /// Apply this impulse; the watch is done.
    Cancel(Vec2),
    /// Ascent already over; the watch is done without effect.
    Finished,
}

/// Variable jump height: shortens one jump's ascent on early release.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpCancelWatch {
    phase: CancelPhase,
}

impl Default for JumpCancelWatch {
    fn default() -> Self {
        Self::new()
    }
}

impl JumpCancelWatch {
    pub fn new() -> Self {
        Self {
            phase: CancelPhase::Grace {
                remaining: CANCEL_GRACE_TICKS,
            },
        }
    }

    pub fn phase(&self) -> CancelPhase {
        self.phase
    }

    pub fn in_grace(&self) -> bool {
        matches!(self.phase, CancelPhase::Grace { .. })
    }

    /// Advance by one fixed tick.
    ///
    /// The tick that ends the grace period already runs the first hold check.
    pub fn advance(&mut self, jump_held: bool, velocity: Vec2, stop_multiplier: f32) -> WatchStep {
        match self.phase {
            CancelPhase::Grace { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.phase = CancelPhase::Holding;
                    self.check_hold(jump_held, velocity);
                    WatchStep::GraceEnded
                } else {
                    self.phase = CancelPhase::Grace { remaining };
                    WatchStep::Waiting
                }
            }
            CancelPhase::Holding => {
                self.check_hold(jump_held, velocity);
                WatchStep::Waiting
            }
            CancelPhase::Settling => {
                if velocity.y > 0.0 {
                    WatchStep::Cancel(Vec2::new(0.0, -velocity.y * stop_multiplier))
                } else {
                    WatchStep::Finished
                }
            }
        }
    }

    /// Move to `Settling` once the button is up or the ascent is over.
    fn check_hold(&mut self, jump_held: bool, velocity: Vec2) {
        if !(jump_held && velocity.y > 0.0) {
            self.phase = CancelPhase::Settling;
        }
    }
}

/// One fixed tick of input as seen by the jump machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JumpTickInput {
    /// A press edge was latched since the last fixed tick.
    pub pressed: bool,
    /// The jump button is held.
    pub held: bool,
}

/// What the jump machine did this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JumpTickReport {
    pub jumped: bool,
    pub expired: bool,
    pub cancelled: bool,
}

/// Per-character jump state.
///
/// At most one [`JumpCancelWatch`] exists at a time: a new jump (only
/// possible mid-ascent as a wall-jump) replaces the previous jump's watch, so
/// a stale watch can never apply its cancel impulse to the new ascent.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct JumpController {
    request: Option<JumpRequest>,
    cancel_watch: Option<JumpCancelWatch>,
    jumping: bool,
    jump_count: u32,
}

impl JumpController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending jump request, if a press is being buffered.
    pub fn request(&self) -> Option<&JumpRequest> {
        self.request.as_ref()
    }

    /// Active cancel watch, if the current jump is still being watched.
    pub fn cancel_watch(&self) -> Option<&JumpCancelWatch> {
        self.cancel_watch.as_ref()
    }

    /// Mid-jump: set once a jump's grace period ends, cleared on floor or
    /// wall contact.
    pub fn is_jumping(&self) -> bool {
        self.jumping
    }

    /// Total jumps performed.
    pub fn jump_count(&self) -> u32 {
        self.jump_count
    }

    /// Run the jump processes for one fixed tick.
    ///
    /// The cancel watch is advanced before any new jump starts, so a watch
    /// created this tick begins counting on the next one. A cancel that comes
    /// due on the tick a new jump fires belongs to the old ascent and is
    /// dropped.
    pub fn tick(
        &mut self,
        flags: SideFlags,
        input: JumpTickInput,
        config: &ControllerConfig,
        body: &mut BodyCommands,
    ) -> JumpTickReport {
        let mut report = JumpTickReport::default();
        let mut due_cancel = None;

        if let Some(watch) = self.cancel_watch.as_mut() {
            match watch.advance(input.held, body.velocity(), config.jump_stop_force_multiplier) {
                WatchStep::Waiting => {}
                WatchStep::GraceEnded => self.jumping = true,
                WatchStep::Cancel(impulse) => {
                    self.cancel_watch = None;
                    due_cancel = Some(impulse);
                }
                WatchStep::Finished => self.cancel_watch = None,
            }
        }

        if self.jumping && (flags.floor || flags.touching_wall()) {
            self.jumping = false;
        }

        if input.pressed {
            self.request = Some(JumpRequest::new());
        }

        if let Some(request) = self.request.as_mut() {
            match request.advance(flags, config.input_buffer) {
                RequestStatus::Jump => {
                    self.request = None;
                    self.jump(config, body);
                    report.jumped = true;
                }
                RequestStatus::Buffered => {}
                RequestStatus::Expired => {
                    debug!("buffered jump expired without floor contact");
                    self.request = None;
                    report.expired = true;
                }
            }
        }

        if let Some(impulse) = due_cancel {
            if report.jumped {
                debug!("dropping cancel of the previous ascent, a new jump started");
            } else {
                debug!("jump released early, cancelling ascent with {impulse}");
                body.apply_impulse(impulse);
                report.cancelled = true;
            }
        }

        report
    }

    /// Zero vertical velocity, push up and start a fresh cancel watch.
    fn jump(&mut self, config: &ControllerConfig, body: &mut BodyCommands) {
        let velocity = body.velocity();
        body.set_velocity(Vec2::new(velocity.x, 0.0));
        body.apply_impulse(Vec2::new(0.0, config.jumping_power));
        self.cancel_watch = Some(JumpCancelWatch::new());
        self.jump_count += 1;
        debug!("jump #{} with power {}", self.jump_count, config.jumping_power);
    }
}
