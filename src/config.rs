//! Controller configuration.
//!
//! All values are supplied when the character is spawned and are not meant to
//! change afterwards.

use bevy::prelude::*;
use thiserror::Error;

/// Tuning parameters for movement, jumping and floor detection.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct ControllerConfig {
    /// Horizontal speed while walking (units/second).
    pub movement_speed: f32,

    /// Upward impulse applied on every jump.
    pub jumping_power: f32,

    /// Number of fixed ticks a jump press is remembered while waiting for
    /// floor contact.
    pub input_buffer: u32,

    /// Maximum falling speed while pushing into a touched wall.
    pub wall_drop_speed: f32,

    /// Scale of the counter impulse applied when the jump button is released
    /// during ascent. `1.0` cancels the remaining upward velocity exactly,
    /// larger values add a slight downward kick.
    pub jump_stop_force_multiplier: f32,

    /// Maximum `|x / y|` of a contact normal that still counts as floor.
    /// `1.0` is 45 degrees; larger values accept steeper ramps.
    ///
    /// Copied into the [`SideClassifier`](crate::classifier::SideClassifier)
    /// on the same entity when that classifier is registered. Later changes
    /// are not picked up.
    pub max_floor_slope: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            movement_speed: 120.0,
            jumping_power: 300.0,
            input_buffer: 6,
            wall_drop_speed: 60.0,
            jump_stop_force_multiplier: 1.0,
            max_floor_slope: 1.0,
        }
    }
}

impl ControllerConfig {
    /// Snappier preset for player characters.
    pub fn player() -> Self {
        Self {
            movement_speed: 150.0,
            jumping_power: 350.0,
            input_buffer: 8,
            wall_drop_speed: 45.0,
            jump_stop_force_multiplier: 1.2,
            ..default()
        }
    }

    /// Builder: set movement speed.
    pub fn with_movement_speed(mut self, speed: f32) -> Self {
        self.movement_speed = speed;
        self
    }

    /// Builder: set jumping power.
    pub fn with_jumping_power(mut self, power: f32) -> Self {
        self.jumping_power = power;
        self
    }

    /// Builder: set input buffer length in fixed ticks.
    pub fn with_input_buffer(mut self, ticks: u32) -> Self {
        self.input_buffer = ticks;
        self
    }

    /// Builder: set wall drop speed.
    pub fn with_wall_drop_speed(mut self, speed: f32) -> Self {
        self.wall_drop_speed = speed;
        self
    }

    /// Builder: set jump stop force multiplier.
    pub fn with_jump_stop_force_multiplier(mut self, multiplier: f32) -> Self {
        self.jump_stop_force_multiplier = multiplier;
        self
    }

    /// Builder: set max floor slope.
    pub fn with_max_floor_slope(mut self, slope: f32) -> Self {
        self.max_floor_slope = slope;
        self
    }

    /// Check that every parameter is finite and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("movement_speed", self.movement_speed),
            ("jumping_power", self.jumping_power),
            ("wall_drop_speed", self.wall_drop_speed),
            ("jump_stop_force_multiplier", self.jump_stop_force_multiplier),
            ("max_floor_slope", self.max_floor_slope),
        ];

        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field, value });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }
        Ok(())
    }
}

/// Invalid [`ControllerConfig`] value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("`{field}` must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },

    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
}
