//! In-memory model of one standard-mapping gamepad.

use crate::clock::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const BUTTON_COUNT: usize = 16;
pub const AXIS_COUNT: usize = 4;
pub const STANDARD_MAPPING: &str = "standard";

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ButtonState {
    pub pressed: bool,
    pub touched: bool,
    pub value: f64,
}

impl ButtonState {
    pub const RELEASED: Self = Self {
        pressed: false,
        touched: false,
        value: 0.0,
    };

    /// Binary button: no analog pressure, so `value` follows `pressed`.
    pub fn from_pressed(pressed: bool) -> Self {
        Self {
            pressed,
            touched: pressed,
            value: if pressed { 1.0 } else { 0.0 },
        }
    }
}

/// Read-only view of a device as the consuming program sees it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GamepadSnapshot {
    pub index: usize,
    pub id: String,
    pub connected: bool,
    pub timestamp: f64,
    pub mapping: String,
    pub buttons: [ButtonState; BUTTON_COUNT],
    pub axes: [f64; AXIS_COUNT],
}

pub struct VirtualGamepad {
    index: usize,
    id: String,
    connected: bool,
    timestamp: f64,
    buttons: [ButtonState; BUTTON_COUNT],
    axes: [f64; AXIS_COUNT],
    clock: Arc<dyn Clock>,
}

impl VirtualGamepad {
    pub fn new(index: usize, id: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        let timestamp = clock.now_ms();
        Self {
            index,
            id: id.into(),
            connected: true,
            timestamp,
            buttons: [ButtonState::RELEASED; BUTTON_COUNT],
            axes: [0.0; AXIS_COUNT],
            clock,
        }
    }

    pub fn default_label(index: usize) -> String {
        format!("Virtual Gamepad {index}")
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn buttons(&self) -> &[ButtonState; BUTTON_COUNT] {
        &self.buttons
    }

    pub fn axes(&self) -> &[f64; AXIS_COUNT] {
        &self.axes
    }

    pub fn button(&self, index: usize) -> Option<ButtonState> {
        self.buttons.get(index).copied()
    }

    pub fn axis(&self, index: usize) -> Option<f64> {
        self.axes.get(index).copied()
    }

    /// Out-of-range indices are ignored.
    pub fn set_button(&mut self, index: usize, pressed: bool) {
        if let Some(button) = self.buttons.get_mut(index) {
            *button = ButtonState::from_pressed(pressed);
            self.touch();
        }
    }

    /// Stores `value` clamped to [-1, 1]; NaN is stored as 0. Out-of-range
    /// indices are ignored.
    pub fn set_axis(&mut self, index: usize, value: f64) {
        if let Some(axis) = self.axes.get_mut(index) {
            *axis = clamp_axis(value);
            self.touch();
        }
    }

    pub fn reset(&mut self) {
        self.buttons = [ButtonState::RELEASED; BUTTON_COUNT];
        self.axes = [0.0; AXIS_COUNT];
        self.touch();
    }

    pub fn snapshot(&self) -> GamepadSnapshot {
        GamepadSnapshot {
            index: self.index,
            id: self.id.clone(),
            connected: self.connected,
            timestamp: self.timestamp,
            mapping: STANDARD_MAPPING.to_string(),
            buttons: self.buttons,
            axes: self.axes,
        }
    }

    fn touch(&mut self) {
        self.timestamp = self.clock.now_ms().max(self.timestamp);
    }
}

impl fmt::Debug for VirtualGamepad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualGamepad")
            .field("index", &self.index)
            .field("id", &self.id)
            .field("connected", &self.connected)
            .field("timestamp", &self.timestamp)
            .field("buttons", &self.buttons)
            .field("axes", &self.axes)
            .finish()
    }
}

pub fn clamp_axis(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}
