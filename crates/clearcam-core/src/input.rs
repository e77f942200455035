//! Input intents for pointer and keyboard events.
//!
//! The host's event loop turns each raw event into one [`Intent`] and hands
//! it to the drawing state machine. Pointer positions are in screen space,
//! relative to the canvas container's top-left corner.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };
}

/// Keys the canvas reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Delete,
    Backspace,
    Other(String),
}

impl Key {
    /// Parse a DOM-style key name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Delete" => Key::Delete,
            "Backspace" => Key::Backspace,
            other => Key::Other(other.to_string()),
        }
    }

    /// Keys that delete the selected shape.
    pub fn is_delete(&self) -> bool {
        matches!(self, Key::Delete | Key::Backspace)
    }
}

/// One input event, as consumed by the drawing state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    PointerDown {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    PointerMove {
        position: Point,
    },
    PointerUp {
        position: Point,
    },
    /// Pointer left the canvas; ends any gesture like a release.
    PointerLeave,
    KeyDown(Key),
}

impl Intent {
    /// Left-button press with no modifiers.
    pub fn down(x: f64, y: f64) -> Self {
        Intent::PointerDown {
            position: Point::new(x, y),
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
        }
    }

    /// Left-button press with shift held.
    pub fn shift_down(x: f64, y: f64) -> Self {
        Intent::PointerDown {
            position: Point::new(x, y),
            button: MouseButton::Left,
            modifiers: Modifiers::SHIFT,
        }
    }

    pub fn move_to(x: f64, y: f64) -> Self {
        Intent::PointerMove {
            position: Point::new(x, y),
        }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Intent::PointerUp {
            position: Point::new(x, y),
        }
    }

    /// Whether this is a primary-button press.
    pub fn is_primary_down(&self) -> bool {
        matches!(
            self,
            Intent::PointerDown {
                button: MouseButton::Left,
                ..
            }
        )
    }
}
