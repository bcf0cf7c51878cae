//! Input abstraction layer.
//!
//! The host forwards raw pointer and keyboard events as `InputEvent`s.
//! `InputState` folds them into held-key and button state, and once per
//! tick `ModeFlags::from_input` turns that state into the named mode
//! booleans the transform controller consumes.

use kurbo::Point;
use std::collections::HashSet;

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f64, y: f64, button: PointerButton },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64, button: PointerButton },
    KeyDown { key: Key },
    KeyUp { key: Key },
}

impl InputEvent {
    pub fn key_down(name: &str) -> Option<Self> {
        Key::from_name(name).map(|key| Self::KeyDown { key })
    }

    pub fn key_up(name: &str) -> Option<Self> {
        Key::from_name(name).map(|key| Self::KeyUp { key })
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y }
            | Self::PointerUp { x, y, .. } => Some(Point::new(*x, *y)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Left button. Left to the host simulation (it drags bodies).
    Primary,
    Middle,
    /// Right button. Selects, starts region gestures and translates.
    Secondary,
}

/// Keyboard keys the inspector cares about. Letters are stored lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Char(char),
    Space,
    Up,
    Down,
    Left,
    Right,
    Delete,
    Backspace,
    Escape,
    Enter,
    Tab,
    Shift,
    Control,
    Alt,
    Meta,
}

impl Key {
    /// Parse a key name as used in key combos (`space`, `del`, `a`, `up`).
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        let key = match lower.as_str() {
            "space" | " " => Key::Space,
            "up" | "arrowup" => Key::Up,
            "down" | "arrowdown" => Key::Down,
            "left" | "arrowleft" => Key::Left,
            "right" | "arrowright" => Key::Right,
            "del" | "delete" => Key::Delete,
            "backspace" => Key::Backspace,
            "esc" | "escape" => Key::Escape,
            "enter" | "return" => Key::Enter,
            "tab" => Key::Tab,
            "shift" => Key::Shift,
            "ctrl" | "control" => Key::Control,
            "alt" | "option" => Key::Alt,
            "meta" | "cmd" | "command" => Key::Meta,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return None,
                }
            }
        };
        Some(key)
    }

    pub fn is_modifier(&self) -> bool {
        matches!(self, Key::Shift | Key::Control | Key::Alt | Key::Meta)
    }
}

/// Modifier key state, part of every key combo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
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
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
        alt: false,
        meta: false,
    };

    /// Shift or ctrl: add to the selection instead of replacing it.
    pub fn is_union_select(&self) -> bool {
        self.shift || self.ctrl
    }
}

/// Held keys, buttons and the last reported pointer position.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Key>,
    buttons: HashSet<PointerButton>,
    /// Pointer position as reported by the host, before any offset.
    pub pointer: Point,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &InputEvent) {
        match event {
            InputEvent::PointerDown { x, y, button } => {
                self.pointer = Point::new(*x, *y);
                self.buttons.insert(*button);
            }
            InputEvent::PointerMove { x, y } => self.pointer = Point::new(*x, *y),
            InputEvent::PointerUp { x, y, button } => {
                self.pointer = Point::new(*x, *y);
                self.buttons.remove(button);
            }
            InputEvent::KeyDown { key } => {
                self.held.insert(*key);
            }
            InputEvent::KeyUp { key } => {
                self.held.remove(key);
            }
        }
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_button_down(&self, button: PointerButton) -> bool {
        self.buttons.contains(&button)
    }

    pub fn modifiers(&self) -> Modifiers {
        Modifiers {
            shift: self.is_pressed(Key::Shift),
            ctrl: self.is_pressed(Key::Control),
            alt: self.is_pressed(Key::Alt),
            meta: self.is_pressed(Key::Meta),
        }
    }

    /// Keyboard contribution to the transform delta:
    /// `up + right - down - left`, each 0 or 1.
    pub fn key_axis(&self) -> f64 {
        let k = |key| if self.is_pressed(key) { 1.0 } else { 0.0 };
        k(Key::Up) + k(Key::Right) - k(Key::Down) - k(Key::Left)
    }

    /// Release everything. Used on destroy and when focus is lost.
    pub fn reset(&mut self) {
        self.held.clear();
        self.buttons.clear();
    }
}

/// Which axes a scale gesture affects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScaleAxis {
    #[default]
    Both,
    X,
    Y,
}

/// Per-tick transform modes, derived from `InputState`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeFlags {
    /// shift + r held.
    pub rotating: bool,
    /// shift + s held (and not rotating).
    pub scaling: bool,
    /// d restricts scaling to X, f to Y.
    pub scale_axis: ScaleAxis,
    /// Secondary pointer button held.
    pub translating: bool,
}

impl ModeFlags {
    pub fn from_input(input: &InputState) -> Self {
        let shift = input.is_pressed(Key::Shift);
        let rotating = shift && input.is_pressed(Key::Char('r'));
        let scaling = !rotating && shift && input.is_pressed(Key::Char('s'));
        let scale_axis = if input.is_pressed(Key::Char('d')) {
            ScaleAxis::X
        } else if input.is_pressed(Key::Char('f')) {
            ScaleAxis::Y
        } else {
            ScaleAxis::Both
        };
        Self {
            rotating,
            scaling,
            scale_axis,
            translating: input.is_button_down(PointerButton::Secondary),
        }
    }

    pub fn any(&self) -> bool {
        self.rotating || self.scaling || self.translating
    }
}
