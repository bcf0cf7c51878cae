//! Keyboard shortcut mapping.
//!
//! Key combos are written as text (`"shift+space"`, `"ctrl+c"`, `"del"`)
//! and parsed with `winnow`. A `KeyBinder` maps combos to semantic
//! `ShortcutAction`s; the inspector registers its defaults on create and
//! unregisters exactly those on destroy.

use crate::input::{Key, Modifiers};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use winnow::combinator::separated;
use winnow::prelude::*;
use winnow::token::take_while;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutAction {
    // ── Simulation ──
    TogglePause,

    // ── Clipboard / files ──
    Export,
    Import,
    Copy,
    Paste,

    // ── Edit ──
    Delete,
    /// Make selected bodies static (irreversible).
    SetStatic,

    // ── UI ──
    ShowHelp,
    ToggleAutoHide,
    ToggleAutoRewind,
}

/// A modifier set plus one non-modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub modifiers: Modifiers,
    pub key: Key,
}

impl KeyCombo {
    pub fn new(modifiers: Modifiers, key: Key) -> Self {
        Self { modifiers, key }
    }

    /// Parse `"shift+space"` style text. Modifier names may repeat or come
    /// in any order; the last segment is the key.
    pub fn parse(text: &str) -> Result<Self, String> {
        let segments: Vec<&str> = separated(1.., parse_segment, '+')
            .parse(text.trim())
            .map_err(|e| format!("Key combo parse error in {text:?}: {e}"))?;

        let (last, mods) = segments
            .split_last()
            .ok_or_else(|| format!("Empty key combo: {text:?}"))?;
        let key = Key::from_name(last).ok_or_else(|| format!("Unknown key: {last:?}"))?;
        if key.is_modifier() {
            return Err(format!("Key combo {text:?} has no key"));
        }

        let mut modifiers = Modifiers::NONE;
        for name in mods {
            match Key::from_name(name) {
                Some(Key::Shift) => modifiers.shift = true,
                Some(Key::Control) => modifiers.ctrl = true,
                Some(Key::Alt) => modifiers.alt = true,
                Some(Key::Meta) => modifiers.meta = true,
                _ => return Err(format!("Unknown modifier: {name:?}")),
            }
        }
        Ok(Self { modifiers, key })
    }
}

fn parse_segment<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c != '+' && !c.is_whitespace()).parse_next(input)
}

impl FromStr for KeyCombo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.modifiers;
        for (on, name) in [
            (m.ctrl, "ctrl"),
            (m.alt, "alt"),
            (m.meta, "meta"),
            (m.shift, "shift"),
        ] {
            if on {
                write!(f, "{name}+")?;
            }
        }
        match self.key {
            Key::Char(c) => write!(f, "{c}"),
            Key::Space => f.write_str("space"),
            Key::Delete => f.write_str("del"),
            other => write!(f, "{}", format!("{other:?}").to_lowercase()),
        }
    }
}

/// The key-binding capability.
pub trait KeyBinder {
    fn bind(&mut self, combo: KeyCombo, action: ShortcutAction);
    fn unbind(&mut self, combo: &KeyCombo);
    fn resolve(&self, combo: &KeyCombo) -> Option<ShortcutAction>;
}

/// In-process key map.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: HashMap<KeyCombo, ShortcutAction>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl KeyBinder for Keymap {
    fn bind(&mut self, combo: KeyCombo, action: ShortcutAction) {
        if let Some(prev) = self.bindings.insert(combo, action)
            && prev != action
        {
            log::warn!("key combo {combo} rebound from {prev:?} to {action:?}");
        }
    }

    fn unbind(&mut self, combo: &KeyCombo) {
        self.bindings.remove(combo);
    }

    fn resolve(&self, combo: &KeyCombo) -> Option<ShortcutAction> {
        self.bindings.get(combo).copied()
    }
}

/// Bindings registered regardless of configuration.
pub const DEFAULT_BINDINGS: &[(&str, ShortcutAction)] = &[
    ("shift+space", ShortcutAction::TogglePause),
    ("shift+j", ShortcutAction::ShowHelp),
    ("shift+y", ShortcutAction::ToggleAutoHide),
    ("shift+e", ShortcutAction::ToggleAutoRewind),
    ("shift+q", ShortcutAction::SetStatic),
    ("del", ShortcutAction::Delete),
    ("backspace", ShortcutAction::Delete),
];

/// Bindings registered only when a serializer is configured.
pub const SERIALIZER_BINDINGS: &[(&str, ShortcutAction)] = &[
    ("shift+o", ShortcutAction::Export),
    ("shift+i", ShortcutAction::Import),
    ("ctrl+c", ShortcutAction::Copy),
    ("ctrl+v", ShortcutAction::Paste),
];

/// Parse a binding table. Entries that fail to parse are logged and skipped.
pub fn parse_bindings(table: &[(&str, ShortcutAction)]) -> Vec<(KeyCombo, ShortcutAction)> {
    table
        .iter()
        .filter_map(|(text, action)| match KeyCombo::parse(text) {
            Ok(combo) => Some((combo, *action)),
            Err(e) => {
                log::warn!("{e}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_shift_space() {
        let combo = KeyCombo::parse("shift+space").unwrap();
        assert_eq!(combo, KeyCombo::new(Modifiers::SHIFT, Key::Space));
        assert_eq!(combo.to_string(), "shift+space");
    }

    #[test]
    fn parse_plain_and_ctrl() {
        assert_eq!(
            KeyCombo::parse("del").unwrap(),
            KeyCombo::new(Modifiers::NONE, Key::Delete)
        );
        assert_eq!(
            "ctrl+c".parse::<KeyCombo>().unwrap(),
            KeyCombo::new(Modifiers::CTRL, Key::Char('c'))
        );
    }

    #[test]
    fn parse_errors() {
        assert!(KeyCombo::parse("").is_err());
        assert!(KeyCombo::parse("shift+").is_err());
        assert!(KeyCombo::parse("shift").is_err());
        assert!(KeyCombo::parse("hyper+a").is_err());
        assert!(KeyCombo::parse("shift+pagedown").is_err());
    }

    #[test]
    fn default_tables_parse_without_conflicts() {
        let mut map = Keymap::new();
        for (combo, action) in parse_bindings(DEFAULT_BINDINGS)
            .into_iter()
            .chain(parse_bindings(SERIALIZER_BINDINGS))
        {
            assert_eq!(map.resolve(&combo), None, "{combo} bound twice");
            map.bind(combo, action);
        }
        assert_eq!(map.len(), DEFAULT_BINDINGS.len() + SERIALIZER_BINDINGS.len());
    }

    #[test]
    fn rotate_and_scale_keys_stay_free() {
        let defaults = parse_bindings(DEFAULT_BINDINGS);
        for key in ['r', 's'] {
            let combo = KeyCombo::new(Modifiers::SHIFT, Key::Char(key));
            assert!(defaults.iter().all(|(c, _)| *c != combo));
        }
    }

    #[test]
    fn unbind_removes() {
        let mut map = Keymap::new();
        let combo = KeyCombo::parse("shift+j").unwrap();
        map.bind(combo, ShortcutAction::ShowHelp);
        assert_eq!(map.resolve(&combo), Some(ShortcutAction::ShowHelp));
        map.unbind(&combo);
        assert!(map.is_empty());
    }
}
