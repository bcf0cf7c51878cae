//! The serializer capability: structural clones, text interchange and named
//! state snapshots.
//!
//! The inspector only ever talks to `dyn SceneSerializer`; `JsonSerializer`
//! is the stock implementation.

use crate::error::SceneError;
use crate::model::{Body, CompositeData};
use crate::world::{Engine, World};
use std::collections::HashMap;

pub trait SceneSerializer {
    /// A structural copy of `body` carrying a fresh id from `world`.
    fn clone_body(&self, world: &mut World, body: &Body) -> Body;

    /// Serialize a detached group. `indent` of 0 means compact output.
    fn serialize(&self, group: &CompositeData, indent: usize) -> Result<String, SceneError>;

    /// Parse a group from text. `None` when the text is not a group.
    fn parse(&self, text: &str) -> Option<CompositeData>;

    /// Renumber `group` so none of its ids collide with live objects.
    fn rebase(&self, world: &mut World, group: &mut CompositeData) {
        world.rebase(group);
    }

    fn save_state(&mut self, engine: &Engine, key: &str) -> Result<(), SceneError>;

    /// Restore the snapshot stored under `key`. Returns `false` when there
    /// is none.
    fn load_state(&mut self, engine: &mut Engine, key: &str) -> Result<bool, SceneError>;

    fn remove_state(&mut self, key: &str);
}

/// JSON interchange plus in-memory MessagePack snapshots.
#[derive(Debug, Default)]
pub struct JsonSerializer {
    states: HashMap<String, Vec<u8>>,
}

impl JsonSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_state(&self, key: &str) -> bool {
        self.states.contains_key(key)
    }
}

impl SceneSerializer for JsonSerializer {
    fn clone_body(&self, world: &mut World, body: &Body) -> Body {
        let mut clone = body.clone();
        clone.id = world.next_id();
        clone
    }

    fn serialize(&self, group: &CompositeData, indent: usize) -> Result<String, SceneError> {
        if indent == 0 {
            return serde_json::to_string(group).map_err(|e| SceneError::Serialize(e.to_string()));
        }
        let pad = " ".repeat(indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(pad.as_bytes());
        let mut out = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        serde::Serialize::serialize(group, &mut ser)
            .map_err(|e| SceneError::Serialize(e.to_string()))?;
        String::from_utf8(out).map_err(|e| SceneError::Serialize(e.to_string()))
    }

    fn parse(&self, text: &str) -> Option<CompositeData> {
        match serde_json::from_str(text) {
            Ok(group) => Some(group),
            Err(e) => {
                log::debug!("parse failed: {e}");
                None
            }
        }
    }

    fn save_state(&mut self, engine: &Engine, key: &str) -> Result<(), SceneError> {
        let root = engine.world.root();
        let snapshot = engine
            .world
            .extract(root)
            .ok_or(SceneError::UnknownComposite(root))?;
        let bytes =
            rmp_serde::to_vec_named(&snapshot).map_err(|e| SceneError::Serialize(e.to_string()))?;
        log::debug!("saved state {key:?} ({} bytes)", bytes.len());
        self.states.insert(key.to_string(), bytes);
        Ok(())
    }

    fn load_state(&mut self, engine: &mut Engine, key: &str) -> Result<bool, SceneError> {
        let Some(bytes) = self.states.get(key) else {
            return Ok(false);
        };
        let snapshot: CompositeData =
            rmp_serde::from_slice(bytes).map_err(|e| SceneError::Serialize(e.to_string()))?;
        let root = engine.world.root();
        engine.world.replace_contents(root, snapshot)?;
        log::debug!("loaded state {key:?}");
        Ok(true)
    }

    fn remove_state(&mut self, key: &str) {
        self.states.remove(key);
    }
}
