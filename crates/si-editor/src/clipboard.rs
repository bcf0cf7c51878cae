//! Copy, paste, export and import.
//!
//! The clipboard holds body ids, not clones: pasting clones whatever the
//! bodies look like at paste time. Export builds a detached group of the
//! selection and hands the serialized text to the downloader; import parses
//! a group, renumbers it and puts it at the top of the tool root.

use crate::error::InspectorError;
use crate::selection::SelectionModel;
use kurbo::Vec2;
use si_core::{CompositeData, ObjectId, ObjectKind, SceneSerializer, World};

/// Offset applied to every pasted clone.
pub const PASTE_OFFSET: Vec2 = Vec2::new(50.0, 50.0);
pub const EXPORT_LABEL: &str = "Exported Objects";
pub const IMPORT_LABEL: &str = "Imported Objects";
pub const DEFAULT_EXPORT_NAME: &str = "export-objects";
pub const EXPORT_MIME: &str = "application/json";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clipboard {
    bodies: Vec<u32>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bodies(&self) -> &[u32] {
        &self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Replace the clipboard with the selected bodies. Other kinds are
    /// ignored. Returns how many were copied.
    pub fn copy(&mut self, selection: &SelectionModel) -> usize {
        self.bodies = selection
            .entries()
            .iter()
            .filter(|e| e.object.kind == ObjectKind::Body)
            .map(|e| e.object.id)
            .collect();
        log::debug!("copied {} bodies", self.bodies.len());
        self.bodies.len()
    }

    /// Forget bodies that no longer exist.
    pub fn purge(&mut self, world: &World) {
        self.bodies.retain(|id| world.body(*id).is_some());
    }

    /// Clone every clipboard body, offset it by `PASTE_OFFSET` and add it
    /// to the composite its source belongs to.
    ///
    /// `owner_of` resolves that composite; sources that are gone or whose
    /// composite cannot be found are skipped. Returns the new clones.
    pub fn paste(
        &self,
        world: &mut World,
        serializer: &dyn SceneSerializer,
        owner_of: impl Fn(&World, ObjectId) -> Option<u32>,
    ) -> Result<Vec<ObjectId>, InspectorError> {
        let mut clones = Vec::new();
        for id in &self.bodies {
            let Some(source) = world.body(*id).cloned() else {
                log::debug!("paste: body_{id} no longer exists");
                continue;
            };
            let Some(parent) = owner_of(world, source.object_id())
                .filter(|p| world.composite(*p).is_some())
            else {
                log::warn!("paste: no composite found for body_{id}");
                continue;
            };
            let mut clone = serializer.clone_body(world, &source);
            clone.translate(PASTE_OFFSET);
            clones.push(world.add_body(parent, clone)?);
        }
        log::debug!("pasted {} bodies", clones.len());
        Ok(clones)
    }
}

/// Build the export group for `objects`.
///
/// Parents are added before children (shallowest first); an object already
/// inside the group through an exported ancestor is skipped. Objects whose
/// owner is not exported end up directly in the group.
pub fn build_export(world: &World, objects: &[ObjectId]) -> CompositeData {
    let mut ordered: Vec<ObjectId> = objects
        .iter()
        .copied()
        .filter(|o| world.is_live(*o))
        .collect();
    ordered.sort_by_key(|o| world.depth(*o));

    let mut group = CompositeData::new(0, EXPORT_LABEL);
    for object in ordered {
        if contains_exported(&group, object) {
            continue;
        }
        match object.kind {
            ObjectKind::Body => group.bodies.extend(world.body(object.id).cloned()),
            ObjectKind::Constraint => group
                .constraints
                .extend(world.constraint(object.id).cloned()),
            ObjectKind::Composite => group.composites.extend(world.extract(object.id)),
        }
    }
    group
}

/// Membership test that ignores the export group's own placeholder id.
fn contains_exported(group: &CompositeData, object: ObjectId) -> bool {
    group.bodies.iter().any(|b| b.object_id() == object)
        || group.constraints.iter().any(|c| c.object_id() == object)
        || group.composites.iter().any(|c| c.contains(object))
}

/// `export-<label>-<id>.json` for a single object, `export-objects.json`
/// otherwise, reduced to `[a-z0-9_-]`.
pub fn export_filename(world: &World, objects: &[ObjectId]) -> String {
    let stem = match objects {
        [only] => format!(
            "export-{}-{}",
            world.label(*only).unwrap_or_default(),
            only.id
        ),
        _ => DEFAULT_EXPORT_NAME.to_string(),
    };
    format!("{}.json", sanitize_filename(&stem))
}

pub fn sanitize_filename(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Only `.json` and `.txt` files are accepted for import.
pub fn is_supported_file(name: &str) -> bool {
    name.ends_with(".json") || name.ends_with(".txt")
}

/// Parse `text`, relabel and renumber the group, and insert it as the
/// first child of `tool_root`. Returns the new group's id.
pub fn import_group(
    world: &mut World,
    serializer: &dyn SceneSerializer,
    tool_root: u32,
    name: &str,
    text: &str,
) -> Result<u32, InspectorError> {
    let mut group = serializer
        .parse(text)
        .ok_or_else(|| InspectorError::ParseFailed(name.to_string()))?;
    group.label = IMPORT_LABEL.to_string();
    serializer.rebase(world, &mut group);
    let id = world.insert_fragment(tool_root, group, true)?;
    log::debug!("imported {name} as composite_{id}");
    Ok(id)
}
