//! Tree drag-and-drop applied to the world.

use crate::error::InspectorError;
use crate::tree::TreeWidget;
use si_core::{NodeKey, SceneError, World};

/// Apply a tree move of `node` under `new_parent` to the world.
///
/// The tree must already show the node in its new place; each node carries
/// the owner recorded at the last rebuild, so comparing the node's owner
/// with the new category node's owner says whether the object changed
/// composite. Returns `true` if the world was changed.
pub fn apply_tree_move(
    world: &mut World,
    tree: &dyn TreeWidget,
    node: NodeKey,
    new_parent: NodeKey,
) -> Result<bool, InspectorError> {
    let (Some(moved), Some(target)) = (tree.node(node), tree.node(new_parent)) else {
        log::debug!("tree move: unknown node {node} or {new_parent}");
        return Ok(false);
    };
    let Some(object) = node.object() else {
        return Ok(false);
    };
    if moved.owner == target.owner {
        return Ok(false);
    }
    if !world.is_live(object) {
        return Err(SceneError::UnknownObject(object).into());
    }
    world.move_object(object, moved.owner, target.owner)?;
    log::info!(
        "moved {object} from composite_{} to composite_{}",
        moved.owner,
        target.owner
    );
    Ok(true)
}
