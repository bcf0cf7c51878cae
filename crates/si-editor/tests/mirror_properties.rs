//! Property tests: mirror and selection consistency under random edits.

use proptest::prelude::*;
use si_core::{Body, Constraint, ObjectId, ObjectKind, Point, World};
use si_editor::{SceneGraphMirror, SelectionModel, TreeState, TreeWidget};
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Op {
    AddBody(usize),
    AddConstraint(usize, usize),
    AddComposite(usize),
    Remove(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<usize>().prop_map(Op::AddBody),
        2 => (any::<usize>(), any::<usize>()).prop_map(|(c, b)| Op::AddConstraint(c, b)),
        1 => any::<usize>().prop_map(Op::AddComposite),
        2 => any::<usize>().prop_map(Op::Remove),
    ]
}

/// A world wrapped in a tool root, as the inspector sets it up.
fn wrapped_world() -> (World, u32) {
    let mut world = World::new();
    let root = world.root();
    let tool_root = world.create_composite("Root");
    world.add_composite(tool_root, root, false).unwrap();
    (world, tool_root)
}

fn composites(world: &World) -> Vec<u32> {
    let root = world.root();
    let mut all = vec![root];
    all.extend(world.all_composites(root));
    all
}

fn apply(world: &mut World, tool_root: u32, op: &Op) {
    let targets = composites(world);
    match *op {
        Op::AddBody(c) => {
            let parent = targets[c % targets.len()];
            let id = world.next_id();
            let at = Point::new((id % 17) as f64 * 30.0, (id % 11) as f64 * 30.0);
            world
                .add_body(parent, Body::rectangle(id, at, 10.0, 10.0))
                .unwrap();
        }
        Op::AddConstraint(c, b) => {
            let parent = targets[c % targets.len()];
            let bodies = world.all_bodies(world.root());
            let id = world.next_id();
            let mut constraint = Constraint::new(id);
            if !bodies.is_empty() {
                constraint.body_a = Some(bodies[b % bodies.len()]);
            }
            world.add_constraint(parent, constraint).unwrap();
        }
        Op::AddComposite(c) => {
            let parent = targets[c % targets.len()];
            let child = world.create_composite("Composite");
            world.add_composite(parent, child, false).unwrap();
        }
        Op::Remove(i) => {
            let protected = [
                ObjectId::composite(world.root()),
                ObjectId::composite(tool_root),
            ];
            let mut live: Vec<ObjectId> = world
                .object_ids()
                .filter(|o| !protected.contains(o))
                .collect();
            live.sort();
            if !live.is_empty() {
                world.remove(live[i % live.len()]).unwrap();
            }
        }
    }
}

proptest! {
    #[test]
    fn mirror_leaves_match_live_bodies_and_constraints(ops in prop::collection::vec(op(), 0..40)) {
        let (mut world, tool_root) = wrapped_world();
        let mut mirror = SceneGraphMirror::new(true);
        let mut tree = TreeState::new();

        for op in &ops {
            apply(&mut world, tool_root, op);
            mirror.sync(&mut world, tool_root, &mut tree);
            prop_assert_eq!(
                mirror.leaf_count(),
                world.body_count() + world.constraint_count()
            );
        }
    }

    #[test]
    fn mirror_node_ids_are_unique(ops in prop::collection::vec(op(), 0..40)) {
        let (mut world, tool_root) = wrapped_world();
        for op in &ops {
            apply(&mut world, tool_root, op);
        }
        let mut mirror = SceneGraphMirror::new(false);
        let mut tree = TreeState::new();
        mirror.rebuild(&world, tool_root, &mut tree);

        let mut seen = HashSet::new();
        for root in mirror.forest() {
            root.visit(&mut |node| {
                assert!(seen.insert(node.key), "duplicate node {}", node.key);
            });
        }
        for object in world.object_ids() {
            if object != ObjectId::composite(tool_root) {
                prop_assert!(seen.contains(&object.key()));
            }
        }
    }

    #[test]
    fn replace_reads_back_exactly(
        count in 1usize..12,
        order in Just((0..12usize).collect::<Vec<_>>()).prop_shuffle(),
        take in 0usize..12,
    ) {
        let (mut world, tool_root) = wrapped_world();
        let root = world.root();
        let mut bodies = Vec::new();
        for i in 0..count {
            let id = world.next_id();
            let at = Point::new(i as f64 * 40.0, 0.0);
            bodies.push(world.add_body(root, Body::circle(id, at, 5.0)).unwrap());
        }
        let mut mirror = SceneGraphMirror::new(true);
        let mut tree = TreeState::new();
        mirror.rebuild(&world, tool_root, &mut tree);

        let picked: Vec<ObjectId> = order
            .iter()
            .filter(|i| **i < count)
            .take(take)
            .map(|i| bodies[*i])
            .collect();

        let mut selection = SelectionModel::new();
        selection.replace(&bodies, &world, &mut tree);
        selection.replace(&picked, &world, &mut tree);

        prop_assert_eq!(selection.objects(), picked.clone());
        let selected: HashSet<_> = tree.selected().into_iter().collect();
        let expected: HashSet<_> = picked.iter().map(|o| o.key()).collect();
        prop_assert_eq!(selected, expected);
        prop_assert!(selection.objects().iter().all(|o| o.kind == ObjectKind::Body));
    }
}
