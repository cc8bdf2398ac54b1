//! Scene flattening: hierarchy in, CSG-ordered shape list out.
//!
//! Grouping is one level deep. A top-level shape is followed by the shapes
//! on its direct children; shapes nested two or more levels below a root are
//! never emitted. The kernel only understands `child_count` records directly
//! following their parent.

use glam::Vec3;

use crate::scene::{NodeId, PrimitiveRegistry};
use crate::shape::{Operation, ShapeKind};

/// One shape captured from the registry for this frame, in emission order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatShape {
    pub node: NodeId,
    pub kind: ShapeKind,
    pub operation: Operation,
    pub position: Vec3,
    pub scale: Vec3,
    pub colour: Vec3,
    pub blend_strength: f32,
    /// Direct child count of the node for top-level shapes, 0 for children.
    pub child_count: u32,
}

/// Flatten every shape in `registry` into kernel order.
///
/// 1. Shapes are sorted by operation ordinal. The sort is stable, so shapes
///    sharing an operation keep registry discovery order.
/// 2. Each shape whose node has no parent is emitted, with `child_count`
///    set to the number of direct children of its node (all children,
///    shape-bearing or not).
/// 3. Directly after it, every shape-bearing direct child is emitted in
///    sibling order with `child_count = 0`. Child operations play no part
///    in ordering.
///
/// Non-root shapes met in step 2 are skipped. An empty registry yields an
/// empty list.
pub fn flatten_scene<R: PrimitiveRegistry + ?Sized>(registry: &R) -> Vec<FlatShape> {
    let mut all_shapes: Vec<(NodeId, Operation)> = registry
        .primitives()
        .into_iter()
        .filter_map(|node| registry.shape(node).map(|s| (node, s.operation)))
        .collect();
    all_shapes.sort_by_key(|&(_, operation)| operation);

    let mut ordered = Vec::with_capacity(all_shapes.len());
    for &(node, _) in &all_shapes {
        if registry.parent(node).is_some() {
            continue;
        }

        let children = registry.children(node);
        if let Some(top) = capture(registry, node, children.len() as u32) {
            ordered.push(top);
        }
        for &child in children {
            if let Some(shape) = capture(registry, child, 0) {
                ordered.push(shape);
            }
        }
    }
    ordered
}

/// Local scale times the local scale of the direct parent, if that parent
/// carries a shape. Composes exactly one level.
pub fn shape_scale<R: PrimitiveRegistry + ?Sized>(registry: &R, node: NodeId) -> Vec3 {
    let parent_scale = registry
        .parent(node)
        .filter(|&parent| registry.shape(parent).is_some())
        .map(|parent| registry.local_scale(parent))
        .unwrap_or(Vec3::ONE);
    registry.local_scale(node) * parent_scale
}

fn capture<R: PrimitiveRegistry + ?Sized>(
    registry: &R,
    node: NodeId,
    child_count: u32,
) -> Option<FlatShape> {
    let shape = registry.shape(node)?;
    Some(FlatShape {
        node,
        kind: shape.kind,
        operation: shape.operation,
        position: registry.world_position(node),
        scale: shape_scale(registry, node),
        colour: Vec3::from_array(shape.colour),
        blend_strength: shape.blend_strength,
        child_count,
    })
}
