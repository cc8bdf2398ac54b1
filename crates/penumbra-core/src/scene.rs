use glam::{Mat4, Quat, Vec3};

use crate::error::PenumbraError;
use crate::shape::Shape;

/// Newtype for scene node identifiers. Indexes into the owning graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Local transform of a node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Read-only query interface over a spatial hierarchy that carries shapes.
///
/// Queried once per frame by the flattener. Implementations own node
/// identity and lifetime; callers never hold a `NodeId` past the frame.
/// A node with no `Shape` is a plain grouping object.
pub trait PrimitiveRegistry {
    /// Every node carrying a shape, in discovery order.
    fn primitives(&self) -> Vec<NodeId>;

    /// Parent node, or `None` for a root of the hierarchy.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Direct children in sibling order, shape-bearing or not.
    fn children(&self, node: NodeId) -> &[NodeId];

    fn shape(&self, node: NodeId) -> Option<&Shape>;

    fn world_position(&self, node: NodeId) -> Vec3;

    fn local_scale(&self, node: NodeId) -> Vec3;
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    transform: Transform,
    shape: Option<Shape>,
}

/// Arena-backed scene hierarchy. Nodes are never removed, so ids stay valid
/// for the lifetime of the graph.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a root node.
    pub fn spawn(&mut self, name: impl Into<String>, transform: Transform) -> NodeId {
        self.push_node(name.into(), None, transform)
    }

    /// Add a node under `parent`, appended after its existing siblings.
    pub fn spawn_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
    ) -> Result<NodeId, PenumbraError> {
        self.node(parent)?;
        let id = self.push_node(name.into(), Some(parent), transform);
        self.nodes[parent.0 as usize].children.push(id);
        Ok(id)
    }

    /// Convenience for a root node that carries a shape.
    pub fn spawn_shape(&mut self, name: impl Into<String>, transform: Transform, shape: Shape) -> NodeId {
        let id = self.spawn(name, transform);
        self.nodes[id.0 as usize].shape = Some(shape);
        id
    }

    /// Convenience for a child node that carries a shape.
    pub fn spawn_child_shape(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
        shape: Shape,
    ) -> Result<NodeId, PenumbraError> {
        let id = self.spawn_child(parent, name, transform)?;
        self.nodes[id.0 as usize].shape = Some(shape);
        Ok(id)
    }

    /// Attach or replace the shape component. Returns the previous one.
    pub fn insert_shape(&mut self, node: NodeId, shape: Shape) -> Result<Option<Shape>, PenumbraError> {
        Ok(self.node_mut(node)?.shape.replace(shape))
    }

    pub fn remove_shape(&mut self, node: NodeId) -> Result<Option<Shape>, PenumbraError> {
        Ok(self.node_mut(node)?.shape.take())
    }

    pub fn transform(&self, node: NodeId) -> Result<&Transform, PenumbraError> {
        Ok(&self.node(node)?.transform)
    }

    pub fn set_transform(&mut self, node: NodeId, transform: Transform) -> Result<(), PenumbraError> {
        self.node_mut(node)?.transform = transform;
        Ok(())
    }

    pub fn name(&self, node: NodeId) -> Result<&str, PenumbraError> {
        Ok(&self.node(node)?.name)
    }

    /// Find the first node with the given name, in creation order.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .map(|i| NodeId(i as u32))
    }

    /// Compose local transforms from the root down to `node`.
    pub fn world_matrix(&self, node: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(n) = self.nodes.get(id.0 as usize) else {
                break;
            };
            matrix = n.transform.to_matrix() * matrix;
            current = n.parent;
        }
        matrix
    }

    // -- Private helpers --

    fn push_node(&mut self, name: String, parent: Option<NodeId>, transform: Transform) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            name,
            parent,
            children: Vec::new(),
            transform,
            shape: None,
        });
        id
    }

    fn node(&self, id: NodeId) -> Result<&Node, PenumbraError> {
        self.nodes
            .get(id.0 as usize)
            .ok_or(PenumbraError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, PenumbraError> {
        self.nodes
            .get_mut(id.0 as usize)
            .ok_or(PenumbraError::UnknownNode(id))
    }
}

impl PrimitiveRegistry for SceneGraph {
    fn primitives(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.shape.is_some())
            .map(|(i, _)| NodeId(i as u32))
            .collect()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0 as usize).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0 as usize)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    fn shape(&self, node: NodeId) -> Option<&Shape> {
        self.nodes.get(node.0 as usize).and_then(|n| n.shape.as_ref())
    }

    fn world_position(&self, node: NodeId) -> Vec3 {
        self.world_matrix(node).transform_point3(Vec3::ZERO)
    }

    fn local_scale(&self, node: NodeId) -> Vec3 {
        self.nodes
            .get(node.0 as usize)
            .map(|n| n.transform.scale)
            .unwrap_or(Vec3::ONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Operation, ShapeKind};

    #[test]
    fn test_spawn_child_links_both_ways() {
        let mut graph = SceneGraph::new();
        let root = graph.spawn("root", Transform::default());
        let a = graph.spawn_child(root, "a", Transform::default()).expect("root exists");
        let b = graph.spawn_child(root, "b", Transform::default()).expect("root exists");

        assert_eq!(graph.parent(a), Some(root));
        assert_eq!(graph.parent(root), None);
        assert_eq!(graph.children(root), &[a, b]);
        assert!(graph.children(a).is_empty());
    }

    #[test]
    fn test_spawn_child_unknown_parent() {
        let mut graph = SceneGraph::new();
        let err = graph
            .spawn_child(NodeId(7), "orphan", Transform::default())
            .unwrap_err();
        assert_eq!(err, PenumbraError::UnknownNode(NodeId(7)));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_primitives_only_lists_shape_nodes() {
        let mut graph = SceneGraph::new();
        let group = graph.spawn("group", Transform::default());
        let sphere = graph
            .spawn_child_shape(
                group,
                "sphere",
                Transform::default(),
                Shape::new(ShapeKind::Sphere, Operation::None),
            )
            .expect("group exists");
        let cube = graph.spawn_shape(
            "cube",
            Transform::default(),
            Shape::new(ShapeKind::Cube, Operation::Cut),
        );

        assert_eq!(graph.primitives(), vec![sphere, cube]);
        assert!(graph.shape(group).is_none());
    }

    #[test]
    fn test_world_position_composes_parents() {
        let mut graph = SceneGraph::new();
        let root = graph.spawn(
            "root",
            Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)).with_scale(Vec3::splat(2.0)),
        );
        let child = graph
            .spawn_child(root, "child", Transform::from_translation(Vec3::new(0.0, 1.0, 0.0)))
            .expect("root exists");

        let pos = graph.world_position(child);
        assert!((pos - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5, "got {pos}");
    }

    #[test]
    fn test_insert_and_remove_shape() {
        let mut graph = SceneGraph::new();
        let node = graph.spawn("node", Transform::default());
        let previous = graph
            .insert_shape(node, Shape::new(ShapeKind::Torus, Operation::Mask))
            .expect("node exists");
        assert!(previous.is_none());
        assert_eq!(graph.primitives(), vec![node]);

        let removed = graph.remove_shape(node).expect("node exists");
        assert_eq!(removed.map(|s| s.kind), Some(ShapeKind::Torus));
        assert!(graph.primitives().is_empty());
    }

    #[test]
    fn test_set_transform_moves_children() {
        let mut graph = SceneGraph::new();
        let root = graph.spawn("root", Transform::default());
        let child = graph
            .spawn_child(root, "child", Transform::from_translation(Vec3::X))
            .expect("root exists");

        let turned = Transform::default().with_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        graph.set_transform(root, turned).expect("root exists");
        assert_eq!(graph.transform(root), Ok(&turned));
        let pos = graph.world_position(child);
        assert!((pos - Vec3::Y).length() < 1e-5, "got {pos}");

        graph.set_transform(root, Transform::default()).expect("root exists");
        let pos = graph.world_position(child);
        assert!((pos - Vec3::X).length() < 1e-5, "got {pos}");

        assert_eq!(
            graph.set_transform(NodeId(9), Transform::default()),
            Err(PenumbraError::UnknownNode(NodeId(9)))
        );
    }

    #[test]
    fn test_find_by_name() {
        let mut graph = SceneGraph::new();
        graph.spawn("a", Transform::default());
        let b = graph.spawn("b", Transform::default());
        assert_eq!(graph.find("b"), Some(b));
        assert_eq!(graph.find("missing"), None);
        assert_eq!(graph.name(b), Ok("b"));
    }
}
