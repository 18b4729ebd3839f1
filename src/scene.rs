// Scene graph for the game

use glam::Mat4;

use crate::math::Transform;
use crate::mesh::{self, MeshData};

/// Geometry kinds the renderer keeps GPU buffers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Quad,
    Sphere,
    Eyeball,
}

impl MeshKind {
    pub const ALL: [MeshKind; 3] = [MeshKind::Quad, MeshKind::Sphere, MeshKind::Eyeball];

    /// Build the vertex data for this kind.
    pub fn vertex_data(self) -> MeshData {
        match self {
            MeshKind::Quad => mesh::quad([1.0, 1.0, 1.0]),
            MeshKind::Sphere => mesh::uv_sphere(12, 16, [1.0, 1.0, 1.0], [1.0, 1.0, 1.0], 0.0),
            MeshKind::Eyeball => mesh::uv_sphere(24, 32, [1.0, 1.0, 1.0], [0.05, 0.05, 0.05], 0.35),
        }
    }
}

/// Payload carried by a scene node.
///
/// The set of things we draw is small and fixed, so it is a closed enum
/// rather than a trait object. `None` marks grouping nodes such as the root.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Drawable {
    #[default]
    None,
    Quad { color: [f32; 4] },
    Sphere { color: [f32; 4] },
    Eyeball { color: [f32; 4] },
}

impl Drawable {
    pub fn mesh_kind(&self) -> Option<MeshKind> {
        match self {
            Drawable::None => None,
            Drawable::Quad { .. } => Some(MeshKind::Quad),
            Drawable::Sphere { .. } => Some(MeshKind::Sphere),
            Drawable::Eyeball { .. } => Some(MeshKind::Eyeball),
        }
    }

    pub fn vertex_data(&self) -> Option<MeshData> {
        self.mesh_kind().map(MeshKind::vertex_data)
    }

    /// Colour multiplied into the mesh's vertex colours.
    pub fn tint(&self) -> [f32; 4] {
        match *self {
            Drawable::None => [1.0; 4],
            Drawable::Quad { color } | Drawable::Sphere { color } | Drawable::Eyeball { color } => color,
        }
    }

    pub fn is_drawable(&self) -> bool {
        !matches!(self, Drawable::None)
    }
}

/// A node in the scene tree.
///
/// Children are owned by value, so a node has at most one parent and the
/// tree cannot contain cycles. Dropping a node drops its whole subtree.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    transform: Transform,
    drawable: Drawable,
    children: Vec<SceneNode>,
}

impl SceneNode {
    /// Creates a node with an identity transform.
    pub fn new(name: impl Into<String>, drawable: Drawable) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            drawable,
            children: Vec::new(),
        }
    }

    /// Appends a child. Children are visited in insertion order.
    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// Detaches the first direct child called `name` and hands it back.
    pub fn remove_child(&mut self, name: &str) -> Option<SceneNode> {
        let index = self.children.iter().position(|c| c.name == name)?;
        Some(self.children.remove(index))
    }

    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    pub fn drawable(&self) -> &Drawable {
        &self.drawable
    }

    pub fn local_transform(&self) -> &Transform {
        &self.transform
    }

    /// Handle for composing the local transform in place.
    pub fn local_transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Pre-order walk. `f` receives each node with its world transform,
    /// `parent_world * local`, before any of its children are visited.
    pub fn visit<F>(&self, parent_world: Mat4, f: &mut F)
    where
        F: FnMut(&SceneNode, Mat4),
    {
        let world = parent_world * self.transform.matrix();
        f(self, world);
        for child in &self.children {
            child.visit(world, f);
        }
    }

    /// Depth-first search for a node by name, this node included.
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(name))
    }
}

/// One drawable with its composed world transform, ready for the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub name: String,
    pub world: Mat4,
    pub drawable: Drawable,
}

/// Represents the entire 3D scene.
#[derive(Debug, Clone)]
pub struct Scene {
    root: SceneNode,
}

impl Scene {
    /// Creates a scene with an empty, undrawn root.
    pub fn new() -> Self {
        Self {
            root: SceneNode::new("root", Drawable::None),
        }
    }

    pub fn root(&self) -> &SceneNode {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut SceneNode {
        &mut self.root
    }

    /// Gets an immutable reference to a node by name.
    pub fn node(&self, name: &str) -> Option<&SceneNode> {
        self.root.find(name)
    }

    /// Gets a mutable reference to a node by name.
    pub fn node_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        self.root.find_mut(name)
    }

    /// World transforms of every node in pre-order.
    pub fn world_transforms(&self) -> Vec<(String, Mat4)> {
        let mut out = Vec::new();
        self.root
            .visit(Mat4::IDENTITY, &mut |node, world| out.push((node.name.clone(), world)));
        out
    }

    pub fn world_transform(&self, name: &str) -> Option<Mat4> {
        let mut found = None;
        self.root.visit(Mat4::IDENTITY, &mut |node, world| {
            if found.is_none() && node.name == name {
                found = Some(world);
            }
        });
        found
    }

    /// Every node that carries a drawable, in pre-order.
    pub fn draw_list(&self) -> Vec<DrawItem> {
        let mut items = Vec::new();
        self.root.visit(Mat4::IDENTITY, &mut |node, world| {
            if node.drawable.is_drawable() {
                items.push(DrawItem {
                    name: node.name.clone(),
                    world,
                    drawable: node.drawable,
                });
            }
        });
        items
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn sphere() -> Drawable {
        Drawable::Sphere { color: [1.0; 4] }
    }

    #[test]
    fn traversal_is_pre_order_by_insertion() {
        let mut scene = Scene::new();
        let mut a = SceneNode::new("a", sphere());
        a.add_child(SceneNode::new("a1", sphere()));
        a.add_child(SceneNode::new("a2", Drawable::None));
        scene.root_mut().add_child(a);
        scene.root_mut().add_child(SceneNode::new("b", sphere()));

        let names: Vec<_> = scene.world_transforms().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["root", "a", "a1", "a2", "b"]);
    }

    #[test]
    fn draw_list_skips_empty_payloads() {
        let mut scene = Scene::new();
        scene.root_mut().add_child(SceneNode::new("group", Drawable::None));
        scene.root_mut().add_child(SceneNode::new("ball", sphere()));

        let items = scene.draw_list();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "ball");
        assert_eq!(items[0].drawable.mesh_kind(), Some(MeshKind::Sphere));
    }

    #[test]
    fn node_mut_edits_nested_transform() {
        let mut scene = Scene::new();
        let mut parent = SceneNode::new("parent", Drawable::None);
        parent.add_child(SceneNode::new("child", sphere()));
        scene.root_mut().add_child(parent);

        scene
            .node_mut("child")
            .expect("child exists")
            .local_transform_mut()
            .translate(1.0, 2.0, 3.0);

        let world = scene.world_transform("child").expect("child exists");
        assert_eq!(world.transform_point3(Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0));
        assert!(scene.node("missing").is_none());
    }

    #[test]
    fn removed_subtree_can_be_reattached() {
        let mut scene = Scene::new();
        let mut a = SceneNode::new("a", Drawable::None);
        a.local_transform_mut().translate(10.0, 0.0, 0.0);
        let mut b = SceneNode::new("b", Drawable::None);
        b.add_child(SceneNode::new("leaf", sphere()));
        scene.root_mut().add_child(a);
        scene.root_mut().add_child(b);

        let leaf = scene.node_mut("b").and_then(|b| b.remove_child("leaf")).expect("leaf detached");
        scene.node_mut("a").expect("a exists").add_child(leaf);

        let world = scene.world_transform("leaf").expect("leaf reattached");
        assert_eq!(world.transform_point3(Vec3::ZERO), Vec3::new(10.0, 0.0, 0.0));
        assert!(scene.node("b").expect("b exists").children().is_empty());
    }

    #[test]
    fn every_mesh_kind_has_geometry() {
        for kind in MeshKind::ALL {
            let mesh = kind.vertex_data();
            assert!(!mesh.vertices.is_empty());
            assert_eq!(mesh.indices.len() % 3, 0);
        }
        assert!(Drawable::None.vertex_data().is_none());
    }
}
