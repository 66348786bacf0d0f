use glam::{Affine3A, Quat, Vec3};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub rotation: Quat,
    pub translation: Vec3,
    pub scale: Vec3,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, rotation: Quat, translation: Vec3) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: vec![],
            rotation,
            translation,
            scale: Vec3::ONE,
        }
    }

    #[inline]
    pub fn local_transform(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Arena backed node hierarchy. The node at [`NodeId::ROOT`] is the model root, every other node
/// is reachable from it once the importer is done linking.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new(root_name: impl Into<String>, root_transform: Affine3A) -> Self {
        let (scale, rotation, translation) = root_transform.to_scale_rotation_translation();
        let mut root = SceneNode::new(root_name, rotation, translation);
        root.scale = scale;
        Self { nodes: vec![root] }
    }

    /// Adds a detached node, [`SceneGraph::set_parent`] has to be called before it's part of the hierarchy.
    pub(crate) fn add_node(&mut self, node: SceneNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub(crate) fn set_parent(&mut self, child: NodeId, parent: NodeId) {
        debug_assert_ne!(child, NodeId::ROOT, "The root can't be reparented");
        debug_assert!(!self.is_ancestor(child, parent), "Reparenting would introduce a cycle");

        if let Some(old_parent) = self.nodes[child.0].parent.take() {
            self.nodes[old_parent.0].children.retain(|&c| c != child);
        }

        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every node in insertion order, starting with the root.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().enumerate().map(|(idx, node)| (NodeId(idx), node))
    }

    /// Whether `ancestor` is `node` itself or lies on its parent chain.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }

            steps += 1;
            if steps > self.nodes.len() {
                break;
            }
            current = self.nodes[id.0].parent;
        }
        false
    }

    /// The local to world transform of `id`, composed along its parent chain.
    pub fn world_transform(&self, id: NodeId) -> Affine3A {
        let mut transform = self.nodes[id.0].local_transform();
        let mut current = self.nodes[id.0].parent;
        let mut steps = 0;

        while let Some(parent) = current {
            steps += 1;
            if steps > self.nodes.len() {
                break;
            }

            transform = self.nodes[parent.0].local_transform() * transform;
            current = self.nodes[parent.0].parent;
        }

        transform
    }

    /// The node names from the root down to `id`, both inclusive.
    pub fn path(&self, id: NodeId) -> Vec<&str> {
        let mut path = vec![];
        let mut current = Some(id);
        while let Some(node_id) = current {
            if path.len() > self.nodes.len() {
                break;
            }

            let node = &self.nodes[node_id.0];
            path.push(node.name.as_str());
            current = node.parent;
        }
        path.reverse();
        path
    }
}
