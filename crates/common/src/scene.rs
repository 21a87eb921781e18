use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::types::Transform;

/// Index of a node inside a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// A single transform node of an avatar's scene graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Full size of the block drawn for this node, if it has visible geometry.
    pub block: Option<Vec3>,
}

/// Errors from scene graph construction.
#[derive(Debug, thiserror::Error)]
pub enum SceneGraphError {
    #[error("parent node {0:?} does not exist")]
    MissingParent(NodeId),
}

/// Tree of named transform nodes rooted at the avatar root (always `NodeId(0)`).
///
/// Nodes live in a flat `Vec` in insertion order, so parents always precede
/// their children and a single forward pass resolves world matrices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    /// Create a graph holding only a root node.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![SceneNode {
                name: root_name.into(),
                transform: Transform::default(),
                parent: None,
                children: Vec::new(),
                block: None,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a node under `parent`. Returns its id.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
        block: Option<Vec3>,
    ) -> Result<NodeId, SceneGraphError> {
        if parent.0 >= self.nodes.len() {
            return Err(SceneGraphError::MissingParent(parent));
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(SceneNode {
            name: name.into(),
            transform,
            parent: Some(parent),
            children: Vec::new(),
            block,
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0)
    }

    /// Iterate nodes in insertion (parent-first) order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Ids of every node whose lowercase name contains any of `needles`.
    /// The root is never matched.
    pub fn find_containing(&self, needles: &[&str]) -> Vec<NodeId> {
        self.iter()
            .skip(1)
            .filter(|(_, node)| {
                let name = node.name.to_lowercase();
                needles.iter().any(|n| name.contains(n))
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// World-space matrix of every node, indexed like the graph.
    pub fn world_matrices(&self, root_world: Mat4) -> Vec<Mat4> {
        let mut out: Vec<Mat4> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let parent = match node.parent {
                Some(p) => out[p.0],
                None => root_world,
            };
            out.push(parent * node.transform.to_matrix());
        }
        out
    }
}
