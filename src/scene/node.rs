//! Scene tree: named nodes by composition, with a lazy depth-first iterator.
//!
//! There is no renderable base class; a node is a name plus children, and the
//! inspector walks the tree through [`Scene::iter`], an explicit-stack
//! iterator, so consumers decide how (or whether) to display it. Drawing is a
//! separate concern handled by the scene that owns the actual objects.

/// A named node with children. The `kind` tag tells the inspector what the
/// node represents without the tree owning any render state.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    pub children: Vec<SceneNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Mesh,
    ParticleSystem,
    Group,
}

impl SceneNode {
    pub fn new(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }
}

/// The node tree. Traversal order is depth-first, children after their
/// parent, siblings in insertion order.
#[derive(Debug, Default)]
pub struct Scene {
    roots: Vec<SceneNode>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: SceneNode) {
        self.roots.push(node);
    }

    pub fn roots(&self) -> &[SceneNode] {
        &self.roots
    }

    /// Lazy depth-first traversal yielding `(depth, node)`.
    pub fn iter(&self) -> NodeIter<'_> {
        let mut stack: Vec<(usize, &SceneNode)> = Vec::new();
        for node in self.roots.iter().rev() {
            stack.push((0, node));
        }
        NodeIter { stack }
    }
}

/// Explicit-stack depth-first iterator over the node tree.
pub struct NodeIter<'a> {
    stack: Vec<(usize, &'a SceneNode)>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = (usize, &'a SceneNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        for child in node.children.iter().rev() {
            self.stack.push((depth + 1, child));
        }
        Some((depth, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_first_order() {
        let mut scene = Scene::new();
        scene.add(
            SceneNode::new("floor", NodeKind::Mesh)
                .with_child(SceneNode::new("marker", NodeKind::Mesh)),
        );
        scene.add(
            SceneNode::new("physics", NodeKind::Group)
                .with_child(SceneNode::new("particles", NodeKind::ParticleSystem)),
        );

        let visited: Vec<(usize, &str)> = scene
            .iter()
            .map(|(depth, node)| (depth, node.name.as_str()))
            .collect();

        assert_eq!(
            visited,
            vec![
                (0, "floor"),
                (1, "marker"),
                (0, "physics"),
                (1, "particles"),
            ]
        );
    }

    #[test]
    fn test_empty_scene_yields_nothing() {
        let scene = Scene::new();
        assert_eq!(scene.iter().count(), 0);
    }
}
