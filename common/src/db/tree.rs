//! Per-net routing tree.
//!
//! Nodes live in an arena owned by [`RoutingTree`]; the child lists are the
//! ownership edges and every node keeps a back-reference to its parent.

use crate::db::indices::{ComponentId, NodeId, PortId};
use crate::geom::coord::BinCoord;
use crate::geom::point::Point;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointKind {
    Port(PortId),
    Component {
        id: ComponentId,
        width: f64,
        height: f64,
    },
    /// Synthetic bend or center point created by the router.
    Corner,
}

/// The geometric point a tree node stands for.
#[derive(Clone, Debug, PartialEq)]
pub struct NetPoint {
    pub kind: PointKind,
    /// Raw coordinates; the lower-left corner for components.
    pub position: Point<f64>,
    /// Bin at the time the node was created.
    pub bin: BinCoord,
}

impl NetPoint {
    pub fn corner(position: Point<f64>, bin: BinCoord) -> Self {
        Self {
            kind: PointKind::Corner,
            position,
            bin,
        }
    }

    pub fn is_corner(&self) -> bool {
        matches!(self.kind, PointKind::Corner)
    }

    /// Position used for every distance and alignment decision: the center of
    /// a component, the raw coordinates of anything else.
    pub fn effective_position(&self) -> Point<f64> {
        match self.kind {
            PointKind::Component { width, height, .. } => {
                Point::new(self.position.x + width / 2.0, self.position.y + height / 2.0)
            }
            PointKind::Port(_) | PointKind::Corner => self.position,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TreeNode {
    pub name: String,
    pub point: NetPoint,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl TreeNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Clone, Debug)]
pub struct RoutingTree {
    nodes: Vec<TreeNode>,
    root: NodeId,
}

impl RoutingTree {
    pub fn new(name: impl Into<String>, point: NetPoint) -> Self {
        Self {
            nodes: vec![TreeNode {
                name: name.into(),
                point,
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId::new(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.index()]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    #[inline]
    pub fn position(&self, id: NodeId) -> Point<f64> {
        self.nodes[id.index()].point.effective_position()
    }

    #[inline]
    pub fn bin(&self, id: NodeId) -> BinCoord {
        self.nodes[id.index()].point.bin
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId::new(i), n))
    }

    /// Allocates a detached node. It joins the tree through [`add_child`].
    ///
    /// [`add_child`]: RoutingTree::add_child
    pub fn insert(&mut self, name: impl Into<String>, point: NetPoint) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(TreeNode {
            name: name.into(),
            point,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Appends `child` under `parent`, overwriting the child's back-reference.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        assert_ne!(parent, child, "a node cannot be its own child");
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Detaches `child` from `parent`'s child list. The child's back-reference
    /// is left as is; re-attaching it elsewhere overwrites it.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let children = &mut self.nodes[parent.index()].children;
        match children.iter().position(|&c| c == child) {
            Some(pos) => {
                children.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Moves a synthetic point. Element points never move.
    pub fn move_point(&mut self, id: NodeId, position: Point<f64>, bin: BinCoord) {
        let point = &mut self.nodes[id.index()].point;
        assert!(point.is_corner(), "only synthetic points can be moved");
        point.position = position;
        point.bin = bin;
    }

    /// Depth-first, pre-order walk of the subtree rooted at `from`.
    pub fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        order
    }

    /// Every node of the subtree whose point lies in `bin`, in traversal order.
    pub fn find_points_on_bin(&self, from: NodeId, bin: BinCoord) -> Vec<NodeId> {
        self.descendants(from)
            .into_iter()
            .filter(|&id| self.bin(id) == bin)
            .collect()
    }

    /// Node of the subtree closest to `target` by squared Euclidean distance.
    /// Ties keep the node seen first in traversal order.
    pub fn find_nearest_tree_node(&self, from: NodeId, target: Point<f64>) -> NodeId {
        let mut best = from;
        let mut best_dist = self.position(from).dist_sq(target);
        for id in self.descendants(from).into_iter().skip(1) {
            let dist = self.position(id).dist_sq(target);
            if dist < best_dist {
                best = id;
                best_dist = dist;
            }
        }
        best
    }

    /// Node standing for the given element, if it has been connected.
    pub fn find_element(&self, kind: PointKind) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&id| self.node(id).point.kind == kind)
    }

    /// (parent, child) pairs reachable from the root.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        self.descendants(self.root)
            .into_iter()
            .flat_map(|id| self.children(id).iter().map(move |&c| (id, c)))
            .collect()
    }

    pub fn leaves(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| self.children(id).is_empty())
            .collect()
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.root, 1usize)];
        while let Some((id, d)) = stack.pop() {
            deepest = deepest.max(d);
            for &c in self.children(id) {
                stack.push((c, d + 1));
            }
        }
        deepest
    }

    /// Checks the back-references and that the arena forms a single tree.
    pub fn verify_structure(&self) -> Result<(), String> {
        if self.parent(self.root).is_some() {
            return Err(format!("root '{}' has a parent", self.node(self.root).name));
        }

        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![self.root];
        seen[self.root.index()] = true;
        while let Some(id) = stack.pop() {
            for &c in self.children(id) {
                if seen[c.index()] {
                    return Err(format!(
                        "node '{}' is reached twice (cycle or shared child)",
                        self.node(c).name
                    ));
                }
                if self.parent(c) != Some(id) {
                    return Err(format!(
                        "node '{}' does not point back to its parent '{}'",
                        self.node(c).name,
                        self.node(id).name
                    ));
                }
                seen[c.index()] = true;
                stack.push(c);
            }
        }

        if let Some(orphan) = seen.iter().position(|&s| !s) {
            return Err(format!(
                "node '{}' is not reachable from the root",
                self.nodes[orphan].name
            ));
        }
        Ok(())
    }

    pub fn log_structure(&self) {
        log::debug!("Tree structure:");
        let mut stack = vec![(self.root, 1usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = self.node(id);
            let p = node.point.effective_position();
            log::debug!(
                "{}{} ({:.3}, {:.3}) bin {}",
                "  ".repeat(depth),
                node.name,
                p.x,
                p.y,
                node.point.bin
            );
            for &c in self.children(id).iter().rev() {
                stack.push((c, depth + 1));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner(x: f64, y: f64, row: u32, col: u32) -> NetPoint {
        NetPoint::corner(Point::new(x, y), BinCoord::new(row, col))
    }

    #[test]
    fn test_add_and_remove_child() {
        let mut tree = RoutingTree::new("root", corner(0.0, 0.0, 0, 0));
        let a = tree.insert("a", corner(1.0, 0.0, 0, 1));
        let b = tree.insert("b", corner(2.0, 0.0, 0, 2));
        tree.add_child(tree.root(), a);
        tree.add_child(a, b);

        assert_eq!(tree.parent(b), Some(a));
        assert!(tree.remove_child(a, b));
        assert!(!tree.remove_child(a, b));
        // Back-reference survives removal until re-attached.
        assert_eq!(tree.parent(b), Some(a));

        tree.add_child(tree.root(), b);
        assert_eq!(tree.parent(b), Some(tree.root()));
        assert_eq!(tree.children(tree.root()), &[a, b]);
        assert!(tree.verify_structure().is_ok());
    }

    #[test]
    fn test_component_effective_position_is_center() {
        let p = NetPoint {
            kind: PointKind::Component {
                id: ComponentId::new(0),
                width: 2.0,
                height: 4.0,
            },
            position: Point::new(10.0, 10.0),
            bin: BinCoord::new(0, 0),
        };
        assert_eq!(p.effective_position(), Point::new(11.0, 12.0));
        assert_eq!(corner(3.0, 4.0, 0, 0).effective_position(), Point::new(3.0, 4.0));
    }

    #[test]
    fn test_find_points_on_bin_includes_self() {
        let mut tree = RoutingTree::new("root", corner(0.5, 0.5, 0, 0));
        let a = tree.insert("a", corner(0.7, 0.5, 0, 0));
        let b = tree.insert("b", corner(3.5, 0.5, 0, 3));
        tree.add_child(tree.root(), a);
        tree.add_child(tree.root(), b);

        let on_bin = tree.find_points_on_bin(tree.root(), BinCoord::new(0, 0));
        assert_eq!(on_bin, vec![tree.root(), a]);
        assert!(tree.find_points_on_bin(a, BinCoord::new(0, 3)).is_empty());
    }

    #[test]
    fn test_nearest_prefers_first_seen_on_ties() {
        let mut tree = RoutingTree::new("root", corner(0.0, 0.0, 0, 0));
        let left = tree.insert("left", corner(-1.0, 5.0, 0, 0));
        let right = tree.insert("right", corner(1.0, 5.0, 0, 0));
        let deep = tree.insert("deep", corner(0.0, 9.0, 0, 0));
        tree.add_child(tree.root(), left);
        tree.add_child(tree.root(), right);
        tree.add_child(right, deep);

        assert_eq!(tree.find_nearest_tree_node(tree.root(), Point::new(0.0, 5.0)), left);
        assert_eq!(tree.find_nearest_tree_node(tree.root(), Point::new(0.0, 8.0)), deep);
        assert_eq!(tree.find_nearest_tree_node(right, Point::new(-1.0, 5.0)), right);
    }

    #[test]
    fn test_verify_structure_detects_orphans_and_stale_parents() {
        let mut tree = RoutingTree::new("root", corner(0.0, 0.0, 0, 0));
        let a = tree.insert("a", corner(1.0, 0.0, 0, 0));
        assert!(tree.verify_structure().unwrap_err().contains("not reachable"));

        tree.add_child(tree.root(), a);
        let b = tree.insert("b", corner(2.0, 0.0, 0, 0));
        tree.add_child(a, b);
        tree.remove_child(a, b);
        tree.add_child(tree.root(), b);
        tree.nodes[b.index()].parent = Some(a);
        assert!(tree.verify_structure().unwrap_err().contains("point back"));
    }

    #[test]
    fn test_edges_leaves_depth() {
        let mut tree = RoutingTree::new("root", corner(0.0, 0.0, 0, 0));
        let a = tree.insert("a", corner(0.0, 1.0, 0, 0));
        let b = tree.insert("b", corner(1.0, 1.0, 0, 0));
        let c = tree.insert("c", corner(0.0, -1.0, 0, 0));
        tree.add_child(tree.root(), a);
        tree.add_child(a, b);
        tree.add_child(tree.root(), c);

        assert_eq!(tree.edges().len(), 3);
        assert_eq!(tree.leaves(), vec![b, c]);
        assert_eq!(tree.depth(), 3);
    }
}
