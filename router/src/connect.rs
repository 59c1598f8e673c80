//! Turning a backtraced wire into routing-tree edges.
//!
//! Every edge the builder creates joins two points that share an x or a y
//! coordinate. Bends recorded by the backtrace become synthetic corner points
//! at bin centers, threaded from the tree towards the new endpoint.

use crate::algo::{Backtrace, Rotation};
use lee_common::db::indices::NodeId;
use lee_common::db::tree::{NetPoint, RoutingTree};
use lee_common::geom::coord::BinCoord;
use lee_common::geom::point::Point;
use lee_common::grid::BinConverter;

pub struct TreeBuilder<'a> {
    tree: RoutingTree,
    converter: &'a BinConverter,
    net: String,
    next_point: usize,
    rotation: Rotation,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(
        net: &str,
        root_name: impl Into<String>,
        root: NetPoint,
        converter: &'a BinConverter,
        rotation: Rotation,
    ) -> Self {
        Self {
            tree: RoutingTree::new(root_name, root),
            converter,
            net: net.to_string(),
            next_point: 1,
            rotation,
        }
    }

    pub fn tree(&self) -> &RoutingTree {
        &self.tree
    }

    pub fn into_tree(self) -> RoutingTree {
        self.tree
    }

    /// Adds `endpoint` as a new leaf, following the bends of `trace`.
    pub fn connect(&mut self, name: &str, endpoint: NetPoint, trace: &Backtrace) -> NodeId {
        let root = self.tree.root();
        let on_bin = self.tree.find_points_on_bin(root, trace.attachment);
        let e = endpoint.effective_position();
        let e_bin = endpoint.bin;
        let leaf = self.tree.insert(name, endpoint);

        log::debug!(
            "Net {}: connecting '{}' at {} via {} with {} bend(s), {} tree point(s) on bin",
            self.net,
            name,
            e_bin,
            trace.attachment,
            trace.corners.len(),
            on_bin.len()
        );

        let bends = trace.corners.iter().copied();
        match (trace.corners.len(), on_bin.len()) {
            (0, 0) => {
                let nearest = self.tree.find_nearest_tree_node(root, e);
                let n = self.tree.position(nearest);
                let elbow = if e_bin.row == trace.attachment.row {
                    Point::new(n.x, e.y)
                } else {
                    Point::new(e.x, n.y)
                };
                let elbow = self.new_corner(elbow);
                self.tree.add_child(elbow, leaf);
                self.rearrange(nearest, elbow);
            }
            (0, _) => {
                let parent = self.nearest_of(&on_bin, e);
                if self.tree.position(parent).is_aligned_with(e) {
                    self.tree.add_child(parent, leaf);
                } else {
                    self.expand(parent, leaf);
                }
            }
            (_, 0) => {
                let c = self.converter.bin_center(trace.corners[0]);
                let nearest = self.tree.find_nearest_tree_node(root, c);
                let n = self.tree.position(nearest);
                let mid = if trace.attachment.row == self.tree.bin(nearest).row {
                    Point::new(c.x, n.y)
                } else {
                    Point::new(n.x, c.y)
                };
                let mid = self.new_corner(mid);
                self.rearrange(nearest, mid);

                let bend = self.new_corner(c);
                self.tree.add_child(mid, bend);
                let last = self.chain(bend, bends.skip(1));
                self.finish(last, leaf, e, e_bin);
            }
            (1, _) => {
                let parent = self.nearest_of(&on_bin, e);
                let corner = trace.corners[0];
                let p = self.tree.position(parent);
                let point = if self.tree.bin(parent).row == corner.row {
                    Point::new(e.x, p.y)
                } else {
                    Point::new(p.x, e.y)
                };
                let point = self.new_corner(point);
                self.tree.add_child(parent, point);
                self.tree.add_child(point, leaf);
            }
            (_, 1) => {
                let last = self.chain(on_bin[0], bends);
                self.finish(last, leaf, e, e_bin);
            }
            (_, _) => {
                let parent = self.nearest_of(&on_bin, e);
                let c = self.converter.bin_center(trace.corners[0]);
                let p = self.tree.position(parent);
                let point = if trace.attachment.row == self.tree.bin(parent).row {
                    Point::new(c.x, p.y)
                } else {
                    Point::new(p.x, c.y)
                };
                let point = self.new_corner(point);
                self.rearrange(parent, point);
                let last = self.chain(point, bends.skip(1));
                self.finish(last, leaf, e, e_bin);
            }
        }
        leaf
    }

    fn new_corner(&mut self, position: Point<f64>) -> NodeId {
        let name = format!("{}_{}", self.net, self.next_point);
        self.next_point += 1;
        let bin = self.converter.to_bin(position);
        self.tree.insert(name, NetPoint::corner(position, bin))
    }

    /// Closest candidate to `target`; the first one wins ties.
    fn nearest_of(&self, candidates: &[NodeId], target: Point<f64>) -> NodeId {
        let mut best = candidates[0];
        let mut best_dist = self.tree.position(best).dist_sq(target);
        for &id in &candidates[1..] {
            let dist = self.tree.position(id).dist_sq(target);
            if dist < best_dist {
                best = id;
                best_dist = dist;
            }
        }
        best
    }

    /// Bend point between `from` and `to`. Clockwise routing takes the
    /// horizontal leg first when both coordinates grow or both shrink.
    fn elbow(&self, from: Point<f64>, to: Point<f64>) -> Point<f64> {
        let same_sense = (from.x < to.x && from.y < to.y) || (from.x > to.x && from.y > to.y);
        let horizontal_first = match self.rotation {
            Rotation::Clockwise => same_sense,
            Rotation::CounterClockwise => !same_sense,
        };
        if horizontal_first {
            Point::new(to.x, from.y)
        } else {
            Point::new(from.x, to.y)
        }
    }

    /// Joins an unaligned `child` to `parent` through a new elbow placed
    /// with [`rearrange`](Self::rearrange).
    fn expand(&mut self, parent: NodeId, child: NodeId) {
        let elbow = self.elbow(self.tree.position(parent), self.tree.position(child));
        let elbow = self.new_corner(elbow);
        self.tree.add_child(elbow, child);
        self.rearrange(parent, elbow);
    }

    /// One corner per bend bin, each aligned with the previous one.
    fn chain(&mut self, from: NodeId, corners: impl Iterator<Item = BinCoord>) -> NodeId {
        let mut parent = from;
        for bin in corners {
            let c = self.converter.bin_center(bin);
            let p = self.tree.position(parent);
            let next = if self.tree.bin(parent).row == bin.row {
                Point::new(c.x, p.y)
            } else {
                Point::new(p.x, c.y)
            };
            let node = self.new_corner(next);
            self.tree.add_child(parent, node);
            parent = node;
        }
        parent
    }

    /// Slides the last corner of a chain onto the endpoint's row or column
    /// when that keeps it aligned with its parent, then hangs the endpoint
    /// under it.
    fn finish(&mut self, last: NodeId, leaf: NodeId, e: Point<f64>, e_bin: BinCoord) {
        let l = self.tree.position(last);
        let candidate = if self.tree.bin(last).row == e_bin.row {
            Point::new(l.x, e.y)
        } else {
            Point::new(e.x, l.y)
        };

        let node = self.tree.node(last);
        let movable = node.point.is_corner()
            && node.children().is_empty()
            && node
                .parent()
                .is_some_and(|p| self.tree.position(p).is_aligned_with(candidate));
        if movable {
            let bin = self.converter.to_bin(candidate);
            self.tree.move_point(last, candidate, bin);
        }

        if self.tree.position(last).is_aligned_with(e) {
            self.tree.add_child(last, leaf);
        } else {
            let elbow = self.elbow(self.tree.position(last), e);
            let elbow = self.new_corner(elbow);
            self.tree.add_child(last, elbow);
            self.tree.add_child(elbow, leaf);
        }
    }

    /// Places `new` next to `node`. When `new` lies strictly inside the
    /// straight edge from `node` to its parent or to one of its children it
    /// is spliced into that edge; otherwise it becomes a plain child.
    fn rearrange(&mut self, node: NodeId, new: NodeId) {
        let n = self.tree.position(node);
        let m = self.tree.position(new);

        if let Some(parent) = self.tree.parent(node) {
            if strictly_between(self.tree.position(parent), m, n) {
                self.tree.remove_child(parent, node);
                self.tree.add_child(parent, new);
                self.tree.add_child(new, node);
                return;
            }
        }

        let children = self.tree.children(node).to_vec();
        for child in children {
            if strictly_between(n, m, self.tree.position(child)) {
                self.tree.remove_child(node, child);
                self.tree.add_child(node, new);
                self.tree.add_child(new, child);
                return;
            }
        }

        self.tree.add_child(node, new);
    }
}

fn strictly_between(a: Point<f64>, m: Point<f64>, b: Point<f64>) -> bool {
    let inside = |lo: f64, v: f64, hi: f64| lo.min(hi) < v && v < lo.max(hi);
    (a.x == m.x && m.x == b.x && inside(a.y, m.y, b.y))
        || (a.y == m.y && m.y == b.y && inside(a.x, m.x, b.x))
}
