//! Serializable view of a design and its routing results.

use crate::db::core::{Core, Design, IoPort, Row};
use crate::db::tree::{PointKind, RoutingTree};
use crate::geom::coord::BinCoord;
use crate::grid::BinGrids;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DesignSnapshot {
    pub name: String,
    pub is_routed: bool,
    pub core: Core,
    pub rows: Vec<Row>,
    pub ports: Vec<IoPort>,
    pub components: Vec<ComponentSnapshot>,
    pub nets: Vec<NetSnapshot>,
    pub bins: Option<GridsSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct ComponentSnapshot {
    pub name: String,
    pub cell_type: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub bin: Option<BinCoord>,
}

#[derive(Debug, Serialize)]
pub struct NetSnapshot {
    pub name: String,
    pub source: String,
    pub drains: Vec<String>,
    pub claimed_bins: Vec<BinCoord>,
    pub tree: Vec<NodeSnapshot>,
}

/// One tree node; `parent` indexes into the same list.
#[derive(Debug, Serialize)]
pub struct NodeSnapshot {
    pub name: String,
    pub kind: &'static str,
    pub x: f64,
    pub y: f64,
    pub bin: BinCoord,
    pub parent: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct GridsSnapshot {
    pub rows: u32,
    pub cols: u32,
    pub bin_width: f64,
    pub bin_height: f64,
    pub occupancy: Vec<Vec<u32>>,
    pub elements: Vec<Vec<u32>>,
    pub blockages: Vec<Vec<u32>>,
}

impl Design {
    pub fn snapshot(&self) -> DesignSnapshot {
        DesignSnapshot {
            name: self.name.clone(),
            is_routed: self.is_routed,
            core: self.core.clone(),
            rows: self.rows.clone(),
            ports: self.ports.clone(),
            components: self
                .components
                .iter()
                .map(|c| ComponentSnapshot {
                    name: c.name.clone(),
                    cell_type: c.cell_type.clone(),
                    x: c.position.x,
                    y: c.position.y,
                    width: c.width,
                    height: c.height,
                    bin: c.bin,
                })
                .collect(),
            nets: self
                .nets
                .iter()
                .map(|n| NetSnapshot {
                    name: n.name.clone(),
                    source: self.pin_name(n.source).to_string(),
                    drains: n
                        .drains
                        .iter()
                        .map(|&d| self.pin_name(d).to_string())
                        .collect(),
                    claimed_bins: n.claimed_bins.clone(),
                    tree: n.tree.as_ref().map(tree_snapshot).unwrap_or_default(),
                })
                .collect(),
            bins: self.bins.as_ref().map(grids_snapshot),
        }
    }
}

fn tree_snapshot(tree: &RoutingTree) -> Vec<NodeSnapshot> {
    let order = tree.descendants(tree.root());
    let mut slot = vec![usize::MAX; tree.len()];
    for (i, id) in order.iter().enumerate() {
        slot[id.index()] = i;
    }

    order
        .iter()
        .map(|&id| {
            let node = tree.node(id);
            let p = node.point.effective_position();
            NodeSnapshot {
                name: node.name.clone(),
                kind: match node.point.kind {
                    PointKind::Port(_) => "port",
                    PointKind::Component { .. } => "component",
                    PointKind::Corner => "corner",
                },
                x: p.x,
                y: p.y,
                bin: node.point.bin,
                parent: node.parent().map(|p| slot[p.index()]),
            }
        })
        .collect()
}

fn grids_snapshot(grids: &BinGrids) -> GridsSnapshot {
    GridsSnapshot {
        rows: grids.rows(),
        cols: grids.cols(),
        bin_width: grids.converter().bin_width(),
        bin_height: grids.converter().bin_height(),
        occupancy: grids.occupancy().to_rows(),
        elements: grids.elements().to_rows(),
        blockages: grids.blockages().to_rows(),
    }
}

#[cfg(test)]
mod tests {
    use crate::db::core::{Core, Design, PinRef, PortSide};
    use crate::db::tree::{NetPoint, RoutingTree};
    use crate::geom::coord::BinCoord;
    use crate::geom::point::Point;

    #[test]
    fn test_snapshot_indexes_parents_in_preorder() {
        let mut design = Design::new(
            "snap",
            Core {
                width: 4.0,
                height: 4.0,
                ..Default::default()
            },
        );
        let a = design
            .add_port("a".into(), Point::new(0.5, 0.5), PortSide::Left)
            .unwrap();
        let b = design
            .add_port("b".into(), Point::new(3.5, 0.5), PortSide::Right)
            .unwrap();
        let net = design
            .add_net("n".into(), PinRef::Port(a), vec![PinRef::Port(b)])
            .unwrap();
        design.create_bins(4, 4).unwrap();

        let mut tree = RoutingTree::new("a", design.pin_point(PinRef::Port(a)).unwrap());
        let corner = tree.insert("n_1", NetPoint::corner(Point::new(2.0, 0.5), BinCoord::new(0, 2)));
        let leaf = tree.insert("b", design.pin_point(PinRef::Port(b)).unwrap());
        tree.add_child(tree.root(), corner);
        tree.add_child(corner, leaf);
        design.nets[net.index()].tree = Some(tree);

        let snap = design.snapshot();
        let nodes = &snap.nets[0].tree;
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].parent, None);
        assert_eq!(nodes[1].kind, "corner");
        assert_eq!(nodes[2].parent, Some(1));
        assert_eq!(snap.bins.as_ref().unwrap().blockages.len(), 4);
        assert_eq!(snap.nets[0].drains, vec!["b".to_string()]);
    }
}
